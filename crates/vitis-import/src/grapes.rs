//! Listing import: grapes from the per-country VIVC listings.
//!
//! A full import creates missing countries and grapes and rewrites every
//! field. A partial import (`fields` set) only touches the named fields of
//! grapes that already exist. Either way only fields whose normalized value
//! differs from the stored one are written.

use tracing::{debug, info, warn};
use vitis_core::{
  country::{self, COUNTRIES, Country, CountryEntry, NewCountry},
  grape::{Grape, GrapeField, GrapePatch, NewGrape},
  normalize::{normalize_color, normalize_name},
  store::GrapeStore,
};
use vitis_scrape::{
  listing::{ListingRow, parse_listing},
  passport::parse_passport,
  urls::{LISTING_PER_PAGE, vivc_id_from_href},
};

use crate::{
  Error, Fetcher, Importer, Result,
  config::{CountrySelection, GrapeImportOptions},
  relationships::Resolution,
  tally::GrapeTally,
};

/// What happened to one listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
  Created,
  Updated(Vec<&'static str>),
  Unchanged,
  /// The row's URL carries no VIVC id.
  NoId,
  /// Partial import of a grape that is not stored.
  NotFound,
}

/// Canonical countries covered by `selection`.
pub fn select_countries(selection: &CountrySelection) -> Result<Vec<&'static CountryEntry>> {
  Ok(match selection {
    CountrySelection::All => COUNTRIES.iter().collect(),
    CountrySelection::One(name) => vec![
      country::lookup(name).ok_or_else(|| vitis_core::Error::UnknownCountry(name.clone()))?,
    ],
    CountrySelection::StartingFrom(start) => country::countries_from(start).collect(),
  })
}

impl<S: GrapeStore, F: Fetcher> Importer<'_, S, F> {
  pub async fn import_grapes(&self, opts: &GrapeImportOptions) -> Result<GrapeTally> {
    let countries = select_countries(&opts.countries)?;
    let total = countries.len();
    let mut tally = GrapeTally::default();

    for (i, entry) in countries.into_iter().enumerate() {
      info!(
        country = %entry.display_name(),
        iso_code = entry.iso_code,
        "[{}/{}] importing grapes",
        i + 1,
        total
      );
      match self.import_country(entry, opts).await {
        Ok(t) => {
          info!(
            created = t.created,
            updated = t.updated,
            unchanged = t.unchanged,
            not_found = t.not_found,
            errors = t.errors,
            "country done"
          );
          tally += t;
        }
        Err(e) => {
          warn!(iso_code = entry.iso_code, error = %e, "country import failed");
          tally.errors += 1;
        }
      }
    }

    Ok(tally)
  }

  /// The stored country for `entry`, created or renamed in a full import.
  /// `None` when a partial or dry run finds no stored country.
  async fn country_for(
    &self,
    entry: &CountryEntry,
    opts: &GrapeImportOptions,
  ) -> Result<Option<Country>> {
    if opts.is_partial() || opts.dry_run {
      return self.store.get_country(entry.iso_code).await.map_err(Error::store);
    }

    let name = entry.display_name();
    let input = NewCountry {
      name:       name.clone(),
      iso_code:   entry.iso_code.to_owned(),
      search_url: self.vivc.country_search(entry.iso_code),
    };
    let (mut country, created) =
      self.write("ensure country", || self.store.ensure_country(input.clone())).await?;

    if created {
      info!(country = %country.name, "created country");
    } else if country.name != name {
      self
        .write("rename country", || self.store.rename_country(country.country_id, name.clone()))
        .await?;
      country.name = name;
    }
    Ok(Some(country))
  }

  async fn import_country(&self, entry: &CountryEntry, opts: &GrapeImportOptions) -> Result<GrapeTally> {
    let mut tally = GrapeTally::default();
    let country = self.country_for(entry, opts).await?;
    if country.is_none() && opts.is_partial() {
      warn!(iso_code = entry.iso_code, "country not in store, skipped for partial import");
      return Ok(tally);
    }

    let rows = self.listing_rows(entry.iso_code).await;
    info!(rows = rows.len(), "fetched listing");

    for row in &rows {
      match self.import_row(row, country.as_ref(), opts).await {
        Ok(RowOutcome::Created) => tally.created += 1,
        Ok(RowOutcome::Updated(fields)) => {
          debug!(grape = %row.name, fields = ?fields, "updated");
          tally.updated += 1;
        }
        Ok(RowOutcome::Unchanged) => tally.unchanged += 1,
        Ok(RowOutcome::NoId) => tally.skipped += 1,
        Ok(RowOutcome::NotFound) => tally.not_found += 1,
        Err(e) => {
          warn!(grape = %row.name, error = %e, "row import failed");
          tally.errors += 1;
        }
      }
    }

    Ok(tally)
  }

  /// Every row of a country's listing. Pagination stops at a short page, a
  /// page without a table body, or a failed fetch.
  pub async fn listing_rows(&self, iso_code: &str) -> Vec<ListingRow> {
    let mut rows = Vec::new();
    let mut page = 1;
    loop {
      let html = match self.fetcher.fetch(&self.vivc.listing(iso_code, page)).await {
        Ok(html) => html,
        Err(e) => {
          warn!(iso_code, page, error = %e, "listing page unavailable");
          break;
        }
      };
      let Some(listing) = parse_listing(&html, &self.vivc) else {
        break;
      };
      rows.extend(listing.rows);
      if listing.row_count < LISTING_PER_PAGE {
        break;
      }
      page += 1;
      self.pause(self.pacing.page).await;
    }
    rows
  }

  /// Import one listing row.
  pub async fn import_row(
    &self,
    row: &ListingRow,
    country: Option<&Country>,
    opts: &GrapeImportOptions,
  ) -> Result<RowOutcome> {
    let Some(vivc_id) = vivc_id_from_href(&row.url) else {
      return Ok(RowOutcome::NoId);
    };
    let existing = self.store.get_grape(&vivc_id).await.map_err(Error::store)?;
    if existing.is_none() && opts.is_partial() {
      return Ok(RowOutcome::NotFound);
    }

    let mut patch = self.listing_patch(row, country, opts);
    if opts.needs_detail_page() {
      self.add_detail_fields(&vivc_id, &mut patch, opts).await;
    }

    let grape = match existing {
      None => {
        if opts.dry_run {
          return Ok(RowOutcome::Created);
        }
        let input = new_grape(vivc_id, patch);
        let grape = self.write("insert grape", || self.store.insert_grape(input.clone())).await?;
        debug!(grape = %grape.name, vivc_id = %grape.vivc_id, "created");
        self.inline_relationships(&grape, opts).await;
        return Ok(RowOutcome::Created);
      }
      Some(grape) => grape,
    };

    let patch = patch.against(&grape);
    let outcome = if patch.is_empty() {
      RowOutcome::Unchanged
    } else {
      let fields = patch.changed_fields();
      if !opts.dry_run {
        self
          .write("update grape", || self.store.update_grape(grape.grape_id, patch.clone()))
          .await?;
      }
      RowOutcome::Updated(fields)
    };

    if !opts.dry_run {
      self.inline_relationships(&grape, opts).await;
    }
    Ok(outcome)
  }

  fn listing_patch(
    &self,
    row: &ListingRow,
    country: Option<&Country>,
    opts: &GrapeImportOptions,
  ) -> GrapePatch {
    let mut patch = GrapePatch::default();
    if opts.includes(GrapeField::Name) {
      patch.name = Some(normalize_name(&row.name));
    }
    if opts.includes(GrapeField::BerryColor) {
      patch.berry_color = Some(normalize_color(&row.color));
    }
    if opts.includes(GrapeField::Species) {
      patch.species = Some(normalize_name(&row.species));
    }
    if !opts.is_partial() {
      patch.vivc_url = Some(row.url.clone());
      if let Some(country) = country {
        patch.country_id = Some(Some(country.country_id));
      }
    }
    patch
  }

  /// Fill year of crossing and breeder from the passport page. An
  /// unavailable page leaves both fields out of the patch.
  async fn add_detail_fields(&self, vivc_id: &str, patch: &mut GrapePatch, opts: &GrapeImportOptions) {
    let html = match self.fetcher.fetch(&self.vivc.passport(vivc_id)).await {
      Ok(html) => html,
      Err(e) => {
        warn!(vivc_id, error = %e, "passport unavailable, detail fields kept");
        return;
      }
    };
    let passport = parse_passport(&html);
    if opts.includes(GrapeField::YearOfCrossing) {
      patch.year_of_crossing =
        Some(normalize_name(passport.year_of_crossing.as_deref().unwrap_or_default()));
    }
    if opts.includes(GrapeField::Breeder) {
      patch.breeder = Some(normalize_name(passport.breeder.as_deref().unwrap_or_default()));
    }
  }

  /// Relationship lookup during a full import. Failures are logged only;
  /// the relationship pass picks the grape up again later.
  async fn inline_relationships(&self, grape: &Grape, opts: &GrapeImportOptions) {
    if opts.is_partial() || opts.skip_relationships {
      return;
    }
    match self.resolve_relationships(grape, false).await {
      Ok(Resolution::Resolved { added }) if added > 0 => {
        debug!(grape = %grape.name, added, "linked relationships");
      }
      Ok(_) => {}
      Err(e) => warn!(grape = %grape.name, error = %e, "inline relationship lookup failed"),
    }
  }
}

fn new_grape(vivc_id: String, patch: GrapePatch) -> NewGrape {
  NewGrape {
    vivc_id,
    name: patch.name.unwrap_or_default(),
    vivc_url: patch.vivc_url.unwrap_or_default(),
    berry_color: patch.berry_color.unwrap_or_default(),
    species: patch.species.unwrap_or_default(),
    year_of_crossing: patch.year_of_crossing.unwrap_or_default(),
    breeder: patch.breeder.unwrap_or_default(),
    country_id: patch.country_id.flatten(),
  }
}
