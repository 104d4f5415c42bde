//! Store maintenance passes that need little or no network access.

use chrono::Utc;
use tracing::{debug, info, warn};
use vitis_core::{
  country::{COUNTRIES, Country, NewCountry},
  grape::{Grape, GrapePatch, GrapeQuery},
  normalize::{normalize_color, normalize_name, title_country},
  store::{GrapeStore, RelationshipStatus},
};

use crate::{Error, Fetcher, Importer, Result, tally::NormalizeTally};

/// Normalized values for the text fields of `grape` that differ from the
/// stored ones.
pub fn normalization_patch(grape: &Grape) -> GrapePatch {
  GrapePatch {
    name: Some(normalize_name(&grape.name)),
    berry_color: Some(normalize_color(&grape.berry_color)),
    species: Some(normalize_name(&grape.species)),
    ..Default::default()
  }
  .against(grape)
}

impl<S: GrapeStore, F: Fetcher> Importer<'_, S, F> {
  /// Re-apply normalization to every stored grape and country name.
  pub async fn normalize(&self, dry_run: bool) -> Result<NormalizeTally> {
    let mut tally = NormalizeTally::default();

    let grapes = self.store.list_grapes(&GrapeQuery::default()).await.map_err(Error::store)?;
    info!(grapes = grapes.len(), dry_run, "normalizing grapes");
    for grape in &grapes {
      let patch = normalization_patch(grape);
      if patch.is_empty() {
        continue;
      }
      debug!(grape = %grape.name, fields = ?patch.changed_fields(), "normalizing");
      if dry_run {
        tally.grapes_updated += 1;
        continue;
      }
      match self.write("normalize grape", || self.store.update_grape(grape.grape_id, patch.clone())).await {
        Ok(_) => tally.grapes_updated += 1,
        Err(e) => {
          warn!(grape = %grape.name, error = %e, "could not normalize grape");
          tally.errors += 1;
        }
      }
    }

    let countries = self.store.list_countries().await.map_err(Error::store)?;
    for summary in &countries {
      let country = &summary.country;
      let name = title_country(&country.name);
      if name == country.name {
        continue;
      }
      debug!(from = %country.name, to = %name, "normalizing country");
      if dry_run {
        tally.countries_updated += 1;
        continue;
      }
      match self.write("rename country", || self.store.rename_country(country.country_id, name.clone())).await {
        Ok(()) => tally.countries_updated += 1,
        Err(e) => {
          warn!(country = %country.name, error = %e, "could not normalize country");
          tally.errors += 1;
        }
      }
    }

    Ok(tally)
  }

  /// Set `date_last_crawled` on grapes that have parents but no timestamp.
  /// Returns how many grapes were (or in a dry run would be) marked.
  pub async fn mark_crawled(&self, dry_run: bool) -> Result<u64> {
    let query = GrapeQuery { has_parents: Some(true), crawled: Some(false), ..Default::default() };
    let grapes = self.store.list_grapes(&query).await.map_err(Error::store)?;
    if dry_run {
      return Ok(grapes.len() as u64);
    }

    let now = Utc::now();
    let mut marked = 0;
    for grape in &grapes {
      self.write("mark crawled", || self.store.mark_crawled(grape.grape_id, now)).await?;
      marked += 1;
    }
    Ok(marked)
  }

  /// Relationship progress of one country, looked up by ISO code, exact
  /// name or partial name.
  pub async fn relationship_status(&self, query: &str) -> Result<(Country, RelationshipStatus)> {
    let country = self
      .store
      .find_country(query)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::CountryNotInStore(query.to_owned()))?;
    let status = self.store.relationship_status(country.country_id).await.map_err(Error::store)?;
    Ok((country, status))
  }

  /// Insert every canonical country missing from the store. Returns the
  /// number created.
  pub async fn add_countries(&self) -> Result<u64> {
    let mut created = 0;
    for entry in COUNTRIES {
      let input = NewCountry {
        name:       entry.display_name(),
        iso_code:   entry.iso_code.to_owned(),
        search_url: self.vivc.country_search(entry.iso_code),
      };
      let (country, new) = self.write("ensure country", || self.store.ensure_country(input.clone())).await?;
      if new {
        debug!(country = %country.name, "added country");
        created += 1;
      }
    }
    info!(created, total = COUNTRIES.len(), "countries added");
    Ok(created)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{StubFetcher, country, grape, importer, store};

  #[tokio::test]
  async fn normalize_rewrites_only_unnormalized_values() {
    let s = store().await;
    let g = grape(&s, "1", "PINOT NOIR", None).await;
    s.update_grape(g.grape_id, GrapePatch { berry_color: Some("noir".into()), ..Default::default() })
      .await
      .unwrap();
    let clean = grape(&s, "2", "Riesling", None).await;
    s.update_grape(clean.grape_id, GrapePatch { berry_color: Some("White".into()), ..Default::default() })
      .await
      .unwrap();
    country(&s, "SOUTH AFRICA", "ZAF").await;
    country(&s, "BOSNIA AND HERZEGOVINA", "BIH").await;

    let fetcher = StubFetcher::new();
    let imp = importer(&s, &fetcher);

    let dry = imp.normalize(true).await.unwrap();
    assert_eq!(dry, NormalizeTally { grapes_updated: 1, countries_updated: 2, errors: 0 });
    assert_eq!(s.get_grape("1").await.unwrap().unwrap().name, "PINOT NOIR");

    let tally = imp.normalize(false).await.unwrap();
    assert_eq!(tally, dry);
    let pinot = s.get_grape("1").await.unwrap().unwrap();
    assert_eq!(pinot.name, "Pinot Noir");
    assert_eq!(pinot.berry_color, "Black");
    assert_eq!(s.get_country("ZAF").await.unwrap().unwrap().name, "South Africa");
    // Same casing as the listing import gives the country.
    let bih = s.get_country("BIH").await.unwrap().unwrap();
    assert_eq!(bih.name, "Bosnia and Herzegovina");
    assert_eq!(bih.name, vitis_core::country::lookup("BIH").unwrap().display_name());

    assert_eq!(imp.normalize(false).await.unwrap(), NormalizeTally::default());
  }

  #[test]
  fn normalization_patch_of_clean_grape_is_empty() {
    let now = Utc::now();
    let clean = Grape {
      grape_id:               uuid::Uuid::new_v4(),
      vivc_id:                "1".into(),
      name:                   "Riesling Weiss".into(),
      vivc_url:               String::new(),
      berry_color:            "White".into(),
      species:                "Vitis Vinifera".into(),
      year_of_crossing:       String::new(),
      breeder:                String::new(),
      country_id:             None,
      encyclopedia_image_url: None,
      date_last_crawled:      None,
      created_at:             now,
      updated_at:             now,
    };
    assert!(normalization_patch(&clean).is_empty());
  }

  #[tokio::test]
  async fn mark_crawled_only_touches_grapes_with_parents() {
    let s = store().await;
    let child = grape(&s, "1", "Child", None).await;
    let parent = grape(&s, "2", "Parent", None).await;
    s.add_parent(child.grape_id, parent.grape_id).await.unwrap();

    let fetcher = StubFetcher::new();
    let imp = importer(&s, &fetcher);
    assert_eq!(imp.mark_crawled(true).await.unwrap(), 1);
    assert!(!s.get_grape("1").await.unwrap().unwrap().is_crawled());

    assert_eq!(imp.mark_crawled(false).await.unwrap(), 1);
    assert!(s.get_grape("1").await.unwrap().unwrap().is_crawled());
    assert!(!s.get_grape("2").await.unwrap().unwrap().is_crawled());
    assert_eq!(imp.mark_crawled(false).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn relationship_status_by_partial_name() {
    let s = store().await;
    let fra = country(&s, "France", "FRA").await;
    let a = grape(&s, "1", "A", Some(&fra)).await;
    let b = grape(&s, "2", "B", Some(&fra)).await;
    s.add_parent(a.grape_id, b.grape_id).await.unwrap();

    let fetcher = StubFetcher::new();
    let (found, status) = importer(&s, &fetcher).relationship_status("fran").await.unwrap();
    assert_eq!(found.iso_code, "FRA");
    assert_eq!(status.total, 2);
    assert_eq!(status.resolved, 1);
    assert_eq!(status.unresolved, 1);
    assert_eq!(status.with_parents, 1);
  }

  #[tokio::test]
  async fn relationship_status_of_unknown_country() {
    let s = store().await;
    let fetcher = StubFetcher::new();
    assert!(matches!(
      importer(&s, &fetcher).relationship_status("Atlantis").await,
      Err(Error::CountryNotInStore(_))
    ));
  }

  #[tokio::test]
  async fn add_countries_is_idempotent() {
    let s = store().await;
    country(&s, "France", "FRA").await;
    let fetcher = StubFetcher::new();
    let imp = importer(&s, &fetcher);

    assert_eq!(imp.add_countries().await.unwrap(), COUNTRIES.len() as u64 - 1);
    assert_eq!(imp.add_countries().await.unwrap(), 0);
    let usa = s.get_country("USA").await.unwrap().unwrap();
    assert_eq!(usa.name, "United States of America");
  }
}
