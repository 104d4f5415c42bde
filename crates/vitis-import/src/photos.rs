//! Photo import from the VIVC photo listings.
//!
//! Photo types are processed in the order given, laboratory first by
//! default. A field photo is not stored for a grape that already has a
//! laboratory photo. Attribution comes from the listing row when present,
//! otherwise from the photo's popup page.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vitis_core::{
  grape::Grape,
  photo::{GrapePhoto, NewPhoto, PhotoType},
  store::{GrapeStore, StoreError},
};
use vitis_scrape::{
  photos::{PhotoCandidate, PhotoRow, parse_photo_rows},
  popup::extract_source,
  urls::normalize_url,
};

use crate::{Error, Fetcher, Importer, Result, config::PhotoOptions, retry::with_retry, tally::PhotoTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOutcome {
  Imported,
  /// An existing photo without attribution received one.
  SourceUpdated,
  /// Already stored, with or without a source to add.
  Skipped,
  /// Field photo of a grape that has a laboratory photo.
  LowerPriority,
  NotInStore,
}

/// Mutable state of one photo pass.
struct PhotoRun {
  tally:      PhotoTally,
  popup_dump: Option<PathBuf>,
}

impl PhotoRun {
  /// Write `html` to the dump path, once per run. A failed write is logged
  /// and never affects the row being imported.
  async fn dump_popup(&mut self, html: &str) {
    let Some(path) = self.popup_dump.take() else {
      return;
    };
    match tokio::fs::write(&path, html).await {
      Ok(()) => info!(path = %path.display(), "saved popup html"),
      Err(e) => warn!(path = %path.display(), error = %e, "could not save popup html"),
    }
  }
}

impl<S: GrapeStore, F: Fetcher> Importer<'_, S, F> {
  pub async fn import_photos(&self, opts: &PhotoOptions) -> Result<PhotoTally> {
    let mut run = PhotoRun { tally: PhotoTally::default(), popup_dump: opts.save_popup_html.clone() };

    for &photo_type in &opts.types {
      info!(photo_type = %photo_type, "importing photos");
      if !self.import_photo_type(photo_type, opts.page_limit, &mut run).await {
        break;
      }
    }

    Ok(run.tally)
  }

  /// Walk the listing of one photo type. Returns `false` when a page could
  /// not be fetched, which ends the whole pass.
  async fn import_photo_type(&self, photo_type: PhotoType, page_limit: Option<usize>, run: &mut PhotoRun) -> bool {
    let mut page = 1;
    loop {
      if page_limit.is_some_and(|limit| page > limit) {
        info!(photo_type = %photo_type, limit = page - 1, "page limit reached");
        return true;
      }

      let url = self.vivc.photo_listing(photo_type.label(), page);
      let html = match self.fetcher.fetch(&url).await {
        Ok(html) => html,
        Err(e) => {
          warn!(photo_type = %photo_type, page, error = %e, "photo listing unavailable, stopping");
          run.tally.errors += 1;
          return false;
        }
      };
      let Some(listing) = parse_photo_rows(&html, &self.vivc) else {
        info!(photo_type = %photo_type, page, "no photo table, done");
        return true;
      };
      debug!(photo_type = %photo_type, page, rows = listing.rows.len(), "photo page");

      for row in &listing.rows {
        match self.import_photo_row(row, photo_type, run).await {
          Ok(PhotoOutcome::Imported) => {
            run.tally.photos_imported += 1;
            self.pause(self.pacing.row).await;
          }
          Ok(PhotoOutcome::SourceUpdated) => run.tally.sources_updated += 1,
          Ok(PhotoOutcome::Skipped) => run.tally.skipped += 1,
          Ok(PhotoOutcome::LowerPriority) => run.tally.lower_priority += 1,
          Ok(PhotoOutcome::NotInStore) => run.tally.not_in_store += 1,
          Err(e) => {
            warn!(vivc_id = ?row.vivc_id, error = %e, "photo row failed");
            run.tally.errors += 1;
          }
        }
      }

      info!(
        photo_type = %photo_type,
        page,
        imported = run.tally.photos_imported,
        skipped = run.tally.skipped,
        errors = run.tally.errors,
        "page done"
      );
      if !listing.has_next_page {
        return true;
      }
      page += 1;
      self.pause(self.pacing.page).await;
    }
  }

  async fn import_photo_row(&self, row: &PhotoRow, photo_type: PhotoType, run: &mut PhotoRun) -> Result<PhotoOutcome> {
    let (Some(vivc_id), Some(candidate)) = (&row.vivc_id, &row.candidate) else {
      debug!(row = ?row, "incomplete photo row");
      return Ok(PhotoOutcome::Skipped);
    };

    let Some(grape) = self.store.get_grape(vivc_id).await.map_err(Error::store)? else {
      return Ok(PhotoOutcome::NotInStore);
    };
    let existing = self.store.photos(grape.grape_id).await.map_err(Error::store)?;

    if photo_type == PhotoType::Field && existing.iter().any(|p| p.photo_type == PhotoType::Laboratory) {
      return Ok(PhotoOutcome::LowerPriority);
    }

    if let Some(stored) = find_stored(&existing, &candidate.photo_url) {
      if stored.has_source() {
        return Ok(PhotoOutcome::Skipped);
      }
      let Some(source) = self.photo_source(candidate, run).await? else {
        return Ok(PhotoOutcome::Skipped);
      };
      self
        .write("set photo source", || self.store.set_photo_source(stored.photo_id, source.clone()))
        .await?;
      debug!(grape = %grape.name, "added missing photo source");
      return Ok(PhotoOutcome::SourceUpdated);
    }

    let source = self.photo_source(candidate, run).await?.unwrap_or_default();
    self.store_photo(&grape, candidate, source, photo_type).await
  }

  async fn store_photo(
    &self,
    grape: &Grape,
    candidate: &PhotoCandidate,
    source: String,
    photo_type: PhotoType,
  ) -> Result<PhotoOutcome> {
    let input = NewPhoto { grape_id: grape.grape_id, url: candidate.photo_url.clone(), source, photo_type };
    match with_retry(self.retry, "add photo", || self.store.add_photo(input.clone())).await {
      Ok(photo) => {
        debug!(grape = %grape.name, url = %photo.url, has_source = photo.has_source(), "stored photo");
        Ok(PhotoOutcome::Imported)
      }
      Err(e) if e.is_duplicate() => Ok(PhotoOutcome::Skipped),
      Err(e) => Err(Error::store(e)),
    }
  }

  /// Attribution for a photo: inline in the row, else from its popup page.
  /// An unavailable popup gives no source rather than an error.
  async fn photo_source(&self, candidate: &PhotoCandidate, run: &mut PhotoRun) -> Result<Option<String>> {
    if let Some(source) = &candidate.source {
      return Ok(Some(source.clone()));
    }
    let Some(popup_url) = &candidate.popup_url else {
      return Ok(None);
    };
    let html = match self.fetcher.fetch(popup_url).await {
      Ok(html) => html,
      Err(e) => {
        warn!(url = %popup_url, error = %e, "popup unavailable");
        return Ok(None);
      }
    };
    run.dump_popup(&html).await;
    Ok(extract_source(&html))
  }
}

/// The stored photo at `url`, matched exactly and then ignoring query,
/// fragment and trailing slashes.
fn find_stored<'p>(photos: &'p [GrapePhoto], url: &str) -> Option<&'p GrapePhoto> {
  photos.iter().find(|p| p.url == url).or_else(|| {
    let wanted = normalize_url(url);
    photos.iter().find(|p| normalize_url(&p.url) == wanted)
  })
}

/// Whether `path` is usable for a popup dump: its parent directory exists.
pub fn popup_dump_target_ok(path: &Path) -> bool {
  match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir.is_dir(),
    _ => true,
  }
}
