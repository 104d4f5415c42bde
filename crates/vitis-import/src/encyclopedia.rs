//! Encyclopedia image backfill for grapes VIVC has no photo of.

use tracing::{debug, info, warn};
use vitis_core::{
  grape::{Grape, GrapeQuery},
  store::GrapeStore,
};
use vitis_scrape::encyclopedia::{accepts, candidate_titles, parse_categories, parse_summary};

use crate::{Error, Fetcher, Importer, Result, config::BackfillOptions, tally::BackfillTally};

/// Grapes eligible for a lookup. Names containing digits are breeding
/// numbers, which never have an article.
pub fn is_candidate(grape: &Grape) -> bool {
  !grape.name.trim().is_empty() && !grape.name.chars().any(|c| c.is_ascii_digit())
}

impl<S: GrapeStore, F: Fetcher> Importer<'_, S, F> {
  pub async fn backfill_images(&self, opts: &BackfillOptions) -> Result<BackfillTally> {
    let query = GrapeQuery {
      without_photos: true,
      without_encyclopedia_image: !opts.update_existing,
      ..Default::default()
    };
    let grapes = self.store.list_grapes(&query).await.map_err(Error::store)?;
    let candidates: Vec<&Grape> = grapes
      .iter()
      .filter(|g| is_candidate(g))
      .take(opts.limit.unwrap_or(usize::MAX))
      .collect();
    info!(candidates = candidates.len(), dry_run = opts.dry_run, "looking up encyclopedia images");

    let mut tally = BackfillTally::default();
    for (i, grape) in candidates.iter().enumerate() {
      if i > 0 {
        self.pause(self.pacing.encyclopedia).await;
      }

      let Some(image) = self.find_image(&grape.name).await? else {
        debug!(grape = %grape.name, "no encyclopedia match");
        tally.not_found += 1;
        continue;
      };
      tally.found += 1;
      info!(grape = %grape.name, image = %image, "encyclopedia match");

      if opts.dry_run || grape.encyclopedia_image_url.as_deref() == Some(image.as_str()) {
        continue;
      }
      let stored = self
        .write("set encyclopedia image", || {
          self.store.set_encyclopedia_image(grape.grape_id, Some(image.clone()))
        })
        .await;
      if let Err(e) = stored {
        warn!(grape = %grape.name, error = %e, "could not store encyclopedia image");
        tally.errors += 1;
      }
    }

    Ok(tally)
  }

  /// Image of the first candidate page that reads like an article about
  /// the grape. Unreachable pages are misses.
  pub async fn find_image(&self, grape_name: &str) -> Result<Option<String>> {
    for title in candidate_titles(grape_name) {
      let summary_url = self.encyclopedia.summary(&title)?;
      let summary = match self.fetcher.fetch(&summary_url).await {
        Ok(json) => parse_summary(&json),
        Err(e) => {
          debug!(title = %title, error = %e, "no summary");
          None
        }
      };
      let Some(summary) = summary else {
        continue;
      };
      if summary.is_disambiguation() {
        continue;
      }

      let categories = match self.fetcher.fetch(&self.encyclopedia.categories(&title)?).await {
        Ok(json) => parse_categories(&json),
        Err(e) => {
          debug!(title = %title, error = %e, "no categories");
          Vec::new()
        }
      };
      if let Some(image) = accepts(&summary, &categories) {
        return Ok(Some(image.to_owned()));
      }
    }
    Ok(None)
  }
}
