//! Relationship import: parent and child edges for grapes already in the
//! store.
//!
//! A grape counts as resolved once `date_last_crawled` is set or it has a
//! parent edge; resolved grapes are skipped unless forced, which makes the
//! pass resumable. Only grapes already in the store are ever linked.

use chrono::Utc;
use tracing::{debug, info, warn};
use vitis_core::{
  grape::{Grape, GrapeQuery},
  store::GrapeStore,
};

use crate::{
  Error, Fetcher, Importer, Result,
  ancestry::{find_children, get_ancestry},
  config::RelationshipOptions,
  tally::RelationshipTally,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  /// Already resolved; at most the timestamp was backfilled.
  Skipped,
  Resolved { added: u64 },
}

impl<S: GrapeStore, F: Fetcher> Importer<'_, S, F> {
  /// Resolve relationships for the selected grapes, one at a time.
  pub async fn import_relationships(&self, opts: &RelationshipOptions) -> Result<RelationshipTally> {
    let country_id = match &opts.country {
      Some(query) => {
        let country = self
          .store
          .find_country(query)
          .await
          .map_err(Error::store)?
          .ok_or_else(|| Error::CountryNotInStore(query.clone()))?;
        info!(country = %country.name, iso_code = %country.iso_code, "resolving relationships");
        Some(country.country_id)
      }
      None => None,
    };

    let query = GrapeQuery { country_id, limit: opts.limit, ..Default::default() };
    let grapes = self.store.list_grapes(&query).await.map_err(Error::store)?;
    let total = grapes.len();
    let mut tally = RelationshipTally::default();

    for (i, grape) in grapes.iter().enumerate() {
      if (i + 1) % 50 == 0 {
        info!(done = i + 1, total, processed = tally.processed, skipped = tally.skipped, "progress");
      }

      match self.resolve_relationships(grape, opts.force).await {
        Ok(Resolution::Skipped) => {
          debug!(grape = %grape.name, "already resolved");
          tally.skipped += 1;
        }
        Ok(Resolution::Resolved { added }) => {
          tally.processed += 1;
          tally.relationships_added += added;
        }
        Err(e) => {
          warn!(grape = %grape.name, vivc_id = %grape.vivc_id, error = %e, "relationship lookup failed");
          tally.processed += 1;
          tally.errors += 1;
        }
      }
    }

    Ok(tally)
  }

  /// Apply the skip rules to one grape, then link its parents and children
  /// and mark it crawled. On error nothing is marked, but edges already
  /// written are kept.
  pub async fn resolve_relationships(&self, grape: &Grape, force: bool) -> Result<Resolution> {
    if !force && grape.is_crawled() {
      return Ok(Resolution::Skipped);
    }

    if !force {
      let parents = self.store.parents(grape.grape_id).await.map_err(Error::store)?;
      if !parents.is_empty() {
        self
          .write("mark crawled", || self.store.mark_crawled(grape.grape_id, Utc::now()))
          .await?;
        return Ok(Resolution::Skipped);
      }
    }

    let added = self.link_parents(grape).await? + self.link_children(grape).await?;
    self
      .write("mark crawled", || self.store.mark_crawled(grape.grape_id, Utc::now()))
      .await?;
    Ok(Resolution::Resolved { added })
  }

  async fn link_parents(&self, grape: &Grape) -> Result<u64> {
    let tree = get_ancestry(self.fetcher, &self.vivc, &grape.vivc_id).await?;
    let mut added = 0;
    for node in &tree.parents {
      let Some(parent) = self.store.get_grape(&node.vivc_id).await.map_err(Error::store)? else {
        continue;
      };
      if parent.grape_id == grape.grape_id {
        continue;
      }
      if self.write("add parent", || self.store.add_parent(grape.grape_id, parent.grape_id)).await? {
        debug!(child = %grape.name, parent = %parent.name, "linked parent");
        added += 1;
      }
    }
    Ok(added)
  }

  async fn link_children(&self, grape: &Grape) -> Result<u64> {
    let candidates = find_children(self.fetcher, &self.vivc, &grape.name).await?;
    let mut added = 0;
    for candidate in &candidates {
      let Some(vivc_id) = candidate.vivc_id.as_deref() else {
        continue;
      };
      let Some(child) = self.store.get_grape(vivc_id).await.map_err(Error::store)? else {
        continue;
      };
      if child.grape_id == grape.grape_id {
        continue;
      }
      if self.write("add parent", || self.store.add_parent(child.grape_id, grape.grape_id)).await? {
        debug!(child = %child.name, parent = %grape.name, "linked child");
        added += 1;
      }
    }
    Ok(added)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{StubFetcher, country, grape, importer, passport_page, pedigree_page, store, urls};

  #[tokio::test]
  async fn links_existing_parents_and_children() {
    let s = store().await;
    let child = grape(&s, "1", "Müller-Thurgau", None).await;
    let mother = grape(&s, "2", "Riesling Weiss", None).await;
    let grandchild = grape(&s, "5", "Bacchus Weiss", None).await;

    let u = urls();
    let fetcher = StubFetcher::new()
      .page(
        u.passport("1"),
        passport_page("MÜLLER-THURGAU", &[("2", "RIESLING WEISS"), ("3", "MADELEINE ROYALE")]),
      )
      .page(u.passport("2"), passport_page("RIESLING WEISS", &[]))
      .page(u.passport("3"), passport_page("MADELEINE ROYALE", &[]))
      .page(
        u.pedigree_search("Müller-Thurgau"),
        pedigree_page(&[
          ("5", "BACCHUS WEISS", "SILVANER X RIESLING", "MÜLLER-THURGAU"),
          ("6", "NOT STORED", "MÜLLER-THURGAU", "X"),
        ]),
      );

    let imp = importer(&s, &fetcher);
    let outcome = imp.resolve_relationships(&child, false).await.unwrap();
    // Madeleine Royale and child 6 are not stored, so only two edges.
    assert_eq!(outcome, Resolution::Resolved { added: 2 });

    let parents = s.parents(child.grape_id).await.unwrap();
    assert_eq!(parents.iter().map(|p| p.grape_id).collect::<Vec<_>>(), [mother.grape_id]);
    let children = s.children(child.grape_id).await.unwrap();
    assert_eq!(children.iter().map(|c| c.grape_id).collect::<Vec<_>>(), [grandchild.grape_id]);
    assert!(s.get_grape("1").await.unwrap().unwrap().is_crawled());
  }

  #[tokio::test]
  async fn crawled_grape_is_skipped_without_requests() {
    let s = store().await;
    let g = grape(&s, "1", "Riesling", None).await;
    s.mark_crawled(g.grape_id, Utc::now()).await.unwrap();
    let g = s.get_grape("1").await.unwrap().unwrap();

    let fetcher = StubFetcher::new();
    let outcome = importer(&s, &fetcher).resolve_relationships(&g, false).await.unwrap();
    assert_eq!(outcome, Resolution::Skipped);
    assert!(fetcher.requests().is_empty());
  }

  #[tokio::test]
  async fn grape_with_parents_gets_timestamp_backfilled() {
    let s = store().await;
    let g = grape(&s, "1", "Müller-Thurgau", None).await;
    let p = grape(&s, "2", "Riesling", None).await;
    s.add_parent(g.grape_id, p.grape_id).await.unwrap();

    let fetcher = StubFetcher::new();
    let outcome = importer(&s, &fetcher).resolve_relationships(&g, false).await.unwrap();
    assert_eq!(outcome, Resolution::Skipped);
    assert!(fetcher.requests().is_empty());

    let stored = s.get_grape("1").await.unwrap().unwrap();
    assert!(stored.is_crawled());
    assert_eq!(s.parents(g.grape_id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn force_resolves_crawled_grapes() {
    let s = store().await;
    let g = grape(&s, "1", "Riesling", None).await;
    s.mark_crawled(g.grape_id, Utc::now()).await.unwrap();
    let g = s.get_grape("1").await.unwrap().unwrap();

    let u = urls();
    let fetcher = StubFetcher::new()
      .page(u.passport("1"), passport_page("RIESLING", &[]))
      .page(u.pedigree_search("Riesling"), pedigree_page(&[]));
    let outcome = importer(&s, &fetcher).resolve_relationships(&g, true).await.unwrap();
    assert_eq!(outcome, Resolution::Resolved { added: 0 });
    assert_eq!(fetcher.requests().len(), 2);
  }

  #[tokio::test]
  async fn pass_counts_errors_and_leaves_grape_unmarked() {
    let s = store().await;
    let fra = country(&s, "France", "FRA").await;
    grape(&s, "1", "Merlot", Some(&fra)).await;
    grape(&s, "2", "Elsewhere", None).await;

    let fetcher = StubFetcher::new();
    let opts = RelationshipOptions { country: Some("fra".into()), ..Default::default() };
    let tally = importer(&s, &fetcher).import_relationships(&opts).await.unwrap();

    assert_eq!(tally, RelationshipTally { processed: 1, errors: 1, ..Default::default() });
    let uncrawled = s
      .list_grapes(&GrapeQuery { crawled: Some(false), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(uncrawled.len(), 2);
  }

  #[tokio::test]
  async fn unknown_country_is_an_error() {
    let s = store().await;
    let fetcher = StubFetcher::new();
    let opts = RelationshipOptions { country: Some("Atlantis".into()), ..Default::default() };
    assert!(matches!(
      importer(&s, &fetcher).import_relationships(&opts).await,
      Err(Error::CountryNotInStore(_))
    ));
  }
}
