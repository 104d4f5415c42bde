//! Ancestry and descendant lookups against VIVC.
//!
//! [`get_ancestry`] walks passport pages from a cultivar up through its
//! parents. One visited set is shared by the whole walk: a cultivar reached
//! twice is expanded only the first time, which also ends the walk on
//! cyclic pedigrees.

use std::{collections::HashSet, future::Future, pin::Pin};

use serde::Serialize;
use vitis_scrape::{
  VivcUrls,
  passport::parse_passport,
  pedigree::{ChildCandidate, parse_children},
  search::{SearchHit, parse_cultivar_search},
};

use crate::{Fetcher, error::FetchError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AncestryNode {
  pub vivc_id: String,
  pub name:    String,
  pub parents: Vec<AncestryNode>,
}

impl AncestryNode {
  fn leaf(vivc_id: String, name: String) -> Self { Self { vivc_id, name, parents: Vec::new() } }

  /// Render the tree one cultivar per line, indented by depth.
  pub fn render(&self) -> String {
    let mut out = String::new();
    self.render_into(&mut out, 0);
    out
  }

  fn render_into(&self, out: &mut String, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&format!("{} (VIVC {})\n", self.name, self.vivc_id));
    for parent in &self.parents {
      parent.render_into(out, depth + 1);
    }
  }
}

type Walk<'a> = Pin<Box<dyn Future<Output = Result<Option<AncestryNode>, FetchError>> + Send + 'a>>;

/// The ancestry tree of `vivc_id`.
///
/// Failing to fetch the root is an error. A parent whose page cannot be
/// fetched becomes a leaf named after the link that led to it.
pub async fn get_ancestry<F: Fetcher>(
  fetcher: &F,
  urls: &VivcUrls,
  vivc_id: &str,
) -> Result<AncestryNode, FetchError> {
  let mut visited = HashSet::new();
  let root = walk(fetcher, urls, vivc_id.to_owned(), None, &mut visited).await?;
  // The visited set starts empty, so the root is always expanded.
  Ok(root.unwrap_or_else(|| AncestryNode::leaf(vivc_id.to_owned(), vivc_id.to_owned())))
}

fn walk<'a, F: Fetcher>(
  fetcher: &'a F,
  urls: &'a VivcUrls,
  vivc_id: String,
  link_name: Option<String>,
  visited: &'a mut HashSet<String>,
) -> Walk<'a> {
  Box::pin(async move {
    if !visited.insert(vivc_id.clone()) {
      return Ok(None);
    }

    let html = fetcher.fetch(&urls.passport(&vivc_id)).await?;
    let passport = parse_passport(&html);
    let name = passport
      .prime_name
      .clone()
      .or(link_name)
      .unwrap_or_else(|| vivc_id.clone());

    let mut parents = Vec::new();
    for link in passport.parents() {
      let walked = walk(
        fetcher,
        urls,
        link.vivc_id.clone(),
        Some(link.name.clone()),
        &mut *visited,
      )
      .await;
      match walked {
        Ok(Some(node)) => parents.push(node),
        Ok(None) => {}
        Err(e) => {
          tracing::warn!(vivc_id = %link.vivc_id, error = %e, "parent page unavailable");
          parents.push(AncestryNode::leaf(link.vivc_id.clone(), link.name.clone()));
        }
      }
    }

    Ok(Some(AncestryNode { vivc_id, name, parents }))
  })
}

/// Cultivars whose pedigree names `parent_name` as either parent.
pub async fn find_children<F: Fetcher>(
  fetcher: &F,
  urls: &VivcUrls,
  parent_name: &str,
) -> Result<Vec<ChildCandidate>, FetchError> {
  let html = fetcher.fetch(&urls.pedigree_search(parent_name)).await?;
  Ok(parse_children(&html, parent_name, urls))
}

/// Resolve a cultivar name to its VIVC entry: an exact (case-insensitive)
/// name match if the search returns one, else the first hit.
pub async fn resolve_cultivar<F: Fetcher>(
  fetcher: &F,
  urls: &VivcUrls,
  name: &str,
) -> Result<Option<SearchHit>, FetchError> {
  let html = fetcher.fetch(&urls.cultivar_search(name)).await?;
  let mut hits = parse_cultivar_search(&html, urls);
  let exact = hits.iter().position(|h| h.name.eq_ignore_ascii_case(name.trim()));
  Ok(match exact {
    Some(i) => Some(hits.swap_remove(i)),
    None => hits.into_iter().next(),
  })
}
