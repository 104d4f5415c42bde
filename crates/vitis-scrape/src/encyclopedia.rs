//! Encyclopedia (MediaWiki) lookups used to find an illustration for grapes
//! VIVC has no photo of.
//!
//! A page only counts as a match when it reads like a grape variety article:
//! [`score_summary`] weighs keywords in the summary and the page categories,
//! and [`accepts`] applies [`ACCEPT_THRESHOLD`].

use std::collections::BTreeMap;

use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

/// Minimum score for a page to be accepted as the grape's article.
pub const ACCEPT_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRef {
  pub source: String,
}

/// The REST `page/summary` payload, reduced to what scoring needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageSummary {
  #[serde(rename = "type", default)]
  pub kind:          String,
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub description:   Option<String>,
  #[serde(default)]
  pub extract:       String,
  #[serde(default)]
  pub originalimage: Option<ImageRef>,
  #[serde(default)]
  pub thumbnail:     Option<ImageRef>,
}

impl PageSummary {
  pub fn is_disambiguation(&self) -> bool { self.kind == "disambiguation" }

  /// Full-size image, falling back to the thumbnail.
  pub fn image_url(&self) -> Option<&str> {
    self
      .originalimage
      .as_ref()
      .or(self.thumbnail.as_ref())
      .map(|i| i.source.as_str())
      .filter(|s| !s.is_empty())
  }
}

// ─── Categories ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct CategoriesResponse {
  #[serde(default)]
  query: Option<CategoryQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryQuery {
  #[serde(default)]
  pages: BTreeMap<String, CategoryPage>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryPage {
  #[serde(default)]
  categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
  title: String,
}

/// Parse a summary payload; `None` for anything that is not one.
pub fn parse_summary(json: &str) -> Option<PageSummary> { serde_json::from_str(json).ok() }

/// Category titles from a `prop=categories` query response.
pub fn parse_categories(json: &str) -> Vec<String> {
  serde_json::from_str::<CategoriesResponse>(json)
    .ok()
    .and_then(|r| r.query)
    .map(|q| {
      q.pages
        .into_values()
        .flat_map(|p| p.categories)
        .map(|c| c.title)
        .collect()
    })
    .unwrap_or_default()
}

// ─── Scoring ────────────────────────────────────────────────────────────────

const TEXT_WEIGHTS: &[(&[&str], u32)] = &[
  (&["grape"], 2),
  (&["variety", "cultivar"], 2),
  (&["vitis"], 2),
  (&["wine"], 1),
  (&["berry", "vine"], 1),
];

const CATEGORY_WEIGHTS: &[(&str, u32)] = &[("grape varieties", 3), ("grape", 2), ("wine", 1)];

/// How strongly a page looks like a grape variety article. Each keyword
/// group in the summary text and each category weight counts once.
pub fn score_summary(summary: &PageSummary, categories: &[String]) -> u32 {
  let text = format!(
    "{} {}",
    summary.extract,
    summary.description.as_deref().unwrap_or_default()
  )
  .to_lowercase();

  let from_text: u32 = TEXT_WEIGHTS
    .iter()
    .filter(|(words, _)| words.iter().any(|w| text.contains(w)))
    .map(|(_, weight)| weight)
    .sum();

  let categories: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
  let from_categories: u32 = CATEGORY_WEIGHTS
    .iter()
    .filter(|(needle, _)| categories.iter().any(|c| c.contains(needle)))
    .map(|(_, weight)| weight)
    .sum();

  from_text + from_categories
}

/// Image URL of an accepted page: not a disambiguation page, illustrated,
/// and scoring at least [`ACCEPT_THRESHOLD`].
pub fn accepts<'a>(summary: &'a PageSummary, categories: &[String]) -> Option<&'a str> {
  if summary.is_disambiguation() || score_summary(summary, categories) < ACCEPT_THRESHOLD {
    return None;
  }
  summary.image_url()
}

/// Page titles to try for a grape, most specific first.
pub fn candidate_titles(grape_name: &str) -> [String; 2] {
  let name = grape_name.trim();
  [format!("{name} (grape)"), name.to_owned()]
}

// ─── URLs ───────────────────────────────────────────────────────────────────

/// Builds encyclopedia API URLs relative to a wiki's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncyclopediaUrls {
  base: Url,
}

impl EncyclopediaUrls {
  pub fn new(base: &str) -> Result<Self> { Ok(Self { base: Url::parse(base)? }) }

  fn page_title(title: &str) -> String { title.trim().replace(' ', "_") }

  /// `{base}/api/rest_v1/page/summary/{title}`
  pub fn summary(&self, title: &str) -> Result<String> {
    let title = Self::page_title(title);
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| Error::NotABase(self.base.to_string()))?
      .clear()
      .extend(["api", "rest_v1", "page", "summary", title.as_str()]);
    Ok(url.into())
  }

  /// Action API query for the categories of `title`.
  pub fn categories(&self, title: &str) -> Result<String> {
    let title = Self::page_title(title);
    let mut url = self.base.join("/w/api.php")?;
    url.query_pairs_mut().extend_pairs([
      ("action", "query"),
      ("prop", "categories"),
      ("titles", title.as_str()),
      ("format", "json"),
      ("cllimit", "max"),
    ]);
    Ok(url.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SUMMARY: &str = r#"{
    "type": "standard",
    "title": "Blaufränkisch",
    "description": "Variety of grape",
    "extract": "Blaufränkisch is a dark-skinned variety of grape used for red wine.",
    "thumbnail": { "source": "https://upload.example/thumb.jpg", "width": 320 },
    "originalimage": { "source": "https://upload.example/full.jpg", "width": 2000 }
  }"#;

  const CATEGORIES: &str = r#"{
    "batchcomplete": "",
    "query": { "pages": { "4242": {
      "pageid": 4242, "ns": 0, "title": "Blaufränkisch",
      "categories": [
        { "ns": 14, "title": "Category:Red wine grape varieties" },
        { "ns": 14, "title": "Category:Austrian wine" }
      ]
    } } }
  }"#;

  #[test]
  fn parses_summary_and_prefers_original_image() {
    let s = parse_summary(SUMMARY).unwrap();
    assert_eq!(s.kind, "standard");
    assert_eq!(s.image_url(), Some("https://upload.example/full.jpg"));
  }

  #[test]
  fn parses_categories() {
    assert_eq!(
      parse_categories(CATEGORIES),
      vec!["Category:Red wine grape varieties", "Category:Austrian wine"]
    );
    assert!(parse_categories(r#"{"batchcomplete": ""}"#).is_empty());
    assert!(parse_categories("not json").is_empty());
  }

  #[test]
  fn scores_text_and_categories() {
    let s = parse_summary(SUMMARY).unwrap();
    // grape + variety + wine from the text.
    assert_eq!(score_summary(&s, &[]), 5);
    // grape varieties + grape + wine from the first category.
    assert_eq!(score_summary(&s, &parse_categories(CATEGORIES)), 11);
  }

  #[test]
  fn rejects_unrelated_and_disambiguation_pages() {
    let town = PageSummary {
      kind: "standard".into(),
      extract: "Lemberg is a town in Styria.".into(),
      thumbnail: Some(ImageRef { source: "https://upload.example/town.jpg".into() }),
      ..Default::default()
    };
    assert_eq!(accepts(&town, &[]), None);

    let mut disambiguation = parse_summary(SUMMARY).unwrap();
    disambiguation.kind = "disambiguation".into();
    assert_eq!(accepts(&disambiguation, &[]), None);
  }

  #[test]
  fn accepts_requires_an_image() {
    let mut s = parse_summary(SUMMARY).unwrap();
    assert_eq!(accepts(&s, &[]), Some("https://upload.example/full.jpg"));
    s.originalimage = None;
    s.thumbnail = None;
    assert_eq!(accepts(&s, &[]), None);
  }

  #[test]
  fn candidate_titles_most_specific_first() {
    assert_eq!(candidate_titles(" Merlot "), ["Merlot (grape)".to_owned(), "Merlot".to_owned()]);
  }

  #[test]
  fn builds_api_urls() {
    let urls = EncyclopediaUrls::new("https://en.wikipedia.org").unwrap();
    assert_eq!(
      urls.summary("Merlot (grape)").unwrap(),
      "https://en.wikipedia.org/api/rest_v1/page/summary/Merlot_(grape)"
    );
    let categories = urls.categories("Pinot noir").unwrap();
    assert!(categories.starts_with("https://en.wikipedia.org/w/api.php?action=query&prop=categories"));
    assert!(categories.contains("titles=Pinot_noir"));
  }
}
