//! Test doubles: a fetcher serving canned pages and page builders.

use std::{collections::HashMap, sync::Mutex};

use vitis_core::{
  country::{Country, NewCountry},
  grape::{Grape, NewGrape},
  store::GrapeStore,
};
use vitis_scrape::{VivcUrls, encyclopedia::EncyclopediaUrls};
use vitis_store_sqlite::SqliteStore;

use crate::{
  Fetcher, Importer,
  config::{Pacing, RetryPolicy},
  error::FetchError,
};

pub const BASE: &str = "https://www.vivc.de";
pub const WIKI: &str = "https://en.wikipedia.org";

pub fn urls() -> VivcUrls { VivcUrls::new(BASE).unwrap() }

pub fn wiki() -> EncyclopediaUrls { EncyclopediaUrls::new(WIKI).unwrap() }

/// Serves pages registered with [`StubFetcher::page`]; anything else is
/// [`FetchError::Missing`]. Every requested URL is recorded.
#[derive(Default)]
pub struct StubFetcher {
  pages:    HashMap<String, String>,
  requests: Mutex<Vec<String>>,
}

impl StubFetcher {
  pub fn new() -> Self { Self::default() }

  pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
    self.pages.insert(url.into(), html.into());
    self
  }

  pub fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }
}

impl Fetcher for StubFetcher {
  async fn fetch<'a>(&'a self, url: &'a str) -> Result<String, FetchError> {
    self.requests.lock().unwrap().push(url.to_owned());
    self
      .pages
      .get(url)
      .cloned()
      .ok_or_else(|| FetchError::Missing { url: url.to_owned() })
  }
}

pub async fn store() -> SqliteStore { SqliteStore::open_in_memory().await.unwrap() }

pub fn importer<'a>(store: &'a SqliteStore, fetcher: &'a StubFetcher) -> Importer<'a, SqliteStore, StubFetcher> {
  Importer {
    store,
    fetcher,
    vivc: urls(),
    encyclopedia: wiki(),
    pacing: Pacing::NONE,
    retry: RetryPolicy::NONE,
  }
}

pub async fn country(store: &SqliteStore, name: &str, iso_code: &str) -> Country {
  let (country, _) = store
    .ensure_country(NewCountry {
      name:       name.into(),
      iso_code:   iso_code.into(),
      search_url: urls().country_search(iso_code),
    })
    .await
    .unwrap();
  country
}

pub async fn grape(store: &SqliteStore, vivc_id: &str, name: &str, country: Option<&Country>) -> Grape {
  store
    .insert_grape(NewGrape {
      vivc_id: vivc_id.into(),
      name: name.into(),
      vivc_url: urls().passport(vivc_id),
      country_id: country.map(|c| c.country_id),
      ..Default::default()
    })
    .await
    .unwrap()
}

// ─── Page builders ───────────────────────────────────────────────────────────

/// A passport page with a prime name and linked parents `(id, name)`.
pub fn passport_page(name: &str, parents: &[(&str, &str)]) -> String {
  let mut rows = format!("<tr><th>Prime name</th><td>{name}</td></tr>");
  for (i, (id, parent)) in parents.iter().enumerate() {
    rows.push_str(&format!(
      r#"<tr><th>Prime name of parent {}</th><td><a href="index.php?r=passport%2Fview&amp;id={id}">{parent}</a></td></tr>"#,
      i + 1
    ));
  }
  format!(r#"<html><body><div class="passport-view"><table>{rows}</table></div></body></html>"#)
}

/// A pedigree search result page with rows `(id, name, parent 1, parent 2)`.
pub fn pedigree_page(rows: &[(&str, &str, &str, &str)]) -> String {
  let body: String = rows
    .iter()
    .map(|(id, name, p1, p2)| {
      format!(
        r#"<tr><td><a href="index.php?r=passport%2Fview&amp;id={id}">{name}</a></td>
           <td>VITIS VINIFERA</td><td>{p1}</td><td>{p2}</td></tr>"#
      )
    })
    .collect();
  format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

/// A country listing page with rows `(id, name, color)`.
pub fn listing_page(rows: &[(&str, &str, &str)]) -> String {
  let body: String = rows
    .iter()
    .map(|(id, name, color)| {
      format!(
        r##"<tr><td><a href="index.php?r=passport%2Fview&amp;id={id}">{name}</a></td>
           <td>WINE GRAPE</td><td>VITIS VINIFERA</td><td><a href="#">{color}</a></td></tr>"##
      )
    })
    .collect();
  format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

/// A photo listing page with rows `(vivc id, image src, onclick)`.
pub fn photo_page(rows: &[(&str, &str, &str)], next: bool) -> String {
  let body: String = rows
    .iter()
    .map(|(id, src, onclick)| {
      format!(
        r#"<tr><td>NAME</td><td>NAME</td><td><a href="index.php?r=passport&amp;kenn_nr={id}">{id}</a></td>
           <td></td><td></td><td></td>
           <td><a href="javascript:void(0)" onclick="{onclick}"><img src="{src}"></a></td></tr>"#
      )
    })
    .collect();
  let pager = if next { r#"<ul class="pagination"><li><a href="?page=2">»</a></li></ul>"# } else { "" };
  format!(
    "<html><body><table><tr><th>Prime name</th><th>Name</th><th>VIVC</th></tr>{body}</table>{pager}</body></html>"
  )
}
