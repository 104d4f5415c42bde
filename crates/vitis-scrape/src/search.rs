//! Cultivar name search, used to resolve an operator-supplied name to a
//! VIVC id.

use scraper::Html;

use crate::{VivcUrls, dom, urls::vivc_id_from_href};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
  pub vivc_id: String,
  pub name:    String,
  pub url:     String,
}

/// All linked hits of a cultivar search, in page order.
pub fn parse_cultivar_search(html: &str, urls: &VivcUrls) -> Vec<SearchHit> {
  let doc = Html::parse_document(html);
  let Some(rows) = dom::first_tbody_rows(&doc) else {
    return Vec::new();
  };

  rows
    .into_iter()
    .filter_map(|row| {
      let cells = dom::cells(row, false);
      if cells.len() < 2 {
        return None;
      }
      let link = dom::find(cells[0], "a")?;
      let href = link.value().attr("href")?;
      Some(SearchHit {
        vivc_id: vivc_id_from_href(href)?,
        name:    dom::text(link),
        url:     urls.absolutize(href)?,
      })
    })
    .collect()
}
