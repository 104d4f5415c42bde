//! Photo listing pages (`fotoverweise/result`).
//!
//! The listing shares its table with a row of filter controls, so data rows
//! are recognised by shape. Column 3 holds the VIVC variety number, column 7
//! the thumbnail, whose enclosing link may carry the attribution in its
//! `onclick` handler.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::{
  VivcUrls, attribution, dom,
  urls::{is_numeric, kenn_nr_from_href},
};

/// Photo URL, and whatever the listing row tells us about its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCandidate {
  pub photo_url: String,
  /// Attribution found inline in the row.
  pub source:    Option<String>,
  /// Detail popup that can be fetched when `source` is missing.
  pub popup_url: Option<String>,
}

/// A data row. Either half may be missing on malformed rows; the importer
/// logs and skips those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRow {
  pub vivc_id:   Option<String>,
  pub candidate: Option<PhotoCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoPage {
  pub rows:          Vec<PhotoRow>,
  pub has_next_page: bool,
}

/// Rows whose first cells span more lines than this are filter rows.
const MAX_ROW_NEWLINES: usize = 5;
const VIVC_ID_CELL: usize = 2;
const PHOTO_CELL: usize = 6;

/// Parse a photo listing page. `None` when the page has no table.
pub fn parse_photo_rows(html: &str, urls: &VivcUrls) -> Option<PhotoPage> {
  let doc = Html::parse_document(html);
  let table = doc.select(&dom::selector("table")?).next()?;
  let tr = dom::selector("tr")?;

  let rows = table
    .select(&tr)
    .skip(1)
    .filter_map(|row| {
      let cells = dom::cells(row, false);
      if cells.len() < 3 || is_filter_row(row, &cells) {
        return None;
      }
      Some(PhotoRow {
        vivc_id:   vivc_id_from_cell(cells[VIVC_ID_CELL]),
        candidate: cells.get(PHOTO_CELL).and_then(|cell| photo_candidate(*cell, urls)),
      })
    })
    .collect();

  Some(PhotoPage { rows, has_next_page: has_next_page(&doc) })
}

fn is_filter_row(row: ElementRef<'_>, cells: &[ElementRef<'_>]) -> bool {
  if dom::find(row, "select").is_some() {
    return true;
  }
  let newlines: usize = cells
    .iter()
    .take(3)
    .map(|c| dom::raw_text(*c).matches('\n').count())
    .sum();
  newlines > MAX_ROW_NEWLINES
}

/// VIVC id from a `kenn_nr=` link, numeric link text, or numeric cell text.
fn vivc_id_from_cell(cell: ElementRef<'_>) -> Option<String> {
  if let Some(link) = dom::find(cell, "a") {
    if let Some(id) = link.value().attr("href").and_then(kenn_nr_from_href) {
      return Some(id);
    }
    let text = dom::raw_text(link).trim().to_owned();
    if is_numeric(&text) {
      return Some(text);
    }
  }
  let text: String = dom::raw_text(cell).trim().chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
  is_numeric(&text).then_some(text)
}

fn photo_candidate(cell: ElementRef<'_>, urls: &VivcUrls) -> Option<PhotoCandidate> {
  let img = dom::find(cell, "img");
  let mut photo_url = img.and_then(|i| i.value().attr("src")).and_then(|src| urls.absolutize(src));
  let mut source = None;
  let mut popup_url = None;

  if let Some(link) = img.and_then(|i| dom::closest(i, &["a"])) {
    let onclick = link.value().attr("onclick").unwrap_or_default();
    if !onclick.is_empty() {
      source = attribution::extract_attribution(onclick);
    }

    popup_url = ["data-url", "data-href", "data-popup", "data-modal"]
      .iter()
      .find_map(|attr| link.value().attr(attr).filter(|v| !v.is_empty()))
      .map(str::to_owned)
      .or_else(|| popup_url_from_onclick(onclick))
      .and_then(|u| urls.absolutize(&u));

    if photo_url.is_none() {
      photo_url = link.value().attr("href").and_then(|h| urls.absolutize(h));
    }
  }

  let photo_url = photo_url.or_else(|| {
    dom::find(cell, "a")
      .and_then(|a| a.value().attr("href"))
      .and_then(|h| urls.absolutize(h))
  })?;

  Some(PhotoCandidate { photo_url, source, popup_url })
}

static POPUP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r#"(?i)window\.open\(["']([^"']+)["']"#,
    r#"(?i)href\s*=\s*["']([^"']+)["']"#,
    r#"(?i)url["']?\s*[:=]\s*["']([^"']+)["']"#,
    r#"(?i)["']([^"']*foto[^"']*view[^"']*)["']"#,
    r#"(?i)["']([^"']*index\.php[^"']*foto[^"']*)["']"#,
    r#"(?i)["']([^"']*fotoverweise[^"']*)["']"#,
    r#"(?i)(https?://[^"'\s\)]+foto[^"'\s\)]*)"#,
    r#"(?i)(https?://[^"'\s\)]+fotoverweise[^"'\s\)]*)"#,
  ]
  .iter()
  .filter_map(|p| Regex::new(p).ok())
  .collect()
});

/// Popup URL referenced by an `onclick` handler, unresolved. Patterns are
/// tried in order and the first match wins.
pub fn popup_url_from_onclick(onclick: &str) -> Option<String> {
  POPUP_PATTERNS
    .iter()
    .find_map(|re| re.captures(onclick)?.get(1))
    .map(|m| m.as_str().to_owned())
}

fn has_next_page(doc: &Html) -> bool {
  let Some(anchors) = dom::selector("a") else {
    return false;
  };
  if doc.select(&anchors).any(|a| dom::raw_text(a).trim() == "»") {
    return true;
  }

  let Some(pagination) =
    dom::selector("div.pagination, ul.pagination").and_then(|s| doc.select(&s).next())
  else {
    return false;
  };
  pagination.select(&anchors).any(|a| {
    let text = dom::raw_text(a).to_lowercase();
    text.contains("next") || text.contains('»')
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn urls() -> VivcUrls { VivcUrls::new("https://www.vivc.de").unwrap() }

  const ONCLICK: &str = "openPhoto('index.php?r=fotoverweise%2Fview&amp;id=9001'); \
                         note('Please note: Please quote the source as indicated below:', \
                         'Doris Schneider, Julius Kuehn-Institut (JKI), Institute for Grapevine \
                         Breeding Geilweilerhof, 76833 Siebeldingen, GERMANY'); return false;";

  fn page(rows: &str, pager: &str) -> String {
    format!(
      r#"<html><body><table>
        <tr><th>Prime name</th><th>Name</th><th>VIVC</th><th>a</th><th>b</th><th>c</th><th>Photo</th></tr>
        <tr><td><select><option>x</option></select></td><td></td><td></td></tr>
        {rows}
      </table>{pager}</body></html>"#
    )
  }

  fn row(vivc_cell: &str, photo_cell: &str) -> String {
    format!(
      "<tr><td>RIESLING WEISS</td><td>RIESLING</td><td>{vivc_cell}</td>\
       <td></td><td></td><td></td><td>{photo_cell}</td></tr>"
    )
  }

  #[test]
  fn filter_rows_are_skipped() {
    let tall = "<tr><td>a\n\n\n</td><td>\n\n\n</td><td>1</td></tr>";
    let html = page(&format!("{tall}<tr><td>x</td><td>y</td></tr>"), "");
    let parsed = parse_photo_rows(&html, &urls()).unwrap();
    assert!(parsed.rows.is_empty());
  }

  #[test]
  fn reads_inline_source_and_popup() {
    let photo = format!(
      r#"<a href="javascript:void(0)" onclick="{ONCLICK}"><img src="/fotos/thumb_9001.jpg"></a>"#
    );
    let html = page(&row(r#"<a href="index.php?r=passport&amp;kenn_nr=10077">x</a>"#, &photo), "");
    let parsed = parse_photo_rows(&html, &urls()).unwrap();

    assert_eq!(parsed.rows.len(), 1);
    let r = &parsed.rows[0];
    assert_eq!(r.vivc_id.as_deref(), Some("10077"));
    let c = r.candidate.as_ref().unwrap();
    assert_eq!(c.photo_url, "https://www.vivc.de/fotos/thumb_9001.jpg");
    assert!(c.source.as_deref().unwrap().starts_with("Doris Schneider, Julius Kuehn-Institut"));
    assert_eq!(
      c.popup_url.as_deref(),
      Some("https://www.vivc.de/index.php?r=fotoverweise%2Fview&id=9001")
    );
    assert!(!parsed.has_next_page);
  }

  #[test]
  fn data_attribute_beats_onclick() {
    let photo = r#"<a href="/fotos/big.jpg" data-popup="/popup/7" onclick="window.open('/other')"><img src=""></a>"#;
    let html = page(&row("4419", photo), "");
    let c = parse_photo_rows(&html, &urls()).unwrap().rows.remove(0).candidate.unwrap();
    assert_eq!(c.popup_url.as_deref(), Some("https://www.vivc.de/popup/7"));
    // Empty img src falls back to the link target.
    assert_eq!(c.photo_url, "https://www.vivc.de/fotos/big.jpg");
    assert_eq!(c.source, None);
  }

  #[test]
  fn vivc_id_from_link_text_or_cell() {
    let html = page(
      &[row(r##"<a href="#">8141</a>"##, ""), row(" 12 ", ""), row("n/a", "")].concat(),
      "",
    );
    let ids: Vec<_> = parse_photo_rows(&html, &urls())
      .unwrap()
      .rows
      .into_iter()
      .map(|r| r.vivc_id)
      .collect();
    assert_eq!(ids, vec![Some("8141".into()), Some("12".into()), None]);
  }

  #[test]
  fn short_row_has_no_candidate() {
    let html = page("<tr><td>a</td><td>b</td><td>55</td></tr>", "");
    let rows = parse_photo_rows(&html, &urls()).unwrap().rows;
    assert_eq!(rows[0].vivc_id.as_deref(), Some("55"));
    assert_eq!(rows[0].candidate, None);
  }

  #[test]
  fn next_page_detection() {
    let chevron = page("", r##"<ul><li><a href="?page=2">»</a></li></ul>"##);
    assert!(parse_photo_rows(&chevron, &urls()).unwrap().has_next_page);

    let next = page("", r##"<div class="pagination"><a href="?page=2">Next page</a></div>"##);
    assert!(parse_photo_rows(&next, &urls()).unwrap().has_next_page);

    let last = page("", r##"<div class="pagination"><a href="?page=1">1</a></div>"##);
    assert!(!parse_photo_rows(&last, &urls()).unwrap().has_next_page);
  }

  #[test]
  fn popup_patterns_in_order() {
    assert_eq!(
      popup_url_from_onclick("window.open('index.php?r=fotoverweise%2Fview&id=1', '_blank')")
        .as_deref(),
      Some("index.php?r=fotoverweise%2Fview&id=1")
    );
    assert_eq!(
      popup_url_from_onclick("location.href = '/popup.php?id=3'").as_deref(),
      Some("/popup.php?id=3")
    );
    assert_eq!(
      popup_url_from_onclick("go(https://www.vivc.de/fotos/x.jpg)").as_deref(),
      Some("https://www.vivc.de/fotos/x.jpg")
    );
    assert_eq!(popup_url_from_onclick("return false;"), None);
  }

  #[test]
  fn page_without_table_is_none() {
    assert!(parse_photo_rows("<p>maintenance</p>", &urls()).is_none());
  }
}
