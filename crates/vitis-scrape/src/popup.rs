//! Photo detail popups.
//!
//! The popup shows the photo with a "Please note ... quote the source as
//! indicated below" notice followed by the attribution. Its markup varies
//! between photo collections, so [`METHODS`] try progressively looser ways
//! of locating that text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::{attribution::SOURCE_KEYWORDS, dom};

const NOTICE: &str = "Please note";
const MIN_LEN: usize = 20;
const MIN_BLOCK_LEN: usize = 30;
/// How many lines the line scan joins into one attribution.
const SCAN_LINES: usize = 5;

pub type Method = fn(&Html) -> Option<String>;

/// Extraction methods in priority order.
pub const METHODS: &[(&str, Method)] = &[
  ("panel-title", panel_title),
  ("sibling-paragraph", sibling_paragraph),
  ("heading-text", heading_text),
  ("notice-proximity", notice_proximity),
  ("line-scan", line_scan),
];

/// Attribution from a popup page; the first method that finds one wins.
pub fn extract_source(html: &str) -> Option<String> {
  let doc = Html::parse_document(html);
  METHODS.iter().find_map(|(name, method)| {
    let found = method(&doc)?;
    tracing::debug!(method = *name, "found popup attribution");
    Some(found)
  })
}

fn has_keyword(text: &str) -> bool {
  SOURCE_KEYWORDS.iter().any(|k| text.contains(k))
    || ["Siebeldingen", "GERMANY", "Germany"].iter().any(|k| text.contains(k))
}

fn is_notice(text: &str) -> bool {
  text.contains(NOTICE) && text.to_lowercase().contains("quote the source")
}

/// Whitespace-collapsed text if it names an institution and is long enough.
fn accept(text: &str, min_len: usize) -> Option<String> {
  let text = dom::squash(text);
  (text.chars().count() > min_len && has_keyword(&text)).then_some(text)
}

fn notice_headings(doc: &Html) -> Vec<ElementRef<'_>> {
  let Some(sel) = dom::selector("div.panel-heading") else {
    return Vec::new();
  };
  doc.select(&sel).filter(|h| is_notice(&dom::raw_text(*h))).collect()
}

/// A `p.panel-title` inside the notice heading, other than the notice itself.
pub fn panel_title(doc: &Html) -> Option<String> {
  let titles = dom::selector("p.panel-title")?;
  notice_headings(doc).into_iter().find_map(|heading| {
    heading
      .select(&titles)
      .map(dom::raw_text)
      .filter(|t| !is_notice(t))
      .find_map(|t| accept(&t, MIN_BLOCK_LEN))
  })
}

fn next_sibling_named<'a>(el: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
  el.next_siblings()
    .filter_map(ElementRef::wrap)
    .find(|s| names.contains(&s.value().name()))
}

/// The paragraph after the one carrying the notice, or failing that the
/// block after the notice's container.
pub fn sibling_paragraph(doc: &Html) -> Option<String> {
  let paragraphs = dom::selector("p")?;
  doc
    .select(&paragraphs)
    .filter(|p| dom::raw_text(*p).contains(NOTICE))
    .find_map(|para| {
      next_sibling_named(para, &["p"])
        .and_then(|next| accept(&dom::raw_text(next), MIN_BLOCK_LEN))
        .or_else(|| {
          let container = dom::closest(para, &["div", "td", "tr"])?;
          let next = next_sibling_named(container, &["div", "p", "td"])?;
          accept(&dom::raw_text(next), MIN_BLOCK_LEN)
        })
    })
}

fn static_regex(pattern: &str) -> Option<Regex> { Regex::new(pattern).ok() }

static AFTER_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
  static_regex(r"(?is)quote the source as indicated below[:\s]+(.+?)(?:\n\s*Download|$)")
});

static AFTER_NOTICE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  static_regex(r"(?is)quote the source[^:]*:[:\s]+(.+?)(?:\n\s*Download|$)")
});

fn capture_after(re: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
  let captured = re.as_ref()?.captures(text)?.get(1)?.as_str().to_owned();
  accept(&captured, MIN_LEN)
}

/// Text following "indicated below:" within the notice heading itself.
pub fn heading_text(doc: &Html) -> Option<String> {
  notice_headings(doc)
    .into_iter()
    .find_map(|h| capture_after(&AFTER_HEADING, &dom::raw_text(h)))
}

/// Text following "quote the source ...:" within the nearest block around
/// any text node mentioning the notice.
pub fn notice_proximity(doc: &Html) -> Option<String> {
  doc
    .root_element()
    .descendants()
    .filter(|n| n.value().as_text().is_some_and(|t| t.contains(NOTICE)))
    .filter_map(|n| {
      n.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| ["div", "p", "td", "tr"].contains(&a.value().name()))
    })
    .find_map(|block| capture_after(&AFTER_NOTICE, &dom::raw_text(block)))
}

/// Last resort over the page's plain text: the first line naming an
/// institution plus up to four following lines, stopping at "Download".
pub fn line_scan(doc: &Html) -> Option<String> {
  let text = dom::raw_text(doc.root_element());
  let lines: Vec<&str> = text.lines().collect();

  lines.iter().enumerate().find_map(|(i, line)| {
    if !has_keyword(line) || line.trim().chars().count() <= MIN_BLOCK_LEN {
      return None;
    }
    let joined = lines[i..]
      .iter()
      .take(SCAN_LINES)
      .map(|l| l.trim())
      .take_while(|l| !l.to_lowercase().contains("download"))
      .filter(|l| !l.is_empty())
      .collect::<Vec<_>>()
      .join(" ");
    (joined.chars().count() > MIN_BLOCK_LEN).then_some(joined)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const JKI: &str = "Julius Kühn-Institut (JKI), Institute for Grapevine Breeding Geilweilerhof";

  fn doc(body: &str) -> Html { Html::parse_document(&format!("<html><body>{body}</body></html>")) }

  #[test]
  fn panel_title_skips_the_notice() {
    let d = doc(&format!(
      r#"<div class="panel-heading">
        <p class="panel-title">Please note: Please quote the source as indicated below:</p>
        <p class="panel-title">{JKI}</p>
      </div>"#
    ));
    assert_eq!(panel_title(&d).as_deref(), Some(JKI));
  }

  #[test]
  fn panel_title_ignores_other_headings() {
    let d = doc(&format!(r#"<div class="panel-heading"><p class="panel-title">{JKI}</p></div>"#));
    assert_eq!(panel_title(&d), None);
  }

  #[test]
  fn sibling_paragraph_after_notice() {
    let d = doc(&format!("<div><p>Please note the terms</p><span>x</span><p>  {JKI} </p></div>"));
    assert_eq!(sibling_paragraph(&d).as_deref(), Some(JKI));
  }

  #[test]
  fn sibling_of_container() {
    let d = doc(&format!("<div><div><p>Please note the terms</p></div><div>{JKI}</div></div>"));
    assert_eq!(sibling_paragraph(&d).as_deref(), Some(JKI));
  }

  #[test]
  fn heading_text_stops_at_download() {
    let d = doc(&format!(
      "<div class=\"panel-heading\">Please note: quote the source as indicated below: {JKI}\n  Download</div>"
    ));
    assert_eq!(heading_text(&d).as_deref(), Some(JKI));
  }

  #[test]
  fn proximity_reads_enclosing_block() {
    let d = doc(&format!(
      "<div><span>Please note</span>: you must quote the source of the image: {JKI}</div>"
    ));
    assert_eq!(notice_proximity(&d).as_deref(), Some(JKI));
  }

  #[test]
  fn line_scan_joins_following_lines() {
    let d = doc(
      "<pre>header\nPhoto by the Institute for Grapevine Breeding\nGeilweilerhof\n\nSiebeldingen\n\
       DOWNLOAD\ntrailing Research text</pre>",
    );
    assert_eq!(
      line_scan(&d).as_deref(),
      Some("Photo by the Institute for Grapevine Breeding Geilweilerhof Siebeldingen")
    );
  }

  #[test]
  fn chain_prefers_earlier_methods() {
    let html = format!(
      r#"<html><body><div class="panel-heading">
        <p class="panel-title">Please note: Please quote the source as indicated below:</p>
        <p class="panel-title">{JKI}</p>
      </div><p>Another Research Centre mentioned further down the page</p></body></html>"#
    );
    assert_eq!(extract_source(&html).as_deref(), Some(JKI));
  }

  #[test]
  fn nothing_found() {
    assert_eq!(extract_source("<html><body><img src='x.jpg'></body></html>"), None);
    assert_eq!(extract_source(""), None);
  }
}
