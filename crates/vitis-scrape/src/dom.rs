//! Small helpers over `scraper` shared by the extractors.

use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Option<Selector> { Selector::parse(css).ok() }

/// Concatenated text of `el` and its descendants, untouched.
pub fn raw_text(el: ElementRef<'_>) -> String { el.text().collect() }

/// Text of `el` with runs of whitespace collapsed to single spaces.
pub fn text(el: ElementRef<'_>) -> String { squash(&raw_text(el)) }

pub fn squash(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }

/// First descendant matching `css`.
pub fn find<'a>(el: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
  let sel = selector(css)?;
  el.select(&sel).next()
}

/// Direct `td` children of a table row, or `th` followed by `td` when
/// `with_headers` is set.
pub fn cells<'a>(row: ElementRef<'a>, with_headers: bool) -> Vec<ElementRef<'a>> {
  let children: Vec<_> = row.children().filter_map(ElementRef::wrap).collect();
  let of = |name: &str| {
    children
      .iter()
      .copied()
      .filter(|c| c.value().name() == name)
      .collect::<Vec<_>>()
  };

  if with_headers {
    let mut out = of("th");
    out.extend(of("td"));
    out
  } else {
    of("td")
  }
}

/// Rows of the first `tbody` in the document, or `None` without one.
pub fn first_tbody_rows(doc: &Html) -> Option<Vec<ElementRef<'_>>> {
  let tbody = doc.select(&selector("tbody")?).next()?;
  let tr = selector("tr")?;
  Some(tbody.select(&tr).collect())
}

/// Nearest ancestor of `el` whose tag is one of `names`.
pub fn closest<'a>(el: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
  el.ancestors()
    .filter_map(ElementRef::wrap)
    .find(|a| names.contains(&a.value().name()))
}
