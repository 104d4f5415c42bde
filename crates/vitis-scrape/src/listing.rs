//! Per-country cultivar listing pages.
//!
//! Column order: prime name (linked), utilization, species, berry color
//! (linked), further columns ignored.

use scraper::Html;

use crate::{VivcUrls, dom};

/// Color recorded for rows whose color cell has no link text.
pub const NOT_SPECIFIED: &str = "not specified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
  pub name:    String,
  /// Absolute passport URL.
  pub url:     String,
  pub color:   String,
  pub species: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
  pub rows:      Vec<ListingRow>,
  /// Number of `tr` elements in the body, including rows that were skipped;
  /// a page with fewer than the requested page size is the last one.
  pub row_count: usize,
}

/// Parse one listing page. `None` when the page has no `tbody` at all.
pub fn parse_listing(html: &str, urls: &VivcUrls) -> Option<ListingPage> {
  let doc = Html::parse_document(html);
  let rows = dom::first_tbody_rows(&doc)?;

  let parsed = rows
    .iter()
    .filter_map(|row| {
      let cells = dom::cells(*row, false);
      if cells.len() < 4 {
        return None;
      }
      let link = dom::find(cells[0], "a")?;
      let url = urls.absolutize(link.value().attr("href")?)?;
      let color = dom::find(cells[3], "a")
        .map(dom::text)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| NOT_SPECIFIED.to_owned());

      Some(ListingRow {
        name: dom::text(link),
        url,
        color,
        species: dom::text(cells[2]),
      })
    })
    .collect();

  Some(ListingPage { rows: parsed, row_count: rows.len() })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn urls() -> VivcUrls { VivcUrls::new("https://www.vivc.de").unwrap() }

  const PAGE: &str = r##"
    <html><body><table>
      <thead><tr><th>Prime name</th><th>Utilization</th><th>Species</th><th>Color</th></tr></thead>
      <tbody>
        <tr>
          <td><a href="index.php?r=passport%2Fview&amp;id=100">TEST GRAPE</a></td>
          <td>WINE GRAPE</td>
          <td> VITIS VINIFERA LINNE SUBSP. SATIVA (DE CANDOLLE) HEGI </td>
          <td><a href="#">rouge</a></td>
        </tr>
        <tr>
          <td><a href="index.php?r=passport%2Fview&amp;id=101">BLANCO</a></td>
          <td>TABLE GRAPE</td>
          <td></td>
          <td></td>
        </tr>
        <tr><td>no link</td><td></td><td></td><td></td></tr>
        <tr><td colspan="4">short row</td></tr>
      </tbody>
    </table></body></html>
  "##;

  #[test]
  fn parses_rows_with_links() {
    let page = parse_listing(PAGE, &urls()).unwrap();
    assert_eq!(page.row_count, 4);
    assert_eq!(page.rows.len(), 2);

    let first = &page.rows[0];
    assert_eq!(first.name, "TEST GRAPE");
    assert_eq!(first.url, "https://www.vivc.de/index.php?r=passport%2Fview&id=100");
    assert_eq!(first.color, "rouge");
    assert_eq!(first.species, "VITIS VINIFERA LINNE SUBSP. SATIVA (DE CANDOLLE) HEGI");
  }

  #[test]
  fn missing_color_link_is_not_specified() {
    let page = parse_listing(PAGE, &urls()).unwrap();
    assert_eq!(page.rows[1].color, NOT_SPECIFIED);
    assert_eq!(page.rows[1].species, "");
  }

  #[test]
  fn page_without_tbody_is_none() {
    assert!(parse_listing("<html><body><p>No results</p></body></html>", &urls()).is_none());
  }

  #[test]
  fn garbage_yields_nothing() {
    assert!(parse_listing("<<<not html", &urls()).is_none());
  }
}
