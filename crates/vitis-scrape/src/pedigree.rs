//! Pedigree search results, used to find the children of a cultivar.
//!
//! Column order: cultivar (linked), species, prime name of parent 1, prime
//! name of parent 2.

use scraper::{ElementRef, Html};

use crate::{VivcUrls, dom, urls::vivc_id_from_href};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCandidate {
  pub vivc_id:  Option<String>,
  pub name:     String,
  pub url:      Option<String>,
  pub parent_1: String,
  pub parent_2: String,
}

fn parent_name(cell: ElementRef<'_>) -> String {
  dom::find(cell, "a").map(dom::text).unwrap_or_else(|| dom::text(cell))
}

/// Rows of a pedigree search whose parent 1 or parent 2 equals
/// `parent_name`, compared case-insensitively. The search itself is a
/// substring match, so rows naming other parents are common and dropped.
pub fn parse_children(html: &str, parent: &str, urls: &VivcUrls) -> Vec<ChildCandidate> {
  let doc = Html::parse_document(html);
  let Some(rows) = dom::first_tbody_rows(&doc) else {
    return Vec::new();
  };
  let wanted = parent.trim().to_lowercase();

  rows
    .into_iter()
    .filter_map(|row| {
      let cells = dom::cells(row, false);
      if cells.len() < 4 {
        return None;
      }
      let link = dom::find(cells[0], "a")?;
      let href = link.value().attr("href").unwrap_or_default();
      let parent_1 = parent_name(cells[2]);
      let parent_2 = parent_name(cells[3]);

      if parent_1.to_lowercase() != wanted && parent_2.to_lowercase() != wanted {
        return None;
      }

      Some(ChildCandidate {
        vivc_id: vivc_id_from_href(href),
        name: dom::text(link),
        url: urls.absolutize(href),
        parent_1,
        parent_2,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn urls() -> VivcUrls { VivcUrls::new("https://www.vivc.de").unwrap() }

  const PAGE: &str = r#"
    <table><tbody>
      <tr>
        <td><a href="index.php?r=passport%2Fview&amp;id=8141">MÜLLER-THURGAU</a></td>
        <td>VITIS VINIFERA</td>
        <td><a href="index.php?r=passport%2Fview&amp;id=10077">RIESLING WEISS</a></td>
        <td><a href="index.php?r=passport%2Fview&amp;id=7052">MADELEINE ROYALE</a></td>
      </tr>
      <tr>
        <td><a href="index.php?r=passport%2Fview&amp;id=2">RIESLANER</a></td>
        <td>VITIS VINIFERA</td>
        <td>SILVANER GRUEN</td>
        <td>Riesling Weiss</td>
      </tr>
      <tr>
        <td><a href="index.php?r=passport%2Fview&amp;id=3">OTHER</a></td>
        <td>VITIS VINIFERA</td>
        <td>RIESLING WEISS X</td>
        <td>TROLLINGER</td>
      </tr>
      <tr>
        <td>UNLINKED</td><td></td><td>RIESLING WEISS</td><td></td>
      </tr>
    </tbody></table>
  "#;

  #[test]
  fn keeps_only_exact_parent_matches() {
    let children = parse_children(PAGE, "riesling weiss", &urls());
    let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["MÜLLER-THURGAU", "RIESLANER"]);
  }

  #[test]
  fn child_carries_id_url_and_both_parents() {
    let children = parse_children(PAGE, "Madeleine Royale", &urls());
    assert_eq!(children.len(), 1);
    let child = &children[0];
    assert_eq!(child.vivc_id.as_deref(), Some("8141"));
    assert_eq!(
      child.url.as_deref(),
      Some("https://www.vivc.de/index.php?r=passport%2Fview&id=8141")
    );
    assert_eq!(child.parent_1, "RIESLING WEISS");
    assert_eq!(child.parent_2, "MADELEINE ROYALE");
  }

  #[test]
  fn no_results_page_is_empty() {
    assert!(parse_children("<p>No results found.</p>", "Riesling", &urls()).is_empty());
  }
}
