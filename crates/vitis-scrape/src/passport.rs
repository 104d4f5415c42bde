//! Passport (cultivar detail) pages.
//!
//! The passport is a two-column table of label/value rows. Labels are matched
//! against [`RULES`], an ordered table of predicates over the lowercased
//! label; the first rule that matches decides which field the row fills.

use scraper::{ElementRef, Html};

use crate::{dom, urls::vivc_id_from_href};

/// A linked parent cultivar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
  pub vivc_id: String,
  pub name:    String,
}

/// Fields recognised on a passport page. Every field is optional; a page
/// with no recognised rows yields `Passport::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passport {
  pub prime_name:        Option<String>,
  pub year_of_crossing:  Option<String>,
  pub breeder:           Option<String>,
  pub full_pedigree:     Option<bool>,
  pub parent_1:          Option<ParentLink>,
  pub parent_2:          Option<ParentLink>,
  pub country_of_origin: Option<String>,
}

impl Passport {
  /// Present parent links in page order.
  pub fn parents(&self) -> impl Iterator<Item = &ParentLink> {
    self.parent_1.iter().chain(self.parent_2.iter())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassportField {
  Parent1,
  Parent2,
  PrimeName,
  FullPedigree,
  YearOfCrossing,
  Breeder,
  CountryOfOrigin,
}

pub struct Rule {
  pub field:   PassportField,
  pub matches: fn(&str) -> bool,
}

/// Label rules in priority order. Parent rows are tested before the plain
/// prime-name rule because their labels contain "prime name" too.
pub const RULES: &[Rule] = &[
  Rule {
    field:   PassportField::Parent1,
    matches: |l| l.contains("prime name of parent 1"),
  },
  Rule {
    field:   PassportField::Parent2,
    matches: |l| l.contains("prime name of parent 2"),
  },
  Rule {
    field:   PassportField::PrimeName,
    matches: |l| l.contains("prime name") && !l.contains("parent"),
  },
  Rule {
    field:   PassportField::FullPedigree,
    matches: |l| l.contains("full pedigree"),
  },
  Rule {
    field:   PassportField::YearOfCrossing,
    matches: |l| {
      l.contains("year of crossing") || l.contains("crossing year") || l.contains("year crossed")
    },
  },
  Rule {
    field:   PassportField::Breeder,
    matches: |l| {
      (l.contains("breeder") && !l.contains("parent"))
        || l.contains("breeder name")
        || l.contains("breeder(s)")
    },
  },
  Rule {
    field:   PassportField::CountryOfOrigin,
    matches: |l| l.contains("country or region of origin"),
  },
];

/// Classify a row label; matching is case-insensitive.
pub fn classify(label: &str) -> Option<PassportField> {
  let lower = label.trim().to_lowercase();
  RULES.iter().find(|r| (r.matches)(&lower)).map(|r| r.field)
}

fn non_empty(s: String) -> Option<String> { (!s.is_empty()).then_some(s) }

fn parent_link(cell: ElementRef<'_>) -> Option<ParentLink> {
  let link = dom::find(cell, "a")?;
  let vivc_id = vivc_id_from_href(link.value().attr("href")?)?;
  Some(ParentLink { vivc_id, name: dom::text(link) })
}

/// Parse a passport page. The first row to fill a field wins.
pub fn parse_passport(html: &str) -> Passport {
  let doc = Html::parse_document(html);
  let mut passport = Passport::default();
  let Some(rows) = dom::selector("div.passport-view table tr") else {
    return passport;
  };

  for row in doc.select(&rows) {
    let cells = dom::cells(row, true);
    if cells.len() < 2 {
      continue;
    }
    let Some(field) = classify(&dom::text(cells[0])) else {
      continue;
    };
    let value = cells[1];

    match field {
      PassportField::Parent1 if passport.parent_1.is_none() => {
        passport.parent_1 = parent_link(value);
      }
      PassportField::Parent2 if passport.parent_2.is_none() => {
        passport.parent_2 = parent_link(value);
      }
      PassportField::PrimeName if passport.prime_name.is_none() => {
        passport.prime_name = non_empty(dom::text(value));
      }
      PassportField::FullPedigree if passport.full_pedigree.is_none() => {
        passport.full_pedigree = Some(dom::text(value).eq_ignore_ascii_case("yes"));
      }
      PassportField::YearOfCrossing if passport.year_of_crossing.is_none() => {
        passport.year_of_crossing = non_empty(dom::text(value));
      }
      PassportField::Breeder if passport.breeder.is_none() => {
        let linked = dom::find(value, "a").map(dom::text).and_then(non_empty);
        passport.breeder = linked.or_else(|| non_empty(dom::text(value)));
      }
      PassportField::CountryOfOrigin if passport.country_of_origin.is_none() => {
        passport.country_of_origin = non_empty(dom::text(value));
      }
      _ => {}
    }
  }

  passport
}
