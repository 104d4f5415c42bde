//! Grape cultivars and field-level change sets.
//!
//! A grape is identified externally by its VIVC variety number (`vivc_id`),
//! which is the natural key every importer matches on. Imports never rewrite
//! a whole record: they compute a [`GrapePatch`] against the stored grape and
//! write only the fields that actually changed.

use std::{collections::BTreeSet, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grape {
  pub grape_id:               Uuid,
  pub vivc_id:                String,
  pub name:                   String,
  pub vivc_url:               String,
  pub berry_color:            String,
  pub species:                String,
  pub year_of_crossing:       String,
  pub breeder:                String,
  pub country_id:             Option<Uuid>,
  pub encyclopedia_image_url: Option<String>,
  /// Set once parents and children have been resolved.
  pub date_last_crawled:      Option<DateTime<Utc>>,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
}

impl Grape {
  pub fn is_crawled(&self) -> bool { self.date_last_crawled.is_some() }
}

/// Input to [`crate::store::GrapeStore::insert_grape`].
#[derive(Debug, Clone, Default)]
pub struct NewGrape {
  pub vivc_id:          String,
  pub name:             String,
  pub vivc_url:         String,
  pub berry_color:      String,
  pub species:          String,
  pub year_of_crossing: String,
  pub breeder:          String,
  pub country_id:       Option<Uuid>,
}

/// The `{name, vivc_id}` pair served by autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrapeRef {
  pub name:    String,
  pub vivc_id: String,
}

// ─── Importable fields ───────────────────────────────────────────────────────

/// A field the listing importer can be restricted to with `--fields`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GrapeField {
  Name,
  BerryColor,
  Species,
  YearOfCrossing,
  Breeder,
}

impl GrapeField {
  /// Whether the value lives on the passport page rather than the listing
  /// row, i.e. costs one extra request per grape.
  pub fn needs_detail_page(self) -> bool {
    matches!(self, Self::YearOfCrossing | Self::Breeder)
  }

  /// Parse a comma-separated list such as `"name, breeder"`. Blank entries
  /// are ignored; an unknown name is an error.
  pub fn parse_list(raw: &str) -> Result<BTreeSet<Self>> {
    raw
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(|s| Self::from_str(s).map_err(|_| Error::UnknownField(s.to_owned())))
      .collect()
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A sparse update to a [`Grape`]. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrapePatch {
  pub name:             Option<String>,
  pub vivc_url:         Option<String>,
  pub berry_color:      Option<String>,
  pub species:          Option<String>,
  pub year_of_crossing: Option<String>,
  pub breeder:          Option<String>,
  /// `Some(None)` clears the country.
  pub country_id:       Option<Option<Uuid>>,
}

impl GrapePatch {
  /// Drop every field whose proposed value already equals `current`.
  pub fn against(self, current: &Grape) -> Self {
    fn keep<T: PartialEq>(proposed: Option<T>, current: &T) -> Option<T> {
      proposed.filter(|p| p != current)
    }

    Self {
      name:             keep(self.name, &current.name),
      vivc_url:         keep(self.vivc_url, &current.vivc_url),
      berry_color:      keep(self.berry_color, &current.berry_color),
      species:          keep(self.species, &current.species),
      year_of_crossing: keep(self.year_of_crossing, &current.year_of_crossing),
      breeder:          keep(self.breeder, &current.breeder),
      country_id:       keep(self.country_id, &current.country_id),
    }
  }

  pub fn is_empty(&self) -> bool { self.changed_fields().is_empty() }

  /// Column names touched by this patch, in declaration order.
  pub fn changed_fields(&self) -> Vec<&'static str> {
    let mut out = Vec::new();
    if self.name.is_some() {
      out.push("name");
    }
    if self.vivc_url.is_some() {
      out.push("vivc_url");
    }
    if self.berry_color.is_some() {
      out.push("berry_color");
    }
    if self.species.is_some() {
      out.push("species");
    }
    if self.year_of_crossing.is_some() {
      out.push("year_of_crossing");
    }
    if self.breeder.is_some() {
      out.push("breeder");
    }
    if self.country_id.is_some() {
      out.push("country_id");
    }
    out
  }

  /// Apply the patch in place.
  pub fn apply(self, grape: &mut Grape) {
    if let Some(v) = self.name {
      grape.name = v;
    }
    if let Some(v) = self.vivc_url {
      grape.vivc_url = v;
    }
    if let Some(v) = self.berry_color {
      grape.berry_color = v;
    }
    if let Some(v) = self.species {
      grape.species = v;
    }
    if let Some(v) = self.year_of_crossing {
      grape.year_of_crossing = v;
    }
    if let Some(v) = self.breeder {
      grape.breeder = v;
    }
    if let Some(v) = self.country_id {
      grape.country_id = v;
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::GrapeStore::list_grapes`]. Results are
/// ordered by name.
#[derive(Debug, Clone, Default)]
pub struct GrapeQuery {
  pub country_id:                 Option<Uuid>,
  /// Only grapes with no [`crate::photo::GrapePhoto`].
  pub without_photos:             bool,
  pub without_encyclopedia_image: bool,
  /// `Some(true)`: only grapes with at least one parent edge.
  pub has_parents:                Option<bool>,
  /// `Some(true)`: only grapes with `date_last_crawled` set.
  pub crawled:                    Option<bool>,
  pub limit:                      Option<usize>,
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  fn grape() -> Grape {
    let now = Utc::now();
    Grape {
      grape_id:               Uuid::new_v4(),
      vivc_id:                "100".into(),
      name:                   "Test Grape".into(),
      vivc_url:               "https://www.vivc.de/index.php?r=passport%2Fview&id=100".into(),
      berry_color:            "Red".into(),
      species:                "Vitis Vinifera Linne Subsp. Sativa (Dc.) Hegi".into(),
      year_of_crossing:       String::new(),
      breeder:                String::new(),
      country_id:             None,
      encyclopedia_image_url: None,
      date_last_crawled:      None,
      created_at:             now,
      updated_at:             now,
    }
  }

  #[test]
  fn patch_against_drops_unchanged_fields() {
    let current = grape();
    let patch = GrapePatch {
      name: Some("Test Grape".into()),
      berry_color: Some("Black".into()),
      breeder: Some(String::new()),
      ..Default::default()
    }
    .against(&current);

    assert_eq!(patch.changed_fields(), vec!["berry_color"]);
    assert!(!patch.is_empty());
  }

  #[test]
  fn patch_of_identical_values_is_empty() {
    let current = grape();
    let patch = GrapePatch {
      name: Some(current.name.clone()),
      country_id: Some(None),
      ..Default::default()
    }
    .against(&current);
    assert!(patch.is_empty());
  }

  #[test]
  fn patch_apply_sets_and_clears() {
    let mut g = grape();
    g.country_id = Some(Uuid::new_v4());
    GrapePatch {
      year_of_crossing: Some("1929".into()),
      country_id: Some(None),
      ..Default::default()
    }
    .apply(&mut g);
    assert_eq!(g.year_of_crossing, "1929");
    assert_eq!(g.country_id, None);
  }

  #[test]
  fn field_names_round_trip_through_strum() {
    for field in GrapeField::iter() {
      assert_eq!(field.to_string().parse::<GrapeField>().unwrap(), field);
    }
    assert_eq!(GrapeField::BerryColor.to_string(), "berry_color");
  }

  #[test]
  fn parse_list_accepts_mixed_case_and_blanks() {
    let fields = GrapeField::parse_list(" Name, berry_color,,YEAR_OF_CROSSING ").unwrap();
    assert_eq!(
      fields.into_iter().collect::<Vec<_>>(),
      vec![GrapeField::Name, GrapeField::BerryColor, GrapeField::YearOfCrossing]
    );
  }

  #[test]
  fn parse_list_rejects_unknown_field() {
    let err = GrapeField::parse_list("name,colour").unwrap_err();
    assert!(matches!(err, Error::UnknownField(f) if f == "colour"));
  }

  #[test]
  fn only_passport_fields_need_detail_page() {
    let detail: Vec<_> = GrapeField::iter().filter(|f| f.needs_detail_page()).collect();
    assert_eq!(detail, vec![GrapeField::YearOfCrossing, GrapeField::Breeder]);
  }
}
