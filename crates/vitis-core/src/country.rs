//! Countries of origin and the canonical country table.
//!
//! [`COUNTRIES`] is the single source of truth for which countries a listing
//! import walks and for the ISO codes the VIVC search pages are keyed by. It
//! includes historical regions (`ussr`, `yugoslavia`, `daghestan`) because
//! VIVC still files cultivars under them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::title_country;

/// A persisted country. `iso_code` is the immutable identity; `name` may be
/// renormalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
  pub country_id: Uuid,
  pub name:       String,
  pub iso_code:   String,
  /// VIVC listing page for cultivars originating in this country.
  pub search_url: String,
}

/// Input to [`crate::store::GrapeStore::ensure_country`].
#[derive(Debug, Clone)]
pub struct NewCountry {
  pub name:       String,
  pub iso_code:   String,
  pub search_url: String,
}

/// A country together with the number of grapes that originate there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySummary {
  #[serde(flatten)]
  pub country:     Country,
  pub grape_count: u64,
}

/// One row of the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryEntry {
  /// Lowercase lookup key, e.g. `"north macedonia"`.
  pub key:      &'static str,
  pub iso_code: &'static str,
}

impl CountryEntry {
  /// Display name, e.g. `"North Macedonia"`, `"United States of America"`.
  pub fn display_name(&self) -> String { title_country(self.key) }
}

macro_rules! countries {
  ($($key:literal => $iso:literal),* $(,)?) => {
    &[$(CountryEntry { key: $key, iso_code: $iso }),*]
  };
}

/// Canonical country table, sorted by key.
pub const COUNTRIES: &[CountryEntry] = countries![
  "afghanistan" => "AFG",
  "albania" => "ALB",
  "algeria" => "DZA",
  "andorra" => "AND",
  "argentina" => "ARG",
  "armenia" => "ARM",
  "austria" => "AUT",
  "azerbaijan" => "AZE",
  "belarus" => "BLR",
  "belgium" => "BEL",
  "bosnia and herzegovina" => "BIH",
  "bulgaria" => "BGR",
  "canada" => "CAN",
  "china" => "CHN",
  "croatia" => "HRV",
  "cyprus" => "CYP",
  "czechia" => "CZE",
  "daghestan" => "DAG",
  "denmark" => "DNK",
  "estonia" => "EST",
  "finland" => "FIN",
  "france" => "FRA",
  "georgia" => "GEO",
  "germany" => "DEU",
  "greece" => "GRC",
  "hungary" => "HUN",
  "iceland" => "ISL",
  "india" => "IND",
  "iran" => "IRN",
  "iraq" => "IRQ",
  "ireland" => "IRL",
  "israel" => "ISR",
  "italy" => "ITA",
  "japan" => "JPN",
  "kazakhstan" => "KAZ",
  "kosovo" => "XKX",
  "latvia" => "LVA",
  "liechtenstein" => "LIE",
  "lithuania" => "LTU",
  "luxembourg" => "LUX",
  "malta" => "MLT",
  "mexico" => "MEX",
  "moldova" => "MDA",
  "monaco" => "MCO",
  "montenegro" => "MNE",
  "morocco" => "MAR",
  "netherlands" => "NLD",
  "north macedonia" => "MKD",
  "norway" => "NOR",
  "poland" => "POL",
  "portugal" => "PRT",
  "romania" => "ROU",
  "russia" => "RUS",
  "san marino" => "SMR",
  "serbia" => "SRB",
  "slovakia" => "SVK",
  "slovenia" => "SVN",
  "spain" => "ESP",
  "sweden" => "SWE",
  "switzerland" => "CHE",
  "tajikistan" => "TJK",
  "turkey" => "TUR",
  "turkmenistan" => "TKM",
  "ukraine" => "UKR",
  "united kingdom" => "GBR",
  "united states of america" => "USA",
  "ussr" => "SUN",
  "uzbekistan" => "UZB",
  "vatican city" => "VAT",
  "yugoslavia" => "YUG",
];

/// Look up a country by name (case-insensitive) or ISO code.
pub fn lookup(name_or_iso: &str) -> Option<&'static CountryEntry> {
  let needle = name_or_iso.trim();
  COUNTRIES.iter().find(|c| {
    c.key.eq_ignore_ascii_case(needle) || c.iso_code.eq_ignore_ascii_case(needle)
  })
}

/// Countries from `start` onwards in alphabetical key order; `start` is
/// compared case-insensitively, so `"m"` starts at Malta.
pub fn countries_from(start: &str) -> impl Iterator<Item = &'static CountryEntry> {
  let start = start.trim().to_lowercase();
  COUNTRIES.iter().filter(move |c| c.key >= start.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn table_is_sorted_and_unique() {
    for pair in COUNTRIES.windows(2) {
      assert!(pair[0].key < pair[1].key, "{} >= {}", pair[0].key, pair[1].key);
    }
    let mut isos: Vec<_> = COUNTRIES.iter().map(|c| c.iso_code).collect();
    isos.sort_unstable();
    isos.dedup();
    assert_eq!(isos.len(), COUNTRIES.len());
  }

  #[test]
  fn lookup_by_name_or_iso() {
    assert_eq!(lookup("France").map(|c| c.iso_code), Some("FRA"));
    assert_eq!(lookup("deu").map(|c| c.key), Some("germany"));
    assert!(lookup("atlantis").is_none());
  }

  #[test]
  fn countries_from_starts_alphabetically() {
    let first = countries_from("M").next().unwrap();
    assert_eq!(first.key, "malta");
    assert_eq!(countries_from("zzz").count(), 0);
  }

  #[test]
  fn display_name_title_cases() {
    assert_eq!(lookup("USA").unwrap().display_name(), "United States of America");
  }
}
