//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vitis_core::{
  country::Country,
  grape::Grape,
  photo::{GrapePhoto, PhotoType},
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `%`, `_` and `\` so `s` matches literally under `ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const COUNTRY_COLUMNS: &str = "c.country_id, c.name, c.iso_code, c.search_url";

/// Raw strings read from a `countries` row.
pub struct RawCountry {
  pub country_id: String,
  pub name:       String,
  pub iso_code:   String,
  pub search_url: String,
}

impl RawCountry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      country_id: row.get(0)?,
      name:       row.get(1)?,
      iso_code:   row.get(2)?,
      search_url: row.get(3)?,
    })
  }

  pub fn into_country(self) -> Result<Country> {
    Ok(Country {
      country_id: decode_uuid(&self.country_id)?,
      name:       self.name,
      iso_code:   self.iso_code,
      search_url: self.search_url,
    })
  }
}

pub const GRAPE_COLUMNS: &str = "g.grape_id, g.vivc_id, g.name, g.vivc_url, \
  g.berry_color, g.species, g.year_of_crossing, g.breeder, g.country_id, \
  g.encyclopedia_image_url, g.date_last_crawled, g.created_at, g.updated_at";

/// Raw strings read from a `grapes` row.
pub struct RawGrape {
  pub grape_id:               String,
  pub vivc_id:                String,
  pub name:                   String,
  pub vivc_url:               String,
  pub berry_color:            String,
  pub species:                String,
  pub year_of_crossing:       String,
  pub breeder:                String,
  pub country_id:             Option<String>,
  pub encyclopedia_image_url: Option<String>,
  pub date_last_crawled:      Option<String>,
  pub created_at:             String,
  pub updated_at:             String,
}

impl RawGrape {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      grape_id:               row.get(0)?,
      vivc_id:                row.get(1)?,
      name:                   row.get(2)?,
      vivc_url:               row.get(3)?,
      berry_color:            row.get(4)?,
      species:                row.get(5)?,
      year_of_crossing:       row.get(6)?,
      breeder:                row.get(7)?,
      country_id:             row.get(8)?,
      encyclopedia_image_url: row.get(9)?,
      date_last_crawled:      row.get(10)?,
      created_at:             row.get(11)?,
      updated_at:             row.get(12)?,
    })
  }

  pub fn into_grape(self) -> Result<Grape> {
    Ok(Grape {
      grape_id:               decode_uuid(&self.grape_id)?,
      vivc_id:                self.vivc_id,
      name:                   self.name,
      vivc_url:               self.vivc_url,
      berry_color:            self.berry_color,
      species:                self.species,
      year_of_crossing:       self.year_of_crossing,
      breeder:                self.breeder,
      country_id:             self.country_id.as_deref().map(decode_uuid).transpose()?,
      encyclopedia_image_url: self.encyclopedia_image_url.filter(|u| !u.is_empty()),
      date_last_crawled:      self.date_last_crawled.as_deref().map(decode_dt).transpose()?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}

pub const PHOTO_COLUMNS: &str =
  "p.photo_id, p.grape_id, p.url, p.source, p.photo_type, p.created_at";

/// Raw strings read from a `grape_photos` row.
pub struct RawPhoto {
  pub photo_id:   String,
  pub grape_id:   String,
  pub url:        String,
  pub source:     String,
  pub photo_type: String,
  pub created_at: String,
}

impl RawPhoto {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      photo_id:   row.get(0)?,
      grape_id:   row.get(1)?,
      url:        row.get(2)?,
      source:     row.get(3)?,
      photo_type: row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_photo(self) -> Result<GrapePhoto> {
    Ok(GrapePhoto {
      photo_id:   decode_uuid(&self.photo_id)?,
      grape_id:   decode_uuid(&self.grape_id)?,
      url:        self.url,
      source:     self.source,
      photo_type: PhotoType::parse(&self.photo_type)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    assert_eq!(escape_like("Riesling"), "Riesling");
  }

  #[test]
  fn datetime_round_trips_through_rfc3339() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(decode_dt("yesterday").is_err());
  }
}
