//! Cluster photographs attached to a grape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Which VIVC photo category a picture was imported from.
///
/// Laboratory photos take precedence over field photos both when importing
/// and when choosing the primary photo for display.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhotoType {
  Field,
  Laboratory,
}

impl PhotoType {
  /// Human-readable label, which is also the VIVC "part of plant" search
  /// value for the photo listing.
  pub fn label(self) -> &'static str {
    match self {
      Self::Field => "Cluster in the field",
      Self::Laboratory => "Cluster in the laboratory",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownPhotoType(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrapePhoto {
  pub photo_id:   Uuid,
  pub grape_id:   Uuid,
  pub url:        String,
  /// Attribution text; empty when none could be found.
  pub source:     String,
  pub photo_type: PhotoType,
  pub created_at: DateTime<Utc>,
}

impl GrapePhoto {
  pub fn has_source(&self) -> bool { !self.source.trim().is_empty() }
}

/// Input to [`crate::store::GrapeStore::add_photo`].
#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub grape_id:   Uuid,
  pub url:        String,
  pub source:     String,
  pub photo_type: PhotoType,
}

/// Pick the photo to display for a grape: the oldest laboratory photo, else
/// the oldest field photo, else the first photo given.
///
/// `photos` is expected in creation order, as the store returns them.
pub fn primary_photo(photos: &[GrapePhoto]) -> Option<&GrapePhoto> {
  [PhotoType::Laboratory, PhotoType::Field]
    .into_iter()
    .find_map(|ty| photos.iter().find(|p| p.photo_type == ty))
    .or_else(|| photos.first())
}
