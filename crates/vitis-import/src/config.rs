//! Run configuration: process-wide [`Settings`] and typed options per pass.

use std::{collections::BTreeSet, path::PathBuf, time::Duration};

use serde::Deserialize;
use vitis_core::{grape::GrapeField, photo::PhotoType};

// ─── Settings ────────────────────────────────────────────────────────────────

/// Process-wide settings, read from `vitis.toml` and `VITIS_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub database_path:         PathBuf,
  pub vivc_base_url:         String,
  pub encyclopedia_base_url: String,
  pub request_timeout_secs:  u64,
  pub user_agent:            String,
  pub row_delay_ms:          u64,
  pub page_delay_ms:         u64,
  pub encyclopedia_delay_ms: u64,
  pub store_retry_attempts:  u32,
  pub store_retry_base_ms:   u64,
  pub host:                  String,
  pub port:                  u16,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      database_path:         PathBuf::from("vitis.sqlite3"),
      vivc_base_url:         "https://www.vivc.de".into(),
      encyclopedia_base_url: "https://en.wikipedia.org".into(),
      request_timeout_secs:  30,
      user_agent:            concat!("vitis/", env!("CARGO_PKG_VERSION")).into(),
      row_delay_ms:          500,
      page_delay_ms:         1000,
      encyclopedia_delay_ms: 100,
      store_retry_attempts:  3,
      store_retry_base_ms:   250,
      host:                  "127.0.0.1".into(),
      port:                  8000,
    }
  }
}

impl Settings {
  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

  pub fn pacing(&self) -> Pacing {
    Pacing {
      row:          Duration::from_millis(self.row_delay_ms),
      page:         Duration::from_millis(self.page_delay_ms),
      encyclopedia: Duration::from_millis(self.encyclopedia_delay_ms),
    }
  }

  pub fn retry(&self) -> RetryPolicy {
    RetryPolicy {
      attempts: self.store_retry_attempts.max(1),
      base:     Duration::from_millis(self.store_retry_base_ms),
    }
  }
}

/// Fixed delays between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
  /// After each stored photo.
  pub row:          Duration,
  /// After each listing page.
  pub page:         Duration,
  /// Between encyclopedia lookups.
  pub encyclopedia: Duration,
}

impl Pacing {
  pub const NONE: Self =
    Self { row: Duration::ZERO, page: Duration::ZERO, encyclopedia: Duration::ZERO };
}

/// Bounded retry of store writes that hit contention. Attempt `n` waits
/// `n * base` before the next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub base:     Duration,
}

impl RetryPolicy {
  pub const NONE: Self = Self { attempts: 1, base: Duration::ZERO };
}

// ─── Pass options ────────────────────────────────────────────────────────────

/// Which countries a listing import covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CountrySelection {
  #[default]
  All,
  /// A name or ISO code from the canonical table.
  One(String),
  /// Every canonical country from this name onwards, alphabetically.
  StartingFrom(String),
}

#[derive(Debug, Clone, Default)]
pub struct GrapeImportOptions {
  pub countries:          CountrySelection,
  /// Restrict the import to these fields. Empty means a full import, which
  /// may create grapes and countries; a partial import never does.
  pub fields:             BTreeSet<GrapeField>,
  /// Skip the inline relationship lookup of a full import.
  pub skip_relationships: bool,
  /// Report what would change without writing.
  pub dry_run:            bool,
}

impl GrapeImportOptions {
  pub fn is_partial(&self) -> bool { !self.fields.is_empty() }

  pub fn includes(&self, field: GrapeField) -> bool {
    self.fields.is_empty() || self.fields.contains(&field)
  }

  pub fn needs_detail_page(&self) -> bool {
    self.fields.is_empty() || self.fields.iter().any(|f| f.needs_detail_page())
  }
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipOptions {
  /// Name or ISO code; all grapes when absent.
  pub country: Option<String>,
  /// Re-resolve grapes the skip rules would pass over.
  pub force:   bool,
  pub limit:   Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PhotoOptions {
  /// Processed in this order; laboratory first by default so that field
  /// photos of the same grape are suppressed.
  pub types:           Vec<PhotoType>,
  /// Stop each type after this many listing pages.
  pub page_limit:      Option<usize>,
  /// Write the first fetched popup page here, for inspecting its markup.
  pub save_popup_html: Option<PathBuf>,
}

impl Default for PhotoOptions {
  fn default() -> Self {
    Self {
      types:           vec![PhotoType::Laboratory, PhotoType::Field],
      page_limit:      None,
      save_popup_html: None,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct BackfillOptions {
  pub limit:           Option<usize>,
  /// Only count matches.
  pub dry_run:         bool,
  /// Re-check grapes that already have an encyclopedia image.
  pub update_existing: bool,
}
