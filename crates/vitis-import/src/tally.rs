//! Per-pass outcome counters, printed by the CLI at the end of a run.

use std::{fmt, ops::AddAssign};

use serde::Serialize;

/// Listing import outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrapeTally {
  pub created:   u64,
  pub updated:   u64,
  /// Rows whose stored grape already matched.
  pub unchanged: u64,
  /// Rows without a usable VIVC id.
  pub skipped:   u64,
  /// Partial imports only: rows for grapes not in the store.
  pub not_found: u64,
  pub errors:    u64,
}

impl AddAssign for GrapeTally {
  fn add_assign(&mut self, rhs: Self) {
    self.created += rhs.created;
    self.updated += rhs.updated;
    self.unchanged += rhs.unchanged;
    self.skipped += rhs.skipped;
    self.not_found += rhs.not_found;
    self.errors += rhs.errors;
  }
}

impl fmt::Display for GrapeTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Created:   {}", self.created)?;
    writeln!(f, "  Updated:   {}", self.updated)?;
    writeln!(f, "  Unchanged: {}", self.unchanged)?;
    writeln!(f, "  Skipped:   {}", self.skipped)?;
    writeln!(f, "  Not found: {}", self.not_found)?;
    write!(f, "  Errors:    {}", self.errors)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipTally {
  pub processed:           u64,
  pub skipped:             u64,
  pub relationships_added: u64,
  pub errors:              u64,
}

impl fmt::Display for RelationshipTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Processed:           {}", self.processed)?;
    writeln!(f, "  Skipped:             {}", self.skipped)?;
    writeln!(f, "  Relationships added: {}", self.relationships_added)?;
    write!(f, "  Errors:              {}", self.errors)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhotoTally {
  pub photos_imported: u64,
  /// Existing photos that gained a source.
  pub sources_updated: u64,
  /// Already stored with a source, or rejected as duplicates.
  pub skipped:         u64,
  /// Field photos passed over because a laboratory photo exists.
  pub lower_priority:  u64,
  pub not_in_store:    u64,
  pub errors:          u64,
}

impl AddAssign for PhotoTally {
  fn add_assign(&mut self, rhs: Self) {
    self.photos_imported += rhs.photos_imported;
    self.sources_updated += rhs.sources_updated;
    self.skipped += rhs.skipped;
    self.lower_priority += rhs.lower_priority;
    self.not_in_store += rhs.not_in_store;
    self.errors += rhs.errors;
  }
}

impl fmt::Display for PhotoTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Photos imported:         {}", self.photos_imported)?;
    writeln!(f, "  Sources updated:         {}", self.sources_updated)?;
    writeln!(f, "  Skipped (already exist): {}", self.skipped)?;
    writeln!(f, "  Skipped (lab photo):     {}", self.lower_priority)?;
    writeln!(f, "  Grapes not in store:     {}", self.not_in_store)?;
    write!(f, "  Errors:                  {}", self.errors)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillTally {
  pub found:     u64,
  pub not_found: u64,
  pub errors:    u64,
}

impl fmt::Display for BackfillTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Found:     {}", self.found)?;
    writeln!(f, "  Not found: {}", self.not_found)?;
    write!(f, "  Errors:    {}", self.errors)
  }
}

/// Outcome of the normalize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeTally {
  pub grapes_updated:    u64,
  pub countries_updated: u64,
  pub errors:            u64,
}

impl fmt::Display for NormalizeTally {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Grapes updated:    {}", self.grapes_updated)?;
    writeln!(f, "  Countries updated: {}", self.countries_updated)?;
    write!(f, "  Errors:            {}", self.errors)
  }
}
