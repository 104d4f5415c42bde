//! The `GrapeStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `vitis-store-sqlite`).
//! Importers and the read API depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  country::{Country, CountrySummary, NewCountry},
  grape::{Grape, GrapePatch, GrapeQuery, GrapeRef, NewGrape},
  photo::{GrapePhoto, NewPhoto},
};

// ─── Error classification ────────────────────────────────────────────────────

/// What importers need to know about a backend error to decide between
/// retrying, skipping and giving up.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The store is temporarily locked, busy or read-only; the same write may
  /// succeed if retried after a pause.
  fn is_contention(&self) -> bool;

  /// A unique constraint rejected the write.
  fn is_duplicate(&self) -> bool;
}

// ─── Status report ───────────────────────────────────────────────────────────

/// Relationship resolution progress for one country.
///
/// A grape counts as resolved when it has `date_last_crawled` set or at
/// least one parent edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipStatus {
  pub total:        u64,
  pub resolved:     u64,
  pub unresolved:   u64,
  pub crawled:      u64,
  pub with_parents: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a grape catalog backend.
///
/// Every write is atomic on its own; no method holds a lock across calls.
pub trait GrapeStore: Send + Sync {
  type Error: StoreError;

  // ── Countries ─────────────────────────────────────────────────────────

  /// Return the country with `input.iso_code`, creating it if absent. The
  /// flag is `true` when the row was created by this call.
  fn ensure_country(
    &self,
    input: NewCountry,
  ) -> impl Future<Output = Result<(Country, bool), Self::Error>> + Send + '_;

  fn get_country<'a>(
    &'a self,
    iso_code: &'a str,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + 'a;

  fn get_country_by_id(
    &self,
    country_id: Uuid,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + '_;

  /// Resolve free operator input to a country: ISO code first, then exact
  /// name, then name substring (all case-insensitive).
  fn find_country<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + 'a;

  /// All countries with their grape counts, by count descending then name.
  fn list_countries(
    &self,
  ) -> impl Future<Output = Result<Vec<CountrySummary>, Self::Error>> + Send + '_;

  fn rename_country(
    &self,
    country_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Grapes ────────────────────────────────────────────────────────────

  fn get_grape<'a>(
    &'a self,
    vivc_id: &'a str,
  ) -> impl Future<Output = Result<Option<Grape>, Self::Error>> + Send + 'a;

  /// Insert a new grape. Fails with a duplicate error if `vivc_id` exists.
  fn insert_grape(
    &self,
    input: NewGrape,
  ) -> impl Future<Output = Result<Grape, Self::Error>> + Send + '_;

  /// Write the fields present in `patch` and bump `updated_at`. Returns the
  /// stored grape, or `None` if `grape_id` does not exist.
  fn update_grape(
    &self,
    grape_id: Uuid,
    patch: GrapePatch,
  ) -> impl Future<Output = Result<Option<Grape>, Self::Error>> + Send + '_;

  fn list_grapes<'a>(
    &'a self,
    query: &'a GrapeQuery,
  ) -> impl Future<Output = Result<Vec<Grape>, Self::Error>> + Send + 'a;

  /// Grapes whose name starts with `prefix`, case-insensitively, by name.
  fn autocomplete<'a>(
    &'a self,
    prefix: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GrapeRef>, Self::Error>> + Send + 'a;

  fn set_encyclopedia_image(
    &self,
    grape_id: Uuid,
    url: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Lineage ───────────────────────────────────────────────────────────

  fn parents(
    &self,
    grape_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Grape>, Self::Error>> + Send + '_;

  fn children(
    &self,
    grape_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Grape>, Self::Error>> + Send + '_;

  /// Record `parent_id` as a parent of `child_id`. Returns `false` when the
  /// edge already existed.
  fn add_parent(
    &self,
    child_id: Uuid,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn mark_crawled(
    &self,
    grape_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn relationship_status(
    &self,
    country_id: Uuid,
  ) -> impl Future<Output = Result<RelationshipStatus, Self::Error>> + Send + '_;

  // ── Photos ────────────────────────────────────────────────────────────

  /// Photos of a grape in creation order.
  fn photos(
    &self,
    grape_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GrapePhoto>, Self::Error>> + Send + '_;

  /// Fails with a duplicate error if the grape already has a photo at
  /// `input.url`.
  fn add_photo(
    &self,
    input: NewPhoto,
  ) -> impl Future<Output = Result<GrapePhoto, Self::Error>> + Send + '_;

  fn set_photo_source(
    &self,
    photo_id: Uuid,
    source: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
