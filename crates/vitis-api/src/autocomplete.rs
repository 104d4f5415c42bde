//! Handler for `GET /autocomplete`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use vitis_core::{grape::GrapeRef, store::GrapeStore};

use crate::error::ApiError;

/// Most suggestions returned for one query.
pub const MAX_RESULTS: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteParams {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Serialize)]
pub struct Suggestions {
  pub results: Vec<GrapeRef>,
}

/// `GET /autocomplete?q=<prefix>`: grapes whose name starts with `q`,
/// case-insensitively. A blank query yields no results.
pub async fn handler<S: GrapeStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<AutocompleteParams>,
) -> Result<Json<Suggestions>, ApiError> {
  let prefix = params.q.trim();
  if prefix.is_empty() {
    return Ok(Json(Suggestions { results: Vec::new() }));
  }
  let results = store.autocomplete(prefix, MAX_RESULTS).await.map_err(ApiError::store)?;
  Ok(Json(Suggestions { results }))
}
