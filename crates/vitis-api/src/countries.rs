//! Handlers for `/countries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/countries` | Grape count per country, largest first |
//! | `GET`  | `/countries/{iso_code}` | Grapes by name and berry color counts; 404 if unknown |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use vitis_core::{
  country::{Country, CountrySummary},
  grape::{Grape, GrapeQuery},
  store::GrapeStore,
};

use crate::error::ApiError;

/// Color bucket for grapes with a blank `berry_color`.
pub const UNSPECIFIED_COLOR: &str = "NOT SPECIFIED";

/// `GET /countries`
pub async fn list<S: GrapeStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CountrySummary>>, ApiError> {
  let countries = store.list_countries().await.map_err(ApiError::store)?;
  Ok(Json(countries))
}

#[derive(Debug, Serialize)]
pub struct CountryDetail {
  pub country:      Country,
  pub grapes:       Vec<Grape>,
  pub color_counts: BTreeMap<String, u64>,
}

/// Number of grapes per berry color.
pub fn color_counts(grapes: &[Grape]) -> BTreeMap<String, u64> {
  let mut counts = BTreeMap::new();
  for grape in grapes {
    let color = grape.berry_color.trim();
    let key = if color.is_empty() { UNSPECIFIED_COLOR } else { color };
    *counts.entry(key.to_owned()).or_insert(0) += 1;
  }
  counts
}

/// `GET /countries/{iso_code}`
pub async fn get_one<S: GrapeStore>(
  State(store): State<Arc<S>>,
  Path(iso_code): Path<String>,
) -> Result<Json<CountryDetail>, ApiError> {
  let iso_code = iso_code.to_uppercase();
  let country = store
    .get_country(&iso_code)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("country {iso_code} not found")))?;

  let query = GrapeQuery { country_id: Some(country.country_id), ..Default::default() };
  let grapes = store.list_grapes(&query).await.map_err(ApiError::store)?;
  let color_counts = color_counts(&grapes);
  Ok(Json(CountryDetail { country, grapes, color_counts }))
}
