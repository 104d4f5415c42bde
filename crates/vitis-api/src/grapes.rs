//! Handler for `GET /grapes/{vivc_id}`: one grape with its lineage and
//! photos.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use vitis_core::{
  country::Country,
  grape::Grape,
  photo::{GrapePhoto, primary_photo},
  store::GrapeStore,
};

use crate::error::ApiError;

/// A child of the requested grape and the child's other parent, if known.
#[derive(Debug, Serialize)]
pub struct ChildEntry {
  pub grape:        Grape,
  pub other_parent: Option<Grape>,
}

#[derive(Debug, Serialize)]
pub struct GrapeDetail {
  pub grape:         Grape,
  pub country:       Option<Country>,
  pub parents:       Vec<Grape>,
  pub children:      Vec<ChildEntry>,
  pub primary_photo: Option<GrapePhoto>,
  pub photos:        Vec<GrapePhoto>,
}

/// `GET /grapes/{vivc_id}`
pub async fn get_one<S: GrapeStore>(
  State(store): State<Arc<S>>,
  Path(vivc_id): Path<String>,
) -> Result<Json<GrapeDetail>, ApiError> {
  let grape = store
    .get_grape(&vivc_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("grape {vivc_id} not found")))?;

  let country = match grape.country_id {
    Some(id) => store.get_country_by_id(id).await.map_err(ApiError::store)?,
    None => None,
  };
  let parents = store.parents(grape.grape_id).await.map_err(ApiError::store)?;

  let mut children = Vec::new();
  for child in store.children(grape.grape_id).await.map_err(ApiError::store)? {
    let other_parent = store
      .parents(child.grape_id)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .find(|p| p.grape_id != grape.grape_id);
    children.push(ChildEntry { grape: child, other_parent });
  }

  let photos = store.photos(grape.grape_id).await.map_err(ApiError::store)?;
  let primary_photo = primary_photo(&photos).cloned();

  Ok(Json(GrapeDetail { grape, country, parents, children, primary_photo, photos }))
}
