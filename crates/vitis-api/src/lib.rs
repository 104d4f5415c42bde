//! Read-only JSON API over the grape catalog.
//!
//! Exposes an axum [`Router`] backed by any
//! [`vitis_core::store::GrapeStore`]. Every endpoint is a `GET`; writes only
//! happen through the import passes.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vitis_api::api_router(store.clone()))
//! ```

pub mod autocomplete;
pub mod countries;
pub mod error;
pub mod grapes;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use vitis_core::store::GrapeStore;

pub use error::ApiError;

/// Build the API router for `store`, with request tracing.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GrapeStore + 'static,
{
  Router::new()
    .route("/countries", get(countries::list::<S>))
    .route("/countries/{iso_code}", get(countries::get_one::<S>))
    .route("/grapes/{vivc_id}", get(grapes::get_one::<S>))
    .route("/autocomplete", get(autocomplete::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}
