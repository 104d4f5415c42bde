//! Error types for `vitis-import`.

use thiserror::Error;
use vitis_core::store::StoreError;

/// Why a page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("could not build http client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request to {url} failed: {source}")]
  Transport {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} answered {status}")]
  Status { url: String, status: u16 },

  /// No page is available for the URL (used by non-network fetchers).
  #[error("no page at {url}")]
  Missing { url: String },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Scrape(#[from] vitis_scrape::Error),

  #[error(transparent)]
  Core(#[from] vitis_core::Error),

  #[error("country {0:?} is not in the store")]
  CountryNotInStore(String),

  #[error("no cultivar named {0:?} on VIVC")]
  CultivarNotFound(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn store<E: StoreError>(e: E) -> Self { Self::Store(Box::new(e)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
