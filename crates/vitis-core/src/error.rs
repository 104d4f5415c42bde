//! Error types for `vitis-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown photo type: {0:?}")]
  UnknownPhotoType(String),

  #[error("unknown grape field: {0:?}")]
  UnknownField(String),

  #[error("unknown country: {0:?}")]
  UnknownCountry(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
