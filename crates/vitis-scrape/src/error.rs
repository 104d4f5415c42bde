//! Error type for `vitis-scrape`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid base url: {0}")]
  Url(#[from] url::ParseError),

  #[error("url {0} cannot carry path segments")]
  NotABase(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
