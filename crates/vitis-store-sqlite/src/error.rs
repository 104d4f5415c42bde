//! Error type for `vitis-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;
use vitis_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vitis_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => Some(e),
      _ => None,
    }
  }
}

impl StoreError for Error {
  fn is_contention(&self) -> bool {
    self.sqlite_failure().is_some_and(|e| {
      matches!(
        e.code,
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::ReadOnly
      )
    })
  }

  fn is_duplicate(&self) -> bool {
    self.sqlite_failure().is_some_and(|e| {
      e.code == ErrorCode::ConstraintViolation
        && matches!(
          e.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    })
  }
}
