//! Import passes that populate a [`GrapeStore`](vitis_core::store::GrapeStore)
//! from VIVC and the encyclopedia.
//!
//! Every pass runs strictly sequentially: one request in flight, one store
//! write at a time. Passes never abort on a single bad record; failures are
//! logged and counted in the pass's tally, which is returned to the caller.
//!
//! Network access goes through the [`Fetcher`] trait so passes can be run
//! against canned pages in tests.

pub mod ancestry;
pub mod config;
pub mod encyclopedia;
pub mod error;
pub mod fetch;
pub mod grapes;
pub mod maintenance;
pub mod photos;
pub mod relationships;
pub mod retry;
pub mod tally;

mod importer;

pub use config::Settings;
pub use error::{Error, FetchError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use importer::Importer;

#[cfg(test)]
mod testing;
