//! Page extraction for the VIVC grape database and the encyclopedia API.
//!
//! Every extractor takes one fetched document and returns zero or more
//! structured rows. Extractors never fail: markup they cannot make sense of
//! produces an empty result, which callers treat as "nothing found".
//!
//! Nothing in this crate performs I/O. URL construction lives in [`urls`];
//! fetching is the importer's job.

pub mod attribution;
pub mod encyclopedia;
pub mod error;
pub mod listing;
pub mod passport;
pub mod pedigree;
pub mod photos;
pub mod popup;
pub mod search;
pub mod urls;

mod dom;

pub use error::{Error, Result};
pub use urls::VivcUrls;
