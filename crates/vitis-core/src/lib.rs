//! Core types and trait definitions for the Vitis grape catalog.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod country;
pub mod error;
pub mod grape;
pub mod normalize;
pub mod photo;
pub mod store;

pub use error::{Error, Result};
