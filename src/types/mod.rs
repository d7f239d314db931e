//! Shared types for the dashboard core

pub mod error;

pub use error::{FetchError, Result, ValidatorError};
