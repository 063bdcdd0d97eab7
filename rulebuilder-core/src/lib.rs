//! Core shared library for the visual rule builder.
//!
//! This crate exposes the primitives every other crate in the workspace
//! leans on: the common error type, configuration loading, logging setup,
//! JSON helpers and the markup escaping used when labels are rendered.

pub mod config;
pub mod errors;
pub mod escape;
pub mod logging;
pub mod serde_utils;

pub use config::{BuilderConfig, Environment};
pub use errors::{CoreError, Result as CoreResult};
pub use escape::escape_markup;
