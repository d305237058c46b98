//! Utilities
//!
//! Common utilities used throughout the application.

pub mod error;
pub mod paths;
pub mod tracing_setup;

pub use error::*;
pub use paths::*;
