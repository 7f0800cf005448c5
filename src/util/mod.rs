//! Utility types and functions for UEFormat.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus small transform helpers

mod error;
mod math;

pub use error::*;
pub use math::*;
