//! v1 API Data Transfer Objects.
//!
//! Responses reuse the domain models in `src/models/`, which already carry
//! their camelCase wire format.

pub mod claims;

pub use claims::*;
