//! Shared types for the CareFlow workspace
//!
//! Domain models and small utilities used across crates: entity row
//! types, create/update payloads, closed enums, and ID/time helpers.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
