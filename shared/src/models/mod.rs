//! Data models
//!
//! Shared between careflow-engine and its callers (UI / webhook handlers).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY, snowflake-style).
//!
//! Timestamp convention: audit columns (`created_at`, `updated_at`,
//! `finalized_at`) are Unix millis `i64`; clinical datetimes
//! (`Encounter::date`, `Appointment::datetime`) are RFC 3339 strings.

pub mod appointment;
pub mod encounter;
pub mod flow;
pub mod order;
pub mod user;

// Re-exports
pub use appointment::*;
pub use encounter::*;
pub use flow::*;
pub use order::*;
pub use user::*;
