//! User and Patient Models
//!
//! Backing rows for the role/ownership resolver.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum UserRole {
    Provider,
    Admin,
    Patient,
}

/// User account entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Patient chart row. `user_id` links the patient's own account when
/// they have portal access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Patient {
    pub id: i64,
    pub user_id: Option<i64>,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
