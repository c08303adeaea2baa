//! User / Patient Repository
//!
//! Backing reads for the role and ownership resolver.

use super::RepoResult;
use shared::models::{Patient, User};
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, display_name, role, is_active, created_at, updated_at FROM user WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_patient_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Patient>> {
    let row = sqlx::query_as::<_, Patient>(
        "SELECT id, user_id, full_name, is_active, created_at, updated_at FROM patient WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
