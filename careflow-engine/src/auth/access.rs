//! Role / Ownership Resolver
//!
//! Fail-closed contract: every helper swallows store errors into a
//! negative answer. A transient read failure denies access; callers
//! rely on `false` meaning "no proven access".

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::repository::user;
use shared::models::UserRole;

/// Role and patient-access checks. Injected so tests can substitute a
/// canned policy without a backing store.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Provider or admin role on an active account
    async fn is_provider(&self, user_id: i64) -> bool;

    /// The patient's own (active) account
    async fn owns_patient(&self, user_id: i64, patient_id: i64) -> bool;
}

/// Resolver backed by the `user` / `patient` tables
#[derive(Clone)]
pub struct DbAccessPolicy {
    pool: SqlitePool,
}

impl DbAccessPolicy {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessPolicy for DbAccessPolicy {
    async fn is_provider(&self, user_id: i64) -> bool {
        match user::find_by_id(&self.pool, user_id).await {
            Ok(Some(u)) => {
                u.is_active && matches!(u.role, UserRole::Provider | UserRole::Admin)
            }
            Ok(None) => false,
            Err(e) => {
                warn!(user_id, error = %e, "role lookup failed, denying access");
                false
            }
        }
    }

    async fn owns_patient(&self, user_id: i64, patient_id: i64) -> bool {
        match user::find_patient_by_id(&self.pool, patient_id).await {
            Ok(Some(p)) => p.is_active && p.user_id == Some(user_id),
            Ok(None) => false,
            Err(e) => {
                warn!(user_id, patient_id, error = %e, "ownership lookup failed, denying access");
                false
            }
        }
    }
}
