//! Unified Error Handling
//!
//! Application-level error taxonomy for the orchestration engine.
//!
//! Two layers: [`crate::db::repository::RepoError`] stays at the
//! repository boundary and converts into [`AppError`] here. Mutation
//! paths surface `AppError` to the caller; read-oriented helpers and
//! discovery scans swallow failures to `None`/empty by documented
//! contract (a transient read failure degrades to "nothing found"
//! rather than crashing a listing view). No automatic retries anywhere.

use crate::db::repository::RepoError;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 权限错误 ==========
    /// Actor lacks access to the patient or encounter. Never retried.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== 业务逻辑错误 ==========
    /// Referenced order/appointment/encounter does not exist (or the
    /// actor may not see it; the two are indistinguishable).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Order type absent from the registry. Callers decide routing;
    /// the engine never silently defaults.
    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== 系统错误 ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations
pub type AppResult<T> = Result<T, AppError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}
