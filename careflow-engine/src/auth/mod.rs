//! 认证与权限模块
//!
//! Role and patient-ownership checks consumed by the encounter
//! service. Checks run before any mutation and are advisory reads,
//! not transactional guards.

pub mod access;

pub use access::{AccessPolicy, DbAccessPolicy};
