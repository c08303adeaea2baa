//! CareFlow Engine - 临床流程编排引擎
//!
//! Decides whether a clinical order or coaching booking needs a live
//! appointment, and creates, links, and keeps synchronized the
//! Order ↔ Appointment ↔ Encounter triad.
//!
//! # 模块结构
//!
//! ```text
//! careflow-engine/src/
//! ├── core/          # 配置
//! ├── auth/          # 角色与病人归属校验
//! ├── db/            # 数据库层 (连接池、迁移、repository)
//! ├── encounters.rs  # 权限校验的 Encounter CRUD
//! ├── flow/          # 编排: 规则表、关联、教练流程、工厂
//! └── utils/         # 错误、日志、时钟
//! ```
//!
//! The engine is a library-level service boundary: HTTP/UI, auth token
//! plumbing, document storage, and the lab-network integration live in
//! other services and consume this crate.

pub mod auth;
pub mod core;
pub mod db;
pub mod encounters;
pub mod flow;
pub mod utils;

// Re-export 公共类型
pub use auth::{AccessPolicy, DbAccessPolicy};
pub use crate::core::Config;
pub use db::DbService;
pub use encounters::EncounterService;
pub use flow::{AppointmentLinkingService, CoachingFlowService, FlowFactory};
pub use utils::{AppError, AppResult, Clock, FixedClock, SystemClock};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
