//! Engine configuration
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | DATABASE_PATH | careflow.db | SQLite 数据库文件路径 |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
//! | DB_MAX_CONNECTIONS | 5 | 连接池大小 |

/// 引擎配置
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 日志级别: trace | debug | info | warn | error
    pub log_level: String,
    /// 日志目录 (可选，文件输出)
    pub log_dir: Option<String>,
    /// 连接池大小
    pub db_max_connections: u32,
}

impl Config {
    /// Load `.env` (if present) then read configuration from the
    /// environment, falling back to defaults.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// 从环境变量加载配置（不读 `.env`）
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "careflow.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "careflow.db".into(),
            log_level: "info".into(),
            log_dir: None,
            db_max_connections: 5,
        }
    }
}
