// ==========================================
// 整车配置规划 - 配置层
// ==========================================
// 职责: 引擎参数与界面语言管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;

pub use config_manager::{config_keys, ConfigManager, DEFAULT_LOCALE};
pub use engine_config::EngineConfig;
pub use error::{ConfigError, ConfigResult};
