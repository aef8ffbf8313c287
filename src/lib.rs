// ==========================================
// 整车配置规划 - 核心库
// ==========================================
// 两个引擎: 配置约束校验 + 概率/产量推导
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 目录、规则、结果
pub mod domain;

// 引擎层 - 约束校验 / 概率传播
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 宿主接口
pub mod api;

// 应用层 - 依赖装配
pub mod app;

// 示例目录
pub mod sample_data;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    Catalog, CatalogBundle, CatalogSnapshot, Characteristic, ClassKind, ClassProbabilities,
    Configuration, ConfigurationRule, DependencyRule, DerivationResult, EvaluationResult,
    FeatureClass, Region, Violation,
};

pub use engine::{ConstraintEvaluator, EngineError, ProbabilityEngine};

pub use config::EngineConfig;

pub use api::{ApiError, CatalogApi, ConfigurationApi, ProbabilityApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "vc-planner";
