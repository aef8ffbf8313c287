// ==========================================
// 整车配置规划 - 引擎层
// ==========================================
// 职责: 配置约束校验 + 概率传播,均为纯函数式计算
// 红线: 引擎不访问存储,目录与规则均以只读参数传入
// ==========================================

pub mod constraint;
pub mod distribution;
pub mod error;
pub mod probability;
pub mod validation;

// 重导出核心引擎
pub use constraint::ConstraintEvaluator;
pub use error::{EngineError, EngineResult};
pub use probability::ProbabilityEngine;
pub use validation::{validate_configuration_rules, validate_dependency_rules};
