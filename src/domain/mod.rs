// ==========================================
// 整车配置规划 - 领域模型层
// ==========================================
// 职责: 定义目录、规则、配置选择、计算结果等领域实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod configuration;
pub mod derivation;
pub mod evaluation;
pub mod rule;
pub mod snapshot;
pub mod types;
pub mod version;

// 重导出核心类型
pub use catalog::{Catalog, Characteristic, FeatureClass, Product, Region};
pub use configuration::Configuration;
pub use derivation::{
    CalculationStep, ClassProbabilities, DerivationResult, ProbabilityCheck, ProbabilityMap,
    RegionBreakdown, VolumeMap,
};
pub use evaluation::{ConfigurationWarning, EvaluationResult, Violation, WarningKind};
pub use rule::{Condition, ConfigurationRule, DependencyRule, RuleResult};
pub use snapshot::{CatalogBundle, CatalogSnapshot, ImportMode};
pub use types::{
    ClassKind, ConditionLogic, ConditionOperator, RegionScope, ResultOperator, ALL_REGIONS,
};
pub use version::{CatalogVersion, ProbabilityScenario};
