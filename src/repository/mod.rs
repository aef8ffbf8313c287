// ==========================================
// 整车配置规划 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod bundle_repo;
pub mod catalog_repo;
pub mod error;
pub mod json_column;
pub mod rule_repo;
pub mod scenario_repo;
pub mod snapshot_provider;
pub mod version_repo;

// 重导出核心仓储
pub use bundle_repo::CatalogBundleRepository;
pub use catalog_repo::{FeatureClassRepository, ProductRepository, RegionRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use rule_repo::{
    ConfigurationRuleFilter, ConfigurationRuleRepository, DependencyRuleFilter,
    DependencyRuleRepository,
};
pub use scenario_repo::ProbabilityScenarioRepository;
pub use snapshot_provider::{InMemorySnapshotProvider, SnapshotProvider, SqliteSnapshotProvider};
pub use version_repo::{CatalogVersionRecord, CatalogVersionRepository};
