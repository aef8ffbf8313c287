// ==========================================
// 整车配置规划 - API 层
// ==========================================
// 职责: 提供进程内业务 API,供 CLI / 宿主应用调用
// ==========================================

pub mod catalog_api;
pub mod configuration_api;
pub mod error;
pub mod probability_api;
pub mod validator;

// 重导出核心类型
pub use catalog_api::{CatalogApi, RestoreSummary};
pub use configuration_api::ConfigurationApi;
pub use error::{ApiError, ApiResult};
pub use probability_api::ProbabilityApi;
pub use validator::InputValidator;
