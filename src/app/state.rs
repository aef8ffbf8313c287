// ==========================================
// 整车配置规划 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, ConfigurationApi, ProbabilityApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::{CatalogImporter, CatalogImporterImpl};
use crate::repository::{
    CatalogBundleRepository, CatalogVersionRepository, ConfigurationRuleRepository,
    DependencyRuleRepository, FeatureClassRepository, ProbabilityScenarioRepository,
    ProductRepository, RegionRepository, SnapshotProvider, SqliteSnapshotProvider,
};

/// 应用状态
///
/// 包含所有API实例和共享资源 (单一共享连接)
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置校验API
    pub configuration_api: Arc<ConfigurationApi>,

    /// 概率推导API
    pub probability_api: Arc<ProbabilityApi>,

    /// 目录管理API
    pub catalog_api: Arc<CatalogApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表 (幂等)
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例,并应用已保存的界面语言
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let class_repo = Arc::new(FeatureClassRepository::from_connection(conn.clone()));
        let region_repo = Arc::new(RegionRepository::from_connection(conn.clone()));
        let rule_repo = Arc::new(ConfigurationRuleRepository::from_connection(conn.clone()));
        let dependency_repo = Arc::new(DependencyRuleRepository::from_connection(conn.clone()));
        let bundle_repo = Arc::new(CatalogBundleRepository::from_connection(conn.clone()));
        let version_repo = Arc::new(CatalogVersionRepository::from_connection(conn.clone()));
        let scenario_repo = Arc::new(ProbabilityScenarioRepository::from_connection(conn.clone()));
        let snapshots: Arc<dyn SnapshotProvider> =
            Arc::new(SqliteSnapshotProvider::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        if let Err(e) = config_manager.apply_locale() {
            tracing::warn!("界面语言加载失败(使用默认语言): {}", e);
        }

        let importer: Arc<dyn CatalogImporter> =
            Arc::new(CatalogImporterImpl::new(bundle_repo.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let configuration_api = Arc::new(ConfigurationApi::new(snapshots.clone(), rule_repo));
        let probability_api = Arc::new(ProbabilityApi::new(
            snapshots,
            config_manager.clone(),
            scenario_repo,
            dependency_repo,
        ));
        let catalog_api = Arc::new(CatalogApi::new(
            product_repo,
            class_repo,
            region_repo,
            bundle_repo,
            version_repo,
            config_manager.clone(),
            importer,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            configuration_api,
            probability_api,
            catalog_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先取环境变量 VC_PLANNER_DB,否则为用户数据目录下的 vc-planner/vc_planner.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("VC_PLANNER_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./vc_planner.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("vc-planner");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("vc_planner.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_state_on_fresh_db() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();
        let state = AppState::new(db_path).unwrap();
        assert!(state.catalog_api.list_products().unwrap().is_empty());
    }
}
