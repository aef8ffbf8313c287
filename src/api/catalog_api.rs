// ==========================================
// 整车配置规划 - 目录管理 API
// ==========================================
// 职责: 产品/类别/特征值/区域维护、版本快照、导入导出
// 红线: 版本恢复只替换目录数据,版本列表本身保留
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::config::ConfigManager;
use crate::domain::catalog::{Characteristic, FeatureClass, Product, Region};
use crate::domain::snapshot::{CatalogBundle, ImportMode};
use crate::domain::version::CatalogVersion;
use crate::importer::{CatalogImporter, ImportSummary};
use crate::repository::{
    CatalogBundleRepository, CatalogVersionRepository, FeatureClassRepository, ProductRepository,
    RegionRepository,
};

/// 版本恢复结果
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub version_id: String,
    pub records: usize,
    /// 恢复的配置项数 (版本未带配置快照时为 0)
    pub config_entries: usize,
}

// ==========================================
// CatalogApi - 目录管理 API
// ==========================================
pub struct CatalogApi {
    product_repo: Arc<ProductRepository>,
    class_repo: Arc<FeatureClassRepository>,
    region_repo: Arc<RegionRepository>,
    bundle_repo: Arc<CatalogBundleRepository>,
    version_repo: Arc<CatalogVersionRepository>,
    config_manager: Arc<ConfigManager>,
    importer: Arc<dyn CatalogImporter>,
}

impl CatalogApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_repo: Arc<ProductRepository>,
        class_repo: Arc<FeatureClassRepository>,
        region_repo: Arc<RegionRepository>,
        bundle_repo: Arc<CatalogBundleRepository>,
        version_repo: Arc<CatalogVersionRepository>,
        config_manager: Arc<ConfigManager>,
        importer: Arc<dyn CatalogImporter>,
    ) -> Self {
        Self {
            product_repo,
            class_repo,
            region_repo,
            bundle_repo,
            version_repo,
            config_manager,
            importer,
        }
    }

    // ==========================================
    // 产品
    // ==========================================

    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list()?)
    }

    pub fn get_product(&self, id: &str) -> ApiResult<Product> {
        self.product_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Product(id={})不存在", id)))
    }

    pub fn create_product(&self, product: &Product) -> ApiResult<()> {
        if product.id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }
        Ok(self.product_repo.insert(product)?)
    }

    pub fn update_product(&self, product: &Product) -> ApiResult<()> {
        Ok(self.product_repo.update(product)?)
    }

    pub fn delete_product(&self, id: &str) -> ApiResult<()> {
        Ok(self.product_repo.delete(id)?)
    }

    // ==========================================
    // 特征类别 / 特征值
    // ==========================================

    pub fn list_classes(&self, product_id: Option<&str>) -> ApiResult<Vec<FeatureClass>> {
        Ok(self.class_repo.list(product_id)?)
    }

    pub fn create_class(&self, cls: &FeatureClass) -> ApiResult<()> {
        if cls.id.trim().is_empty() {
            return Err(ApiError::InvalidInput("类别ID不能为空".to_string()));
        }
        for ch in &cls.characteristics {
            InputValidator::validate_probability(&format!("{}.{}", cls.id, ch.id), ch.base_probability)?;
        }
        Ok(self.class_repo.insert(cls)?)
    }

    pub fn update_class(&self, cls: &FeatureClass) -> ApiResult<()> {
        for ch in &cls.characteristics {
            InputValidator::validate_probability(&format!("{}.{}", cls.id, ch.id), ch.base_probability)?;
        }
        Ok(self.class_repo.update(cls)?)
    }

    /// 删除类别 (级联删除其特征值)
    pub fn delete_class(&self, id: &str) -> ApiResult<()> {
        self.class_repo.delete(id)?;
        info!(class_id = id, "特征类别已删除");
        Ok(())
    }

    pub fn upsert_characteristic(&self, class_id: &str, ch: &Characteristic) -> ApiResult<()> {
        InputValidator::validate_probability(&format!("{}.{}", class_id, ch.id), ch.base_probability)?;
        Ok(self.class_repo.upsert_characteristic(class_id, ch)?)
    }

    pub fn delete_characteristic(&self, class_id: &str, characteristic_id: &str) -> ApiResult<()> {
        Ok(self.class_repo.delete_characteristic(class_id, characteristic_id)?)
    }

    // ==========================================
    // 区域
    // ==========================================

    pub fn list_regions(&self) -> ApiResult<Vec<Region>> {
        Ok(self.region_repo.list()?)
    }

    pub fn create_region(&self, region: &Region) -> ApiResult<()> {
        InputValidator::validate_region(&region.id)?;
        InputValidator::validate_volume_share(&region.id, region.volume_share)?;
        Ok(self.region_repo.insert(region)?)
    }

    pub fn update_region(&self, region: &Region) -> ApiResult<()> {
        InputValidator::validate_volume_share(&region.id, region.volume_share)?;
        Ok(self.region_repo.update(region)?)
    }

    pub fn delete_region(&self, id: &str) -> ApiResult<()> {
        Ok(self.region_repo.delete(id)?)
    }

    // ==========================================
    // 版本快照
    // ==========================================

    /// 保存当前目录 + 配置为版本
    pub fn create_version(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        created_by: Option<&str>,
    ) -> ApiResult<CatalogVersion> {
        let bundle = self.bundle_repo.load()?;
        let config_snapshot = self.config_manager.get_config_snapshot()?;
        Ok(self.version_repo.create(
            name,
            description,
            created_by,
            &bundle,
            Some(config_snapshot.as_str()),
        )?)
    }

    pub fn list_versions(&self) -> ApiResult<Vec<CatalogVersion>> {
        Ok(self.version_repo.list()?)
    }

    /// 恢复版本: 整体替换目录与规则,并恢复配置快照
    pub fn restore_version(&self, id: &str) -> ApiResult<RestoreSummary> {
        let record = self
            .version_repo
            .find_record(id)?
            .ok_or_else(|| ApiError::NotFound(format!("CatalogVersion(id={})不存在", id)))?;

        let records = self.bundle_repo.store(record.bundle, ImportMode::Replace)?;
        let config_entries = match record.config_snapshot_json.as_deref() {
            Some(json) => self.config_manager.restore_config_from_snapshot(json)?,
            None => 0,
        };

        info!(version_id = id, records, config_entries, "目录版本已恢复");
        Ok(RestoreSummary {
            version_id: id.to_string(),
            records,
            config_entries,
        })
    }

    // ==========================================
    // 导入导出
    // ==========================================

    pub fn export_bundle(&self) -> ApiResult<CatalogBundle> {
        Ok(self.bundle_repo.load()?)
    }

    pub fn import_bundle(&self, bundle: CatalogBundle, mode: ImportMode) -> ApiResult<usize> {
        for region in &bundle.regions {
            InputValidator::validate_volume_share(&region.id, region.volume_share)?;
        }
        Ok(self.bundle_repo.store(bundle, mode)?)
    }

    /// 从表格文件导入 (.xlsx/.xls/.csv 或 CSV 目录)
    pub async fn import_file(&self, path: &Path, mode: ImportMode) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_file(path, mode).await?)
    }

    pub async fn import_json_file(&self, path: &Path, mode: ImportMode) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_json_bundle(path, mode).await?)
    }

    pub async fn export_json_file(&self, path: &Path) -> ApiResult<usize> {
        Ok(self.importer.export_json(path).await?)
    }

    pub async fn export_csv_dir(&self, dir: &Path) -> ApiResult<Vec<PathBuf>> {
        Ok(self.importer.export_csv_dir(dir).await?)
    }
}
