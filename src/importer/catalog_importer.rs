// ==========================================
// 整车配置规划 - 目录数据导入/导出器
// ==========================================
// 流程: 解析 → 映射 → 落库 (Replace / Merge)
// 格式: Excel 工作簿 / CSV 目录 / JSON 数据包
// 说明: 文件与数据库操作为阻塞 IO,放入 spawn_blocking
// ==========================================

use crate::domain::snapshot::{CatalogBundle, ImportMode};
use crate::importer::catalog_mapper::CatalogMapper;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, UniversalFileParser};
use crate::repository::CatalogBundleRepository;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// 导入汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub products: usize,
    pub classes: usize,
    pub characteristics: usize,
    pub regions: usize,
    pub configuration_rules: usize,
    pub dependency_rules: usize,
    /// Replace: 写入记录数;Merge: 新追加记录数
    pub written: usize,
    pub elapsed_ms: u64,
}

impl ImportSummary {
    fn from_bundle(bundle: &CatalogBundle, mode: ImportMode) -> Self {
        Self {
            mode,
            products: bundle.products.len(),
            classes: bundle.classes.len(),
            characteristics: bundle.classes.iter().map(|c| c.characteristics.len()).sum(),
            regions: bundle.regions.len(),
            configuration_rules: bundle.configuration_rules.len(),
            dependency_rules: bundle.dependency_rules.len(),
            written: 0,
            elapsed_ms: 0,
        }
    }
}

// ==========================================
// CatalogImporter Trait
// ==========================================
#[async_trait]
pub trait CatalogImporter: Send + Sync {
    /// 从表格文件导入 (.xlsx/.xls/.csv 或 CSV 目录)
    async fn import_file(&self, path: &Path, mode: ImportMode) -> ImportResult<ImportSummary>;

    /// 从 JSON 数据包导入
    async fn import_json_bundle(&self, path: &Path, mode: ImportMode) -> ImportResult<ImportSummary>;

    /// 导出 JSON 数据包,返回导出的记录数
    async fn export_json(&self, path: &Path) -> ImportResult<usize>;

    /// 导出为 CSV 目录 (每表一个文件),返回写出的文件
    async fn export_csv_dir(&self, dir: &Path) -> ImportResult<Vec<PathBuf>>;
}

// ==========================================
// CatalogImporterImpl
// ==========================================
pub struct CatalogImporterImpl {
    bundle_repo: Arc<CatalogBundleRepository>,
}

impl CatalogImporterImpl {
    pub fn new(bundle_repo: Arc<CatalogBundleRepository>) -> Self {
        Self { bundle_repo }
    }

    /// 落库并补全汇总
    async fn store(
        &self,
        bundle: CatalogBundle,
        mode: ImportMode,
        start: Instant,
    ) -> ImportResult<ImportSummary> {
        let mut summary = ImportSummary::from_bundle(&bundle, mode);
        let repo = Arc::clone(&self.bundle_repo);

        debug!("写入数据库");
        summary.written = tokio::task::spawn_blocking(move || repo.store(bundle, mode)).await??;
        summary.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            mode = ?summary.mode,
            written = summary.written,
            classes = summary.classes,
            configuration_rules = summary.configuration_rules,
            dependency_rules = summary.dependency_rules,
            elapsed_ms = summary.elapsed_ms,
            "目录导入完成"
        );
        Ok(summary)
    }
}

#[async_trait]
impl CatalogImporter for CatalogImporterImpl {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn import_file(&self, path: &Path, mode: ImportMode) -> ImportResult<ImportSummary> {
        let start = Instant::now();
        info!(?mode, "开始导入目录表格");

        // === 步骤 1: 解析文件 ===
        let owned = path.to_path_buf();
        let sheets = tokio::task::spawn_blocking(move || UniversalFileParser.parse(&owned))
            .await?
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;
        debug!(sheets = sheets.len(), "文件解析完成");

        // === 步骤 2: 映射 ===
        let bundle = CatalogMapper.map_sheets(&sheets).map_err(|e| {
            error!(error = %e, "字段映射失败");
            e
        })?;

        // === 步骤 3: 落库 ===
        self.store(bundle, mode, start).await
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn import_json_bundle(&self, path: &Path, mode: ImportMode) -> ImportResult<ImportSummary> {
        let start = Instant::now();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let content = tokio::fs::read_to_string(path).await?;
        let bundle: CatalogBundle = serde_json::from_str(&content)?;
        debug!(records = bundle.record_count(), "JSON 数据包解析完成");

        self.store(bundle, mode, start).await
    }

    async fn export_json(&self, path: &Path) -> ImportResult<usize> {
        let repo = Arc::clone(&self.bundle_repo);
        let mut bundle = tokio::task::spawn_blocking(move || repo.load()).await??;
        bundle.export_date = Some(Utc::now());

        let content = serde_json::to_string_pretty(&bundle)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;

        let count = bundle.record_count();
        info!(path = %path.display(), records = count, "JSON 数据包已导出");
        Ok(count)
    }

    async fn export_csv_dir(&self, dir: &Path) -> ImportResult<Vec<PathBuf>> {
        let repo = Arc::clone(&self.bundle_repo);
        let bundle = tokio::task::spawn_blocking(move || repo.load()).await??;
        let tables = CatalogMapper.to_tables(&bundle)?;

        let dir = dir.to_path_buf();
        let written = tokio::task::spawn_blocking(move || -> ImportResult<Vec<PathBuf>> {
            std::fs::create_dir_all(&dir).map_err(|e| ImportError::FileWriteError(e.to_string()))?;
            let mut files = Vec::with_capacity(tables.len());
            for table in &tables {
                let file = dir.join(format!("{}.csv", table.name));
                CsvParser.write_rows(&file, table.headers, &table.rows)?;
                files.push(file);
            }
            Ok(files)
        })
        .await??;

        info!(files = written.len(), "CSV 目录已导出");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_sqlite_connection;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn importer(dir: &TempDir) -> CatalogImporterImpl {
        let conn = open_sqlite_connection(dir.path().join("t.db").to_str().unwrap()).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = CatalogBundleRepository::from_connection(Arc::new(Mutex::new(conn)));
        CatalogImporterImpl::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_csv_export_then_import_keeps_counts() {
        let dir = TempDir::new().unwrap();
        let source = importer(&dir);
        source
            .bundle_repo
            .store(crate::sample_data::sample_bundle(), ImportMode::Replace)
            .unwrap();

        let out = dir.path().join("csv");
        let files = source.export_csv_dir(&out).await.unwrap();
        assert_eq!(files.len(), 6);

        let target_dir = TempDir::new().unwrap();
        let target = importer(&target_dir);
        let summary = target.import_file(&out, ImportMode::Replace).await.unwrap();
        assert_eq!(summary.classes, 6);
        assert_eq!(summary.regions, 7);
        assert_eq!(summary.configuration_rules, 5);
        assert_eq!(summary.dependency_rules, 11);

        let reloaded = target.bundle_repo.load().unwrap();
        assert_eq!(reloaded.classes, crate::sample_data::sample_bundle().classes);
    }

    #[tokio::test]
    async fn test_missing_json_bundle() {
        let dir = TempDir::new().unwrap();
        let err = importer(&dir)
            .import_json_bundle(&dir.path().join("none.json"), ImportMode::Merge)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
