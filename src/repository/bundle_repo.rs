// ==========================================
// 整车配置规划 - 目录数据包仓储
// ==========================================
// 职责: 整体读取 / 整体替换 / 按 id 追加 目录与规则
// 用途: 数据导入、版本快照与恢复
// 红线: 替换在单个事务内完成,失败不留半成品
// ==========================================

use crate::domain::snapshot::{CatalogBundle, ImportMode, BUNDLE_FORMAT_VERSION};
use crate::repository::catalog_repo::{
    clear_catalog, insert_class, insert_product, insert_region, load_classes, load_products,
    load_regions,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::rule_repo::{
    clear_rules, insert_configuration_rule, insert_dependency_rule, load_configuration_rules,
    load_dependency_rules,
};
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// 读取全部目录与规则
pub(crate) fn load_bundle(conn: &Connection) -> rusqlite::Result<CatalogBundle> {
    Ok(CatalogBundle {
        version: BUNDLE_FORMAT_VERSION.to_string(),
        export_date: Some(Utc::now()),
        products: load_products(conn)?,
        classes: load_classes(conn, None)?,
        regions: load_regions(conn)?,
        configuration_rules: load_configuration_rules(conn)?,
        dependency_rules: load_dependency_rules(conn)?,
    })
}

/// 清空后整体写入 (调用方负责事务)
pub(crate) fn write_bundle(conn: &Connection, bundle: &CatalogBundle) -> rusqlite::Result<()> {
    clear_rules(conn)?;
    clear_catalog(conn)?;

    for product in &bundle.products {
        insert_product(conn, product)?;
    }
    for cls in &bundle.classes {
        insert_class(conn, cls)?;
    }
    for region in &bundle.regions {
        insert_region(conn, region)?;
    }
    for rule in &bundle.configuration_rules {
        insert_configuration_rule(conn, rule)?;
    }
    for rule in &bundle.dependency_rules {
        insert_dependency_rule(conn, rule)?;
    }
    Ok(())
}

// ==========================================
// CatalogBundleRepository
// ==========================================
pub struct CatalogBundleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogBundleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn load(&self) -> RepositoryResult<CatalogBundle> {
        let conn = self.get_conn()?;
        Ok(load_bundle(&conn)?)
    }

    /// 按导入模式写入数据包
    ///
    /// # 返回
    /// - Replace: 写入的记录数
    /// - Merge: 新追加的记录数 (id 已存在的记录保持不变)
    pub fn store(&self, incoming: CatalogBundle, mode: ImportMode) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut current = load_bundle(&tx)?;
        let count = current.absorb(incoming, mode);
        write_bundle(&tx, &current)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(?mode, records = count, "目录数据已写入");
        Ok(count)
    }
}
