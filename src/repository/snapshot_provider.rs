// ==========================================
// 整车配置规划 - 目录快照提供者
// ==========================================
// 职责: 为引擎提供只读的目录/规则快照
// 说明: 引擎只接收快照参数;规则编辑与求值并发时,
//       每次调用各自取一份快照 (copy-on-read)
// ==========================================

use crate::domain::snapshot::{CatalogBundle, CatalogSnapshot};
use crate::repository::bundle_repo::load_bundle;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 快照提供者
pub trait SnapshotProvider: Send + Sync {
    /// 读取单一产品的快照;None 表示不按产品过滤
    fn load_snapshot(&self, product_id: Option<&str>) -> RepositoryResult<CatalogSnapshot>;
}

// ==========================================
// SqliteSnapshotProvider
// ==========================================
pub struct SqliteSnapshotProvider {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotProvider {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl SnapshotProvider for SqliteSnapshotProvider {
    fn load_snapshot(&self, product_id: Option<&str>) -> RepositoryResult<CatalogSnapshot> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let bundle = load_bundle(&conn)?;
        Ok(bundle.snapshot_for(product_id))
    }
}

// ==========================================
// InMemorySnapshotProvider
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotProvider {
    bundle: CatalogBundle,
}

impl InMemorySnapshotProvider {
    pub fn new(bundle: CatalogBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &CatalogBundle {
        &self.bundle
    }
}

impl SnapshotProvider for InMemorySnapshotProvider {
    fn load_snapshot(&self, product_id: Option<&str>) -> RepositoryResult<CatalogSnapshot> {
        Ok(self.bundle.snapshot_for(product_id))
    }
}
