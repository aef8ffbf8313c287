// ==========================================
// 整车配置规划 - 目录版本仓储
// ==========================================
// 职责: 保存/列出/读取目录快照版本
// 说明: 快照体 (bundle_json) 只在恢复时读取,列表不返回
// ==========================================

use crate::domain::snapshot::CatalogBundle;
use crate::domain::version::CatalogVersion;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 版本完整内容
#[derive(Debug, Clone)]
pub struct CatalogVersionRecord {
    pub version: CatalogVersion,
    pub bundle: CatalogBundle,
    pub config_snapshot_json: Option<String>,
}

pub(crate) fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_version(row: &Row<'_>) -> rusqlite::Result<CatalogVersion> {
    Ok(CatalogVersion {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
        created_by: row.get(4)?,
    })
}

// ==========================================
// CatalogVersionRepository
// ==========================================
pub struct CatalogVersionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogVersionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存版本
    ///
    /// name 为空时按 "Version N" 命名 (N = 已有版本数 + 1)
    pub fn create(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        created_by: Option<&str>,
        bundle: &CatalogBundle,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<CatalogVersion> {
        let conn = self.get_conn()?;

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM catalog_version", [], |row| row.get(0))?;
                format!("Version {}", count + 1)
            }
        };

        let version = CatalogVersion {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.map(str::to_string),
            created_at: Utc::now(),
            created_by: created_by.unwrap_or("system").to_string(),
        };

        conn.execute(
            "INSERT INTO catalog_version (
                id, name, description, created_at, created_by, bundle_json, config_snapshot_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                version.id,
                version.name,
                version.description,
                version.created_at.to_rfc3339(),
                version.created_by,
                serde_json::to_string(bundle)?,
                config_snapshot_json,
            ],
        )?;

        tracing::info!(version_id = %version.id, name = %version.name, "目录版本已保存");
        Ok(version)
    }

    /// 列出版本 (按创建时间)
    pub fn list(&self) -> RepositoryResult<Vec<CatalogVersion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, created_by
             FROM catalog_version ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], map_version)?;
        let versions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(versions)
    }

    /// 读取版本完整内容
    pub fn find_record(&self, id: &str) -> RepositoryResult<Option<CatalogVersionRecord>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, description, created_at, created_by, bundle_json, config_snapshot_json
                 FROM catalog_version WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        map_version(row)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((version, bundle_json, config_snapshot_json)) => Ok(Some(CatalogVersionRecord {
                version,
                bundle: serde_json::from_str(&bundle_json)?,
                config_snapshot_json,
            })),
        }
    }
}
