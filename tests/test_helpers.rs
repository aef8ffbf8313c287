// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、演示目录、配置构造等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use vc_planner::app::AppState;
use vc_planner::domain::{CatalogSnapshot, Configuration, ImportMode};
use vc_planner::sample_data::{sample_bundle, SAMPLE_PRODUCT_ID};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_test_connection(&db_path)?;
    vc_planner::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接 (与生产相同的 PRAGMA)
pub fn open_test_connection(db_path: &str) -> rusqlite::Result<Connection> {
    vc_planner::db::open_sqlite_connection(db_path)
}

/// 共享连接 (仓储构造用)
pub fn shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

/// 写入演示目录后的 AppState
pub fn seeded_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path)?;
    state
        .catalog_api
        .import_bundle(sample_bundle(), ImportMode::Replace)?;
    Ok((temp_file, state))
}

/// 演示产品的引擎快照
pub fn sample_snapshot() -> CatalogSnapshot {
    sample_bundle().snapshot_for(Some(SAMPLE_PRODUCT_ID))
}

/// 由 (类别, 特征值) 列表构造配置
pub fn selection(pairs: &[(&str, &str)]) -> Configuration {
    pairs
        .iter()
        .fold(Configuration::new(), |cfg, (class_id, char_id)| cfg.with(class_id, char_id))
}

/// 浮点近似断言
pub fn assert_close(actual: f64, expected: f64, context: &str) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "{}: expected {:.6}, got {:.6}",
        context,
        expected,
        actual
    );
}
