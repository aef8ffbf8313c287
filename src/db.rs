// ==========================================
// 整车配置规划 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 幂等建表,记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys 与 busy_timeout 都需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表 (幂等)
///
/// - 列表/映射类字段 (适用区域、条件、结果、分布、禁售) 以 JSON 文本存储
/// - seq 列保存插入顺序,依赖规则的应用顺序依赖它
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let current = read_schema_version(conn)?;
    if current.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [CURRENT_SCHEMA_VERSION],
        )?;
    } else if current != Some(CURRENT_SCHEMA_VERSION) {
        tracing::warn!(
            found = ?current,
            expected = CURRENT_SCHEMA_VERSION,
            "数据库 schema_version 与代码不一致"
        );
    }
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT,
    base_volume  INTEGER,
    seq          INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS feature_class (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    color       TEXT,
    kind        TEXT NOT NULL,
    required    INTEGER NOT NULL DEFAULT 0,
    product_id  TEXT,
    seq         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS characteristic (
    id                TEXT NOT NULL,
    class_id          TEXT NOT NULL REFERENCES feature_class(id) ON DELETE CASCADE,
    name              TEXT NOT NULL,
    code              TEXT NOT NULL DEFAULT '',
    active            INTEGER NOT NULL DEFAULT 1,
    base_probability  REAL NOT NULL DEFAULT 0,
    seq               INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (class_id, id)
);

CREATE TABLE IF NOT EXISTS region (
    id                        TEXT PRIMARY KEY,
    name                      TEXT NOT NULL,
    code                      TEXT,
    steering_value            TEXT NOT NULL DEFAULT '',
    volume_share              REAL NOT NULL DEFAULT 0,
    excluded_characteristics  TEXT NOT NULL DEFAULT '{}',
    seq                       INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS configuration_rule (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    description         TEXT,
    active              INTEGER NOT NULL DEFAULT 1,
    product_id          TEXT,
    applicable_regions  TEXT NOT NULL DEFAULT '[]',
    conditions          TEXT NOT NULL DEFAULT '[]',
    results             TEXT NOT NULL DEFAULT '[]',
    seq                 INTEGER NOT NULL DEFAULT 0,
    updated_at          TEXT
);

CREATE TABLE IF NOT EXISTS dependency_rule (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    product_id     TEXT,
    source_class   TEXT NOT NULL,
    source_values  TEXT NOT NULL DEFAULT '[]',
    target_class   TEXT NOT NULL,
    distribution   TEXT NOT NULL DEFAULT '{}',
    seq            INTEGER NOT NULL DEFAULT 0,
    updated_at     TEXT
);

CREATE TABLE IF NOT EXISTS probability_scenario (
    id                   TEXT PRIMARY KEY,
    name                 TEXT NOT NULL,
    product_id           TEXT,
    region_id            TEXT NOT NULL,
    input_probabilities  TEXT NOT NULL,
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS catalog_version (
    id                    TEXT PRIMARY KEY,
    name                  TEXT NOT NULL,
    description           TEXT,
    created_at            TEXT NOT NULL,
    created_by            TEXT NOT NULL,
    bundle_json           TEXT NOT NULL,
    config_snapshot_json  TEXT
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id    TEXT PRIMARY KEY,
    scope_type  TEXT NOT NULL,
    scope_key   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id  TEXT NOT NULL REFERENCES config_scope(scope_id),
    key       TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE INDEX IF NOT EXISTS idx_characteristic_class ON characteristic(class_id);
CREATE INDEX IF NOT EXISTS idx_configuration_rule_product ON configuration_rule(product_id);
CREATE INDEX IF NOT EXISTS idx_dependency_rule_product ON dependency_rule(product_id);
"#;
