// ==========================================
// 整车配置规划 - 配置管理器
// ==========================================
// 职责: 引擎参数与界面语言的加载、覆写、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置值；缺失时取默认值,格式错误时报错
    fn get_parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ValueError {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            }),
        }
    }

    // ===== 引擎参数 =====

    /// 读取引擎参数,缺失项使用默认值
    pub fn get_engine_config(&self) -> ConfigResult<EngineConfig> {
        let defaults = EngineConfig::default();

        let normalization_tolerance = self.get_parsed_or(
            config_keys::NORMALIZATION_TOLERANCE,
            defaults.normalization_tolerance,
        )?;
        let default_base_volume =
            self.get_parsed_or(config_keys::DEFAULT_BASE_VOLUME, defaults.default_base_volume)?;
        let input_sum_tolerance =
            self.get_parsed_or(config_keys::INPUT_SUM_TOLERANCE, defaults.input_sum_tolerance)?;

        for (key, value) in [
            (config_keys::NORMALIZATION_TOLERANCE, normalization_tolerance),
            (config_keys::INPUT_SUM_TOLERANCE, input_sum_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValueError {
                    key: key.to_string(),
                    value: value.to_string(),
                    message: "容差必须为非负有限数".to_string(),
                });
            }
        }

        Ok(EngineConfig {
            normalization_tolerance,
            default_base_volume,
            input_sum_tolerance,
        })
    }

    /// 写入引擎参数 (三项全部覆写)
    pub fn set_engine_config(&self, config: &EngineConfig) -> ConfigResult<()> {
        self.set_global_config_value(
            config_keys::NORMALIZATION_TOLERANCE,
            &config.normalization_tolerance.to_string(),
        )?;
        self.set_global_config_value(
            config_keys::DEFAULT_BASE_VOLUME,
            &config.default_base_volume.to_string(),
        )?;
        self.set_global_config_value(
            config_keys::INPUT_SUM_TOLERANCE,
            &config.input_sum_tolerance.to_string(),
        )
    }

    // ===== 语言 =====

    /// 界面语言 (默认 en)
    pub fn get_locale(&self) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(config_keys::LOCALE)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()))
    }

    /// 将配置中的语言应用到 i18n
    pub fn apply_locale(&self) -> ConfigResult<String> {
        let locale = self.get_locale()?;
        crate::i18n::set_locale(&locale);
        Ok(locale)
    }

    // ===== 快照 =====

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// 用于版本快照时记录配置,保证回滚时配置一致
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名 global 配置,快照中不存在的键保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        tracing::info!(restored = count, "配置快照已恢复");
        Ok(count)
    }
}

/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 引擎
    pub const NORMALIZATION_TOLERANCE: &str = "engine/normalization_tolerance";
    pub const DEFAULT_BASE_VOLUME: &str = "engine/default_base_volume";
    pub const INPUT_SUM_TOLERANCE: &str = "engine/input_sum_tolerance";

    // 界面
    pub const LOCALE: &str = "ui/locale";
}
