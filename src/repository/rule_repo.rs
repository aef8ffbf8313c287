// ==========================================
// 整车配置规划 - 规则仓储
// ==========================================
// 职责: configuration_rule / dependency_rule 表的 CRUD
// 存储: 条件/结果/适用区域/分布以 JSON 文本列存储
// 顺序: 按 seq (插入顺序) 返回,依赖规则的应用顺序依赖它
// ==========================================

use crate::domain::rule::{ConfigurationRule, DependencyRule};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_column;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 配置规则查询条件 (均为可选)
#[derive(Debug, Clone, Default)]
pub struct ConfigurationRuleFilter {
    pub product_id: Option<String>,
    pub region_id: Option<String>,
    pub active: Option<bool>,
}

impl ConfigurationRuleFilter {
    fn accepts(&self, rule: &ConfigurationRule) -> bool {
        if let Some(product_id) = &self.product_id {
            if rule.product_id.as_ref() != Some(product_id) {
                return false;
            }
        }
        if let Some(region_id) = &self.region_id {
            if !rule.applicable_regions.contains(region_id) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if rule.active != active {
                return false;
            }
        }
        true
    }
}

/// 依赖规则查询条件 (均为可选)
#[derive(Debug, Clone, Default)]
pub struct DependencyRuleFilter {
    pub product_id: Option<String>,
    pub source_class: Option<String>,
    pub target_class: Option<String>,
}

impl DependencyRuleFilter {
    fn accepts(&self, rule: &DependencyRule) -> bool {
        self.product_id
            .as_ref()
            .map_or(true, |p| rule.product_id.as_ref() == Some(p))
            && self
                .source_class
                .as_ref()
                .map_or(true, |s| &rule.source_class == s)
            && self
                .target_class
                .as_ref()
                .map_or(true, |t| &rule.target_class == t)
    }
}

fn rule_not_found(entity: &str, id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

// ==========================================
// 行映射 / 语句
// ==========================================

const CONFIG_RULE_COLUMNS: &str =
    "id, name, description, active, product_id, applicable_regions, conditions, results";
const DEPENDENCY_RULE_COLUMNS: &str =
    "id, name, product_id, source_class, source_values, target_class, distribution";

fn map_configuration_rule(row: &Row<'_>) -> rusqlite::Result<ConfigurationRule> {
    Ok(ConfigurationRule {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        active: row.get::<_, i64>(3)? != 0,
        product_id: row.get(4)?,
        applicable_regions: json_column::decode(row, 5)?,
        conditions: json_column::decode(row, 6)?,
        results: json_column::decode(row, 7)?,
    })
}

fn map_dependency_rule(row: &Row<'_>) -> rusqlite::Result<DependencyRule> {
    Ok(DependencyRule {
        id: row.get(0)?,
        name: row.get(1)?,
        product_id: row.get(2)?,
        source_class: row.get(3)?,
        source_values: json_column::decode(row, 4)?,
        target_class: row.get(5)?,
        distribution: json_column::decode(row, 6)?,
    })
}

pub(crate) fn load_configuration_rules(conn: &Connection) -> rusqlite::Result<Vec<ConfigurationRule>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM configuration_rule ORDER BY seq, id",
        CONFIG_RULE_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_configuration_rule)?;
    rows.collect()
}

pub(crate) fn insert_configuration_rule(conn: &Connection, rule: &ConfigurationRule) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO configuration_rule (
            id, name, description, active, product_id,
            applicable_regions, conditions, results, seq, updated_at
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            (SELECT COALESCE(MAX(seq), 0) + 1 FROM configuration_rule), ?9
         )",
        params![
            rule.id,
            rule.name,
            rule.description,
            rule.active as i64,
            rule.product_id,
            json_column::encode(&rule.applicable_regions)?,
            json_column::encode(&rule.conditions)?,
            json_column::encode(&rule.results)?,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_dependency_rules(conn: &Connection) -> rusqlite::Result<Vec<DependencyRule>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM dependency_rule ORDER BY seq, id",
        DEPENDENCY_RULE_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_dependency_rule)?;
    rows.collect()
}

pub(crate) fn insert_dependency_rule(conn: &Connection, rule: &DependencyRule) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO dependency_rule (
            id, name, product_id, source_class, source_values, target_class, distribution, seq, updated_at
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            (SELECT COALESCE(MAX(seq), 0) + 1 FROM dependency_rule), ?8
         )",
        params![
            rule.id,
            rule.name,
            rule.product_id,
            rule.source_class,
            json_column::encode(&rule.source_values)?,
            rule.target_class,
            json_column::encode(&rule.distribution)?,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub(crate) fn clear_rules(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM configuration_rule;
         DELETE FROM dependency_rule;",
    )
}

// ==========================================
// ConfigurationRuleRepository - 配置规则仓储
// ==========================================
pub struct ConfigurationRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigurationRuleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按条件查询 (保持插入顺序)
    pub fn list(&self, filter: &ConfigurationRuleFilter) -> RepositoryResult<Vec<ConfigurationRule>> {
        let conn = self.get_conn()?;
        let rules = load_configuration_rules(&conn)?;
        Ok(rules.into_iter().filter(|r| filter.accepts(r)).collect())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ConfigurationRule>> {
        let conn = self.get_conn()?;
        let rule = conn
            .query_row(
                &format!("SELECT {} FROM configuration_rule WHERE id = ?1", CONFIG_RULE_COLUMNS),
                params![id],
                map_configuration_rule,
            )
            .optional()?;
        Ok(rule)
    }

    pub fn insert(&self, rule: &ConfigurationRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_configuration_rule(&conn, rule)?;
        tracing::debug!(rule_id = %rule.id, "配置规则已新增");
        Ok(())
    }

    pub fn update(&self, rule: &ConfigurationRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE configuration_rule SET
                name = ?2, description = ?3, active = ?4, product_id = ?5,
                applicable_regions = ?6, conditions = ?7, results = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                rule.id,
                rule.name,
                rule.description,
                rule.active as i64,
                rule.product_id,
                json_column::encode(&rule.applicable_regions)?,
                json_column::encode(&rule.conditions)?,
                json_column::encode(&rule.results)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(rule_not_found("ConfigurationRule", &rule.id));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        if conn.execute("DELETE FROM configuration_rule WHERE id = ?1", params![id])? == 0 {
            return Err(rule_not_found("ConfigurationRule", id));
        }
        Ok(())
    }

    /// 复制规则
    ///
    /// - 新规则及其条件/结果均分配新 uuid
    /// - 名称追加 " (Copy)"
    pub fn duplicate(&self, id: &str) -> RepositoryResult<ConfigurationRule> {
        let source = self
            .find_by_id(id)?
            .ok_or_else(|| rule_not_found("ConfigurationRule", id))?;

        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = format!("{} (Copy)", source.name);
        for condition in copy.conditions.iter_mut() {
            condition.id = Some(Uuid::new_v4().to_string());
        }
        for result in copy.results.iter_mut() {
            result.id = Some(Uuid::new_v4().to_string());
        }

        self.insert(&copy)?;
        Ok(copy)
    }
}

// ==========================================
// DependencyRuleRepository - 依赖规则仓储
// ==========================================
pub struct DependencyRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DependencyRuleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list(&self, filter: &DependencyRuleFilter) -> RepositoryResult<Vec<DependencyRule>> {
        let conn = self.get_conn()?;
        let rules = load_dependency_rules(&conn)?;
        Ok(rules.into_iter().filter(|r| filter.accepts(r)).collect())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DependencyRule>> {
        let conn = self.get_conn()?;
        let rule = conn
            .query_row(
                &format!("SELECT {} FROM dependency_rule WHERE id = ?1", DEPENDENCY_RULE_COLUMNS),
                params![id],
                map_dependency_rule,
            )
            .optional()?;
        Ok(rule)
    }

    pub fn insert(&self, rule: &DependencyRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_dependency_rule(&conn, rule)?;
        Ok(())
    }

    /// 更新规则内容,保留原有应用顺序
    pub fn update(&self, rule: &DependencyRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE dependency_rule SET
                name = ?2, product_id = ?3, source_class = ?4, source_values = ?5,
                target_class = ?6, distribution = ?7, updated_at = ?8
             WHERE id = ?1",
            params![
                rule.id,
                rule.name,
                rule.product_id,
                rule.source_class,
                json_column::encode(&rule.source_values)?,
                rule.target_class,
                json_column::encode(&rule.distribution)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(rule_not_found("DependencyRule", &rule.id));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        if conn.execute("DELETE FROM dependency_rule WHERE id = ?1", params![id])? == 0 {
            return Err(rule_not_found("DependencyRule", id));
        }
        Ok(())
    }
}
