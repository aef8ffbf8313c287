// ==========================================
// 整车配置规划 - 规则领域模型
// ==========================================
// 职责: 配置规则 (IF 条件 THEN 结果) 与依赖分布规则
// ==========================================

use crate::domain::types::{ConditionLogic, ConditionOperator, ResultOperator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// 规则条件
///
/// `logic` 描述与前一条件的连接方式,序列中首条件的 logic 被忽略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: Option<String>,
    pub class_id: String,
    pub operator: ConditionOperator,
    pub values: Vec<String>,
    #[serde(default)]
    pub logic: ConditionLogic,
}

/// 规则结果 (每条独立生效)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    #[serde(default)]
    pub id: Option<String>,
    pub class_id: String,
    pub operator: ResultOperator,
    pub values: Vec<String>,
}

// ==========================================
// ConfigurationRule - 配置约束规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(alias = "regions")]
    pub applicable_regions: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub results: Vec<RuleResult>,
}

impl ConfigurationRule {
    /// 无条件规则 (条件为空即恒成立)
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

// ==========================================
// DependencyRule - 依赖分布规则
// ==========================================
// 源类别在 source_values 上的概率质量按 distribution 分配到目标类别
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub source_class: String,
    pub source_values: Vec<String>,
    pub target_class: String,
    /// 目标特征值 → 比例 (约定合计为 1,但不强制)
    pub distribution: BTreeMap<String, f64>,
}
