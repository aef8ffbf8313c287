// ==========================================
// 整车配置规划 - 约束校验结果
// ==========================================

use crate::domain::types::ResultOperator;
use serde::{Deserialize, Serialize};

/// 规则违反记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: String,
    pub rule_name: String,
    /// 被约束的目标类别
    pub class_id: String,
    pub operator: ResultOperator,
    /// 允许 (MUST_BE*) 或禁止 (CANNOT_BE) 的特征值集合
    pub values: Vec<String>,
    /// 当前已选特征值
    pub selected: String,
    pub message: String,
}

/// 非阻断提示的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    RequiredClassMissing,
    InactiveCharacteristic,
    UnknownCharacteristic,
}

/// 配置完整性提示 (不影响 valid)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationWarning {
    pub kind: WarningKind,
    pub class_id: String,
    #[serde(default)]
    pub characteristic_id: Option<String>,
    pub message: String,
}

/// 约束校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub warnings: Vec<ConfigurationWarning>,
}

impl EvaluationResult {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
            warnings: Vec::new(),
        }
    }

    /// 指定规则产生的违反
    pub fn violations_of<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.rule_id == rule_id)
    }
}
