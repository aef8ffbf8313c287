// ==========================================
// 整车配置规划 - 领域类型定义
// ==========================================
// 职责: 特征类别种类、条件/结果运算符、条件连接逻辑、区域范围
// 红线: 运算符一律使用封闭枚举,不做字符串分发
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 区域选择器中表示"全部区域"的保留值
pub const ALL_REGIONS: &str = "ALL";

// ==========================================
// 特征类别种类 (Class Kind)
// ==========================================
// 序列化格式: 小写 (与导入表格一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Independent, // 概率由输入直接给定
    Dependent,   // 概率由依赖规则推导
    Regional,    // 概率由区域参数推导 (如方向盘位置)
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Independent => "independent",
            ClassKind::Dependent => "dependent",
            ClassKind::Regional => "regional",
        }
    }

    /// 是否为推导类 (Dependent / Regional)
    pub fn is_derived(&self) -> bool {
        matches!(self, ClassKind::Dependent | ClassKind::Regional)
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClassKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "independent" => Ok(ClassKind::Independent),
            "dependent" => Ok(ClassKind::Dependent),
            "regional" => Ok(ClassKind::Regional),
            other => Err(format!("未知的特征类别种类: {}", other)),
        }
    }
}

// ==========================================
// 条件运算符 (Condition Operator)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    OneOf,
}

impl ConditionOperator {
    /// 判定已选值是否满足运算符
    pub fn matches(&self, selected: &str, values: &[String]) -> bool {
        let member = values.iter().any(|v| v == selected);
        match self {
            ConditionOperator::Equals | ConditionOperator::OneOf => member,
            ConditionOperator::NotEquals => !member,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionOperator::Equals => write!(f, "EQUALS"),
            ConditionOperator::NotEquals => write!(f, "NOT_EQUALS"),
            ConditionOperator::OneOf => write!(f, "ONE_OF"),
        }
    }
}

// ==========================================
// 条件连接逻辑 (Condition Logic)
// ==========================================
// 描述本条件与"前一条件"的连接方式,首条件的 logic 忽略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionLogic {
    #[default]
    And,
    Or,
}

impl ConditionLogic {
    /// 左折叠: 将运行结果与当前条件结果合并
    pub fn combine(&self, running: bool, current: bool) -> bool {
        match self {
            ConditionLogic::And => running && current,
            ConditionLogic::Or => running || current,
        }
    }
}

impl fmt::Display for ConditionLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionLogic::And => write!(f, "AND"),
            ConditionLogic::Or => write!(f, "OR"),
        }
    }
}

// ==========================================
// 结果运算符 (Result Operator)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultOperator {
    MustBe,
    MustBeOneOf,
    CannotBe,
}

impl ResultOperator {
    /// 判定已选值是否违反结果约束
    pub fn is_violated_by(&self, selected: &str, values: &[String]) -> bool {
        let member = values.iter().any(|v| v == selected);
        match self {
            ResultOperator::MustBe | ResultOperator::MustBeOneOf => !member,
            ResultOperator::CannotBe => member,
        }
    }
}

impl fmt::Display for ResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultOperator::MustBe => write!(f, "MUST_BE"),
            ResultOperator::MustBeOneOf => write!(f, "MUST_BE_ONE_OF"),
            ResultOperator::CannotBe => write!(f, "CANNOT_BE"),
        }
    }
}

// ==========================================
// 区域范围 (Region Scope)
// ==========================================
// "ALL" 表示不做区域过滤 / 跨区域加权
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionScope {
    All,
    Region(String),
}

impl RegionScope {
    pub fn parse(region_id: &str) -> Self {
        let trimmed = region_id.trim();
        if trimmed == ALL_REGIONS {
            RegionScope::All
        } else {
            RegionScope::Region(trimmed.to_string())
        }
    }

    pub fn region_id(&self) -> Option<&str> {
        match self {
            RegionScope::All => None,
            RegionScope::Region(id) => Some(id.as_str()),
        }
    }

    /// 规则的适用区域是否覆盖当前范围
    pub fn admits(&self, applicable_regions: &[String]) -> bool {
        match self {
            RegionScope::All => true,
            RegionScope::Region(id) => applicable_regions.iter().any(|r| r == id),
        }
    }
}

impl fmt::Display for RegionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionScope::All => write!(f, "{}", ALL_REGIONS),
            RegionScope::Region(id) => write!(f, "{}", id),
        }
    }
}
