// ==========================================
// 整车配置规划 - 目录版本 / 概率场景
// ==========================================

use crate::domain::derivation::ClassProbabilities;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 目录版本 (快照内容单独存储,列表接口不返回快照体)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVersion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// 已保存的概率输入场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityScenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub region_id: String,
    pub input_probabilities: ClassProbabilities,
    pub created_at: DateTime<Utc>,
}
