// ==========================================
// 整车配置规划 - 概率推导结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 特征值ID → 概率
pub type ProbabilityMap = BTreeMap<String, f64>;

/// 类别ID → 概率分布
pub type ClassProbabilities = BTreeMap<String, ProbabilityMap>;

/// 类别ID → (特征值ID → 产量)
pub type VolumeMap = BTreeMap<String, BTreeMap<String, i64>>;

/// 计算步骤 (可解释性日志)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculationStep {
    /// 独立类的区域禁售 + 按比例重分配
    #[serde(rename_all = "camelCase")]
    Exclusion {
        region_id: String,
        class_id: String,
        excluded: Vec<String>,
        excluded_mass: f64,
        redistributed: bool,
        description: String,
    },
    /// 区域类 (方向盘) 概率
    #[serde(rename_all = "camelCase")]
    Regional {
        class_id: String,
        description: String,
        details: String,
    },
    /// 单条依赖规则的贡献
    #[serde(rename_all = "camelCase")]
    Dependency {
        rule_id: String,
        rule_name: String,
        source_class: String,
        source_values: Vec<String>,
        target_class: String,
        contribution: f64,
        distribution: BTreeMap<String, f64>,
    },
    /// 依赖类的区域禁售 + 归一
    #[serde(rename_all = "camelCase")]
    DependentExclusion {
        region_id: String,
        class_id: String,
        excluded: Vec<String>,
        excluded_mass: f64,
        description: String,
    },
    /// 最终归一化
    #[serde(rename_all = "camelCase")]
    Normalization {
        class_id: String,
        total_before: f64,
    },
}

/// 单个区域的概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionBreakdown {
    pub region_id: String,
    pub name: String,
    pub volume_share: f64,
    pub steering_value: String,
    pub exclusions: BTreeMap<String, Vec<String>>,
    /// round(baseVolume × volumeShare)
    pub volume: i64,
}

/// 概率推导结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationResult {
    pub independent: ClassProbabilities,
    pub dependent: ClassProbabilities,
    pub regional: ClassProbabilities,
    pub volumes: VolumeMap,
    pub steps: Vec<CalculationStep>,
    pub base_volume: u64,
    #[serde(default)]
    pub by_region: Vec<RegionBreakdown>,
}

impl DerivationResult {
    /// 按 independent → dependent → regional 顺序查找类别分布
    pub fn distribution(&self, class_id: &str) -> Option<&ProbabilityMap> {
        self.independent
            .get(class_id)
            .or_else(|| self.dependent.get(class_id))
            .or_else(|| self.regional.get(class_id))
    }

    pub fn probability(&self, class_id: &str, characteristic_id: &str) -> f64 {
        self.distribution(class_id)
            .and_then(|m| m.get(characteristic_id))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn volume(&self, class_id: &str, characteristic_id: &str) -> i64 {
        self.volumes
            .get(class_id)
            .and_then(|m| m.get(characteristic_id))
            .copied()
            .unwrap_or(0)
    }
}

/// 输入分布合计检查
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityCheck {
    pub sum: f64,
    pub valid: bool,
}
