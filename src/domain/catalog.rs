// ==========================================
// 整车配置规划 - 产品目录领域模型
// ==========================================
// 职责: 产品 / 特征类别 / 特征值 / 销售区域
// 红线: 纯数据,求值期间不可变
// ==========================================

use crate::domain::types::ClassKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

// ==========================================
// Product - 可配置产品 (整车)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 基准产量 (缺省时取配置 default_base_volume)
    #[serde(default)]
    pub base_volume: Option<u64>,
}

// ==========================================
// Characteristic - 特征值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristic {
    /// 类别内唯一 (查询时按全局唯一处理)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    /// 停用的特征值不参与求值与选择
    #[serde(default = "default_true")]
    pub active: bool,
    /// 基础概率,仅对 Independent 类有意义
    #[serde(default)]
    pub base_probability: f64,
}

// ==========================================
// FeatureClass - 特征类别 (发动机/变速箱/套装...)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureClass {
    pub id: String,
    pub name: String,
    /// 仅用于展示
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: ClassKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

impl FeatureClass {
    pub fn characteristic(&self, characteristic_id: &str) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.id == characteristic_id)
    }

    /// 启用状态的特征值
    pub fn active_characteristics(&self) -> impl Iterator<Item = &Characteristic> {
        self.characteristics.iter().filter(|c| c.active)
    }

    pub fn has_active_characteristic(&self, characteristic_id: &str) -> bool {
        self.characteristic(characteristic_id)
            .map(|c| c.active)
            .unwrap_or(false)
    }
}

// ==========================================
// Region - 销售区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    /// 区域强制的方向盘特征值
    #[serde(alias = "steering")]
    pub steering_value: String,
    /// 区域间相对权重 (通常合计为 1,但不强制)
    #[serde(default)]
    pub volume_share: f64,
    /// 类别ID → 该区域禁售的特征值
    #[serde(default, alias = "excludeCharacteristics")]
    pub excluded_characteristics: BTreeMap<String, Vec<String>>,
}

impl Region {
    /// 指定类别在本区域禁售的特征值 (无则为空切片)
    pub fn exclusions_for(&self, class_id: &str) -> &[String] {
        self.excluded_characteristics
            .get(class_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ==========================================
// Catalog - 单一产品的目录视图
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub classes: Vec<FeatureClass>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl Catalog {
    pub fn class(&self, class_id: &str) -> Option<&FeatureClass> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    pub fn region(&self, region_id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == region_id)
    }

    pub fn classes_of_kind(&self, kind: ClassKind) -> impl Iterator<Item = &FeatureClass> {
        self.classes.iter().filter(move |c| c.kind == kind)
    }

    /// 基准产量: 产品未设置时取缺省值
    pub fn base_volume_or(&self, default_base_volume: u64) -> u64 {
        self.product
            .as_ref()
            .and_then(|p| p.base_volume)
            .unwrap_or(default_base_volume)
    }
}
