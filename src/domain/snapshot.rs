// ==========================================
// 整车配置规划 - 目录快照 / 导入导出包
// ==========================================
// 职责:
// - CatalogSnapshot: 交给引擎的只读快照 (单一产品)
// - CatalogBundle: 多产品的完整数据包 (导入/导出/版本快照)
// 红线: 引擎只接收快照参数,不访问任何全局状态
// ==========================================

use crate::domain::catalog::{Catalog, FeatureClass, Product, Region};
use crate::domain::rule::{ConfigurationRule, DependencyRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 导出包格式版本
pub const BUNDLE_FORMAT_VERSION: &str = "1.0.0";

// ==========================================
// CatalogSnapshot - 引擎输入快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    pub configuration_rules: Vec<ConfigurationRule>,
    pub dependency_rules: Vec<DependencyRule>,
}

// ==========================================
// CatalogBundle - 完整数据包
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBundle {
    #[serde(default = "default_bundle_version")]
    pub version: String,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub classes: Vec<FeatureClass>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub configuration_rules: Vec<ConfigurationRule>,
    #[serde(default)]
    pub dependency_rules: Vec<DependencyRule>,
}

fn default_bundle_version() -> String {
    BUNDLE_FORMAT_VERSION.to_string()
}

impl Default for CatalogBundle {
    fn default() -> Self {
        Self {
            version: default_bundle_version(),
            export_date: None,
            products: Vec::new(),
            classes: Vec::new(),
            regions: Vec::new(),
            configuration_rules: Vec::new(),
            dependency_rules: Vec::new(),
        }
    }
}

/// 导入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// 整体替换
    Replace,
    /// 追加: 仅追加 id 未出现过的记录
    Merge,
}

/// 产品归属过滤: 未标注产品的记录视为所有产品共享
fn belongs_to(item_product: &Option<String>, product_id: Option<&str>) -> bool {
    match (product_id, item_product.as_deref()) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(wanted), Some(owner)) => wanted == owner,
    }
}

fn merge_by_id<T: Clone, F: Fn(&T) -> &str>(existing: &mut Vec<T>, incoming: &[T], id_of: F) -> usize {
    let known: HashSet<String> = existing.iter().map(|e| id_of(e).to_string()).collect();
    let mut appended = 0;
    for item in incoming {
        if !known.contains(id_of(item)) {
            existing.push(item.clone());
            appended += 1;
        }
    }
    appended
}

impl CatalogBundle {
    /// 抽取单一产品的引擎快照
    ///
    /// product_id 为 None 时取全部记录且不带产品 (基准产量取配置缺省值)
    pub fn snapshot_for(&self, product_id: Option<&str>) -> CatalogSnapshot {
        let product =
            product_id.and_then(|id| self.products.iter().find(|p| p.id == id).cloned());

        CatalogSnapshot {
            catalog: Catalog {
                product,
                classes: self
                    .classes
                    .iter()
                    .filter(|c| belongs_to(&c.product_id, product_id))
                    .cloned()
                    .collect(),
                regions: self.regions.clone(),
            },
            configuration_rules: self
                .configuration_rules
                .iter()
                .filter(|r| belongs_to(&r.product_id, product_id))
                .cloned()
                .collect(),
            dependency_rules: self
                .dependency_rules
                .iter()
                .filter(|r| belongs_to(&r.product_id, product_id))
                .cloned()
                .collect(),
        }
    }

    /// 按导入模式合并另一个数据包,返回追加/替换的记录数
    pub fn absorb(&mut self, incoming: CatalogBundle, mode: ImportMode) -> usize {
        match mode {
            ImportMode::Replace => {
                let count = incoming.record_count();
                *self = CatalogBundle {
                    version: self.version.clone(),
                    export_date: self.export_date,
                    ..incoming
                };
                count
            }
            ImportMode::Merge => {
                merge_by_id(&mut self.products, &incoming.products, |p| p.id.as_str())
                    + merge_by_id(&mut self.classes, &incoming.classes, |c| c.id.as_str())
                    + merge_by_id(&mut self.regions, &incoming.regions, |r| r.id.as_str())
                    + merge_by_id(
                        &mut self.configuration_rules,
                        &incoming.configuration_rules,
                        |r| r.id.as_str(),
                    )
                    + merge_by_id(&mut self.dependency_rules, &incoming.dependency_rules, |r| {
                        r.id.as_str()
                    })
            }
        }
    }

    pub fn record_count(&self) -> usize {
        self.products.len()
            + self.classes.len()
            + self.regions.len()
            + self.configuration_rules.len()
            + self.dependency_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ClassKind;

    fn class(id: &str, product: Option<&str>) -> FeatureClass {
        FeatureClass {
            id: id.to_string(),
            name: id.to_string(),
            color: None,
            kind: ClassKind::Independent,
            required: false,
            product_id: product.map(|p| p.to_string()),
            characteristics: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_filters_by_product() {
        let bundle = CatalogBundle {
            classes: vec![
                class("ENGINE", Some("P1")),
                class("PAINT", Some("P2")),
                class("SHARED", None),
            ],
            ..CatalogBundle::default()
        };

        let snapshot = bundle.snapshot_for(Some("P1"));
        let ids: Vec<&str> = snapshot.catalog.classes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ENGINE", "SHARED"]);
    }

    #[test]
    fn test_snapshot_without_product_id_has_no_product() {
        let product = |id: &str, volume: u64| Product {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            base_volume: Some(volume),
        };
        let bundle = CatalogBundle {
            products: vec![product("P1", 500), product("P2", 20_000)],
            classes: vec![class("ENGINE", Some("P1")), class("PAINT", Some("P2"))],
            ..CatalogBundle::default()
        };

        let snapshot = bundle.snapshot_for(None);
        assert!(snapshot.catalog.product.is_none());
        assert_eq!(snapshot.catalog.classes.len(), 2);

        let p2 = bundle.snapshot_for(Some("P2"));
        assert_eq!(p2.catalog.product.and_then(|p| p.base_volume), Some(20_000));
    }

    #[test]
    fn test_merge_keeps_existing_ids() {
        let mut bundle = CatalogBundle {
            classes: vec![class("ENGINE", None)],
            ..CatalogBundle::default()
        };
        let mut renamed = class("ENGINE", None);
        renamed.name = "Renamed".to_string();
        let incoming = CatalogBundle {
            classes: vec![renamed, class("WHEELS", None)],
            ..CatalogBundle::default()
        };

        let appended = bundle.absorb(incoming, ImportMode::Merge);
        assert_eq!(appended, 1);
        assert_eq!(bundle.classes.len(), 2);
        assert_eq!(bundle.classes[0].name, "ENGINE");
    }

    #[test]
    fn test_replace_overwrites_everything() {
        let mut bundle = CatalogBundle {
            classes: vec![class("ENGINE", None)],
            ..CatalogBundle::default()
        };
        let incoming = CatalogBundle {
            classes: vec![class("WHEELS", None)],
            ..CatalogBundle::default()
        };
        bundle.absorb(incoming, ImportMode::Replace);
        assert_eq!(bundle.classes.len(), 1);
        assert_eq!(bundle.classes[0].id, "WHEELS");
    }
}
