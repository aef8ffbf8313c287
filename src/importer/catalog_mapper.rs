// ==========================================
// 整车配置规划 - 表格 ↔ 目录映射
// ==========================================
// 表: Products / Classes / Characteristics / Regions /
//     ConfigurationRules / DependencyRules
// 列表列 (regions, sourceValues) 以逗号分隔;
// conditions / results / distribution / excludeCharacteristics 为 JSON 文本
// ==========================================

use crate::domain::catalog::{Characteristic, FeatureClass, Product, Region};
use crate::domain::rule::{ConfigurationRule, DependencyRule};
use crate::domain::snapshot::CatalogBundle;
use crate::domain::types::ClassKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, SheetRows};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub mod sheets {
    pub const PRODUCTS: &str = "Products";
    pub const CLASSES: &str = "Classes";
    pub const CHARACTERISTICS: &str = "Characteristics";
    pub const REGIONS: &str = "Regions";
    pub const CONFIGURATION_RULES: &str = "ConfigurationRules";
    pub const DEPENDENCY_RULES: &str = "DependencyRules";
}

const PRODUCT_HEADERS: &[&str] = &["id", "name", "description", "baseVolume"];
const CLASS_HEADERS: &[&str] = &["id", "name", "color", "type", "required", "productId"];
const CHARACTERISTIC_HEADERS: &[&str] = &["id", "name", "code", "classId", "baseProbability", "active"];
const REGION_HEADERS: &[&str] = &["id", "name", "code", "steering", "volumeShare", "excludeCharacteristics"];
const CONFIGURATION_RULE_HEADERS: &[&str] = &[
    "id", "name", "description", "active", "productId", "regions", "conditions", "results",
];
const DEPENDENCY_RULE_HEADERS: &[&str] = &[
    "id", "name", "productId", "sourceClass", "sourceValues", "targetClass", "distribution",
];

/// 导出用的表: 表名 + 表头 + 行
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

// ==========================================
// 单行读取
// ==========================================
struct RowReader<'a> {
    sheet: &'a str,
    row: &'a RawRow,
    /// 1-based 数据行号 (不含表头)
    row_number: usize,
}

impl<'a> RowReader<'a> {
    fn optional(&self, key: &str) -> Option<String> {
        self.row
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, key: &str) -> ImportResult<String> {
        self.optional(key).ok_or_else(|| ImportError::FieldMappingError {
            sheet: self.sheet.to_string(),
            row: self.row_number,
            message: format!("缺少必填列 {}", key),
        })
    }

    fn conversion_error(&self, key: &str, message: String) -> ImportError {
        ImportError::TypeConversionError {
            sheet: self.sheet.to_string(),
            row: self.row_number,
            field: key.to_string(),
            message,
        }
    }

    fn f64_or(&self, key: &str, default: f64) -> ImportResult<f64> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => v
                .parse::<f64>()
                .map_err(|_| self.conversion_error(key, format!("无法解析为浮点数: {}", v))),
        }
    }

    fn u64_opt(&self, key: &str) -> ImportResult<Option<u64>> {
        match self.optional(key) {
            None => Ok(None),
            Some(v) => {
                let parsed = v
                    .parse::<f64>()
                    .map_err(|_| self.conversion_error(key, format!("无法解析为数值: {}", v)))?;
                if parsed < 0.0 || !parsed.is_finite() {
                    return Err(self.conversion_error(key, format!("不能为负数: {}", v)));
                }
                Ok(Some(parsed.round() as u64))
            }
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> ImportResult<bool> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Ok(true),
                "false" | "0" | "no" | "n" => Ok(false),
                _ => Err(self.conversion_error(key, format!("无法解析为布尔值: {}", v))),
            },
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.optional(key)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> ImportResult<T> {
        match self.optional(key) {
            None => Ok(T::default()),
            Some(v) => serde_json::from_str(&v)
                .map_err(|e| self.conversion_error(key, format!("JSON 格式错误: {}", e))),
        }
    }
}

fn rows_of<'a>(sheets: &'a SheetRows, name: &'a str) -> impl Iterator<Item = RowReader<'a>> + 'a {
    sheets
        .get(name)
        .into_iter()
        .flatten()
        .enumerate()
        .map(move |(idx, row)| RowReader {
            sheet: name,
            row,
            row_number: idx + 1,
        })
}

// ==========================================
// CatalogMapper
// ==========================================
pub struct CatalogMapper;

impl CatalogMapper {
    /// 表格 → 数据包
    ///
    /// 缺失的表视为空;特征值按 classId 挂到类别下,未知 classId 报错
    pub fn map_sheets(&self, sheets: &SheetRows) -> ImportResult<CatalogBundle> {
        let mut bundle = CatalogBundle::default();

        for r in rows_of(sheets, sheets::PRODUCTS) {
            bundle.products.push(Product {
                id: r.required("id")?,
                name: r.required("name")?,
                description: r.optional("description"),
                base_volume: r.u64_opt("baseVolume")?,
            });
        }

        for r in rows_of(sheets, sheets::CLASSES) {
            let kind_raw = r.required("type")?;
            let kind = kind_raw
                .parse::<ClassKind>()
                .map_err(|e| r.conversion_error("type", e))?;
            bundle.classes.push(FeatureClass {
                id: r.required("id")?,
                name: r.required("name")?,
                color: r.optional("color"),
                kind,
                required: r.bool_or("required", false)?,
                product_id: r.optional("productId"),
                characteristics: Vec::new(),
            });
        }

        for r in rows_of(sheets, sheets::CHARACTERISTICS) {
            let class_id = r.required("classId")?;
            let characteristic = Characteristic {
                id: r.required("id")?,
                name: r.required("name")?,
                code: r.optional("code").unwrap_or_default(),
                active: r.bool_or("active", true)?,
                base_probability: r.f64_or("baseProbability", 0.0)?,
            };
            let cls = bundle
                .classes
                .iter_mut()
                .find(|c| c.id == class_id)
                .ok_or_else(|| ImportError::FieldMappingError {
                    sheet: r.sheet.to_string(),
                    row: r.row_number,
                    message: format!("classId {} 在 Classes 表中不存在", class_id),
                })?;
            cls.characteristics.push(characteristic);
        }

        for r in rows_of(sheets, sheets::REGIONS) {
            bundle.regions.push(Region {
                id: r.required("id")?,
                name: r.required("name")?,
                code: r.optional("code"),
                steering_value: r
                    .optional("steering")
                    .or_else(|| r.optional("steeringValue"))
                    .unwrap_or_default(),
                volume_share: r.f64_or("volumeShare", 0.0)?,
                excluded_characteristics: r.json_or_default::<BTreeMap<String, Vec<String>>>(
                    "excludeCharacteristics",
                )?,
            });
        }

        for r in rows_of(sheets, sheets::CONFIGURATION_RULES) {
            bundle.configuration_rules.push(ConfigurationRule {
                id: r.required("id")?,
                name: r.required("name")?,
                description: r.optional("description"),
                active: r.bool_or("active", true)?,
                product_id: r.optional("productId"),
                applicable_regions: r.list("regions"),
                conditions: r.json_or_default("conditions")?,
                results: r.json_or_default("results")?,
            });
        }

        for r in rows_of(sheets, sheets::DEPENDENCY_RULES) {
            bundle.dependency_rules.push(DependencyRule {
                id: r.required("id")?,
                name: r.required("name")?,
                product_id: r.optional("productId"),
                source_class: r.required("sourceClass")?,
                source_values: r.list("sourceValues"),
                target_class: r.required("targetClass")?,
                distribution: r.json_or_default("distribution")?,
            });
        }

        Ok(bundle)
    }

    /// 数据包 → 表格 (与导入列布局一致,可回导)
    pub fn to_tables(&self, bundle: &CatalogBundle) -> ImportResult<Vec<SheetTable>> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();

        let products = bundle
            .products
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.name.clone(),
                    opt(&p.description),
                    p.base_volume.map(|v| v.to_string()).unwrap_or_default(),
                ]
            })
            .collect();

        let classes = bundle
            .classes
            .iter()
            .map(|c| {
                vec![
                    c.id.clone(),
                    c.name.clone(),
                    opt(&c.color),
                    c.kind.as_str().to_string(),
                    c.required.to_string(),
                    opt(&c.product_id),
                ]
            })
            .collect();

        let characteristics = bundle
            .classes
            .iter()
            .flat_map(|c| {
                c.characteristics.iter().map(move |ch| {
                    vec![
                        ch.id.clone(),
                        ch.name.clone(),
                        ch.code.clone(),
                        c.id.clone(),
                        ch.base_probability.to_string(),
                        ch.active.to_string(),
                    ]
                })
            })
            .collect();

        let mut regions = Vec::with_capacity(bundle.regions.len());
        for r in &bundle.regions {
            regions.push(vec![
                r.id.clone(),
                r.name.clone(),
                opt(&r.code),
                r.steering_value.clone(),
                r.volume_share.to_string(),
                serde_json::to_string(&r.excluded_characteristics)?,
            ]);
        }

        let mut configuration_rules = Vec::with_capacity(bundle.configuration_rules.len());
        for rule in &bundle.configuration_rules {
            configuration_rules.push(vec![
                rule.id.clone(),
                rule.name.clone(),
                opt(&rule.description),
                rule.active.to_string(),
                opt(&rule.product_id),
                rule.applicable_regions.join(","),
                serde_json::to_string(&rule.conditions)?,
                serde_json::to_string(&rule.results)?,
            ]);
        }

        let mut dependency_rules = Vec::with_capacity(bundle.dependency_rules.len());
        for rule in &bundle.dependency_rules {
            dependency_rules.push(vec![
                rule.id.clone(),
                rule.name.clone(),
                opt(&rule.product_id),
                rule.source_class.clone(),
                rule.source_values.join(","),
                rule.target_class.clone(),
                serde_json::to_string(&rule.distribution)?,
            ]);
        }

        Ok(vec![
            SheetTable { name: sheets::PRODUCTS, headers: PRODUCT_HEADERS, rows: products },
            SheetTable { name: sheets::CLASSES, headers: CLASS_HEADERS, rows: classes },
            SheetTable {
                name: sheets::CHARACTERISTICS,
                headers: CHARACTERISTIC_HEADERS,
                rows: characteristics,
            },
            SheetTable { name: sheets::REGIONS, headers: REGION_HEADERS, rows: regions },
            SheetTable {
                name: sheets::CONFIGURATION_RULES,
                headers: CONFIGURATION_RULE_HEADERS,
                rows: configuration_rules,
            },
            SheetTable {
                name: sheets::DEPENDENCY_RULES,
                headers: DEPENDENCY_RULE_HEADERS,
                rows: dependency_rules,
            },
        ])
    }
}
