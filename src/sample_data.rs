// ==========================================
// 整车配置规划 - 演示目录数据
// ==========================================
// 内容: PROD_001 整车 / 7 个区域 / 6 个特征类别 /
//       5 条配置规则 / 11 条依赖规则
// 用途: CLI seed 命令与测试夹具
// ==========================================

use crate::domain::catalog::{Characteristic, FeatureClass, Product, Region};
use crate::domain::rule::{Condition, ConfigurationRule, DependencyRule, RuleResult};
use crate::domain::snapshot::CatalogBundle;
use crate::domain::types::{ClassKind, ConditionLogic, ConditionOperator, ResultOperator};
use std::collections::BTreeMap;

pub const SAMPLE_PRODUCT_ID: &str = "PROD_001";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn product() -> Product {
    Product {
        id: SAMPLE_PRODUCT_ID.to_string(),
        name: "Premium Vehicle Series 2025".to_string(),
        description: Some("Configurable vehicle platform with multiple options".to_string()),
        base_volume: Some(10_000),
    }
}

fn region(id: &str, name: &str, steering: &str, share: f64, excluded: &[(&str, &[&str])]) -> Region {
    Region {
        id: id.to_string(),
        name: name.to_string(),
        code: Some(id.to_string()),
        steering_value: steering.to_string(),
        volume_share: share,
        excluded_characteristics: excluded
            .iter()
            .map(|(class_id, values)| (class_id.to_string(), strings(values)))
            .collect(),
    }
}

fn regions() -> Vec<Region> {
    vec![
        region("EU", "European Union", "STR_LHD", 0.30, &[]),
        region("UK", "United Kingdom", "STR_RHD", 0.10, &[]),
        region("US", "United States", "STR_LHD", 0.25, &[("ENGINE", &["ENG_2_0D"])]),
        region("JP", "Japan", "STR_RHD", 0.10, &[]),
        region("AU", "Australia", "STR_RHD", 0.05, &[]),
        region("CN", "China", "STR_LHD", 0.15, &[("TRANSMISSION", &["TRN_M5", "TRN_M6"])]),
        region("IN", "India", "STR_LHD", 0.05, &[("ENGINE", &["ENG_EV"])]),
    ]
}

/// (id, name, code, baseProbability)
type CharacteristicRow<'a> = (&'a str, &'a str, &'a str, f64);

fn class(
    id: &str,
    name: &str,
    color: &str,
    kind: ClassKind,
    required: bool,
    rows: &[CharacteristicRow<'_>],
) -> FeatureClass {
    FeatureClass {
        id: id.to_string(),
        name: name.to_string(),
        color: Some(color.to_string()),
        kind,
        required,
        product_id: Some(SAMPLE_PRODUCT_ID.to_string()),
        characteristics: rows
            .iter()
            .map(|(ch_id, ch_name, code, p)| Characteristic {
                id: ch_id.to_string(),
                name: ch_name.to_string(),
                code: code.to_string(),
                active: true,
                base_probability: *p,
            })
            .collect(),
    }
}

fn classes() -> Vec<FeatureClass> {
    vec![
        class(
            "ENGINE",
            "Engine",
            "#3b82f6",
            ClassKind::Independent,
            true,
            &[
                ("ENG_1_5T", "1.5L Turbo", "ENG001", 0.25),
                ("ENG_2_0T", "2.0L Turbo", "ENG002", 0.30),
                ("ENG_2_0D", "2.0L Diesel", "ENG003", 0.15),
                ("ENG_HYB", "1.8L Hybrid", "ENG004", 0.20),
                ("ENG_EV", "Full Electric", "ENG005", 0.10),
            ],
        ),
        class(
            "PACKAGE",
            "Package",
            "#f59e0b",
            ClassKind::Independent,
            true,
            &[
                ("PKG_BASE", "Base", "PKG001", 0.20),
                ("PKG_COMFORT", "Comfort", "PKG002", 0.35),
                ("PKG_PREMIUM", "Premium", "PKG003", 0.30),
                ("PKG_SPORT", "Sport", "PKG004", 0.15),
            ],
        ),
        class(
            "TRANSMISSION",
            "Transmission",
            "#8b5cf6",
            ClassKind::Dependent,
            true,
            &[
                ("TRN_M5", "5-Speed Manual", "TRN001", 0.0),
                ("TRN_M6", "6-Speed Manual", "TRN002", 0.0),
                ("TRN_A6", "6-Speed Auto", "TRN003", 0.0),
                ("TRN_A8", "8-Speed Auto", "TRN004", 0.0),
                ("TRN_CVT", "CVT", "TRN005", 0.0),
                ("TRN_EV", "Single-Speed EV", "TRN006", 0.0),
            ],
        ),
        class(
            "WHEELS",
            "Wheels",
            "#ec4899",
            ClassKind::Dependent,
            false,
            &[
                ("WHL_16", "16\" Alloy", "WHL001", 0.0),
                ("WHL_17", "17\" Alloy", "WHL002", 0.0),
                ("WHL_18", "18\" Alloy", "WHL003", 0.0),
                ("WHL_19", "19\" Sport", "WHL004", 0.0),
            ],
        ),
        class(
            "DRIVETRAIN",
            "Drivetrain",
            "#06b6d4",
            ClassKind::Dependent,
            false,
            &[
                ("DRV_FWD", "Front Wheel Drive", "DRV001", 0.0),
                ("DRV_RWD", "Rear Wheel Drive", "DRV002", 0.0),
                ("DRV_AWD", "All Wheel Drive", "DRV003", 0.0),
            ],
        ),
        class(
            "STEERING",
            "Steering",
            "#10b981",
            ClassKind::Regional,
            true,
            &[
                ("STR_LHD", "Left Hand Drive", "STR001", 0.0),
                ("STR_RHD", "Right Hand Drive", "STR002", 0.0),
            ],
        ),
    ]
}

fn when(class_id: &str, values: &[&str]) -> Condition {
    Condition {
        id: Some("c1".to_string()),
        class_id: class_id.to_string(),
        operator: ConditionOperator::Equals,
        values: strings(values),
        logic: ConditionLogic::And,
    }
}

fn then(id: &str, class_id: &str, operator: ResultOperator, values: &[&str]) -> RuleResult {
    RuleResult {
        id: Some(id.to_string()),
        class_id: class_id.to_string(),
        operator,
        values: strings(values),
    }
}

fn configuration_rule(
    id: &str,
    name: &str,
    description: &str,
    regions: &[&str],
    conditions: Vec<Condition>,
    results: Vec<RuleResult>,
) -> ConfigurationRule {
    ConfigurationRule {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        active: true,
        product_id: Some(SAMPLE_PRODUCT_ID.to_string()),
        applicable_regions: strings(regions),
        conditions,
        results,
    }
}

fn configuration_rules() -> Vec<ConfigurationRule> {
    use ResultOperator::*;

    const ALL_BUT_IN: &[&str] = &["EU", "UK", "US", "JP", "AU", "CN"];
    const EVERY: &[&str] = &["EU", "UK", "US", "JP", "AU", "CN", "IN"];

    vec![
        configuration_rule(
            "RULE_001",
            "EV Powertrain Configuration",
            "Electric vehicles require specific transmission",
            ALL_BUT_IN,
            vec![when("ENGINE", &["ENG_EV"])],
            vec![
                then("r1", "TRANSMISSION", MustBe, &["TRN_EV"]),
                then("r2", "PACKAGE", MustBeOneOf, &["PKG_PREMIUM", "PKG_SPORT"]),
            ],
        ),
        configuration_rule(
            "RULE_002",
            "Hybrid Transmission Restriction",
            "Hybrid engines cannot use manual transmission",
            EVERY,
            vec![when("ENGINE", &["ENG_HYB"])],
            vec![then("r1", "TRANSMISSION", CannotBe, &["TRN_M5", "TRN_M6"])],
        ),
        configuration_rule(
            "RULE_003",
            "Sport Package Wheels",
            "Sport package requires large wheels",
            EVERY,
            vec![when("PACKAGE", &["PKG_SPORT"])],
            vec![then("r1", "WHEELS", MustBeOneOf, &["WHL_18", "WHL_19"])],
        ),
        configuration_rule(
            "RULE_004",
            "US Market - LHD Only",
            "US requires left hand drive",
            &["US"],
            Vec::new(),
            vec![
                then("r1", "STEERING", MustBe, &["STR_LHD"]),
                then("r2", "ENGINE", CannotBe, &["ENG_2_0D"]),
            ],
        ),
        configuration_rule(
            "RULE_005",
            "UK/JP/AU Market - RHD Only",
            "These markets require right hand drive",
            &["UK", "JP", "AU"],
            Vec::new(),
            vec![then("r1", "STEERING", MustBe, &["STR_RHD"])],
        ),
    ]
}

fn dependency_rule(
    id: &str,
    name: &str,
    source_class: &str,
    source_values: &[&str],
    target_class: &str,
    distribution: &[(&str, f64)],
) -> DependencyRule {
    DependencyRule {
        id: id.to_string(),
        name: name.to_string(),
        product_id: Some(SAMPLE_PRODUCT_ID.to_string()),
        source_class: source_class.to_string(),
        source_values: strings(source_values),
        target_class: target_class.to_string(),
        distribution: distribution
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn dependency_rules() -> Vec<DependencyRule> {
    vec![
        dependency_rule("DEP_001", "EV Transmission", "ENGINE", &["ENG_EV"], "TRANSMISSION", &[("TRN_EV", 1.0)]),
        dependency_rule(
            "DEP_002",
            "Hybrid Transmission",
            "ENGINE",
            &["ENG_HYB"],
            "TRANSMISSION",
            &[("TRN_CVT", 0.60), ("TRN_A6", 0.25), ("TRN_A8", 0.15)],
        ),
        dependency_rule(
            "DEP_003",
            "Petrol 1.5T Transmission",
            "ENGINE",
            &["ENG_1_5T"],
            "TRANSMISSION",
            &[("TRN_M5", 0.15), ("TRN_M6", 0.20), ("TRN_A6", 0.35), ("TRN_CVT", 0.30)],
        ),
        dependency_rule(
            "DEP_004",
            "Petrol 2.0T Transmission",
            "ENGINE",
            &["ENG_2_0T"],
            "TRANSMISSION",
            &[("TRN_M6", 0.25), ("TRN_A8", 0.55), ("TRN_A6", 0.20)],
        ),
        dependency_rule(
            "DEP_005",
            "Diesel Transmission",
            "ENGINE",
            &["ENG_2_0D"],
            "TRANSMISSION",
            &[("TRN_M6", 0.40), ("TRN_A6", 0.35), ("TRN_A8", 0.25)],
        ),
        dependency_rule(
            "DEP_006",
            "Base Package Wheels",
            "PACKAGE",
            &["PKG_BASE"],
            "WHEELS",
            &[("WHL_16", 0.70), ("WHL_17", 0.30)],
        ),
        dependency_rule(
            "DEP_007",
            "Comfort Package Wheels",
            "PACKAGE",
            &["PKG_COMFORT"],
            "WHEELS",
            &[("WHL_16", 0.20), ("WHL_17", 0.50), ("WHL_18", 0.30)],
        ),
        dependency_rule(
            "DEP_008",
            "Premium Package Wheels",
            "PACKAGE",
            &["PKG_PREMIUM"],
            "WHEELS",
            &[("WHL_17", 0.25), ("WHL_18", 0.50), ("WHL_19", 0.25)],
        ),
        dependency_rule(
            "DEP_009",
            "Sport Package Wheels",
            "PACKAGE",
            &["PKG_SPORT"],
            "WHEELS",
            &[("WHL_18", 0.40), ("WHL_19", 0.60)],
        ),
        dependency_rule(
            "DEP_010",
            "Standard Drivetrain",
            "PACKAGE",
            &["PKG_BASE", "PKG_COMFORT", "PKG_PREMIUM"],
            "DRIVETRAIN",
            &[("DRV_FWD", 0.55), ("DRV_AWD", 0.30), ("DRV_RWD", 0.15)],
        ),
        dependency_rule(
            "DEP_011",
            "Sport Package Drivetrain",
            "PACKAGE",
            &["PKG_SPORT"],
            "DRIVETRAIN",
            &[("DRV_RWD", 0.45), ("DRV_AWD", 0.55)],
        ),
    ]
}

/// 完整演示数据包
pub fn sample_bundle() -> CatalogBundle {
    CatalogBundle {
        products: vec![product()],
        classes: classes(),
        regions: regions(),
        configuration_rules: configuration_rules(),
        dependency_rules: dependency_rules(),
        ..CatalogBundle::default()
    }
}
