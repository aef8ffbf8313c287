// ==========================================
// API 层集成测试
// ==========================================
// 测试目标: AppState 装配后的校验、推导、规则维护、版本恢复
// 数据: 演示目录 (PROD_001)
// ==========================================

mod test_helpers;

use std::collections::BTreeMap;

use vc_planner::api::ApiError;
use vc_planner::domain::{
    ClassProbabilities, Condition, ConditionLogic, ConditionOperator, ConfigurationRule,
    DependencyRule, ResultOperator, RuleResult, WarningKind,
};
use vc_planner::repository::DependencyRuleFilter;
use vc_planner::sample_data::SAMPLE_PRODUCT_ID;
use test_helpers::{assert_close, seeded_state, selection};

const PRODUCT: Option<&str> = Some(SAMPLE_PRODUCT_ID);

// ==========================================
// 配置校验
// ==========================================

#[test]
fn test_empty_configuration_reports_required_classes() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let result = state
        .configuration_api
        .evaluate_configuration(PRODUCT, &selection(&[]), "EU")
        .unwrap();

    assert!(result.valid);
    let missing: Vec<&str> = result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::RequiredClassMissing)
        .map(|w| w.class_id.as_str())
        .collect();
    assert_eq!(missing.len(), 4);
    for class_id in ["ENGINE", "PACKAGE", "TRANSMISSION", "STEERING"] {
        assert!(missing.contains(&class_id), "missing {}", class_id);
    }
}

#[test]
fn test_unknown_selection_is_warning_not_violation() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let cfg = selection(&[("ENGINE", "ENG_V12")]);
    let result = state
        .configuration_api
        .evaluate_configuration(PRODUCT, &cfg, "EU")
        .unwrap();

    assert!(result.valid);
    assert!(result.warnings.iter().any(|w| {
        w.kind == WarningKind::UnknownCharacteristic
            && w.characteristic_id.as_deref() == Some("ENG_V12")
    }));
}

#[test]
fn test_evaluate_through_api_matches_engine() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let cfg = selection(&[("ENGINE", "ENG_EV"), ("TRANSMISSION", "TRN_M5")]);
    let result = state
        .configuration_api
        .evaluate_configuration(PRODUCT, &cfg, "EU")
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.violations_of("RULE_001").count(), 1);

    let restricted = state
        .configuration_api
        .restricted_values(PRODUCT, "TRANSMISSION", &selection(&[("ENGINE", "ENG_HYB")]), "EU")
        .unwrap();
    assert!(restricted.contains("TRN_M5"));

    let err = state
        .configuration_api
        .evaluate_configuration(PRODUCT, &cfg, "  ")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 概率推导
// ==========================================

#[test]
fn test_derive_rejects_out_of_range_inputs() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let mut inputs = ClassProbabilities::new();
    inputs.insert(
        "ENGINE".to_string(),
        BTreeMap::from([("ENG_EV".to_string(), 1.5)]),
    );
    let err = state
        .probability_api
        .derive_probabilities(PRODUCT, &inputs, "EU")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let defaults = state.probability_api.default_inputs(PRODUCT).unwrap();
    let err = state
        .probability_api
        .derive_probabilities(PRODUCT, &defaults, "")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_derive_with_default_inputs() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let inputs = state.probability_api.default_inputs(PRODUCT).unwrap();
    assert_eq!(inputs.len(), 2);

    let result = state
        .probability_api
        .derive_probabilities(PRODUCT, &inputs, "EU")
        .unwrap();
    assert_close(result.probability("TRANSMISSION", "TRN_EV"), 0.10, "TRN_EV");
    assert_eq!(result.volume("STEERING", "STR_LHD"), 10_000);
}

#[test]
fn test_normalize_scales_to_one() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let probs = BTreeMap::from([("PKG_BASE".to_string(), 0.2), ("PKG_SPORT".to_string(), 0.6)]);
    let normalized = state.probability_api.normalize("PACKAGE", &probs).unwrap();
    assert_close(normalized["PKG_BASE"], 0.25, "PKG_BASE");
    assert_close(normalized["PKG_SPORT"], 0.75, "PKG_SPORT");
}

// ==========================================
// 规则维护
// ==========================================

#[test]
fn test_create_rule_assigns_id_and_rejects_malformed() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let rule = ConfigurationRule {
        id: String::new(),
        name: "Sport needs 19 inch".to_string(),
        description: None,
        active: true,
        product_id: Some(SAMPLE_PRODUCT_ID.to_string()),
        applicable_regions: vec!["JP".to_string()],
        conditions: vec![Condition {
            id: None,
            class_id: "PACKAGE".to_string(),
            operator: ConditionOperator::Equals,
            values: vec!["PKG_SPORT".to_string()],
            logic: ConditionLogic::And,
        }],
        results: vec![RuleResult {
            id: None,
            class_id: "WHEELS".to_string(),
            operator: ResultOperator::MustBe,
            values: vec!["WHL_19".to_string()],
        }],
    };

    let created = state.configuration_api.create_rule(rule.clone()).unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(state.configuration_api.get_rule(&created.id).unwrap(), created);

    let cfg = selection(&[("PACKAGE", "PKG_SPORT"), ("WHEELS", "WHL_17")]);
    let result = state
        .configuration_api
        .evaluate_configuration(PRODUCT, &cfg, "JP")
        .unwrap();
    assert_eq!(result.violations_of(&created.id).count(), 1);

    let mut malformed = rule;
    malformed.id = "R_EMPTY".to_string();
    malformed.results[0].values.clear();
    let err = state.configuration_api.create_rule(malformed).unwrap_err();
    assert!(matches!(err, ApiError::MalformedRule(_)));
    assert!(matches!(
        state.configuration_api.get_rule("R_EMPTY"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_dependency_rule_lifecycle() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let mut rule = DependencyRule {
        id: String::new(),
        name: "Sport AWD".to_string(),
        product_id: Some(SAMPLE_PRODUCT_ID.to_string()),
        source_class: "PACKAGE".to_string(),
        source_values: vec!["PKG_SPORT".to_string()],
        target_class: "DRIVETRAIN".to_string(),
        distribution: BTreeMap::new(),
    };

    let err = state
        .probability_api
        .create_dependency_rule(rule.clone())
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedRule(_)));

    rule.distribution.insert("DRV_AWD".to_string(), 1.0);
    let created = state.probability_api.create_dependency_rule(rule).unwrap();

    let filter = DependencyRuleFilter {
        target_class: Some("DRIVETRAIN".to_string()),
        ..Default::default()
    };
    let rules = state.probability_api.list_dependency_rules(&filter).unwrap();
    // 新规则追加在应用顺序末尾
    assert_eq!(rules.last().map(|r| r.id.as_str()), Some(created.id.as_str()));

    state.probability_api.delete_dependency_rule(&created.id).unwrap();
    assert!(matches!(
        state.probability_api.delete_dependency_rule(&created.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_scenarios_round_trip_through_api() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let inputs = state.probability_api.default_inputs(PRODUCT).unwrap();
    let saved = state
        .probability_api
        .save_scenario("Baseline", PRODUCT, "EU", &inputs)
        .unwrap();

    let listed = state.probability_api.list_scenarios().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, saved.id);
    assert_eq!(listed[0].input_probabilities, inputs);

    let err = state
        .probability_api
        .save_scenario(" ", PRODUCT, "EU", &inputs)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 版本快照
// ==========================================

#[test]
fn test_restore_version_brings_back_deleted_class() {
    let (_temp_file, state) = seeded_state().expect("Failed to seed state");

    let version = state
        .catalog_api
        .create_version(Some("Before cleanup"), None, Some("tester"))
        .unwrap();
    assert_eq!(version.created_by, "tester");

    state.catalog_api.delete_class("WHEELS").unwrap();
    let classes = state.catalog_api.list_classes(PRODUCT).unwrap();
    assert!(!classes.iter().any(|c| c.id == "WHEELS"));

    let summary = state.catalog_api.restore_version(&version.id).unwrap();
    assert_eq!(summary.version_id, version.id);
    assert_eq!(summary.records, 30);

    let classes = state.catalog_api.list_classes(PRODUCT).unwrap();
    let wheels = classes.iter().find(|c| c.id == "WHEELS").unwrap();
    assert_eq!(wheels.characteristics.len(), 4);

    // 版本记录本身不受恢复影响
    assert_eq!(state.catalog_api.list_versions().unwrap().len(), 1);

    assert!(matches!(
        state.catalog_api.restore_version("missing"),
        Err(ApiError::NotFound(_))
    ));
}
