// ==========================================
// ConstraintEvaluator 集成测试
// ==========================================
// 测试目标: 演示目录上的配置校验、受限值、可选项
// ==========================================

mod test_helpers;

use vc_planner::domain::{
    Condition, ConditionLogic, ConditionOperator, ConfigurationRule, ResultOperator, RuleResult,
};
use vc_planner::engine::{ConstraintEvaluator, EngineError};
use test_helpers::{sample_snapshot, selection};

fn rule(id: &str, conditions: Vec<Condition>, results: Vec<RuleResult>) -> ConfigurationRule {
    ConfigurationRule {
        id: id.to_string(),
        name: id.to_string(),
        description: None,
        active: true,
        product_id: None,
        applicable_regions: vec!["EU".to_string()],
        conditions,
        results,
    }
}

fn condition(class_id: &str, value: &str, logic: ConditionLogic) -> Condition {
    Condition {
        id: None,
        class_id: class_id.to_string(),
        operator: ConditionOperator::Equals,
        values: vec![value.to_string()],
        logic,
    }
}

fn must_be(class_id: &str, value: &str) -> RuleResult {
    RuleResult {
        id: None,
        class_id: class_id.to_string(),
        operator: ResultOperator::MustBe,
        values: vec![value.to_string()],
    }
}

// ==========================================
// 校验
// ==========================================

#[test]
fn test_ev_with_manual_transmission_in_eu() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[("ENGINE", "ENG_EV"), ("TRANSMISSION", "TRN_M5")]);

    let result = ConstraintEvaluator::new()
        .evaluate(&cfg, "EU", &snapshot.configuration_rules)
        .unwrap();

    // PACKAGE 未选择,RULE_001 的第二条结果不报
    assert!(!result.valid);
    assert_eq!(result.violations.len(), 1);
    let v = &result.violations[0];
    assert_eq!(v.rule_id, "RULE_001");
    assert_eq!(v.class_id, "TRANSMISSION");
    assert_eq!(v.operator, ResultOperator::MustBe);
    assert_eq!(v.values, vec!["TRN_EV".to_string()]);
    assert_eq!(v.selected, "TRN_M5");
    assert!(v.message.contains("TRN_M5"));
}

#[test]
fn test_rule_outside_its_regions_is_ignored() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[("ENGINE", "ENG_EV"), ("TRANSMISSION", "TRN_M5")]);

    // RULE_001 不适用于 IN
    let result = ConstraintEvaluator::new()
        .evaluate(&cfg, "IN", &snapshot.configuration_rules)
        .unwrap();
    assert!(result.valid);
}

#[test]
fn test_empty_configuration_is_valid_everywhere() {
    let snapshot = sample_snapshot();
    let evaluator = ConstraintEvaluator::new();
    for region in ["EU", "UK", "US", "JP", "AU", "CN", "IN", "ALL", "XX"] {
        let result = evaluator
            .evaluate(&selection(&[]), region, &snapshot.configuration_rules)
            .unwrap();
        assert!(result.valid, "region {}", region);
    }
}

#[test]
fn test_unconditional_us_rule() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[("ENGINE", "ENG_2_0D"), ("STEERING", "STR_RHD")]);

    let result = ConstraintEvaluator::new()
        .evaluate(&cfg, "US", &snapshot.configuration_rules)
        .unwrap();

    assert_eq!(result.violations_of("RULE_004").count(), 2);
    assert_eq!(result.violations.len(), 2);

    let cannot = result
        .violations
        .iter()
        .find(|v| v.class_id == "ENGINE")
        .unwrap();
    assert_eq!(cannot.operator, ResultOperator::CannotBe);
}

#[test]
fn test_all_scope_applies_every_active_rule() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[("ENGINE", "ENG_HYB"), ("TRANSMISSION", "TRN_M6")]);

    let result = ConstraintEvaluator::new()
        .evaluate(&cfg, "ALL", &snapshot.configuration_rules)
        .unwrap();
    assert_eq!(result.violations_of("RULE_002").count(), 1);
}

#[test]
fn test_inactive_rule_never_fires() {
    let mut snapshot = sample_snapshot();
    for r in snapshot.configuration_rules.iter_mut() {
        r.active = false;
    }
    let cfg = selection(&[("ENGINE", "ENG_EV"), ("TRANSMISSION", "TRN_M5")]);
    let result = ConstraintEvaluator::new()
        .evaluate(&cfg, "EU", &snapshot.configuration_rules)
        .unwrap();
    assert!(result.valid);
}

#[test]
fn test_conditions_fold_left_to_right() {
    // (ENGINE=EV AND PACKAGE=SPORT) OR WHEELS=WHL_19
    let rules = vec![rule(
        "R_FOLD",
        vec![
            condition("ENGINE", "ENG_EV", ConditionLogic::And),
            condition("PACKAGE", "PKG_SPORT", ConditionLogic::And),
            condition("WHEELS", "WHL_19", ConditionLogic::Or),
        ],
        vec![must_be("DRIVETRAIN", "DRV_AWD")],
    )];
    let evaluator = ConstraintEvaluator::new();

    let only_last = selection(&[("WHEELS", "WHL_19"), ("DRIVETRAIN", "DRV_FWD")]);
    assert!(!evaluator.evaluate(&only_last, "EU", &rules).unwrap().valid);

    let only_first = selection(&[("ENGINE", "ENG_EV"), ("DRIVETRAIN", "DRV_FWD")]);
    assert!(evaluator.evaluate(&only_first, "EU", &rules).unwrap().valid);
}

#[test]
fn test_malformed_rule_fails_whole_call() {
    let snapshot = sample_snapshot();
    let mut rules = snapshot.configuration_rules.clone();
    rules.push(rule("R_BAD", Vec::new(), vec![RuleResult {
        id: None,
        class_id: "WHEELS".to_string(),
        operator: ResultOperator::MustBe,
        values: Vec::new(),
    }]));

    let err = ConstraintEvaluator::new()
        .evaluate(&selection(&[("ENGINE", "ENG_EV")]), "EU", &rules)
        .unwrap_err();
    assert!(matches!(err, EngineError::MalformedRule { ref rule_id, .. } if rule_id == "R_BAD"));
}

#[test]
fn test_evaluation_is_deterministic() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[
        ("ENGINE", "ENG_EV"),
        ("PACKAGE", "PKG_BASE"),
        ("TRANSMISSION", "TRN_A6"),
        ("WHEELS", "WHL_16"),
    ]);
    let evaluator = ConstraintEvaluator::new();
    let first = evaluator.evaluate(&cfg, "EU", &snapshot.configuration_rules).unwrap();
    let second = evaluator.evaluate(&cfg, "EU", &snapshot.configuration_rules).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.violations.len(), 2);
}

// ==========================================
// 受限值 / 可选项
// ==========================================

#[test]
fn test_restricted_transmissions_for_hybrid() {
    let snapshot = sample_snapshot();
    let cfg = selection(&[("ENGINE", "ENG_HYB")]);

    let restricted = ConstraintEvaluator::new()
        .restricted_values("TRANSMISSION", &cfg, "EU", &snapshot.configuration_rules)
        .unwrap();
    assert_eq!(
        restricted.into_iter().collect::<Vec<_>>(),
        vec!["TRN_M5".to_string(), "TRN_M6".to_string()]
    );

    // MUST_BE 不产生受限值
    let ev = selection(&[("ENGINE", "ENG_EV")]);
    let restricted = ConstraintEvaluator::new()
        .restricted_values("TRANSMISSION", &ev, "EU", &snapshot.configuration_rules)
        .unwrap();
    assert!(restricted.is_empty());
}

#[test]
fn test_restricted_values_agree_with_evaluate() {
    let snapshot = sample_snapshot();
    let evaluator = ConstraintEvaluator::new();
    let cfg = selection(&[("ENGINE", "ENG_HYB")]);

    for region in ["US", "EU", "ALL"] {
        for class_id in ["TRANSMISSION", "ENGINE"] {
            let restricted = evaluator
                .restricted_values(class_id, &cfg, region, &snapshot.configuration_rules)
                .unwrap();
            for value in restricted {
                let probe = cfg.clone().with(class_id, &value);
                let result = evaluator
                    .evaluate(&probe, region, &snapshot.configuration_rules)
                    .unwrap();
                assert!(
                    result
                        .violations
                        .iter()
                        .any(|v| v.class_id == class_id && v.selected == value),
                    "{} {} {}",
                    region,
                    class_id,
                    value
                );
            }
        }
    }
}

#[test]
fn test_available_engines_in_us() {
    let snapshot = sample_snapshot();
    let evaluator = ConstraintEvaluator::new();

    let available = evaluator
        .available_characteristics(
            "ENGINE",
            &selection(&[]),
            "US",
            &snapshot.configuration_rules,
            &snapshot.catalog,
        )
        .unwrap();
    let ids: Vec<&str> = available.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["ENG_1_5T", "ENG_2_0T", "ENG_HYB", "ENG_EV"]);

    let unknown = evaluator
        .available_characteristics(
            "NO_SUCH_CLASS",
            &selection(&[]),
            "US",
            &snapshot.configuration_rules,
            &snapshot.catalog,
        )
        .unwrap();
    assert!(unknown.is_empty());
}
