// ==========================================
// ProbabilityEngine 集成测试
// ==========================================
// 测试目标: 演示目录上的禁售重分配、依赖传播、方向盘、产量
// 输入: 各特征值 baseProbability (缺省输入)
// ==========================================

mod test_helpers;

use vc_planner::config::EngineConfig;
use vc_planner::domain::{CalculationStep, ClassProbabilities, DerivationResult, Product};
use vc_planner::engine::ProbabilityEngine;
use vc_planner::sample_data::sample_bundle;
use test_helpers::{assert_close, sample_snapshot};

fn derive(region: &str) -> DerivationResult {
    let snapshot = sample_snapshot();
    let inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    ProbabilityEngine::default()
        .derive_snapshot(&inputs, region, &snapshot)
        .unwrap()
}

fn class_sum(result: &DerivationResult, class_id: &str) -> f64 {
    result
        .distribution(class_id)
        .map(|m| m.values().sum())
        .unwrap_or(0.0)
}

// ==========================================
// 独立类
// ==========================================

#[test]
fn test_us_diesel_exclusion_redistributes() {
    let result = derive("US");

    assert_eq!(result.probability("ENGINE", "ENG_2_0D"), 0.0);
    assert_close(result.probability("ENGINE", "ENG_1_5T"), 0.25 / 0.85, "ENG_1_5T");
    assert_close(result.probability("ENGINE", "ENG_2_0T"), 0.30 / 0.85, "ENG_2_0T");
    assert_close(class_sum(&result, "ENGINE"), 1.0, "ENGINE sum");

    let exclusion = result
        .steps
        .iter()
        .find_map(|s| match s {
            CalculationStep::Exclusion {
                class_id,
                excluded_mass,
                redistributed,
                ..
            } if class_id == "ENGINE" => Some((*excluded_mass, *redistributed)),
            _ => None,
        })
        .unwrap();
    assert_close(exclusion.0, 0.15, "excluded mass");
    assert!(exclusion.1);
}

#[test]
fn test_india_excludes_ev_and_its_transmission() {
    let result = derive("IN");

    assert_eq!(result.probability("ENGINE", "ENG_EV"), 0.0);
    assert_close(result.probability("ENGINE", "ENG_1_5T"), 0.25 / 0.9, "ENG_1_5T");
    // DEP_001 源质量为 0,不贡献
    assert_eq!(result.probability("TRANSMISSION", "TRN_EV"), 0.0);
    assert!(!result.steps.iter().any(|s| matches!(
        s,
        CalculationStep::Dependency { rule_id, .. } if rule_id == "DEP_001"
    )));
}

#[test]
fn test_inputs_are_seeded_verbatim_without_region_exclusion() {
    let snapshot = sample_snapshot();
    let mut inputs = ClassProbabilities::new();
    inputs.insert(
        "ENGINE".to_string(),
        [("ENG_EV".to_string(), 0.5), ("ENG_HYB".to_string(), 0.2)]
            .into_iter()
            .collect(),
    );

    let result = ProbabilityEngine::default()
        .derive_snapshot(&inputs, "EU", &snapshot)
        .unwrap();
    // 输入合计 0.7 不归一
    assert_close(class_sum(&result, "ENGINE"), 0.7, "ENGINE sum");
    // 未提供的独立类为空分布
    assert!(result.independent["PACKAGE"].is_empty());
}

// ==========================================
// 依赖类
// ==========================================

#[test]
fn test_ev_contribution_to_transmission_in_eu() {
    let result = derive("EU");

    let contribution = result
        .steps
        .iter()
        .find_map(|s| match s {
            CalculationStep::Dependency {
                rule_id,
                contribution,
                ..
            } if rule_id == "DEP_001" => Some(*contribution),
            _ => None,
        })
        .unwrap();
    assert_close(contribution, 0.10, "DEP_001 contribution");
    assert_close(result.probability("TRANSMISSION", "TRN_EV"), 0.10, "TRN_EV");
}

#[test]
fn test_dependent_classes_sum_to_one() {
    for region in ["EU", "UK", "US", "JP", "AU", "CN", "IN", "ALL"] {
        let result = derive(region);
        for class_id in ["TRANSMISSION", "WHEELS", "DRIVETRAIN", "ENGINE", "PACKAGE"] {
            assert_close(class_sum(&result, class_id), 1.0, &format!("{} {}", region, class_id));
        }
    }
}

#[test]
fn test_eu_wheels_and_drivetrain() {
    let result = derive("EU");

    assert_close(result.probability("WHEELS", "WHL_16"), 0.21, "WHL_16");
    assert_close(result.probability("WHEELS", "WHL_17"), 0.31, "WHL_17");
    assert_close(result.probability("WHEELS", "WHL_18"), 0.315, "WHL_18");
    assert_close(result.probability("WHEELS", "WHL_19"), 0.165, "WHL_19");

    // DEP_010 与 DEP_011 贡献累加
    assert_close(result.probability("DRIVETRAIN", "DRV_FWD"), 0.4675, "DRV_FWD");
    assert_close(result.probability("DRIVETRAIN", "DRV_AWD"), 0.3375, "DRV_AWD");
    assert_close(result.probability("DRIVETRAIN", "DRV_RWD"), 0.195, "DRV_RWD");
}

#[test]
fn test_china_manual_transmission_exclusion() {
    let result = derive("CN");

    assert_eq!(result.probability("TRANSMISSION", "TRN_M5"), 0.0);
    assert_eq!(result.probability("TRANSMISSION", "TRN_M6"), 0.0);
    // 禁售质量 0.0375 + 0.185,剩余 0.7775 归一
    assert_close(result.probability("TRANSMISSION", "TRN_EV"), 0.10 / 0.7775, "TRN_EV");

    let excluded_mass = result
        .steps
        .iter()
        .find_map(|s| match s {
            CalculationStep::DependentExclusion { excluded_mass, .. } => Some(*excluded_mass),
            _ => None,
        })
        .unwrap();
    assert_close(excluded_mass, 0.2225, "excluded mass");
}

#[test]
fn test_region_excluding_whole_dependent_class_leaves_zeros() {
    let mut snapshot = sample_snapshot();
    let transmissions: Vec<String> = snapshot
        .catalog
        .class("TRANSMISSION")
        .unwrap()
        .characteristics
        .iter()
        .map(|c| c.id.clone())
        .collect();
    let cn = snapshot
        .catalog
        .regions
        .iter_mut()
        .find(|r| r.id == "CN")
        .unwrap();
    cn.excluded_characteristics
        .insert("TRANSMISSION".to_string(), transmissions);

    let inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    let result = ProbabilityEngine::default()
        .derive_snapshot(&inputs, "CN", &snapshot)
        .unwrap();

    let probs = result.distribution("TRANSMISSION").unwrap();
    assert!(probs.values().all(|p| *p == 0.0));
    assert!(result.volumes["TRANSMISSION"].values().all(|v| *v == 0));

    let excluded_mass = result
        .steps
        .iter()
        .find_map(|s| match s {
            CalculationStep::DependentExclusion { excluded_mass, .. } => Some(*excluded_mass),
            _ => None,
        })
        .unwrap();
    assert_close(excluded_mass, 1.0, "excluded mass");
    assert!(!result.steps.iter().any(|s| matches!(
        s,
        CalculationStep::Normalization { class_id, .. } if class_id == "TRANSMISSION"
    )));
}

#[test]
fn test_empty_dependent_class_records_no_exclusion_step() {
    let mut snapshot = sample_snapshot();
    snapshot.dependency_rules.clear();

    let inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    let result = ProbabilityEngine::default()
        .derive_snapshot(&inputs, "CN", &snapshot)
        .unwrap();

    assert_eq!(class_sum(&result, "TRANSMISSION"), 0.0);
    assert!(!result
        .steps
        .iter()
        .any(|s| matches!(s, CalculationStep::DependentExclusion { .. })));
}

// ==========================================
// 区域类
// ==========================================

#[test]
fn test_all_scope_weights_steering_by_volume_share() {
    let result = derive("ALL");
    assert_close(result.probability("STEERING", "STR_LHD"), 0.75, "STR_LHD");
    assert_close(result.probability("STEERING", "STR_RHD"), 0.25, "STR_RHD");
}

#[test]
fn test_single_region_fixes_steering() {
    let uk = derive("UK");
    assert_eq!(uk.probability("STEERING", "STR_RHD"), 1.0);
    assert_eq!(uk.probability("STEERING", "STR_LHD"), 0.0);
    assert_eq!(uk.volume("STEERING", "STR_RHD"), 10_000);
}

#[test]
fn test_unknown_region_skips_region_steps() {
    let result = derive("XX");

    assert_close(result.probability("ENGINE", "ENG_2_0D"), 0.15, "ENG_2_0D");
    assert_eq!(class_sum(&result, "STEERING"), 0.0);
    assert!(!result.steps.iter().any(|s| matches!(
        s,
        CalculationStep::Exclusion { .. }
            | CalculationStep::DependentExclusion { .. }
            | CalculationStep::Regional { .. }
    )));
}

// ==========================================
// 产量
// ==========================================

#[test]
fn test_volumes_follow_base_volume() {
    let result = derive("EU");

    assert_eq!(result.base_volume, 10_000);
    assert_eq!(result.volume("ENGINE", "ENG_2_0T"), 3_000);
    assert_eq!(result.volume("TRANSMISSION", "TRN_EV"), 1_000);
    assert_eq!(result.volume("WHEELS", "WHL_18"), 3_150);
    assert_eq!(result.volume("STEERING", "STR_LHD"), 10_000);

    let eu = result.by_region.iter().find(|r| r.region_id == "EU").unwrap();
    assert_eq!(eu.volume, 3_000);
}

#[test]
fn test_default_base_volume_when_product_has_none() {
    let mut snapshot = sample_snapshot();
    if let Some(product) = snapshot.catalog.product.as_mut() {
        product.base_volume = None;
    }
    let inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    let engine = ProbabilityEngine::new(EngineConfig {
        default_base_volume: 2_000,
        ..EngineConfig::default()
    });

    let result = engine.derive_snapshot(&inputs, "EU", &snapshot).unwrap();
    assert_eq!(result.base_volume, 2_000);
    assert_eq!(result.volume("ENGINE", "ENG_EV"), 200);
}

#[test]
fn test_no_product_selected_uses_default_base_volume() {
    let mut bundle = sample_bundle();
    bundle.products[0].base_volume = Some(500);
    bundle.products.push(Product {
        id: "PROD_002".to_string(),
        name: "Estate".to_string(),
        description: None,
        base_volume: Some(20_000),
    });

    let snapshot = bundle.snapshot_for(None);
    let inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    let result = ProbabilityEngine::default()
        .derive_snapshot(&inputs, "UK", &snapshot)
        .unwrap();

    assert_eq!(result.base_volume, 10_000);
    assert_eq!(result.volume("STEERING", "STR_RHD"), 10_000);
}

#[test]
fn test_input_check_flags_bad_sums() {
    let snapshot = sample_snapshot();
    let mut inputs = ProbabilityEngine::default_inputs(&snapshot.catalog);
    inputs.get_mut("PACKAGE").unwrap().insert("PKG_SPORT".to_string(), 0.5);

    let checks = ProbabilityEngine::default().check_inputs(&inputs);
    assert!(checks["ENGINE"].valid);
    assert!(!checks["PACKAGE"].valid);
    assert_close(checks["PACKAGE"].sum, 1.35, "PACKAGE sum");
}
