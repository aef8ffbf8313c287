// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 目录/规则/版本/场景的持久化与快照读取
// ==========================================

mod test_helpers;

use std::collections::BTreeMap;

use vc_planner::domain::{Characteristic, ClassProbabilities, ImportMode};
use vc_planner::logging;
use vc_planner::repository::{
    CatalogBundleRepository, CatalogVersionRepository, ConfigurationRuleFilter,
    ConfigurationRuleRepository, DependencyRuleFilter, DependencyRuleRepository,
    FeatureClassRepository, ProbabilityScenarioRepository, RepositoryError, SnapshotProvider,
    SqliteSnapshotProvider,
};
use vc_planner::sample_data::{sample_bundle, SAMPLE_PRODUCT_ID};
use test_helpers::{create_test_db, sample_snapshot, shared_connection};

#[test]
fn test_bundle_replace_then_snapshot_matches_memory() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).unwrap();

    let bundle_repo = CatalogBundleRepository::from_connection(conn.clone());
    let written = bundle_repo.store(sample_bundle(), ImportMode::Replace).unwrap();
    assert_eq!(written, 1 + 6 + 7 + 5 + 11);

    let provider = SqliteSnapshotProvider::from_connection(conn);
    let snapshot = provider.load_snapshot(Some(SAMPLE_PRODUCT_ID)).unwrap();
    let expected = sample_snapshot();

    assert_eq!(snapshot.catalog, expected.catalog);
    assert_eq!(snapshot.configuration_rules, expected.configuration_rules);
    // 依赖规则保持插入顺序
    let ids: Vec<&str> = snapshot.dependency_rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.first(), Some(&"DEP_001"));
    assert_eq!(ids.last(), Some(&"DEP_011"));
    assert_eq!(snapshot.dependency_rules, expected.dependency_rules);
}

#[test]
fn test_bundle_merge_appends_only_new_ids() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).unwrap();
    let bundle_repo = CatalogBundleRepository::from_connection(conn);

    bundle_repo.store(sample_bundle(), ImportMode::Replace).unwrap();

    let mut incoming = sample_bundle();
    incoming.regions[0].name = "Renamed".to_string();
    incoming.regions.push(vc_planner::domain::Region {
        id: "BR".to_string(),
        name: "Brazil".to_string(),
        code: Some("BR".to_string()),
        steering_value: "STR_LHD".to_string(),
        volume_share: 0.0,
        excluded_characteristics: BTreeMap::new(),
    });

    let appended = bundle_repo.store(incoming, ImportMode::Merge).unwrap();
    assert_eq!(appended, 1);

    let bundle = bundle_repo.load().unwrap();
    assert_eq!(bundle.regions.len(), 8);
    assert_eq!(bundle.regions[0].name, "European Union");
}

#[test]
fn test_rule_filters_and_duplicate() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).unwrap();
    CatalogBundleRepository::from_connection(conn.clone())
        .store(sample_bundle(), ImportMode::Replace)
        .unwrap();

    let rules = ConfigurationRuleRepository::from_connection(conn.clone());
    let us_rules = rules
        .list(&ConfigurationRuleFilter {
            region_id: Some("US".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(
        us_rules.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["RULE_001", "RULE_002", "RULE_003", "RULE_004"]
    );

    let copy = rules.duplicate("RULE_002").unwrap();
    assert_ne!(copy.id, "RULE_002");
    assert_eq!(copy.name, "Hybrid Transmission Restriction (Copy)");
    assert_ne!(copy.results[0].id.as_deref(), Some("r1"));
    assert_eq!(rules.list(&ConfigurationRuleFilter::default()).unwrap().len(), 6);

    assert!(matches!(
        rules.duplicate("RULE_404"),
        Err(RepositoryError::NotFound { .. })
    ));

    let deps = DependencyRuleRepository::from_connection(conn);
    let to_wheels = deps
        .list(&DependencyRuleFilter {
            target_class: Some("WHEELS".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(to_wheels.len(), 4);
}

#[test]
fn test_class_delete_cascades_characteristics() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).unwrap();
    CatalogBundleRepository::from_connection(conn.clone())
        .store(sample_bundle(), ImportMode::Replace)
        .unwrap();

    let classes = FeatureClassRepository::from_connection(conn.clone());
    classes
        .upsert_characteristic(
            "WHEELS",
            &Characteristic {
                id: "WHL_20".to_string(),
                name: "20\" Forged".to_string(),
                code: "WHL005".to_string(),
                active: false,
                base_probability: 0.0,
            },
        )
        .unwrap();
    let wheels = classes.find_by_id("WHEELS").unwrap().unwrap();
    assert_eq!(wheels.characteristics.len(), 5);
    assert!(!wheels.has_active_characteristic("WHL_20"));

    classes.delete("WHEELS").unwrap();
    assert!(classes.find_by_id("WHEELS").unwrap().is_none());

    let orphans: i64 = conn
        .lock()
        .unwrap()
        .query_row(
            "SELECT COUNT(*) FROM characteristic WHERE class_id = 'WHEELS'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn test_versions_and_scenarios() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).unwrap();

    let versions = CatalogVersionRepository::from_connection(conn.clone());
    let first = versions
        .create(None, None, None, &sample_bundle(), None)
        .unwrap();
    assert_eq!(first.name, "Version 1");
    assert_eq!(first.created_by, "system");

    let record = versions.find_record(&first.id).unwrap().unwrap();
    assert_eq!(record.bundle.record_count(), sample_bundle().record_count());
    assert!(versions.find_record("missing").unwrap().is_none());

    let scenarios = ProbabilityScenarioRepository::from_connection(conn);
    let mut inputs = ClassProbabilities::new();
    inputs.insert(
        "ENGINE".to_string(),
        BTreeMap::from([("ENG_EV".to_string(), 1.0)]),
    );
    let saved = scenarios.save("EV only", Some(SAMPLE_PRODUCT_ID), "EU", &inputs).unwrap();
    let listed = scenarios.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].input_probabilities, inputs);

    scenarios.delete(&saved.id).unwrap();
    assert!(matches!(
        scenarios.delete(&saved.id),
        Err(RepositoryError::NotFound { .. })
    ));
}
