// ==========================================
// 整车配置规划 - 概率传播引擎
// ==========================================
// 职责: 由独立类输入概率推导依赖类/区域类分布,并投影产量
// 输入: 独立类概率 + 区域 + 目录 + 依赖规则集
// 输出: independent / dependent / regional / volumes / steps
// 顺序: 1.播种 → 2.独立类禁售重分配 → 3.区域类 → 4.依赖传播
//       → 5.依赖类禁售 → 6.最终归一 → 7.产量投影
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::config::EngineConfig;
use crate::domain::catalog::{Catalog, FeatureClass, Region};
use crate::domain::derivation::{
    CalculationStep, ClassProbabilities, DerivationResult, ProbabilityCheck, ProbabilityMap,
    RegionBreakdown, VolumeMap,
};
use crate::domain::rule::DependencyRule;
use crate::domain::snapshot::CatalogSnapshot;
use crate::domain::types::{ClassKind, RegionScope};
use crate::engine::distribution;
use crate::engine::error::EngineResult;
use crate::engine::validation::validate_dependency_rules;
use crate::i18n::t_with_args;
use std::collections::BTreeMap;

// ==========================================
// ProbabilityEngine - 概率传播引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProbabilityEngine {
    config: EngineConfig,
}

impl ProbabilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 推导概率与产量
    ///
    /// # 规则
    /// - 输入概率不做合计校验 (需要时由调用方先 normalize)
    /// - 未知区域: 记录告警,跳过所有区域相关步骤
    /// - 依赖规则引用未知类别: 跳过 (零贡献)
    ///
    /// # 返回
    /// - Err(EngineError): 依赖规则结构错误 (整个调用失败)
    pub fn derive(
        &self,
        inputs: &ClassProbabilities,
        region_id: &str,
        catalog: &Catalog,
        dependency_rules: &[DependencyRule],
    ) -> EngineResult<DerivationResult> {
        validate_dependency_rules(dependency_rules)?;

        let scope = RegionScope::parse(region_id);
        let region = match scope.region_id() {
            None => None,
            Some(id) => {
                let found = catalog.region(id);
                if found.is_none() {
                    tracing::warn!(region_id = id, "未知区域,跳过区域禁售与方向盘计算");
                }
                found
            }
        };

        let mut steps = Vec::new();

        // 1. 播种 + 2. 独立类禁售重分配
        let independent = self.seed_independent(inputs, catalog, region, &mut steps);

        // 3. 区域类
        let mut regional = self.compute_regional(catalog, &scope, region, &mut steps);

        // 4. 依赖传播
        let mut dependent = Self::initial_dependent(catalog);
        self.propagate(
            dependency_rules,
            catalog,
            &independent,
            &mut dependent,
            &mut regional,
            &mut steps,
        );

        // 5. 依赖类禁售
        if let Some(region) = region {
            self.exclude_dependent(region, catalog, &mut dependent, &mut steps);
        }

        // 6. 最终归一
        self.finalize(&mut dependent, &mut steps);
        self.finalize(&mut regional, &mut steps);

        // 7. 产量投影
        let base_volume = catalog.base_volume_or(self.config.default_base_volume);
        let mut result = DerivationResult {
            independent,
            dependent,
            regional,
            volumes: VolumeMap::new(),
            steps,
            base_volume,
            by_region: Self::region_breakdown(catalog, base_volume),
        };
        result.volumes = Self::project_volumes(&result, catalog);

        tracing::debug!(
            region = %scope,
            rules = dependency_rules.len(),
            steps = result.steps.len(),
            base_volume,
            "概率推导完成"
        );

        Ok(result)
    }

    /// 基于目录快照推导
    pub fn derive_snapshot(
        &self,
        inputs: &ClassProbabilities,
        region_id: &str,
        snapshot: &CatalogSnapshot,
    ) -> EngineResult<DerivationResult> {
        self.derive(inputs, region_id, &snapshot.catalog, &snapshot.dependency_rules)
    }

    /// 归一化单个类别的输入分布 (合计为 0 时原样返回)
    pub fn normalize(&self, class_id: &str, probs: &ProbabilityMap) -> ProbabilityMap {
        let normalized = distribution::normalize(probs);
        tracing::debug!(
            class_id,
            sum_before = distribution::total(probs),
            "输入分布归一化"
        );
        normalized
    }

    /// 缺省输入: 各独立类启用特征值的 baseProbability
    pub fn default_inputs(catalog: &Catalog) -> ClassProbabilities {
        catalog
            .classes_of_kind(ClassKind::Independent)
            .map(|cls| {
                let probs = cls
                    .active_characteristics()
                    .map(|c| (c.id.clone(), c.base_probability))
                    .collect();
                (cls.id.clone(), probs)
            })
            .collect()
    }

    /// 输入分布合计检查
    pub fn check_inputs(&self, inputs: &ClassProbabilities) -> BTreeMap<String, ProbabilityCheck> {
        inputs
            .iter()
            .map(|(class_id, probs)| {
                (
                    class_id.clone(),
                    distribution::check_distribution(probs, self.config.input_sum_tolerance),
                )
            })
            .collect()
    }

    // ==========================================
    // 步骤 1-2: 独立类
    // ==========================================

    fn seed_independent(
        &self,
        inputs: &ClassProbabilities,
        catalog: &Catalog,
        region: Option<&Region>,
        steps: &mut Vec<CalculationStep>,
    ) -> ClassProbabilities {
        let mut independent = ClassProbabilities::new();

        for cls in catalog.classes_of_kind(ClassKind::Independent) {
            let mut probs = inputs.get(&cls.id).cloned().unwrap_or_default();

            if let Some(region) = region {
                let excluded = region.exclusions_for(&cls.id);
                if !excluded.is_empty() {
                    let (excluded_mass, redistributed) =
                        distribution::exclude_and_redistribute(&mut probs, excluded);
                    tracing::debug!(
                        region_id = %region.id,
                        class_id = %cls.id,
                        excluded_mass,
                        redistributed,
                        "独立类区域禁售"
                    );
                    steps.push(CalculationStep::Exclusion {
                        region_id: region.id.clone(),
                        class_id: cls.id.clone(),
                        excluded: excluded.to_vec(),
                        excluded_mass,
                        redistributed,
                        description: exclusion_description(region, cls, excluded),
                    });
                }
            }

            independent.insert(cls.id.clone(), probs);
        }

        independent
    }

    // ==========================================
    // 步骤 3: 区域类 (方向盘)
    // ==========================================

    fn compute_regional(
        &self,
        catalog: &Catalog,
        scope: &RegionScope,
        region: Option<&Region>,
        steps: &mut Vec<CalculationStep>,
    ) -> ClassProbabilities {
        let mut regional = ClassProbabilities::new();

        for cls in catalog.classes_of_kind(ClassKind::Regional) {
            let mut probs: ProbabilityMap = cls
                .active_characteristics()
                .map(|c| (c.id.clone(), 0.0))
                .collect();

            match (scope, region) {
                (RegionScope::All, _) => {
                    for r in &catalog.regions {
                        if let Some(p) = probs.get_mut(&r.steering_value) {
                            *p += r.volume_share;
                        }
                    }
                    steps.push(CalculationStep::Regional {
                        class_id: cls.id.clone(),
                        description: t_with_args("step.regional_all", &[("class", cls.name.as_str())]),
                        details: format_distribution(&probs),
                    });
                }
                (RegionScope::Region(_), Some(region)) => {
                    if let Some(p) = probs.get_mut(&region.steering_value) {
                        *p = 1.0;
                    }
                    steps.push(CalculationStep::Regional {
                        class_id: cls.id.clone(),
                        description: t_with_args(
                            "step.regional_region",
                            &[("class", cls.name.as_str()), ("region", region.name.as_str())],
                        ),
                        details: region.steering_value.clone(),
                    });
                }
                // 未知区域: 保持全零
                (RegionScope::Region(_), None) => {}
            }

            regional.insert(cls.id.clone(), probs);
        }

        regional
    }

    // ==========================================
    // 步骤 4: 依赖传播
    // ==========================================

    /// 依赖类初始为全零 (仅启用特征值)
    fn initial_dependent(catalog: &Catalog) -> ClassProbabilities {
        catalog
            .classes_of_kind(ClassKind::Dependent)
            .map(|cls| {
                let zeros = cls
                    .active_characteristics()
                    .map(|c| (c.id.clone(), 0.0))
                    .collect();
                (cls.id.clone(), zeros)
            })
            .collect()
    }

    /// 按给定顺序逐条应用依赖规则,贡献累加 (规则之间不互斥)
    fn propagate(
        &self,
        rules: &[DependencyRule],
        catalog: &Catalog,
        independent: &ClassProbabilities,
        dependent: &mut ClassProbabilities,
        regional: &mut ClassProbabilities,
        steps: &mut Vec<CalculationStep>,
    ) {
        for rule in rules {
            if catalog.class(&rule.source_class).is_none() {
                tracing::warn!(rule_id = %rule.id, source_class = %rule.source_class, "依赖规则源类别不存在,跳过");
                continue;
            }
            let target = match catalog.class(&rule.target_class) {
                Some(cls) if cls.kind.is_derived() => cls,
                Some(_) => {
                    tracing::warn!(rule_id = %rule.id, target_class = %rule.target_class, "依赖规则目标为独立类,跳过");
                    continue;
                }
                None => {
                    tracing::warn!(rule_id = %rule.id, target_class = %rule.target_class, "依赖规则目标类别不存在,跳过");
                    continue;
                }
            };

            let contribution = {
                let source = independent
                    .get(&rule.source_class)
                    .or_else(|| dependent.get(&rule.source_class))
                    .or_else(|| regional.get(&rule.source_class));
                match source {
                    Some(probs) => rule
                        .source_values
                        .iter()
                        .filter_map(|v| probs.get(v))
                        .sum::<f64>(),
                    None => 0.0,
                }
            };

            if contribution <= 0.0 {
                continue;
            }

            let bucket = match target.kind {
                ClassKind::Regional => regional.entry(target.id.clone()).or_default(),
                _ => dependent.entry(target.id.clone()).or_default(),
            };
            for (target_char, proportion) in &rule.distribution {
                if !target.has_active_characteristic(target_char) {
                    tracing::debug!(rule_id = %rule.id, target_char = %target_char, "目标特征值不存在或已停用,跳过");
                    continue;
                }
                *bucket.entry(target_char.clone()).or_insert(0.0) += contribution * proportion;
            }

            tracing::debug!(
                rule_id = %rule.id,
                target_class = %rule.target_class,
                contribution,
                "依赖规则贡献"
            );
            steps.push(CalculationStep::Dependency {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                source_class: rule.source_class.clone(),
                source_values: rule.source_values.clone(),
                target_class: rule.target_class.clone(),
                contribution,
                distribution: rule.distribution.clone(),
            });
        }
    }

    // ==========================================
    // 步骤 5-6: 依赖类禁售 + 最终归一
    // ==========================================

    fn exclude_dependent(
        &self,
        region: &Region,
        catalog: &Catalog,
        dependent: &mut ClassProbabilities,
        steps: &mut Vec<CalculationStep>,
    ) {
        for cls in catalog.classes_of_kind(ClassKind::Dependent) {
            let excluded = region.exclusions_for(&cls.id);
            if excluded.is_empty() {
                continue;
            }
            let Some(probs) = dependent.get_mut(&cls.id) else {
                continue;
            };
            // 步骤 4 未产生质量的类不处理
            if distribution::total(probs) == 0.0 {
                continue;
            }

            let excluded_mass = distribution::zero_out(probs, excluded);
            if excluded_mass == 0.0 {
                continue;
            }
            distribution::normalize_in_place(probs);

            tracing::debug!(
                region_id = %region.id,
                class_id = %cls.id,
                excluded_mass,
                "依赖类区域禁售"
            );
            steps.push(CalculationStep::DependentExclusion {
                region_id: region.id.clone(),
                class_id: cls.id.clone(),
                excluded: excluded.to_vec(),
                excluded_mass,
                description: exclusion_description(region, cls, excluded),
            });
        }
    }

    /// 合计 > 0 且偏离 1 超过容差时归一
    fn finalize(&self, classes: &mut ClassProbabilities, steps: &mut Vec<CalculationStep>) {
        for (class_id, probs) in classes.iter_mut() {
            let sum = distribution::total(probs);
            if sum > 0.0 && distribution::deviates_from_one(sum, self.config.normalization_tolerance) {
                distribution::normalize_in_place(probs);
                steps.push(CalculationStep::Normalization {
                    class_id: class_id.clone(),
                    total_before: sum,
                });
            }
        }
    }

    // ==========================================
    // 步骤 7: 产量
    // ==========================================

    fn project_volumes(result: &DerivationResult, catalog: &Catalog) -> VolumeMap {
        catalog
            .classes
            .iter()
            .map(|cls| {
                let volumes = result
                    .distribution(&cls.id)
                    .map(|probs| {
                        probs
                            .iter()
                            .map(|(id, p)| (id.clone(), distribution::project_volume(result.base_volume, *p)))
                            .collect()
                    })
                    .unwrap_or_default();
                (cls.id.clone(), volumes)
            })
            .collect()
    }

    fn region_breakdown(catalog: &Catalog, base_volume: u64) -> Vec<RegionBreakdown> {
        catalog
            .regions
            .iter()
            .map(|r| RegionBreakdown {
                region_id: r.id.clone(),
                name: r.name.clone(),
                volume_share: r.volume_share,
                steering_value: r.steering_value.clone(),
                exclusions: r.excluded_characteristics.clone(),
                volume: distribution::project_volume(base_volume, r.volume_share),
            })
            .collect()
    }
}

fn exclusion_description(region: &Region, cls: &FeatureClass, excluded: &[String]) -> String {
    let values = excluded.join(", ");
    t_with_args(
        "step.exclusion",
        &[
            ("region", region.name.as_str()),
            ("class", cls.name.as_str()),
            ("values", values.as_str()),
        ],
    )
}

fn format_distribution(probs: &ProbabilityMap) -> String {
    probs
        .iter()
        .map(|(id, p)| format!("{}: {:.1}%", id, p * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Characteristic;

    fn characteristic(id: &str, p: f64) -> Characteristic {
        Characteristic {
            id: id.to_string(),
            name: id.to_string(),
            code: id.to_string(),
            active: true,
            base_probability: p,
        }
    }

    fn class(id: &str, kind: ClassKind, chars: Vec<Characteristic>) -> FeatureClass {
        FeatureClass {
            id: id.to_string(),
            name: id.to_string(),
            color: None,
            kind,
            required: false,
            product_id: None,
            characteristics: chars,
        }
    }

    fn dep(id: &str, source: &str, values: &[&str], target: &str, dist: &[(&str, f64)]) -> DependencyRule {
        DependencyRule {
            id: id.to_string(),
            name: id.to_string(),
            product_id: None,
            source_class: source.to_string(),
            source_values: values.iter().map(|s| s.to_string()).collect(),
            target_class: target.to_string(),
            distribution: dist.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn small_catalog() -> Catalog {
        Catalog {
            product: None,
            classes: vec![
                class("A", ClassKind::Independent, vec![characteristic("A1", 0.5), characteristic("A2", 0.5)]),
                class("B", ClassKind::Dependent, vec![characteristic("B1", 0.0), characteristic("B2", 0.0)]),
            ],
            regions: Vec::new(),
        }
    }

    #[test]
    fn test_overlapping_rules_accumulate() {
        let catalog = small_catalog();
        let inputs = ProbabilityEngine::default_inputs(&catalog);
        let rules = vec![
            dep("D1", "A", &["A1"], "B", &[("B1", 1.0)]),
            dep("D2", "A", &["A1", "A2"], "B", &[("B1", 1.0)]),
        ];

        let result = ProbabilityEngine::default()
            .derive(&inputs, "ALL", &catalog, &rules)
            .unwrap();

        // 0.5 + 1.0 = 1.5,最终归一后 B1 = 1
        let contributions: Vec<f64> = result
            .steps
            .iter()
            .filter_map(|s| match s {
                CalculationStep::Dependency { contribution, .. } => Some(*contribution),
                _ => None,
            })
            .collect();
        assert_eq!(contributions, vec![0.5, 1.0]);
        assert!((result.probability("B", "B1") - 1.0).abs() < 1e-12);
        assert_eq!(result.probability("B", "B2"), 0.0);
    }

    #[test]
    fn test_unknown_classes_in_rule_are_skipped() {
        let catalog = small_catalog();
        let inputs = ProbabilityEngine::default_inputs(&catalog);
        let rules = vec![
            dep("D1", "MISSING", &["X"], "B", &[("B1", 1.0)]),
            dep("D2", "A", &["A1"], "MISSING", &[("X", 1.0)]),
        ];

        let result = ProbabilityEngine::default()
            .derive(&inputs, "ALL", &catalog, &rules)
            .unwrap();
        assert!(result.steps.is_empty());
        assert!(result.dependent["B"].values().all(|p| *p == 0.0));
    }

    #[test]
    fn test_zero_mass_dependent_class_stays_zero() {
        let catalog = small_catalog();
        let result = ProbabilityEngine::default()
            .derive(&ClassProbabilities::new(), "ALL", &catalog, &[])
            .unwrap();
        assert_eq!(distribution::total(&result.dependent["B"]), 0.0);
        assert_eq!(result.volume("B", "B1"), 0);
    }
}
