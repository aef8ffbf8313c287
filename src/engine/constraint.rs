// ==========================================
// 整车配置规划 - 配置约束校验引擎
// ==========================================
// 职责: 判定一组已选特征值在指定区域下是否合法
// 输入: 配置选择 + 区域 + 配置规则集
// 输出: valid + 违反列表 (不短路,全部累计)
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::catalog::{Catalog, Characteristic};
use crate::domain::configuration::Configuration;
use crate::domain::evaluation::{ConfigurationWarning, EvaluationResult, Violation, WarningKind};
use crate::domain::rule::{Condition, ConfigurationRule, RuleResult};
use crate::domain::types::{RegionScope, ResultOperator};
use crate::engine::error::EngineResult;
use crate::engine::validation::validate_configuration_rules;
use crate::i18n::t_with_args;
use std::collections::BTreeSet;

// ==========================================
// ConstraintEvaluator - 约束校验引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstraintEvaluator;

impl ConstraintEvaluator {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 校验配置
    ///
    /// # 规则
    /// 1. 仅考虑 active 且适用于该区域的规则 ("ALL" 不做区域过滤)
    /// 2. 条件从左到右折叠 (无优先级),空条件视为恒成立
    /// 3. 条件成立时逐条应用结果,每条结果独立判定
    /// 4. 目标类别未选择时不报违反 (同轮检查,非前向求解)
    ///
    /// # 返回
    /// - Ok(EvaluationResult): valid 当且仅当违反列表为空
    /// - Err(EngineError): 规则结构错误 (整个调用失败)
    pub fn evaluate(
        &self,
        configuration: &Configuration,
        region_id: &str,
        rules: &[ConfigurationRule],
    ) -> EngineResult<EvaluationResult> {
        validate_configuration_rules(rules)?;
        let scope = RegionScope::parse(region_id);

        let mut violations = Vec::new();
        for rule in Self::applicable_rules(rules, &scope) {
            if !Self::conditions_met(rule, configuration) {
                continue;
            }
            for result in &rule.results {
                if let Some(violation) = Self::check_result(rule, result, configuration) {
                    violations.push(violation);
                }
            }
        }

        tracing::debug!(
            region = %scope,
            rules = rules.len(),
            violations = violations.len(),
            "配置校验完成"
        );

        Ok(EvaluationResult::from_violations(violations))
    }

    /// 受限特征值集合 (用于预先过滤可选项)
    ///
    /// # 规则
    /// - 对每条适用规则中指向 class_id 的 CANNOT_BE 结果,
    ///   逐个候选值 c: 以 "class_id 选中 c" 的配置判定条件,成立则 c 受限
    /// - 条件不引用 class_id 时等价于直接按当前配置判定;
    ///   引用时保证 "选中 c 后 evaluate 必报同一规则的违反"
    pub fn restricted_values(
        &self,
        class_id: &str,
        configuration: &Configuration,
        region_id: &str,
        rules: &[ConfigurationRule],
    ) -> EngineResult<BTreeSet<String>> {
        validate_configuration_rules(rules)?;
        let scope = RegionScope::parse(region_id);

        let mut restricted = BTreeSet::new();
        for rule in Self::applicable_rules(rules, &scope) {
            let forbidding = rule
                .results
                .iter()
                .filter(|r| r.class_id == class_id && r.operator == ResultOperator::CannotBe);

            for result in forbidding {
                for value in &result.values {
                    if restricted.contains(value) {
                        continue;
                    }
                    let mut probe = configuration.clone();
                    probe.select(class_id, value);
                    if Self::conditions_met(rule, &probe) {
                        restricted.insert(value.clone());
                    }
                }
            }
        }

        Ok(restricted)
    }

    /// 可选特征值: 类别的启用特征值 - 受限特征值
    ///
    /// 未知类别返回空列表。
    pub fn available_characteristics(
        &self,
        class_id: &str,
        configuration: &Configuration,
        region_id: &str,
        rules: &[ConfigurationRule],
        catalog: &Catalog,
    ) -> EngineResult<Vec<Characteristic>> {
        let restricted = self.restricted_values(class_id, configuration, region_id, rules)?;
        let available = catalog
            .class(class_id)
            .map(|cls| {
                cls.active_characteristics()
                    .filter(|c| !restricted.contains(&c.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(available)
    }

    /// 配置完整性提示
    ///
    /// - 必选类别未选择
    /// - 已选特征值已停用
    /// - 已选特征值不属于该类别
    ///
    /// 提示不影响 valid。
    pub fn completeness_warnings(
        &self,
        configuration: &Configuration,
        catalog: &Catalog,
    ) -> Vec<ConfigurationWarning> {
        let mut warnings = Vec::new();

        for cls in &catalog.classes {
            let selected = configuration.selected(&cls.id);
            match selected {
                None if cls.required => warnings.push(ConfigurationWarning {
                    kind: WarningKind::RequiredClassMissing,
                    class_id: cls.id.clone(),
                    characteristic_id: None,
                    message: t_with_args("warning.required_missing", &[("class", cls.name.as_str())]),
                }),
                None => {}
                Some(char_id) => match cls.characteristic(char_id) {
                    None => warnings.push(ConfigurationWarning {
                        kind: WarningKind::UnknownCharacteristic,
                        class_id: cls.id.clone(),
                        characteristic_id: Some(char_id.to_string()),
                        message: t_with_args(
                            "warning.unknown_characteristic",
                            &[("class", cls.name.as_str()), ("value", char_id)],
                        ),
                    }),
                    Some(ch) if !ch.active => warnings.push(ConfigurationWarning {
                        kind: WarningKind::InactiveCharacteristic,
                        class_id: cls.id.clone(),
                        characteristic_id: Some(ch.id.clone()),
                        message: t_with_args(
                            "warning.inactive_characteristic",
                            &[("class", cls.name.as_str()), ("value", ch.name.as_str())],
                        ),
                    }),
                    Some(_) => {}
                },
            }
        }

        warnings
    }

    // ==========================================
    // 条件判定
    // ==========================================

    /// 适用规则: active 且区域匹配
    pub fn applicable_rules<'a>(
        rules: &'a [ConfigurationRule],
        scope: &'a RegionScope,
    ) -> impl Iterator<Item = &'a ConfigurationRule> + 'a {
        rules
            .iter()
            .filter(move |r| r.active && scope.admits(&r.applicable_regions))
    }

    /// 规则条件是否成立
    ///
    /// 左折叠: running = logic_i(running, cond_i),首条件的 logic 忽略
    pub fn conditions_met(rule: &ConfigurationRule, configuration: &Configuration) -> bool {
        let mut conditions = rule.conditions.iter();
        let first = match conditions.next() {
            Some(c) => c,
            None => return true,
        };

        let mut running = Self::evaluate_condition(first, configuration);
        for condition in conditions {
            let current = Self::evaluate_condition(condition, configuration);
            running = condition.logic.combine(running, current);
        }
        running
    }

    /// 单个条件判定: 类别未选择时任何运算符 (包括 NOT_EQUALS) 均为 false
    pub fn evaluate_condition(condition: &Condition, configuration: &Configuration) -> bool {
        match configuration.selected(&condition.class_id) {
            Some(selected) => condition.operator.matches(selected, &condition.values),
            None => false,
        }
    }

    fn check_result(
        rule: &ConfigurationRule,
        result: &RuleResult,
        configuration: &Configuration,
    ) -> Option<Violation> {
        let selected = configuration.selected(&result.class_id)?;
        if !result.operator.is_violated_by(selected, &result.values) {
            return None;
        }

        Some(Violation {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            class_id: result.class_id.clone(),
            operator: result.operator,
            values: result.values.clone(),
            selected: selected.to_string(),
            message: violation_message(result, selected),
        })
    }
}

/// 违反信息: 类别 + 运算符 + 允许/禁止集合
fn violation_message(result: &RuleResult, selected: &str) -> String {
    let (key, separator) = match result.operator {
        ResultOperator::MustBe => ("violation.must_be", " / "),
        ResultOperator::MustBeOneOf => ("violation.must_be_one_of", ", "),
        ResultOperator::CannotBe => ("violation.cannot_be", ", "),
    };
    let values = result.values.join(separator);
    t_with_args(
        key,
        &[
            ("class", result.class_id.as_str()),
            ("values", values.as_str()),
            ("selected", selected),
        ],
    )
}
