// ==========================================
// 整车配置规划 - 规则结构校验
// ==========================================
// 职责: 在求值前对规则集做结构性检查 (fail-fast)
// 红线: 任一规则结构错误则整个调用失败,不返回部分结果
// ==========================================

use crate::domain::rule::{ConfigurationRule, DependencyRule};
use crate::engine::error::{EngineError, EngineResult};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn malformed(rule_id: &str, reason: impl Into<String>) -> EngineError {
    EngineError::MalformedRule {
        rule_id: rule_id.to_string(),
        reason: reason.into(),
    }
}

fn malformed_dependency(rule_id: &str, reason: impl Into<String>) -> EngineError {
    EngineError::MalformedDependencyRule {
        rule_id: rule_id.to_string(),
        reason: reason.into(),
    }
}

/// 校验配置规则集
///
/// # 规则
/// 1. rule.id 不能为空
/// 2. 每个条件必须有 class_id 且 values 非空
/// 3. 每个结果必须有 class_id 且 values 非空
///
/// 条件为空是合法的 (无条件规则)。
pub fn validate_configuration_rules(rules: &[ConfigurationRule]) -> EngineResult<()> {
    for (idx, rule) in rules.iter().enumerate() {
        if is_blank(&rule.id) {
            return Err(malformed(&format!("#{}", idx), "规则ID为空"));
        }

        for (pos, condition) in rule.conditions.iter().enumerate() {
            if is_blank(&condition.class_id) {
                return Err(malformed(&rule.id, format!("第{}个条件缺少 classId", pos + 1)));
            }
            if condition.values.is_empty() {
                return Err(malformed(
                    &rule.id,
                    format!("第{}个条件 ({}) 未指定特征值", pos + 1, condition.class_id),
                ));
            }
        }

        for (pos, result) in rule.results.iter().enumerate() {
            if is_blank(&result.class_id) {
                return Err(malformed(&rule.id, format!("第{}个结果缺少 classId", pos + 1)));
            }
            if result.values.is_empty() {
                return Err(malformed(
                    &rule.id,
                    format!("第{}个结果 ({}) 未指定特征值", pos + 1, result.class_id),
                ));
            }
        }
    }
    Ok(())
}

/// 校验依赖规则集
///
/// # 规则
/// 1. rule.id / source_class / target_class 不能为空
/// 2. source_values 与 distribution 不能为空
pub fn validate_dependency_rules(rules: &[DependencyRule]) -> EngineResult<()> {
    for (idx, rule) in rules.iter().enumerate() {
        if is_blank(&rule.id) {
            return Err(malformed_dependency(&format!("#{}", idx), "规则ID为空"));
        }
        if is_blank(&rule.source_class) {
            return Err(malformed_dependency(&rule.id, "缺少 sourceClass"));
        }
        if is_blank(&rule.target_class) {
            return Err(malformed_dependency(&rule.id, "缺少 targetClass"));
        }
        if rule.source_values.is_empty() {
            return Err(malformed_dependency(&rule.id, "sourceValues 为空"));
        }
        if rule.distribution.is_empty() {
            return Err(malformed_dependency(&rule.id, "distribution 为空"));
        }
    }
    Ok(())
}
