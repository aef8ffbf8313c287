// ==========================================
// 整车配置规划 - 配置校验 API
// ==========================================
// 职责: 配置校验、可选项过滤、配置规则维护
// 说明: 每次调用各取一份目录快照,规则编辑不影响进行中的求值
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::domain::catalog::Characteristic;
use crate::domain::configuration::Configuration;
use crate::domain::evaluation::EvaluationResult;
use crate::domain::rule::ConfigurationRule;
use crate::engine::{validate_configuration_rules, ConstraintEvaluator};
use crate::repository::{ConfigurationRuleFilter, ConfigurationRuleRepository, SnapshotProvider};

// ==========================================
// ConfigurationApi - 配置校验 API
// ==========================================

/// 配置校验API
///
/// 职责：
/// 1. 校验配置 (违反 + 完整性提示)
/// 2. 计算受限/可选特征值
/// 3. 配置规则增删改查与复制
pub struct ConfigurationApi {
    snapshots: Arc<dyn SnapshotProvider>,
    rule_repo: Arc<ConfigurationRuleRepository>,
    evaluator: ConstraintEvaluator,
}

impl ConfigurationApi {
    pub fn new(
        snapshots: Arc<dyn SnapshotProvider>,
        rule_repo: Arc<ConfigurationRuleRepository>,
    ) -> Self {
        Self {
            snapshots,
            rule_repo,
            evaluator: ConstraintEvaluator::new(),
        }
    }

    // ==========================================
    // 校验
    // ==========================================

    /// 校验配置
    ///
    /// # 参数
    /// - product_id: 产品ID (None 表示不按产品过滤)
    /// - configuration: 类别 → 已选特征值
    /// - region_id: 区域ID 或 "ALL"
    ///
    /// # 返回
    /// - Ok(EvaluationResult): 违反列表 + 完整性提示 (提示不影响 valid)
    /// - Err(ApiError::MalformedRule): 规则结构错误
    pub fn evaluate_configuration(
        &self,
        product_id: Option<&str>,
        configuration: &Configuration,
        region_id: &str,
    ) -> ApiResult<EvaluationResult> {
        InputValidator::validate_region(region_id)?;
        InputValidator::validate_configuration(configuration)?;
        info!(product_id = ?product_id, region_id, "校验配置");

        let snapshot = self.snapshots.load_snapshot(product_id)?;
        let mut result =
            self.evaluator
                .evaluate(configuration, region_id, &snapshot.configuration_rules)?;
        result.warnings = self
            .evaluator
            .completeness_warnings(configuration, &snapshot.catalog);
        Ok(result)
    }

    /// 受限特征值
    pub fn restricted_values(
        &self,
        product_id: Option<&str>,
        class_id: &str,
        configuration: &Configuration,
        region_id: &str,
    ) -> ApiResult<BTreeSet<String>> {
        InputValidator::validate_region(region_id)?;
        let snapshot = self.snapshots.load_snapshot(product_id)?;
        Ok(self.evaluator.restricted_values(
            class_id,
            configuration,
            region_id,
            &snapshot.configuration_rules,
        )?)
    }

    /// 可选特征值 (启用 - 受限)
    pub fn available_characteristics(
        &self,
        product_id: Option<&str>,
        class_id: &str,
        configuration: &Configuration,
        region_id: &str,
    ) -> ApiResult<Vec<Characteristic>> {
        InputValidator::validate_region(region_id)?;
        let snapshot = self.snapshots.load_snapshot(product_id)?;
        Ok(self.evaluator.available_characteristics(
            class_id,
            configuration,
            region_id,
            &snapshot.configuration_rules,
            &snapshot.catalog,
        )?)
    }

    // ==========================================
    // 规则维护
    // ==========================================

    pub fn list_rules(&self, filter: &ConfigurationRuleFilter) -> ApiResult<Vec<ConfigurationRule>> {
        Ok(self.rule_repo.list(filter)?)
    }

    pub fn get_rule(&self, id: &str) -> ApiResult<ConfigurationRule> {
        self.rule_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("ConfigurationRule(id={})不存在", id)))
    }

    /// 新增规则 (id 为空时分配 uuid),写入前做结构校验
    pub fn create_rule(&self, mut rule: ConfigurationRule) -> ApiResult<ConfigurationRule> {
        if rule.id.trim().is_empty() {
            rule.id = Uuid::new_v4().to_string();
        }
        InputValidator::validate_configuration_rule(&rule)?;
        validate_configuration_rules(std::slice::from_ref(&rule))?;

        self.rule_repo.insert(&rule)?;
        info!(rule_id = %rule.id, "配置规则已创建");
        Ok(rule)
    }

    pub fn update_rule(&self, rule: &ConfigurationRule) -> ApiResult<()> {
        InputValidator::validate_configuration_rule(rule)?;
        validate_configuration_rules(std::slice::from_ref(rule))?;
        self.rule_repo.update(rule)?;
        Ok(())
    }

    pub fn delete_rule(&self, id: &str) -> ApiResult<()> {
        self.rule_repo.delete(id)?;
        info!(rule_id = id, "配置规则已删除");
        Ok(())
    }

    /// 复制规则: 新 id,名称追加 " (Copy)"
    pub fn duplicate_rule(&self, id: &str) -> ApiResult<ConfigurationRule> {
        let copy = self.rule_repo.duplicate(id)?;
        info!(source_id = id, rule_id = %copy.id, "配置规则已复制");
        Ok(copy)
    }
}
