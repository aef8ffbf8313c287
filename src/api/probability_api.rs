// ==========================================
// 整车配置规划 - 概率推导 API
// ==========================================
// 职责: 概率推导、输入检查/归一、场景保存、依赖规则维护
// 说明: 引擎参数每次调用从配置表读取,修改即时生效
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::config::ConfigManager;
use crate::domain::derivation::{ClassProbabilities, DerivationResult, ProbabilityCheck, ProbabilityMap};
use crate::domain::rule::DependencyRule;
use crate::domain::version::ProbabilityScenario;
use crate::engine::{validate_dependency_rules, ProbabilityEngine};
use crate::repository::{
    DependencyRuleFilter, DependencyRuleRepository, ProbabilityScenarioRepository, SnapshotProvider,
};

// ==========================================
// ProbabilityApi - 概率推导 API
// ==========================================
pub struct ProbabilityApi {
    snapshots: Arc<dyn SnapshotProvider>,
    config_manager: Arc<ConfigManager>,
    scenario_repo: Arc<ProbabilityScenarioRepository>,
    dependency_repo: Arc<DependencyRuleRepository>,
}

impl ProbabilityApi {
    pub fn new(
        snapshots: Arc<dyn SnapshotProvider>,
        config_manager: Arc<ConfigManager>,
        scenario_repo: Arc<ProbabilityScenarioRepository>,
        dependency_repo: Arc<DependencyRuleRepository>,
    ) -> Self {
        Self {
            snapshots,
            config_manager,
            scenario_repo,
            dependency_repo,
        }
    }

    fn engine(&self) -> ApiResult<ProbabilityEngine> {
        Ok(ProbabilityEngine::new(self.config_manager.get_engine_config()?))
    }

    // ==========================================
    // 推导
    // ==========================================

    /// 推导依赖类/区域类概率与产量
    ///
    /// # 参数
    /// - product_id: 产品ID (None 表示不按产品过滤)
    /// - inputs: 独立类输入概率 (每个值须在 [0, 1] 内)
    /// - region_id: 区域ID 或 "ALL"
    pub fn derive_probabilities(
        &self,
        product_id: Option<&str>,
        inputs: &ClassProbabilities,
        region_id: &str,
    ) -> ApiResult<DerivationResult> {
        InputValidator::validate_region(region_id)?;
        InputValidator::validate_inputs(inputs)?;
        info!(product_id = ?product_id, region_id, "概率推导");

        let snapshot = self.snapshots.load_snapshot(product_id)?;
        Ok(self.engine()?.derive_snapshot(inputs, region_id, &snapshot)?)
    }

    /// 缺省输入 (各特征值 baseProbability)
    pub fn default_inputs(&self, product_id: Option<&str>) -> ApiResult<ClassProbabilities> {
        let snapshot = self.snapshots.load_snapshot(product_id)?;
        Ok(ProbabilityEngine::default_inputs(&snapshot.catalog))
    }

    /// 输入合计检查 (|sum - 1| < input_sum_tolerance)
    pub fn check_inputs(&self, inputs: &ClassProbabilities) -> ApiResult<BTreeMap<String, ProbabilityCheck>> {
        InputValidator::validate_inputs(inputs)?;
        Ok(self.engine()?.check_inputs(inputs))
    }

    pub fn normalize(&self, class_id: &str, probs: &ProbabilityMap) -> ApiResult<ProbabilityMap> {
        for (char_id, p) in probs {
            InputValidator::validate_probability(&format!("{}.{}", class_id, char_id), *p)?;
        }
        Ok(self.engine()?.normalize(class_id, probs))
    }

    // ==========================================
    // 场景
    // ==========================================

    pub fn save_scenario(
        &self,
        name: &str,
        product_id: Option<&str>,
        region_id: &str,
        inputs: &ClassProbabilities,
    ) -> ApiResult<ProbabilityScenario> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("场景名称不能为空".to_string()));
        }
        InputValidator::validate_region(region_id)?;
        InputValidator::validate_inputs(inputs)?;

        let scenario = self.scenario_repo.save(name, product_id, region_id, inputs)?;
        info!(scenario_id = %scenario.id, "概率场景已保存");
        Ok(scenario)
    }

    pub fn list_scenarios(&self) -> ApiResult<Vec<ProbabilityScenario>> {
        Ok(self.scenario_repo.list()?)
    }

    pub fn delete_scenario(&self, id: &str) -> ApiResult<()> {
        Ok(self.scenario_repo.delete(id)?)
    }

    // ==========================================
    // 依赖规则维护
    // ==========================================

    pub fn list_dependency_rules(&self, filter: &DependencyRuleFilter) -> ApiResult<Vec<DependencyRule>> {
        Ok(self.dependency_repo.list(filter)?)
    }

    /// 新增依赖规则 (id 为空时分配 uuid;追加在应用顺序末尾)
    pub fn create_dependency_rule(&self, mut rule: DependencyRule) -> ApiResult<DependencyRule> {
        if rule.id.trim().is_empty() {
            rule.id = Uuid::new_v4().to_string();
        }
        InputValidator::validate_dependency_rule(&rule)?;
        validate_dependency_rules(std::slice::from_ref(&rule))?;

        self.dependency_repo.insert(&rule)?;
        info!(rule_id = %rule.id, "依赖规则已创建");
        Ok(rule)
    }

    pub fn update_dependency_rule(&self, rule: &DependencyRule) -> ApiResult<()> {
        InputValidator::validate_dependency_rule(rule)?;
        validate_dependency_rules(std::slice::from_ref(rule))?;
        Ok(self.dependency_repo.update(rule)?)
    }

    pub fn delete_dependency_rule(&self, id: &str) -> ApiResult<()> {
        Ok(self.dependency_repo.delete(id)?)
    }
}
