// ==========================================
// 整车配置规划 - 输入校验器
// ==========================================
// 职责: 进入引擎前拒绝越界数值与空标识
// 说明: 引擎只处理引用失效 (按零贡献/不匹配),数值越界在此拦截
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::configuration::Configuration;
use crate::domain::derivation::ClassProbabilities;
use crate::domain::rule::{ConfigurationRule, DependencyRule};

/// 输入校验器 (无状态)
pub struct InputValidator;

impl InputValidator {
    /// 区域标识不能为空
    pub fn validate_region(region_id: &str) -> ApiResult<()> {
        if region_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("区域不能为空".to_string()));
        }
        Ok(())
    }

    /// 概率必须为 [0, 1] 内的有限数
    pub fn validate_probability(context: &str, value: f64) -> ApiResult<()> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ApiError::InvalidInput(format!(
                "{} 的概率必须在 [0, 1] 内,实际为 {}",
                context, value
            )));
        }
        Ok(())
    }

    /// 输入概率表: 逐值检查范围 (合计不强制为 1,由 check_inputs 提示)
    pub fn validate_inputs(inputs: &ClassProbabilities) -> ApiResult<()> {
        for (class_id, probs) in inputs {
            if class_id.trim().is_empty() {
                return Err(ApiError::InvalidInput("类别ID不能为空".to_string()));
            }
            for (char_id, p) in probs {
                Self::validate_probability(&format!("{}.{}", class_id, char_id), *p)?;
            }
        }
        Ok(())
    }

    /// 配置选择: 类别ID不能为空
    pub fn validate_configuration(configuration: &Configuration) -> ApiResult<()> {
        if configuration.iter().any(|(class_id, _)| class_id.trim().is_empty()) {
            return Err(ApiError::InvalidInput("配置中存在空的类别ID".to_string()));
        }
        Ok(())
    }

    /// 依赖规则分布比例的范围检查
    pub fn validate_dependency_rule(rule: &DependencyRule) -> ApiResult<()> {
        if rule.id.trim().is_empty() {
            return Err(ApiError::InvalidInput("依赖规则ID不能为空".to_string()));
        }
        for (char_id, share) in &rule.distribution {
            Self::validate_probability(&format!("{}.{}", rule.id, char_id), *share)?;
        }
        Ok(())
    }

    pub fn validate_configuration_rule(rule: &ConfigurationRule) -> ApiResult<()> {
        if rule.id.trim().is_empty() || rule.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置规则ID与名称不能为空".to_string()));
        }
        Ok(())
    }

    /// 区域销量占比
    pub fn validate_volume_share(region_id: &str, share: f64) -> ApiResult<()> {
        if !share.is_finite() || share < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "区域 {} 的销量占比不能为负,实际为 {}",
                region_id, share
            )));
        }
        Ok(())
    }
}
