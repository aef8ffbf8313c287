use serde::{Deserialize, Serialize};

/// 引擎参数
///
/// 存储位置：config_kv（scope_id='global'），缺省时取 Default
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// 最终归一化容差：|sum - 1| 超过该值才重新归一
    pub normalization_tolerance: f64,

    /// 产品未设置 baseVolume 时的基准产量
    pub default_base_volume: u64,

    /// 输入分布检查容差：|sum - 1| 小于该值视为有效
    pub input_sum_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalization_tolerance: 0.001,
            default_base_volume: 10_000,
            input_sum_tolerance: 0.01,
        }
    }
}
