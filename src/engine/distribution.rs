// ==========================================
// 整车配置规划 - 概率分布工具函数
// ==========================================
// 职责: 归一化、禁售置零、按比例重分配、合计检查、产量取整
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::derivation::{ProbabilityCheck, ProbabilityMap};

/// 分布合计
pub fn total(probs: &ProbabilityMap) -> f64 {
    probs.values().sum()
}

/// 归一化: 每项除以合计;合计为 0 时原样返回
pub fn normalize(probs: &ProbabilityMap) -> ProbabilityMap {
    let mut out = probs.clone();
    normalize_in_place(&mut out);
    out
}

/// 原地归一化,返回归一前的合计
pub fn normalize_in_place(probs: &mut ProbabilityMap) -> f64 {
    let sum = total(probs);
    if sum > 0.0 {
        for p in probs.values_mut() {
            *p /= sum;
        }
    }
    sum
}

/// 将禁售特征值置零,返回被置零的概率质量
///
/// 仅处理分布中已存在的键;不存在的特征值本就为 0。
pub fn zero_out(probs: &mut ProbabilityMap, excluded: &[String]) -> f64 {
    let mut mass = 0.0;
    for id in excluded {
        if let Some(p) = probs.get_mut(id) {
            mass += *p;
            *p = 0.0;
        }
    }
    mass
}

/// 禁售 + 按比例重分配
///
/// # 规则
/// - 禁售项置零,累计被移除的质量
/// - 被移除质量 > 0 且剩余合计 > 0 时,剩余项按"旧值 / 剩余合计"放大,
///   剩余项之间的相对比例保持不变
/// - 剩余合计为 0 (全部被禁售) 时保留全零,不报错
///
/// # 返回
/// - (excluded_mass, redistributed)
pub fn exclude_and_redistribute(probs: &mut ProbabilityMap, excluded: &[String]) -> (f64, bool) {
    let excluded_mass = zero_out(probs, excluded);
    if excluded_mass <= 0.0 {
        return (excluded_mass, false);
    }
    let remaining = total(probs);
    if remaining <= 0.0 {
        return (excluded_mass, false);
    }
    normalize_in_place(probs);
    (excluded_mass, true)
}

/// 合计与 1 的偏差是否超出容差
pub fn deviates_from_one(sum: f64, tolerance: f64) -> bool {
    (sum - 1.0).abs() > tolerance
}

/// 输入分布检查: |sum - 1| < tolerance 视为有效
pub fn check_distribution(probs: &ProbabilityMap, tolerance: f64) -> ProbabilityCheck {
    let sum = total(probs);
    ProbabilityCheck {
        sum,
        valid: (sum - 1.0).abs() < tolerance,
    }
}

/// 四舍五入 (round-half-up)
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// 产量投影: round(base_volume × probability)
pub fn project_volume(base_volume: u64, probability: f64) -> i64 {
    round_half_up(base_volume as f64 * probability)
}
