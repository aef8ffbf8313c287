// ==========================================
// 整车配置规划 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅结构性错误 (字段缺失/为空) 上报为错误;
//       引用失效 (未知类别/特征值/区域) 一律按"不匹配/零贡献"处理
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("配置规则结构错误 (rule_id={rule_id}): {reason}")]
    MalformedRule { rule_id: String, reason: String },

    #[error("依赖规则结构错误 (rule_id={rule_id}): {reason}")]
    MalformedDependencyRule { rule_id: String, reason: String },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
