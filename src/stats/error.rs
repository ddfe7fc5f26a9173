use thiserror::Error;

use crate::object::ObjectError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// 更新或合并时向量宽度与已有字段数不一致
    #[error("统计向量宽度不匹配：期望{expected}，实际为{got}")]
    WidthMismatch { expected: usize, got: usize },

    #[error("未知的统计量“{0}”")]
    UnknownStat(String),

    #[error("没有名为“{0}”的字段")]
    UnknownField(String),

    /// 提升度统计只接受 0/1 目标
    #[error("提升度统计的目标值只能为0或1，实际为{0}")]
    BadTarget(f64),

    #[error("统计结果序列化失败：{0}")]
    Serialize(String),

    #[error(transparent)]
    Object(#[from] ObjectError),
}
