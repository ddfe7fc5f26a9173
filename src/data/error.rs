//! 数据访问错误类型定义

use thiserror::Error;

use crate::errors::TensorError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    /// 索引越界
    #[error("索引越界: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// 形状不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 输入/目标/权重列数之和与矩阵宽度不符，或权重列多于 1 列
    #[error(
        "列布局不合法: inputsize={inputsize}, targetsize={targetsize}, weightsize={weightsize}, 宽度={width}"
    )]
    LayoutMismatch {
        inputsize: usize,
        targetsize: usize,
        weightsize: usize,
        width: usize,
    },

    /// 多实例数据中包的标记不合法（如包未结束就开始了新包）
    #[error("包标记不合法: {0}")]
    MalformedBag(String),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
