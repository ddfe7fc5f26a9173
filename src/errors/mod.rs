use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    // 张量只支持 2 维（行 = 样本，列 = 特征）
    #[error("张量必须是 2 维的，但收到的形状为{0:?}")]
    NotTwoDimensional(Vec<usize>),
    // 数据长度与形状不符
    #[error("数据长度{data_len}与形状{shape:?}不符")]
    DataLengthMismatch { data_len: usize, shape: Vec<usize> },
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("行区间[{start}, {end})超出了行数{rows}")]
    RowRangeOutOfBounds { start: usize, end: usize, rows: usize },
    #[error("张量列表为空")]
    EmptyList,
}
