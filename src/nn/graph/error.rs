/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Graph 模块的错误类型
 */

use thiserror::Error;

use crate::errors::TensorError;
use crate::nn::NodeId;
use crate::object::ObjectError;

/// Graph 操作错误类型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("节点{0}不存在")]
    NodeNotFound(NodeId),

    #[error("无效操作：{0}")]
    InvalidOperation(String),

    /// 绑定到节点的数据与节点声明的形状不符
    #[error("{node}形状不匹配：期望{expected:?}，实际为{got:?}")]
    ShapeMismatch {
        node: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 代价函数收到了定义域之外的输入（如0/1损失的目标为负数）
    #[error("{node}的输入超出定义域：{message}")]
    DomainViolation { node: String, message: String },

    #[error("计算错误：{0}")]
    ComputationError(String),

    #[error("节点名“{0}”在图中重复")]
    DuplicateNodeName(String),
}

impl From<TensorError> for GraphError {
    fn from(e: TensorError) -> Self {
        GraphError::ComputationError(e.to_string())
    }
}

impl From<ObjectError> for GraphError {
    fn from(e: ObjectError) -> Self {
        match e {
            ObjectError::DanglingHandle(h) => GraphError::NodeNotFound(h),
            other => GraphError::InvalidOperation(other.to_string()),
        }
    }
}
