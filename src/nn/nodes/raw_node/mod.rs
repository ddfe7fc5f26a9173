mod input;
mod loss;
mod ops;
mod parameter;

pub(crate) use input::Input;
pub(crate) use loss::*;
pub(crate) use ops::*;
pub use ops::BagCombiner;
pub(crate) use parameter::Parameter;

use enum_dispatch::enum_dispatch;

use crate::nn::GraphError;
use crate::tensor::Tensor;

#[enum_dispatch]
#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Affine(Affine),
    Add(Add),
    Tanh(Tanh),
    Sigmoid(Sigmoid),
    Softplus(Softplus),
    Exp(Exp),
    Softmax(Softmax),
    LogSoftmax(LogSoftmax),
    Concat(Concat),
    RowSelect(RowSelect),
    WeightedMean(WeightedMean),
    WeightPenalty(WeightPenalty),
    BagReduce(BagReduce),
    SquaredError(SquaredError),
    CrossEntropy(CrossEntropy),
    NegLogLikelihood(NegLogLikelihood),
    ClassError(ClassError),
    MarginPerceptron(MarginPerceptron),
}

/// 节点的前向/反向规则。节点本身不持有值与梯度（它们由`NodeHandle`持有），
/// 因此这里的方法都只读取父节点的值并返回新张量
#[enum_dispatch(NodeType)]
pub(crate) trait TraitNode {
    fn type_name(&self) -> &'static str;

    /// 叶子节点（输入、参数）的值由外部设置，不参与前向计算
    fn is_leaf(&self) -> bool {
        false
    }

    // 根据父节点的值计算本节点的值（调用时所有父节点都已在拓扑序中先行计算过）
    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError>;

    /// 由本节点收到的梯度`upstream`，计算对每个父节点的梯度贡献；`None`表示该父节点不可导
    fn calc_grad_to_parents(
        &self,
        node: &str,
        parents: &[&Tensor],
        value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError>;

    /// 对第`parent_index`个父节点的梯度只触及哪些行；`None`表示全部行
    fn touched_rows(&self, _parent_index: usize, _parents: &[&Tensor]) -> Option<Vec<usize>> {
        None
    }
}

/// 叶子节点不应被要求计算
pub(crate) fn leaf_error(node: &str) -> GraphError {
    GraphError::ComputationError(format!(
        "{node}是叶子节点，其值只能手动设置。不该触及本错误，否则说明crate代码有问题"
    ))
}

pub(crate) fn check_same_rows(node: &str, a: &Tensor, b: &Tensor) -> Result<(), GraphError> {
    if a.rows() != b.rows() {
        return Err(GraphError::ShapeMismatch {
            node: node.to_string(),
            expected: vec![a.rows(), b.cols()],
            got: b.shape().to_vec(),
        });
    }
    Ok(())
}

pub(crate) fn check_cols(node: &str, t: &Tensor, cols: usize) -> Result<(), GraphError> {
    if t.cols() != cols {
        return Err(GraphError::ShapeMismatch {
            node: node.to_string(),
            expected: vec![t.rows(), cols],
            got: t.shape().to_vec(),
        });
    }
    Ok(())
}

/// 把目标值解释为类别下标：必须是`[0, nclasses)`中的整数
pub(crate) fn class_index(node: &str, target: f64, nclasses: usize) -> Result<usize, GraphError> {
    if !target.is_finite() || target < 0.0 || target.fract() != 0.0 || target as usize >= nclasses {
        return Err(GraphError::DomainViolation {
            node: node.to_string(),
            message: format!("类别目标值应为[0, {nclasses})中的整数，实际为{target}"),
        });
    }
    Ok(target as usize)
}

/// 数值稳定的 sigmoid
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
