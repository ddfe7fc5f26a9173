use super::{check_target_rows, target_class};
use crate::nn::nodes::raw_node::{check_cols, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 逐行平方误差，输出 [B, 1]
///
/// - 普通模式：目标与输出同宽，cost = Σ_j (o_j - t_j)²
/// - one-hot 模式：目标为单列类别下标，与其 one-hot 编码比较
///
/// 父节点 0 为输出，父节点 1 为目标
#[derive(Debug, Clone, Default)]
pub(crate) struct SquaredError {
    onehot: bool,
}

impl SquaredError {
    pub(crate) const fn new(onehot: bool) -> Self {
        Self { onehot }
    }

    /// 把目标展开成与输出同形状的张量
    fn dense_target(&self, node: &str, output: &Tensor, target: &Tensor) -> Result<Tensor, GraphError> {
        check_target_rows(node, output, target)?;
        if !self.onehot {
            check_cols(node, target, output.cols())?;
            return Ok(target.clone());
        }
        check_cols(node, target, 1)?;
        let k = output.cols();
        let mut dense = Tensor::zeros(output.shape());
        for r in 0..output.rows() {
            let class = target_class(node, target, r, k)?;
            if k == 1 {
                dense.set(r, 0, class as f64);
            } else {
                dense.set(r, class, 1.0);
            }
        }
        Ok(dense)
    }
}

impl TraitNode for SquaredError {
    fn type_name(&self) -> &'static str {
        "SquaredError"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let output = parents[0];
        let target = self.dense_target(node, output, parents[1])?;
        let diff = output - &target;
        let mut cost = Tensor::zeros(&[output.rows(), 1]);
        for r in 0..output.rows() {
            cost.set(r, 0, diff.row(r).iter().map(|d| d * d).sum());
        }
        Ok(cost)
    }

    fn calc_grad_to_parents(
        &self,
        node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let output = parents[0];
        let target = self.dense_target(node, output, parents[1])?;
        let mut dout = output - &target;
        for r in 0..dout.rows() {
            let g = upstream.get(r, 0);
            for c in 0..dout.cols() {
                dout.set(r, c, 2.0 * g * dout.get(r, c));
            }
        }
        Ok(vec![Some(dout), None])
    }
}
