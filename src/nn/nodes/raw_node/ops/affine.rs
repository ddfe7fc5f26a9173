use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 仿射变换节点
///
/// forward: y = x · W[1..] + W[0]，即输入隐式地在最前面补上常数 1，`W`的第 0 行为偏置
/// backward: dx = g · W[1..]ᵀ，dW[0] = Σ_rows g，dW[1..] = xᵀ · g
///
/// 父节点 0 为输入 x [B, n]，父节点 1 为权重 W [n + 1, m]
#[derive(Debug, Clone, Default)]
pub(crate) struct Affine;

impl TraitNode for Affine {
    fn type_name(&self) -> &'static str {
        "Affine"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (x, w) = (parents[0], parents[1]);
        if w.rows() != x.cols() + 1 {
            return Err(GraphError::ShapeMismatch {
                node: node.to_string(),
                expected: vec![x.cols() + 1, w.cols()],
                got: w.shape().to_vec(),
            });
        }
        let bias = w.slice_rows(0, 1)?;
        let weights = w.slice_rows(1, w.rows())?;
        let mut y = x.mat_mul(&weights);
        for r in 0..y.rows() {
            for c in 0..y.cols() {
                y.set(r, c, y.get(r, c) + bias.get(0, c));
            }
        }
        Ok(y)
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let (x, w) = (parents[0], parents[1]);
        let weights = w.slice_rows(1, w.rows())?;
        let dx = upstream.mat_mul(&weights.transpose());
        let dbias = upstream.sum_rows();
        let dweights = x.transpose().mat_mul(upstream);
        let dw = Tensor::stack_rows(&[&dbias, &dweights])?;
        Ok(vec![Some(dx), Some(dw)])
    }
}
