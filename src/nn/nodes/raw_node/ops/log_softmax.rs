use super::softmax::softmax_rows;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 按行 log-softmax
///
/// forward: y_i = x_i - log Σ_j e^(x_j)
/// backward: dx_i = g_i - softmax_i * Σ_j g_j
#[derive(Debug, Clone, Default)]
pub(crate) struct LogSoftmax;

impl TraitNode for LogSoftmax {
    fn type_name(&self) -> &'static str {
        "LogSoftmax"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let x = parents[0];
        let mut y = x.clone();
        for r in 0..x.rows() {
            let row = x.row(r);
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = max + row.iter().map(|&v| (v - max).exp()).sum::<f64>().ln();
            for c in 0..x.cols() {
                y.set(r, c, x.get(r, c) - log_sum);
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
        let probs = softmax_rows(parents[0]);
        let mut dx = upstream.clone();
        for r in 0..dx.rows() {
            let total: f64 = upstream.row(r).sum();
            for c in 0..dx.cols() {
                dx.set(r, c, upstream.get(r, c) - probs.get(r, c) * total);
            }
        }
        Ok(vec![Some(dx)])
    }
}
