use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 按行 softmax
///
/// forward: y_i = e^(x_i - max) / Σ_j e^(x_j - max)
/// backward: dx_i = y_i * (g_i - Σ_j g_j * y_j)
#[derive(Debug, Clone, Default)]
pub(crate) struct Softmax;

pub(crate) fn softmax_rows(x: &Tensor) -> Tensor {
    let mut y = x.clone();
    for r in 0..x.rows() {
        let row = x.row(r);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
        for c in 0..x.cols() {
            y.set(r, c, (x.get(r, c) - max).exp() / sum);
        }
    }
    y
}

impl TraitNode for Softmax {
    fn type_name(&self) -> &'static str {
        "Softmax"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(softmax_rows(parents[0]))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let mut dx = Tensor::zeros(value.shape());
        for r in 0..value.rows() {
            let dot: f64 = (0..value.cols())
                .map(|c| upstream.get(r, c) * value.get(r, c))
                .sum();
            for c in 0..value.cols() {
                dx.set(r, c, value.get(r, c) * (upstream.get(r, c) - dot));
            }
        }
        Ok(vec![Some(dx)])
    }
}
