use crate::nn::nodes::raw_node::{check_same_rows, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 按样本权重求均值，得到标量 [1, 1]
///
/// 父节点 0 为逐行代价 [B, 1]；可选的父节点 1 为样本权重 [B, 1]（缺省时权重全为 1）。
/// 权重总和为 0（含空 batch）时值为 0 且不回传梯度，而不是产生 NaN
#[derive(Debug, Clone, Default)]
pub(crate) struct WeightedMean;

fn weight(parents: &[&Tensor], r: usize) -> f64 {
    parents.get(1).map_or(1.0, |w| w.get(r, 0))
}

fn total_weight(parents: &[&Tensor]) -> f64 {
    (0..parents[0].rows()).map(|r| weight(parents, r)).sum()
}

impl TraitNode for WeightedMean {
    fn type_name(&self) -> &'static str {
        "WeightedMean"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let x = parents[0];
        if let Some(w) = parents.get(1) {
            check_same_rows(node, x, w)?;
        }
        let total = total_weight(parents);
        if total == 0.0 {
            return Ok(Tensor::scalar(0.0));
        }
        let sum: f64 = (0..x.rows()).map(|r| weight(parents, r) * x.get(r, 0)).sum();
        Ok(Tensor::scalar(sum / total))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let x = parents[0];
        let total = total_weight(parents);
        let g = upstream.get(0, 0);
        let mut dx = Tensor::zeros(x.shape());
        if total != 0.0 {
            for r in 0..x.rows() {
                dx.set(r, 0, g * weight(parents, r) / total);
            }
        }
        let mut grads = vec![Some(dx)];
        if parents.len() > 1 {
            grads.push(None);
        }
        Ok(grads)
    }
}
