use crate::nn::nodes::raw_node::{sigmoid, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// forward: softplus(x) = ln(1 + e^x)，按 max(x, 0) + ln(1 + e^(-|x|)) 计算以免溢出
/// backward: d(softplus)/dx = sigmoid(x)
#[derive(Debug, Clone, Default)]
pub(crate) struct Softplus;

impl TraitNode for Softplus {
    fn type_name(&self) -> &'static str {
        "Softplus"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(parents[0].map(|x| x.max(0.0) + (-x.abs()).exp().ln_1p()))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![Some(upstream.zip_map(parents[0], |g, x| g * sigmoid(x)))])
    }
}
