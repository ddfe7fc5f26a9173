use crate::nn::nodes::raw_node::{sigmoid, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// forward: sigmoid(x) = 1 / (1 + e^(-x))
/// backward: d(sigmoid)/dx = sigmoid(x) * (1 - sigmoid(x))
#[derive(Debug, Clone, Default)]
pub(crate) struct Sigmoid;

impl TraitNode for Sigmoid {
    fn type_name(&self) -> &'static str {
        "Sigmoid"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(parents[0].map(sigmoid))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![Some(upstream.zip_map(value, |g, y| g * y * (1.0 - y)))])
    }
}
