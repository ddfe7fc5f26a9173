use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// forward: tanh(x)
/// backward: d(tanh)/dx = 1 - tanh²(x)
#[derive(Debug, Clone, Default)]
pub(crate) struct Tanh;

impl TraitNode for Tanh {
    fn type_name(&self) -> &'static str {
        "Tanh"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(parents[0].map(f64::tanh))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![Some(upstream.zip_map(value, |g, y| g * (1.0 - y * y)))])
    }
}
