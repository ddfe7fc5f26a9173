use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// forward: e^x
/// backward: d(e^x)/dx = e^x
#[derive(Debug, Clone, Default)]
pub(crate) struct Exp;

impl TraitNode for Exp {
    fn type_name(&self) -> &'static str {
        "Exp"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(parents[0].map(f64::exp))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![Some(upstream * value)])
    }
}
