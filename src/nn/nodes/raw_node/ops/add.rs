use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 两个同形状节点逐元素相加
#[derive(Debug, Clone, Default)]
pub(crate) struct Add;

impl TraitNode for Add {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        if !parents[0].is_same_shape(parents[1]) {
            return Err(GraphError::ShapeMismatch {
                node: node.to_string(),
                expected: parents[0].shape().to_vec(),
                got: parents[1].shape().to_vec(),
            });
        }
        Ok(parents[0] + parents[1])
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![Some(upstream.clone()), Some(upstream.clone())])
    }
}
