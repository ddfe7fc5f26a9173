use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 按列拼接若干行数相同的父节点
#[derive(Debug, Clone, Default)]
pub(crate) struct Concat;

impl TraitNode for Concat {
    fn type_name(&self) -> &'static str {
        "Concat"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Tensor::concat_cols(parents).map_err(|_| GraphError::ShapeMismatch {
            node: node.to_string(),
            expected: parents[0].shape().to_vec(),
            got: parents
                .iter()
                .find(|p| p.rows() != parents[0].rows())
                .map_or_else(Vec::new, |p| p.shape().to_vec()),
        })
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let mut start = 0;
        let mut grads = Vec::with_capacity(parents.len());
        for p in parents {
            grads.push(Some(upstream.slice_cols(start, start + p.cols())));
            start += p.cols();
        }
        Ok(grads)
    }
}
