use super::{leaf_error, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 输入节点：每次前向传播前由外部绑定数据，只校验列数
#[derive(Debug, Clone, Default)]
pub(crate) struct Input;

impl TraitNode for Input {
    fn type_name(&self) -> &'static str {
        "Input"
    }

    fn is_leaf(&self) -> bool {
        true
    }

    fn calc_value_by_parents(&self, node: &str, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Err(leaf_error(node))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![])
    }
}
