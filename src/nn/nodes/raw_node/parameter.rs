use super::{leaf_error, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 参数节点：形状固定，值由优化器更新。
/// `partial_update`为真时，优化器只更新本次反向传播中被触及的行
#[derive(Debug, Clone, Default)]
pub(crate) struct Parameter {
    partial_update: bool,
}

impl Parameter {
    pub(crate) const fn new(partial_update: bool) -> Self {
        Self { partial_update }
    }

    pub(crate) const fn partial_update(&self) -> bool {
        self.partial_update
    }
}

impl TraitNode for Parameter {
    fn type_name(&self) -> &'static str {
        "Parameter"
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
