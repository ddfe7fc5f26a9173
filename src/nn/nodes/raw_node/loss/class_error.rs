use super::{check_target_rows, target_class};
use crate::nn::nodes::raw_node::{check_cols, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 0/1 分类错误，输出 [B, 1]
///
/// k == 1 时以 0.5 为阈值判定正负类；否则取最大输出的下标。
/// 目标为负数、非整数或超出类别数时报定义域错误。本节点不可导
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassError;

impl TraitNode for ClassError {
    fn type_name(&self) -> &'static str {
        "ClassError"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (output, target) = (parents[0], parents[1]);
        check_target_rows(node, output, target)?;
        check_cols(node, target, 1)?;
        let k = output.cols();
        let predicted: Vec<usize> = if k == 1 {
            (0..output.rows())
                .map(|r| usize::from(output.get(r, 0) > 0.5))
                .collect()
        } else {
            output.argmax_per_row()
        };
        let mut cost = Tensor::zeros(&[output.rows(), 1]);
        for (r, &pred) in predicted.iter().enumerate() {
            let class = target_class(node, target, r, k)?;
            cost.set(r, 0, if pred == class { 0.0 } else { 1.0 });
        }
        Ok(cost)
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![None, None])
    }
}
