use super::{check_target_rows, target_class, PROB_FLOOR};
use crate::nn::nodes::raw_node::{check_cols, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 逐行负对数似然，输出 [B, 1]
///
/// 输出为各类别的概率 [B, k]，目标为单列类别下标。k == 1 时视为二分类：
/// 输出是正类概率，目标为 0 或 1
#[derive(Debug, Clone, Default)]
pub(crate) struct NegLogLikelihood;

/// 第`r`行目标类别对应的概率及其在输出中的位置、符号（二分类负类时 p = 1 - o）
fn picked(node: &str, output: &Tensor, target: &Tensor, r: usize) -> Result<(usize, f64, f64), GraphError> {
    let k = output.cols();
    let class = target_class(node, target, r, k)?;
    Ok(if k == 1 {
        if class == 1 {
            (0, output.get(r, 0), 1.0)
        } else {
            (0, 1.0 - output.get(r, 0), -1.0)
        }
    } else {
        (class, output.get(r, class), 1.0)
    })
}

impl TraitNode for NegLogLikelihood {
    fn type_name(&self) -> &'static str {
        "NegLogLikelihood"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (output, target) = (parents[0], parents[1]);
        check_target_rows(node, output, target)?;
        check_cols(node, target, 1)?;
        let mut cost = Tensor::zeros(&[output.rows(), 1]);
        for r in 0..output.rows() {
            let (_, p, _) = picked(node, output, target, r)?;
            cost.set(r, 0, -p.max(PROB_FLOOR).ln());
        }
        Ok(cost)
    }

    fn calc_grad_to_parents(
        &self,
        node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let (output, target) = (parents[0], parents[1]);
        let mut dout = Tensor::zeros(output.shape());
        for r in 0..output.rows() {
            let (col, p, sign) = picked(node, output, target, r)?;
            // 截断区间内代价为常数
            if p >= PROB_FLOOR {
                dout.set(r, col, -sign * upstream.get(r, 0) / p);
            }
        }
        Ok(vec![Some(dout), None])
    }
}
