use super::{check_target_rows, PROB_FLOOR};
use crate::nn::nodes::raw_node::{check_cols, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 逐行交叉熵，输出 [B, 1]
///
/// cost = -Σ_j [ t_j ln(o_j) + (1 - t_j) ln(1 - o_j) ]
///
/// 输出先被截断到 [PROB_FLOOR, 1 - PROB_FLOOR]；目标必须在 [0, 1] 内，否则报定义域错误
#[derive(Debug, Clone, Default)]
pub(crate) struct CrossEntropy;

fn clamp(p: f64) -> f64 {
    p.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR)
}

fn check_targets(node: &str, output: &Tensor, target: &Tensor) -> Result<(), GraphError> {
    check_target_rows(node, output, target)?;
    check_cols(node, target, output.cols())?;
    for &t in target.data_as_slice() {
        if !(0.0..=1.0).contains(&t) {
            return Err(GraphError::DomainViolation {
                node: node.to_string(),
                message: format!("交叉熵的目标值应在[0, 1]内，实际为{t}"),
            });
        }
    }
    Ok(())
}

impl TraitNode for CrossEntropy {
    fn type_name(&self) -> &'static str {
        "CrossEntropy"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (output, target) = (parents[0], parents[1]);
        check_targets(node, output, target)?;
        let mut cost = Tensor::zeros(&[output.rows(), 1]);
        for r in 0..output.rows() {
            let mut c = 0.0;
            for j in 0..output.cols() {
                let (o, t) = (clamp(output.get(r, j)), target.get(r, j));
                c -= t * o.ln() + (1.0 - t) * (1.0 - o).ln();
            }
            cost.set(r, 0, c);
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
        check_targets(node, output, target)?;
        let mut dout = Tensor::zeros(output.shape());
        for r in 0..output.rows() {
            let g = upstream.get(r, 0);
            for j in 0..output.cols() {
                let (o, t) = (output.get(r, j), target.get(r, j));
                if clamp(o) == o {
                    dout.set(r, j, g * (-t / o + (1.0 - t) / (1.0 - o)));
                }
            }
        }
        Ok(vec![Some(dout), None])
    }
}
