use super::{check_target_rows, target_class};
use crate::nn::nodes::raw_node::{check_cols, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 带间隔的感知机代价，输出 [B, 1]
///
/// 对每个输出 j 取符号 s_j（目标类别为 +1，其余为 -1；k == 1 时 s = 2t - 1），
/// cost = Σ_j max(0, margin - s_j * o_j)
#[derive(Debug, Clone)]
pub(crate) struct MarginPerceptron {
    margin: f64,
}

impl MarginPerceptron {
    pub(crate) const fn new(margin: f64) -> Self {
        Self { margin }
    }

    fn signs(&self, node: &str, output: &Tensor, target: &Tensor, r: usize) -> Result<Vec<f64>, GraphError> {
        let k = output.cols();
        let class = target_class(node, target, r, k)?;
        Ok(if k == 1 {
            vec![2.0 * class as f64 - 1.0]
        } else {
            (0..k).map(|j| if j == class { 1.0 } else { -1.0 }).collect()
        })
    }
}

impl TraitNode for MarginPerceptron {
    fn type_name(&self) -> &'static str {
        "MarginPerceptron"
    }

    fn calc_value_by_parents(&self, node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (output, target) = (parents[0], parents[1]);
        check_target_rows(node, output, target)?;
        check_cols(node, target, 1)?;
        let mut cost = Tensor::zeros(&[output.rows(), 1]);
        for r in 0..output.rows() {
            let signs = self.signs(node, output, target, r)?;
            let c: f64 = signs
                .iter()
                .enumerate()
                .map(|(j, s)| (self.margin - s * output.get(r, j)).max(0.0))
                .sum();
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
        let mut dout = Tensor::zeros(output.shape());
        for r in 0..output.rows() {
            let signs = self.signs(node, output, target, r)?;
            for (j, s) in signs.iter().enumerate() {
                if self.margin - s * output.get(r, j) > 0.0 {
                    dout.set(r, j, -s * upstream.get(r, 0));
                }
            }
        }
        Ok(vec![Some(dout), None])
    }
}
