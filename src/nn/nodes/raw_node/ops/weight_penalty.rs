use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// L2 权重惩罚，得到标量 [1, 1]
///
/// 每个父节点都是第 0 行为偏置的权重矩阵：
/// penalty = Σ_W [ weight_decay * Σ_{r≥1} W_r² + bias_decay * Σ W_0² ]
#[derive(Debug, Clone)]
pub(crate) struct WeightPenalty {
    weight_decay: f64,
    bias_decay: f64,
}

impl WeightPenalty {
    pub(crate) const fn new(weight_decay: f64, bias_decay: f64) -> Self {
        Self {
            weight_decay,
            bias_decay,
        }
    }

    fn decay_of_row(&self, r: usize) -> f64 {
        if r == 0 { self.bias_decay } else { self.weight_decay }
    }
}

impl TraitNode for WeightPenalty {
    fn type_name(&self) -> &'static str {
        "WeightPenalty"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let mut total = 0.0;
        for w in parents {
            for r in 0..w.rows() {
                let decay = self.decay_of_row(r);
                if decay != 0.0 {
                    total += decay * w.row(r).iter().map(|x| x * x).sum::<f64>();
                }
            }
        }
        Ok(Tensor::scalar(total))
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let g = upstream.get(0, 0);
        Ok(parents
            .iter()
            .map(|w| {
                let mut dw = Tensor::zeros(w.shape());
                for r in 0..w.rows() {
                    let decay = self.decay_of_row(r);
                    for c in 0..w.cols() {
                        dw.set(r, c, 2.0 * decay * g * w.get(r, c));
                    }
                }
                Some(dw)
            })
            .collect())
    }

    /// 惩罚本身不“触及”任何行：对部分更新的参数，只有被当前 batch 选中的行才会被正则化
    fn touched_rows(&self, _parent_index: usize, _parents: &[&Tensor]) -> Option<Vec<usize>> {
        Some(vec![])
    }
}
