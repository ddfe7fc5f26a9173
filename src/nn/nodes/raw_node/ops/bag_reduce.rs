use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 包（bag）内各实例输出的合并方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BagCombiner {
    /// P(bag) = 1 - Π(1 - p_i)
    #[default]
    NoisyOr,
    /// P(bag) = max_i p_i
    Max,
}

/// 把一个包的逐实例概率 [n, k] 合并为包级概率 [1, k]
///
/// 包大小为 1 时严格返回该实例的值（不经过 1 - (1 - p) 的浮点往返）；
/// 空包的值为 0
#[derive(Debug, Clone)]
pub(crate) struct BagReduce {
    combiner: BagCombiner,
}

impl BagReduce {
    pub(crate) const fn new(combiner: BagCombiner) -> Self {
        Self { combiner }
    }
}

impl TraitNode for BagReduce {
    fn type_name(&self) -> &'static str {
        "BagReduce"
    }

    fn calc_value_by_parents(&self, _node: &str, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let x = parents[0];
        let (n, k) = (x.rows(), x.cols());
        if n == 1 {
            return Ok(x.clone());
        }
        let mut y = Tensor::zeros(&[1, k]);
        if n == 0 {
            return Ok(y);
        }
        for c in 0..k {
            let v = match self.combiner {
                BagCombiner::NoisyOr => 1.0 - (0..n).map(|r| 1.0 - x.get(r, c)).product::<f64>(),
                BagCombiner::Max => (0..n).map(|r| x.get(r, c)).fold(f64::NEG_INFINITY, f64::max),
            };
            y.set(0, c, v);
        }
        Ok(y)
    }

    fn calc_grad_to_parents(
        &self,
        _node: &str,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream: &Tensor,
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let x = parents[0];
        let (n, k) = (x.rows(), x.cols());
        let mut dx = Tensor::zeros(x.shape());
        for c in 0..k {
            let g = upstream.get(0, c);
            match self.combiner {
                BagCombiner::NoisyOr => {
                    // dP/dp_i = Π_{j≠i}(1 - p_j)，用前缀积与后缀积避免除以(1 - p_i)
                    let mut prefix = vec![1.0; n + 1];
                    for r in 0..n {
                        prefix[r + 1] = prefix[r] * (1.0 - x.get(r, c));
                    }
                    let mut suffix = 1.0;
                    for r in (0..n).rev() {
                        dx.set(r, c, g * prefix[r] * suffix);
                        suffix *= 1.0 - x.get(r, c);
                    }
                }
                BagCombiner::Max => {
                    let mut best = 0;
                    for r in 1..n {
                        if x.get(r, c) > x.get(best, c) {
                            best = r;
                        }
                    }
                    if n > 0 {
                        dx.set(best, c, g);
                    }
                }
            }
        }
        Ok(vec![Some(dx)])
    }
}
