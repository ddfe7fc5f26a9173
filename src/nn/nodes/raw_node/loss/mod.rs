mod class_error;
mod cross_entropy;
mod margin_perceptron;
mod neg_log_likelihood;
mod squared_error;

pub(crate) use class_error::ClassError;
pub(crate) use cross_entropy::CrossEntropy;
pub(crate) use margin_perceptron::MarginPerceptron;
pub(crate) use neg_log_likelihood::NegLogLikelihood;
pub(crate) use squared_error::SquaredError;

use super::class_index;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 概率的下限，避免 log(0)
pub(crate) const PROB_FLOOR: f64 = 1e-12;

/// 第`r`行的目标类别：单列输出时为二分类（目标只能是 0 或 1），否则为`[0, k)`中的下标
pub(crate) fn target_class(node: &str, target: &Tensor, r: usize, k: usize) -> Result<usize, GraphError> {
    class_index(node, target.get(r, 0), k.max(2))
}

pub(crate) fn check_target_rows(node: &str, output: &Tensor, target: &Tensor) -> Result<(), GraphError> {
    if output.rows() != target.rows() {
        return Err(GraphError::ShapeMismatch {
            node: node.to_string(),
            expected: vec![output.rows(), target.cols()],
            got: target.shape().to_vec(),
        });
    }
    Ok(())
}
