mod bag;
mod cascade;
mod early_stop;
mod multi_instance;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::MemoryVMatrix;
use crate::learner::{Learner, NNet};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

/// 两个输入、一列 0/1 类别：x0 + x1 > 0 为正类
pub(super) fn linear_classes(n: usize, seed: u64) -> Arc<MemoryVMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let x0: f64 = rng.gen_range(-1.0..1.0);
            let x1: f64 = rng.gen_range(-1.0..1.0);
            vec![x0, x1, if x0 + x1 > 0.0 { 1.0 } else { 0.0 }]
        })
        .collect();
    Arc::new(MemoryVMatrix::from_rows(&rows, 2, 1, 0).unwrap())
}

/// 两个输入、一列实数目标：y = 0.5·x0 - x1 + 0.25
pub(super) fn linear_regression(n: usize, seed: u64) -> Arc<MemoryVMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let x0: f64 = rng.gen_range(-1.0..1.0);
            let x1: f64 = rng.gen_range(-1.0..1.0);
            vec![x0, x1, 0.5 * x0 - x1 + 0.25]
        })
        .collect();
    Arc::new(MemoryVMatrix::from_rows(&rows, 2, 1, 0).unwrap())
}

/// 已绑定回归训练集与训练统计的小网络
pub(super) fn regression_nnet(nhidden: usize, nstages: usize) -> NNet {
    crate::utils::init_test_logger();
    let mut learner = NNet::new();
    learner.nhidden = nhidden;
    learner.batch_size = 4;
    learner.base.nstages = nstages;
    learner.set_training_set(linear_regression(40, 7), true).unwrap();
    learner.set_train_stats(VecStatsCollector::new());
    learner
}

pub(super) fn batch_of(data: &MemoryVMatrix) -> (Tensor, Tensor) {
    let is = 2;
    let all = data.data();
    (all.slice_cols(0, is), all.slice_cols(is, all.cols()))
}
