/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 并行测试：把测试集切成连续的若干段，由学习器的独立副本分别测试，
 *                 合并后的输出、代价与统计量与顺序测试一致
 */
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use plearner::data::MemoryVMatrix;
use plearner::learner::{CascadeCorrelation, Learner, LearnerError};
use plearner::stats::VecStatsCollector;
use plearner::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn friedman_data(n: usize, seed: u64) -> Arc<MemoryVMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let x: Vec<f64> = (0..3).map(|_| rng.gen_range(0.0..1.0)).collect();
            let y = (std::f64::consts::PI * x[0] * x[1]).sin() + 2.0 * (x[2] - 0.5).powi(2);
            vec![x[0], x[1], x[2], y]
        })
        .collect();
    Arc::new(MemoryVMatrix::from_rows(&rows, 3, 1, 0).unwrap())
}

fn run(learner: &mut CascadeCorrelation, data: &MemoryVMatrix) -> Result<(VecStatsCollector, Tensor, Tensor), LearnerError> {
    let mut stats = VecStatsCollector::new();
    let (mut outputs, mut costs) = (Tensor::zeros(&[0, 0]), Tensor::zeros(&[0, 0]));
    learner.test(data, &mut stats, Some(&mut outputs), Some(&mut costs))?;
    Ok((stats, outputs, costs))
}

#[test]
fn test_parallel_test_matches_sequential() -> Result<(), LearnerError> {
    let mut learner = CascadeCorrelation::new();
    learner.set_option("candidate_stages", "2")?;
    learner.set_option("nstages", "6")?;
    learner.set_option("batch_size", "8")?;
    learner.set_training_set(friedman_data(64, 1), true)?;
    learner.set_train_stats(VecStatsCollector::new());
    learner.train()?;
    assert_eq!(learner.nunits(), 2);

    let data = friedman_data(101, 2);
    let (sequential_stats, sequential_outputs, sequential_costs) = run(&mut learner, &data)?;

    learner.set_option("parallelize_test", "4")?;
    learner.set_option("test_minibatch_size", "5")?;
    let (stats, outputs, costs) = run(&mut learner, &data)?;
    assert_eq!(outputs, sequential_outputs);
    assert_eq!(costs, sequential_costs);
    for field in ["N[mse]", "E[mse]", "V[mse]", "MIN[mse]", "MAX[mse]"] {
        assert_abs_diff_eq!(stats.get_stat(field)?, sequential_stats.get_stat(field)?, epsilon = 1e-12);
    }
    Ok(())
}
