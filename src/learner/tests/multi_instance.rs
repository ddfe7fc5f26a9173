use std::sync::Arc;

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assert_err;
use crate::data::{DataError, MemoryVMatrix, VMat};
use crate::learner::{BagTag, Learner, LearnerError, MultiInstanceNNet};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

const INPUTSIZE: usize = 2;

/// 包的大小依次为 1、2、3；偶数号的包为正包，其最后一个实例满足 x0 > 0.6，
/// 其余实例都满足 x0 < 0.4
fn bag_data(nbags: usize, seed: u64) -> Arc<MemoryVMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for b in 0..nbags {
        let size = 1 + b % 3;
        let positive = b % 2 == 0;
        for i in 0..size {
            let hot = positive && i == size - 1;
            let x0 = if hot {
                rng.gen_range(0.6..1.0)
            } else {
                rng.gen_range(-1.0..0.4)
            };
            let x1 = rng.gen_range(-1.0..1.0);
            let tag = match (size, i) {
                (1, _) => BagTag::Singleton,
                (_, 0) => BagTag::First,
                (_, i) if i == size - 1 => BagTag::Last,
                _ => BagTag::Middle,
            };
            rows.push(vec![x0, x1, if positive { 1.0 } else { 0.0 }, tag.as_f64()]);
        }
    }
    Arc::new(MemoryVMatrix::from_rows(&rows, INPUTSIZE, 2, 0).unwrap())
}

fn split(data: &MemoryVMatrix) -> (Tensor, Tensor) {
    let all = data.data();
    (all.slice_cols(0, INPUTSIZE), all.slice_cols(INPUTSIZE, all.cols()))
}

fn mi_learner(nstages: usize) -> MultiInstanceNNet {
    crate::utils::init_test_logger();
    let mut learner = MultiInstanceNNet::new();
    learner.base.nstages = nstages;
    learner.set_training_set(bag_data(12, 5), true).unwrap();
    learner
        .set_option("optimizer", "GradientOptimizer(start_learning_rate = 0.2)")
        .unwrap();
    learner.set_train_stats(VecStatsCollector::new());
    learner
}

fn same_with_nan(a: &Tensor, b: &Tensor) -> bool {
    a.shape() == b.shape()
        && a.to_vec()
            .iter()
            .zip(b.to_vec())
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || *x == y)
}

#[test]
fn test_requires_two_target_columns() {
    let rows = vec![vec![0.0, 0.0, 1.0]];
    let data = Arc::new(MemoryVMatrix::from_rows(&rows, 2, 1, 0).unwrap());
    let mut learner = MultiInstanceNNet::new();
    assert_err!(
        learner.set_training_set(data, true),
        LearnerError::LayoutMismatch { what: "targetsize", expected: 2, got: 1, .. }
    );
}

#[test]
fn test_training_one_bag_per_step() {
    let mut learner = mi_learner(1);
    assert_eq!(learner.get_train_cost_names(), vec!["NLL+penalty", "NLL", "class_error"]);
    learner.train().unwrap();
    let stats = learner.get_train_stats().unwrap();
    assert_abs_diff_eq!(stats.get_stat("N[NLL]").unwrap(), 12.0);
    let first = stats.get_stat("E[NLL]").unwrap();

    learner.set_option("nstages", "40").unwrap();
    learner.train().unwrap();
    let last = learner.get_train_stats().unwrap().get_stat("E[NLL]").unwrap();
    assert!(last < first, "训练后NLL {last}没有低于{first}");
}

#[test]
fn test_costs_only_on_last_row_of_each_bag() {
    let mut learner = mi_learner(1);
    let data = bag_data(6, 11);
    let (input, target) = split(&data);

    let output = learner.compute_output(&input).unwrap();
    assert_eq!(output.shape(), &[input.rows(), 1]);
    learner.reset_test_state();
    let costs = learner.compute_costs_from_outputs(&input, &output, &target).unwrap();

    let mut survive = 1.0;
    for r in 0..input.rows() {
        let tag = BagTag::from_f64(target.get(r, 1)).unwrap();
        if tag.starts_bag() {
            survive = 1.0;
        }
        survive *= 1.0 - output.get(r, 0);
        if !tag.ends_bag() {
            assert!(costs.get(r, 0).is_nan() && costs.get(r, 1).is_nan());
            continue;
        }
        let p_bag = 1.0 - survive;
        let class = target.get(r, 0);
        let nll = if class == 1.0 { -p_bag.ln() } else { -(1.0 - p_bag).ln() };
        assert_abs_diff_eq!(costs.get(r, 0), nll, epsilon = 1e-9);
        let wrong = (p_bag > 0.5) != (class == 1.0);
        assert_eq!(costs.get(r, 1), if wrong { 1.0 } else { 0.0 });
    }
}

#[test]
fn test_malformed_bags_are_rejected() {
    let mut learner = mi_learner(1);
    let input = Tensor::zeros(&[2, INPUTSIZE]);
    let output = learner.compute_output(&input).unwrap();
    // 包还没开始就出现了Last
    let target = Tensor::new(&[1.0, BagTag::Last.as_f64(), 1.0, BagTag::Last.as_f64()], &[2, 2]);
    assert_err!(
        learner.compute_costs_from_outputs(&input, &output, &target),
        LearnerError::Data(DataError::MalformedBag(_))
    );
}

#[test]
fn test_bags_may_span_minibatches() {
    let data = bag_data(9, 2);
    let mut learner = mi_learner(2);
    learner.train().unwrap();

    let mut reference_stats = VecStatsCollector::new();
    let mut reference_costs = Tensor::zeros(&[0, 0]);
    learner
        .test(data.as_ref(), &mut reference_stats, None, Some(&mut reference_costs))
        .unwrap();
    let nbags = 9.0;
    let nll = reference_stats.get(0).unwrap();
    assert_abs_diff_eq!(nll.nnonmissing(), nbags);
    assert_abs_diff_eq!(nll.nmissing(), data.length() as f64 - nbags);

    for minibatch in ["2", "4"] {
        learner.set_option("test_minibatch_size", minibatch).unwrap();
        let mut stats = VecStatsCollector::new();
        let mut costs = Tensor::zeros(&[0, 0]);
        learner.test(data.as_ref(), &mut stats, None, Some(&mut costs)).unwrap();
        assert!(same_with_nan(&costs, &reference_costs));
        assert_abs_diff_eq!(stats.mean()[0], reference_stats.mean()[0], epsilon = 1e-12);
    }

    // 行之间有依赖，要求并行时仍按顺序测试，结果不变
    learner.set_option("parallelize_test", "3").unwrap();
    let mut costs = Tensor::zeros(&[0, 0]);
    learner
        .test(data.as_ref(), &mut VecStatsCollector::new(), None, Some(&mut costs))
        .unwrap();
    assert!(same_with_nan(&costs, &reference_costs));
}
