use log::{debug, warn};
use rayon::prelude::*;

use super::{Learner, LearnerError};
use crate::data::{SubVMatrix, VMat};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

/// 一段测试的结果：输出与代价矩阵（按需）
type SliceResult = (Option<Tensor>, Option<Tensor>);

pub(super) fn test<L: Learner>(
    learner: &mut L,
    dataset: &dyn VMat,
    stats: &mut VecStatsCollector,
    outputs: Option<&mut Tensor>,
    costs: Option<&mut Tensor>,
) -> Result<(), LearnerError> {
    dataset.check_layout()?;
    let names = learner.get_test_cost_names();
    if stats.width() == 0 {
        stats.set_fieldnames(&names);
    }
    let (want_outputs, want_costs) = (outputs.is_some(), costs.is_some());

    let n = dataset.length();
    let (out, cost) = if n == 0 {
        // 空测试集：记一个缺失的代价，而不是报错
        warn!("{}的测试集为空", learner.class_name());
        stats.update(&vec![f64::NAN; names.len()], 1.0)?;
        (
            want_outputs.then(|| Tensor::zeros(&[0, learner.output_size()])),
            want_costs.then(|| Tensor::zeros(&[0, names.len()])),
        )
    } else {
        let workers = learner.base().parallelize_test.min(n);
        if workers > 1 && learner.rows_are_independent() {
            test_parallel(learner, dataset, stats, workers, want_outputs, want_costs)?
        } else {
            if workers > 1 {
                debug!("{}的测试行之间有依赖，改为顺序测试", learner.class_name());
            }
            test_slice(learner, dataset, stats, want_outputs, want_costs)?
        }
    };

    if let (Some(dst), Some(src)) = (outputs, out) {
        *dst = src;
    }
    if let (Some(dst), Some(src)) = (costs, cost) {
        *dst = src;
    }
    stats.finalize();
    Ok(())
}

/// 顺序测试一段数据
fn test_slice<L: Learner>(
    learner: &mut L,
    dataset: &dyn VMat,
    stats: &mut VecStatsCollector,
    want_outputs: bool,
    want_costs: bool,
) -> Result<SliceResult, LearnerError> {
    learner.reset_test_state();
    let n = dataset.length();
    let ncosts = learner.get_test_cost_names().len();
    let minibatch = learner.base().test_minibatch_size.max(1);
    let mut outputs = want_outputs.then(|| Tensor::zeros(&[n, learner.output_size()]));
    let mut costs = want_costs.then(|| Tensor::zeros(&[n, ncosts]));

    let mut start = 0;
    while start < n {
        let end = (start + minibatch).min(n);
        let batch = dataset.get_batch(start, end)?;
        let (out, cost) = learner.compute_output_and_costs(&batch.inputs, &batch.targets)?;
        for r in 0..batch.len() {
            stats.update(&cost.row(r).to_vec(), batch.weights.get(r, 0))?;
        }
        if let Some(outputs) = outputs.as_mut() {
            outputs.assign_rows(start, &out)?;
        }
        if let Some(costs) = costs.as_mut() {
            costs.assign_rows(start, &cost)?;
        }
        start = end;
    }
    Ok((outputs, costs))
}

/// 把测试集切成`workers`段连续的行，每段由学习器的一份独立副本测试，结果按段的顺序合并
fn test_parallel<L: Learner>(
    learner: &L,
    dataset: &dyn VMat,
    stats: &mut VecStatsCollector,
    workers: usize,
    want_outputs: bool,
    want_costs: bool,
) -> Result<SliceResult, LearnerError> {
    let n = dataset.length();
    let chunk = n.div_ceil(workers);
    let slices: Vec<(usize, usize)> = (0..workers)
        .map(|i| (i * chunk, ((i + 1) * chunk).min(n)))
        .filter(|(start, end)| start < end)
        .collect();
    debug!("{}并行测试：{}行分为{}段", learner.class_name(), n, slices.len());

    let names = stats.fieldnames().to_vec();
    let copies: Vec<L> = slices.iter().map(|_| learner.clone()).collect();
    let results = copies
        .into_par_iter()
        .zip(slices.par_iter())
        .enumerate()
        .map(|(i, (mut worker, &(start, end)))| {
            run_worker(&mut worker, dataset, &names, start, end, want_outputs, want_costs).map_err(
                |e| LearnerError::WorkerFailed {
                    slice: i,
                    source: Box::new(e),
                },
            )
        })
        .collect::<Result<Vec<_>, LearnerError>>()?;

    let mut outputs = want_outputs.then(|| Tensor::zeros(&[n, learner.output_size()]));
    let mut costs = want_costs.then(|| Tensor::zeros(&[n, learner.get_test_cost_names().len()]));
    for ((worker_stats, out, cost), &(start, _)) in results.iter().zip(&slices) {
        stats.merge(worker_stats)?;
        if let (Some(dst), Some(src)) = (outputs.as_mut(), out) {
            dst.assign_rows(start, src)?;
        }
        if let (Some(dst), Some(src)) = (costs.as_mut(), cost) {
            dst.assign_rows(start, src)?;
        }
    }
    Ok((outputs, costs))
}

fn run_worker<L: Learner>(
    worker: &mut L,
    dataset: &dyn VMat,
    names: &[String],
    start: usize,
    end: usize,
    want_outputs: bool,
    want_costs: bool,
) -> Result<(VecStatsCollector, Option<Tensor>, Option<Tensor>), LearnerError> {
    let slice = SubVMatrix::new(dataset, start, end - start)?;
    let mut stats = VecStatsCollector::with_fieldnames(names);
    let (outputs, costs) = test_slice(worker, &slice, &mut stats, want_outputs, want_costs)?;
    Ok((stats, outputs, costs))
}
