/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 提升度统计：1000个(输出, 目标)对、lift_fraction = 0.1，
 *                 结果与直接排序计数的参考实现一致
 */
use approx::assert_abs_diff_eq;
use plearner::stats::{LiftStatsCollector, StatsError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 参考实现：按输出降序排序，数前k个中的正类
fn reference_lift(pairs: &[(f64, f64)], fraction: f64) -> f64 {
    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0));
    let k = (fraction * sorted.len() as f64).round() as usize;
    let found = sorted[..k].iter().filter(|(_, t)| *t == 1.0).count() as f64;
    let total = pairs.iter().filter(|(_, t)| *t == 1.0).count() as f64;
    found / (fraction * total) * 100.0
}

#[test]
fn test_lift_matches_reference() -> Result<(), StatsError> {
    let mut rng = StdRng::seed_from_u64(1000);
    let pairs: Vec<(f64, f64)> = (0..1000)
        .map(|_| {
            let target = if rng.gen_bool(0.3) { 1.0 } else { 0.0 };
            (rng.gen_range(0.0..1.0) + 0.4 * target, target)
        })
        .collect();

    let mut lift = LiftStatsCollector::new(0.1);
    for &(output, target) in &pairs {
        lift.update(output, target)?;
    }
    assert_eq!(lift.top_count(), 100);
    let expected = reference_lift(&pairs, 0.1);
    println!("lift = {}", lift.compute_lift());
    assert_abs_diff_eq!(lift.compute_lift(), expected, epsilon = 1e-9);
    assert_abs_diff_eq!(lift.get_stat("LIFT")?, expected, epsilon = 1e-9);
    // 输出与目标正相关，头部正类明显多于随机
    assert!(expected > 100.0);

    // 分成两半分别累积再合并，结果不变
    let (left, right) = pairs.split_at(437);
    let mut a = LiftStatsCollector::new(0.1);
    let mut b = LiftStatsCollector::new(0.1);
    for &(output, target) in left {
        a.update(output, target)?;
    }
    for &(output, target) in right {
        b.update(output, target)?;
    }
    a.merge(&b);
    assert_abs_diff_eq!(a.compute_lift(), expected, epsilon = 1e-9);
    Ok(())
}
