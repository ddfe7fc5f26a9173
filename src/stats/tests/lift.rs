use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::object::{Object, ObjectError, parse, serialize, set_option};
use crate::stats::{LiftStatsCollector, StatsError};

/// 直接排序计数的参考实现
fn reference_lift(pairs: &[(f64, f64)], fraction: f64) -> f64 {
    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0));
    let k = (fraction * pairs.len() as f64).round() as usize;
    let top = sorted[..k].iter().filter(|(_, t)| *t == 1.0).count() as f64;
    let total = pairs.iter().filter(|(_, t)| *t == 1.0).count() as f64;
    top / (fraction * total) * 100.0
}

#[test]
fn test_lift_matches_reference_on_1000_pairs() {
    let mut rng = StdRng::seed_from_u64(42);
    let pairs: Vec<(f64, f64)> = (0..1000)
        .map(|i| {
            // 输出互不相同；正类更可能得到高分
            let target = if rng.gen_bool(0.3) { 1.0 } else { 0.0 };
            let output = rng.r#gen::<f64>() + 0.5 * target + i as f64 * 1e-9;
            (output, target)
        })
        .collect();

    let mut lift = LiftStatsCollector::new(0.1);
    for &(o, t) in &pairs {
        lift.update(o, t).unwrap();
    }
    assert_eq!(lift.len(), 1000);
    assert_eq!(lift.top_count(), 100);

    let expected = reference_lift(&pairs, 0.1);
    assert_abs_diff_eq!(lift.compute_lift(), expected, epsilon = 1e-9);
    assert!(lift.compute_lift() > 100.0);
    assert!(lift.compute_normalized_lift() <= 1.0);
}

#[test]
fn test_lift_small_hand_computed() {
    let mut lift = LiftStatsCollector::new(0.5);
    for (o, t) in [(0.9, 1.0), (0.8, 0.0), (0.3, 1.0), (0.1, 0.0)] {
        lift.update(o, t).unwrap();
    }
    // 头部 2 个样本中有 1 个正类，正类总数 2：100 * 1 / (0.5 * 2) = 100
    assert_eq!(lift.positives_in_top(), 1);
    assert_abs_diff_eq!(lift.compute_lift(), 100.0);
    assert_abs_diff_eq!(lift.compute_normalized_lift(), 0.5);
    assert_abs_diff_eq!(lift.get_stat("LIFT").unwrap(), 100.0);
}

#[test]
fn test_lift_edge_cases() {
    let mut lift = LiftStatsCollector::new(0.1);
    assert!(lift.compute_lift().is_nan());

    lift.update(0.5, 0.0).unwrap();
    lift.update(f64::NAN, 1.0).unwrap();
    assert_eq!(lift.nmissing(), 1);
    // 没有正类
    assert!(lift.compute_lift().is_nan());

    assert_eq!(lift.update(0.5, 2.0), Err(StatsError::BadTarget(2.0)));
    assert!(matches!(lift.get_stat("AUC"), Err(StatsError::UnknownStat(_))));

    lift.forget();
    assert!(lift.is_empty());
    assert_eq!(lift.nmissing(), 0);
}

#[test]
fn test_lift_merge() {
    let mut a = LiftStatsCollector::new(0.25);
    let mut b = LiftStatsCollector::new(0.25);
    let mut whole = LiftStatsCollector::new(0.25);
    for i in 0..40 {
        let (o, t) = (i as f64 / 40.0, if i % 3 == 0 { 1.0 } else { 0.0 });
        whole.update(o, t).unwrap();
        let part = if i < 17 { &mut a } else { &mut b };
        part.update(o, t).unwrap();
    }
    a.merge(&b);
    assert_eq!(a.compute_lift(), whole.compute_lift());
}

#[test]
fn test_lift_options() {
    let mut lift = LiftStatsCollector::default();
    set_option(&mut lift, "lift_fraction", "0.2").unwrap();
    lift.build().unwrap();
    assert_eq!(lift.lift_fraction, 0.2);

    let back: LiftStatsCollector = parse(&serialize(&lift)).unwrap();
    assert_eq!(back.lift_fraction, 0.2);

    set_option(&mut lift, "lift_fraction", "1.5").unwrap();
    assert!(matches!(
        lift.build(),
        Err(StatsError::Object(ObjectError::BadOptionValue { .. }))
    ));
}
