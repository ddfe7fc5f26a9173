use approx::assert_abs_diff_eq;

use crate::stats::{StatsCollector, StatsError, VecStatsCollector};

#[test]
fn test_weighted_moments() {
    let mut stats = StatsCollector::new();
    for (v, w) in [(1.0, 1.0), (2.0, 2.0), (4.0, 1.0)] {
        stats.update(v, w);
    }
    assert_eq!(stats.n(), 4.0);
    assert_abs_diff_eq!(stats.mean(), 9.0 / 4.0);
    // sumsq = 1 + 8 + 16 = 25
    assert_abs_diff_eq!(stats.variance(), (25.0 - 81.0 / 4.0) / 3.0, epsilon = 1e-12);
    assert_eq!(stats.min(), 1.0);
    assert_eq!(stats.max(), 4.0);
    assert_abs_diff_eq!(stats.stderror(), (stats.variance() / 4.0).sqrt());
}

#[test]
fn test_missing_and_empty() {
    let mut stats = StatsCollector::new();
    assert!(stats.mean().is_nan());
    assert!(stats.min().is_nan());

    stats.update(f64::NAN, 1.0);
    stats.update(3.0, 1.0);
    assert_eq!(stats.nmissing(), 1.0);
    assert_eq!(stats.nnonmissing(), 1.0);
    assert_eq!(stats.mean(), 3.0);
    // 只有一个观测值时方差无定义
    assert!(stats.variance().is_nan());
}

#[test]
fn test_merge_is_order_independent() {
    let values: Vec<f64> = (0..30).map(|i| (i as f64 * 0.37).sin()).collect();
    let mut whole = StatsCollector::new();
    values.iter().for_each(|&v| whole.update(v, 1.0));

    let mut parts: Vec<StatsCollector> = values
        .chunks(7)
        .map(|chunk| {
            let mut s = StatsCollector::new();
            chunk.iter().for_each(|&v| s.update(v, 1.0));
            s
        })
        .collect();
    parts.reverse();
    let mut merged = StatsCollector::new();
    parts.iter().for_each(|p| merged.merge(p));

    assert_abs_diff_eq!(merged.mean(), whole.mean(), epsilon = 1e-12);
    assert_abs_diff_eq!(merged.variance(), whole.variance(), epsilon = 1e-12);
    assert_eq!(merged.min(), whole.min());
    assert_eq!(merged.max(), whole.max());
}

#[test]
fn test_get_stat_names() {
    let mut stats = StatsCollector::new();
    stats.update(2.0, 1.0);
    stats.update(4.0, 1.0);
    assert_eq!(stats.get_stat("E").unwrap(), 3.0);
    assert_eq!(stats.get_stat("SUM").unwrap(), 6.0);
    assert_eq!(stats.get_stat("SUMSQ").unwrap(), 20.0);
    assert_eq!(stats.get_stat("N").unwrap(), 2.0);
    assert!(matches!(stats.get_stat("MEDIAN"), Err(StatsError::UnknownStat(_))));
}

#[test]
fn test_vec_collector_named_fields() {
    let names = vec!["mse".to_string(), "class_error".to_string()];
    let mut stats = VecStatsCollector::with_fieldnames(&names);
    stats.update(&[1.0, 0.0], 1.0).unwrap();
    stats.update(&[3.0, 1.0], 1.0).unwrap();
    stats.finalize();

    assert!(stats.is_finalized());
    assert_eq!(stats.mean(), vec![2.0, 0.5]);
    assert_eq!(stats.get_stat("E[class_error]").unwrap(), 0.5);
    assert_eq!(stats.get_stat("MAX[0]").unwrap(), 3.0);
    assert!(matches!(stats.get_stat("E[nll]"), Err(StatsError::UnknownField(_))));
    assert!(matches!(stats.get_stat("E"), Err(StatsError::UnknownStat(_))));
    assert_eq!(
        stats.update(&[1.0], 1.0),
        Err(StatsError::WidthMismatch { expected: 2, got: 1 })
    );

    stats.forget();
    assert!(!stats.is_finalized());
    assert!(stats.mean()[0].is_nan());
}

#[test]
fn test_vec_collector_infers_width_and_merges() {
    let mut a = VecStatsCollector::new();
    a.update(&[1.0, 2.0, 3.0], 1.0).unwrap();
    assert_eq!(a.width(), 3);

    let mut b = VecStatsCollector::new();
    b.update(&[3.0, 4.0, 5.0], 1.0).unwrap();

    let mut total = VecStatsCollector::new();
    total.merge(&a).unwrap();
    total.merge(&b).unwrap();
    assert_eq!(total.mean(), vec![2.0, 3.0, 4.0]);

    let mut narrow = VecStatsCollector::new();
    narrow.update(&[1.0], 1.0).unwrap();
    assert!(total.merge(&narrow).is_err());
}

#[test]
fn test_vec_collector_json() {
    let mut stats = VecStatsCollector::with_fieldnames(&["nll".to_string()]);
    stats.update(&[0.25], 2.0).unwrap();
    let json = stats.to_json().unwrap();
    let back: VecStatsCollector = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stats);
}
