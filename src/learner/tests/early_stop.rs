use crate::learner::EarlyStopping;

#[test]
fn test_disabled_by_default() {
    let mut es = EarlyStopping::default();
    for v in [1.0, 2.0, 3.0, 0.5, 10.0] {
        assert!(!es.observe(v));
    }
    assert_eq!(es.best(), Some(0.5));
}

#[test]
fn test_max_degraded_steps() {
    let mut es = EarlyStopping::default();
    es.max_degraded_steps = 2;
    assert!(!es.observe(1.0));
    assert!(!es.observe(1.5));
    // 连续第二个未刷新最好值的阶段
    assert!(es.observe(1.2));

    es.reset();
    assert_eq!(es.best(), None);
    assert!(!es.observe(1.0));
    assert!(!es.observe(1.1));
    // 刷新最好值后计数清零
    assert!(!es.observe(0.9));
    assert!(!es.observe(1.0));
    assert!(es.observe(1.0));
}

#[test]
fn test_min_improvement() {
    let mut es = EarlyStopping::default();
    es.min_improvement = 0.1;
    assert!(!es.observe(1.0));
    assert!(!es.observe(0.8));
    assert!(es.observe(0.75));
}

#[test]
fn test_relative_min_improvement() {
    let mut es = EarlyStopping::default();
    es.relative_min_improvement = 0.1;
    assert!(!es.observe(2.0));
    assert!(!es.observe(1.5));
    assert!(es.observe(1.4));
}

#[test]
fn test_max_degradation_against_best() {
    let mut es = EarlyStopping::default();
    es.max_degradation = 0.5;
    assert!(!es.observe(1.0));
    assert!(!es.observe(1.4));
    assert!(es.observe(1.6));

    let mut es = EarlyStopping::default();
    es.relative_max_degradation = 0.25;
    assert!(!es.observe(2.0));
    assert!(!es.observe(2.4));
    assert!(es.observe(2.6));
}

#[test]
fn test_triggers_are_independent() {
    // 只有相对退化一个条件满足时同样停止
    let mut es = EarlyStopping::default();
    es.max_degraded_steps = 100;
    es.min_improvement = f64::NEG_INFINITY;
    es.max_degradation = 100.0;
    es.relative_max_degradation = 0.1;
    assert!(!es.observe(1.0));
    assert!(es.observe(1.2));
}

#[test]
fn test_missing_objective_is_skipped() {
    let mut es = EarlyStopping::default();
    es.max_degraded_steps = 2;
    es.max_degradation = 0.5;
    // 第一个阶段就缺失时不成为最好值
    assert!(!es.observe(f64::NAN));
    assert_eq!(es.best(), None);
    assert!(!es.observe(1.0));
    assert!(!es.observe(f64::NAN));
    assert_eq!(es.best(), Some(1.0));
    // 缺失之后的退化仍能触发
    assert!(es.observe(2.0));
}
