use approx::assert_abs_diff_eq;

use super::{batch_of, linear_regression};
use crate::assert_err;
use crate::learner::{CascadeCorrelation, Learner, LearnerError, LearnerKind, parse_learner, serialize_learner};
use crate::object::{BuildState, Object, ObjectError};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

fn cascade(candidate_stages: usize, max_hidden_units: usize, nstages: usize) -> CascadeCorrelation {
    crate::utils::init_test_logger();
    let mut learner = CascadeCorrelation::new();
    learner.candidate_stages = candidate_stages;
    learner.max_hidden_units = max_hidden_units;
    learner.batch_size = 4;
    learner.base.nstages = nstages;
    learner.set_training_set(linear_regression(40, 7), true).unwrap();
    learner.set_train_stats(VecStatsCollector::new());
    learner
}

fn assert_close(a: &Tensor, b: &Tensor, epsilon: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.to_vec().iter().zip(b.to_vec()) {
        assert_abs_diff_eq!(*x, y, epsilon = epsilon);
    }
}

#[test]
fn test_starts_without_hidden_units() {
    let learner = cascade(2, 2, 1);
    assert_eq!(learner.nunits(), 0);
    let shapes: Vec<Vec<usize>> = learner.param_values().iter().map(|p| p.shape().to_vec()).collect();
    assert_eq!(shapes, vec![vec![3, 1]]);
}

#[test]
fn test_units_grow_every_candidate_stages() {
    let mut learner = cascade(2, 2, 1);
    let mut last_nodes = learner.graph().unwrap().nodes_count();
    // 第s阶段开始时的单元数为 min(s / 2, 2)
    for (nstages, expected_units) in [(1, 0), (2, 0), (3, 1), (4, 1), (5, 2), (8, 2)] {
        learner.set_option("nstages", &nstages.to_string()).unwrap();
        learner.train().unwrap();
        assert_eq!(learner.stage(), nstages);
        assert_eq!(learner.nunits(), expected_units, "训练到第{nstages}阶段");

        let nodes = learner.graph().unwrap().nodes_count();
        assert!(nodes >= last_nodes);
        last_nodes = nodes;
    }

    let shapes: Vec<Vec<usize>> = learner.param_values().iter().map(|p| p.shape().to_vec()).collect();
    assert_eq!(shapes, vec![vec![3, 1], vec![4, 1], vec![5, 1]]);
    let graph = learner.graph().unwrap();
    assert!(graph.get_node_by_name("unit2").is_some());
    assert!(graph.get_node_by_name("unit3").is_none());
}

#[test]
fn test_new_unit_leaves_function_unchanged() {
    let mut learner = cascade(1, 1, 1);
    // 学习率极小，训练几乎不改变参数，单元加入前后的网络函数可以直接比较
    learner
        .set_option("optimizer", "GradientOptimizer(start_learning_rate = 1e-300)")
        .unwrap();
    learner.train().unwrap();
    let (input, _) = batch_of(&linear_regression(8, 21));
    let before = learner.compute_output(&input).unwrap();

    learner.set_option("nstages", "2").unwrap();
    learner.train().unwrap();
    assert_eq!(learner.nunits(), 1);
    let after = learner.compute_output(&input).unwrap();
    assert_close(&before, &after, 1e-12);

    let output_weights = learner.param_values().pop().unwrap();
    assert_eq!(output_weights.shape(), &[4, 1]);
    assert_abs_diff_eq!(output_weights.get(3, 0), 0.0, epsilon = 1e-12);
}

#[test]
fn test_earlier_units_are_frozen() {
    let mut learner = cascade(1, 3, 2);
    learner
        .set_option("optimizer", "GradientOptimizer(start_learning_rate = 0.05)")
        .unwrap();
    learner.train().unwrap();
    assert_eq!(learner.nunits(), 1);
    let first_unit = learner.param_values()[0].clone();
    let output_before = learner.param_values()[1].clone();

    learner.set_option("nstages", "4").unwrap();
    learner.train().unwrap();
    assert_eq!(learner.nunits(), 3);
    let params = learner.param_values();
    assert_eq!(params[0], first_unit);
    // 输出层仍在训练
    assert_ne!(params[3].slice_rows(0, 4).unwrap(), output_before);
}

#[test]
fn test_forget_removes_all_units() {
    let fresh = cascade(1, 2, 3).param_values();
    let mut learner = cascade(1, 2, 3);
    learner.train().unwrap();
    assert_eq!(learner.nunits(), 2);

    learner.forget().unwrap();
    assert_eq!(learner.stage(), 0);
    assert_eq!(learner.nunits(), 0);
    assert_eq!(learner.param_values(), fresh);
}

#[test]
fn test_serialization_restores_units() {
    let mut learner = cascade(1, 2, 3);
    learner.train().unwrap();
    let text = serialize_learner(&learner);
    assert!(text.starts_with("CascadeCorrelation("));

    let mut restored = parse_learner(&text).unwrap();
    let LearnerKind::CascadeCorrelation(inner) = &restored else {
        panic!("类型不对：{restored:?}");
    };
    assert_eq!(inner.nunits(), 2);
    assert_eq!(restored.stage(), 3);
    assert_eq!(serialize_learner(&restored), text);

    let (input, _) = batch_of(&linear_regression(5, 4));
    let expected = learner.compute_output(&input).unwrap();
    let got = restored.compute_output(&input).unwrap();
    assert_close(&expected, &got, 1e-12);
}

#[test]
fn test_rejects_bad_options() {
    let mut learner = cascade(2, 2, 1);
    assert_err!(
        learner.set_option("candidate_stages", "0"),
        LearnerError::Object(ObjectError::BadOptionValue { name, .. }) if name == "candidate_stages"
    );
    assert_err!(
        learner.set_option("cost_funcs", "[]"),
        LearnerError::Object(ObjectError::BadOptionValue { name, .. }) if name == "cost_funcs"
    );

    // 被拒绝的取值不留在学习器中，原配置仍可继续训练
    assert_eq!(learner.get_option("candidate_stages").unwrap(), "2");
    assert_eq!(learner.cost_funcs, vec!["mse".to_string()]);
    assert_eq!(learner.build_state(), BuildState::Built);
    learner.set_option("nstages", "3").unwrap();
    learner.train().unwrap();
    assert_eq!(learner.nunits(), 1);
}
