/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 选项的序列化往返：serialize后再parse，所有需要保存的选项取值不变
 */
use plearner::learner::{
    new_learner, parse_learner, serialize_learner, CascadeCorrelation, Learner, LearnerError, MultiInstanceNNet, NNet,
};
use plearner::object::{Object, OptionFlags};

/// 该类型所有会被保存的选项名
fn saved_options<L: Object>() -> Vec<&'static str> {
    L::registry()
        .iter()
        .filter(|d| d.flags().is_saved(false))
        .map(|d| d.name())
        .collect()
}

fn check_round_trip<L: Object>(class: &str, options: &[(&str, &str)]) -> Result<(), LearnerError> {
    let learner = new_learner(class, options)?;
    let text = serialize_learner(&learner);
    println!("{text}");
    let restored = parse_learner(&text)?;
    assert_eq!(restored.class_name(), class);

    let names = saved_options::<L>();
    assert!(!names.is_empty());
    for name in names {
        assert_eq!(learner.get_option(name)?, restored.get_option(name)?, "{class}.{name}");
    }
    assert_eq!(serialize_learner(&restored), text);
    Ok(())
}

#[test]
fn test_option_round_trip() -> Result<(), LearnerError> {
    check_round_trip::<NNet>(
        "NNet",
        &[
            ("nhidden", "7"),
            ("nhidden2", "3"),
            ("hidden_transfer_func", "softplus"),
            ("cost_funcs", "[\"mse\", \"class_error\"]"),
            ("weight_decay", "1e-4"),
            ("seed", "99"),
            ("min_improvement", "0.001"),
            ("optimizer", "Adam(learning_rate = 0.002, beta1 = 0.8)"),
        ],
    )?;
    check_round_trip::<MultiInstanceNNet>(
        "MultiInstanceNNet",
        &[("nhidden", "2"), ("bag_combiner", "max"), ("test_minibatch_size", "16")],
    )?;
    check_round_trip::<CascadeCorrelation>(
        "CascadeCorrelation",
        &[
            ("max_hidden_units", "6"),
            ("candidate_stages", "2"),
            ("output_transfer_func", "sigmoid"),
            ("optimizer", "GradientOptimizer(start_learning_rate = 0.3, decrease_constant = 0.01)"),
        ],
    )?;
    Ok(())
}

#[test]
fn test_nosave_options_are_not_serialized() -> Result<(), LearnerError> {
    let learner = new_learner("NNet", &[("report_progress", "true")])?;
    assert_eq!(learner.get_option("report_progress")?, "true");
    let restored = parse_learner(&serialize_learner(&learner))?;
    assert_eq!(restored.get_option("report_progress")?, "false");

    let nosave: Vec<&str> = NNet::registry()
        .iter()
        .filter(|d| d.flags().contains(OptionFlags::NOSAVE))
        .map(|d| d.name())
        .collect();
    assert_eq!(nosave, vec!["report_progress"]);
    Ok(())
}

#[test]
fn test_seed_keeps_full_u64_range() -> Result<(), LearnerError> {
    for seed in [u64::MAX, 1 << 63, 0] {
        let learner = new_learner("NNet", &[("seed", seed.to_string().as_str())])?;
        assert_eq!(learner.base().seed, seed);
        let restored = parse_learner(&serialize_learner(&learner))?;
        assert_eq!(restored.base().seed, seed);
    }

    // 超出u64的种子报错，不被截断
    let Err(err) = new_learner("NNet", &[("seed", "18446744073709551616")]) else {
        panic!("种子超出范围却被接受");
    };
    assert!(err.to_string().contains("seed"));
    Ok(())
}
