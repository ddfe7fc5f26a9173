use approx::assert_abs_diff_eq;

use super::{tiny_batch, tiny_net};
use crate::nn::{Graph, GraphDescriptor, GraphError};
use crate::tensor::Tensor;

#[test]
fn test_propagation_path_is_topological() {
    let mut net = tiny_net();
    let path = net.graph.propagation_path(&[net.loss]).unwrap();
    // 所有节点都是 loss 的祖先
    assert_eq!(path.len(), net.graph.nodes_count());
    for (i, &id) in path.iter().enumerate() {
        for parent in net.graph.get_node_parents(id).unwrap() {
            let pos = path.iter().position(|&p| p == parent).unwrap();
            assert!(pos < i, "父节点{parent}应排在{id}之前");
        }
    }
    assert_eq!(*path.last().unwrap(), net.loss);
}

#[test]
fn test_path_is_cached_until_structure_changes() {
    let mut net = tiny_net();
    let (x, t) = tiny_batch();
    net.graph.set_node_value(net.x, &x).unwrap();
    net.graph.set_node_value(net.target, &t).unwrap();

    net.graph.fprop(&[net.loss]).unwrap();
    net.graph.fprop(&[net.loss]).unwrap();
    assert_eq!(net.graph.path_builds(), 1);
    assert_eq!(net.graph.last_forward_pass_id(), 2);

    // 新增节点（如级联网络新加的隐藏单元）后必须重新计算传播路径
    let version = net.graph.structure_version();
    net.graph.new_exp_node(net.output, None).unwrap();
    assert_eq!(net.graph.structure_version(), version + 1);
    net.graph.fprop(&[net.loss]).unwrap();
    assert_eq!(net.graph.path_builds(), 2);
}

#[test]
fn test_fprop_recomputes_for_new_inputs() {
    let mut net = tiny_net();
    let (x, t) = tiny_batch();
    let first = net
        .graph
        .evaluate(&[(net.x, &x), (net.target, &t)], &[net.output])
        .unwrap();
    let x2 = x.map(|v| v * 2.0);
    let second = net
        .graph
        .evaluate(&[(net.x, &x2), (net.target, &t)], &[net.output])
        .unwrap();
    assert_ne!(first, second);

    // batch 大小可以变
    let one = x.slice_rows(0, 1).unwrap();
    let out = net.graph.evaluate(&[(net.x, &one)], &[net.output]).unwrap();
    assert_eq!(out[0].shape(), &[1, 1]);
    assert_abs_diff_eq!(out[0].get(0, 0), first[0].get(0, 0), epsilon = 1e-12);
}

#[test]
fn test_gradients_accumulate_until_cleared() {
    let mut net = tiny_net();
    let (x, t) = tiny_batch();
    net.graph.evaluate(&[(net.x, &x), (net.target, &t)], &[net.loss]).unwrap();
    net.graph.bprop(net.loss).unwrap();
    let once = net.graph.get_node_grad(net.w2).unwrap().unwrap().clone();

    net.graph.bprop(net.loss).unwrap();
    let twice = net.graph.get_node_grad(net.w2).unwrap().unwrap().clone();
    assert_abs_diff_eq!(twice.get(1, 0), 2.0 * once.get(1, 0), epsilon = 1e-12);

    net.graph.clear_gradients();
    assert!(net.graph.get_node_grad(net.w2).unwrap().is_none());
    net.graph.bprop(net.loss).unwrap();
    assert_eq!(net.graph.get_node_grad(net.w2).unwrap().unwrap(), &once);
    assert_eq!(net.graph.last_backward_pass_id(), 3);
}

#[test]
fn test_lifecycle_errors() {
    let mut net = tiny_net();
    // 输入未赋值
    assert!(matches!(
        net.graph.fprop(&[net.loss]),
        Err(GraphError::InvalidOperation(_))
    ));
    // 未前向传播
    assert!(matches!(net.graph.bprop(net.loss), Err(GraphError::InvalidOperation(_))));

    let (x, t) = tiny_batch();
    net.graph.evaluate(&[(net.x, &x), (net.target, &t)], &[net.output]).unwrap();
    // 起点不是标量
    assert!(matches!(net.graph.bprop(net.output), Err(GraphError::InvalidOperation(_))));
    // 计算节点的值不能手动设置
    assert!(matches!(
        net.graph.set_node_value(net.output, &Tensor::zeros(&[4, 1])),
        Err(GraphError::InvalidOperation(_))
    ));
}

#[test]
fn test_shape_mismatch_names_the_node() {
    let mut net = tiny_net();
    let err = net
        .graph
        .set_node_value(net.x, &Tensor::zeros(&[4, 3]))
        .unwrap_err();
    match err {
        GraphError::ShapeMismatch { node, got, .. } => {
            assert!(node.contains("name=x"), "{node}");
            assert_eq!(got, vec![4, 3]);
        }
        other => panic!("意外的错误：{other:?}"),
    }

    assert!(matches!(
        net.graph.set_node_value(net.w2, &Tensor::zeros(&[3, 1])),
        Err(GraphError::ShapeMismatch { .. })
    ));

    // 仿射权重的行数须为输入列数 + 1
    let w = net
        .graph
        .new_parameter_node(&Tensor::zeros(&[2, 2]), false, None)
        .unwrap();
    assert!(matches!(
        net.graph.new_affine_node(net.x, w, None),
        Err(GraphError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        net.graph.new_add_node(net.x, net.target, None),
        Err(GraphError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_domain_violations() {
    let mut graph = Graph::new();
    let out = graph.new_input_node(2, None).unwrap();
    let target = graph.new_input_node(1, None).unwrap();
    let err = graph.new_class_error_node(out, target, None).unwrap();
    let nll = graph.new_nll_node(out, target, None).unwrap();

    let o = Tensor::new(&[0.2, 0.8], &[1, 2]);
    for bad in [-1.0, 2.0, 0.5] {
        let t = Tensor::new(&[bad], &[1, 1]);
        for sink in [err, nll] {
            assert!(matches!(
                graph.evaluate(&[(out, &o), (target, &t)], &[sink]),
                Err(GraphError::DomainViolation { .. })
            ));
        }
    }

    let dense_target = graph.new_input_node(2, None).unwrap();
    let xent = graph.new_cross_entropy_node(out, dense_target, None).unwrap();
    let t = Tensor::new(&[1.0, -0.5], &[1, 2]);
    assert!(matches!(
        graph.evaluate(&[(out, &o), (dense_target, &t)], &[xent]),
        Err(GraphError::DomainViolation { .. })
    ));
}

#[test]
fn test_loss_values() {
    let mut graph = Graph::new();
    let out = graph.new_input_node(3, None).unwrap();
    let target = graph.new_input_node(1, None).unwrap();
    let err = graph.new_class_error_node(out, target, None).unwrap();
    let mse = graph.new_squared_error_node(out, target, true, None).unwrap();
    let margin = graph.new_margin_perceptron_node(out, target, 1.0, None).unwrap();

    let o = Tensor::new(&[0.1, 0.7, 0.2, 0.5, 0.3, 0.2], &[2, 3]);
    let t = Tensor::new(&[1.0, 2.0], &[2, 1]);
    let values = graph
        .evaluate(&[(out, &o), (target, &t)], &[err, mse, margin])
        .unwrap();
    assert_eq!(values[0].to_vec(), vec![0.0, 1.0]);
    assert_abs_diff_eq!(values[1].get(0, 0), 0.01 + 0.09 + 0.04, epsilon = 1e-12);
    // 第 0 行：max(0, 1+0.1) + max(0, 1-0.7) + max(0, 1+0.2)
    assert_abs_diff_eq!(values[2].get(0, 0), 1.1 + 0.3 + 1.2, epsilon = 1e-12);
}

#[test]
fn test_weighted_mean_zero_weight() {
    let mut graph = Graph::new();
    let x = graph.new_input_node(1, None).unwrap();
    let w = graph.new_input_node(1, None).unwrap();
    let mean = graph.new_weighted_mean_node(x, Some(w), None).unwrap();
    let values = Tensor::new(&[1.0, 3.0], &[2, 1]);

    let out = graph
        .evaluate(&[(x, &values), (w, &Tensor::new(&[1.0, 3.0], &[2, 1]))], &[mean])
        .unwrap();
    assert_abs_diff_eq!(out[0].get(0, 0), 2.5);

    let out = graph
        .evaluate(&[(x, &values), (w, &Tensor::zeros(&[2, 1]))], &[mean])
        .unwrap();
    assert_eq!(out[0].get(0, 0), 0.0);
}

#[test]
fn test_node_names_and_queries() {
    let mut net = tiny_net();
    assert_eq!(net.graph.name(), "tiny");
    assert_eq!(net.graph.get_node_by_name("loss"), Some(net.loss));
    assert_eq!(net.graph.get_node_name(net.output).unwrap(), "output");
    assert_eq!(net.graph.get_node_type(net.output).unwrap(), "Sigmoid");
    assert_eq!(net.graph.get_parameter_nodes(), vec![net.w1, net.w2]);
    assert_eq!(net.graph.get_node_children(net.target).unwrap().len(), 1);
    // 自动命名
    let h = net.graph.new_tanh_node(net.output, None).unwrap();
    assert_eq!(net.graph.get_node_name(h).unwrap(), "tanh_2");
    assert_eq!(
        net.graph.new_tanh_node(net.output, Some("loss")),
        Err(GraphError::DuplicateNodeName("loss".to_string()))
    );
}

#[test]
fn test_describe_to_json() {
    let net = tiny_net();
    let json = net.graph.to_json().unwrap();
    let desc = GraphDescriptor::from_json(&json).unwrap();
    assert_eq!(desc, net.graph.describe());
    assert_eq!(desc.nodes.len(), net.graph.nodes_count());
    assert_eq!(desc.total_params(), 9 + 4);
    let loss = &desc.nodes[net.loss.0];
    assert_eq!(loss.node_type, "WeightedMean");
    assert_eq!(loss.cols, 1);
}
