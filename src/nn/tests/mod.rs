mod graph;

use crate::nn::{Graph, NodeId};
use crate::tensor::Tensor;

/// 两层小网络：x[·,2] -> tanh(affine) [·,3] -> sigmoid(affine) [·,1]，代价为交叉熵均值
pub(super) struct TinyNet {
    pub graph: Graph,
    pub x: NodeId,
    pub target: NodeId,
    pub w1: NodeId,
    pub w2: NodeId,
    pub output: NodeId,
    pub loss: NodeId,
}

pub(super) fn tiny_net() -> TinyNet {
    let mut graph = Graph::with_name("tiny");
    let x = graph.new_input_node(2, Some("x")).unwrap();
    let target = graph.new_input_node(1, Some("target")).unwrap();
    let w1 = graph
        .new_parameter_node(
            &Tensor::new(&[0.1, -0.2, 0.05, 0.3, 0.4, -0.1, -0.5, 0.2, 0.25], &[3, 3]),
            false,
            Some("w1"),
        )
        .unwrap();
    let w2 = graph
        .new_parameter_node(&Tensor::new(&[0.0, 0.6, -0.4, 0.3], &[4, 1]), false, Some("w2"))
        .unwrap();
    let a1 = graph.new_affine_node(x, w1, None).unwrap();
    let h = graph.new_tanh_node(a1, None).unwrap();
    let a2 = graph.new_affine_node(h, w2, None).unwrap();
    let output = graph.new_sigmoid_node(a2, Some("output")).unwrap();
    let cost = graph.new_cross_entropy_node(output, target, None).unwrap();
    let loss = graph.new_weighted_mean_node(cost, None, Some("loss")).unwrap();
    TinyNet {
        graph,
        x,
        target,
        w1,
        w2,
        output,
        loss,
    }
}

pub(super) fn tiny_batch() -> (Tensor, Tensor) {
    (
        Tensor::new(&[0.5, -1.0, 1.5, 0.2, -0.3, 0.8, 0.0, 1.0], &[4, 2]),
        Tensor::new(&[1.0, 0.0, 1.0, 0.0], &[4, 1]),
    )
}
