/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 各神经网络学习器共用的构件：激活函数与代价函数的名字解析、
 *                 权重初始化、代价部分（训练目标 + 测试代价）的组装，以及按 minibatch 喂数据
 */

use rand::rngs::StdRng;

use super::LearnerError;
use crate::data::VMat;
use crate::nn::{Graph, GraphError, NodeId, TrainingFeed};
use crate::tensor::Tensor;

/// 可用的激活函数；空串与"linear"都表示恒等
pub(crate) const TRANSFER_FUNCS: &[&str] = &[
    "",
    "linear",
    "tanh",
    "sigmoid",
    "softplus",
    "exp",
    "softmax",
    "log_softmax",
];

pub(crate) const COST_FUNCS: &[&str] = &[
    "mse",
    "mse_onehot",
    "NLL",
    "class_error",
    "cross_entropy",
    "margin_perceptron_cost",
];

pub(crate) fn check_transfer(class: &str, option: &str, name: &str) -> Result<(), LearnerError> {
    if TRANSFER_FUNCS.contains(&name) {
        Ok(())
    } else {
        Err(LearnerError::bad_option(
            class,
            option,
            name,
            format!("可选的激活函数为{TRANSFER_FUNCS:?}"),
        ))
    }
}

pub(crate) fn check_costs(class: &str, cost_funcs: &[String]) -> Result<(), LearnerError> {
    if cost_funcs.is_empty() {
        return Err(LearnerError::bad_option(class, "cost_funcs", "[]", "至少需要一个代价函数"));
    }
    for cost in cost_funcs {
        if !COST_FUNCS.contains(&cost.as_str()) {
            return Err(LearnerError::bad_option(
                class,
                "cost_funcs",
                cost,
                format!("可选的代价函数为{COST_FUNCS:?}"),
            ));
        }
    }
    Ok(())
}

/// 代价函数要求的目标列数：逐维比较的代价需要与输出同宽，其余只要一列类别下标
fn cost_target_cols(cost: &str, noutputs: usize) -> usize {
    match cost {
        "mse" | "cross_entropy" => noutputs,
        _ => 1,
    }
}

/// 所有代价函数共用同一份目标，因此它们要求的目标列数必须一致
pub(crate) fn target_width(class: &str, cost_funcs: &[String], noutputs: usize) -> Result<usize, LearnerError> {
    let width = cost_target_cols(&cost_funcs[0], noutputs);
    for cost in &cost_funcs[1..] {
        if cost_target_cols(cost, noutputs) != width {
            return Err(LearnerError::bad_option(
                class,
                "cost_funcs",
                cost,
                format!("与{}要求的目标列数不同", cost_funcs[0]),
            ));
        }
    }
    Ok(width)
}

pub(crate) fn apply_transfer(graph: &mut Graph, x: NodeId, name: &str) -> Result<NodeId, GraphError> {
    match name {
        "" | "linear" => Ok(x),
        "tanh" => graph.new_tanh_node(x, None),
        "sigmoid" => graph.new_sigmoid_node(x, None),
        "softplus" => graph.new_softplus_node(x, None),
        "exp" => graph.new_exp_node(x, None),
        "softmax" => graph.new_softmax_node(x, None),
        "log_softmax" => graph.new_log_softmax_node(x, None),
        other => Err(GraphError::InvalidOperation(format!("未知的激活函数“{other}”"))),
    }
}

/// 逐行代价节点，输出[B, 1]
pub(crate) fn cost_node(
    graph: &mut Graph,
    output: NodeId,
    target: NodeId,
    cost: &str,
    margin: f64,
) -> Result<NodeId, GraphError> {
    match cost {
        "mse" => graph.new_squared_error_node(output, target, false, None),
        "mse_onehot" => graph.new_squared_error_node(output, target, true, None),
        "NLL" => graph.new_nll_node(output, target, None),
        "class_error" => graph.new_class_error_node(output, target, None),
        "cross_entropy" => graph.new_cross_entropy_node(output, target, None),
        "margin_perceptron_cost" => graph.new_margin_perceptron_node(output, target, margin, None),
        other => Err(GraphError::InvalidOperation(format!("未知的代价函数“{other}”"))),
    }
}

/// 训练统计的字段名：`[第一个代价+penalty, 各代价...]`
pub(crate) fn train_cost_names(cost_funcs: &[String]) -> Vec<String> {
    let mut names = Vec::with_capacity(cost_funcs.len() + 1);
    if let Some(first) = cost_funcs.first() {
        names.push(format!("{first}+penalty"));
    }
    names.extend(cost_funcs.iter().cloned());
    names
}

/// 一层的权重 [fan_in + 1, fan_out]：第 0 行是偏置（初始为 0），其余服从 U(-1/√fan_in, 1/√fan_in)
pub(crate) fn init_weights(rng: &mut StdRng, rows: usize, cols: usize) -> Tensor {
    let fan_in = rows.saturating_sub(1).max(1);
    let bound = 1.0 / (fan_in as f64).sqrt();
    let mut w = Tensor::uniform_with_rng(-bound, bound, &[rows, cols], rng);
    for c in 0..cols {
        w.set(0, c, 0.0);
    }
    w
}

/// 网络的代价部分
///
/// 训练路径：`output`与`target`算出各代价的逐行值，按样本权重求均值，
/// 第一个代价的均值加上权重惩罚即为优化目标。
/// 测试路径：`given_output`/`given_target`由调用方直接给值，算出逐行代价并按列拼接
#[derive(Debug, Clone)]
pub(crate) struct CostHead {
    pub target: NodeId,
    pub weights: NodeId,
    pub objective: NodeId,
    /// 优化目标在前，之后是各代价的均值
    pub stat_nodes: Vec<NodeId>,
    pub given_output: NodeId,
    pub given_target: NodeId,
    pub test_costs: NodeId,
}

pub(crate) struct HeadConfig<'a> {
    pub cost_funcs: &'a [String],
    pub margin: f64,
    pub weight_decay: f64,
    pub bias_decay: f64,
}

impl CostHead {
    pub(crate) fn attach(
        graph: &mut Graph,
        output: NodeId,
        target_width: usize,
        penalized: &[NodeId],
        config: &HeadConfig<'_>,
    ) -> Result<Self, GraphError> {
        let noutputs = graph.get_node_cols(output)?;
        let target = graph.new_input_node(target_width, Some("target"))?;
        let weights = graph.new_input_node(1, Some("weights"))?;

        let mut means = Vec::with_capacity(config.cost_funcs.len());
        for cost in config.cost_funcs {
            let per_row = cost_node(graph, output, target, cost, config.margin)?;
            means.push(graph.new_weighted_mean_node(per_row, Some(weights), Some(&format!("mean_{cost}")))?);
        }
        let penalty = graph.new_weight_penalty_node(
            penalized,
            config.weight_decay,
            config.bias_decay,
            Some("penalty"),
        )?;
        let objective = graph.new_add_node(means[0], penalty, Some("objective"))?;

        let given_output = graph.new_input_node(noutputs, Some("given_output"))?;
        let given_target = graph.new_input_node(target_width, Some("given_target"))?;
        let mut costs = Vec::with_capacity(config.cost_funcs.len());
        for cost in config.cost_funcs {
            costs.push(cost_node(graph, given_output, given_target, cost, config.margin)?);
        }
        let test_costs = graph.new_concat_node(&costs, Some("test_costs"))?;

        let mut stat_nodes = vec![objective];
        stat_nodes.extend(means);
        Ok(Self {
            target,
            weights,
            objective,
            stat_nodes,
            given_output,
            given_target,
            test_costs,
        })
    }

    /// 由给定的输出与目标计算逐行代价
    pub(crate) fn costs_from_outputs(
        &self,
        graph: &mut Graph,
        output: &Tensor,
        target: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let mut values = graph.evaluate(
            &[(self.given_output, output), (self.given_target, target)],
            &[self.test_costs],
        )?;
        values
            .pop()
            .ok_or_else(|| GraphError::ComputationError("代价节点没有值".to_string()))
    }
}

/// 每个阶段（一个 epoch）的步数；`batch_size`为 0 表示整个训练集为一个 batch
pub(crate) fn epoch_steps(len: usize, batch_size: usize) -> usize {
    if len == 0 {
        0
    } else if batch_size == 0 {
        1
    } else {
        len.div_ceil(batch_size)
    }
}

/// 依次取训练集中连续的 minibatch 绑定到图上，到末尾后从头开始
pub(crate) struct BatchFeed<'a> {
    train_set: &'a dyn VMat,
    input: NodeId,
    head: &'a CostHead,
    batch_size: usize,
    cursor: usize,
}

impl<'a> BatchFeed<'a> {
    pub(crate) fn new(train_set: &'a dyn VMat, input: NodeId, head: &'a CostHead, batch_size: usize) -> Self {
        Self {
            train_set,
            input,
            head,
            batch_size,
            cursor: 0,
        }
    }
}

impl TrainingFeed for BatchFeed<'_> {
    fn feed_next(&mut self, graph: &mut Graph) -> Result<f64, GraphError> {
        let len = self.train_set.length();
        if self.cursor >= len {
            self.cursor = 0;
        }
        let end = if self.batch_size == 0 {
            len
        } else {
            (self.cursor + self.batch_size).min(len)
        };
        let batch = self
            .train_set
            .get_batch(self.cursor, end)
            .map_err(|e| GraphError::InvalidOperation(e.to_string()))?;
        self.cursor = end;

        graph.set_node_value(self.input, &batch.inputs)?;
        graph.set_node_value(self.head.target, &batch.targets)?;
        graph.set_node_value(self.head.weights, &batch.weights)?;
        Ok(batch.total_weight())
    }

    fn stat_nodes(&self) -> &[NodeId] {
        &self.head.stat_nodes
    }
}
