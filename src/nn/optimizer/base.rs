use enum_dispatch::enum_dispatch;
use log::trace;

use crate::nn::{Graph, GraphError, NodeId};
use crate::stats::VecStatsCollector;

/// 为优化器的每一步提供数据的一方（通常是学习器）
pub trait TrainingFeed {
    /// 把下一个 (mini)batch 绑定到图的输入节点上，返回该 batch 的样本权重之和
    fn feed_next(&mut self, graph: &mut Graph) -> Result<f64, GraphError>;

    /// 每一步都要记录到统计中的标量节点，第一个必须是优化目标
    fn stat_nodes(&self) -> &[NodeId];
}

/// 优化器核心 trait
#[enum_dispatch]
pub trait Optimizer {
    /// 指定要优化的参数节点和标量目标节点
    fn set_to_optimize(&mut self, params: &[NodeId], objective: NodeId);

    /// 执行`nstages`步优化，每步的统计量累积进`stats`。返回是否建议提前停止
    fn optimize_n(
        &mut self,
        graph: &mut Graph,
        feed: &mut dyn TrainingFeed,
        stats: &mut VecStatsCollector,
    ) -> Result<bool, GraphError>;

    /// 重置累积状态（步数、动量等）
    fn reset(&mut self);

    /// 每次`optimize_n`执行的步数
    fn nstages(&self) -> usize;

    fn set_nstages(&mut self, nstages: usize);
}

/// 优化器的共同状态
#[derive(Debug, Clone, Default)]
pub(crate) struct OptimizerState {
    params: Vec<NodeId>,
    objective: Option<NodeId>,
}

impl OptimizerState {
    pub(crate) fn set(&mut self, params: &[NodeId], objective: NodeId) {
        self.params = params.to_vec();
        self.objective = Some(objective);
    }

    pub(crate) fn params(&self) -> &[NodeId] {
        &self.params
    }

    /// 一步中与具体更新规则无关的部分：清梯度、取数据、前向、记录统计、反向
    pub(crate) fn forward_backward(
        &self,
        graph: &mut Graph,
        feed: &mut dyn TrainingFeed,
        stats: &mut VecStatsCollector,
    ) -> Result<(), GraphError> {
        let objective = self.objective.ok_or_else(|| {
            GraphError::InvalidOperation("优化前需先调用set_to_optimize".to_string())
        })?;

        graph.clear_gradients();
        let weight = feed.feed_next(graph)?;
        let stat_nodes = feed.stat_nodes().to_vec();
        if stat_nodes.first() != Some(&objective) {
            return Err(GraphError::InvalidOperation(
                "统计节点的第一个必须是优化目标".to_string(),
            ));
        }
        graph.fprop(&stat_nodes)?;

        let mut values = Vec::with_capacity(stat_nodes.len());
        for &node in &stat_nodes {
            let value = graph
                .get_node_value(node)?
                .and_then(|v| v.number())
                .ok_or_else(|| {
                    GraphError::InvalidOperation(format!("统计节点{node}的值不是标量"))
                })?;
            values.push(value);
        }
        if !values[0].is_finite() {
            return Err(GraphError::ComputationError(format!(
                "优化目标的值为{}，训练发散",
                values[0]
            )));
        }
        trace!("目标值 = {}，batch权重 = {weight}", values[0]);
        stats
            .update(&values, weight)
            .map_err(|e| GraphError::ComputationError(e.to_string()))?;

        graph.bprop(objective)
    }
}

/// 对参数的（部分）行执行逐元素更新
pub(crate) fn for_each_updated_row<F>(
    rows: usize,
    touched: Option<&std::collections::BTreeSet<usize>>,
    mut f: F,
) where
    F: FnMut(usize),
{
    match touched {
        Some(touched) => touched.iter().copied().filter(|&r| r < rows).for_each(&mut f),
        None => (0..rows).for_each(f),
    }
}
