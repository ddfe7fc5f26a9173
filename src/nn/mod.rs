/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 自动微分：计算图、节点规则与基于梯度的优化器
 */

mod descriptor;
mod graph;
mod nodes;
pub mod optimizer;

#[cfg(test)]
mod tests;

pub use descriptor::{GraphDescriptor, NodeDescriptor};
pub use graph::{Graph, GraphError};
pub use nodes::{BagCombiner, NodeId};
pub use optimizer::{Adam, GradientOptimizer, Optimizer, OptimizerKind, TrainingFeed};
