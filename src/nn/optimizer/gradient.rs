/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 随机梯度下降，学习率随步数衰减：lr_t = start_learning_rate / (1 + decrease_constant * t)
 */

use std::sync::OnceLock;

use super::base::{for_each_updated_row, Optimizer, OptimizerState, TrainingFeed};
use crate::declare_option;
use crate::nn::{Graph, GraphError, NodeId};
use crate::object::{BuildState, Object, OptionFlags, OptionRegistry};
use crate::stats::VecStatsCollector;

#[derive(Debug, Clone)]
pub struct GradientOptimizer {
    pub start_learning_rate: f64,
    pub decrease_constant: f64,
    pub nstages: usize,
    /// 自上次`reset`以来已执行的步数
    iteration: usize,
    state: OptimizerState,
    build_state: BuildState,
}

impl Default for GradientOptimizer {
    fn default() -> Self {
        Self {
            start_learning_rate: 0.01,
            decrease_constant: 0.0,
            nstages: 1,
            iteration: 0,
            state: OptimizerState::default(),
            build_state: BuildState::Built,
        }
    }
}

impl GradientOptimizer {
    pub fn new(start_learning_rate: f64, decrease_constant: f64) -> Self {
        Self {
            start_learning_rate,
            decrease_constant,
            ..Self::default()
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.start_learning_rate / (1.0 + self.decrease_constant * self.iteration as f64)
    }

    fn step(&mut self, graph: &mut Graph) -> Result<(), GraphError> {
        let lr = self.learning_rate();
        for &param in self.state.params() {
            graph.update_parameter(param, |value, grad, touched| {
                let cols = value.cols();
                for_each_updated_row(value.rows(), touched, |r| {
                    for c in 0..cols {
                        value.set(r, c, value.get(r, c) - lr * grad.get(r, c));
                    }
                });
            })?;
        }
        self.iteration += 1;
        Ok(())
    }
}

impl Optimizer for GradientOptimizer {
    fn set_to_optimize(&mut self, params: &[NodeId], objective: NodeId) {
        self.state.set(params, objective);
    }

    fn optimize_n(
        &mut self,
        graph: &mut Graph,
        feed: &mut dyn TrainingFeed,
        stats: &mut VecStatsCollector,
    ) -> Result<bool, GraphError> {
        for _ in 0..self.nstages {
            self.state.forward_backward(graph, feed, stats)?;
            self.step(graph)?;
        }
        Ok(false)
    }

    fn reset(&mut self) {
        self.iteration = 0;
    }

    fn nstages(&self) -> usize {
        self.nstages
    }

    fn set_nstages(&mut self, nstages: usize) {
        self.nstages = nstages;
    }
}

impl Object for GradientOptimizer {
    type Error = GraphError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<GradientOptimizer>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("GradientOptimizer");
            declare_option!(reg, GradientOptimizer, start_learning_rate, OptionFlags::BUILD, "初始学习率");
            declare_option!(
                reg,
                GradientOptimizer,
                decrease_constant,
                OptionFlags::BUILD,
                "学习率衰减常数：lr = start_learning_rate / (1 + decrease_constant * t)"
            );
            declare_option!(reg, GradientOptimizer, nstages, OptionFlags::BUILD, "每次optimize_n执行的步数");
            reg
        })
    }

    fn build_state(&self) -> BuildState {
        self.build_state
    }

    fn set_build_state(&mut self, state: BuildState) {
        self.build_state = state;
    }

    fn build_(&mut self) -> Result<(), GraphError> {
        if !(self.start_learning_rate > 0.0) || self.decrease_constant < 0.0 {
            return Err(GraphError::InvalidOperation(format!(
                "GradientOptimizer的学习率须为正数、衰减常数须非负，实际为{}和{}",
                self.start_learning_rate, self.decrease_constant
            )));
        }
        Ok(())
    }
}
