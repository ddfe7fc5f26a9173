/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Adam优化器实现
 */

use std::collections::HashMap;
use std::sync::OnceLock;

use super::base::{for_each_updated_row, Optimizer, OptimizerState, TrainingFeed};
use crate::declare_option;
use crate::nn::{Graph, GraphError, NodeId};
use crate::object::{BuildState, Object, OptionFlags, OptionRegistry};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub nstages: usize,
    state: OptimizerState,
    /// 一阶矩估计
    m: HashMap<NodeId, Tensor>,
    /// 二阶矩估计
    v: HashMap<NodeId, Tensor>,
    /// 时间步
    t: usize,
    build_state: BuildState,
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            nstages: 1,
            state: OptimizerState::default(),
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
            build_state: BuildState::Built,
        }
    }
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..Self::default()
        }
    }

    fn step(&mut self, graph: &mut Graph) -> Result<(), GraphError> {
        self.t += 1;
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let bias1 = 1.0 - beta1.powi(self.t as i32);
        let bias2 = 1.0 - beta2.powi(self.t as i32);

        for &param in self.state.params() {
            let Some(shape) = graph.get_node_value(param)?.map(|v| v.shape().to_vec()) else {
                continue;
            };
            let m = self.m.entry(param).or_insert_with(|| Tensor::zeros(&shape));
            let v = self.v.entry(param).or_insert_with(|| Tensor::zeros(&shape));
            graph.update_parameter(param, |value, grad, touched| {
                let cols = value.cols();
                for_each_updated_row(value.rows(), touched, |r| {
                    for c in 0..cols {
                        let g = grad.get(r, c);
                        let m_rc = beta1 * m.get(r, c) + (1.0 - beta1) * g;
                        let v_rc = beta2 * v.get(r, c) + (1.0 - beta2) * g * g;
                        m.set(r, c, m_rc);
                        v.set(r, c, v_rc);
                        let update = lr * (m_rc / bias1) / ((v_rc / bias2).sqrt() + eps);
                        value.set(r, c, value.get(r, c) - update);
                    }
                });
            })?;
        }
        Ok(())
    }
}

impl Optimizer for Adam {
    fn set_to_optimize(&mut self, params: &[NodeId], objective: NodeId) {
        self.state.set(params, objective);
        self.reset();
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
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn nstages(&self) -> usize {
        self.nstages
    }

    fn set_nstages(&mut self, nstages: usize) {
        self.nstages = nstages;
    }
}

impl Object for Adam {
    type Error = GraphError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<Adam>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("Adam");
            declare_option!(reg, Adam, learning_rate, OptionFlags::BUILD, "学习率");
            declare_option!(reg, Adam, beta1, OptionFlags::BUILD, "一阶矩的衰减率");
            declare_option!(reg, Adam, beta2, OptionFlags::BUILD, "二阶矩的衰减率");
            declare_option!(reg, Adam, epsilon, OptionFlags::BUILD, "数值稳定项");
            declare_option!(reg, Adam, nstages, OptionFlags::BUILD, "每次optimize_n执行的步数");
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
        let betas_ok = (0.0..1.0).contains(&self.beta1) && (0.0..1.0).contains(&self.beta2);
        if !(self.learning_rate > 0.0) || !betas_ok || !(self.epsilon > 0.0) {
            return Err(GraphError::InvalidOperation(format!(
                "Adam的选项不合法：learning_rate={}, beta1={}, beta2={}, epsilon={}",
                self.learning_rate, self.beta1, self.beta2, self.epsilon
            )));
        }
        Ok(())
    }
}
