/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 多层感知机：0~2个隐藏层，可选的输出激活函数与若干代价函数，
 *                 以第一个代价（加上权重惩罚）为优化目标，用可配置的优化器按 minibatch 训练
 */

use std::sync::OnceLock;

use log::{debug, warn};

use super::base::{self, PLearnerBase};
use super::net::{self, BatchFeed, CostHead, HeadConfig};
use super::{Learner, LearnerError};
use crate::declare_option;
use crate::nn::{Graph, NodeId, Optimizer, OptimizerKind};
use crate::object::{BuildState, Object, ObjectSpec, OptionFlags, OptionRegistry, OptionType};
use crate::tensor::Tensor;

const CLASS: &str = "NNet";

/// 构建好的网络
#[derive(Debug, Clone)]
struct NetGraph {
    graph: Graph,
    input: NodeId,
    output: NodeId,
    /// 各层权重，按从输入到输出的顺序
    params: Vec<NodeId>,
    head: CostHead,
}

impl NetGraph {
    fn param_values(&self) -> Vec<Tensor> {
        self.params
            .iter()
            .filter_map(|&p| self.graph.get_node_value(p).ok().flatten().cloned())
            .collect()
    }

    fn set_param_values(&mut self, values: &[Tensor]) -> Result<(), LearnerError> {
        if values.len() != self.params.len() {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "参数层数",
                expected: self.params.len(),
                got: values.len(),
            });
        }
        for (&p, value) in self.params.iter().zip(values) {
            self.graph.set_node_value(p, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NNet {
    pub(crate) base: PLearnerBase,
    /// 第一个隐藏层的单元数（0 表示没有隐藏层）
    pub nhidden: usize,
    /// 第二个隐藏层的单元数（仅在`nhidden > 0`时有效）
    pub nhidden2: usize,
    /// 输出维数，0 表示取 targetsize
    pub noutputs: usize,
    pub hidden_transfer_func: String,
    pub output_transfer_func: String,
    pub cost_funcs: Vec<String>,
    pub margin: f64,
    pub weight_decay: f64,
    pub bias_decay: f64,
    /// 每步的样本数，0 表示整个训练集
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    net: Option<NetGraph>,
}

impl Default for NNet {
    fn default() -> Self {
        Self {
            base: PLearnerBase::default(),
            nhidden: 0,
            nhidden2: 0,
            noutputs: 0,
            hidden_transfer_func: "tanh".to_string(),
            output_transfer_func: String::new(),
            cost_funcs: vec!["mse".to_string()],
            margin: 1.0,
            weight_decay: 0.0,
            bias_decay: 0.0,
            batch_size: 1,
            optimizer: OptimizerKind::default(),
            net: None,
        }
    }
}

impl NNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前各层权重（未配置时为空）
    pub fn param_values(&self) -> Vec<Tensor> {
        self.net.as_ref().map(NetGraph::param_values).unwrap_or_default()
    }

    /// 网络的计算图（未配置时为`None`）
    pub fn graph(&self) -> Option<&Graph> {
        self.net.as_ref().map(|n| &n.graph)
    }

    fn effective_noutputs(&self) -> usize {
        if self.noutputs > 0 {
            self.noutputs
        } else {
            self.base.targetsize
        }
    }

    /// 各层权重的形状（含偏置行）
    fn layer_shapes(&self, noutputs: usize) -> Vec<(usize, usize)> {
        let mut sizes = vec![self.base.inputsize];
        if self.nhidden > 0 {
            sizes.push(self.nhidden);
            if self.nhidden2 > 0 {
                sizes.push(self.nhidden2);
            }
        }
        sizes.push(noutputs);
        sizes.windows(2).map(|w| (w[0] + 1, w[1])).collect()
    }

    fn build_graph(&self, params: &[Tensor], target_width: usize) -> Result<NetGraph, LearnerError> {
        let mut graph = Graph::with_name(CLASS);
        let input = graph.new_input_node(self.base.inputsize, Some("input"))?;

        let mut x = input;
        let mut param_nodes = Vec::with_capacity(params.len());
        let last = params.len() - 1;
        for (i, w) in params.iter().enumerate() {
            let w = graph.new_parameter_node(w, false, Some(&format!("w{}", i + 1)))?;
            param_nodes.push(w);
            let a = graph.new_affine_node(x, w, None)?;
            x = if i == last {
                net::apply_transfer(&mut graph, a, &self.output_transfer_func)?
            } else {
                net::apply_transfer(&mut graph, a, &self.hidden_transfer_func)?
            };
        }
        let output = x;

        let head = CostHead::attach(
            &mut graph,
            output,
            target_width,
            &param_nodes,
            &HeadConfig {
                cost_funcs: &self.cost_funcs,
                margin: self.margin,
                weight_decay: self.weight_decay,
                bias_decay: self.bias_decay,
            },
        )?;
        Ok(NetGraph {
            graph,
            input,
            output,
            params: param_nodes,
            head,
        })
    }

    fn net_mut(&mut self) -> Result<&mut NetGraph, LearnerError> {
        self.net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "输入尺寸尚未确定，需先绑定训练集或设置inputsize"))
    }
}

impl Object for NNet {
    type Error = LearnerError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<NNet>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::<Self>::new(CLASS);
            reg.inherit(PLearnerBase::registry(), |l| &l.base, |l| &mut l.base);
            declare_option!(reg, NNet, nhidden, OptionFlags::BUILD, "第一个隐藏层的单元数，0表示没有隐藏层");
            declare_option!(reg, NNet, nhidden2, OptionFlags::BUILD, "第二个隐藏层的单元数");
            declare_option!(reg, NNet, noutputs, OptionFlags::BUILD, "输出维数，0表示取targetsize");
            declare_option!(reg, NNet, hidden_transfer_func, OptionFlags::BUILD, "隐藏层的激活函数");
            declare_option!(reg, NNet, output_transfer_func, OptionFlags::BUILD, "输出层的激活函数，空串表示线性");
            declare_option!(
                reg,
                NNet,
                cost_funcs,
                OptionFlags::BUILD,
                "代价函数列表，第一个用于训练"
            );
            declare_option!(reg, NNet, margin, OptionFlags::BUILD, "margin_perceptron_cost的间隔");
            declare_option!(reg, NNet, weight_decay, OptionFlags::BUILD, "权重的L2惩罚系数");
            declare_option!(reg, NNet, bias_decay, OptionFlags::BUILD, "偏置的L2惩罚系数");
            declare_option!(reg, NNet, batch_size, OptionFlags::BUILD, "每步的样本数，0表示整个训练集");
            declare_option!(reg, NNet, optimizer, OptionFlags::BUILD, "训练所用的优化器");
            reg.declare_with(
                "params",
                |l: &NNet| l.param_values().to_option_value(),
                |l: &mut NNet, value| {
                    let values = Vec::<Tensor>::from_option_value(value)?;
                    l.net_mut()
                        .and_then(|n| n.set_param_values(&values))
                        .map_err(|e| e.to_string())
                },
                OptionFlags::LEARNT,
                "学到的各层权重，每层第0行为偏置",
            );
            reg
        })
    }

    fn build_state(&self) -> BuildState {
        self.base.build_state
    }

    fn set_build_state(&mut self, state: BuildState) {
        self.base.build_state = state;
    }

    fn build_(&mut self) -> Result<(), LearnerError> {
        self.base.build_(CLASS)?;
        net::check_costs(CLASS, &self.cost_funcs)?;
        net::check_transfer(CLASS, "hidden_transfer_func", &self.hidden_transfer_func)?;
        net::check_transfer(CLASS, "output_transfer_func", &self.output_transfer_func)?;
        if self.weight_decay < 0.0 || self.bias_decay < 0.0 {
            return Err(LearnerError::bad_option(
                CLASS,
                "weight_decay",
                self.weight_decay,
                "惩罚系数须非负",
            ));
        }

        let noutputs = self.effective_noutputs();
        if self.base.inputsize == 0 || noutputs == 0 {
            debug!("{CLASS}的输入/输出尺寸尚未确定，暂不构建网络");
            self.net = None;
            return Ok(());
        }
        let target_width = net::target_width(CLASS, &self.cost_funcs, noutputs)?;
        if self.base.targetsize != target_width {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "targetsize",
                expected: target_width,
                got: self.base.targetsize,
            });
        }

        // 形状不变时沿用已有参数，重复build不会改变学到的状态
        let shapes = self.layer_shapes(noutputs);
        let kept = self.net.as_ref().map(NetGraph::param_values).filter(|old| {
            old.len() == shapes.len() && old.iter().zip(&shapes).all(|(t, &(r, c))| t.shape() == [r, c])
        });
        let params = match kept {
            Some(params) => params,
            None => {
                self.base.reset();
                self.optimizer.reset();
                shapes
                    .iter()
                    .map(|&(r, c)| net::init_weights(&mut self.base.rng, r, c))
                    .collect()
            }
        };
        let built = self.build_graph(&params, target_width)?;
        self.optimizer.set_to_optimize(&built.params, built.head.objective);
        self.net = Some(built);
        Ok(())
    }

    fn has_learnt_state(&self) -> bool {
        self.base.stage > 0
    }
}

impl Learner for NNet {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn base(&self) -> &PLearnerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PLearnerBase {
        &mut self.base
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), LearnerError> {
        base::set_option_and_rebuild(self, name, value)
    }

    fn get_option(&self, name: &str) -> Result<String, LearnerError> {
        base::get_option(self, name)
    }

    fn to_spec(&self) -> ObjectSpec {
        base::to_spec(self)
    }

    fn rebuild(&mut self) -> Result<(), LearnerError> {
        self.build()
    }

    fn output_size(&self) -> usize {
        self.effective_noutputs()
    }

    fn get_test_cost_names(&self) -> Vec<String> {
        self.cost_funcs.clone()
    }

    fn get_train_cost_names(&self) -> Vec<String> {
        net::train_cost_names(&self.cost_funcs)
    }

    fn forget(&mut self) -> Result<(), LearnerError> {
        self.base.reset();
        self.optimizer.reset();
        let Self { base, net, .. } = self;
        if let Some(net) = net.as_mut() {
            let fresh: Vec<Tensor> = net
                .param_values()
                .iter()
                .map(|w| net::init_weights(&mut base.rng, w.rows(), w.cols()))
                .collect();
            net.set_param_values(&fresh)?;
        }
        Ok(())
    }

    fn train(&mut self) -> Result<(), LearnerError> {
        self.ensure_built()?;
        self.base.check_can_train(CLASS)?;
        if self.base.stage > self.base.nstages {
            warn!(
                "{CLASS}的stage({})已超过nstages({})，从头重新训练",
                self.base.stage, self.base.nstages
            );
            self.forget()?;
        }

        let names = self.get_train_cost_names();
        let batch_size = self.batch_size;
        let net = self
            .net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
        let optimizer = &mut self.optimizer;
        self.base.run_stages(CLASS, &names, |ctx| {
            let len = ctx.train_set.length();
            if len == 0 {
                warn!("{CLASS}的训练集为空，第{}阶段不做任何更新", ctx.stage);
            }
            optimizer.set_nstages(net::epoch_steps(len, batch_size));
            let mut feed = BatchFeed::new(ctx.train_set.as_ref(), net.input, &net.head, batch_size);
            Ok(optimizer.optimize_n(&mut net.graph, &mut feed, ctx.stats)?)
        })
    }

    fn compute_output(&mut self, input: &Tensor) -> Result<Tensor, LearnerError> {
        self.ensure_built()?;
        let net = self.net_mut()?;
        let mut values = net.graph.evaluate(&[(net.input, input)], &[net.output])?;
        values
            .pop()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "输出节点没有值"))
    }

    fn compute_costs_from_outputs(
        &mut self,
        _input: &Tensor,
        output: &Tensor,
        target: &Tensor,
    ) -> Result<Tensor, LearnerError> {
        self.ensure_built()?;
        let net = self.net_mut()?;
        Ok(net.head.costs_from_outputs(&mut net.graph, output, target)?)
    }
}
