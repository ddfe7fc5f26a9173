/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 级联相关（Cascade-Correlation）网络：从没有隐藏单元的网络开始，
 *                 每训练 candidate_stages 个阶段就加入一个新的隐藏单元，直到 max_hidden_units。
 *                 第 k 个单元以输入和此前全部单元的输出为输入；输出层看到输入与全部单元。
 *                 新单元与输出层一起训练，更早的单元保持冻结。
 */

use std::sync::OnceLock;

use log::{debug, info, warn};
use rand::rngs::StdRng;

use super::base::{self, PLearnerBase};
use super::net::{self, BatchFeed, CostHead, HeadConfig};
use super::{Learner, LearnerError};
use crate::declare_option;
use crate::nn::{Graph, NodeId, Optimizer, OptimizerKind};
use crate::object::{BuildState, Object, ObjectSpec, OptionFlags, OptionRegistry, OptionType};
use crate::tensor::Tensor;

const CLASS: &str = "CascadeCorrelation";

/// 由选项确定的网络结构（与参数取值无关）
#[derive(Debug, Clone)]
struct Architecture {
    inputsize: usize,
    noutputs: usize,
    target_width: usize,
    hidden_transfer_func: String,
    output_transfer_func: String,
    cost_funcs: Vec<String>,
    margin: f64,
    weight_decay: f64,
    bias_decay: f64,
}

impl Architecture {
    /// 参数依次为各隐藏单元的权重与输出层权重：单元 k（从 0 起）为 [inputsize + k + 1, 1]，
    /// 输出层为 [inputsize + 单元数 + 1, noutputs]
    fn check_params(&self, params: &[Tensor]) -> Result<(), LearnerError> {
        let Some((output, units)) = params.split_last() else {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "参数个数的下限",
                expected: 1,
                got: 0,
            });
        };
        for (k, w) in units.iter().enumerate() {
            let expected = [self.inputsize + k + 1, 1];
            if w.shape() != expected {
                return Err(LearnerError::LayoutMismatch {
                    class: CLASS.to_string(),
                    what: "隐藏单元权重的行数",
                    expected: expected[0],
                    got: w.rows(),
                });
            }
        }
        let expected = [self.inputsize + units.len() + 1, self.noutputs];
        if output.shape() != expected {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "输出层权重的行数",
                expected: expected[0],
                got: output.rows(),
            });
        }
        Ok(())
    }

    /// 没有隐藏单元的初始参数
    fn fresh_params(&self, rng: &mut StdRng) -> Vec<Tensor> {
        vec![net::init_weights(rng, self.inputsize + 1, self.noutputs)]
    }

    /// 加入一个隐藏单元：新单元的权重随机初始化，输出层为它新增一行 0 权重，网络函数因此保持不变
    fn grow(&self, params: &mut Vec<Tensor>, rng: &mut StdRng) -> Result<(), LearnerError> {
        let Some(output) = params.pop() else {
            return Err(LearnerError::not_configured(CLASS, "缺少输出层权重"));
        };
        let nunits = params.len();
        params.push(net::init_weights(rng, self.inputsize + nunits + 1, 1));
        params.push(Tensor::stack_rows(&[&output, &Tensor::zeros(&[1, self.noutputs])])?);
        Ok(())
    }

    fn build(&self, params: &[Tensor]) -> Result<CascadeNet, LearnerError> {
        self.check_params(params)?;
        let (output_w, unit_ws) = params
            .split_last()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "缺少输出层权重"))?;

        let mut graph = Graph::with_name(CLASS);
        let input = graph.new_input_node(self.inputsize, Some("input"))?;
        let mut features = vec![input];
        let mut units = Vec::with_capacity(unit_ws.len());
        for (k, w) in unit_ws.iter().enumerate() {
            let unit_in = features_node(&mut graph, &features)?;
            let w = graph.new_parameter_node(w, false, Some(&format!("unit{}", k + 1)))?;
            units.push(w);
            let a = graph.new_affine_node(unit_in, w, None)?;
            features.push(net::apply_transfer(&mut graph, a, &self.hidden_transfer_func)?);
        }

        let out_in = features_node(&mut graph, &features)?;
        let output_weights = graph.new_parameter_node(output_w, false, Some("output_weights"))?;
        let a = graph.new_affine_node(out_in, output_weights, None)?;
        let output = net::apply_transfer(&mut graph, a, &self.output_transfer_func)?;

        let mut penalized = units.clone();
        penalized.push(output_weights);
        let head = CostHead::attach(
            &mut graph,
            output,
            self.target_width,
            &penalized,
            &HeadConfig {
                cost_funcs: &self.cost_funcs,
                margin: self.margin,
                weight_decay: self.weight_decay,
                bias_decay: self.bias_decay,
            },
        )?;
        Ok(CascadeNet {
            arch: self.clone(),
            graph,
            input,
            output,
            units,
            output_weights,
            head,
        })
    }
}

/// 只有输入时直接用输入，否则把输入与各单元输出按列拼接
fn features_node(graph: &mut Graph, features: &[NodeId]) -> Result<NodeId, LearnerError> {
    Ok(match features {
        [only] => *only,
        _ => graph.new_concat_node(features, None)?,
    })
}

#[derive(Debug, Clone)]
struct CascadeNet {
    arch: Architecture,
    graph: Graph,
    input: NodeId,
    output: NodeId,
    /// 各隐藏单元的输入权重，按加入的顺序
    units: Vec<NodeId>,
    output_weights: NodeId,
    head: CostHead,
}

impl CascadeNet {
    fn param_values(&self) -> Vec<Tensor> {
        self.units
            .iter()
            .chain(std::iter::once(&self.output_weights))
            .filter_map(|&p| self.graph.get_node_value(p).ok().flatten().cloned())
            .collect()
    }

    /// 参与训练的参数：最新的隐藏单元与输出层
    fn trainable(&self) -> Vec<NodeId> {
        self.units
            .last()
            .into_iter()
            .chain(std::iter::once(&self.output_weights))
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CascadeCorrelation {
    pub(crate) base: PLearnerBase,
    pub max_hidden_units: usize,
    /// 每个隐藏单元（以及加入第一个单元之前的输出层）训练的阶段数
    pub candidate_stages: usize,
    /// 输出维数，0 表示取 targetsize
    pub noutputs: usize,
    pub hidden_transfer_func: String,
    pub output_transfer_func: String,
    pub cost_funcs: Vec<String>,
    pub margin: f64,
    pub weight_decay: f64,
    pub bias_decay: f64,
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    net: Option<CascadeNet>,
}

impl Default for CascadeCorrelation {
    fn default() -> Self {
        Self {
            base: PLearnerBase::default(),
            max_hidden_units: 3,
            candidate_stages: 5,
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

impl CascadeCorrelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前的隐藏单元数
    pub fn nunits(&self) -> usize {
        self.net.as_ref().map_or(0, |n| n.units.len())
    }

    pub fn param_values(&self) -> Vec<Tensor> {
        self.net.as_ref().map(CascadeNet::param_values).unwrap_or_default()
    }

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

    fn install(&mut self, built: CascadeNet) {
        self.optimizer.set_to_optimize(&built.trainable(), built.head.objective);
        self.net = Some(built);
    }

    /// 用给定的参数（隐藏单元数由参数个数决定）重建网络
    fn restore_params(&mut self, params: &[Tensor]) -> Result<(), LearnerError> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "输入尺寸尚未确定"))?;
        let built = net.arch.build(params)?;
        self.install(built);
        Ok(())
    }
}

impl Object for CascadeCorrelation {
    type Error = LearnerError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<CascadeCorrelation>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::<Self>::new(CLASS);
            reg.inherit(PLearnerBase::registry(), |l| &l.base, |l| &mut l.base);
            declare_option!(reg, CascadeCorrelation, max_hidden_units, OptionFlags::BUILD, "隐藏单元数的上限");
            declare_option!(
                reg,
                CascadeCorrelation,
                candidate_stages,
                OptionFlags::BUILD,
                "每加入一个隐藏单元之前训练的阶段数"
            );
            declare_option!(reg, CascadeCorrelation, noutputs, OptionFlags::BUILD, "输出维数，0表示取targetsize");
            declare_option!(
                reg,
                CascadeCorrelation,
                hidden_transfer_func,
                OptionFlags::BUILD,
                "隐藏单元的激活函数"
            );
            declare_option!(
                reg,
                CascadeCorrelation,
                output_transfer_func,
                OptionFlags::BUILD,
                "输出层的激活函数"
            );
            declare_option!(reg, CascadeCorrelation, cost_funcs, OptionFlags::BUILD, "代价函数列表，第一个用于训练");
            declare_option!(reg, CascadeCorrelation, margin, OptionFlags::BUILD, "margin_perceptron_cost的间隔");
            declare_option!(reg, CascadeCorrelation, weight_decay, OptionFlags::BUILD, "权重的L2惩罚系数");
            declare_option!(reg, CascadeCorrelation, bias_decay, OptionFlags::BUILD, "偏置的L2惩罚系数");
            declare_option!(reg, CascadeCorrelation, batch_size, OptionFlags::BUILD, "每步的样本数，0表示整个训练集");
            declare_option!(reg, CascadeCorrelation, optimizer, OptionFlags::BUILD, "训练所用的优化器");
            reg.declare_with(
                "params",
                |l: &CascadeCorrelation| l.param_values().to_option_value(),
                |l: &mut CascadeCorrelation, value| {
                    let values = Vec::<Tensor>::from_option_value(value)?;
                    l.restore_params(&values).map_err(|e| e.to_string())
                },
                OptionFlags::LEARNT,
                "学到的权重：各隐藏单元依次排列，最后是输出层",
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
        if self.candidate_stages == 0 {
            return Err(LearnerError::bad_option(CLASS, "candidate_stages", 0, "须为正整数"));
        }
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

        let arch = Architecture {
            inputsize: self.base.inputsize,
            noutputs,
            target_width,
            hidden_transfer_func: self.hidden_transfer_func.clone(),
            output_transfer_func: self.output_transfer_func.clone(),
            cost_funcs: self.cost_funcs.clone(),
            margin: self.margin,
            weight_decay: self.weight_decay,
            bias_decay: self.bias_decay,
        };
        let kept = self
            .net
            .as_ref()
            .map(CascadeNet::param_values)
            .filter(|old| arch.check_params(old).is_ok());
        let params = match kept {
            Some(params) => params,
            None => {
                self.base.reset();
                self.optimizer.reset();
                arch.fresh_params(&mut self.base.rng)
            }
        };
        let built = arch.build(&params)?;
        self.install(built);
        Ok(())
    }

    fn has_learnt_state(&self) -> bool {
        self.base.stage > 0
    }
}

impl Learner for CascadeCorrelation {
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

    /// 去掉全部隐藏单元，输出层按种子重新初始化
    fn forget(&mut self) -> Result<(), LearnerError> {
        self.base.reset();
        self.optimizer.reset();
        if let Some(net) = self.net.as_ref() {
            let arch = net.arch.clone();
            let built = arch.build(&arch.fresh_params(&mut self.base.rng))?;
            self.install(built);
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
        let (candidate_stages, max_units, batch_size) =
            (self.candidate_stages, self.max_hidden_units, self.batch_size);
        let net = self
            .net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
        let optimizer = &mut self.optimizer;
        self.base.run_stages(CLASS, &names, |ctx| {
            let wanted = (ctx.stage / candidate_stages).min(max_units);
            while net.units.len() < wanted {
                let mut params = net.param_values();
                net.arch.grow(&mut params, ctx.rng)?;
                *net = net.arch.build(&params)?;
                optimizer.set_to_optimize(&net.trainable(), net.head.objective);
                info!("{CLASS}在第{}阶段加入第{}个隐藏单元", ctx.stage, net.units.len());
            }

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
        let net = self
            .net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
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
        let net = self
            .net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
        Ok(net.head.costs_from_outputs(&mut net.graph, output, target)?)
    }
}
