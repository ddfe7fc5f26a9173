/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 多实例神经网络：每个实例经一个隐藏层得到 sigmoid 概率，
 *                 同一个包内的实例概率用 noisy-OR（或 max）合并为包的概率。
 *                 目标为两列：[包的类别(0/1), 包标记]；每个优化步处理一个完整的包。
 */

use std::ops::Range;
use std::sync::OnceLock;

use log::{debug, warn};

use super::bag::{BagBuffer, BagTag, split_bags};
use super::base::{self, PLearnerBase};
use super::net::{self, CostHead, HeadConfig};
use super::{Learner, LearnerError};
use crate::data::VMat;
use crate::declare_option;
use crate::nn::{BagCombiner, Graph, GraphError, NodeId, Optimizer, OptimizerKind, TrainingFeed};
use crate::object::{BuildState, Object, ObjectSpec, OptionFlags, OptionRegistry, OptionType};
use crate::tensor::Tensor;

const CLASS: &str = "MultiInstanceNNet";
/// 目标的两列：类别、包标记
const TARGETSIZE: usize = 2;

fn test_cost_names() -> Vec<String> {
    vec!["NLL".to_string(), "class_error".to_string()]
}

#[derive(Debug, Clone)]
struct BagNet {
    graph: Graph,
    input: NodeId,
    /// 逐实例概率 [n, 1]
    instance_output: NodeId,
    params: Vec<NodeId>,
    head: CostHead,
    /// 测试时由缓存的实例概率求包的概率
    given_instances: NodeId,
    given_bag: NodeId,
}

impl BagNet {
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
pub struct MultiInstanceNNet {
    pub(crate) base: PLearnerBase,
    /// 隐藏层单元数（0 表示实例概率直接由输入线性变换得到）
    pub nhidden: usize,
    pub hidden_transfer_func: String,
    /// "noisy_or" 或 "max"
    pub bag_combiner: String,
    pub weight_decay: f64,
    pub bias_decay: f64,
    pub optimizer: OptimizerKind,
    net: Option<BagNet>,
    /// 测试时尚未结束的包
    test_bag: BagBuffer,
}

impl Default for MultiInstanceNNet {
    fn default() -> Self {
        Self {
            base: PLearnerBase::default(),
            nhidden: 0,
            hidden_transfer_func: "tanh".to_string(),
            bag_combiner: "noisy_or".to_string(),
            weight_decay: 0.0,
            bias_decay: 0.0,
            optimizer: OptimizerKind::default(),
            net: None,
            test_bag: BagBuffer::new(),
        }
    }
}

impl MultiInstanceNNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param_values(&self) -> Vec<Tensor> {
        self.net.as_ref().map(BagNet::param_values).unwrap_or_default()
    }

    fn combiner(&self) -> Result<BagCombiner, LearnerError> {
        match self.bag_combiner.as_str() {
            "noisy_or" => Ok(BagCombiner::NoisyOr),
            "max" => Ok(BagCombiner::Max),
            other => Err(LearnerError::bad_option(
                CLASS,
                "bag_combiner",
                other,
                "可选值为noisy_or与max",
            )),
        }
    }

    fn layer_shapes(&self) -> Vec<(usize, usize)> {
        let inputsize = self.base.inputsize;
        if self.nhidden > 0 {
            vec![(inputsize + 1, self.nhidden), (self.nhidden + 1, 1)]
        } else {
            vec![(inputsize + 1, 1)]
        }
    }

    fn build_graph(&self, params: &[Tensor], combiner: BagCombiner) -> Result<BagNet, LearnerError> {
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
                graph.new_sigmoid_node(a, Some("instance_output"))?
            } else {
                net::apply_transfer(&mut graph, a, &self.hidden_transfer_func)?
            };
        }
        let instance_output = x;
        let bag_output = graph.new_bag_reduce_node(instance_output, combiner, Some("bag_output"))?;

        let costs = test_cost_names();
        let head = CostHead::attach(
            &mut graph,
            bag_output,
            1,
            &param_nodes,
            &HeadConfig {
                cost_funcs: &costs,
                margin: 0.0,
                weight_decay: self.weight_decay,
                bias_decay: self.bias_decay,
            },
        )?;
        let given_instances = graph.new_input_node(1, Some("given_instances"))?;
        let given_bag = graph.new_bag_reduce_node(given_instances, combiner, Some("given_bag"))?;
        Ok(BagNet {
            graph,
            input,
            instance_output,
            params: param_nodes,
            head,
            given_instances,
            given_bag,
        })
    }

    fn net_mut(&mut self) -> Result<&mut BagNet, LearnerError> {
        self.net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "输入尺寸尚未确定，需先绑定训练集或设置inputsize"))
    }
}

/// 每步把训练集中的一个包绑定到图上
struct BagFeed<'a> {
    train_set: &'a dyn VMat,
    bags: &'a [Range<usize>],
    input: NodeId,
    head: &'a CostHead,
    cursor: usize,
}

impl TrainingFeed for BagFeed<'_> {
    fn feed_next(&mut self, graph: &mut Graph) -> Result<f64, GraphError> {
        if self.bags.is_empty() {
            return Err(GraphError::InvalidOperation("训练集中没有完整的包".to_string()));
        }
        if self.cursor >= self.bags.len() {
            self.cursor = 0;
        }
        let bag = &self.bags[self.cursor];
        self.cursor += 1;
        let batch = self
            .train_set
            .get_batch(bag.start, bag.end)
            .map_err(|e| GraphError::InvalidOperation(e.to_string()))?;

        // 包的类别与权重取自包的最后一行
        let last = batch.len() - 1;
        let class = batch.targets.get(last, 0);
        let weight = batch.weights.get(last, 0);
        graph.set_node_value(self.input, &batch.inputs)?;
        graph.set_node_value(self.head.target, &Tensor::scalar(class))?;
        graph.set_node_value(self.head.weights, &Tensor::scalar(weight))?;
        Ok(weight)
    }

    fn stat_nodes(&self) -> &[NodeId] {
        &self.head.stat_nodes
    }
}

/// 读出训练集的包标记列并切分出各个包
fn train_bags(train_set: &dyn VMat) -> Result<Vec<Range<usize>>, LearnerError> {
    let tag_col = train_set.inputsize() + TARGETSIZE - 1;
    let tags = (0..train_set.length())
        .map(|i| train_set.get_row(i).map(|row| row[tag_col]))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(split_bags(tags)?)
}

impl Object for MultiInstanceNNet {
    type Error = LearnerError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<MultiInstanceNNet>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::<Self>::new(CLASS);
            reg.inherit(PLearnerBase::registry(), |l| &l.base, |l| &mut l.base);
            declare_option!(reg, MultiInstanceNNet, nhidden, OptionFlags::BUILD, "隐藏层单元数");
            declare_option!(
                reg,
                MultiInstanceNNet,
                hidden_transfer_func,
                OptionFlags::BUILD,
                "隐藏层的激活函数"
            );
            declare_option!(
                reg,
                MultiInstanceNNet,
                bag_combiner,
                OptionFlags::BUILD,
                "包内实例概率的合并方式：noisy_or或max"
            );
            declare_option!(reg, MultiInstanceNNet, weight_decay, OptionFlags::BUILD, "权重的L2惩罚系数");
            declare_option!(reg, MultiInstanceNNet, bias_decay, OptionFlags::BUILD, "偏置的L2惩罚系数");
            declare_option!(reg, MultiInstanceNNet, optimizer, OptionFlags::BUILD, "训练所用的优化器");
            reg.declare_with(
                "params",
                |l: &MultiInstanceNNet| l.param_values().to_option_value(),
                |l: &mut MultiInstanceNNet, value| {
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
        net::check_transfer(CLASS, "hidden_transfer_func", &self.hidden_transfer_func)?;
        let combiner = self.combiner()?;
        if self.weight_decay < 0.0 || self.bias_decay < 0.0 {
            return Err(LearnerError::bad_option(
                CLASS,
                "weight_decay",
                self.weight_decay,
                "惩罚系数须非负",
            ));
        }
        self.test_bag.clear();

        if self.base.inputsize == 0 {
            debug!("{CLASS}的输入尺寸尚未确定，暂不构建网络");
            self.net = None;
            return Ok(());
        }
        if self.base.targetsize != TARGETSIZE {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "targetsize",
                expected: TARGETSIZE,
                got: self.base.targetsize,
            });
        }

        let shapes = self.layer_shapes();
        let kept = self.net.as_ref().map(BagNet::param_values).filter(|old| {
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
        let built = self.build_graph(&params, combiner)?;
        self.optimizer.set_to_optimize(&built.params, built.head.objective);
        self.net = Some(built);
        Ok(())
    }

    fn has_learnt_state(&self) -> bool {
        self.base.stage > 0
    }
}

impl Learner for MultiInstanceNNet {
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
        1
    }

    fn get_test_cost_names(&self) -> Vec<String> {
        test_cost_names()
    }

    fn get_train_cost_names(&self) -> Vec<String> {
        net::train_cost_names(&test_cost_names())
    }

    fn forget(&mut self) -> Result<(), LearnerError> {
        self.base.reset();
        self.optimizer.reset();
        self.test_bag.clear();
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
        let net = self
            .net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
        let optimizer = &mut self.optimizer;
        self.base.run_stages(CLASS, &names, |ctx| {
            let bags = train_bags(ctx.train_set.as_ref())?;
            debug!("{CLASS}第{}阶段：{}个包", ctx.stage, bags.len());
            if bags.is_empty() {
                warn!("{CLASS}的训练集中没有包，第{}阶段不做任何更新", ctx.stage);
                return Ok(false);
            }
            optimizer.set_nstages(bags.len());
            let mut feed = BagFeed {
                train_set: ctx.train_set.as_ref(),
                bags: &bags,
                input: net.input,
                head: &net.head,
                cursor: 0,
            };
            Ok(optimizer.optimize_n(&mut net.graph, &mut feed, ctx.stats)?)
        })
    }

    /// 逐实例的概率 [n, 1]
    fn compute_output(&mut self, input: &Tensor) -> Result<Tensor, LearnerError> {
        self.ensure_built()?;
        let net = self.net_mut()?;
        let mut values = net.graph.evaluate(&[(net.input, input)], &[net.instance_output])?;
        values
            .pop()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "输出节点没有值"))
    }

    /// 只有包的最后一行才有代价，其余行的代价为缺失值（NaN）；包可以跨越多次调用
    fn compute_costs_from_outputs(
        &mut self,
        _input: &Tensor,
        output: &Tensor,
        target: &Tensor,
    ) -> Result<Tensor, LearnerError> {
        self.ensure_built()?;
        if target.cols() != TARGETSIZE {
            return Err(LearnerError::LayoutMismatch {
                class: CLASS.to_string(),
                what: "目标列数",
                expected: TARGETSIZE,
                got: target.cols(),
            });
        }
        let ncosts = test_cost_names().len();
        let mut costs = Tensor::filled(f64::NAN, &[output.rows(), ncosts]);

        let Self { net, test_bag, .. } = self;
        let net = net
            .as_mut()
            .ok_or_else(|| LearnerError::not_configured(CLASS, "网络尚未构建"))?;
        for r in 0..output.rows() {
            let tag = BagTag::from_f64(target.get(r, 1))?;
            if !test_bag.push(tag, &[output.get(r, 0), target.get(r, 0)])? {
                continue;
            }
            let rows = test_bag.take();
            let instances = Tensor::from_rows(&rows.iter().map(|row| vec![row[0]]).collect::<Vec<_>>(), 1)?;
            let class = rows.last().map_or(0.0, |row| row[1]);

            let bag_prob = net
                .graph
                .evaluate(&[(net.given_instances, &instances)], &[net.given_bag])?
                .pop()
                .ok_or_else(|| LearnerError::not_configured(CLASS, "包概率节点没有值"))?;
            let bag_costs = net
                .head
                .costs_from_outputs(&mut net.graph, &bag_prob, &Tensor::scalar(class))?;
            costs.assign_rows(r, &bag_costs)?;
        }
        Ok(costs)
    }

    fn rows_are_independent(&self) -> bool {
        false
    }

    fn reset_test_state(&mut self) {
        self.test_bag.clear();
    }
}
