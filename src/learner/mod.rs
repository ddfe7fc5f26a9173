/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 学习器（PLearner）契约：按阶段推进、可中断续训的训练，
 *                 以及逐样本或按 minibatch（可选并行）的测试
 */

mod bag;
mod base;
mod cascade;
mod early_stop;
mod error;
mod multi_instance;
mod net;
mod nnet;
mod tester;

#[cfg(test)]
mod tests;

pub use bag::{BagBuffer, BagTag, split_bags};
pub use base::{DEFAULT_SEED, PLearnerBase};
pub use cascade::CascadeCorrelation;
pub use early_stop::EarlyStopping;
pub use error::LearnerError;
pub use factory::{LearnerKind, learner_from_spec, new_learner, parse_learner, serialize_learner};
pub use multi_instance::MultiInstanceNNet;
pub use nnet::NNet;

use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use log::debug;

use crate::data::VMat;
use crate::object::ObjectSpec;
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

/// 学习器核心 trait
///
/// 生命周期：Fresh(stage = 0) --train--> 部分训练 --train--> 已训练(stage == nstages)；
/// `forget`从任何状态回到 Fresh
#[enum_dispatch]
pub trait Learner: Clone + Send {
    /// 序列化时使用的类名
    fn class_name(&self) -> &'static str;

    fn base(&self) -> &PLearnerBase;

    fn base_mut(&mut self) -> &mut PLearnerBase;

    /// 设置选项后立即重新构建
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), LearnerError>;

    fn get_option(&self, name: &str) -> Result<String, LearnerError>;

    fn to_spec(&self) -> ObjectSpec;

    /// 按当前选项重新构建（幂等）
    fn rebuild(&mut self) -> Result<(), LearnerError>;

    /// 每个样本输出的列数
    fn output_size(&self) -> usize;

    /// 测试代价名，与`compute_costs_from_outputs`输出的列一一对应
    fn get_test_cost_names(&self) -> Vec<String>;

    /// 训练统计的字段名，第一个是优化目标
    fn get_train_cost_names(&self) -> Vec<String>;

    /// 回到未训练状态：stage 归零，参数按种子重新初始化
    fn forget(&mut self) -> Result<(), LearnerError>;

    /// 训练到`nstages`；若`stage > nstages`则先`forget`再从头训练
    fn train(&mut self) -> Result<(), LearnerError>;

    /// 输入 [n, inputsize]，输出 [n, output_size]
    fn compute_output(&mut self, input: &Tensor) -> Result<Tensor, LearnerError>;

    /// 由输出与目标计算逐行代价 [n, 代价数]
    fn compute_costs_from_outputs(
        &mut self,
        input: &Tensor,
        output: &Tensor,
        target: &Tensor,
    ) -> Result<Tensor, LearnerError>;

    fn compute_output_and_costs(
        &mut self,
        input: &Tensor,
        target: &Tensor,
    ) -> Result<(Tensor, Tensor), LearnerError> {
        let output = self.compute_output(input)?;
        let costs = self.compute_costs_from_outputs(input, &output, target)?;
        Ok((output, costs))
    }

    /// 各行的测试结果是否互不依赖（决定测试集能否切段并行）
    fn rows_are_independent(&self) -> bool {
        true
    }

    /// 测试开始前清空跨行的缓存状态
    fn reset_test_state(&mut self) {}

    fn stage(&self) -> usize {
        self.base().stage
    }

    fn nstages(&self) -> usize {
        self.base().nstages
    }

    /// 绑定训练集。列布局变化（或`call_forget`）时重新构建；`call_forget`时再`forget`。
    /// 布局不变、仅内容不同时不重新构建
    fn set_training_set(&mut self, dataset: Arc<dyn VMat>, call_forget: bool) -> Result<(), LearnerError> {
        dataset.check_layout()?;
        let changed = self.base().layout_differs(dataset.as_ref());
        let base = self.base_mut();
        if changed {
            debug!(
                "训练集列布局变为 ({}, {}, {})",
                dataset.inputsize(),
                dataset.targetsize(),
                dataset.weightsize()
            );
            base.inputsize = dataset.inputsize();
            base.targetsize = dataset.targetsize();
            base.weightsize = dataset.weightsize();
        }
        base.train_set = Some(dataset);
        if changed || call_forget {
            self.rebuild()?;
        }
        if call_forget {
            self.forget()?;
        }
        Ok(())
    }

    fn set_train_stats(&mut self, stats: VecStatsCollector) {
        self.base_mut().train_stats = Some(stats);
    }

    fn get_train_stats(&self) -> Option<&VecStatsCollector> {
        self.base().train_stats()
    }

    /// 在`dataset`上测试：代价（按样本权重）累积进`stats`，需要时写出输出与代价矩阵
    fn test(
        &mut self,
        dataset: &dyn VMat,
        stats: &mut VecStatsCollector,
        outputs: Option<&mut Tensor>,
        costs: Option<&mut Tensor>,
    ) -> Result<(), LearnerError> {
        tester::test(self, dataset, stats, outputs, costs)
    }
}

// 学习器的闭合集合，须在`Learner`定义之后声明
mod factory;
