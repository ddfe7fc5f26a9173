/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 所有学习器共有的状态与选项：随机种子、训练阶段、输入/目标/权重尺寸、
 *                 绑定的训练集与训练统计，以及按阶段推进的训练循环
 */

use std::fmt;
use std::sync::{Arc, OnceLock};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::early_stop::EarlyStopping;
use super::LearnerError;
use crate::data::VMat;
use crate::declare_option;
use crate::object::{self, BuildState, Object, ObjectSpec, OptionFlags, OptionRegistry};
use crate::stats::VecStatsCollector;

pub const DEFAULT_SEED: u64 = 1827;

/// 每个阶段训练时可用的上下文
pub(crate) struct StageContext<'a> {
    pub stage: usize,
    pub stats: &'a mut VecStatsCollector,
    pub rng: &'a mut StdRng,
    pub train_set: &'a Arc<dyn VMat>,
}

#[derive(Clone)]
pub struct PLearnerBase {
    /// 随机数种子，`forget`时据此重置随机数生成器
    pub seed: u64,
    /// 已完成的训练阶段数
    pub stage: usize,
    /// 训练的目标阶段数
    pub nstages: usize,
    /// 测试时每个 minibatch 的行数
    pub test_minibatch_size: usize,
    /// 并行测试的工作者数（不超过 1 时顺序测试）
    pub parallelize_test: usize,
    pub report_progress: bool,
    pub inputsize: usize,
    pub targetsize: usize,
    pub weightsize: usize,
    pub early_stopping: EarlyStopping,
    pub(crate) rng: StdRng,
    pub(crate) train_set: Option<Arc<dyn VMat>>,
    pub(crate) train_stats: Option<VecStatsCollector>,
    pub(crate) build_state: BuildState,
}

impl Default for PLearnerBase {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            stage: 0,
            nstages: 1,
            test_minibatch_size: 1,
            parallelize_test: 0,
            report_progress: false,
            inputsize: 0,
            targetsize: 0,
            weightsize: 0,
            early_stopping: EarlyStopping::default(),
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            train_set: None,
            train_stats: None,
            build_state: BuildState::Unbuilt,
        }
    }
}

impl fmt::Debug for PLearnerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PLearnerBase")
            .field("seed", &self.seed)
            .field("stage", &self.stage)
            .field("nstages", &self.nstages)
            .field("inputsize", &self.inputsize)
            .field("targetsize", &self.targetsize)
            .field("weightsize", &self.weightsize)
            .field("train_set_length", &self.train_set.as_ref().map(|d| d.length()))
            .field("build_state", &self.build_state)
            .finish()
    }
}

impl PLearnerBase {
    pub(crate) fn registry() -> &'static OptionRegistry<PLearnerBase> {
        static REGISTRY: OnceLock<OptionRegistry<PLearnerBase>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("PLearner");
            declare_option!(reg, PLearnerBase, seed, OptionFlags::BUILD, "随机数种子");
            declare_option!(reg, PLearnerBase, stage, OptionFlags::LEARNT, "已完成的训练阶段数");
            declare_option!(reg, PLearnerBase, nstages, OptionFlags::BUILD, "训练的目标阶段数");
            declare_option!(
                reg,
                PLearnerBase,
                test_minibatch_size,
                OptionFlags::BUILD,
                "测试时每个minibatch的行数"
            );
            declare_option!(
                reg,
                PLearnerBase,
                parallelize_test,
                OptionFlags::BUILD,
                "并行测试的工作者数，不超过1时顺序测试"
            );
            declare_option!(
                reg,
                PLearnerBase,
                report_progress,
                OptionFlags::NOSAVE,
                "是否在每个训练阶段输出进度日志"
            );
            declare_option!(
                reg,
                PLearnerBase,
                inputsize,
                OptionFlags::BUILD | OptionFlags::REMOTE_TRANSMIT,
                "输入列数（由训练集确定）"
            );
            declare_option!(
                reg,
                PLearnerBase,
                targetsize,
                OptionFlags::BUILD | OptionFlags::REMOTE_TRANSMIT,
                "目标列数（由训练集确定）"
            );
            declare_option!(
                reg,
                PLearnerBase,
                weightsize,
                OptionFlags::BUILD | OptionFlags::REMOTE_TRANSMIT,
                "样本权重列数（0或1，由训练集确定）"
            );
            reg.inherit(
                EarlyStopping::registry(),
                |b| &b.early_stopping,
                |b| &mut b.early_stopping,
            );
            reg
        })
    }

    /// 基类部分的构建，先于具体学习器自己的构建逻辑执行
    pub(crate) fn build_(&mut self, class: &str) -> Result<(), LearnerError> {
        if self.weightsize > 1 {
            return Err(LearnerError::bad_option(class, "weightsize", self.weightsize, "只能为0或1"));
        }
        if self.test_minibatch_size == 0 {
            return Err(LearnerError::bad_option(
                class,
                "test_minibatch_size",
                self.test_minibatch_size,
                "须为正整数",
            ));
        }
        Ok(())
    }

    /// 按种子重置随机数生成器与阶段数
    pub(crate) fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.stage = 0;
        self.early_stopping.reset();
    }

    pub fn train_set(&self) -> Option<&Arc<dyn VMat>> {
        self.train_set.as_ref()
    }

    pub fn train_stats(&self) -> Option<&VecStatsCollector> {
        self.train_stats.as_ref()
    }

    /// 数据集的列布局是否与当前记录的尺寸不同
    pub(crate) fn layout_differs(&self, dataset: &dyn VMat) -> bool {
        (self.inputsize, self.targetsize, self.weightsize)
            != (dataset.inputsize(), dataset.targetsize(), dataset.weightsize())
    }

    /// 训练前的检查：须已绑定训练集与训练统计
    pub(crate) fn check_can_train(&self, class: &str) -> Result<(), LearnerError> {
        if self.train_set.is_none() {
            return Err(LearnerError::NoTrainingSet(class.to_string()));
        }
        if self.train_stats.is_none() {
            return Err(LearnerError::NoTrainStats(class.to_string()));
        }
        Ok(())
    }

    /// 推进训练直到`stage == nstages`：每个阶段先清空训练统计，执行`run_stage`，再结束本阶段统计。
    /// `run_stage`返回真或提前停止条件满足时提前结束
    pub(crate) fn run_stages<F>(
        &mut self,
        class: &str,
        train_cost_names: &[String],
        mut run_stage: F,
    ) -> Result<(), LearnerError>
    where
        F: FnMut(StageContext<'_>) -> Result<bool, LearnerError>,
    {
        self.check_can_train(class)?;
        let (Some(train_set), Some(stats)) = (self.train_set.as_ref(), self.train_stats.as_mut()) else {
            return Err(LearnerError::NoTrainingSet(class.to_string()));
        };
        if stats.fieldnames() != train_cost_names {
            stats.set_fieldnames(train_cost_names);
        }

        if self.stage < self.nstages {
            info!("{class}从第{}阶段训练到第{}阶段", self.stage, self.nstages);
        }
        while self.stage < self.nstages {
            stats.forget();
            let stop = run_stage(StageContext {
                stage: self.stage,
                stats: &mut *stats,
                rng: &mut self.rng,
                train_set,
            })?;
            stats.finalize();
            self.stage += 1;

            let objective = stats.mean().first().copied().unwrap_or(f64::NAN);
            if self.report_progress {
                info!("{class}第{}阶段：{}均值 = {objective}", self.stage, train_cost_names[0]);
            } else {
                debug!("{class}第{}阶段：{}均值 = {objective}", self.stage, train_cost_names[0]);
            }
            if stop || self.early_stopping.observe(objective) {
                info!("{class}在第{}阶段提前停止", self.stage);
                break;
            }
        }
        Ok(())
    }
}

/// 设置学习器的选项后立即重新构建，对外不暴露“需要重新build”的中间状态
pub(crate) fn set_option_and_rebuild<L>(learner: &mut L, name: &str, value: &str) -> Result<(), LearnerError>
where
    L: Object<Error = LearnerError>,
{
    let previous = L::registry().get_value(learner, name)?;
    object::set_option(learner, name, value)?;
    if let Err(e) = learner.build() {
        // 构建失败时恢复原值，学习器保持上一次可用的配置
        object::set_option_value(learner, name, &previous)?;
        if let Err(restore) = learner.build() {
            warn!("恢复选项“{name}”后重新构建失败：{restore}");
        }
        return Err(e);
    }
    Ok(())
}

pub(crate) fn get_option<L: Object>(learner: &L, name: &str) -> Result<String, LearnerError> {
    Ok(object::get_option(learner, name)?)
}

pub(crate) fn to_spec<L: Object>(learner: &L) -> ObjectSpec {
    object::to_spec(learner)
}
