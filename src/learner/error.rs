use thiserror::Error;

use crate::data::DataError;
use crate::errors::TensorError;
use crate::nn::GraphError;
use crate::object::ObjectError;
use crate::stats::StatsError;

/// 学习器生命周期与训练/测试过程中的错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LearnerError {
    #[error("{0}：训练前需先通过set_training_set绑定训练集")]
    NoTrainingSet(String),

    #[error("{0}：训练前需先通过set_train_stats绑定训练统计收集器")]
    NoTrainStats(String),

    /// 尚未由数据集确定输入/目标尺寸，或尚未build
    #[error("{class}尚不可用：{reason}")]
    NotConfigured { class: String, reason: String },

    /// 数据集的列布局与学习器的要求不符
    #[error("{class}要求{what}为{expected}，实际为{got}")]
    LayoutMismatch {
        class: String,
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// 并行测试中某个工作者失败，整个测试随之中止
    #[error("并行测试的第{slice}段失败：{source}")]
    WorkerFailed {
        slice: usize,
        source: Box<LearnerError>,
    },

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl LearnerError {
    pub(crate) fn not_configured(class: &str, reason: impl Into<String>) -> Self {
        LearnerError::NotConfigured {
            class: class.to_string(),
            reason: reason.into(),
        }
    }

    /// 构建时发现的选项取值错误
    pub(crate) fn bad_option(class: &str, name: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        LearnerError::Object(ObjectError::BadOptionValue {
            class: class.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        })
    }
}
