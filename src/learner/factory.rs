/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 按类名构造学习器，以及学习器的文本序列化/反序列化
 */

use enum_dispatch::enum_dispatch;

use super::{CascadeCorrelation, Learner, LearnerError, MultiInstanceNNet, NNet, PLearnerBase};
use crate::data::VMat;
use crate::object::{self, dialect, Object, ObjectError, ObjectSpec};
use crate::stats::VecStatsCollector;
use crate::tensor::Tensor;

use std::sync::Arc;

/// 全部可按类名构造的学习器
#[enum_dispatch(Learner)]
#[derive(Debug, Clone)]
pub enum LearnerKind {
    NNet(NNet),
    MultiInstanceNNet(MultiInstanceNNet),
    CascadeCorrelation(CascadeCorrelation),
}

fn configure<L>(options: &[(&str, &str)]) -> Result<L, LearnerError>
where
    L: Object<Error = LearnerError> + Default,
{
    let mut learner = L::default();
    object::change_options(&mut learner, options)?;
    Ok(learner)
}

/// 按类名与若干`(选项名, 取值文本)`构造并build一个学习器，
/// 结果与手工构造、逐个设置选项再build完全相同
pub fn new_learner(class_name: &str, options: &[(&str, &str)]) -> Result<LearnerKind, LearnerError> {
    Ok(match class_name {
        c if c == object::class_name_of::<NNet>() => LearnerKind::NNet(configure(options)?),
        c if c == object::class_name_of::<MultiInstanceNNet>() => {
            LearnerKind::MultiInstanceNNet(configure(options)?)
        }
        c if c == object::class_name_of::<CascadeCorrelation>() => {
            LearnerKind::CascadeCorrelation(configure(options)?)
        }
        other => return Err(ObjectError::UnknownType(other.to_string()).into()),
    })
}

pub fn learner_from_spec(spec: &ObjectSpec) -> Result<LearnerKind, LearnerError> {
    Ok(match spec.class_name.as_str() {
        c if c == object::class_name_of::<NNet>() => LearnerKind::NNet(object::from_spec(spec)?),
        c if c == object::class_name_of::<MultiInstanceNNet>() => {
            LearnerKind::MultiInstanceNNet(object::from_spec(spec)?)
        }
        c if c == object::class_name_of::<CascadeCorrelation>() => {
            LearnerKind::CascadeCorrelation(object::from_spec(spec)?)
        }
        other => return Err(ObjectError::UnknownType(other.to_string()).into()),
    })
}

/// 由文本描述（如`NNet(nhidden = 4, nstages = 10)`）重建学习器
pub fn parse_learner(text: &str) -> Result<LearnerKind, LearnerError> {
    learner_from_spec(&dialect::parse_object(text)?)
}

/// 学习器的文本描述。不含NOSAVE选项；未训练时也不含学到的参数
pub fn serialize_learner<L: Learner>(learner: &L) -> String {
    dialect::write_object(&learner.to_spec())
}
