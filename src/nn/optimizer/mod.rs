/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 优化器：拿到一组参数节点与一个标量目标节点，反复执行
 *                 “取数据 -> 前向 -> 反向 -> 更新参数”
 */

mod adam;
mod base;
mod gradient;

pub use adam::Adam;
pub use base::{Optimizer, TrainingFeed};
pub use gradient::GradientOptimizer;

use enum_dispatch::enum_dispatch;

use crate::nn::{Graph, GraphError, NodeId};
use crate::object::{self, ObjectSpec, OptionType, OptionValue};
use crate::stats::VecStatsCollector;

/// 学习器可选用的优化器
#[enum_dispatch(Optimizer)]
#[derive(Debug, Clone)]
pub enum OptimizerKind {
    Gradient(GradientOptimizer),
    Adam(Adam),
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::Gradient(GradientOptimizer::default())
    }
}

impl OptimizerKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            OptimizerKind::Gradient(_) => object::class_name_of::<GradientOptimizer>(),
            OptimizerKind::Adam(_) => object::class_name_of::<Adam>(),
        }
    }

    pub fn to_spec(&self) -> ObjectSpec {
        match self {
            OptimizerKind::Gradient(o) => object::to_spec(o),
            OptimizerKind::Adam(o) => object::to_spec(o),
        }
    }

    pub fn from_spec(spec: &ObjectSpec) -> Result<Self, GraphError> {
        if spec.class_name == object::class_name_of::<GradientOptimizer>() {
            Ok(OptimizerKind::Gradient(object::from_spec(spec)?))
        } else if spec.class_name == object::class_name_of::<Adam>() {
            Ok(OptimizerKind::Adam(object::from_spec(spec)?))
        } else {
            Err(object::ObjectError::UnknownType(spec.class_name.clone()).into())
        }
    }
}

/// 优化器以嵌套对象的形式作为学习器的选项：`optimizer = Adam(learning_rate = 0.01)`
impl OptionType for OptimizerKind {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::Object(self.to_spec())
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::Object(spec) => Self::from_spec(spec).map_err(|e| e.to_string()),
            // 只写类名时使用该优化器的默认选项
            OptionValue::Str(class_name) => {
                Self::from_spec(&ObjectSpec::new(class_name)).map_err(|e| e.to_string())
            }
            other => Err(other.expected("优化器对象")),
        }
    }
}
