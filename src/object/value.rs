/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 选项的抽象值（OptionValue）以及 Rust 类型与抽象值之间的互转（OptionType）
 */

use crate::tensor::Tensor;

/// 嵌套对象描述：`ClassName(opt1 = v1, opt2 = v2)`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub class_name: String,
    pub options: Vec<(String, OptionValue)>,
}

impl ObjectSpec {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            options: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.options.push((name.to_string(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// 选项的抽象值，与具体字段类型无关
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    /// 超出`i64`范围的非负整数
    UInt(u64),
    Real(f64),
    Bool(bool),
    Str(String),
    List(Vec<OptionValue>),
    Object(ObjectSpec),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Int(_) | OptionValue::UInt(_) => "整数",
            OptionValue::Real(_) => "实数",
            OptionValue::Bool(_) => "布尔值",
            OptionValue::Str(_) => "字符串",
            OptionValue::List(_) => "列表",
            OptionValue::Object(_) => "对象",
        }
    }

    pub(crate) fn expected(&self, what: &str) -> String {
        format!("期望{what}，实际为{}", self.kind())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(i) => Some(*i as f64),
            OptionValue::UInt(u) => Some(*u as f64),
            OptionValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// 能作为选项字段的类型
pub trait OptionType: Sized {
    fn to_option_value(&self) -> OptionValue;
    fn from_option_value(value: &OptionValue) -> Result<Self, String>;
}

impl OptionType for i64 {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::Int(*self)
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::Int(i) => Ok(*i),
            OptionValue::UInt(u) => Err(format!("整数{u}超出范围")),
            OptionValue::Real(r) if r.fract() == 0.0 && r.is_finite() => {
                // 2^63 恰好可由 f64 精确表示
                if *r >= -I64_BOUND && *r < I64_BOUND {
                    Ok(*r as i64)
                } else {
                    Err(format!("整数{r}超出范围"))
                }
            }
            other => Err(other.expected("整数")),
        }
    }
}

impl OptionType for usize {
    fn to_option_value(&self) -> OptionValue {
        (*self as u64).to_option_value()
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        let u = u64::from_option_value(value)?;
        usize::try_from(u).map_err(|_| format!("整数{u}超出范围"))
    }
}

impl OptionType for u64 {
    fn to_option_value(&self) -> OptionValue {
        match i64::try_from(*self) {
            Ok(i) => OptionValue::Int(i),
            Err(_) => OptionValue::UInt(*self),
        }
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::UInt(u) => Ok(*u),
            OptionValue::Real(r) if r.fract() == 0.0 && *r >= 2.0 * I64_BOUND => {
                Err(format!("整数{r}超出范围"))
            }
            OptionValue::Real(r) if r.fract() == 0.0 && *r >= I64_BOUND => Ok(*r as u64),
            _ => {
                let i = i64::from_option_value(value)?;
                u64::try_from(i).map_err(|_| format!("期望非负整数，实际为{i}"))
            }
        }
    }
}

impl OptionType for f64 {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::Real(*self)
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| value.expected("实数"))
    }
}

impl OptionType for bool {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::Bool(*self)
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::Bool(b) => Ok(*b),
            OptionValue::Int(0) => Ok(false),
            OptionValue::Int(1) => Ok(true),
            other => Err(other.expected("布尔值（true/false/0/1）")),
        }
    }
}

impl OptionType for String {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::Str(self.clone())
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::Str(s) => Ok(s.clone()),
            other => Err(other.expected("字符串")),
        }
    }
}

impl<T: OptionType> OptionType for Vec<T> {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::List(self.iter().map(OptionType::to_option_value).collect())
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        match value {
            OptionValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_option_value(item).map_err(|e| format!("列表第{i}个元素：{e}"))
                })
                .collect(),
            other => Err(other.expected("列表")),
        }
    }
}

/// 张量写作“行的列表”：`[[1, 2], [3, 4]]`
impl OptionType for Tensor {
    fn to_option_value(&self) -> OptionValue {
        OptionValue::List(
            (0..self.rows())
                .map(|i| OptionValue::List(self.row(i).iter().map(|&x| OptionValue::Real(x)).collect()))
                .collect(),
        )
    }

    fn from_option_value(value: &OptionValue) -> Result<Self, String> {
        let rows = Vec::<Vec<f64>>::from_option_value(value)?;
        let width = rows.first().map_or(0, Vec::len);
        Tensor::from_rows(&rows, width).map_err(|e| e.to_string())
    }
}
