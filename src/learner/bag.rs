/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 多实例学习中的“包”：连续若干行构成一个包，由目标最后一列的标记划定边界。
 *                 只有包的最后一行（Last 或 Singleton）才触发包级代价的计算，其余行只缓存。
 */

use std::ops::Range;

use crate::data::DataError;

/// 包标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagTag {
    /// 包的中间行
    Middle = 0,
    First = 1,
    Last = 2,
    /// 只有一行的包（既是第一行也是最后一行）
    Singleton = 3,
}

impl BagTag {
    pub fn from_f64(value: f64) -> Result<Self, DataError> {
        match value {
            v if v == 0.0 => Ok(BagTag::Middle),
            v if v == 1.0 => Ok(BagTag::First),
            v if v == 2.0 => Ok(BagTag::Last),
            v if v == 3.0 => Ok(BagTag::Singleton),
            v => Err(DataError::MalformedBag(format!("未知的包标记{v}"))),
        }
    }

    pub const fn as_f64(self) -> f64 {
        self as u8 as f64
    }

    pub const fn starts_bag(self) -> bool {
        matches!(self, BagTag::First | BagTag::Singleton)
    }

    pub const fn ends_bag(self) -> bool {
        matches!(self, BagTag::Last | BagTag::Singleton)
    }
}

/// 逐行缓存一个包的内容，直到包结束
#[derive(Debug, Clone, Default)]
pub struct BagBuffer {
    rows: Vec<Vec<f64>>,
    open: bool,
}

impl BagBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一行；返回包是否就此结束（结束后可用`take`取出整个包）
    pub fn push(&mut self, tag: BagTag, row: &[f64]) -> Result<bool, DataError> {
        match (tag.starts_bag(), self.open) {
            (true, true) => {
                return Err(DataError::MalformedBag(format!(
                    "上一个包（已有{}行）尚未结束就遇到了新包的开头",
                    self.rows.len()
                )));
            }
            (false, false) => {
                return Err(DataError::MalformedBag(format!("{tag:?}行之前没有包的开头")));
            }
            (true, false) => {
                self.rows.clear();
                self.open = true;
            }
            (false, true) => {}
        }
        self.rows.push(row.to_vec());
        if tag.ends_bag() {
            self.open = false;
        }
        Ok(tag.ends_bag())
    }

    /// 取出已结束的包（按行）
    pub fn take(&mut self) -> Vec<Vec<f64>> {
        std::mem::take(&mut self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.open = false;
    }
}

/// 把一列包标记切分为各个包所占的行区间
pub fn split_bags<I>(tags: I) -> Result<Vec<Range<usize>>, DataError>
where
    I: IntoIterator<Item = f64>,
{
    let mut bags = Vec::new();
    let mut buffer = BagBuffer::new();
    let mut start = 0;
    let mut n = 0;
    for (i, value) in tags.into_iter().enumerate() {
        let tag = BagTag::from_f64(value)?;
        if tag.starts_bag() {
            start = i;
        }
        if buffer.push(tag, &[])? {
            buffer.clear();
            bags.push(start..i + 1);
        }
        n = i + 1;
    }
    if buffer.is_open() {
        return Err(DataError::MalformedBag(format!(
            "数据在第{n}行结束时最后一个包尚未结束"
        )));
    }
    Ok(bags)
}
