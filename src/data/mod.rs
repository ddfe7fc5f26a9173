//! 数据矩阵（VMat）模块
//!
//! 学习器只通过四种能力访问数据：`length()`、`width()`、`get_row(i)`，以及把每行划分为
//! 输入列、目标列和可选的末尾样本权重列的三个尺寸（inputsize、targetsize、weightsize）。
//!
//! # 主要组件
//!
//! - [`VMat`]: 数据矩阵 trait
//! - [`MemoryVMatrix`]: 内存中的数据矩阵
//! - [`SubVMatrix`]: 另一个数据矩阵的连续行切片（并行测试时每个工作者持有一段）
//! - [`DataError`]: 数据相关错误类型

mod error;
mod memory;
mod sub;
mod vmat;

#[cfg(test)]
mod tests;

pub use error::DataError;
pub use memory::MemoryVMatrix;
pub use sub::SubVMatrix;
pub use vmat::{Batch, VMat};
