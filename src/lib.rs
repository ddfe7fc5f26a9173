//! # PLearner
//!
//! `plearner`是一个机器学习研究库：对象通过声明式的选项表按名字配置、
//! 以文本形式序列化；神经网络在基于 arena 的计算图上做前向/反向传播；
//! 学习器按阶段训练、可中断续训，并支持按 minibatch 乃至并行地在数据集上测试。
//!

pub mod data;
pub mod errors;
pub mod learner;
pub mod nn;
pub mod object;
pub mod stats;
pub mod tensor;
pub mod utils;
