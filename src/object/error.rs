/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 声明式选项系统 / 对象模型的错误类型
 */

use super::Handle;
use thiserror::Error;

/// 选项注册、读写、解析与对象生命周期相关的错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObjectError {
    /// 运行时类型中没有注册该选项
    #[error("{class}没有名为“{name}”的选项")]
    UnknownOption { class: String, name: String },

    /// 字符串无法转换为选项的值
    #[error("{class}的选项“{name}”无法接受值“{value}”：{reason}")]
    BadOptionValue {
        class: String,
        name: String,
        value: String,
        reason: String,
    },

    /// 同一类型中重复注册了同名选项（含继承而来的选项）
    #[error("{class}中重复声明了选项“{name}”")]
    DuplicateOption { class: String, name: String },

    /// build 时缺少必需的选项
    #[error("{class}缺少必需的选项“{name}”")]
    MissingOption { class: String, name: String },

    /// 不认识的类型名
    #[error("未注册的类型“{0}”")]
    UnknownType(String),

    /// 类型名与期望不符
    #[error("期望类型“{expected}”，实际为“{got}”")]
    TypeMismatch { expected: String, got: String },

    /// 文本描述语法错误
    #[error("第{line}行第{column}列解析失败：{message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// 在未 build（或选项改变后未重新 build）的对象上调用了非设置类方法
    #[error("{0}尚未build（或选项改变后未重新build），不能执行该操作")]
    NotBuilt(String),

    /// 深拷贝时遇到了指向不存在槽位的句柄
    #[error("深拷贝时遇到了悬空句柄{0}")]
    DanglingHandle(Handle),
}
