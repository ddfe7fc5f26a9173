//! # 测试辅助
//!
//! 单元测试与集成测试共用的断言宏，以及测试时的日志初始化

#[cfg(test)]
mod tests;


/// 测试中开启日志输出（由`RUST_LOG`控制级别），可重复调用
#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
