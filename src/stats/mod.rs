/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 统计收集器：训练/测试时逐样本累积代价，支持与顺序无关的合并（并行测试用）
 */

mod collector;
mod error;
mod lift;
mod vec_collector;

#[cfg(test)]
mod tests;

pub use collector::StatsCollector;
pub use error::StatsError;
pub use lift::LiftStatsCollector;
pub use vec_collector::VecStatsCollector;
