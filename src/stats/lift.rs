/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 提升度（lift）统计：按输出得分排序后，得分最高的一部分样本中正类的集中程度
 *                 相对于随机挑选时的倍数（乘以100）
 */

use std::cmp::Ordering;
use std::sync::OnceLock;

use super::StatsError;
use crate::declare_option;
use crate::object::{BuildState, Object, OptionFlags, OptionRegistry};

#[derive(Debug, Clone)]
pub struct LiftStatsCollector {
    /// 取得分最高的这一比例的样本
    pub lift_fraction: f64,
    /// (输出得分, 0/1 目标)
    examples: Vec<(f64, bool)>,
    nmissing: usize,
    build_state: BuildState,
}

impl Default for LiftStatsCollector {
    fn default() -> Self {
        Self {
            lift_fraction: 0.1,
            examples: Vec::new(),
            nmissing: 0,
            build_state: BuildState::Built,
        }
    }
}

impl LiftStatsCollector {
    pub fn new(lift_fraction: f64) -> Self {
        Self {
            lift_fraction,
            ..Self::default()
        }
    }

    pub fn forget(&mut self) {
        self.examples.clear();
        self.nmissing = 0;
    }

    /// 累积一个 (输出, 目标) 对；输出为 NaN 时记为缺失
    pub fn update(&mut self, output: f64, target: f64) -> Result<(), StatsError> {
        let positive = match target {
            t if t == 1.0 => true,
            t if t == 0.0 => false,
            t => return Err(StatsError::BadTarget(t)),
        };
        if output.is_nan() {
            self.nmissing += 1;
        } else {
            self.examples.push((output, positive));
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &LiftStatsCollector) {
        self.examples.extend_from_slice(&other.examples);
        self.nmissing += other.nmissing;
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub const fn nmissing(&self) -> usize {
        self.nmissing
    }

    /// 参与统计的头部样本数 k = round(lift_fraction * n)
    pub fn top_count(&self) -> usize {
        ((self.lift_fraction * self.examples.len() as f64).round() as usize).min(self.examples.len())
    }

    pub fn total_positives(&self) -> usize {
        self.examples.iter().filter(|(_, p)| *p).count()
    }

    /// 得分最高的 k 个样本中的正类数（同分时保持加入顺序）
    pub fn positives_in_top(&self) -> usize {
        let mut sorted = self.examples.clone();
        sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        sorted
            .iter()
            .take(self.top_count())
            .filter(|(_, p)| *p)
            .count()
    }

    /// lift = 100 * 头部正类数 / (lift_fraction * 正类总数)；没有正类时为 NaN
    pub fn compute_lift(&self) -> f64 {
        let total = self.total_positives();
        if total == 0 {
            return f64::NAN;
        }
        100.0 * self.positives_in_top() as f64 / (self.lift_fraction * total as f64)
    }

    /// 相对于最佳可能 lift（头部全是正类）的比例
    pub fn compute_normalized_lift(&self) -> f64 {
        let total = self.total_positives();
        let best = total.min(self.top_count());
        if best == 0 {
            return f64::NAN;
        }
        self.positives_in_top() as f64 / best as f64
    }

    pub fn get_stat(&self, name: &str) -> Result<f64, StatsError> {
        match name {
            "LIFT" => Ok(self.compute_lift()),
            "NLIFT" => Ok(self.compute_normalized_lift()),
            other => Err(StatsError::UnknownStat(other.to_string())),
        }
    }
}

impl Object for LiftStatsCollector {
    type Error = StatsError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<LiftStatsCollector>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("LiftStatsCollector");
            declare_option!(
                reg,
                LiftStatsCollector,
                lift_fraction,
                OptionFlags::BUILD,
                "计算提升度时取得分最高的样本比例"
            );
            reg
        })
    }

    fn build_state(&self) -> BuildState {
        self.build_state
    }

    fn set_build_state(&mut self, state: BuildState) {
        self.build_state = state;
    }

    fn build_(&mut self) -> Result<(), StatsError> {
        if !(self.lift_fraction > 0.0 && self.lift_fraction <= 1.0) {
            return Err(StatsError::Object(crate::object::ObjectError::BadOptionValue {
                class: "LiftStatsCollector".to_string(),
                name: "lift_fraction".to_string(),
                value: self.lift_fraction.to_string(),
                reason: "须在(0, 1]内".to_string(),
            }));
        }
        Ok(())
    }
}
