/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 提前停止：每个训练阶段结束时观察一次目标值（越小越好），
 *                 下列条件中任意一个满足就停止（各条件相互独立，取“或”）：
 *                 - 连续未刷新最好值的阶段数超过 max_degraded_steps（为 0 时不启用）
 *                 - 相对上一阶段的改进量小于 min_improvement
 *                 - 相对上一阶段的相对改进量小于 relative_min_improvement
 *                 - 比最好值变差的量大于 max_degradation
 *                 - 比最好值变差的相对量大于 relative_max_degradation
 *                 阈值取 ±inf 即表示不启用该条件。
 */

use std::sync::OnceLock;

use log::{debug, info};

use crate::declare_option;
use crate::object::{OptionFlags, OptionRegistry};

#[derive(Debug, Clone, PartialEq)]
pub struct EarlyStopping {
    pub max_degraded_steps: usize,
    pub min_improvement: f64,
    pub relative_min_improvement: f64,
    pub max_degradation: f64,
    pub relative_max_degradation: f64,
    best: Option<f64>,
    previous: Option<f64>,
    degraded_steps: usize,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self {
            max_degraded_steps: 0,
            min_improvement: f64::NEG_INFINITY,
            relative_min_improvement: f64::NEG_INFINITY,
            max_degradation: f64::INFINITY,
            relative_max_degradation: f64::INFINITY,
            best: None,
            previous: None,
            degraded_steps: 0,
        }
    }
}

impl EarlyStopping {
    pub(crate) fn registry() -> &'static OptionRegistry<EarlyStopping> {
        static REGISTRY: OnceLock<OptionRegistry<EarlyStopping>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("EarlyStopping");
            declare_option!(
                reg,
                EarlyStopping,
                max_degraded_steps,
                OptionFlags::BUILD,
                "连续多少个阶段未刷新最好目标值就停止（0 表示不启用）"
            );
            declare_option!(
                reg,
                EarlyStopping,
                min_improvement,
                OptionFlags::BUILD,
                "相对上一阶段的最小改进量"
            );
            declare_option!(
                reg,
                EarlyStopping,
                relative_min_improvement,
                OptionFlags::BUILD,
                "相对上一阶段的最小相对改进量"
            );
            declare_option!(
                reg,
                EarlyStopping,
                max_degradation,
                OptionFlags::BUILD,
                "允许比最好值变差的最大量"
            );
            declare_option!(
                reg,
                EarlyStopping,
                relative_max_degradation,
                OptionFlags::BUILD,
                "允许比最好值变差的最大相对量"
            );
            reg
        })
    }

    /// 清空观察记录（阈值不变）
    pub fn reset(&mut self) {
        self.best = None;
        self.previous = None;
        self.degraded_steps = 0;
    }

    pub const fn best(&self) -> Option<f64> {
        self.best
    }

    /// 记录一个阶段的目标值，返回是否应当停止
    pub fn observe(&mut self, value: f64) -> bool {
        // NaN（如本阶段样本权重全为0）视为缺失，不参与比较
        if value.is_nan() {
            debug!("本阶段目标值缺失，跳过提前停止判断");
            return false;
        }
        let mut stop = false;

        if let Some(previous) = self.previous {
            let improvement = previous - value;
            if improvement < self.min_improvement {
                info!("目标值改进量{improvement}小于{}，提前停止", self.min_improvement);
                stop = true;
            }
            if previous != 0.0 {
                let relative = improvement / previous.abs();
                if relative < self.relative_min_improvement {
                    info!(
                        "目标值相对改进量{relative}小于{}，提前停止",
                        self.relative_min_improvement
                    );
                    stop = true;
                }
            }
        }

        match self.best {
            Some(best) if value >= best => {
                self.degraded_steps += 1;
                let degradation = value - best;
                if degradation > self.max_degradation {
                    info!("目标值比最好值差{degradation}，超过{}，提前停止", self.max_degradation);
                    stop = true;
                }
                if best != 0.0 && degradation / best.abs() > self.relative_max_degradation {
                    info!(
                        "目标值比最好值相对变差{}，超过{}，提前停止",
                        degradation / best.abs(),
                        self.relative_max_degradation
                    );
                    stop = true;
                }
                if self.max_degraded_steps > 0 && self.degraded_steps >= self.max_degraded_steps {
                    info!("已连续{}个阶段未刷新最好值，提前停止", self.degraded_steps);
                    stop = true;
                }
            }
            _ => {
                self.best = Some(value);
                self.degraded_steps = 0;
            }
        }

        self.previous = Some(value);
        stop
    }
}
