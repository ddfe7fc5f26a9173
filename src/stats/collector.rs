use serde::{Deserialize, Serialize};

use super::StatsError;

/// 单个变量的加权统计：只保存计数与各阶和，因此合并与更新顺序无关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsCollector {
    /// 缺失值（NaN）的权重和
    nmissing: f64,
    /// 非缺失值的权重和
    nnonmissing: f64,
    sum: f64,
    sumsq: f64,
    min: f64,
    max: f64,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self {
            nmissing: 0.0,
            nnonmissing: 0.0,
            sum: 0.0,
            sumsq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forget(&mut self) {
        *self = Self::default();
    }

    /// 累积一个带权重的观测值；NaN 记为缺失
    pub fn update(&mut self, value: f64, weight: f64) {
        if value.is_nan() {
            self.nmissing += weight;
            return;
        }
        self.nnonmissing += weight;
        self.sum += weight * value;
        self.sumsq += weight * value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// 合并另一个收集器（满足结合律与交换律）
    pub fn merge(&mut self, other: &StatsCollector) {
        self.nmissing += other.nmissing;
        self.nnonmissing += other.nnonmissing;
        self.sum += other.sum;
        self.sumsq += other.sumsq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn n(&self) -> f64 {
        self.nmissing + self.nnonmissing
    }

    pub fn nmissing(&self) -> f64 {
        self.nmissing
    }

    pub fn nnonmissing(&self) -> f64 {
        self.nnonmissing
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sumsq(&self) -> f64 {
        self.sumsq
    }

    /// 没有非缺失值时为 NaN
    pub fn mean(&self) -> f64 {
        if self.nnonmissing == 0.0 {
            f64::NAN
        } else {
            self.sum / self.nnonmissing
        }
    }

    /// 无偏方差；非缺失权重和不超过 1 时为 NaN
    pub fn variance(&self) -> f64 {
        if self.nnonmissing <= 1.0 {
            return f64::NAN;
        }
        let var = (self.sumsq - self.sum * self.sum / self.nnonmissing) / (self.nnonmissing - 1.0);
        var.max(0.0)
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 均值的标准误
    pub fn stderror(&self) -> f64 {
        (self.variance() / self.nnonmissing).sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.nnonmissing == 0.0 { f64::NAN } else { self.min }
    }

    pub fn max(&self) -> f64 {
        if self.nnonmissing == 0.0 { f64::NAN } else { self.max }
    }

    /// 按名字取统计量：E、V、STDDEV、STDERROR、MIN、MAX、N、NMISSING、NNONMISSING、SUM、SUMSQ
    pub fn get_stat(&self, name: &str) -> Result<f64, StatsError> {
        Ok(match name {
            "E" => self.mean(),
            "V" => self.variance(),
            "STDDEV" => self.stddev(),
            "STDERROR" => self.stderror(),
            "MIN" => self.min(),
            "MAX" => self.max(),
            "N" => self.n(),
            "NMISSING" => self.nmissing(),
            "NNONMISSING" => self.nnonmissing(),
            "SUM" => self.sum(),
            "SUMSQ" => self.sumsq(),
            other => return Err(StatsError::UnknownStat(other.to_string())),
        })
    }
}
