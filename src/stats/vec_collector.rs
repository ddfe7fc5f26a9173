use serde::{Deserialize, Serialize};

use super::{StatsCollector, StatsError};

/// 对一个向量的每个分量各维护一个`StatsCollector`，分量可以命名（通常是代价名）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VecStatsCollector {
    fieldnames: Vec<String>,
    stats: Vec<StatsCollector>,
    finalized: bool,
}

impl VecStatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fieldnames(fieldnames: &[String]) -> Self {
        let mut collector = Self::new();
        collector.set_fieldnames(fieldnames);
        collector
    }

    /// 设置分量名并清空已有统计
    pub fn set_fieldnames(&mut self, fieldnames: &[String]) {
        self.fieldnames = fieldnames.to_vec();
        self.forget();
    }

    pub fn fieldnames(&self) -> &[String] {
        &self.fieldnames
    }

    pub fn width(&self) -> usize {
        self.stats.len()
    }

    pub fn forget(&mut self) {
        self.stats = vec![StatsCollector::default(); self.fieldnames.len()];
        self.finalized = false;
    }

    /// 累积一个观测向量。未命名且尚无数据时，宽度由第一次更新决定
    pub fn update(&mut self, values: &[f64], weight: f64) -> Result<(), StatsError> {
        if self.stats.is_empty() && self.fieldnames.is_empty() {
            self.stats = vec![StatsCollector::default(); values.len()];
        }
        if values.len() != self.stats.len() {
            return Err(StatsError::WidthMismatch {
                expected: self.stats.len(),
                got: values.len(),
            });
        }
        for (stat, &v) in self.stats.iter_mut().zip(values) {
            stat.update(v, weight);
        }
        self.finalized = false;
        Ok(())
    }

    /// 标记一轮累积结束
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// 合并另一个收集器（并行测试时按切片顺序调用；结果与顺序无关）
    pub fn merge(&mut self, other: &VecStatsCollector) -> Result<(), StatsError> {
        if self.stats.is_empty() && self.fieldnames.is_empty() {
            self.fieldnames = other.fieldnames.clone();
            self.stats = vec![StatsCollector::default(); other.stats.len()];
        }
        if other.stats.len() != self.stats.len() {
            return Err(StatsError::WidthMismatch {
                expected: self.stats.len(),
                got: other.stats.len(),
            });
        }
        for (mine, theirs) in self.stats.iter_mut().zip(&other.stats) {
            mine.merge(theirs);
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&StatsCollector> {
        self.stats.get(index)
    }

    /// 各分量的均值
    pub fn mean(&self) -> Vec<f64> {
        self.stats.iter().map(StatsCollector::mean).collect()
    }

    pub fn field_index(&self, field: &str) -> Result<usize, StatsError> {
        if let Some(i) = self.fieldnames.iter().position(|f| f == field) {
            return Ok(i);
        }
        field
            .parse::<usize>()
            .ok()
            .filter(|&i| i < self.stats.len())
            .ok_or_else(|| StatsError::UnknownField(field.to_string()))
    }

    /// 形如`E[class_error]`或`STDERROR[0]`的统计量
    pub fn get_stat(&self, spec: &str) -> Result<f64, StatsError> {
        let (stat, field) = spec
            .strip_suffix(']')
            .and_then(|s| s.split_once('['))
            .ok_or_else(|| StatsError::UnknownStat(spec.to_string()))?;
        let index = self.field_index(field)?;
        self.stats[index].get_stat(stat)
    }

    pub fn to_json(&self) -> Result<String, StatsError> {
        serde_json::to_string_pretty(self).map_err(|e| StatsError::Serialize(e.to_string()))
    }
}
