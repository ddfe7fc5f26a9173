use super::DataError;
use crate::tensor::Tensor;

/// 一个 (mini)batch：输入、目标、样本权重三个张量行数相同
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Tensor,
    pub targets: Tensor,
    /// [n, 1]；数据没有权重列时全为 1
    pub weights: Tensor,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.inputs.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 权重之和
    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }
}

/// 数据矩阵
pub trait VMat: Send + Sync {
    /// 行数
    fn length(&self) -> usize;

    /// 列数
    fn width(&self) -> usize;

    fn get_row(&self, i: usize) -> Result<Vec<f64>, DataError>;

    fn inputsize(&self) -> usize;

    fn targetsize(&self) -> usize;

    /// 0 或 1
    fn weightsize(&self) -> usize;

    /// 校验三个尺寸与宽度一致
    fn check_layout(&self) -> Result<(), DataError> {
        let (is, ts, ws) = (self.inputsize(), self.targetsize(), self.weightsize());
        if ws > 1 || is + ts + ws != self.width() {
            return Err(DataError::LayoutMismatch {
                inputsize: is,
                targetsize: ts,
                weightsize: ws,
                width: self.width(),
            });
        }
        Ok(())
    }

    /// 把第`i`行拆成 (输入, 目标, 权重)
    fn get_example(&self, i: usize) -> Result<(Vec<f64>, Vec<f64>, f64), DataError> {
        self.check_layout()?;
        let row = self.get_row(i)?;
        let (is, ts) = (self.inputsize(), self.targetsize());
        let weight = if self.weightsize() == 1 { row[is + ts] } else { 1.0 };
        Ok((row[..is].to_vec(), row[is..is + ts].to_vec(), weight))
    }

    /// 取出[start, end)行组成一个 batch
    fn get_batch(&self, start: usize, end: usize) -> Result<Batch, DataError> {
        self.check_layout()?;
        if start > end || end > self.length() {
            return Err(DataError::IndexOutOfBounds {
                index: end,
                len: self.length(),
            });
        }
        let n = end - start;
        let (is, ts) = (self.inputsize(), self.targetsize());
        let mut inputs = Vec::with_capacity(n * is);
        let mut targets = Vec::with_capacity(n * ts);
        let mut weights = Vec::with_capacity(n);
        for i in start..end {
            let (input, target, weight) = self.get_example(i)?;
            inputs.extend(input);
            targets.extend(target);
            weights.push(weight);
        }
        Ok(Batch {
            inputs: Tensor::try_new(&inputs, &[n, is])?,
            targets: Tensor::try_new(&targets, &[n, ts])?,
            weights: Tensor::try_new(&weights, &[n, 1])?,
        })
    }
}
