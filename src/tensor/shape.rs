use super::Tensor;
use crate::errors::{Operator, TensorError};
use ndarray::{concatenate, s, Axis};

impl Tensor {
    pub fn transpose(&self) -> Self {
        Tensor::from_array(self.data.t().to_owned())
    }

    /// 取出[start, end)区间的行，组成新张量
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Self, TensorError> {
        if start > end || end > self.rows() {
            return Err(TensorError::RowRangeOutOfBounds {
                start,
                end,
                rows: self.rows(),
            });
        }
        Ok(Tensor::from_array(self.data.slice(s![start..end, ..]).to_owned()))
    }

    /// 取出[start, end)区间的列，组成新张量
    pub fn slice_cols(&self, start: usize, end: usize) -> Self {
        Tensor::from_array(self.data.slice(s![.., start..end]).to_owned())
    }

    /// 将`src`的所有行写入本张量从`start_row`开始的行
    pub fn assign_rows(&mut self, start_row: usize, src: &Tensor) -> Result<(), TensorError> {
        let end = start_row + src.rows();
        if end > self.rows() || src.cols() != self.cols() {
            return Err(TensorError::RowRangeOutOfBounds {
                start: start_row,
                end,
                rows: self.rows(),
            });
        }
        self.data
            .slice_mut(s![start_row..end, ..])
            .assign(&src.data);
        Ok(())
    }

    /// 将若干行数相同的张量按列拼接
    pub fn concat_cols(tensors: &[&Tensor]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        for t in tensors.iter().skip(1) {
            if t.rows() != first.rows() {
                return Err(TensorError::OperatorError {
                    operator: Operator::ConcatColumns,
                    tensor1_shape: first.shape().to_vec(),
                    tensor2_shape: t.shape().to_vec(),
                });
            }
        }
        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        let data = concatenate(Axis(1), &views).map_err(|_| TensorError::EmptyList)?;
        Ok(Tensor::from_array(data))
    }

    /// 将若干列数相同的张量按行堆叠
    pub fn stack_rows(tensors: &[&Tensor]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        for t in tensors.iter().skip(1) {
            if t.cols() != first.cols() {
                return Err(TensorError::OperatorError {
                    operator: Operator::ConcatColumns,
                    tensor1_shape: first.shape().to_vec(),
                    tensor2_shape: t.shape().to_vec(),
                });
            }
        }
        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        let data = concatenate(Axis(0), &views).map_err(|_| TensorError::EmptyList)?;
        Ok(Tensor::from_array(data))
    }
}
