use super::{DataError, VMat};
use crate::tensor::Tensor;

/// 数据全部放在内存中的数据矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryVMatrix {
    data: Tensor,
    inputsize: usize,
    targetsize: usize,
    weightsize: usize,
}

impl MemoryVMatrix {
    pub fn new(
        data: Tensor,
        inputsize: usize,
        targetsize: usize,
        weightsize: usize,
    ) -> Result<Self, DataError> {
        let vmat = Self {
            data,
            inputsize,
            targetsize,
            weightsize,
        };
        vmat.check_layout()?;
        Ok(vmat)
    }

    pub fn from_rows(
        rows: &[Vec<f64>],
        inputsize: usize,
        targetsize: usize,
        weightsize: usize,
    ) -> Result<Self, DataError> {
        let width = inputsize + targetsize + weightsize;
        Self::new(Tensor::from_rows(rows, width)?, inputsize, targetsize, weightsize)
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }
}

impl VMat for MemoryVMatrix {
    fn length(&self) -> usize {
        self.data.rows()
    }

    fn width(&self) -> usize {
        self.data.cols()
    }

    fn get_row(&self, i: usize) -> Result<Vec<f64>, DataError> {
        if i >= self.length() {
            return Err(DataError::IndexOutOfBounds {
                index: i,
                len: self.length(),
            });
        }
        Ok(self.data.row(i).to_vec())
    }

    fn inputsize(&self) -> usize {
        self.inputsize
    }

    fn targetsize(&self) -> usize {
        self.targetsize
    }

    fn weightsize(&self) -> usize {
        self.weightsize
    }
}
