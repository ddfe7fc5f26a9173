use super::{DataError, VMat};

/// 另一个数据矩阵中[start, start + length)行的只读视图，列布局与源矩阵相同
pub struct SubVMatrix<'a> {
    source: &'a dyn VMat,
    start: usize,
    length: usize,
}

impl<'a> SubVMatrix<'a> {
    pub fn new(source: &'a dyn VMat, start: usize, length: usize) -> Result<Self, DataError> {
        if start + length > source.length() {
            return Err(DataError::IndexOutOfBounds {
                index: start + length,
                len: source.length(),
            });
        }
        Ok(Self {
            source,
            start,
            length,
        })
    }

    pub const fn start(&self) -> usize {
        self.start
    }
}

impl VMat for SubVMatrix<'_> {
    fn length(&self) -> usize {
        self.length
    }

    fn width(&self) -> usize {
        self.source.width()
    }

    fn get_row(&self, i: usize) -> Result<Vec<f64>, DataError> {
        if i >= self.length {
            return Err(DataError::IndexOutOfBounds {
                index: i,
                len: self.length,
            });
        }
        self.source.get_row(self.start + i)
    }

    fn inputsize(&self) -> usize {
        self.source.inputsize()
    }

    fn targetsize(&self) -> usize {
        self.source.targetsize()
    }

    fn weightsize(&self) -> usize {
        self.source.weightsize()
    }
}
