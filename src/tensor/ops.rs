/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-16
 * @Description  : 张量的逐元素运算（+、-、*）与矩阵乘法。
 *                 两个张量之间的逐元素运算要求形状严格一致，否则panic（与纯数的运算则广播到每个元素）。
 */

use super::Tensor;
use crate::errors::{Operator, TensorError};
use ndarray::{Axis, Zip};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

fn assert_same_shape(a: &Tensor, b: &Tensor, operator: Operator) {
    assert!(
        a.is_same_shape(b),
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: a.shape().to_vec(),
            tensor2_shape: b.shape().to_vec(),
        }
    );
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓带引用的张量 ± 带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl<'a> Add<&'a Tensor> for &'a Tensor {
    type Output = Tensor;

    fn add(self, other: &'a Tensor) -> Tensor {
        assert_same_shape(self, other, Operator::Add);
        Tensor::from_array(&self.data + &other.data)
    }
}
impl Add for Tensor {
    type Output = Tensor;

    fn add(self, other: Tensor) -> Tensor {
        &self + &other
    }
}
impl<'a> Sub<&'a Tensor> for &'a Tensor {
    type Output = Tensor;

    fn sub(self, other: &'a Tensor) -> Tensor {
        assert_same_shape(self, other, Operator::Sub);
        Tensor::from_array(&self.data - &other.data)
    }
}
impl Sub for Tensor {
    type Output = Tensor;

    fn sub(self, other: Tensor) -> Tensor {
        &self - &other
    }
}
/// 逐元素相乘（Hadamard积）
impl<'a> Mul<&'a Tensor> for &'a Tensor {
    type Output = Tensor;

    fn mul(self, other: &'a Tensor) -> Tensor {
        assert_same_shape(self, other, Operator::Mul);
        Tensor::from_array(&self.data * &other.data)
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑带引用的张量 ± 带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓张量与纯数↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl Mul<f64> for &Tensor {
    type Output = Tensor;

    fn mul(self, scalar: f64) -> Tensor {
        Tensor::from_array(&self.data * scalar)
    }
}
impl Mul<f64> for Tensor {
    type Output = Tensor;

    fn mul(self, scalar: f64) -> Tensor {
        &self * scalar
    }
}
impl Mul<&Tensor> for f64 {
    type Output = Tensor;

    fn mul(self, tensor: &Tensor) -> Tensor {
        tensor * self
    }
}
impl Add<f64> for &Tensor {
    type Output = Tensor;

    fn add(self, scalar: f64) -> Tensor {
        Tensor::from_array(&self.data + scalar)
    }
}
impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        self * -1.0
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑张量与纯数↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓自运算↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, other: &Tensor) {
        assert_same_shape(self, other, Operator::AddAssign);
        self.data += &other.data;
    }
}
impl SubAssign<&Tensor> for Tensor {
    fn sub_assign(&mut self, other: &Tensor) {
        assert_same_shape(self, other, Operator::SubAssign);
        self.data -= &other.data;
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑自运算↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

impl Tensor {
    /// 矩阵乘法：[m, k] x [k, n] -> [m, n]
    pub fn mat_mul(&self, other: &Tensor) -> Tensor {
        assert!(
            self.cols() == other.rows(),
            "{}",
            TensorError::OperatorError {
                operator: Operator::MatMul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        Tensor::from_array(self.data.dot(&other.data))
    }

    /// 逐元素映射
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        Tensor::from_array(self.data.mapv(f))
    }

    /// 两个同形状张量的逐元素映射
    pub fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &Tensor, f: F) -> Tensor {
        assert_same_shape(self, other, Operator::Mul);
        let mut out = self.data.clone();
        Zip::from(&mut out)
            .and(&other.data)
            .for_each(|a, &b| *a = f(*a, b));
        Tensor::from_array(out)
    }

    /// 所有元素之和
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// 平方和
    pub fn sum_of_squares(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// 按列求和，得到形状为[1, cols]的张量
    pub fn sum_rows(&self) -> Tensor {
        let summed = self.data.sum_axis(Axis(0));
        let cols = summed.len();
        Tensor::new(&summed.to_vec(), &[1, cols])
    }

    /// 每行最大元素的下标
    pub fn argmax_per_row(&self) -> Vec<usize> {
        self.data
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (j, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }
}
