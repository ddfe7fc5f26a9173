/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-16
 * @Description  : 张量：计算图中每个节点的值与梯度缓冲。
 *                 约定所有张量都是 2 维的 [行, 列]，其中行对应 (mini)batch 中的样本，列对应特征。
 */

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::TensorError;

mod ops;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。本库中张量固定为 2 维（标量即形状为[1, 1]的张量）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Array2<f64>,
}

impl Tensor {
    /// 创建一个张量。`shape`必须为 2 维，且`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    pub fn new(data: &[f64], shape: &[usize]) -> Tensor {
        match Self::try_new(data, shape) {
            Ok(tensor) => tensor,
            Err(e) => panic!("{}", e),
        }
    }

    /// `new`的非panic版本
    pub fn try_new(data: &[f64], shape: &[usize]) -> Result<Tensor, TensorError> {
        if shape.len() != 2 {
            return Err(TensorError::NotTwoDimensional(shape.to_vec()));
        }
        if data.len() != shape[0] * shape[1] {
            return Err(TensorError::DataLengthMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            });
        }
        let data = Array2::from_shape_vec((shape[0], shape[1]), data.to_vec())
            .map_err(|_| TensorError::NotTwoDimensional(shape.to_vec()))?;
        Ok(Tensor { data })
    }

    pub fn from_array(data: Array2<f64>) -> Tensor {
        Tensor {
            data: data.as_standard_layout().into_owned(),
        }
    }

    /// 由若干等长的行构成张量；行数为0时返回形状为[0, width]的张量
    pub fn from_rows(rows: &[Vec<f64>], width: usize) -> Result<Tensor, TensorError> {
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(TensorError::DataLengthMismatch {
                    data_len: row.len(),
                    shape: vec![1, width],
                });
            }
            data.extend_from_slice(row);
        }
        Self::try_new(&data, &[rows.len(), width])
    }

    pub fn scalar(value: f64) -> Tensor {
        Tensor::new(&[value], &[1, 1])
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Self::filled(0.0, shape)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Self::filled(1.0, shape)
    }

    pub fn filled(value: f64, shape: &[usize]) -> Tensor {
        assert!(
            shape.len() == 2,
            "{}",
            TensorError::NotTwoDimensional(shape.to_vec())
        );
        Tensor {
            data: Array2::from_elem((shape[0], shape[1]), value),
        }
    }

    /// 用给定的随机数生成器创建一个服从均匀分布 [low, high) 的张量
    pub fn uniform_with_rng(low: f64, high: f64, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let dist = Uniform::new(low, high);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 用给定的随机数生成器创建一个服从正态分布的张量（Box-Muller）
    pub fn normal_with_rng(mean: f64, std_dev: f64, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f64 = rng.r#gen();
            let u2: f64 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }
}

// 属性
impl Tensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// 元素总数
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 若为形状[1, 1]的标量，返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f64> {
        if self.shape() == [1, 1] {
            Some(self.data[[0, 0]])
        } else {
            None
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[[row, col]] = value;
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    pub fn data_as_slice(&self) -> &[f64] {
        // 构造时保证了标准（行优先）布局
        self.data
            .as_slice()
            .unwrap_or_else(|| unreachable!("张量数据总是以行优先的连续内存存放"))
    }

    pub fn data_as_slice_mut(&mut self) -> &mut [f64] {
        self.data
            .as_slice_mut()
            .unwrap_or_else(|| unreachable!("张量数据总是以行优先的连续内存存放"))
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data_as_slice().to_vec()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
