//! 数据矩阵单元测试

use crate::data::{DataError, MemoryVMatrix, SubVMatrix, VMat};
use crate::tensor::Tensor;

fn weighted_rows() -> MemoryVMatrix {
    // 2 列输入 + 1 列目标 + 1 列权重
    let rows: Vec<Vec<f64>> = (0..5)
        .map(|i| vec![i as f64, 10.0 + i as f64, (i % 2) as f64, 0.5])
        .collect();
    MemoryVMatrix::from_rows(&rows, 2, 1, 1).unwrap()
}

#[test]
fn test_memory_vmatrix_basic() {
    let vmat = weighted_rows();
    assert_eq!(vmat.length(), 5);
    assert_eq!(vmat.width(), 4);
    assert_eq!(vmat.get_row(3).unwrap(), vec![3.0, 13.0, 1.0, 0.5]);
    assert_eq!(
        vmat.get_row(5),
        Err(DataError::IndexOutOfBounds { index: 5, len: 5 })
    );
}

#[test]
fn test_get_example_splits_columns() {
    let vmat = weighted_rows();
    let (input, target, weight) = vmat.get_example(2).unwrap();
    assert_eq!(input, vec![2.0, 12.0]);
    assert_eq!(target, vec![0.0]);
    assert_eq!(weight, 0.5);
}

#[test]
fn test_default_weight_is_one() {
    let vmat = MemoryVMatrix::new(Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]), 1, 1, 0).unwrap();
    let batch = vmat.get_batch(0, 2).unwrap();
    assert_eq!(batch.weights, Tensor::ones(&[2, 1]));
    assert_eq!(batch.total_weight(), 2.0);
}

#[test]
fn test_layout_mismatch() {
    let data = Tensor::zeros(&[3, 4]);
    assert!(matches!(
        MemoryVMatrix::new(data.clone(), 2, 1, 0),
        Err(DataError::LayoutMismatch { width: 4, .. })
    ));
    // 权重列最多 1 列
    assert!(matches!(
        MemoryVMatrix::new(data, 1, 1, 2),
        Err(DataError::LayoutMismatch { .. })
    ));
}

#[test]
fn test_get_batch() {
    let vmat = weighted_rows();
    let batch = vmat.get_batch(1, 4).unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.inputs.shape(), &[3, 2]);
    assert_eq!(batch.targets.to_vec(), vec![1.0, 0.0, 1.0]);
    assert_eq!(batch.weights.to_vec(), vec![0.5, 0.5, 0.5]);

    assert!(vmat.get_batch(3, 3).unwrap().is_empty());
    assert!(matches!(
        vmat.get_batch(2, 6),
        Err(DataError::IndexOutOfBounds { index: 6, len: 5 })
    ));
}

#[test]
fn test_sub_vmatrix() {
    let vmat = weighted_rows();
    let sub = SubVMatrix::new(&vmat, 2, 3).unwrap();
    assert_eq!(sub.length(), 3);
    assert_eq!(sub.start(), 2);
    assert_eq!(sub.inputsize(), 2);
    assert_eq!(sub.weightsize(), 1);
    assert_eq!(sub.get_row(0).unwrap(), vmat.get_row(2).unwrap());
    assert_eq!(
        sub.get_row(3),
        Err(DataError::IndexOutOfBounds { index: 3, len: 3 })
    );
    assert_eq!(
        sub.get_batch(0, 3).unwrap(),
        vmat.get_batch(2, 5).unwrap()
    );

    assert!(SubVMatrix::new(&vmat, 3, 3).is_err());
    // 空切片合法
    assert_eq!(SubVMatrix::new(&vmat, 5, 0).unwrap().length(), 0);
}
