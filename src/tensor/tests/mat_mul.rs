use crate::tensor::Tensor;

#[test]
fn test_mat_mul_vector_vector() {
    // 结果为标量的情况
    let a = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    let b = Tensor::new(&[4.0, 5.0, 6.0], &[3, 1]);
    let result = a.mat_mul(&b);
    assert_eq!(result.number(), Some(32.0));
    // 结果为矩阵的情况
    let result = b.mat_mul(&a);
    let expected = Tensor::new(&[4.0, 8.0, 12.0, 5.0, 10.0, 15.0, 6.0, 12.0, 18.0], &[3, 3]);
    assert_eq!(result, expected);
}

#[test]
fn test_mat_mul_matrix_vector() {
    let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let b = Tensor::new(&[5.0, 6.0], &[2, 1]);
    assert_eq!(a.mat_mul(&b), Tensor::new(&[17.0, 39.0], &[2, 1]));
}

#[test]
#[should_panic(expected = "形状不一致，故无法矩阵相乘")]
fn test_mat_mul_shape_mismatch() {
    let a = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    let b = Tensor::new(&[1.0, 2.0], &[1, 2]);
    let _ = a.mat_mul(&b);
}

#[test]
fn test_transpose_keeps_row_major_layout() {
    let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let t = a.transpose();
    assert_eq!(t.shape(), &[3, 2]);
    assert_eq!(t.data_as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}
