use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_slice_and_assign_rows() {
    let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
    let middle = a.slice_rows(1, 2).unwrap();
    assert_eq!(middle, Tensor::new(&[3.0, 4.0], &[1, 2]));
    assert!(a.slice_rows(2, 4).is_err());

    let mut b = Tensor::zeros(&[3, 2]);
    b.assign_rows(2, &middle).unwrap();
    assert_eq!(b.get(2, 0), 3.0);
    assert_eq!(b.get(2, 1), 4.0);
    assert!(b.assign_rows(3, &middle).is_err());
}

#[test]
fn test_concat_and_stack() {
    let a = Tensor::new(&[1.0, 2.0], &[2, 1]);
    let b = Tensor::new(&[3.0, 4.0, 5.0, 6.0], &[2, 2]);
    let c = Tensor::concat_cols(&[&a, &b]).unwrap();
    assert_eq!(c, Tensor::new(&[1.0, 3.0, 4.0, 2.0, 5.0, 6.0], &[2, 3]));

    let s = Tensor::stack_rows(&[&b, &b]).unwrap();
    assert_eq!(s.shape(), &[4, 2]);
    assert!(Tensor::concat_cols(&[]).is_err());
}

#[test]
fn test_seeded_random_is_reproducible() {
    let mut rng1 = StdRng::seed_from_u64(7);
    let mut rng2 = StdRng::seed_from_u64(7);
    let a = Tensor::normal_with_rng(0.0, 1.0, &[3, 4], &mut rng1);
    let b = Tensor::normal_with_rng(0.0, 1.0, &[3, 4], &mut rng2);
    assert_eq!(a, b);
    let u = Tensor::uniform_with_rng(-0.5, 0.5, &[10, 10], &mut rng1);
    assert!(u.data_as_slice().iter().all(|x| (-0.5..0.5).contains(x)));
}
