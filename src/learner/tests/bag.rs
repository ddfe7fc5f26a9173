use crate::assert_err;
use crate::data::DataError;
use crate::learner::{split_bags, BagBuffer, BagTag};

#[test]
fn test_tag_values() {
    for tag in [BagTag::Middle, BagTag::First, BagTag::Last, BagTag::Singleton] {
        assert_eq!(BagTag::from_f64(tag.as_f64()).unwrap(), tag);
    }
    assert!(BagTag::Singleton.starts_bag() && BagTag::Singleton.ends_bag());
    assert!(!BagTag::Middle.starts_bag() && !BagTag::Middle.ends_bag());
    assert_err!(BagTag::from_f64(4.0), DataError::MalformedBag(_));
    assert_err!(BagTag::from_f64(1.5), DataError::MalformedBag(_));
}

#[test]
fn test_buffer_collects_one_bag() {
    let mut buffer = BagBuffer::new();
    assert!(!buffer.push(BagTag::First, &[0.1]).unwrap());
    assert!(!buffer.push(BagTag::Middle, &[0.2]).unwrap());
    assert!(buffer.is_open());
    assert!(buffer.push(BagTag::Last, &[0.3]).unwrap());
    assert!(!buffer.is_open());
    assert_eq!(buffer.take(), vec![vec![0.1], vec![0.2], vec![0.3]]);
    assert!(buffer.is_empty());

    assert!(buffer.push(BagTag::Singleton, &[0.9]).unwrap());
    assert_eq!(buffer.len(), 1);
}

#[test]
fn test_buffer_rejects_malformed_sequences() {
    let mut buffer = BagBuffer::new();
    assert_err!(buffer.push(BagTag::Middle, &[0.0]), DataError::MalformedBag(_));
    assert_err!(buffer.push(BagTag::Last, &[0.0]), DataError::MalformedBag(_));

    buffer.push(BagTag::First, &[0.0]).unwrap();
    assert_err!(buffer.push(BagTag::First, &[0.0]), DataError::MalformedBag(_));
    assert_err!(buffer.push(BagTag::Singleton, &[0.0]), DataError::MalformedBag(_));

    buffer.clear();
    assert!(!buffer.is_open());
    assert!(buffer.push(BagTag::Singleton, &[0.0]).unwrap());
}

#[test]
fn test_split_bags() {
    let tags = [1.0, 0.0, 2.0, 3.0, 1.0, 2.0];
    assert_eq!(split_bags(tags).unwrap(), vec![0..3, 3..4, 4..6]);
    assert!(split_bags([]).unwrap().is_empty());
    assert_err!(split_bags([1.0, 0.0]), DataError::MalformedBag(msg) if msg.contains("尚未结束"));
    assert_err!(split_bags([2.0]), DataError::MalformedBag(_));
}
