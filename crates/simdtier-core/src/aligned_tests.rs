//! Tests for `AlignedBuffer`.

use crate::aligned::AlignedBuffer;
use crate::error::Error;
use crate::selector::required_alignment;

#[test]
fn test_zeroed_uses_selected_alignment() {
    let buf = AlignedBuffer::zeroed(1000).unwrap();
    assert_eq!(buf.len(), 1000);
    assert_eq!(buf.alignment(), required_alignment());
    assert_eq!(buf.as_ptr() as usize % required_alignment(), 0);
    assert!(buf.iter().all(|&x| x == 0.0));
}

#[test]
fn test_from_slice_copies_values() {
    let values: Vec<f32> = (0..37).map(|i| i as f32 * 0.5).collect();
    let buf = AlignedBuffer::from_slice(&values).unwrap();
    assert_eq!(&buf[..], &values[..]);
    assert_eq!(buf.as_ptr() as usize % required_alignment(), 0);
}

#[test]
fn test_custom_alignment() {
    for align in [4, 16, 32, 64, 128, 4096] {
        let mut buf = AlignedBuffer::with_alignment(13, align).unwrap();
        assert_eq!(buf.alignment(), align);
        assert_eq!(buf.as_mut_ptr() as usize % align, 0, "align {align}");
        buf[12] = 3.0;
        assert_eq!(buf[12], 3.0);
    }
}

#[test]
fn test_small_alignment_is_raised() {
    let buf = AlignedBuffer::with_alignment(4, 1).unwrap();
    assert_eq!(buf.alignment(), 4);
}

#[test]
fn test_empty_buffer() {
    let buf = AlignedBuffer::with_alignment(0, 64).unwrap();
    assert!(buf.is_empty());
    assert_eq!(buf.alignment(), 64);
    assert_eq!(buf.as_ptr() as usize % 64, 0);
    assert_eq!(&buf[..], &[] as &[f32]);

    let copy = buf.clone();
    assert!(copy.is_empty());
}

#[test]
fn test_non_power_of_two_alignment_is_rejected() {
    let err = AlignedBuffer::with_alignment(8, 24).unwrap_err();
    assert_eq!(err, Error::InvalidLayout { len: 8, align: 24 });
}

#[test]
fn test_overflowing_length_is_rejected() {
    let err = AlignedBuffer::with_alignment(usize::MAX, 32).unwrap_err();
    assert!(matches!(err, Error::InvalidLayout { len: usize::MAX, align: 32 }));
}

#[test]
fn test_clone_is_independent() {
    let mut original = AlignedBuffer::from_slice(&[1.0, 2.0, 3.0]).unwrap();
    let copy = original.clone();
    original[0] = 9.0;
    assert_eq!(&copy[..], &[1.0, 2.0, 3.0]);
    assert_eq!(copy.alignment(), original.alignment());
    assert_ne!(copy.as_ptr(), original.as_ptr());
}

#[test]
fn test_debug_omits_contents() {
    let buf = AlignedBuffer::with_alignment(3, 32).unwrap();
    let text = format!("{buf:?}");
    assert!(text.contains("len: 3"));
    assert!(text.contains("alignment: 32"));
}

#[test]
fn test_buffer_moves_across_threads() {
    let mut buf = AlignedBuffer::zeroed(64).unwrap();
    buf.iter_mut().for_each(|x| *x = 2.0);
    let sum = std::thread::spawn(move || buf.iter().sum::<f32>())
        .join()
        .unwrap();
    assert_eq!(sum, 128.0);
}

#[test]
fn test_works_with_dispatched_kernels() {
    let a = AlignedBuffer::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = AlignedBuffer::from_slice(&[2.0, 3.0, 4.0, 4.0]).unwrap();
    assert_eq!(crate::kernels::dot(&a, &b), 36.0);
}
