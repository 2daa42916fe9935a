mod common;

use ndarray::Array3;

use vista_core::error::VistaError;
use vista_core::frame::{FrameStack, Timestamps};

use common::textured_stack;

#[test]
fn test_stack_shape_accessors() {
    let stack = textured_stack(6, 3, 4);
    assert_eq!(stack.len(), 6);
    assert!(!stack.is_empty());
    assert_eq!(stack.frame_shape(), (3, 4));
    assert_eq!(stack.frame(2).unwrap().dim(), (3, 4));
    assert_eq!(stack.to_string(), "textured (6 frames, 4x3)");
}

#[test]
fn test_frame_index_out_of_range() {
    let stack = textured_stack(2, 2, 2);
    assert!(matches!(
        stack.frame(2),
        Err(VistaError::FrameIndexOutOfRange { index: 2, total: 2 })
    ));
}

#[test]
fn test_frame_numbers_length_checked() {
    let images = Array3::<f32>::zeros((3, 2, 2));
    let result = FrameStack::new("bad", images, vec![1, 2]);
    assert!(matches!(
        result,
        Err(VistaError::MetadataLength {
            expected: 3,
            found: 2,
            ..
        })
    ));
}

#[test]
fn test_timestamps_length_checked() {
    assert!(Timestamps::new(vec![1, 2], vec![0]).is_err());

    let images = Array3::<f32>::zeros((3, 2, 2));
    let stack = FrameStack::new("s", images, vec![7, 8, 9]).unwrap();
    let ts = Timestamps::new(vec![1, 2], vec![0, 0]).unwrap();
    assert!(stack.with_timestamps(ts).is_err());
}

#[test]
fn test_frame_numbers_are_opaque_labels() {
    let images = Array3::<f32>::zeros((3, 1, 1));
    let stack = FrameStack::new("s", images, vec![42, -1, 42]).unwrap();
    assert_eq!(stack.frame_numbers(), &[42, -1, 42]);
}

#[test]
fn test_timestamp_lookup() {
    let ts = Timestamps::new(vec![10, 11], vec![500, 0]).unwrap();
    assert_eq!(ts.get(0), Some((10, 500)));
    assert_eq!(ts.get(2), None);
    assert_eq!(ts.seconds(), &[10, 11]);
    assert_eq!(ts.nanos(), &[500, 0]);
    assert_eq!(ts.len(), 2);
    assert!(!ts.is_empty());
}

#[test]
fn test_description_is_replaced_on_derive() {
    let source = textured_stack(3, 2, 2).with_description("raw capture");
    assert_eq!(source.description(), "raw capture");

    let derived = source
        .derive("out", "Processed", Array3::<f32>::zeros((3, 2, 2)))
        .unwrap();
    assert_eq!(derived.description(), "Processed");
    assert_eq!(source.description(), "raw capture");
}

#[test]
fn test_derive_copies_metadata_and_owns_buffers() {
    let source = textured_stack(4, 2, 3).with_offsets(10, 20);
    let images = Array3::<f32>::ones((4, 2, 3));
    let derived = source.derive("out", "desc", images).unwrap();

    assert_eq!(derived.name(), "out");
    assert_eq!(derived.description(), "desc");
    assert_eq!(derived.frame_numbers(), source.frame_numbers());
    assert_eq!(derived.timestamps(), source.timestamps());
    assert_eq!(derived.row_offset(), 10);
    assert_eq!(derived.column_offset(), 20);
    assert_ne!(derived.images().as_ptr(), source.images().as_ptr());
}

#[test]
fn test_derive_rejects_wrong_shape() {
    let source = textured_stack(4, 2, 3);
    assert!(matches!(
        source.derive("out", "", Array3::<f32>::zeros((4, 3, 3))),
        Err(VistaError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        source.derive("out", "", Array3::<f32>::zeros((5, 2, 3))),
        Err(VistaError::MetadataLength { .. })
    ));
}
