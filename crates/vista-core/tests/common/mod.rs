#![allow(dead_code)]

use ndarray::Array3;

use vista_core::frame::{FrameStack, Timestamps};

/// Stack where every pixel of frame `i` equals `values[i]`.
pub fn constant_stack(values: &[f32], h: usize, w: usize) -> FrameStack<f32> {
    let mut images = Array3::<f32>::zeros((values.len(), h, w));
    for (i, v) in values.iter().enumerate() {
        images.index_axis_mut(ndarray::Axis(0), i).fill(*v);
    }
    let frame_numbers = (0..values.len() as i64).map(|i| 100 + i * 2).collect();
    FrameStack::new("scene", images, frame_numbers).expect("valid stack")
}

/// Stack where every pixel of frame `i` equals `i`.
pub fn indexed_stack(n: usize, h: usize, w: usize) -> FrameStack<f32> {
    let values: Vec<f32> = (0..n).map(|i| i as f32).collect();
    constant_stack(&values, h, w)
}

/// Stack with a per-pixel pattern that varies over frames and position.
pub fn textured_stack(n: usize, h: usize, w: usize) -> FrameStack<f32> {
    let images = Array3::from_shape_fn((n, h, w), |(f, r, c)| {
        (((f * 7 + r * 3 + c * 5) % 11) as f32) / 10.0
    });
    let frame_numbers = (0..n as i64).collect();
    let seconds = (0..n as i64).map(|i| 1_700_000_000 + i).collect();
    let nanos = (0..n as i64).map(|i| i * 1_000).collect();
    FrameStack::new("textured", images, frame_numbers)
        .expect("valid stack")
        .with_timestamps(Timestamps::new(seconds, nanos).expect("valid timestamps"))
        .expect("timestamps match frames")
}
