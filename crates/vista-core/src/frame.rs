use std::fmt;

use ndarray::{Array3, ArrayView2, Axis};
use num_traits::Float;

use crate::error::{Result, VistaError};

/// Floating-point pixel type a frame stack can hold (`f32` or `f64`).
pub trait Pixel: Float + Send + Sync + fmt::Debug + 'static {}

impl<T: Float + Send + Sync + fmt::Debug + 'static> Pixel for T {}

/// Per-frame acquisition times split into whole seconds and a
/// sub-second offset in nanoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamps {
    seconds: Vec<i64>,
    nanos: Vec<i64>,
}

impl Timestamps {
    pub fn new(seconds: Vec<i64>, nanos: Vec<i64>) -> Result<Self> {
        if seconds.len() != nanos.len() {
            return Err(VistaError::MetadataLength {
                field: "timestamp nanos",
                expected: seconds.len(),
                found: nanos.len(),
            });
        }
        Ok(Self { seconds, nanos })
    }

    pub fn seconds(&self) -> &[i64] {
        &self.seconds
    }

    pub fn nanos(&self) -> &[i64] {
        &self.nanos
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    /// `(seconds, nanos)` for one frame.
    pub fn get(&self, index: usize) -> Option<(i64, i64)> {
        Some((*self.seconds.get(index)?, *self.nanos.get(index)?))
    }
}

/// An immutable stack of equally sized 2-D frames with per-frame metadata.
///
/// Images are stored as a single `(frames, height, width)` array, so every
/// frame is guaranteed to share the same shape. Frame numbers are opaque
/// labels and are carried through processing unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStack<T = f32> {
    name: String,
    images: Array3<T>,
    frame_numbers: Vec<i64>,
    timestamps: Option<Timestamps>,
    description: String,
    row_offset: i64,
    column_offset: i64,
}

impl<T: Pixel> FrameStack<T> {
    pub fn new(name: impl Into<String>, images: Array3<T>, frame_numbers: Vec<i64>) -> Result<Self> {
        let n = images.len_of(Axis(0));
        if frame_numbers.len() != n {
            return Err(VistaError::MetadataLength {
                field: "frame numbers",
                expected: n,
                found: frame_numbers.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            images,
            frame_numbers,
            timestamps: None,
            description: String::new(),
            row_offset: 0,
            column_offset: 0,
        })
    }

    pub fn with_timestamps(mut self, timestamps: Timestamps) -> Result<Self> {
        if timestamps.len() != self.len() {
            return Err(VistaError::MetadataLength {
                field: "timestamps",
                expected: self.len(),
                found: timestamps.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Position of the stack's top-left pixel within the full sensor frame.
    pub fn with_offsets(mut self, row_offset: i64, column_offset: i64) -> Self {
        self.row_offset = row_offset;
        self.column_offset = column_offset;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(height, width)` shared by every frame.
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.images.dim();
        (h, w)
    }

    pub fn images(&self) -> &Array3<T> {
        &self.images
    }

    pub fn frame_numbers(&self) -> &[i64] {
        &self.frame_numbers
    }

    pub fn timestamps(&self) -> Option<&Timestamps> {
        self.timestamps.as_ref()
    }

    pub fn row_offset(&self) -> i64 {
        self.row_offset
    }

    pub fn column_offset(&self) -> i64 {
        self.column_offset
    }

    /// Borrow a single frame.
    pub fn frame(&self, index: usize) -> Result<ArrayView2<'_, T>> {
        if index >= self.len() {
            return Err(VistaError::FrameIndexOutOfRange {
                index,
                total: self.len(),
            });
        }
        Ok(self.images.index_axis(Axis(0), index))
    }

    /// Build a new stack from processed `images`, copying frame numbers,
    /// timestamps and sensor offsets from `self`.
    ///
    /// The new stack owns its buffers; nothing is shared with the source.
    pub fn derive(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        images: Array3<T>,
    ) -> Result<Self> {
        let (n, h, w) = images.dim();
        if n != self.len() {
            return Err(VistaError::MetadataLength {
                field: "frames",
                expected: self.len(),
                found: n,
            });
        }
        if (h, w) != self.frame_shape() {
            return Err(VistaError::ShapeMismatch {
                expected: self.frame_shape(),
                found: (h, w),
            });
        }
        Ok(Self {
            name: name.into(),
            images,
            frame_numbers: self.frame_numbers.clone(),
            timestamps: self.timestamps.clone(),
            description: description.into(),
            row_offset: self.row_offset,
            column_offset: self.column_offset,
        })
    }
}

impl<T> fmt::Display for FrameStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, h, w) = self.images.dim();
        write!(f, "{} ({n} frames, {w}x{h})", self.name)
    }
}
