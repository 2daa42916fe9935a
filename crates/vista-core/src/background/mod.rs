pub mod config;
pub mod temporal_median;

pub use config::{OutputMode, TemporalMedianConfig};
pub use temporal_median::TemporalMedian;

use ndarray::{Array2, Array3, Axis};
use tracing::info;

use crate::error::{Result, VistaError};
use crate::frame::{FrameStack, Pixel};

/// A background-removal algorithm driven one frame at a time.
///
/// The job controller and the batch runner depend only on this trait, so any
/// algorithm that can produce `(index, frame)` pairs on demand can run under
/// either of them.
pub trait BackgroundRemoval<T: Pixel>: Send {
    /// Short display name, appended to the source name to name the output.
    fn name(&self) -> &str;

    /// Description attached to the output stack.
    fn description(&self) -> String {
        format!("Processed with {}", self.name())
    }

    /// Number of calls to `step` needed to process every frame.
    fn total_frames(&self) -> usize;

    /// Process the next frame. Calling past the last frame is an error.
    fn step(&mut self) -> Result<(usize, Array2<T>)>;
}

/// Name of a stack produced by running `algorithm_name` over `source`.
pub fn output_name<T: Pixel>(source: &FrameStack<T>, algorithm_name: &str) -> String {
    format!("{} {}", source.name(), algorithm_name)
}

/// Collects per-frame results until every frame of the source is filled.
pub(crate) struct OutputAccumulator<T> {
    images: Array3<T>,
    filled: Vec<bool>,
}

impl<T: Pixel> OutputAccumulator<T> {
    pub(crate) fn new(source: &FrameStack<T>) -> Self {
        let (h, w) = source.frame_shape();
        Self {
            images: Array3::zeros((source.len(), h, w)),
            filled: vec![false; source.len()],
        }
    }

    pub(crate) fn insert(&mut self, index: usize, frame: &Array2<T>) -> Result<()> {
        let (total, h, w) = self.images.dim();
        if index >= total {
            return Err(VistaError::FrameIndexOutOfRange { index, total });
        }
        if frame.dim() != (h, w) {
            return Err(VistaError::ShapeMismatch {
                expected: (h, w),
                found: frame.dim(),
            });
        }
        self.images.index_axis_mut(Axis(0), index).assign(frame);
        self.filled[index] = true;
        Ok(())
    }

    pub(crate) fn finish(
        self,
        source: &FrameStack<T>,
        name: String,
        description: String,
    ) -> Result<FrameStack<T>> {
        if let Some(missing) = self.filled.iter().position(|f| !f) {
            return Err(VistaError::Processing(format!(
                "frame {missing} was never produced"
            )));
        }
        source.derive(name, description, self.images)
    }
}

/// Run `algorithm` over every frame of `source` on the calling thread.
pub fn run_to_completion<T: Pixel>(
    algorithm: &mut dyn BackgroundRemoval<T>,
    source: &FrameStack<T>,
) -> Result<FrameStack<T>> {
    let total = algorithm.total_frames();
    if total != source.len() {
        return Err(VistaError::MetadataLength {
            field: "frames",
            expected: source.len(),
            found: total,
        });
    }

    let mut output = OutputAccumulator::new(source);
    for _ in 0..total {
        let (index, frame) = algorithm.step()?;
        output.insert(index, &frame)?;
    }
    info!(frames = total, algorithm = algorithm.name(), "Batch processing complete");

    output.finish(
        source,
        output_name(source, algorithm.name()),
        algorithm.description(),
    )
}
