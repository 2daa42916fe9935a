use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Zip};
use tracing::{debug, warn};

use crate::consts::TEMPORAL_MEDIAN_NAME;
use crate::error::{Result, VistaError};
use crate::frame::{FrameStack, Pixel};
use crate::stack::median::median_frames;
use crate::window::Window;

use super::config::{OutputMode, TemporalMedianConfig};
use super::BackgroundRemoval;

/// Frame-at-a-time temporal median background estimator.
///
/// Each call to [`step`](BackgroundRemoval::step) advances the cursor by one
/// frame and returns that frame's result, so callers can interleave
/// cancellation checks and progress reporting between frames.
///
/// When a frame's window is empty (only possible when the sequence is
/// shorter than the temporal offset allows), the source frame is passed
/// through unchanged rather than producing an undefined background.
pub struct TemporalMedian<T = f32> {
    stack: Arc<FrameStack<T>>,
    config: TemporalMedianConfig,
    current_index: Option<usize>,
}

impl<T: Pixel> TemporalMedian<T> {
    pub fn new(stack: Arc<FrameStack<T>>, config: TemporalMedianConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            stack,
            config,
            current_index: None,
        })
    }

    pub fn config(&self) -> &TemporalMedianConfig {
        &self.config
    }

    /// Index of the most recently processed frame, `None` before the first step.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn window_for(&self, index: usize) -> Window {
        Window::select(
            self.stack.len(),
            index,
            self.config.background_frames,
            self.config.temporal_offset,
        )
    }

    fn process(&self, index: usize) -> Result<Array2<T>> {
        let source = self.stack.frame(index)?;
        let window = self.window_for(index);

        if window.is_empty() {
            warn!(frame = index, "Empty background window, passing frame through");
            return Ok(source.to_owned());
        }

        let frames: Vec<ArrayView2<'_, T>> = window
            .indices()
            .map(|i| self.stack.frame(i))
            .collect::<Result<_>>()?;
        let mut background = median_frames(&frames)?;
        debug!(frame = index, window = window.len(), "Temporal median computed");

        if self.config.output == OutputMode::Subtract {
            Zip::from(&mut background)
                .and(&source)
                .for_each(|b, &s| *b = s - *b);
        }
        Ok(background)
    }
}

impl<T: Pixel> BackgroundRemoval<T> for TemporalMedian<T> {
    fn name(&self) -> &str {
        TEMPORAL_MEDIAN_NAME
    }

    fn description(&self) -> String {
        format!(
            "Processed with {} (background={}, offset={})",
            TEMPORAL_MEDIAN_NAME, self.config.background_frames, self.config.temporal_offset
        )
    }

    fn total_frames(&self) -> usize {
        self.stack.len()
    }

    fn step(&mut self) -> Result<(usize, Array2<T>)> {
        let total = self.stack.len();
        let index = self.current_index.map_or(0, |i| i + 1);
        if index >= total {
            return Err(VistaError::FrameIndexOutOfRange { index, total });
        }
        self.current_index = Some(index);

        let frame = self.process(index)?;
        Ok((index, frame))
    }
}
