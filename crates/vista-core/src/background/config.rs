use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BACKGROUND_FRAMES, DEFAULT_TEMPORAL_OFFSET};
use crate::error::{Result, VistaError};

/// What each output frame holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// The windowed per-pixel median (the background estimate itself).
    #[default]
    Background,
    /// The source frame minus its background estimate.
    Subtract,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "Background"),
            Self::Subtract => write!(f, "Subtract"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalMedianConfig {
    /// Frames taken on each side of the excluded window.
    pub background_frames: usize,
    /// Frames excluded on each side of the target frame.
    pub temporal_offset: usize,
    pub output: OutputMode,
}

impl Default for TemporalMedianConfig {
    fn default() -> Self {
        Self {
            background_frames: DEFAULT_BACKGROUND_FRAMES,
            temporal_offset: DEFAULT_TEMPORAL_OFFSET,
            output: OutputMode::default(),
        }
    }
}

impl TemporalMedianConfig {
    pub fn new(background_frames: usize, temporal_offset: usize) -> Self {
        Self {
            background_frames,
            temporal_offset,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.background_frames == 0 {
            return Err(VistaError::Validation(
                "background_frames must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
