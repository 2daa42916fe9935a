/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default number of frames taken on each side of the excluded window.
pub const DEFAULT_BACKGROUND_FRAMES: usize = 5;

/// Default number of frames excluded on each side of the target frame.
pub const DEFAULT_TEMPORAL_OFFSET: usize = 2;

/// Display name of the temporal median algorithm. Also used as the suffix
/// of the output stack name.
pub const TEMPORAL_MEDIAN_NAME: &str = "Temporal Median";
