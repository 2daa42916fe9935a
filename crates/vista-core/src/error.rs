use thiserror::Error;

#[derive(Error, Debug)]
pub enum VistaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Frame shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Metadata length mismatch for {field}: expected {expected}, found {found}")]
    MetadataLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, VistaError>;
