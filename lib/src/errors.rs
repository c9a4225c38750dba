//! Error types used by this lib.
use std::fmt;
use thiserror::Error;

use crate::tensor::Shape4;

/// Failures of a single frame transform step.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Raw frame of {len} samples is not a whole number of quartets")]
    InvalidFrameSize { len: usize },
    #[error("Cannot lay out {len} complex samples as shape {shape:?}")]
    ShapeMismatch { len: usize, shape: Shape4 },
    #[error("Failed to allocate a buffer of {elements} complex samples")]
    AllocationFailure { elements: usize },
    #[error("Invalid frame geometry: {0}")]
    InvalidGeometry(String),
}

/// Failures of the frame source. These end the iteration.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Short read: expected {expected} bytes for a frame, got {available}")]
    ShortRead { expected: usize, available: usize },
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(#[from] std::io::Error),
    #[error("Cannot skip {count} frames: byte offset overflows")]
    SkipOverflow { count: usize },
    #[error("Frame source has already been handed to the worker")]
    AlreadyStarted,
    #[error(transparent)]
    Geometry(#[from] FrameError),
}

/// The pipeline step a frame failed in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stage {
    Read,
    Deinterleave,
    Reshape,
    Transpose,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Deinterleave => "deinterleave",
            Stage::Reshape => "reshape",
            Stage::Transpose => "transpose",
        };
        f.write_str(name)
    }
}

/// A failure of the frame pipeline, tagged with the frame index it occured on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Frame {frame}: read failed: {source}")]
    Source {
        frame: usize,
        #[source]
        source: SourceError,
    },
    #[error("Frame {frame}: {stage} failed: {source}")]
    Transform {
        frame: usize,
        stage: Stage,
        #[source]
        source: FrameError,
    },
}

impl PipelineError {
    /// Index of the frame that failed
    pub fn frame(&self) -> usize {
        match self {
            PipelineError::Source { frame, .. } | PipelineError::Transform { frame, .. } => *frame,
        }
    }

    /// Stage of the pipeline that failed
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Source { .. } => Stage::Read,
            PipelineError::Transform { stage, .. } => *stage,
        }
    }

    /// Whether no further frames can be produced after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Source { .. }
                | PipelineError::Transform {
                    source: FrameError::AllocationFailure { .. },
                    ..
                }
        )
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Error in writing parquet file: {0}")]
    Parquet(String),
    #[error("IO error in file persistence: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "parquet")]
impl From<arrow::error::ArrowError> for PersistenceError {
    fn from(e: arrow::error::ArrowError) -> Self {
        PersistenceError::Parquet(e.to_string())
    }
}

#[cfg(feature = "parquet")]
impl From<parquet::errors::ParquetError> for PersistenceError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        PersistenceError::Parquet(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_reports_frame_and_stage() {
        let err = PipelineError::Transform {
            frame: 7,
            stage: Stage::Reshape,
            source: FrameError::ShapeMismatch {
                len: 6,
                shape: [1, 1, 4, 0],
            },
        };
        assert_eq!(err.frame(), 7);
        assert_eq!(err.stage(), Stage::Reshape);
        assert!(!err.is_fatal());
        assert!(err.to_string().starts_with("Frame 7: reshape failed"));
    }

    #[test]
    fn test_source_and_allocation_errors_are_fatal() {
        let short = PipelineError::Source {
            frame: 3,
            source: SourceError::ShortRead {
                expected: 16,
                available: 6,
            },
        };
        assert!(short.is_fatal());
        assert_eq!(short.stage(), Stage::Read);

        let alloc = PipelineError::Transform {
            frame: 0,
            stage: Stage::Transpose,
            source: FrameError::AllocationFailure { elements: 1 },
        };
        assert!(alloc.is_fatal());
    }
}
