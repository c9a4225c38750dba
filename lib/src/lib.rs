mod deinterleave;
mod errors;
mod geometry;
mod persistence;
mod pipeline;
mod profile;
mod source;
mod stream;
mod tensor;

// Public re-export
pub use crate::deinterleave::deinterleave;
pub use crate::errors::{FrameError, PersistenceError, PipelineError, SourceError, Stage};
pub use crate::geometry::FrameGeometry;
pub use crate::pipeline::{FramePipeline, Frames, ProcessedFrame};
pub use crate::profile::RadarProfile;
pub use crate::tensor::{CaptureOrder, ChannelOrder, RadarCube, Shape4, Tensor4D};

pub use crate::persistence::{CubeFile, FileType, Writer};
pub use crate::source::{FileLayout, FrameSource, RawFrame};
pub use crate::stream::{CubeSink, CubeStream, StreamSummary};
pub use num_complex::Complex32;
