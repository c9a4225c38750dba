//! Per-frame transform pipeline.
//!
//! Every raw frame goes through three steps, each owning its input:
//!
//! 1. deinterleave the raw ADC words into complex samples,
//! 2. reshape the samples to (chirp loop, tx, rx, sample),
//! 3. transpose to the radar cube layout (tx, rx, chirp loop, sample).
//!
//! No state is carried from one frame to the next.
use std::io::Read;
use std::iter::FusedIterator;

use crate::deinterleave::deinterleave;
use crate::errors::{FrameError, PipelineError, SourceError, Stage};
use crate::geometry::FrameGeometry;
use crate::source::{FrameSource, RawFrame};
use crate::tensor::{CaptureOrder, RadarCube, Tensor4D};

/// A frame after the full transform.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    /// Zero-based index of the frame in its source
    pub index: usize,
    pub cube: RadarCube,
}

#[derive(Debug, Clone)]
pub struct FramePipeline {
    geometry: FrameGeometry,
}

impl FramePipeline {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Run one raw frame through the transform.
    ///
    /// # Parameters
    /// * `index` - Index of the frame, used to tag errors
    /// * `raw` - The raw frame; consumed
    ///
    /// # Errors
    /// A `PipelineError::Transform` carrying `index` and the failing `Stage`.
    pub fn process_frame(
        &self,
        index: usize,
        raw: RawFrame,
    ) -> Result<ProcessedFrame, PipelineError> {
        let failed_in = |stage: Stage| {
            move |source: FrameError| PipelineError::Transform {
                frame: index,
                stage,
                source,
            }
        };

        let samples = deinterleave(&raw).map_err(failed_in(Stage::Deinterleave))?;
        drop(raw);

        let tensor = Tensor4D::<CaptureOrder>::reshape(samples, &self.geometry)
            .map_err(failed_in(Stage::Reshape))?;
        let cube = tensor.transpose().map_err(failed_in(Stage::Transpose))?;

        log::debug!("Frame {} processed to shape {:?}", index, cube.shape());
        Ok(ProcessedFrame { index, cube })
    }

    /// Iterate over the processed frames of `source`.
    ///
    /// Without a `limit` the iteration ends when the source ends on a frame
    /// boundary. With a `limit`, running out of frames before reaching it is
    /// reported as a short read.
    pub fn frames<R: Read>(&self, source: FrameSource<R>, limit: Option<usize>) -> Frames<R> {
        Frames {
            pipeline: self.clone(),
            source,
            remaining: limit,
            done: false,
        }
    }
}

/// Iterator over processed frames, see [`FramePipeline::frames`].
///
/// Errors of a single frame are yielded and the iteration continues with
/// the next frame; after a fatal error the iterator is exhausted.
pub struct Frames<R> {
    pipeline: FramePipeline,
    source: FrameSource<R>,
    remaining: Option<usize>,
    done: bool,
}

impl<R: Read> Iterator for Frames<R> {
    type Item = Result<ProcessedFrame, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == Some(0) {
            return None;
        }

        let index = self.source.position();
        let raw = match self.source.next_frame() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.done = true;
                let missing = self.remaining?;
                log::warn!("Source ended {} frames before the requested count", missing);
                return Some(Err(PipelineError::Source {
                    frame: index,
                    source: SourceError::ShortRead {
                        expected: self.source.geometry().frame_bytes(),
                        available: 0,
                    },
                }));
            }
            Err(source) => {
                self.done = true;
                return Some(Err(PipelineError::Source {
                    frame: index,
                    source,
                }));
            }
        };

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        let result = self.pipeline.process_frame(index, raw);
        if let Err(e) = &result {
            self.done = e.is_fatal();
        }
        Some(result)
    }
}

impl<R: Read> FusedIterator for Frames<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;
    use std::io::Cursor;

    fn le_bytes(words: &[i16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_single_zero_frame_end_to_end() {
        let geometry = FrameGeometry::default();
        let bytes = vec![0u8; geometry.frame_bytes()];
        let pipeline = FramePipeline::new(geometry);

        let frames: Vec<_> = pipeline
            .frames(FrameSource::new(Cursor::new(bytes), geometry), None)
            .collect();

        assert_eq!(frames.len(), 1);
        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.cube.shape(), [3, 4, 128, 256]);
        assert!(frame
            .cube
            .as_array()
            .iter()
            .all(|&c| c == Complex32::new(0.0, 0.0)));
    }

    #[test]
    fn test_frame_values_follow_the_transform() {
        // 2 loops, 1 tx, 2 rx, 1 sample: 4 complex samples, 8 words per frame
        let geometry = FrameGeometry::new(2, 1, 2, 1).unwrap();
        let raw: RawFrame = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let frame = FramePipeline::new(geometry).process_frame(5, raw).unwrap();

        assert_eq!(frame.index, 5);
        assert_eq!(frame.cube.shape(), [1, 2, 2, 1]);
        // Capture order samples: (1,3) (2,4) (5,7) (6,8) as [loop][rx]
        assert_eq!(frame.cube.get([0, 0, 0, 0]), Some(Complex32::new(1.0, 3.0)));
        assert_eq!(frame.cube.get([0, 0, 1, 0]), Some(Complex32::new(5.0, 7.0)));
        assert_eq!(frame.cube.get([0, 1, 0, 0]), Some(Complex32::new(2.0, 4.0)));
        assert_eq!(frame.cube.get([0, 1, 1, 0]), Some(Complex32::new(6.0, 8.0)));
    }

    #[test]
    fn test_limit_stops_early() {
        let geometry = FrameGeometry::new(1, 1, 2, 1).unwrap();
        let words: Vec<i16> = (0..4 * 3).collect();
        let source = FrameSource::new(Cursor::new(le_bytes(&words)), geometry);

        let indices: Vec<_> = FramePipeline::new(geometry)
            .frames(source, Some(2))
            .map(|frame| frame.unwrap().index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_limit_beyond_source_is_short_read() {
        let geometry = FrameGeometry::new(1, 1, 2, 1).unwrap();
        let words: Vec<i16> = (0..4 * 2).collect();
        let source = FrameSource::new(Cursor::new(le_bytes(&words)), geometry);

        let mut frames = FramePipeline::new(geometry).frames(source, Some(5));
        assert!(frames.next().unwrap().is_ok());
        assert!(frames.next().unwrap().is_ok());
        let err = frames.next().unwrap().unwrap_err();
        assert_eq!(err.frame(), 2);
        assert_eq!(err.stage(), Stage::Read);
        assert!(err.is_fatal());
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_truncated_frame_ends_iteration() {
        let geometry = FrameGeometry::new(1, 1, 2, 1).unwrap();
        let mut bytes = le_bytes(&[0; 4]);
        bytes.push(0);
        let source = FrameSource::new(Cursor::new(bytes), geometry);

        let results: Vec<_> = FramePipeline::new(geometry).frames(source, None).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            &results[1],
            Err(PipelineError::Source {
                frame: 1,
                source: SourceError::ShortRead { .. }
            })
        ));
    }

    #[test]
    fn test_transform_errors_do_not_stop_iteration() {
        // A single complex sample per frame is half a quartet.
        let geometry = FrameGeometry::new(1, 1, 1, 1).unwrap();
        let source = FrameSource::new(Cursor::new(le_bytes(&[1, 2, 3, 4])), geometry);

        let results: Vec<_> = FramePipeline::new(geometry).frames(source, None).collect();
        assert_eq!(results.len(), 2);
        for (index, result) in results.iter().enumerate() {
            match result {
                Err(PipelineError::Transform {
                    frame,
                    stage: Stage::Deinterleave,
                    source: FrameError::InvalidFrameSize { len: 2 },
                }) => assert_eq!(*frame, index),
                other => panic!("Unexpected result: {:?}", other),
            }
        }
    }
}
