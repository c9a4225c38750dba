//! Raw `cf32` writer
//!
//! Every sample is written as two little-endian `f32` (re, im). The cubes are
//! written in their standard (row-major) layout, frame after frame, without
//! any header.
use crate::errors::PersistenceError;
use crate::ProcessedFrame;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const BYTES_PER_SAMPLE: u64 = 8;

pub struct Cf32Writer {
    writer: Option<BufWriter<File>>,
    bytes_written: u64,
}

impl Cf32Writer {
    pub fn new(file_path: PathBuf) -> Result<Self, PersistenceError> {
        let file = File::create(&file_path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            bytes_written: 0,
        })
    }

    pub fn add_batch(&mut self, data: &[ProcessedFrame]) -> Result<(), PersistenceError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            PersistenceError::Io(std::io::Error::other("Writer has been finalized"))
        })?;

        for frame in data {
            for sample in frame.cube.as_array().iter() {
                writer.write_all(&sample.re.to_le_bytes())?;
                writer.write_all(&sample.im.to_le_bytes())?;
            }
            self.bytes_written += frame.cube.len() as u64 * BYTES_PER_SAMPLE;
            log::trace!("Wrote frame {} to cf32 file", frame.index);
        }
        Ok(())
    }

    /// Flush and close the file. Returns the number of bytes written.
    pub fn finalize(&mut self) -> Result<u64, PersistenceError> {
        let writer = self.writer.take().ok_or_else(|| {
            PersistenceError::Io(std::io::Error::other("Writer already finalized"))
        })?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameGeometry, FramePipeline};

    #[test]
    fn test_writes_cubes_in_standard_layout() {
        let geometry = FrameGeometry::new(2, 1, 2, 1).unwrap();
        let pipeline = FramePipeline::new(geometry);
        let frames = vec![
            pipeline.process_frame(0, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
            pipeline.process_frame(1, vec![0; 8]).unwrap(),
        ];

        let path = std::env::temp_dir().join(format!("radcube_cf32_{}.bin", std::process::id()));
        let mut writer = Cf32Writer::new(path.clone()).unwrap();
        writer.add_batch(&frames).unwrap();
        let written = writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, 2 * 4 * BYTES_PER_SAMPLE);
        assert_eq!(bytes.len() as u64, written);

        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        // (tx, rx, loop, sample) order of the first frame
        assert_eq!(&values[..8], &[1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 6.0, 8.0]);
        assert!(values[8..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_finalized_writer_rejects_batches() {
        let path = std::env::temp_dir().join(format!("radcube_cf32_{}_done.bin", std::process::id()));
        let mut writer = Cf32Writer::new(path.clone()).unwrap();
        assert_eq!(writer.finalize().unwrap(), 0);
        assert!(writer.add_batch(&[]).is_err());
        assert!(writer.finalize().is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
