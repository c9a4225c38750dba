//! Reading fixed-size raw frames from a byte stream
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::errors::{FrameError, SourceError};
use crate::geometry::FrameGeometry;

/// A raw capture frame: interleaved ADC words in capture order.
pub type RawFrame = Vec<i16>;

/// Sequential reader of raw frames.
///
/// Frames are `geometry.frame_bytes()` long and hold little-endian `i16`
/// words. The byte buffer is reused, every returned frame is a fresh vector.
pub struct FrameSource<R> {
    reader: R,
    geometry: FrameGeometry,
    buffer: Vec<u8>,
    position: usize,
}

/// How a capture file splits into frames.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FileLayout {
    pub total_bytes: u64,
    pub frames: u64,
    pub trailing_bytes: u64,
}

impl FileLayout {
    /// Split `total_bytes` into whole frames of `geometry`.
    ///
    /// # Errors
    /// * `Geometry` - if the frame size is zero or overflows
    pub fn new(total_bytes: u64, geometry: &FrameGeometry) -> Result<Self, SourceError> {
        let frame_bytes = geometry
            .checked_frame_bytes()
            .filter(|&bytes| bytes > 0)
            .ok_or_else(|| {
                FrameError::InvalidGeometry(format!("no valid frame size for {:?}", geometry))
            })? as u64;
        Ok(Self {
            total_bytes,
            frames: total_bytes / frame_bytes,
            trailing_bytes: total_bytes % frame_bytes,
        })
    }

    /// Layout of a capture file on disk
    pub fn of_file(path: &Path, geometry: &FrameGeometry) -> Result<Self, SourceError> {
        let total_bytes = std::fs::metadata(path)?.len();
        Self::new(total_bytes, geometry)
    }
}

impl FrameSource<BufReader<File>> {
    /// Open a capture file.
    pub fn open(path: &Path, geometry: FrameGeometry) -> Result<Self, SourceError> {
        log::info!("Opening capture file: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), geometry))
    }
}

impl<R: Read> FrameSource<R> {
    pub fn new(reader: R, geometry: FrameGeometry) -> Self {
        Self {
            reader,
            geometry,
            buffer: Vec::new(),
            position: 0,
        }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Index of the next frame to be read
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` if the stream ends exactly on a frame boundary.
    ///
    /// # Errors
    /// * `ShortRead` - if the stream ends within a frame
    /// * `SourceUnavailable` - on any other IO error
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        let expected = self.geometry.frame_bytes();
        self.buffer.resize(expected, 0);

        let available = fill(&mut self.reader, &mut self.buffer)?;
        if available == 0 {
            log::trace!("End of frame source after {} frames", self.position);
            return Ok(None);
        }
        if available < expected {
            return Err(SourceError::ShortRead {
                expected,
                available,
            });
        }

        let frame = self
            .buffer
            .chunks_exact(2)
            .map(|word| i16::from_le_bytes([word[0], word[1]]))
            .collect();
        self.position += 1;
        Ok(Some(frame))
    }

    /// Discard the next `count` frames without decoding them.
    ///
    /// # Errors
    /// * `SkipOverflow` - if `count` frames do not fit in a byte offset
    /// * `ShortRead` - if the stream ends before `count` frames
    pub fn skip_frames(&mut self, count: usize) -> Result<(), SourceError> {
        let expected = self
            .geometry
            .checked_frame_bytes()
            .and_then(|bytes| bytes.checked_mul(count))
            .ok_or(SourceError::SkipOverflow { count })?;
        let skipped = io::copy(
            &mut Read::by_ref(&mut self.reader).take(expected as u64),
            &mut io::sink(),
        )?;
        if skipped < expected as u64 {
            return Err(SourceError::ShortRead {
                expected,
                available: skipped as usize,
            });
        }

        log::debug!("Skipped {} frames", count);
        self.position += count;
        Ok(())
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
