//! Persisting processed radar cubes
use crate::{errors::PersistenceError, ProcessedFrame};
use std::path::PathBuf;

mod cf32;
#[cfg(feature = "parquet")]
mod parquet;

/// File formats supported for writing
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FileType {
    /// Raw little-endian interleaved `f32` I/Q, frames back to back
    Cf32,
    /// Apache Parquet file, one row per frame
    #[cfg(feature = "parquet")]
    Parquet,
}

/// Struct specifying a file to write radar cubes to
#[derive(Debug, Clone)]
pub struct CubeFile {
    /// Path to file
    pub file_path: PathBuf,
    /// Type of file
    pub file_type: FileType,
}

/// A writer to handle file writes
pub enum Writer {
    Cf32(cf32::Cf32Writer),
    #[cfg(feature = "parquet")]
    Parquet(parquet::BatchWriter),
}

impl Writer {
    /// Create a new file writer.
    ///
    /// # Arguments
    ///
    /// * `file` - The file to write to
    pub fn new(file: CubeFile) -> Result<Self, PersistenceError> {
        log::debug!("Creating {:?} writer for {}", file.file_type, file.file_path.display());
        let writer = match file.file_type {
            FileType::Cf32 => Self::Cf32(cf32::Cf32Writer::new(file.file_path)?),
            #[cfg(feature = "parquet")]
            FileType::Parquet => Self::Parquet(parquet::BatchWriter::new(file.file_path)?),
        };

        Ok(writer)
    }

    /// Add a batch of frames to the writer
    ///
    /// # Arguments
    ///
    /// * `data` A batch (slice) of processed frames to write to the file
    pub fn add_batch(&mut self, data: &[ProcessedFrame]) -> Result<(), PersistenceError> {
        match self {
            Writer::Cf32(writer) => writer.add_batch(data),
            #[cfg(feature = "parquet")]
            Writer::Parquet(writer) => writer.add_batch(data),
        }
    }

    /// Finalize the file writes, i.e. clear all buffers and make sure
    /// the data is actually written to file.
    ///
    /// Returns the number of bytes written or an error if any occured.
    pub fn finalize(&mut self) -> Result<u64, PersistenceError> {
        match self {
            Writer::Cf32(writer) => writer.finalize(),
            #[cfg(feature = "parquet")]
            Writer::Parquet(writer) => writer.finalize(),
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cf32" => Ok(FileType::Cf32),
            #[cfg(feature = "parquet")]
            "parquet" => Ok(FileType::Parquet),
            _ => Err(format!("Invalid file type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_str() {
        assert_eq!("cf32".parse::<FileType>(), Ok(FileType::Cf32));
        assert_eq!("CF32".parse::<FileType>(), Ok(FileType::Cf32));
        #[cfg(feature = "parquet")]
        assert_eq!("Parquet".parse::<FileType>(), Ok(FileType::Parquet));
        assert!("npy".parse::<FileType>().is_err());
    }
}
