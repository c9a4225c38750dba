//! Frame geometry of the sensor capture format.
//!
//! A frame holds `chirp_loops` loops, each firing every TX channel once while
//! all RX channels sample `samples_per_chirp` complex ADC values. Every
//! complex value occupies two 16-bit words in the raw capture.
use crate::errors::FrameError;

/// Number of raw 16-bit words per complex sample.
pub const WORDS_PER_SAMPLE: usize = 2;

/// Dimensions of a single capture frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FrameGeometry {
    pub chirp_loops: usize,
    pub tx_channels: usize,
    pub rx_channels: usize,
    pub samples_per_chirp: usize,
}

impl Default for FrameGeometry {
    /// 128 loops of 3 TX x 4 RX with 256 ADC samples per chirp.
    fn default() -> Self {
        Self {
            chirp_loops: 128,
            tx_channels: 3,
            rx_channels: 4,
            samples_per_chirp: 256,
        }
    }
}

impl FrameGeometry {
    /// Create a geometry, rejecting zero-sized dimensions and frames whose
    /// byte size does not fit in `usize`.
    pub fn new(
        chirp_loops: usize,
        tx_channels: usize,
        rx_channels: usize,
        samples_per_chirp: usize,
    ) -> Result<Self, FrameError> {
        let geometry = Self {
            chirp_loops,
            tx_channels,
            rx_channels,
            samples_per_chirp,
        };
        if geometry.leading_dims().contains(&0) || samples_per_chirp == 0 {
            return Err(FrameError::InvalidGeometry(format!(
                "all dimensions must be non-zero, got {:?}",
                geometry
            )));
        }
        if geometry.checked_frame_bytes().is_none() {
            return Err(FrameError::InvalidGeometry(format!(
                "frame size overflows, got {:?}",
                geometry
            )));
        }
        Ok(geometry)
    }

    /// Frame size in bytes, or `None` if any intermediate count overflows.
    pub fn checked_frame_bytes(&self) -> Option<usize> {
        self.leading_dims()
            .into_iter()
            .try_fold(self.samples_per_chirp, usize::checked_mul)?
            .checked_mul(WORDS_PER_SAMPLE)?
            .checked_mul(std::mem::size_of::<i16>())
    }

    /// The (loops, tx, rx) dimensions preceding the sample axis.
    pub fn leading_dims(&self) -> [usize; 3] {
        [self.chirp_loops, self.tx_channels, self.rx_channels]
    }

    /// Number of complex samples in one frame
    pub fn complex_len(&self) -> usize {
        self.chirp_loops * self.tx_channels * self.rx_channels * self.samples_per_chirp
    }

    /// Number of raw 16-bit words in one frame
    pub fn frame_words(&self) -> usize {
        self.complex_len() * WORDS_PER_SAMPLE
    }

    /// Size of one frame on disk
    pub fn frame_bytes(&self) -> usize {
        self.frame_words() * std::mem::size_of::<i16>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_size() {
        let geometry = FrameGeometry::default();
        assert_eq!(geometry.complex_len(), 128 * 3 * 4 * 256);
        assert_eq!(geometry.frame_words(), 786_432);
        // 12 * 128 * 256 * 4 bytes per frame
        assert_eq!(geometry.frame_bytes(), 1_572_864);
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        assert!(matches!(
            FrameGeometry::new(128, 0, 4, 256),
            Err(FrameError::InvalidGeometry(_))
        ));
        assert!(FrameGeometry::new(1, 1, 2, 3).is_ok());
    }

    #[test]
    fn test_overflowing_geometry_is_rejected() {
        assert!(matches!(
            FrameGeometry::new(1 << (usize::BITS - 1), 2, 1, 1),
            Err(FrameError::InvalidGeometry(_))
        ));
        // Fits as a sample count, but not once counted in bytes
        assert!(matches!(
            FrameGeometry::new(usize::MAX / 2, 1, 1, 1),
            Err(FrameError::InvalidGeometry(_))
        ));
        assert_eq!(
            FrameGeometry::default().checked_frame_bytes(),
            Some(1_572_864)
        );
    }
}
