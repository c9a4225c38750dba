//! Chirp profile of the radar front end and the resolution figures it implies.
use crate::geometry::FrameGeometry;

/// Propagation speed used by the sensor tooling (m/s)
const SPEED_OF_LIGHT: f64 = 3e8;

/// Chirp configuration the capture was recorded with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarProfile {
    pub start_freq_ghz: f64,
    pub freq_slope_mhz_us: f64,
    pub sample_rate_ksps: f64,
    pub idle_time_us: f64,
    pub ramp_end_time_us: f64,
    pub adc_samples: usize,
    pub chirp_loops: usize,
    pub num_tx: usize,
}

impl Default for RadarProfile {
    fn default() -> Self {
        Self {
            start_freq_ghz: 60.0,
            freq_slope_mhz_us: 90.018,
            sample_rate_ksps: 10_000.0,
            idle_time_us: 100.0,
            ramp_end_time_us: 40.0,
            adc_samples: 256,
            chirp_loops: 128,
            num_tx: 1,
        }
    }
}

impl RadarProfile {
    /// Take sample and loop counts from the frame geometry.
    pub fn with_geometry(self, geometry: &FrameGeometry) -> Self {
        Self {
            adc_samples: geometry.samples_per_chirp,
            chirp_loops: geometry.chirp_loops,
            ..self
        }
    }

    fn chirp_period_s(&self) -> f64 {
        (self.idle_time_us + self.ramp_end_time_us) * 1e-6
    }

    fn start_freq_hz(&self) -> f64 {
        self.start_freq_ghz * 1e9
    }

    /// Range covered by one range bin (m)
    pub fn range_resolution_m(&self) -> f64 {
        (SPEED_OF_LIGHT * self.sample_rate_ksps * 1e3)
            / (2.0 * self.freq_slope_mhz_us * 1e12 * self.adc_samples as f64)
    }

    /// Maximum unambiguous range (m)
    pub fn max_range_m(&self) -> f64 {
        (300.0 * self.sample_rate_ksps) / (2.0 * self.freq_slope_mhz_us * 1e3)
    }

    /// Velocity covered by one Doppler bin (m/s)
    pub fn doppler_resolution_mps(&self) -> f64 {
        SPEED_OF_LIGHT
            / (2.0
                * self.start_freq_hz()
                * self.chirp_period_s()
                * self.chirp_loops as f64
                * self.num_tx as f64)
    }

    /// Maximum unambiguous velocity (m/s)
    pub fn max_doppler_mps(&self) -> f64 {
        SPEED_OF_LIGHT / (4.0 * self.start_freq_hz() * self.chirp_period_s() * self.num_tx as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "{} differs from {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_default_profile_figures() {
        let profile = RadarProfile::default();
        assert_close(profile.range_resolution_m(), 0.065091);
        assert_close(profile.max_range_m(), 16.663334);
        assert_close(profile.doppler_resolution_mps(), 0.139509);
        assert_close(profile.max_doppler_mps(), 8.928571);
    }

    #[test]
    fn test_geometry_overrides_counts() {
        let geometry = FrameGeometry::new(64, 3, 4, 512).unwrap();
        let profile = RadarProfile::default().with_geometry(&geometry);
        assert_eq!(profile.adc_samples, 512);
        assert_eq!(profile.chirp_loops, 64);
        // Finer bins, same unambiguous range
        assert_close(profile.range_resolution_m(), 0.065091 / 2.0);
        assert_close(profile.max_range_m(), 16.663334);
    }
}
