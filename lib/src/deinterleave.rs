//! Raw ADC word to complex sample conversion.
use num_complex::Complex32;

use crate::errors::FrameError;
use crate::tensor::try_alloc;

/// Number of raw words consumed per step.
const QUARTET: usize = 4;

/// Offsets into a raw quartet for (re, im) of the first and the second
/// complex sample it carries. Hardware interleave format; keep as is.
const LANE_OFFSETS: [usize; QUARTET] = [0, 2, 1, 3];

/// Convert a raw frame of interleaved 16-bit words into complex samples.
///
/// Every quartet `[w0, w1, w2, w3]` yields two samples, `(w0 + j*w2)` followed
/// by `(w1 + j*w3)`, so the output holds `raw.len() / 2` samples.
///
/// # Errors
/// * `InvalidFrameSize` - if `raw.len()` is not a multiple of four
/// * `AllocationFailure` - if the output buffer cannot be allocated
pub fn deinterleave(raw: &[i16]) -> Result<Vec<Complex32>, FrameError> {
    if raw.len() % QUARTET != 0 {
        return Err(FrameError::InvalidFrameSize { len: raw.len() });
    }

    let mut samples = try_alloc(raw.len() / 2)?;
    for quartet in raw.chunks_exact(QUARTET) {
        let [re_a, im_a, re_b, im_b] = LANE_OFFSETS.map(|offset| quartet[offset] as f32);
        samples.push(Complex32::new(re_a, im_a));
        samples.push(Complex32::new(re_b, im_b));
    }

    log::trace!(
        "Deinterleaved {} raw words into {} complex samples",
        raw.len(),
        samples.len()
    );
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartet_mapping_is_pinned() {
        let raw = [10, 20, 30, 40, 11, 21, 31, 41];
        let samples = deinterleave(&raw).unwrap();
        assert_eq!(
            samples,
            vec![
                Complex32::new(10.0, 30.0),
                Complex32::new(20.0, 40.0),
                Complex32::new(11.0, 31.0),
                Complex32::new(21.0, 41.0),
            ]
        );
    }

    #[test]
    fn test_output_length_is_half_the_raw_length() {
        for len in [0, 4, 8, 12, 1024] {
            let raw: Vec<i16> = (0..len as i16).collect();
            assert_eq!(deinterleave(&raw).unwrap().len(), len / 2);
        }
    }

    #[test]
    fn test_negative_words_keep_their_sign() {
        let raw = [-1, i16::MIN, -3, i16::MAX];
        let samples = deinterleave(&raw).unwrap();
        assert_eq!(samples[0], Complex32::new(-1.0, -3.0));
        assert_eq!(samples[1], Complex32::new(-32768.0, 32767.0));
    }

    #[test]
    fn test_partial_quartet_is_rejected() {
        for len in [1, 2, 3, 5, 7] {
            let raw = vec![0i16; len];
            assert!(matches!(
                deinterleave(&raw),
                Err(FrameError::InvalidFrameSize { len: l }) if l == len
            ));
        }
    }
}
