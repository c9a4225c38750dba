//! Four dimensional complex tensors.
//!
//! A [`Tensor4D`] is one owned, contiguous row-major buffer together with its
//! shape. The axis order is part of the type: the pipeline builds a tensor in
//! [`CaptureOrder`] and turns it into a [`RadarCube`] in [`ChannelOrder`].
use std::marker::PhantomData;

use ndarray::Array4;
use num_complex::Complex32;

use crate::errors::FrameError;
use crate::geometry::FrameGeometry;

/// Extents of the four axes, outermost first.
pub type Shape4 = [usize; 4];

/// Axis order of the sensor: (chirp loop, tx, rx, sample)
#[derive(Debug, Clone, Copy)]
pub struct CaptureOrder;

/// Axis order for downstream processing: (tx, rx, chirp loop, sample)
#[derive(Debug, Clone, Copy)]
pub struct ChannelOrder;

/// New axis `i` is taken from old axis `CAPTURE_TO_CHANNEL[i]`.
const CAPTURE_TO_CHANNEL: [usize; 4] = [1, 2, 0, 3];

#[derive(Debug, Clone)]
pub struct Tensor4D<L> {
    data: Array4<Complex32>,
    _layout: PhantomData<L>,
}

/// A fully processed frame, ready for range-Doppler processing.
pub type RadarCube = Tensor4D<ChannelOrder>;

/// Allocate an empty buffer able to hold `elements` samples, reporting
/// failure instead of aborting.
pub(crate) fn try_alloc(elements: usize) -> Result<Vec<Complex32>, FrameError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| FrameError::AllocationFailure { elements })?;
    Ok(buffer)
}

impl<L> Tensor4D<L> {
    fn from_vec(shape: Shape4, data: Vec<Complex32>) -> Result<Self, FrameError> {
        let len = data.len();
        let data = Array4::from_shape_vec(shape, data)
            .map_err(|_| FrameError::ShapeMismatch { len, shape })?;
        Ok(Self {
            data,
            _layout: PhantomData,
        })
    }

    pub fn shape(&self) -> Shape4 {
        let (d0, d1, d2, d3) = self.data.dim();
        [d0, d1, d2, d3]
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `index`, or `None` if out of bounds.
    pub fn get(&self, index: Shape4) -> Option<Complex32> {
        self.data.get(index).copied()
    }

    /// The last element of the tensor.
    ///
    /// Only meant as a cheap probe value for diagnostics.
    pub fn probe(&self) -> Option<Complex32> {
        let [d0, d1, d2, d3] = self.shape();
        if self.is_empty() {
            return None;
        }
        self.get([d0 - 1, d1 - 1, d2 - 1, d3 - 1])
    }

    pub fn as_array(&self) -> &Array4<Complex32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<Complex32> {
        self.data
    }
}

impl Tensor4D<CaptureOrder> {
    /// Lay out a complex frame as (chirp loop, tx, rx, sample).
    ///
    /// The leading extents come from `geometry`, the sample axis is derived
    /// from the frame length. Element `[i, j, k, l]` is
    /// `frame[((i * tx + j) * rx + k) * samples + l]`.
    ///
    /// ```
    /// use radcube_lib::{CaptureOrder, Complex32, FrameGeometry, Tensor4D};
    ///
    /// let geometry = FrameGeometry::new(1, 1, 2, 3).unwrap();
    /// let frame: Vec<_> = (0..6).map(|i| Complex32::new(i as f32, 0.0)).collect();
    /// let tensor = Tensor4D::<CaptureOrder>::reshape(frame, &geometry).unwrap();
    /// assert_eq!(tensor.shape(), [1, 1, 2, 3]);
    /// assert_eq!(tensor.get([0, 0, 1, 0]), Some(Complex32::new(3.0, 0.0)));
    /// ```
    ///
    /// # Errors
    /// * `ShapeMismatch` - if the frame is empty or its length is not a
    ///   multiple of `loops * tx * rx`
    pub fn reshape(frame: Vec<Complex32>, geometry: &FrameGeometry) -> Result<Self, FrameError> {
        let [loops, tx, rx] = geometry.leading_dims();
        let block = loops * tx * rx;
        if block == 0 {
            return Err(FrameError::InvalidGeometry(format!(
                "zero-sized leading dimension in {:?}",
                geometry
            )));
        }

        let len = frame.len();
        let samples = len / block;
        if len == 0 || len % block != 0 {
            return Err(FrameError::ShapeMismatch {
                len,
                shape: [loops, tx, rx, samples],
            });
        }

        log::trace!("Reshaping {} samples to {:?}", len, [loops, tx, rx, samples]);
        Self::from_vec([loops, tx, rx, samples], frame)
    }

    /// Reorder the axes to (tx, rx, chirp loop, sample).
    ///
    /// `output[i, j, k, l] == input[k, i, j, l]`. The result owns a freshly
    /// allocated buffer; `self` is consumed and its storage released before
    /// this returns, also on failure.
    ///
    /// ```compile_fail
    /// use radcube_lib::{CaptureOrder, Complex32, FrameGeometry, Tensor4D};
    ///
    /// let geometry = FrameGeometry::new(1, 1, 2, 3).unwrap();
    /// let tensor = Tensor4D::<CaptureOrder>::reshape(vec![Complex32::default(); 6], &geometry).unwrap();
    /// let cube = tensor.transpose().unwrap();
    /// let stale = tensor.get([0, 0, 0, 0]);
    /// ```
    ///
    /// # Errors
    /// * `AllocationFailure` - if the output buffer cannot be allocated
    pub fn transpose(self) -> Result<RadarCube, FrameError> {
        let permuted = self.data.permuted_axes(CAPTURE_TO_CHANNEL);
        let (tx, rx, loops, samples) = permuted.dim();

        let mut buffer = try_alloc(permuted.len())?;
        // Logical iteration order of the permuted view is the row-major order
        // of the output.
        buffer.extend(permuted.iter().copied());
        drop(permuted);

        Tensor4D::from_vec([tx, rx, loops, samples], buffer)
    }
}
