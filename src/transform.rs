//! Conversion of filter responses between the frequency and the spatial domain.

use crate::error::BankError;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Domain of the planes produced by the filter bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDomain {
    /// Responses are left as spectra.
    Frequency,
    /// Responses are transformed back with the inverse 2D DFT.
    Spatial,
}

impl Display for FilterDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterDomain::Frequency => write!(f, "frequency"),
            FilterDomain::Spatial => write!(f, "spatial"),
        }
    }
}

impl FilterDomain {
    pub fn from_output_in_frequency(output_in_frequency: bool) -> Self {
        if output_in_frequency {
            FilterDomain::Frequency
        } else {
            FilterDomain::Spatial
        }
    }
}

/// 2D discrete Fourier transforms for a fixed image size.
///
/// The FFT plans are created once and shared between clones, so one converter can be used
/// from every worker of a parallel apply.
#[derive(Clone)]
pub struct DomainConverter {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Debug for DomainConverter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainConverter")
            .field("height", &self.height)
            .field("width", &self.width)
            .finish()
    }
}

impl DomainConverter {
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        DomainConverter {
            height,
            width,
            row_forward: planner.plan_fft_forward(width),
            col_forward: planner.plan_fft_forward(height),
            row_inverse: planner.plan_fft_inverse(width),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    /// Forward 2D DFT (unnormalized), DC ends up at `(0, 0)`.
    pub fn forward(&self, plane: ArrayView2<Complex64>) -> Result<Array2<Complex64>, BankError> {
        self.check(&plane)?;
        Ok(self.transform(
            plane,
            self.row_forward.as_ref(),
            self.col_forward.as_ref(),
            1.0,
        ))
    }

    /// Inverse 2D DFT, normalized by `1 / (height * width)` so that it undoes
    /// [`forward`](DomainConverter::forward).
    pub fn inverse(&self, plane: ArrayView2<Complex64>) -> Result<Array2<Complex64>, BankError> {
        self.check(&plane)?;
        let scale = 1.0 / (self.height * self.width) as f64;
        Ok(self.transform(
            plane,
            self.row_inverse.as_ref(),
            self.col_inverse.as_ref(),
            scale,
        ))
    }

    fn check(&self, plane: &ArrayView2<Complex64>) -> Result<(), BankError> {
        let (h, w) = plane.dim();
        if (h, w) != (self.height, self.width) {
            return Err(BankError::DimensionMismatch {
                expected: vec![self.height, self.width],
                found: vec![h, w],
            });
        }
        Ok(())
    }

    /// Row transforms, then column transforms on a transposed copy.
    fn transform(
        &self,
        plane: ArrayView2<Complex64>,
        row_fft: &dyn Fft<f64>,
        col_fft: &dyn Fft<f64>,
        scale: f64,
    ) -> Array2<Complex64> {
        let (h, w) = (self.height, self.width);

        // logical (row-major) order, independent of the memory layout of `plane`
        let mut rows: Vec<Complex64> = plane.iter().copied().collect();
        row_fft.process(&mut rows);

        let mut cols = vec![Complex64::new(0.0, 0.0); h * w];
        for y in 0..h {
            for x in 0..w {
                cols[x * h + y] = rows[y * w + x];
            }
        }
        col_fft.process(&mut cols);

        Array2::from_shape_fn((h, w), |(y, x)| cols[x * h + y] * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn flat_spectrum_is_a_delta() {
        let converter = DomainConverter::new(8, 6);
        let spectrum = Array2::from_elem((8, 6), Complex64::new(1.0, 0.0));
        let spatial = converter.inverse(spectrum.view()).unwrap();
        assert!((spatial[[0, 0]] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        let rest: f64 = spatial.iter().skip(1).map(|c| c.norm()).sum();
        assert!(rest < 1e-10);
    }

    #[test]
    fn single_bin_is_a_plane_wave() {
        let (h, w) = (4, 8);
        let converter = DomainConverter::new(h, w);
        let mut spectrum = Array2::<Complex64>::zeros((h, w));
        spectrum[[0, 1]] = Complex64::new((h * w) as f64, 0.0);
        let spatial = converter.inverse(spectrum.view()).unwrap();
        for ((y, x), value) in spatial.indexed_iter() {
            let phase = 2.0 * std::f64::consts::PI * x as f64 / w as f64;
            let expected = Complex64::from_polar(1.0, phase);
            assert!((value - expected).norm() < 1e-12, "at ({y}, {x})");
        }
    }

    #[test]
    fn inverse_undoes_forward() {
        let image = Array2::from_shape_fn((5, 7), |(y, x)| {
            Complex64::new((y * 7 + x) as f64, (x as f64 - y as f64) * 0.5)
        });
        let converter = DomainConverter::new(5, 7);
        let spectrum = converter.forward(image.view()).unwrap();
        let back = converter.inverse(spectrum.view()).unwrap();
        assert!(max_abs_diff(&image, &back) < 1e-9);
    }

    #[test]
    fn transposed_views_are_read_in_logical_order() {
        let image = Array2::from_shape_fn((6, 3), |(y, x)| Complex64::new(y as f64, x as f64));
        let transposed = image.t().to_owned();
        let converter = DomainConverter::new(3, 6);
        let a = converter.forward(image.t()).unwrap();
        let b = converter.forward(transposed.view()).unwrap();
        assert!(max_abs_diff(&a, &b) < 1e-12);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let converter = DomainConverter::new(4, 4);
        let plane = Array2::<Complex64>::zeros((4, 5));
        assert_eq!(
            converter.inverse(plane.view()),
            Err(BankError::DimensionMismatch {
                expected: vec![4, 4],
                found: vec![4, 5],
            })
        );
    }

    #[test]
    fn domain_follows_flag() {
        assert_eq!(
            FilterDomain::from_output_in_frequency(true),
            FilterDomain::Frequency
        );
        assert_eq!(FilterDomain::from_output_in_frequency(false).to_string(), "spatial");
    }
}
