//! A single Gabor filter defined directly in the frequency domain.
//!
//! The filter is a Gaussian centred on the frequency `(f cos θ, f sin θ)`, stretched along and
//! across its orientation by `gamma` and `eta` (J.-K. Kämäräinen, V. Kyrki and H. Kälviäinen,
//! "Invariance properties of Gabor filter based features", IEEE TIP 15 (2006)):
//!
//! ```text
//! u' =  u cos θ + v sin θ
//! v' = -u sin θ + v cos θ
//! G(u, v) = exp(-(π² / f²) (γ² (u' - f)² + η² v'²))
//! ```
//!
//! `u` and `v` are the normalized frequencies of the FFT grid (DC at index 0), so the kernel
//! multiplies an unshifted spectrum directly.

use crate::error::GaborError;
use crate::math_tools::fft_frequency;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Everything a [`GaborFrequency`] is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaborParams {
    pub height: usize,
    pub width: usize,
    /// Orientation θ in radians.
    pub orientation: f64,
    /// Normalized radial centre frequency `f`.
    pub frequency: f64,
    pub gamma: f64,
    pub eta: f64,
    /// Energy fraction kept inside the envelope.
    pub pf: f64,
    pub cancel_dc: bool,
    pub use_envelope: bool,
}

/// A precomputed frequency-domain Gabor kernel for one image size.
#[derive(Clone, Debug)]
pub struct GaborFrequency {
    params: GaborParams,
    kernel: Array2<f64>,
}

impl GaborFrequency {
    /// Builds the kernel.
    ///
    /// # Errors
    /// - [`GaborError::InvalidGeometry`] for an empty image size.
    /// - [`GaborError::InvalidParameter`] when `frequency`, `gamma` or `eta` is not a finite
    ///   positive number, `orientation` is not finite or `pf` is outside `(0, 1)`.
    pub fn new(params: GaborParams) -> Result<Self, GaborError> {
        if params.height == 0 || params.width == 0 {
            return Err(GaborError::InvalidGeometry {
                height: params.height,
                width: params.width,
            });
        }
        for (name, value) in [
            ("frequency", params.frequency),
            ("gamma", params.gamma),
            ("eta", params.eta),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GaborError::InvalidParameter { name, value });
            }
        }
        if !params.orientation.is_finite() {
            return Err(GaborError::InvalidParameter {
                name: "orientation",
                value: params.orientation,
            });
        }
        if !(params.pf > 0.0 && params.pf < 1.0) {
            return Err(GaborError::InvalidParameter {
                name: "pf",
                value: params.pf,
            });
        }

        let kernel = compute_kernel(&params);
        Ok(GaborFrequency { params, kernel })
    }

    pub fn params(&self) -> &GaborParams {
        &self.params
    }

    pub fn orientation(&self) -> f64 {
        self.params.orientation
    }

    pub fn frequency(&self) -> f64 {
        self.params.frequency
    }

    /// The real-valued transfer function, in FFT layout.
    pub fn kernel(&self) -> ArrayView2<f64> {
        self.kernel.view()
    }

    /// Filters a spectrum and returns the filtered spectrum.
    pub fn apply(&self, image: ArrayView2<Complex64>) -> Result<Array2<Complex64>, GaborError> {
        let mut out = Array2::zeros(self.kernel.dim());
        self.apply_into(image, out.view_mut())?;
        Ok(out)
    }

    /// Filters a spectrum into `out`.
    pub fn apply_into(
        &self,
        image: ArrayView2<Complex64>,
        out: ArrayViewMut2<Complex64>,
    ) -> Result<(), GaborError> {
        let expected = [self.params.height, self.params.width];
        for found in [image.dim(), out.dim()] {
            if [found.0, found.1] != expected {
                return Err(GaborError::DimensionMismatch {
                    expected,
                    found: [found.0, found.1],
                });
            }
        }

        Zip::from(out)
            .and(&image)
            .and(&self.kernel)
            .for_each(|o, &i, &g| *o = i * g);
        Ok(())
    }
}

fn compute_kernel(params: &GaborParams) -> Array2<f64> {
    let f = params.frequency;
    let gamma2 = params.gamma * params.gamma;
    let eta2 = params.eta * params.eta;
    let scale = PI * PI / (f * f);
    let (sin, cos) = params.orientation.sin_cos();

    // the envelope holds the fraction pf of the kernel energy:
    // γ²(u' - f)² + η²v'² <= f² (-ln(1 - pf)) / (2π²)
    let envelope = f * f * -(1.0 - params.pf).ln() / (2.0 * PI * PI);
    let dc = (-PI * PI * gamma2).exp();

    let mut kernel = Array2::from_shape_fn((params.height, params.width), |(y, x)| {
        let u = fft_frequency(x, params.width);
        let v = fft_frequency(y, params.height);
        let ur = u * cos + v * sin;
        let vr = -u * sin + v * cos;

        let q = gamma2 * (ur - f) * (ur - f) + eta2 * vr * vr;
        if params.use_envelope && q > envelope {
            return 0.0;
        }
        let mut g = (-scale * q).exp();
        if params.cancel_dc {
            g -= dc * (-scale * (gamma2 * ur * ur + eta2 * vr * vr)).exp();
        }
        g
    });

    if params.cancel_dc {
        kernel[[0, 0]] = 0.0;
    }
    kernel
}
