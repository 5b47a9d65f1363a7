//! Sampling of the frequency/orientation plane used by the filter bank: the radial frequency
//! sequence, the orientation angles, the "optimal" envelope widths and the normalized frequency
//! axis of an FFT grid.

use crate::error::BankError;
use ndarray::Array1;
use std::f64::consts::PI;

/// Computes the radial frequencies `fmax / k^i` for `i` in `0..n_freq`.
///
/// The first entry is exactly `fmax`. The sequence decreases strictly for `k > 1`, is constant
/// for `k == 1` and increases for `k < 1`.
pub fn compute_frequencies(n_freq: usize, fmax: f64, k: f64) -> Array1<f64> {
    Array1::from_iter((0..n_freq).map(|i| fmax / k.powi(i as i32)))
}

/// Angular span covered by the orientations: `2π` for full orientations, `π` otherwise.
pub fn orientation_span(orientation_full: bool) -> f64 {
    if orientation_full {
        2.0 * PI
    } else {
        PI
    }
}

/// Computes `n_orient` evenly spaced angles starting at 0 over the configured span.
///
/// # Errors
/// `n_orient == 0` has no spacing and is rejected.
pub fn compute_orientations(
    n_orient: usize,
    orientation_full: bool,
) -> Result<Array1<f64>, BankError> {
    if n_orient == 0 {
        return Err(BankError::invalid("n_orient", "must be at least 1"));
    }
    let span = orientation_span(orientation_full);
    Ok(Array1::from_iter(
        (0..n_orient).map(|j| span * j as f64 / n_orient as f64),
    ))
}

/// Derives `(gamma, eta)` from the sampling density so that neighbouring filters cross at the
/// overlap level `p`.
///
/// Follows J. Han and K.-K. Ma, "Rotation-invariant and scale-invariant Gabor features for
/// texture image retrieval", Image and Vision Computing 25 (2007):
///
/// ```text
/// gamma = (k + 1) / (k - 1) * sqrt(-ln p) / π
/// eta   = sqrt(-ln p) / (π * tan(step / 2)),   step = span / n_orient
/// ```
///
/// # Errors
/// Returns [`BankError::InvalidParameter`] when the inputs leave the domain of the relation
/// (`k <= 1`, `p` outside `(0, 1)`, `n_orient == 0`), when the orientation step is half a turn
/// or more (one orientation, or two on the full circle, where `tan(step / 2)` is not a finite
/// positive number) or when a result is not a finite positive number.
pub fn optimal_gamma_eta(
    n_orient: usize,
    orientation_full: bool,
    k: f64,
    p: f64,
) -> Result<(f64, f64), BankError> {
    if n_orient == 0 {
        return Err(BankError::invalid("n_orient", "must be at least 1"));
    }
    if !(k.is_finite() && k > 1.0) {
        return Err(BankError::invalid(
            "k",
            format!("optimal gamma/eta needs k > 1, got {k}"),
        ));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(BankError::invalid("p", format!("{p} is outside (0, 1)")));
    }

    let step = orientation_span(orientation_full) / n_orient as f64;
    if step >= PI {
        return Err(BankError::invalid(
            "n_orient",
            format!(
                "optimal eta needs an orientation step below π, {n_orient} orientation(s) give {step}"
            ),
        ));
    }

    let spread = (-p.ln()).sqrt() / PI;
    let gamma = (k + 1.0) / (k - 1.0) * spread;
    let eta = spread / (step / 2.0).tan();

    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(BankError::invalid(
            "gamma",
            format!("optimal derivation gave {gamma}"),
        ));
    }
    if !(eta.is_finite() && eta > 0.0) {
        return Err(BankError::invalid(
            "eta",
            format!("optimal derivation gave {eta} for {n_orient} orientation(s)"),
        ));
    }
    Ok((gamma, eta))
}

/// Normalized frequency of FFT bin `index` on an axis of `len` samples, in `[-0.5, 0.5)`.
///
/// Same layout as numpy's `fftfreq`: non-negative frequencies first, DC at index 0.
pub fn fft_frequency(index: usize, len: usize) -> f64 {
    if index < (len + 1) / 2 {
        index as f64 / len as f64
    } else {
        (index as f64 - len as f64) / len as f64
    }
}
