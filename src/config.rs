use crate::error::BankError;
use filter_macros::BankAccessors;
use serde::{Deserialize, Serialize};

/// Parameters of a Gabor filter bank.
///
/// `BankConfig::new` fills in the usual defaults (8 orientations, 5 frequencies, `fmax = 0.25`,
/// `k = 1.414`, ...). Every field gets a getter and a rebuilding setter on
/// [`FilterBank`](crate::filters::FilterBank) and a chained setter on
/// [`FilterBankBuilder`](crate::filters::FilterBankBuilder).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, BankAccessors)]
pub struct BankConfig {
    /// Height of the images the bank is built for.
    pub height: usize,
    /// Width of the images the bank is built for.
    pub width: usize,
    /// Number of sampled orientations.
    pub n_orient: usize,
    /// Number of sampled radial frequencies.
    pub n_freq: usize,
    /// Highest normalized radial frequency, in `(0, 1]`.
    pub fmax: f64,
    /// Orientations span `[0, 2π)` when set, `[0, π)` otherwise.
    pub orientation_full: bool,
    /// Ratio between two consecutive frequencies.
    pub k: f64,
    /// Overlap between neighbouring filters, in `(0, 1)`.
    pub p: f64,
    /// Derive `gamma` and `eta` from `n_orient`, `orientation_full`, `k` and `p`.
    pub optimal_gamma_eta: bool,
    /// Radial sharpness of each filter.
    pub gamma: f64,
    /// Angular sharpness of each filter.
    pub eta: f64,
    /// Energy fraction kept inside the envelope of each filter, in `(0, 1)`.
    pub pf: f64,
    /// Null the DC response of each filter.
    pub cancel_dc: bool,
    /// Truncate each filter to its envelope.
    pub use_envelope: bool,
    /// Keep the responses in the frequency domain instead of transforming them back.
    #[accessor(skip)]
    pub output_in_frequency: bool,
}

impl BankConfig {
    pub fn new(height: usize, width: usize) -> Self {
        BankConfig {
            height,
            width,
            n_orient: 8,
            n_freq: 5,
            fmax: 0.25,
            orientation_full: false,
            k: 1.414,
            p: 0.5,
            optimal_gamma_eta: false,
            gamma: 1.0,
            eta: 1.0,
            pf: 0.99,
            cancel_dc: false,
            use_envelope: true,
            output_in_frequency: false,
        }
    }

    /// Checks the bank-level parameters.
    ///
    /// `gamma`, `eta` and `pf` are checked by the single-frequency filters themselves, so their
    /// errors reach the caller as [`BankError::Filter`].
    pub fn validate(&self) -> Result<(), BankError> {
        if self.height == 0 {
            return Err(BankError::invalid("height", "must be at least 1"));
        }
        if self.width == 0 {
            return Err(BankError::invalid("width", "must be at least 1"));
        }
        if self.n_orient == 0 {
            return Err(BankError::invalid("n_orient", "must be at least 1"));
        }
        if self.n_freq == 0 {
            return Err(BankError::invalid("n_freq", "must be at least 1"));
        }
        if !(self.fmax.is_finite() && self.fmax > 0.0 && self.fmax <= 1.0) {
            return Err(BankError::invalid(
                "fmax",
                format!("{} is outside (0, 1]", self.fmax),
            ));
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(BankError::invalid(
                "k",
                format!("{} is not a positive ratio", self.k),
            ));
        }
        if !(self.p > 0.0 && self.p < 1.0) {
            return Err(BankError::invalid(
                "p",
                format!("{} is outside (0, 1)", self.p),
            ));
        }
        if self.optimal_gamma_eta && self.k <= 1.0 {
            return Err(BankError::invalid(
                "k",
                format!("optimal gamma/eta needs k > 1, got {}", self.k),
            ));
        }
        Ok(())
    }

    /// Number of filters a bank with this configuration holds.
    pub fn n_filters(&self) -> usize {
        self.n_orient * self.n_freq
    }
}
