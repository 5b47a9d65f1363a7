//! Derivation of the complete filter set from a [`BankConfig`].

use crate::config::BankConfig;
use crate::error::BankError;
use crate::filters::bank::FilterBank;
use crate::filters::gabor_frequency::{GaborFrequency, GaborParams};
use crate::math_tools::{compute_frequencies, compute_orientations, optimal_gamma_eta};
use crate::transform::DomainConverter;
use ndarray::Array1;

/// Everything a filter bank derives from its configuration.
///
/// A state is built in one go by [`BankState::build`] and never modified afterwards; the bank
/// swaps whole states.
#[derive(Clone, Debug)]
pub(crate) struct BankState {
    /// The configuration the state was built from, with `gamma`/`eta` replaced by the derived
    /// values in optimal mode. `output_in_frequency` is owned by the bank, not by the state.
    pub(crate) config: BankConfig,
    pub(crate) frequencies: Array1<f64>,
    pub(crate) orientations: Array1<f64>,
    /// Orientation-major: filter `o * n_freq + f` uses `orientations[o]` and `frequencies[f]`.
    pub(crate) filters: Vec<GaborFrequency>,
    pub(crate) converter: DomainConverter,
}

impl BankState {
    pub(crate) fn build(mut config: BankConfig) -> Result<Self, BankError> {
        config.validate()?;

        let frequencies = compute_frequencies(config.n_freq, config.fmax, config.k);
        let orientations = compute_orientations(config.n_orient, config.orientation_full)?;

        if config.optimal_gamma_eta {
            let (gamma, eta) =
                optimal_gamma_eta(config.n_orient, config.orientation_full, config.k, config.p)?;
            config.gamma = gamma;
            config.eta = eta;
        }

        if config.k == 1.0 {
            log::warn!(
                "frequency ratio k = 1, all {} frequencies are equal to {}",
                config.n_freq,
                config.fmax
            );
        }

        let mut filters = Vec::with_capacity(config.n_filters());
        for &orientation in orientations.iter() {
            for &frequency in frequencies.iter() {
                filters.push(GaborFrequency::new(GaborParams {
                    height: config.height,
                    width: config.width,
                    orientation,
                    frequency,
                    gamma: config.gamma,
                    eta: config.eta,
                    pf: config.pf,
                    cancel_dc: config.cancel_dc,
                    use_envelope: config.use_envelope,
                })?);
            }
        }

        log::debug!(
            "built {} Gabor filters ({} orientations x {} frequencies) for {}x{} images, gamma = {}, eta = {}",
            filters.len(),
            config.n_orient,
            config.n_freq,
            config.height,
            config.width,
            config.gamma,
            config.eta
        );

        let converter = DomainConverter::new(config.height, config.width);
        Ok(BankState {
            config,
            frequencies,
            orientations,
            filters,
            converter,
        })
    }
}

/// Configure-then-build construction of a [`FilterBank`].
///
/// Every configuration field has a chained setter of the same name:
///
/// ```
/// use gabor_bank::FilterBank;
///
/// let bank = FilterBank::builder(64, 64)
///     .n_orient(4)
///     .n_freq(3)
///     .optimal_gamma_eta(true)
///     .output_in_frequency(true)
///     .build()
///     .unwrap();
/// assert_eq!(bank.len(), 12);
/// ```
#[derive(Clone, Debug)]
pub struct FilterBankBuilder {
    pub(crate) config: BankConfig,
}

impl FilterBankBuilder {
    pub fn new(height: usize, width: usize) -> Self {
        FilterBankBuilder {
            config: BankConfig::new(height, width),
        }
    }

    pub fn from_config(config: BankConfig) -> Self {
        FilterBankBuilder { config }
    }

    pub fn build(self) -> Result<FilterBank, BankError> {
        FilterBank::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GaborError;

    #[test]
    fn filters_are_orientation_major() {
        let mut config = BankConfig::new(16, 16);
        config.n_orient = 3;
        config.n_freq = 2;
        let state = BankState::build(config).unwrap();

        assert_eq!(state.filters.len(), 6);
        for o in 0..3 {
            for f in 0..2 {
                let params = state.filters[o * 2 + f].params();
                assert_eq!(params.orientation, state.orientations[o]);
                assert_eq!(params.frequency, state.frequencies[f]);
            }
        }
    }

    #[test]
    fn optimal_mode_overwrites_gamma_and_eta() {
        let mut config = BankConfig::new(16, 16);
        config.optimal_gamma_eta = true;
        config.k = 2.0;
        config.gamma = 42.0;
        config.eta = 42.0;
        let state = BankState::build(config).unwrap();

        let (gamma, eta) = optimal_gamma_eta(8, false, 2.0, 0.5).unwrap();
        assert_eq!(state.config.gamma, gamma);
        assert_eq!(state.config.eta, eta);
        assert!(state
            .filters
            .iter()
            .all(|f| f.params().gamma == gamma && f.params().eta == eta));
    }

    #[test]
    fn filter_errors_pass_through() {
        let mut config = BankConfig::new(16, 16);
        config.pf = 1.5;
        assert_eq!(
            BankState::build(config).unwrap_err(),
            BankError::Filter(GaborError::InvalidParameter {
                name: "pf",
                value: 1.5
            })
        );
    }

    #[test]
    fn builder_setters_reach_the_config() {
        let builder = FilterBankBuilder::new(8, 12)
            .n_orient(2)
            .fmax(0.4)
            .cancel_dc(true)
            .output_in_frequency(true);
        assert_eq!(builder.config.n_orient, 2);
        assert_eq!(builder.config.fmax, 0.4);
        assert!(builder.config.cancel_dc);
        assert!(builder.config.output_in_frequency);
        assert_eq!(builder.config.width, 12);
    }
}
