//! The Gabor filter bank: one [`GaborFrequency`] filter per (orientation, frequency) pair,
//! applied to the same spectrum and stacked along the first output axis.
//!
//! Getters and rebuilding setters for the configuration fields (`n_orient()`,
//! `set_n_orient(..)`, ...) are generated from [`BankConfig`] by the `BankAccessors` derive.

use crate::config::BankConfig;
use crate::error::BankError;
use crate::filters::builder::{BankState, FilterBankBuilder};
use crate::filters::gabor_frequency::{GaborFrequency, GaborParams};
use crate::transform::FilterDomain;
use cancellable_loops::{par_try_for_each_cancellable, Completion, ProgressTracker};
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayViewMut3, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A bank of frequency-domain Gabor filters.
///
/// The frequencies, orientations and filters are rebuilt together whenever a parameter changes.
/// Mutators are serialized; an apply that runs concurrently with a rebuild works on either the
/// complete old or the complete new filter set. `output_in_frequency` is kept outside of the
/// rebuilt state and can be toggled at any time without touching the filters.
///
/// ```
/// use gabor_bank::{BankConfig, FilterBank};
/// use ndarray::Array2;
/// use num_complex::Complex64;
///
/// let mut config = BankConfig::new(32, 32);
/// config.n_orient = 4;
/// config.n_freq = 2;
/// config.k = 2.0;
/// config.output_in_frequency = true;
///
/// let bank = FilterBank::new(config).unwrap();
/// let spectrum = Array2::<Complex64>::zeros((32, 32));
/// let responses = bank.apply(spectrum.view()).unwrap();
/// assert_eq!(responses.dim(), (8, 32, 32));
///
/// bank.set_n_freq(3).unwrap();
/// assert_eq!(bank.len(), 12);
/// ```
#[derive(Debug)]
pub struct FilterBank {
    state: RwLock<Arc<BankState>>,
    writer: Mutex<()>,
    output_in_frequency: AtomicBool,
}

impl FilterBank {
    pub fn new(config: BankConfig) -> Result<Self, BankError> {
        let output_in_frequency = config.output_in_frequency;
        let state = BankState::build(config)?;
        Ok(FilterBank {
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            output_in_frequency: AtomicBool::new(output_in_frequency),
        })
    }

    pub fn builder(height: usize, width: usize) -> FilterBankBuilder {
        FilterBankBuilder::new(height, width)
    }

    /// The current derived state. Swapped states stay alive as long as a reader holds them.
    pub(crate) fn snapshot(&self) -> Arc<BankState> {
        // states are only ever replaced whole, so a poisoned lock still guards a valid state
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Edits a copy of the configuration and rebuilds from it; the bank is left untouched when
    /// the rebuild fails.
    pub(crate) fn update<F>(&self, edit: F) -> Result<(), BankError>
    where
        F: FnOnce(&mut BankConfig),
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut config = self.snapshot().config.clone();
        edit(&mut config);
        let state = BankState::build(config)?;
        self.install(state);
        Ok(())
    }

    fn install(&self, state: BankState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
    }

    /// The current state together with the output domain it is applied in. `reconfigure`
    /// replaces both under the state write lock, so the pair is never torn.
    fn applicable(&self) -> (Arc<BankState>, FilterDomain) {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (Arc::clone(&guard), self.output_domain())
    }

    /// Replaces the whole configuration, `output_in_frequency` included, in one rebuild.
    ///
    /// Applies running concurrently use either the old filters in the old output domain or the
    /// new filters in the new one.
    pub fn reconfigure(&self, config: BankConfig) -> Result<(), BankError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let output_in_frequency = config.output_in_frequency;
        let state = Arc::new(BankState::build(config)?);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = state;
        self.output_in_frequency
            .store(output_in_frequency, Ordering::Release);
        Ok(())
    }

    /// The effective configuration. In optimal mode `gamma` and `eta` hold the derived values.
    pub fn config(&self) -> BankConfig {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut config = guard.config.clone();
        config.output_in_frequency = self.output_in_frequency();
        config
    }

    pub fn output_in_frequency(&self) -> bool {
        self.output_in_frequency.load(Ordering::Acquire)
    }

    /// Chooses whether [`apply`](FilterBank::apply) returns spectra or spatial responses.
    /// Never rebuilds the filters.
    pub fn set_output_in_frequency(&self, output_in_frequency: bool) {
        self.output_in_frequency
            .store(output_in_frequency, Ordering::Release);
    }

    pub fn output_domain(&self) -> FilterDomain {
        FilterDomain::from_output_in_frequency(self.output_in_frequency())
    }

    /// Radial frequencies, `fmax` first.
    pub fn frequencies(&self) -> Array1<f64> {
        self.snapshot().frequencies.clone()
    }

    /// Orientation angles in radians, starting at 0.
    pub fn orientations(&self) -> Array1<f64> {
        self.snapshot().orientations.clone()
    }

    /// Parameters of every filter, in output order (`orient_index * n_freq + freq_index`).
    pub fn filter_params(&self) -> Vec<GaborParams> {
        self.snapshot()
            .filters
            .iter()
            .map(|filter| filter.params().clone())
            .collect()
    }

    /// Transfer function of filter `index`.
    pub fn kernel(&self, index: usize) -> Option<Array2<f64>> {
        self.snapshot()
            .filters
            .get(index)
            .map(|filter| filter.kernel().to_owned())
    }

    /// Number of filters, `n_orient * n_freq`.
    pub fn len(&self) -> usize {
        self.snapshot().filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filters a spectrum with every filter of the bank.
    ///
    /// `image` must be the `height x width` spectrum of the input (FFT layout, DC at `(0, 0)`).
    /// The result has shape `(n_orient * n_freq, height, width)`; plane `o * n_freq + f` is the
    /// response of orientation `o` and frequency `f`. Planes are transformed back to the spatial
    /// domain unless `output_in_frequency` is set.
    pub fn apply(&self, image: ArrayView2<Complex64>) -> Result<Array3<Complex64>, BankError> {
        let (state, domain) = self.applicable();
        check_image(&state, &image)?;
        let mut out = Array3::<Complex64>::zeros((
            state.filters.len(),
            state.config.height,
            state.config.width,
        ));
        let abort_flag = AtomicBool::new(false);
        run(
            &state,
            image,
            out.view_mut(),
            domain,
            None,
            &abort_flag,
        )?;
        Ok(out)
    }

    /// Like [`apply`](FilterBank::apply), writing into `out`.
    ///
    /// # Errors
    /// [`BankError::DimensionMismatch`] when `image` is not `height x width` or `out` is not
    /// `(n_orient * n_freq, height, width)`; `out` is left untouched in that case.
    pub fn apply_into(
        &self,
        image: ArrayView2<Complex64>,
        out: &mut Array3<Complex64>,
    ) -> Result<(), BankError> {
        let (state, domain) = self.applicable();
        check_image(&state, &image)?;
        let expected = [state.filters.len(), state.config.height, state.config.width];
        if out.shape() != &expected[..] {
            return Err(BankError::DimensionMismatch {
                expected: expected.to_vec(),
                found: out.shape().to_vec(),
            });
        }
        let abort_flag = AtomicBool::new(false);
        run(
            &state,
            image,
            out.view_mut(),
            domain,
            None,
            &abort_flag,
        )?;
        Ok(())
    }

    /// Like [`apply`](FilterBank::apply), publishing the fraction of finished planes to
    /// `progress_lock` and stopping early when `abort_flag` is raised.
    ///
    /// `progress_lock` is reset to `None` when the call returns.
    ///
    /// # Errors
    /// [`BankError::Aborted`] when the abort flag stopped the computation; no output is
    /// returned in that case.
    pub fn apply_with_progress(
        &self,
        image: ArrayView2<Complex64>,
        progress_lock: &RwLock<Option<f32>>,
        abort_flag: &AtomicBool,
    ) -> Result<Array3<Complex64>, BankError> {
        let (state, domain) = self.applicable();
        check_image(&state, &image)?;
        let mut out = Array3::<Complex64>::zeros((
            state.filters.len(),
            state.config.height,
            state.config.width,
        ));

        let progress = ProgressTracker::new(progress_lock, state.filters.len());
        let completion = run(
            &state,
            image,
            out.view_mut(),
            domain,
            Some(&progress),
            abort_flag,
        );
        progress.finish();

        match completion? {
            Completion::Finished => Ok(out),
            Completion::Cancelled => {
                log::info!("Gabor filtering aborted");
                Err(BankError::Aborted)
            }
        }
    }
}

impl Clone for FilterBank {
    /// Deep copy: the clone owns its own filters and its own locks.
    fn clone(&self) -> Self {
        let state = BankState::clone(&self.snapshot());
        FilterBank {
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            output_in_frequency: AtomicBool::new(self.output_in_frequency()),
        }
    }
}

fn check_image(state: &BankState, image: &ArrayView2<Complex64>) -> Result<(), BankError> {
    let (h, w) = image.dim();
    if (h, w) != (state.config.height, state.config.width) {
        return Err(BankError::DimensionMismatch {
            expected: vec![state.config.height, state.config.width],
            found: vec![h, w],
        });
    }
    Ok(())
}

/// Evaluates every filter on its own output plane, in parallel.
fn run(
    state: &BankState,
    image: ArrayView2<Complex64>,
    mut out: ArrayViewMut3<Complex64>,
    domain: FilterDomain,
    progress: Option<&ProgressTracker>,
    abort_flag: &AtomicBool,
) -> Result<Completion, BankError> {
    par_try_for_each_cancellable(
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(state.filters.par_iter()),
        abort_flag,
        |(mut plane, filter): (_, &GaborFrequency)| -> Result<(), BankError> {
            filter.apply_into(image, plane.view_mut())?;
            if domain == FilterDomain::Spatial {
                let spatial = state.converter.inverse(plane.view())?;
                plane.assign(&spatial);
            }
            if let Some(progress) = progress {
                progress.tick();
            }
            Ok(())
        },
    )
}
