//! Gabor filter bank operating in the frequency domain.
//!
//! A [`FilterBank`] samples `n_orient` orientations and `n_freq` radial frequencies
//! (`fmax, fmax / k, fmax / k², ...`) and holds one frequency-domain Gabor filter per pair.
//! Applying the bank to the spectrum of a `height x width` complex image yields a stack of
//! `n_orient * n_freq` responses, either as spectra or transformed back to the spatial domain.
//!
//! ```
//! use gabor_bank::{DomainConverter, FilterBank};
//! use ndarray::Array2;
//! use num_complex::Complex64;
//!
//! let bank = FilterBank::builder(16, 16).n_orient(2).n_freq(2).build().unwrap();
//!
//! let image = Array2::from_shape_fn((16, 16), |(y, x)| Complex64::new((x + y) as f64, 0.0));
//! let spectrum = DomainConverter::new(16, 16).forward(image.view()).unwrap();
//! let responses = bank.apply(spectrum.view()).unwrap();
//! assert_eq!(responses.dim(), (4, 16, 16));
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod math_tools;
pub mod transform;

pub use config::BankConfig;
pub use error::{BankError, GaborError};
pub use filters::{FilterBank, FilterBankBuilder, GaborFrequency, GaborParams};
pub use transform::{DomainConverter, FilterDomain};
