//! Frequency-domain Gabor filtering.
//!
//! # Components
//!
//! * **Single filter** (`gabor_frequency`): one Gabor transfer function for a fixed orientation,
//!   radial frequency and image size.
//!
//! * **Builder** (`builder`): derives the frequency and orientation samples from the bank
//!   configuration and instantiates one filter per pair, orientation-major.
//!
//! * **Bank** (`bank`): owns the filter set, applies it to a spectrum and rebuilds it whenever a
//!   parameter changes.

/// The filter bank and its apply step.
mod bank;

/// Configure-then-build construction and the derived bank state.
mod builder;

/// Single-frequency Gabor filter.
mod gabor_frequency;

pub use bank::FilterBank;
pub use builder::FilterBankBuilder;
pub use gabor_frequency::{GaborFrequency, GaborParams};
