//! Error types of the filter bank and of the single-frequency Gabor filter.

use thiserror::Error;

/// Errors raised while building a single [`GaborFrequency`](crate::filters::GaborFrequency)
/// filter or applying it to an image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GaborError {
    #[error("invalid filter geometry {height}x{width}")]
    InvalidGeometry { height: usize, width: usize },

    #[error("invalid filter parameter `{name}` = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("image of shape {found:?} does not match filter shape {expected:?}")]
    DimensionMismatch {
        expected: [usize; 2],
        found: [usize; 2],
    },
}

/// Errors raised by the filter bank.
///
/// Failed constructions and mutations never change the bank; failed applies never write a
/// partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("invalid bank parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("array of shape {found:?} does not match expected shape {expected:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// An error of the single-frequency filter, passed through unchanged.
    #[error(transparent)]
    Filter(#[from] GaborError),

    #[error("filtering was aborted")]
    Aborted,
}

impl BankError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        BankError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
