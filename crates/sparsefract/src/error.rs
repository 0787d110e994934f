//! Fraction arithmetic error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FractionError {
    #[error("result left the representable interval (-1, 1)")]
    RangeExceeded,

    #[error("small term {small:#x} at offset {offset} violates the normalization invariant")]
    NotNormalized { small: u64, offset: u32 },

    #[error("value {value} is not inside the open interval (-1, 1)")]
    OutOfRange { value: f64 },
    #[error("small-term offset {offset} does not fit the 32-bit gap field")]
    OffsetOverflow { offset: u64 },
}

pub type Result<T> = std::result::Result<T, FractionError>;
