use thiserror::Error;

/// Errors raised while building domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An amount was negative or could not be represented.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// A range whose lower bound is above its upper bound.
    #[error("invalid range: lower {lower} > upper {upper}")]
    InvalidRange {
        /// Lower bound.
        lower: i32,
        /// Upper bound.
        upper: i32,
    },
    /// Unknown enum value from user input.
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// What was being parsed.
        kind: &'static str,
        /// The offending value.
        value: String,
    },
}
