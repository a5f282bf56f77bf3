//! Error types for Zipf sampling.

use thiserror::Error;

/// Error variants for sampler construction and sampling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A constructor argument was outside its domain.
    #[error("{name} is not strictly positive: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// The rejection loop hit its iteration cap without accepting a candidate.
    #[error("sampling stalled after {iterations} rejected candidates")]
    SamplingStalled { iterations: u32 },
}

/// A specialized Result type for Zipf sampling.
pub type Result<T> = std::result::Result<T, Error>;
