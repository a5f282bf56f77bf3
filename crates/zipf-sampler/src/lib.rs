//! Zipf (power-law) sampling over `1..=n` using rejection-inversion.
//!
//! The sampler follows Hörmann & Derflinger, "Rejection-inversion to generate
//! variates from monotone discrete distributions" (TOMACS 6.3, 1996), with the
//! integral function shifted so that any exponent `> 0` works, including `1`.
//!
//! The caller owns the randomness: every draw comes from a [`UniformSource`],
//! which is implemented for all `rand` generators and for plain closures via
//! [`from_fn`].

mod error;
mod math;
mod sampler;
mod source;

pub use error::{Error, Result};
pub use sampler::{ZipfSampler, DEFAULT_MAX_ITERATIONS, MAX_PROBABILITY_ELEMENTS};
pub use source::{from_fn, FnSource, UniformSource};
