use rand::{Rng, RngCore};

/// A supplier of uniform variates in `[0, 1)`.
///
/// The sampler never owns or seeds a generator; each `sample` call pulls as
/// many draws as the rejection loop needs from the source it is handed.
pub trait UniformSource {
    /// Next uniform value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> UniformSource for R {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Adapts a closure into a [`UniformSource`].
///
/// Useful for replaying a fixed sequence of draws.
#[derive(Clone, Debug)]
pub struct FnSource<F>(pub F);

impl<F: FnMut() -> f64> UniformSource for FnSource<F> {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (self.0)()
    }
}

/// Wrap `f` so it can drive a sampler.
pub fn from_fn<F: FnMut() -> f64>(f: F) -> FnSource<F> {
    FnSource(f)
}
