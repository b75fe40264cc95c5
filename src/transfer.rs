//! Per-channel transfer functions
//!
//! A [`TransferFn`] maps a normalized input level to a normalized output
//! level for each primary channel. Curves are cheap to clone and can be
//! combined with [`TransferFn::chain`] and [`TransferFn::multiply`].

use alloc::sync::Arc;
use core::fmt;

/// Primary additive color channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All channels, in table order
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Index of the channel in a lookup table
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

type CurveFn = dyn Fn(Channel, f32) -> f32 + Send + Sync;

/// Function mapping `[0, 1]` to `[0, 1]` for every channel.
///
/// The curve doesn't have to be continuous or monotonic. Whatever the
/// underlying closure returns, [`TransferFn::apply`] clamps it into `[0, 1]`.
#[derive(Clone)]
pub struct TransferFn {
    curve: Arc<CurveFn>,
}

impl TransferFn {
    /// Wrap a closure as a transfer function
    pub fn new<F>(curve: F) -> Self
    where
        F: Fn(Channel, f32) -> f32 + Send + Sync + 'static,
    {
        Self {
            curve: Arc::new(curve),
        }
    }

    /// `f(x) = x`
    pub fn identity() -> Self {
        Self::new(|_, input| input)
    }

    /// `f(x) = x^exp`
    ///
    /// In the context of CRT gamma correction, `exp` is the gamma value.
    /// Negative exponents are treated as zero.
    pub fn power(exp: f32) -> Self {
        let exp = exp.max(0.0);
        Self::new(move |_, input| libm::powf(input, exp))
    }

    /// `f(x) = coef * x`, with `coef` clamped to `[0, 1]`
    pub fn dim(coef: f32) -> Self {
        let coef = coef.clamp(0.0, 1.0);
        Self::new(move |_, input| input * coef)
    }

    /// Step curve: 0 below `threshold`, 1 from `threshold` up
    pub fn bilevel(threshold: f32) -> Self {
        Self::new(move |_, input| if input < threshold { 0.0 } else { 1.0 })
    }

    /// Evaluate the curve for a channel
    pub fn apply(&self, channel: Channel, input: f32) -> f32 {
        let out = (self.curve)(channel, input);
        if out.is_nan() {
            return 0.0;
        }
        out.clamp(0.0, 1.0)
    }

    /// Apply `self`, then `next`: `a.chain(b)(x) = b(a(x))`
    #[must_use]
    pub fn chain(&self, next: &Self) -> Self {
        let first = self.clone();
        let second = next.clone();
        Self::new(move |ch, input| second.apply(ch, first.apply(ch, input)))
    }

    /// Pointwise product: `a.multiply(b)(x) = a(x) * b(x)`
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let a = self.clone();
        let b = other.clone();
        Self::new(move |ch, input| a.apply(ch, input) * b.apply(ch, input))
    }
}

impl Default for TransferFn {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for TransferFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferFn")
            .field("red_mid", &self.apply(Channel::Red, 0.5))
            .field("green_mid", &self.apply(Channel::Green, 0.5))
            .field("blue_mid", &self.apply(Channel::Blue, 0.5))
            .finish()
    }
}
