//! Counter-based generator evaluated at compile time.
//!
//! The header cannot carry mutable state through constant evaluation, so it
//! uses the preprocessor counter as the generator state and Widynski's
//! Squares (<https://arxiv.org/abs/2004.06278>) as the mixing function.
//! [`PolyStream`] replays the macro family in counter order, which makes the
//! values a seed will bake into a binary observable without a compiler.

use crate::{Error, Seed};

// ============================================================================
// Mixing
// ============================================================================

const fn sq(x: u64) -> u64 {
    x.wrapping_mul(x)
}

const fn sm(x: u64) -> u64 {
    sq(x).wrapping_add(x)
}

const fn sh(x: u64) -> u64 {
    x.rotate_left(32)
}

/// One Squares output for `counter` under `seed`.
///
/// All arithmetic wraps modulo 2^64, matching unsigned long long.
pub const fn squares32(counter: u64, seed: u64) -> u32 {
    let cs = counter.wrapping_add(1).wrapping_mul(seed);
    let inner = sq(sh(sm(cs))).wrapping_add(cs).wrapping_add(seed);
    let mixed = sq(sh(inner)).wrapping_add(cs);
    (mixed >> 32) as u32
}

// ============================================================================
// PolyStream
// ============================================================================

/// The sequence of values a translation unit observes for one seed.
///
/// Every accessor consumes counters left to right, the way successive
/// expansions of `__COUNTER__` do. Composite values (`ull`, `double`,
/// `normal`) consume more than one counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyStream {
    seed: u64,
    counter: u64,
}

impl PolyStream {
    /// Start at counter zero, the first expansion in a translation unit.
    pub fn new(seed: Seed) -> Self {
        Self::starting_at(seed, 0)
    }

    /// Start at an arbitrary counter.
    pub fn starting_at(seed: Seed, counter: u64) -> Self {
        Self {
            seed: seed.get(),
            counter,
        }
    }

    /// The counter the next call will consume.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn advance(&mut self) -> u64 {
        let current = self.counter;
        self.counter = self.counter.wrapping_add(1);
        current
    }

    /// `poly_uint()`
    pub fn uint(&mut self) -> u32 {
        let counter = self.advance();
        squares32(counter, self.seed)
    }

    /// `poly_int()`
    pub fn int(&mut self) -> i32 {
        self.uint() as i32
    }

    /// `poly_ull()`: two ints, the first shifted high.
    ///
    /// Both operands are sign-extended before combining.
    pub fn ull(&mut self) -> u64 {
        let high = self.int() as i64 as u64;
        let low = self.int() as i64 as u64;
        (high << 32) ^ low
    }

    /// `poly_ll()`
    pub fn ll(&mut self) -> i64 {
        self.ull() as i64
    }

    /// `poly_float()`, in `[0, 1]`.
    pub fn float(&mut self) -> f32 {
        self.uint() as f32 / u32::MAX as f32
    }

    /// `poly_double()`, in `[0, 1]`.
    pub fn double(&mut self) -> f64 {
        self.ull() as f64 / u64::MAX as f64
    }

    /// `poly_random(max)`: a uint reduced modulo `max`.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroModulus`] when `max` is zero. No counter is consumed.
    pub fn random(&mut self, max: u32) -> Result<u32, Error> {
        if max == 0 {
            return Err(Error::ZeroModulus);
        }
        Ok(self.uint() % max)
    }

    /// `poly_normal(sigma, mu)` via Box-Muller over two doubles.
    pub fn normal(&mut self, sigma: f64, mu: f64) -> f64 {
        let a = self.double();
        let b = self.double();
        box_muller(a, b, sigma, mu)
    }
}

/// Box-Muller transform; the smallest positive double keeps `ln` finite.
fn box_muller(a: f64, b: f64, sigma: f64, mu: f64) -> f64 {
    let radius = (-2.0 * (a + f64::MIN_POSITIVE).ln()).sqrt();
    radius * (2.0 * std::f64::consts::PI * b).cos() * sigma + mu
}
