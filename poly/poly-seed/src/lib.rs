//! # Poly Seed
//!
//! Seed primitives for polymorphic builds: the value injected through the
//! `__POLY_RANDOM_SEED__` macro, the sources that produce it, and a Rust
//! rendition of the compile-time generator that consumes it.
//!
//! ## Seed
//!
//! A [`Seed`] is a 64-bit unsigned integer. Its macro form is the decimal
//! value followed by an unsigned-long-long suffix:
//!
//! ```text
//! 1234567890ull
//! ```
//!
//! ## Sources
//!
//! A [`SeedSource`] hands out one fresh 64-bit draw per call. Any
//! `FnMut() -> u64` closure is a source, which keeps stubbing trivial;
//! [`RngSource`] adapts a `rand` generator (OS entropy or a fixed replay
//! seed).
//!
//! ## Compile-time generator
//!
//! [`squares`] reproduces the counter-based generator the seed feeds, and
//! [`timestamp`] reproduces the seed a build derives from `__DATE__` and
//! `__TIME__` when the macro is absent.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod squares;
pub mod timestamp;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use squares::{PolyStream, squares32};
pub use timestamp::{default_seed, default_seed_at};

/// Name of the preprocessor macro carrying the seed.
pub const MACRO_NAME: &str = "__POLY_RANDOM_SEED__";

/// Suffix appended to the decimal value in the macro literal.
pub const LITERAL_SUFFIX: &str = "ull";

/// Integer suffixes accepted when parsing a literal, longest first.
const ACCEPTED_SUFFIXES: [&str; 6] = ["ull", "ULL", "llu", "LLU", "u", "U"];

// ============================================================================
// Seed
// ============================================================================

/// A 64-bit seed for the compile-time generator.
///
/// Displayed as plain decimal; [`Seed::to_literal`] gives the macro form.
/// Deserializes from an integer or from a literal string, since TOML
/// integers stop at `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SeedRepr", into = "u64"))]
pub struct Seed(u64);

impl Seed {
    /// Wrap a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The macro literal, e.g. `1234567890ull`.
    pub fn to_literal(self) -> String {
        format!("{}{LITERAL_SUFFIX}", self.0)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a decimal value with an optional integer suffix (`ull`, `u`, ...).
impl FromStr for Seed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = ACCEPTED_SUFFIXES
            .iter()
            .find_map(|suffix| trimmed.strip_suffix(suffix))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(Error::EmptyLiteral);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidLiteral(s.to_string()));
        }

        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::LiteralOverflow(s.to_string()))
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Seed> for u64 {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

/// Wire shape accepted when deserializing a [`Seed`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedRepr {
    Int(u64),
    Literal(String),
}

#[cfg(feature = "serde")]
impl TryFrom<SeedRepr> for Seed {
    type Error = Error;

    fn try_from(repr: SeedRepr) -> Result<Self, Self::Error> {
        match repr {
            SeedRepr::Int(value) => Ok(Self(value)),
            SeedRepr::Literal(s) => s.parse(),
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// A supplier of independent 64-bit draws.
///
/// Each call is one draw; callers never reuse a value across builds.
pub trait SeedSource {
    /// Draw the next value, uniform over the full `u64` range.
    fn draw(&mut self) -> u64;
}

impl<F> SeedSource for F
where
    F: FnMut() -> u64,
{
    fn draw(&mut self) -> u64 {
        self()
    }
}

/// A [`SeedSource`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng>(R);

impl RngSource<StdRng> {
    /// A generator seeded from operating system entropy.
    pub fn entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// A generator whose draws are fully determined by `replay`.
    pub fn seeded(replay: u64) -> Self {
        Self(StdRng::seed_from_u64(replay))
    }
}

impl<R: RngCore> RngSource<R> {
    /// Wrap an arbitrary generator.
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl<R: RngCore> SeedSource for RngSource<R> {
    fn draw(&mut self) -> u64 {
        self.0.next_u64()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors produced by seed operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The literal has no digits.
    #[error("seed literal cannot be empty")]
    EmptyLiteral,
    /// The literal contains something other than digits and a suffix.
    #[error("invalid seed literal: '{0}'")]
    InvalidLiteral(String),
    /// The literal does not fit in 64 bits.
    #[error("seed literal does not fit in 64 bits: '{0}'")]
    LiteralOverflow(String),
    /// Not a `__DATE__` string (`Mmm dd yyyy`).
    #[error("invalid build date '{0}', expected `Mmm dd yyyy`")]
    InvalidDate(String),
    /// Not a `__TIME__` string (`hh:mm:ss`).
    #[error("invalid build time '{0}', expected `hh:mm:ss`")]
    InvalidTime(String),
    /// A bounded draw was requested with a zero bound.
    #[error("modulus must be greater than zero")]
    ZeroModulus,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests;
