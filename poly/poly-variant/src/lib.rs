//! Seeded build variant generation.
//!
//! Given a batch description and a seed policy, produces the configurations
//! of the builds to dispatch: which source to compile, where the artifact
//! goes, and which seed (if any) the build receives through
//! `__POLY_RANDOM_SEED__`.
//!
//! # Design
//!
//! Generation is pure. Randomness is injected as a [`SeedSource`], so a
//! closure over a fixed list reproduces any batch exactly. No compiler is
//! run and no file is touched; dispatching variants is the caller's job.
//!
//! # Examples
//!
//! ```
//! use poly_variant::{BatchSpec, SeedMode, generate};
//!
//! let spec = BatchSpec::new(3, SeedMode::Random, "seeded", "simple.cpp", "output");
//! let mut draws = [5_u64, 7, 9].into_iter();
//! let mut source = move || draws.next().unwrap_or_default();
//!
//! let variants: Vec<_> = generate(&spec, &mut source).unwrap().collect();
//! assert_eq!(variants[1].output_path().to_str(), Some("output/seeded2.exe"));
//! assert_eq!(variants[1].seed().map(|s| s.get()), Some(7));
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

pub use poly_seed::{Seed, SeedSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Artifact extension used when a batch does not name one.
pub const DEFAULT_EXTENSION: &str = ".exe";

// ============================================================================
// Types
// ============================================================================

/// How a batch obtains the seed each build receives.
///
/// Names are case-insensitive wherever they are read, and `external` is an
/// alias for `random`. Serialized names are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SeedMode {
    /// No seed is injected; the build falls back to its timestamp seed.
    None,
    /// Every build receives the same configured seed.
    Fixed,
    /// Every build receives its own draw from the seed source.
    Random,
}

/// Description of one batch of builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSpec {
    /// Number of builds. Signed so that configuration errors surface as
    /// [`Error::NegativeCount`] rather than as parse failures.
    pub count: i64,
    /// Seed policy for every build in the batch.
    pub mode: SeedMode,
    /// The constant for [`SeedMode::Fixed`]; ignored by the other modes.
    #[serde(default)]
    pub fixed_seed: Option<Seed>,
    /// Artifact name stem; the 1-based build index follows it.
    pub name_prefix: String,
    /// Source file handed to the compiler.
    #[serde(alias = "source")]
    pub source_file: PathBuf,
    /// Directory the artifacts are written to.
    pub output_dir: PathBuf,
    /// Artifact extension, including the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// One build to dispatch.
///
/// Constructed only by [`generate`]: a seed is present exactly when the
/// mode is [`SeedMode::Fixed`] or [`SeedMode::Random`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariant {
    source_file: PathBuf,
    output_path: PathBuf,
    seed_mode: SeedMode,
    seed: Option<Seed>,
}

/// Lazy sequence of the variants of one batch.
///
/// Random draws happen as variants are yielded, one per variant.
pub struct Variants<'a, S: ?Sized> {
    spec: &'a BatchSpec,
    source: &'a mut S,
    fixed: Option<Seed>,
    next: u64,
    total: u64,
}

/// Category of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The batch description is malformed.
    InvalidArgument,
}

// ============================================================================
// Functions
// ============================================================================

/// Produce the variants of `spec`, drawing random seeds from `source`.
///
/// The batch is validated up front; the returned iterator cannot fail.
/// `source` is only called for [`SeedMode::Random`], exactly once per
/// yielded variant.
///
/// # Errors
///
/// - [`Error::NegativeCount`]: `spec.count` is below zero.
/// - [`Error::MissingFixedSeed`]: fixed mode without `spec.fixed_seed`.
/// - [`Error::InvalidFileName`]: the prefix or extension would place
///   artifacts outside `spec.output_dir`.
pub fn generate<'a, S>(spec: &'a BatchSpec, source: &'a mut S) -> Result<Variants<'a, S>, Error>
where
    S: SeedSource + ?Sized,
{
    let total = u64::try_from(spec.count).map_err(|_| Error::NegativeCount(spec.count))?;

    let fixed = match spec.mode {
        SeedMode::Fixed => Some(spec.fixed_seed.ok_or(Error::MissingFixedSeed)?),
        SeedMode::None | SeedMode::Random => None,
    };

    validate_file_name(&format!("{}1{}", spec.name_prefix, spec.extension))?;

    tracing::debug!(
        prefix = %spec.name_prefix,
        mode = %spec.mode,
        count = total,
        "generating build variants"
    );

    Ok(Variants {
        spec,
        source,
        fixed,
        next: 0,
        total,
    })
}

// ============================================================================
// Impls: SeedMode
// ============================================================================

impl SeedMode {
    /// Lowercase name, as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fixed => "fixed",
            Self::Random => "random",
        }
    }

    /// Whether variants of this mode carry a seed.
    pub fn carries_seed(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for SeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fixed" => Ok(Self::Fixed),
            "random" | "external" => Ok(Self::Random),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for SeedMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ============================================================================
// Impls: BatchSpec
// ============================================================================

impl BatchSpec {
    /// A batch with the default extension and no fixed seed.
    pub fn new(
        count: i64,
        mode: SeedMode,
        name_prefix: impl Into<String>,
        source_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            count,
            mode,
            fixed_seed: None,
            name_prefix: name_prefix.into(),
            source_file: source_file.into(),
            output_dir: output_dir.into(),
            extension: default_extension(),
        }
    }

    /// Set the constant used by [`SeedMode::Fixed`].
    #[must_use]
    pub fn with_fixed_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.fixed_seed = Some(seed.into());
        self
    }

    /// Set the artifact extension (include the dot; may be empty).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Artifact path of the build with 1-based `index`.
    pub fn output_path(&self, index: u64) -> PathBuf {
        self.output_dir
            .join(format!("{}{index}{}", self.name_prefix, self.extension))
    }
}

// ============================================================================
// Impls: BuildVariant
// ============================================================================

impl BuildVariant {
    /// Source file to compile.
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Where the artifact is written.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The policy the seed came from.
    pub fn seed_mode(&self) -> SeedMode {
        self.seed_mode
    }

    /// The injected seed, absent for [`SeedMode::None`].
    pub fn seed(&self) -> Option<Seed> {
        self.seed
    }
}

// ============================================================================
// Impls: Variants
// ============================================================================

impl<S: SeedSource + ?Sized> Iterator for Variants<'_, S> {
    type Item = BuildVariant;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        self.next += 1;

        let seed = match self.spec.mode {
            SeedMode::None => None,
            SeedMode::Fixed => self.fixed,
            SeedMode::Random => Some(Seed::new(self.source.draw())),
        };

        let variant = BuildVariant {
            source_file: self.spec.source_file.clone(),
            output_path: self.spec.output_path(self.next),
            seed_mode: self.spec.mode,
            seed,
        };
        tracing::trace!(
            output = %variant.output_path.display(),
            seed = ?variant.seed,
            "variant"
        );
        Some(variant)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<S: SeedSource + ?Sized> ExactSizeIterator for Variants<'_, S> {}

impl<S: SeedSource + ?Sized> FusedIterator for Variants<'_, S> {}

// ============================================================================
// Errors
// ============================================================================

/// Errors during variant generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested count is negative.
    #[error("invalid argument: count must be non-negative, got {0}")]
    NegativeCount(i64),
    /// Fixed mode was requested without a seed to fix.
    #[error("invalid argument: fixed seed mode requires a fixed seed value")]
    MissingFixedSeed,
    /// The seed mode name is not recognized.
    #[error("invalid argument: unknown seed mode '{0}', expected none, fixed or random")]
    UnknownMode(String),
    /// The artifact name is not a single file name inside the output
    /// directory.
    #[error("invalid argument: artifact name '{0}' must be a plain file name")]
    InvalidFileName(String),
}

impl Error {
    /// The category of this error. Every generation failure is an invalid
    /// argument, reported before any variant is produced.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeCount(_)
            | Self::MissingFixedSeed
            | Self::UnknownMode(_)
            | Self::InvalidFileName(_) => ErrorKind::InvalidArgument,
        }
    }
}

// ============================================================================
// Private helpers
// ============================================================================

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

/// `name` must join onto the output directory as exactly one normal
/// component. Both separators are refused on every platform.
fn validate_file_name(name: &str) -> Result<(), Error> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !name.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(Error::InvalidFileName(name.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
