//! Build manifest: the toolchain plus the batches to plan.
//!
//! ```toml
//! [toolchain]
//! compiler = "g++"
//!
//! [[batch]]
//! name_prefix = "fixed"
//! source      = "simple.cpp"
//! mode        = "fixed"
//! fixed_seed  = "1234567890ull"
//! count       = 3
//! ```

use std::path::{Path, PathBuf};

use poly_variant::{BatchSpec, DEFAULT_EXTENSION, Seed, SeedMode};
use serde::Deserialize;
use thiserror::Error;

/// Flags the reference builds use.
pub const DEFAULT_FLAGS: [&str; 4] = ["-g", "-O2", "-std=gnu++17", "-static"];

// ============================================================================
// Types
// ============================================================================

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Compiler settings shared by every batch.
    #[serde(default)]
    pub toolchain: Toolchain,
    /// Batches in planning order.
    #[serde(default, rename = "batch")]
    pub batches: Vec<BatchEntry>,
}

/// Compiler invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Toolchain {
    /// Compiler executable.
    pub compiler: String,
    /// Flags placed before the seed define.
    pub flags: Vec<String>,
    /// Default artifact directory.
    pub output_dir: PathBuf,
    /// Default artifact extension.
    pub extension: String,
}

/// One `[[batch]]` table. Unset paths fall back to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchEntry {
    /// Artifact name stem.
    pub name_prefix: String,
    /// Source file to compile.
    #[serde(alias = "source_file")]
    pub source: PathBuf,
    /// Seed policy.
    pub mode: SeedMode,
    /// Number of builds.
    pub count: i64,
    /// Constant for fixed mode.
    #[serde(default)]
    pub fixed_seed: Option<Seed>,
    /// Overrides [`Toolchain::output_dir`].
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Overrides [`Toolchain::extension`].
    #[serde(default)]
    pub extension: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

/// Somewhere a [`Manifest`] can be loaded from.
pub trait ManifestSource {
    /// Error type for loading failures.
    type Error: std::error::Error + Send + Sync + 'static;
    /// Load and parse the manifest.
    fn load(&self) -> Result<Manifest, Self::Error>;
}

/// A TOML manifest on disk.
#[derive(Debug, Clone)]
pub struct TomlFile(PathBuf);

// ============================================================================
// Impls
// ============================================================================

impl Manifest {
    /// Parse a manifest from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The batches as generator input, with toolchain defaults applied.
    pub fn batch_specs(&self) -> Vec<BatchSpec> {
        self.batches
            .iter()
            .map(|entry| entry.to_spec(&self.toolchain))
            .collect()
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "g++".into(),
            flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
            output_dir: PathBuf::from("output"),
            extension: DEFAULT_EXTENSION.into(),
        }
    }
}

impl BatchEntry {
    /// Resolve against `toolchain` defaults.
    pub fn to_spec(&self, toolchain: &Toolchain) -> BatchSpec {
        BatchSpec {
            count: self.count,
            mode: self.mode,
            fixed_seed: self.fixed_seed,
            name_prefix: self.name_prefix.clone(),
            source_file: self.source.clone(),
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| toolchain.output_dir.clone()),
            extension: self
                .extension
                .clone()
                .unwrap_or_else(|| toolchain.extension.clone()),
        }
    }
}

impl TomlFile {
    /// A manifest at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The manifest path.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl ManifestSource for TomlFile {
    type Error = ManifestError;

    fn load(&self) -> Result<Manifest, Self::Error> {
        let text = std::fs::read_to_string(&self.0).map_err(|source| ManifestError::Read {
            path: self.0.clone(),
            source,
        })?;
        let manifest = Manifest::from_toml(&text).map_err(|source| ManifestError::Parse {
            path: self.0.clone(),
            source,
        })?;
        tracing::debug!(
            path = %self.0.display(),
            batches = manifest.batches.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("cannot read manifest {}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid manifest.
    #[error("invalid manifest {}", path.display())]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// Tests
// ============================================================================
