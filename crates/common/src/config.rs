//! Harness configuration: program variant, shader location, workload size.
//!
//! The entry point builds one [`HarnessConfig`] (defaults, then an optional
//! JSON file, then command-line overrides) and passes it down explicitly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of elements per buffer when nothing else is configured.
pub const DEFAULT_ELEMENT_COUNT: u32 = 32;

/// Which compute program the harness runs, and with how many buffers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderVariant {
    /// One `u32` buffer at slot 0, rewritten in place by `headless.spv`.
    #[default]
    Identity,
    /// Two `f32` buffers at slots 0 and 1, combined into slot 1 by `combine.spv`.
    Combine,
}

impl ShaderVariant {
    /// File stem of the SPIR-V program for this variant.
    pub fn program_name(self) -> &'static str {
        match self {
            Self::Identity => "headless",
            Self::Combine => "combine",
        }
    }

    /// Number of storage buffers the program binds.
    pub fn buffer_count(self) -> usize {
        match self {
            Self::Identity => 1,
            Self::Combine => 2,
        }
    }
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Combine => f.write_str("combine"),
        }
    }
}

impl FromStr for ShaderVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "headless" => Ok(Self::Identity),
            "combine" => Ok(Self::Combine),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

/// Whether the Khronos validation layer is requested.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Enabled in debug builds, disabled in release builds.
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl ValidationMode {
    /// Resolve to a yes/no answer for a build with or without debug assertions.
    pub fn resolve(self, debug_build: bool) -> bool {
        match self {
            Self::Auto => debug_build,
            Self::Enabled => true,
            Self::Disabled => false,
        }
    }
}

impl FromStr for ValidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" | "enabled" | "true" => Ok(Self::Enabled),
            "off" | "disabled" | "false" => Ok(Self::Disabled),
            other => Err(ConfigError::UnknownValidationMode(other.to_string())),
        }
    }
}

/// Top-level harness configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub variant: ShaderVariant,
    /// Directory holding compiled `.spv` programs. `None` means the directory
    /// produced by the build script.
    pub shader_dir: Option<PathBuf>,
    /// Elements per buffer; also the dispatch width and specialization constant.
    pub element_count: u32,
    pub validation: ValidationMode,
    /// Default `tracing` filter directive (e.g. `info`, `hc_gpu_hal=debug`).
    pub log_level: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            variant: ShaderVariant::Identity,
            shader_dir: None,
            element_count: DEFAULT_ELEMENT_COUNT,
            validation: ValidationMode::Auto,
            log_level: "info".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check invariants that the rest of the harness relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_count == 0 {
            return Err(ConfigError::ZeroElements);
        }
        Ok(())
    }

    /// Path of the SPIR-V program for the configured variant inside `dir`.
    pub fn program_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.spv", self.variant.program_name()))
    }
}
