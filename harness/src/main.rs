//! `headless-compute`: run one compute program over generated buffers on the
//! first compute-capable Vulkan device and print what went in and came out.

mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use hc_common::{HarnessConfig, ShaderVariant, ValidationMode};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Headless Vulkan compute-dispatch harness
#[derive(Parser, Debug)]
#[command(name = "headless-compute")]
#[command(version)]
struct Args {
    /// Program to run: `identity` (one u32 buffer) or `combine` (two f32 buffers)
    #[arg(long)]
    variant: Option<ShaderVariant>,

    /// Directory holding compiled `.spv` programs
    ///
    /// Defaults to the directory the build script compiled `kernels/vulkan` into.
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Elements per buffer (also the dispatch width)
    #[arg(long)]
    elements: Option<u32>,

    /// Validation layer: `auto` (debug builds only), `on` or `off`
    #[arg(long)]
    validation: Option<ValidationMode>,

    /// JSON configuration file; flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Defaults, then the config file, then flags.
    fn into_config(self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_json_file(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(dir) = self.shader_dir {
            config.shader_dir = Some(dir);
        }
        if let Some(n) = self.elements {
            config.element_count = n;
        }
        if let Some(mode) = self.validation {
            config.validation = mode;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet; the level itself may come from the config.
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);

    match run::run(&config) {
        Ok(outcome) => {
            println!("{}", report::render(&outcome.inputs, &outcome.output));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Dispatch failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "headless-compute",
            "--variant",
            "combine",
            "--elements",
            "64",
            "--validation",
            "off",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.variant, ShaderVariant::Combine);
        assert_eq!(config.element_count, 64);
        assert_eq!(config.validation, ValidationMode::Disabled);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn no_flags_is_the_identity_run() {
        let config = Args::try_parse_from(["headless-compute"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn zero_elements_is_rejected() {
        let args = Args::try_parse_from(["headless-compute", "--elements", "0"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn unknown_variant_is_a_usage_error() {
        assert!(Args::try_parse_from(["headless-compute", "--variant", "blur"]).is_err());
    }
}
