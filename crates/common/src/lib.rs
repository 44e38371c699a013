//! `hc-common`: Shared types for the headless compute harness.
//!
//! This crate holds everything the harness and the GPU HAL agree on that is
//! not itself a Vulkan object:
//!
//! - **Config**: `HarnessConfig`, `ShaderVariant`, `ValidationMode`
//! - **Workload**: host-side element buffers and their byte views
//! - **Errors**: `ConfigError` (thiserror-based)

pub mod config;
pub mod error;
pub mod workload;

// Re-export commonly used items at crate root
pub use config::{HarnessConfig, ShaderVariant, ValidationMode};
pub use error::ConfigError;
pub use workload::{HostBuffer, Workload};
