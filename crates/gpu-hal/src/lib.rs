//! `hc-gpu-hal`: Vulkan compute backend for the headless harness.
//!
//! Owns the device, memory blocks, one-shot transfers, the compute pipeline
//! and the barrier-guarded dispatch. Nothing here opens a window or needs a
//! display surface.

#[cfg(feature = "vulkan")]
pub mod vulkan;

pub mod kernels;
