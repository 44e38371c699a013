//! Vulkan compute backend for the headless harness.
//!
//! Uses the Vulkan API via `ash`. No surface, swapchain or graphics pipeline
//! is ever created.
//!
//! # Module Structure
//!
//! - [`context`]: instance, device, compute queue and command pool.
//! - [`memory`]: host-visible and device-local memory blocks.
//! - [`bridge`]: host bytes into and out of host-visible blocks.
//! - [`transfer`]: synchronous block-to-block copies.
//! - [`shader`]: SPIR-V program loading.
//! - [`pipeline`]: descriptor sets and the compute pipeline over bound blocks.
//! - [`barrier`]: the visibility model a dispatch is checked against.
//! - [`dispatch`]: barrier-guarded dispatch with one in-flight submission.
//! - [`queue`]: command buffer recording, fences and submission.
//! - [`error`]: Vulkan-specific error types.
//!
//! # Usage
//!
//! ```no_run
//! use hc_gpu_hal::vulkan::{
//!     BindingDescriptor, BindingRole, BlockPair, ComputePipeline, ContextOptions,
//!     DeviceContext, DispatchEngine, ShaderModule, SpecializationConstants,
//! };
//!
//! # fn main() -> Result<(), hc_gpu_hal::vulkan::VulkanError> {
//! let ctx = DeviceContext::new(&ContextOptions::default())?;
//! let input: Vec<u32> = (0..32).collect();
//! let bytes: Vec<u8> = input.iter().flat_map(|v| v.to_ne_bytes()).collect();
//!
//! let pair = BlockPair::allocate(&ctx, bytes.len() as u64)?;
//! pair.upload(&bytes)?;
//!
//! let program = ShaderModule::from_spirv_file(&ctx, std::path::Path::new("headless.spv"))?;
//! let bindings = BindingDescriptor::new().bind(&pair.device, 0, BindingRole::InputOutput);
//! let pipeline = ComputePipeline::build(
//!     &ctx,
//!     bindings,
//!     &program,
//!     SpecializationConstants { element_count: 32 },
//! )?;
//!
//! DispatchEngine::new(&ctx)?.dispatch(&pipeline)?;
//!
//! let mut output = vec![0u8; bytes.len()];
//! pair.download(&mut output)?;
//! # Ok(())
//! # }
//! ```

pub mod barrier;
pub mod bridge;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod queue;
pub mod shader;
pub mod transfer;

// Re-export key types for convenience.
pub use self::barrier::{Access, BufferBarrier, CommandPlan, VisibilityError, VisibilityTracker};
pub use self::bridge::{copy, CopyDirection, HostTransfer};
pub use self::context::{ContextOptions, DeviceContext};
pub use self::dispatch::{DispatchEngine, DispatchState};
pub use self::error::VulkanError;
pub use self::memory::{find_memory_type, MemoryBlock, MemoryKind};
pub use self::pipeline::{Binding, BindingDescriptor, BindingRole, ComputePipeline, SpecializationConstants};
pub use self::queue::{CommandPool, CommandRecorder, Fence, OneShotCommandBuffer};
pub use self::shader::ShaderModule;
pub use self::transfer::{stage, BlockPair};
