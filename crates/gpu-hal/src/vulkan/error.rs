//! Vulkan-specific error types.

use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

use super::barrier::VisibilityError;
use super::dispatch::DispatchState;
use super::memory::MemoryKind;

/// Errors from the Vulkan backend.
///
/// Every device call is checked where it is made and mapped to the variant
/// naming that operation.
#[derive(Error, Debug)]
pub enum VulkanError {
    #[error("Vulkan loader not available: {0}")]
    LoaderUnavailable(String),

    #[error("No physical device with a compute queue family found")]
    NoDevice,

    #[error("No compute-capable queue family found")]
    NoComputeQueue,

    #[error("Physical device enumeration failed: {0}")]
    DeviceEnumeration(vk::Result),

    #[error("Vulkan instance creation failed: {0}")]
    InstanceCreation(vk::Result),

    #[error("Debug messenger creation failed: {0}")]
    DebugMessengerCreation(vk::Result),

    #[error("Vulkan device creation failed: {0}")]
    DeviceCreation(vk::Result),

    #[error("Failed to read compute program {path}: {source}")]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid SPIR-V: {0}")]
    InvalidSpirv(String),

    #[error("Shader module creation failed: {0}")]
    ShaderCreation(vk::Result),

    #[error("Descriptor set layout creation failed: {0}")]
    DescriptorSetLayoutCreation(vk::Result),

    #[error("Descriptor pool creation failed: {0}")]
    DescriptorPoolCreation(vk::Result),

    #[error("Descriptor set allocation failed: {0}")]
    DescriptorAllocation(vk::Result),

    #[error("Pipeline layout creation failed: {0}")]
    PipelineLayoutCreation(vk::Result),

    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(vk::Result),

    #[error("Invalid bindings: {0}")]
    InvalidBindings(String),

    #[error("Memory blocks must hold at least one byte")]
    ZeroSizedBlock,

    #[error("Buffer creation failed: {0}")]
    BufferCreation(vk::Result),

    #[error("No memory type matches bits {type_bits:#x} with properties {properties:?}")]
    NoSuitableMemoryType {
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    },

    #[error("Memory allocation of {size} bytes failed: {result}")]
    MemoryAllocation { size: u64, result: vk::Result },

    #[error("Buffer memory binding failed: {0}")]
    MemoryBind(vk::Result),

    #[error("Memory mapping failed: {0}")]
    MemoryMap(vk::Result),

    #[error("Mapped memory flush failed: {0}")]
    MemoryFlush(vk::Result),

    #[error("Mapped memory invalidate failed: {0}")]
    MemoryInvalidate(vk::Result),

    #[error("Expected a {expected:?} block, got {actual:?}")]
    WrongMemoryKind {
        expected: MemoryKind,
        actual: MemoryKind,
    },

    #[error("Host buffer holds {host} bytes but the block is {block} bytes")]
    HostBufferTooSmall { host: usize, block: u64 },

    #[error("Transfer size mismatch: source {src} bytes, destination {dst} bytes")]
    SizeMismatch { src: u64, dst: u64 },

    #[error("Command pool creation failed: {0}")]
    CommandPoolCreation(vk::Result),

    #[error("Command buffer allocation failed: {0}")]
    CommandBufferAllocation(vk::Result),

    #[error("Command buffer recording failed: {0}")]
    CommandBufferRecording(vk::Result),

    #[error("Fence creation failed: {0}")]
    FenceCreation(vk::Result),

    #[error("Fence reset failed: {0}")]
    FenceReset(vk::Result),

    #[error("Queue submit failed: {0}")]
    QueueSubmit(vk::Result),

    #[error("Fence wait failed: {0}")]
    FenceWait(vk::Result),

    #[error("Queue wait idle failed: {0}")]
    QueueWaitIdle(vk::Result),

    #[error("Dispatch of {requested} work groups exceeds the device limit of {limit}")]
    DispatchTooLarge { requested: u32, limit: u32 },

    #[error("Dispatch state cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: DispatchState, to: DispatchState },

    #[error(transparent)]
    Visibility(#[from] VisibilityError),
}

impl VulkanError {
    /// The `VkResult` reported by the failing call, if the error came from one.
    pub fn result_code(&self) -> Option<vk::Result> {
        match self {
            Self::DeviceEnumeration(r)
            | Self::InstanceCreation(r)
            | Self::DebugMessengerCreation(r)
            | Self::DeviceCreation(r)
            | Self::ShaderCreation(r)
            | Self::DescriptorSetLayoutCreation(r)
            | Self::DescriptorPoolCreation(r)
            | Self::DescriptorAllocation(r)
            | Self::PipelineLayoutCreation(r)
            | Self::PipelineCreation(r)
            | Self::BufferCreation(r)
            | Self::MemoryBind(r)
            | Self::MemoryMap(r)
            | Self::MemoryFlush(r)
            | Self::MemoryInvalidate(r)
            | Self::CommandPoolCreation(r)
            | Self::CommandBufferAllocation(r)
            | Self::CommandBufferRecording(r)
            | Self::FenceCreation(r)
            | Self::FenceReset(r)
            | Self::QueueSubmit(r)
            | Self::FenceWait(r)
            | Self::QueueWaitIdle(r) => Some(*r),
            Self::MemoryAllocation { result, .. } => Some(*result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_is_exposed() {
        let err = VulkanError::QueueSubmit(vk::Result::ERROR_DEVICE_LOST);
        assert_eq!(err.result_code(), Some(vk::Result::ERROR_DEVICE_LOST));

        let err = VulkanError::MemoryAllocation {
            size: 128,
            result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        };
        assert_eq!(err.result_code(), Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        assert!(err.to_string().contains("128 bytes"));
    }

    #[test]
    fn contract_errors_have_no_result_code() {
        assert_eq!(VulkanError::NoDevice.result_code(), None);
        assert_eq!(
            VulkanError::SizeMismatch { src: 4, dst: 8 }.result_code(),
            None
        );
    }

    #[test]
    fn messages_name_the_operation() {
        let err = VulkanError::FenceWait(vk::Result::TIMEOUT);
        assert!(err.to_string().starts_with("Fence wait failed"));
        let err = VulkanError::HostBufferTooSmall { host: 4, block: 16 };
        assert_eq!(
            err.to_string(),
            "Host buffer holds 4 bytes but the block is 16 bytes"
        );
    }
}
