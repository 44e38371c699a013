//! Synchronous block-to-block copies on the compute queue, and the
//! host/device block pairs the harness moves data through.

use ash::vk;
use tracing::debug;

use super::bridge;
use super::context::DeviceContext;
use super::error::VulkanError;
use super::memory::{MemoryBlock, MemoryKind};
use super::queue::{submit_and_wait, CommandRecorder, OneShotCommandBuffer};

/// Copy the full extent of `src` into `dst` and wait for it to finish.
///
/// Records one copy into a one-shot command buffer, submits it with a fence
/// created for this call and waits without a timeout. The command buffer and
/// the fence are gone when this returns.
///
/// # Errors
///
/// [`VulkanError::SizeMismatch`] when the blocks differ in size.
pub fn stage(ctx: &DeviceContext, src: &MemoryBlock<'_>, dst: &MemoryBlock<'_>) -> Result<(), VulkanError> {
    if src.size() != dst.size() {
        return Err(VulkanError::SizeMismatch {
            src: src.size(),
            dst: dst.size(),
        });
    }

    let command_buffer = OneShotCommandBuffer::allocate(ctx)?;
    let recorder = CommandRecorder::begin(ctx.device(), command_buffer.handle())?;
    recorder.copy_buffer(src.buffer(), dst.buffer(), src.size());
    let recorded = recorder.finish()?;

    submit_and_wait(ctx, recorded)?;

    debug!(
        size = src.size(),
        from = ?src.kind(),
        to = ?dst.kind(),
        "Staged block copy"
    );
    Ok(())
}

/// A host-visible block and a device-local block of the same size.
///
/// The host block is the staging area for the device block in both directions.
pub struct BlockPair<'a> {
    pub host: MemoryBlock<'a>,
    pub device: MemoryBlock<'a>,
}

impl<'a> BlockPair<'a> {
    pub fn allocate(ctx: &'a DeviceContext, size: vk::DeviceSize) -> Result<Self, VulkanError> {
        let host = MemoryBlock::allocate(ctx, MemoryKind::HostVisible, size)?;
        let device = MemoryBlock::allocate(ctx, MemoryKind::DeviceLocal, size)?;
        Ok(Self { host, device })
    }

    /// Write `bytes` into the host block and stage them to the device block.
    pub fn upload(&self, bytes: &[u8]) -> Result<(), VulkanError> {
        bridge::write_block(&self.host, bytes)?;
        stage(self.host.context(), &self.host, &self.device)
    }

    /// Stage the device block back to the host block and read it into `bytes`.
    pub fn download(&self, bytes: &mut [u8]) -> Result<(), VulkanError> {
        stage(self.device.context(), &self.device, &self.host)?;
        bridge::read_block(&self.host, bytes)
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.device.size()
    }

    /// Release both blocks.
    pub fn release(self) {
        self.device.release();
        self.host.release();
    }
}
