//! Command buffers, fences and queue submission.
//!
//! # Key types
//!
//! - [`CommandPool`]: the context's pool for the compute queue family.
//! - [`Fence`]: completion signal for a single submission.
//! - [`CommandRecorder`]: records barriers, binds, dispatches and copies.
//! - [`OneShotCommandBuffer`]: a primary command buffer freed on drop.

use ash::vk;
use tracing::debug;

use super::barrier::BufferBarrier;
use super::context::DeviceContext;
use super::error::VulkanError;

/// A Vulkan command pool for the compute queue family.
///
/// Created with `RESET_COMMAND_BUFFER`, so individual command buffers can be
/// reset and re-recorded. Destroying the pool frees every buffer in it.
pub struct CommandPool {
    pool: vk::CommandPool,
    queue_family_index: u32,
    device: ash::Device,
}

impl CommandPool {
    pub fn new(device: &ash::Device, queue_family_index: u32) -> Result<Self, VulkanError> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe {
            // SAFETY: Device is valid, queue_family_index references the family
            // the device was created with.
            device
                .create_command_pool(&pool_info, None)
                .map_err(VulkanError::CommandPoolCreation)?
        };

        debug!(queue_family = queue_family_index, "Created command pool");

        Ok(Self {
            pool,
            queue_family_index,
            device: device.clone(),
        })
    }

    /// Allocate one primary command buffer from this pool.
    pub fn allocate_command_buffer(&self) -> Result<vk::CommandBuffer, VulkanError> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffers = unsafe {
            // SAFETY: Device and pool are valid; the caller holds the pool lock.
            self.device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::CommandBufferAllocation)?
        };

        buffers
            .first()
            .copied()
            .ok_or(VulkanError::CommandBufferAllocation(vk::Result::ERROR_UNKNOWN))
    }

    /// Return a command buffer to the pool. It must not be pending.
    pub fn free_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            // SAFETY: The buffer was allocated from this pool and its last
            // submission has completed; the caller holds the pool lock.
            self.device.free_command_buffers(self.pool, &[command_buffer]);
        }
    }

    #[inline]
    pub fn pool(&self) -> vk::CommandPool {
        self.pool
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: We own the command pool and the device is still alive.
            self.device.destroy_command_pool(self.pool, None);
        }
        debug!(queue_family = self.queue_family_index, "Destroyed command pool");
    }
}

/// Signalled by the queue when a submission finishes; destroyed on drop.
///
/// Starts unsignalled. A fence that is reused must be reset before it is
/// handed to the next submit.
pub struct Fence {
    fence: vk::Fence,
    device: ash::Device,
}

impl Fence {
    pub fn new(device: &ash::Device) -> Result<Self, VulkanError> {
        let fence = unsafe {
            // SAFETY: Plain unsignalled fence on a live device.
            device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(VulkanError::FenceCreation)?
        };

        Ok(Self {
            fence,
            device: device.clone(),
        })
    }

    /// Block until the fence is signalled or `timeout_ns` elapses.
    ///
    /// Dispatch and staging pass `u64::MAX`; a hung device blocks forever.
    pub fn wait(&self, timeout_ns: u64) -> Result<(), VulkanError> {
        let fences = [self.fence];
        unsafe {
            // SAFETY: The fence belongs to `self.device`.
            self.device
                .wait_for_fences(&fences, true, timeout_ns)
                .map_err(VulkanError::FenceWait)
        }
    }

    /// Return the fence to the unsignalled state.
    pub fn reset(&self) -> Result<(), VulkanError> {
        let fences = [self.fence];
        unsafe {
            // SAFETY: Not in use by a pending submission; every submit is
            // waited on before the fence is reset again.
            self.device.reset_fences(&fences).map_err(VulkanError::FenceReset)
        }
    }

    #[inline]
    pub fn fence(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: Owned fence, no submission pending on it.
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// A primary command buffer from the context pool, freed when dropped.
pub struct OneShotCommandBuffer<'a> {
    ctx: &'a DeviceContext,
    command_buffer: vk::CommandBuffer,
}

impl<'a> OneShotCommandBuffer<'a> {
    pub fn allocate(ctx: &'a DeviceContext) -> Result<Self, VulkanError> {
        let command_buffer = ctx.command_pool().allocate_command_buffer()?;
        Ok(Self { ctx, command_buffer })
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.command_buffer
    }
}

impl Drop for OneShotCommandBuffer<'_> {
    fn drop(&mut self) {
        self.ctx.command_pool().free_command_buffer(self.command_buffer);
    }
}

/// Records commands into a command buffer between `begin` and `finish`.
pub struct CommandRecorder<'a> {
    command_buffer: vk::CommandBuffer,
    device: &'a ash::Device,
}

impl<'a> CommandRecorder<'a> {
    /// Begin recording a one-time-submit command buffer.
    ///
    /// The buffer must be in the initial state (freshly allocated or reset).
    pub fn begin(device: &'a ash::Device, command_buffer: vk::CommandBuffer) -> Result<Self, VulkanError> {
        let begin_info =
            vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            // SAFETY: Device and command_buffer are valid and the buffer is
            // not recording or pending.
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::CommandBufferRecording)?;
        }

        Ok(Self {
            command_buffer,
            device,
        })
    }

    /// Record a whole-buffer memory barrier.
    pub fn buffer_barrier(&self, buffer: vk::Buffer, barrier: BufferBarrier) {
        let buffer_barriers = [barrier.to_vk(buffer)];

        unsafe {
            // SAFETY: Recording state; the buffer belongs to this device.
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                barrier.src_stage(),
                barrier.dst_stage(),
                vk::DependencyFlags::empty(),
                &[],
                &buffer_barriers,
                &[],
            );
        }
    }

    pub fn bind_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            // SAFETY: Recording state; pipeline is a valid compute pipeline.
            self.device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::COMPUTE, pipeline);
        }
    }

    /// Bind descriptor sets starting at set 0.
    pub fn bind_descriptor_sets(&self, pipeline_layout: vk::PipelineLayout, descriptor_sets: &[vk::DescriptorSet]) {
        unsafe {
            // SAFETY: Recording state; the sets match the layout's set layouts
            // in order.
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::COMPUTE,
                pipeline_layout,
                0,
                descriptor_sets,
                &[],
            );
        }
    }

    /// `(x, y, z)` work groups of the bound pipeline.
    pub fn dispatch(&self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        unsafe {
            // SAFETY: Recording state; a compute pipeline is bound.
            self.device
                .cmd_dispatch(self.command_buffer, group_count_x, group_count_y, group_count_z);
        }
    }

    /// Record a full-extent copy of `size` bytes from `src` to `dst`.
    pub fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) {
        let region = vk::BufferCopy::default().src_offset(0).dst_offset(0).size(size);

        unsafe {
            // SAFETY: Recording state; both buffers hold at least `size` bytes.
            self.device.cmd_copy_buffer(self.command_buffer, src, dst, &[region]);
        }
    }

    /// End recording. The returned handle is ready to submit.
    pub fn finish(self) -> Result<vk::CommandBuffer, VulkanError> {
        unsafe {
            // SAFETY: The command buffer is in the recording state.
            self.device
                .end_command_buffer(self.command_buffer)
                .map_err(VulkanError::CommandBufferRecording)?;
        }
        Ok(self.command_buffer)
    }
}

/// Submit a command buffer on the compute queue and block until it completes.
///
/// Uses a fence created for this call; there is no timeout.
pub fn submit_and_wait(ctx: &DeviceContext, command_buffer: vk::CommandBuffer) -> Result<(), VulkanError> {
    let fence = Fence::new(ctx.device())?;
    ctx.submit(command_buffer, fence.fence())?;
    fence.wait(u64::MAX)
}
