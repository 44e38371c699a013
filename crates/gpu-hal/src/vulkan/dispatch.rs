//! Barrier-guarded dispatch with a single in-flight submission.
//!
//! A [`DispatchEngine`] owns one command buffer and one fence and moves
//! through `Idle -> Recording -> Submitted -> Complete` on every dispatch.
//! `dispatch` takes `&mut self`, so a second dispatch on the same engine
//! cannot start until the first has returned.

use ash::vk;
use tracing::{debug, warn};

use super::barrier::{Command, CommandPlan, VisibilityError, VisibilityTracker};
use super::context::DeviceContext;
use super::error::VulkanError;
use super::pipeline::ComputePipeline;
use super::queue::{CommandRecorder, Fence};

/// Lifecycle of the engine's command buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Recording,
    Submitted,
    Complete,
}

impl DispatchState {
    /// Whether `self -> next` is a legal step. A completed engine may start
    /// recording its next dispatch.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Complete, Self::Recording)
                | (Self::Recording, Self::Submitted)
                | (Self::Submitted, Self::Complete)
        )
    }

    /// Step to `next`, or report the illegal transition.
    pub fn advance(self, next: Self) -> Result<Self, VulkanError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(VulkanError::InvalidTransition { from: self, to: next })
        }
    }
}

/// Records, submits and waits for compute dispatches.
pub struct DispatchEngine<'a> {
    ctx: &'a DeviceContext,
    command_buffer: vk::CommandBuffer,
    /// Reused across dispatches; reset immediately before each submit.
    fence: Fence,
    state: DispatchState,
    completed: u64,
}

impl<'a> DispatchEngine<'a> {
    pub fn new(ctx: &'a DeviceContext) -> Result<Self, VulkanError> {
        let command_buffer = ctx.command_pool().allocate_command_buffer()?;
        let fence = match Fence::new(ctx.device()) {
            Ok(fence) => fence,
            Err(e) => {
                ctx.command_pool().free_command_buffer(command_buffer);
                return Err(e);
            }
        };

        Ok(Self {
            ctx,
            command_buffer,
            fence,
            state: DispatchState::Idle,
            completed: 0,
        })
    }

    #[inline]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Number of dispatches that ran to completion.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Run `pipeline` once over its bound blocks and wait for it to finish.
    ///
    /// Records, in order: a host-write barrier on every binding the program
    /// reads, pipeline and descriptor-set binds, a `(element_count, 1, 1)`
    /// dispatch, and a transfer-read barrier on every binding it writes. Then
    /// resets the fence, submits, waits on the fence without a timeout and
    /// waits for the queue to go idle.
    pub fn dispatch(&mut self, pipeline: &ComputePipeline<'_>) -> Result<(), VulkanError> {
        let limit = self.ctx.properties().limits.max_compute_work_group_count[0];
        if pipeline.element_count() > limit {
            return Err(VulkanError::DispatchTooLarge {
                requested: pipeline.element_count(),
                limit,
            });
        }

        let plan = CommandPlan::for_dispatch(pipeline.roles(), pipeline.element_count());
        VisibilityTracker::new(pipeline.roles()).check(&plan)?;

        self.state = self.state.advance(DispatchState::Recording)?;
        let submitted = self.record(&plan, pipeline).and_then(|()| {
            self.fence.reset()?;
            self.ctx.submit(self.command_buffer, self.fence.fence())
        });
        if let Err(e) = submitted {
            self.state = DispatchState::Idle;
            return Err(e);
        }
        self.state = self.state.advance(DispatchState::Submitted)?;

        self.fence.wait(u64::MAX)?;
        self.ctx.queue_wait_idle()?;
        self.state = self.state.advance(DispatchState::Complete)?;
        self.completed += 1;

        debug!(
            pipeline = pipeline.name(),
            element_count = pipeline.element_count(),
            completed = self.completed,
            "Dispatch complete"
        );
        Ok(())
    }

    /// Replay a checked plan into the engine's command buffer.
    fn record(&self, plan: &CommandPlan, pipeline: &ComputePipeline<'_>) -> Result<(), VulkanError> {
        let device = self.ctx.device();
        unsafe {
            // SAFETY: The buffer is not pending: the previous dispatch, if
            // any, was waited on before `dispatch` returned.
            device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::CommandBufferRecording)?;
        }

        let recorder = CommandRecorder::begin(device, self.command_buffer)?;
        for command in plan.commands() {
            match *command {
                Command::Barrier { slot, barrier } => {
                    let buffer = pipeline
                        .binding_buffer(slot)
                        .ok_or(VisibilityError::UnknownSlot(slot))?;
                    recorder.buffer_barrier(buffer, barrier);
                }
                Command::BindPipeline => recorder.bind_pipeline(pipeline.pipeline()),
                Command::BindDescriptorSets => {
                    recorder.bind_descriptor_sets(pipeline.pipeline_layout(), pipeline.descriptor_sets())
                }
                Command::Dispatch { x, y, z } => recorder.dispatch(x, y, z),
            }
        }
        recorder.finish()?;
        Ok(())
    }
}

/// Whether an engine in `state` may return its command buffer to the pool.
///
/// A submitted buffer is only released once `wait` confirms completion. If the
/// wait fails the buffer stays allocated and goes away with the pool.
fn can_free_after_wait(state: DispatchState, wait: impl FnOnce() -> Result<(), VulkanError>) -> bool {
    if state != DispatchState::Submitted {
        return true;
    }
    match wait() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Dispatch still pending at teardown, leaving its command buffer to the pool");
            false
        }
    }
}

impl Drop for DispatchEngine<'_> {
    fn drop(&mut self) {
        let fence = &self.fence;
        if can_free_after_wait(self.state, || fence.wait(u64::MAX)) {
            self.ctx.command_pool().free_command_buffer(self.command_buffer);
        }
        debug!(completed = self.completed, "Dispatch engine released");
    }
}
