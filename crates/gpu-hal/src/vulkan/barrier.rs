//! Host/device visibility model for a dispatch.
//!
//! A dispatch is first expressed as a [`CommandPlan`], a plain list of
//! [`Command`]s, and checked by a [`VisibilityTracker`] before anything is
//! recorded. The tracker follows the last access to each binding and rejects
//! plans where a shader read is not preceded by a host-write barrier or where
//! a shader write is left without a transfer-read barrier.

use ash::vk;
use thiserror::Error;

use super::pipeline::BindingRole;

/// A memory access the harness orders with barriers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    HostWrite,
    ShaderRead,
    ShaderWrite,
    TransferRead,
}

impl Access {
    pub fn flags(self) -> vk::AccessFlags {
        match self {
            Self::HostWrite => vk::AccessFlags::HOST_WRITE,
            Self::ShaderRead => vk::AccessFlags::SHADER_READ,
            Self::ShaderWrite => vk::AccessFlags::SHADER_WRITE,
            Self::TransferRead => vk::AccessFlags::TRANSFER_READ,
        }
    }

    pub fn stage(self) -> vk::PipelineStageFlags {
        match self {
            Self::HostWrite => vk::PipelineStageFlags::HOST,
            Self::ShaderRead | Self::ShaderWrite => vk::PipelineStageFlags::COMPUTE_SHADER,
            Self::TransferRead => vk::PipelineStageFlags::TRANSFER,
        }
    }
}

/// A whole-buffer execution and memory dependency from `src` to `dst`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferBarrier {
    pub src: Access,
    pub dst: Access,
}

impl BufferBarrier {
    /// Makes host writes visible to the compute shader.
    pub const HOST_TO_SHADER: Self = Self {
        src: Access::HostWrite,
        dst: Access::ShaderRead,
    };

    /// Makes shader writes visible to a following transfer.
    pub const SHADER_TO_TRANSFER: Self = Self {
        src: Access::ShaderWrite,
        dst: Access::TransferRead,
    };

    pub fn src_stage(self) -> vk::PipelineStageFlags {
        self.src.stage()
    }

    pub fn dst_stage(self) -> vk::PipelineStageFlags {
        self.dst.stage()
    }

    /// The `VkBufferMemoryBarrier` covering all of `buffer`, no ownership transfer.
    pub fn to_vk(self, buffer: vk::Buffer) -> vk::BufferMemoryBarrier<'static> {
        vk::BufferMemoryBarrier::default()
            .src_access_mask(self.src.flags())
            .dst_access_mask(self.dst.flags())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .buffer(buffer)
            .offset(0)
            .size(vk::WHOLE_SIZE)
    }
}

/// One step of a dispatch command buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Barrier { slot: usize, barrier: BufferBarrier },
    BindPipeline,
    BindDescriptorSets,
    Dispatch { x: u32, y: u32, z: u32 },
}

/// An ordered list of commands for one dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandPlan {
    commands: Vec<Command>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard sequence: host-write barriers on every binding the
    /// program reads, bind, dispatch `(element_count, 1, 1)`, then
    /// transfer-read barriers on every binding it writes.
    pub fn for_dispatch(roles: &[BindingRole], element_count: u32) -> Self {
        let mut plan = Self::new();
        for (slot, role) in roles.iter().enumerate() {
            if role.reads() {
                plan.push(Command::Barrier {
                    slot,
                    barrier: BufferBarrier::HOST_TO_SHADER,
                });
            }
        }
        plan.push(Command::BindPipeline);
        plan.push(Command::BindDescriptorSets);
        plan.push(Command::Dispatch {
            x: element_count,
            y: 1,
            z: 1,
        });
        for (slot, role) in roles.iter().enumerate() {
            if role.writes() {
                plan.push(Command::Barrier {
                    slot,
                    barrier: BufferBarrier::SHADER_TO_TRANSFER,
                });
            }
        }
        plan
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Why a [`CommandPlan`] was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisibilityError {
    #[error("slot {slot}: expected {expected:?} to be visible, last access was {found:?}")]
    MissingBarrier {
        slot: usize,
        expected: Access,
        found: Access,
    },

    #[error("slot {slot}: barrier source {barrier:?} does not match last access {found:?}")]
    MismatchedBarrier {
        slot: usize,
        barrier: Access,
        found: Access,
    },

    #[error("barrier names slot {0}, which is not bound")]
    UnknownSlot(usize),

    #[error("dispatch recorded before the pipeline and descriptor sets were bound")]
    UnboundDispatch,

    #[error("plan contains no dispatch")]
    NoDispatch,
}

/// Tracks the last access to each binding while walking a plan.
#[derive(Debug)]
pub struct VisibilityTracker {
    roles: Vec<BindingRole>,
    last: Vec<Access>,
}

impl VisibilityTracker {
    /// Every binding starts out holding host-written data.
    pub fn new(roles: &[BindingRole]) -> Self {
        Self {
            roles: roles.to_vec(),
            last: vec![Access::HostWrite; roles.len()],
        }
    }

    /// Walk the whole plan and check the end state.
    pub fn check(mut self, plan: &CommandPlan) -> Result<(), VisibilityError> {
        let mut pipeline_bound = false;
        let mut sets_bound = false;
        let mut dispatched = false;

        for command in plan.commands() {
            match *command {
                Command::Barrier { slot, barrier } => self.apply_barrier(slot, barrier)?,
                Command::BindPipeline => pipeline_bound = true,
                Command::BindDescriptorSets => sets_bound = true,
                Command::Dispatch { .. } => {
                    if !(pipeline_bound && sets_bound) {
                        return Err(VisibilityError::UnboundDispatch);
                    }
                    self.apply_dispatch()?;
                    dispatched = true;
                }
            }
        }

        if !dispatched {
            return Err(VisibilityError::NoDispatch);
        }
        self.finish()
    }

    fn apply_barrier(&mut self, slot: usize, barrier: BufferBarrier) -> Result<(), VisibilityError> {
        let last = self.last.get_mut(slot).ok_or(VisibilityError::UnknownSlot(slot))?;
        if *last != barrier.src {
            return Err(VisibilityError::MismatchedBarrier {
                slot,
                barrier: barrier.src,
                found: *last,
            });
        }
        *last = barrier.dst;
        Ok(())
    }

    fn apply_dispatch(&mut self) -> Result<(), VisibilityError> {
        for (slot, (role, last)) in self.roles.iter().zip(self.last.iter_mut()).enumerate() {
            if role.reads() && *last != Access::ShaderRead {
                return Err(VisibilityError::MissingBarrier {
                    slot,
                    expected: Access::ShaderRead,
                    found: *last,
                });
            }
            if role.writes() {
                *last = Access::ShaderWrite;
            }
        }
        Ok(())
    }

    /// Every written binding must end ready for a transfer read.
    fn finish(&self) -> Result<(), VisibilityError> {
        for (slot, (role, last)) in self.roles.iter().zip(&self.last).enumerate() {
            if role.writes() && *last != Access::TransferRead {
                return Err(VisibilityError::MissingBarrier {
                    slot,
                    expected: Access::TransferRead,
                    found: *last,
                });
            }
        }
        Ok(())
    }
}
