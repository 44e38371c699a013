//! Memory blocks: one buffer bound to one dedicated memory allocation.
//!
//! Two kinds of block:
//!
//! - **DeviceLocal**: storage buffer the compute program binds. Never mapped.
//! - **HostVisible**: transfer source/destination the host reads and writes
//!   through the copy bridge. Coherence is not assumed.
//!
//! The memory type is picked by a first-fit scan over the device's memory
//! types ([`find_memory_type`]).

use ash::vk;
use tracing::debug;

use super::context::DeviceContext;
use super::error::VulkanError;

/// What a block is used for. Usage and memory properties follow from it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    HostVisible,
    DeviceLocal,
}

impl MemoryKind {
    pub fn usage(self) -> vk::BufferUsageFlags {
        match self {
            Self::HostVisible => vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST,
            Self::DeviceLocal => {
                vk::BufferUsageFlags::STORAGE_BUFFER
                    | vk::BufferUsageFlags::TRANSFER_SRC
                    | vk::BufferUsageFlags::TRANSFER_DST
            }
        }
    }

    pub fn properties(self) -> vk::MemoryPropertyFlags {
        match self {
            Self::HostVisible => vk::MemoryPropertyFlags::HOST_VISIBLE,
            Self::DeviceLocal => vk::MemoryPropertyFlags::DEVICE_LOCAL,
        }
    }
}

/// First memory type (by index) allowed by `type_bits` whose flags contain
/// `required`.
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = (memory_properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
    memory_properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|&(i, ty)| type_bits & (1u32 << i) != 0 && ty.property_flags.contains(required))
        .map(|(i, _)| i as u32)
}

/// Vulkan buffers cannot be empty.
fn check_block_size(size: vk::DeviceSize) -> Result<(), VulkanError> {
    if size == 0 {
        return Err(VulkanError::ZeroSizedBlock);
    }
    Ok(())
}

/// A buffer and its dedicated memory, created and destroyed together.
///
/// The block borrows the [`DeviceContext`] it came from and cannot outlive it.
pub struct MemoryBlock<'a> {
    ctx: &'a DeviceContext,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    kind: MemoryKind,
    memory_type_index: u32,
}

impl<'a> MemoryBlock<'a> {
    /// Create a buffer of `size` bytes and bind freshly allocated memory to it.
    ///
    /// If allocation or binding fails, everything created so far is destroyed
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// [`VulkanError::ZeroSizedBlock`] for `size == 0`, before any Vulkan call.
    pub fn allocate(ctx: &'a DeviceContext, kind: MemoryKind, size: vk::DeviceSize) -> Result<Self, VulkanError> {
        check_block_size(size)?;
        let device = ctx.device();

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(kind.usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            // SAFETY: Device is valid, buffer_info is properly initialized.
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::BufferCreation)?
        };

        let requirements = unsafe {
            // SAFETY: Buffer was just created on this device.
            device.get_buffer_memory_requirements(buffer)
        };

        let destroy_buffer = || unsafe {
            // SAFETY: The buffer has no memory bound and is not in use.
            device.destroy_buffer(buffer, None);
        };

        let Some(memory_type_index) =
            find_memory_type(ctx.memory_properties(), requirements.memory_type_bits, kind.properties())
        else {
            destroy_buffer();
            return Err(VulkanError::NoSuitableMemoryType {
                type_bits: requirements.memory_type_bits,
                properties: kind.properties(),
            });
        };

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe {
            // SAFETY: The memory type index was taken from this device's table.
            device.allocate_memory(&alloc_info, None)
        } {
            Ok(memory) => memory,
            Err(result) => {
                destroy_buffer();
                return Err(VulkanError::MemoryAllocation {
                    size: requirements.size,
                    result,
                });
            }
        };

        if let Err(result) = unsafe {
            // SAFETY: The allocation is at least requirements.size bytes with a
            // type allowed by the buffer's requirements; offset 0 is aligned.
            device.bind_buffer_memory(buffer, memory, 0)
        } {
            unsafe {
                // SAFETY: Neither object is in use; the binding failed.
                device.free_memory(memory, None);
            }
            destroy_buffer();
            return Err(VulkanError::MemoryBind(result));
        }

        debug!(
            kind = ?kind,
            size = size,
            allocation_size = requirements.size,
            memory_type = memory_type_index,
            "Allocated memory block"
        );

        Ok(Self {
            ctx,
            buffer,
            memory,
            size,
            kind,
            memory_type_index,
        })
    }

    /// Destroy the buffer and free its memory now.
    pub fn release(self) {
        drop(self);
    }

    #[inline]
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Size in bytes requested at creation.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Index of the memory type the allocation came from.
    #[inline]
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    #[inline]
    pub fn context(&self) -> &'a DeviceContext {
        self.ctx
    }

    /// Fail unless this block is of `expected` kind.
    pub fn expect_kind(&self, expected: MemoryKind) -> Result<(), VulkanError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(VulkanError::WrongMemoryKind {
                expected,
                actual: self.kind,
            })
        }
    }
}

impl Drop for MemoryBlock<'_> {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: We own both objects. Every submission that used the buffer
            // was waited on before control returned to the owner.
            self.ctx.device().destroy_buffer(self.buffer, None);
            self.ctx.device().free_memory(self.memory, None);
        }
        debug!(kind = ?self.kind, size = self.size, "Released memory block");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (i, &f) in flags.iter().enumerate() {
            props.memory_types[i] = vk::MemoryType {
                property_flags: f,
                heap_index: 0,
            };
        }
        props
    }

    /// A discrete-GPU-like layout.
    fn discrete() -> vk::PhysicalDeviceMemoryProperties {
        table(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::HOST_VISIBLE
                | vk::MemoryPropertyFlags::HOST_COHERENT
                | vk::MemoryPropertyFlags::HOST_CACHED,
            vk::MemoryPropertyFlags::DEVICE_LOCAL
                | vk::MemoryPropertyFlags::HOST_VISIBLE
                | vk::MemoryPropertyFlags::HOST_COHERENT,
        ])
    }

    #[test]
    fn kind_usage_and_properties() {
        assert_eq!(
            MemoryKind::DeviceLocal.usage(),
            vk::BufferUsageFlags::STORAGE_BUFFER
                | vk::BufferUsageFlags::TRANSFER_SRC
                | vk::BufferUsageFlags::TRANSFER_DST
        );
        assert_eq!(MemoryKind::DeviceLocal.properties(), vk::MemoryPropertyFlags::DEVICE_LOCAL);
        assert_eq!(
            MemoryKind::HostVisible.usage(),
            vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST
        );
        assert_eq!(MemoryKind::HostVisible.properties(), vk::MemoryPropertyFlags::HOST_VISIBLE);
        assert!(!MemoryKind::HostVisible.usage().contains(vk::BufferUsageFlags::STORAGE_BUFFER));
    }

    #[test]
    fn first_fit_by_index() {
        let props = discrete();
        assert_eq!(
            find_memory_type(&props, 0b1111, MemoryKind::DeviceLocal.properties()),
            Some(0)
        );
        assert_eq!(
            find_memory_type(&props, 0b1111, MemoryKind::HostVisible.properties()),
            Some(1)
        );
    }

    #[test]
    fn type_bits_filter_candidates() {
        let props = discrete();
        assert_eq!(
            find_memory_type(&props, 0b1000, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Some(3)
        );
        assert_eq!(
            find_memory_type(&props, 0b1100, vk::MemoryPropertyFlags::HOST_VISIBLE),
            Some(2)
        );
    }

    #[test]
    fn superset_of_required_flags_matches() {
        let props = discrete();
        assert_eq!(
            find_memory_type(
                &props,
                u32::MAX,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED
            ),
            Some(2)
        );
    }

    #[test]
    fn no_match_is_none() {
        let props = discrete();
        assert_eq!(find_memory_type(&props, 0, vk::MemoryPropertyFlags::empty()), None);
        assert_eq!(
            find_memory_type(&props, u32::MAX, vk::MemoryPropertyFlags::PROTECTED),
            None
        );
    }

    #[test]
    fn types_beyond_count_are_ignored() {
        let mut props = table(&[vk::MemoryPropertyFlags::HOST_VISIBLE]);
        props.memory_types[1] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            heap_index: 0,
        };
        assert_eq!(find_memory_type(&props, u32::MAX, vk::MemoryPropertyFlags::DEVICE_LOCAL), None);
    }

    #[test]
    fn selection_is_deterministic() {
        let props = discrete();
        let picks: Vec<_> = (0..8)
            .map(|_| find_memory_type(&props, 0b0110, vk::MemoryPropertyFlags::HOST_VISIBLE))
            .collect();
        assert!(picks.iter().all(|&p| p == Some(1)));
    }

    #[test]
    fn empty_blocks_are_rejected() {
        assert!(matches!(check_block_size(0), Err(VulkanError::ZeroSizedBlock)));
        assert!(check_block_size(1).is_ok());
        assert!(check_block_size(4096).is_ok());
    }
}
