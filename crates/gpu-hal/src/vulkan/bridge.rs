//! Host/device copy bridge: the only place host bytes enter or leave a block.
//!
//! Blocks are mapped for the duration of one call. Reads invalidate the mapped
//! range first and writes flush it afterwards, so non-coherent memory types
//! behave correctly. The mapping is released by a guard on every path.

use std::ffi::c_void;

use ash::vk;
use tracing::debug;

use super::error::VulkanError;
use super::memory::{MemoryBlock, MemoryKind};

/// Direction of a bridge copy, relative to the block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopyDirection {
    IntoBlock,
    OutOfBlock,
}

/// Host side of a bridge copy. The slice must hold at least `block.size()` bytes.
#[derive(Debug)]
pub enum HostTransfer<'h> {
    IntoBlock(&'h [u8]),
    OutOfBlock(&'h mut [u8]),
}

impl HostTransfer<'_> {
    pub fn direction(&self) -> CopyDirection {
        match self {
            Self::IntoBlock(_) => CopyDirection::IntoBlock,
            Self::OutOfBlock(_) => CopyDirection::OutOfBlock,
        }
    }

    fn host_len(&self) -> usize {
        match self {
            Self::IntoBlock(src) => src.len(),
            Self::OutOfBlock(dst) => dst.len(),
        }
    }
}

/// Unmaps the memory when dropped.
struct MappedRegion<'b> {
    block: &'b MemoryBlock<'b>,
    ptr: *mut c_void,
}

impl<'b> MappedRegion<'b> {
    fn map(block: &'b MemoryBlock<'b>) -> Result<Self, VulkanError> {
        let ptr = unsafe {
            // SAFETY: The memory is host-visible, not currently mapped (only
            // this function maps it and the guard unmaps), and not in use by
            // the device.
            block
                .context()
                .device()
                .map_memory(block.memory(), 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::MemoryMap)?
        };
        Ok(Self { block, ptr })
    }

    fn whole_range(&self) -> vk::MappedMemoryRange<'static> {
        vk::MappedMemoryRange::default()
            .memory(self.block.memory())
            .offset(0)
            .size(vk::WHOLE_SIZE)
    }

    fn invalidate(&self) -> Result<(), VulkanError> {
        unsafe {
            // SAFETY: The range lies within the currently mapped memory.
            self.block
                .context()
                .device()
                .invalidate_mapped_memory_ranges(&[self.whole_range()])
                .map_err(VulkanError::MemoryInvalidate)
        }
    }

    fn flush(&self) -> Result<(), VulkanError> {
        unsafe {
            // SAFETY: The range lies within the currently mapped memory.
            self.block
                .context()
                .device()
                .flush_mapped_memory_ranges(&[self.whole_range()])
                .map_err(VulkanError::MemoryFlush)
        }
    }
}

impl Drop for MappedRegion<'_> {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: The memory was mapped by `MappedRegion::map`.
            self.block.context().device().unmap_memory(self.block.memory());
        }
    }
}

/// Copy exactly `block.size()` bytes between a host-visible block and host memory.
///
/// # Errors
///
/// [`VulkanError::WrongMemoryKind`] for a device-local block and
/// [`VulkanError::HostBufferTooSmall`] when the host slice is shorter than the block.
pub fn copy(block: &MemoryBlock<'_>, transfer: HostTransfer<'_>) -> Result<(), VulkanError> {
    block.expect_kind(MemoryKind::HostVisible)?;

    let len = usize::try_from(block.size()).map_err(|_| VulkanError::HostBufferTooSmall {
        host: transfer.host_len(),
        block: block.size(),
    })?;
    if transfer.host_len() < len {
        return Err(VulkanError::HostBufferTooSmall {
            host: transfer.host_len(),
            block: block.size(),
        });
    }

    let direction = transfer.direction();
    let region = MappedRegion::map(block)?;

    match transfer {
        HostTransfer::IntoBlock(src) => {
            unsafe {
                // SAFETY: The mapping covers the whole allocation, which is at
                // least `len` bytes; `src` holds at least `len` bytes.
                std::ptr::copy_nonoverlapping(src.as_ptr(), region.ptr.cast::<u8>(), len);
            }
            region.flush()?;
        }
        HostTransfer::OutOfBlock(dst) => {
            region.invalidate()?;
            unsafe {
                // SAFETY: As above, in the other direction.
                std::ptr::copy_nonoverlapping(region.ptr.cast::<u8>(), dst.as_mut_ptr(), len);
            }
        }
    }

    debug!(direction = ?direction, size = len, "Bridge copy complete");
    Ok(())
}

/// Write `bytes` into a host-visible block.
pub fn write_block(block: &MemoryBlock<'_>, bytes: &[u8]) -> Result<(), VulkanError> {
    copy(block, HostTransfer::IntoBlock(bytes))
}

/// Read a host-visible block into `bytes`.
pub fn read_block(block: &MemoryBlock<'_>, bytes: &mut [u8]) -> Result<(), VulkanError> {
    copy(block, HostTransfer::OutOfBlock(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_directions() {
        let src = [1u8, 2, 3];
        let mut dst = [0u8; 5];
        let into = HostTransfer::IntoBlock(&src);
        assert_eq!(into.direction(), CopyDirection::IntoBlock);
        assert_eq!(into.host_len(), 3);

        let out = HostTransfer::OutOfBlock(&mut dst);
        assert_eq!(out.direction(), CopyDirection::OutOfBlock);
        assert_eq!(out.host_len(), 5);
    }
}
