//! Host-side element buffers for a dispatch.
//!
//! A [`Workload`] owns the input data for every slot the configured program
//! binds, plus the index of the slot whose contents are read back.

use rand::Rng;

use crate::config::ShaderVariant;

/// Typed host data for one storage buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum HostBuffer {
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl HostBuffer {
    /// A zero-filled buffer of the same element type and length.
    pub fn zeroed_like(&self) -> Self {
        match self {
            Self::U32(v) => Self::U32(vec![0; v.len()]),
            Self::F32(v) => Self::F32(vec![0.0; v.len()]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the element data in bytes.
    pub fn byte_len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U32(v) => bytemuck::cast_slice(v),
            Self::F32(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::U32(v) => bytemuck::cast_slice_mut(v),
            Self::F32(v) => bytemuck::cast_slice_mut(v),
        }
    }
}

/// `0, 1, .., n - 1` as `u32`.
pub fn sequential_u32(n: u32) -> Vec<u32> {
    (0..n).collect()
}

/// `n` values drawn uniformly from `[1.0, 10.0)`.
pub fn random_f32<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(1.0f32..10.0)).collect()
}

/// Input buffers for one dispatch of a [`ShaderVariant`].
#[derive(Clone, Debug)]
pub struct Workload {
    pub variant: ShaderVariant,
    /// One entry per binding slot, in slot order.
    pub inputs: Vec<HostBuffer>,
    /// Slot whose device contents are copied back after the dispatch.
    pub readback_slot: usize,
}

impl Workload {
    /// Build the input data for `variant` with `element_count` elements per buffer.
    pub fn generate<R: Rng + ?Sized>(variant: ShaderVariant, element_count: u32, rng: &mut R) -> Self {
        match variant {
            ShaderVariant::Identity => Self {
                variant,
                inputs: vec![HostBuffer::U32(sequential_u32(element_count))],
                readback_slot: 0,
            },
            ShaderVariant::Combine => Self {
                variant,
                inputs: vec![
                    HostBuffer::F32(random_f32(element_count, rng)),
                    HostBuffer::F32(random_f32(element_count, rng)),
                ],
                readback_slot: 1,
            },
        }
    }

    /// Elements per buffer (all slots share one length).
    pub fn element_count(&self) -> u32 {
        self.inputs.first().map_or(0, |b| b.len() as u32)
    }

    /// Bytes per buffer.
    pub fn buffer_size(&self) -> u64 {
        self.inputs.first().map_or(0, HostBuffer::byte_len)
    }

    /// A zeroed destination for the readback slot.
    pub fn output_buffer(&self) -> HostBuffer {
        self.inputs[self.readback_slot].zeroed_like()
    }
}
