//! Compute pipeline construction over a fixed set of storage buffers.
//!
//! # Architecture
//!
//! - [`BindingDescriptor`]: the ordered `(block, slot, role)` list a program
//!   is bound to. Every block must be device-local.
//! - [`ComputePipeline`]: owns the set layouts, descriptor pool and sets,
//!   pipeline layout and pipeline. Immutable once built; rebuilding means
//!   dropping it and building again.
//!
//! Each slot gets its own descriptor set with a single storage buffer at
//! binding 0, so a program addresses slot `i` as `set = i, binding = 0`.

use ash::vk;
use tracing::debug;

use super::context::DeviceContext;
use super::error::VulkanError;
use super::memory::{MemoryBlock, MemoryKind};
use super::shader::{ShaderModule, ENTRY_POINT};

/// How the program uses a bound buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingRole {
    Input,
    Output,
    InputOutput,
}

impl BindingRole {
    /// The program reads host-provided data from this buffer.
    pub fn reads(self) -> bool {
        matches!(self, Self::Input | Self::InputOutput)
    }

    /// The program writes results the host reads back.
    pub fn writes(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// One device-local block bound at a slot.
#[derive(Copy, Clone)]
pub struct Binding<'a> {
    pub block: &'a MemoryBlock<'a>,
    pub slot: u32,
    pub role: BindingRole,
}

/// The blocks a pipeline binds, in any order; slots must cover `0..N` exactly.
#[derive(Default)]
pub struct BindingDescriptor<'a> {
    bindings: Vec<Binding<'a>>,
}

impl<'a> BindingDescriptor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `block` at `slot`.
    pub fn bind(mut self, block: &'a MemoryBlock<'a>, slot: u32, role: BindingRole) -> Self {
        self.bindings.push(Binding { block, slot, role });
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Check block kinds and slots, returning the bindings in slot order.
    fn into_ordered(self) -> Result<Vec<Binding<'a>>, VulkanError> {
        for binding in &self.bindings {
            binding.block.expect_kind(MemoryKind::DeviceLocal)?;
        }
        let slots: Vec<u32> = self.bindings.iter().map(|b| b.slot).collect();
        let order = slot_order(&slots).map_err(VulkanError::InvalidBindings)?;
        Ok(order.into_iter().map(|i| self.bindings[i]).collect())
    }
}

/// Indices of `slots` sorted by slot, provided the slots are exactly `0..N`.
pub fn slot_order(slots: &[u32]) -> Result<Vec<usize>, String> {
    if slots.is_empty() {
        return Err("at least one binding is required".into());
    }
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|&i| slots[i]);
    for (expected, &i) in order.iter().enumerate() {
        let slot = slots[i] as usize;
        if slot < expected {
            return Err(format!("slot {slot} is bound more than once"));
        }
        if slot > expected {
            return Err(format!("slot {expected} is not bound; slots must be contiguous from 0"));
        }
    }
    Ok(order)
}

/// Specialization constants passed to the program at pipeline build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpecializationConstants {
    /// Elements per buffer; also the dispatch width.
    pub element_count: u32,
}

impl SpecializationConstants {
    /// `constant_id` of the element count in every program.
    pub const ELEMENT_COUNT_ID: u32 = 0;

    pub fn map_entries(&self) -> [vk::SpecializationMapEntry; 1] {
        [vk::SpecializationMapEntry::default()
            .constant_id(Self::ELEMENT_COUNT_ID)
            .offset(0)
            .size(std::mem::size_of::<u32>())]
    }

    pub fn data(&self) -> [u8; 4] {
        self.element_count.to_ne_bytes()
    }
}

/// A compute pipeline bound to specific device-local blocks.
///
/// Borrows the context and every bound block, so none of them can be released
/// while the pipeline exists. Destruction order: pipeline, pipeline layout,
/// descriptor pool (and its sets), set layouts.
pub struct ComputePipeline<'a> {
    ctx: &'a DeviceContext,
    bindings: Vec<Binding<'a>>,
    roles: Vec<BindingRole>,
    set_layouts: Vec<vk::DescriptorSetLayout>,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets: Vec<vk::DescriptorSet>,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    element_count: u32,
    name: String,
}

impl<'a> ComputePipeline<'a> {
    /// Build the pipeline for `program` over `descriptor`.
    ///
    /// On failure every object created so far is destroyed.
    pub fn build(
        ctx: &'a DeviceContext,
        descriptor: BindingDescriptor<'a>,
        program: &ShaderModule<'_>,
        specialization: SpecializationConstants,
    ) -> Result<Self, VulkanError> {
        let bindings = descriptor.into_ordered()?;
        let roles = bindings.iter().map(|b| b.role).collect();

        let mut pipeline = Self {
            ctx,
            set_layouts: Vec::with_capacity(bindings.len()),
            bindings,
            roles,
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_sets: Vec::new(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            element_count: specialization.element_count,
            name: program.name().to_string(),
        };

        pipeline.create_set_layouts()?;
        pipeline.create_descriptor_pool()?;
        pipeline.allocate_descriptor_sets()?;
        pipeline.write_descriptor_sets();
        pipeline.create_pipeline_layout()?;
        pipeline.create_pipeline(program, &specialization)?;

        debug!(
            name = %pipeline.name,
            bindings = pipeline.bindings.len(),
            element_count = pipeline.element_count,
            "Created compute pipeline"
        );

        Ok(pipeline)
    }

    /// One layout per slot, each with a single compute-visible storage buffer.
    fn create_set_layouts(&mut self) -> Result<(), VulkanError> {
        let layout_bindings = [vk::DescriptorSetLayoutBinding::default()
            .binding(0)
            .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::COMPUTE)];
        let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings);

        for _ in 0..self.bindings.len() {
            let layout = unsafe {
                // SAFETY: Device is valid, layout_info is fully initialized.
                self.ctx
                    .device()
                    .create_descriptor_set_layout(&layout_info, None)
                    .map_err(VulkanError::DescriptorSetLayoutCreation)?
            };
            self.set_layouts.push(layout);
        }
        Ok(())
    }

    /// A pool holding exactly one storage-buffer descriptor per slot.
    fn create_descriptor_pool(&mut self) -> Result<(), VulkanError> {
        let count = self.bindings.len() as u32;
        let pool_sizes = [vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::STORAGE_BUFFER)
            .descriptor_count(count)];
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(count);

        self.descriptor_pool = unsafe {
            // SAFETY: Device is valid, pool_info is fully initialized.
            self.ctx
                .device()
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::DescriptorPoolCreation)?
        };
        Ok(())
    }

    fn allocate_descriptor_sets(&mut self) -> Result<(), VulkanError> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&self.set_layouts);

        self.descriptor_sets = unsafe {
            // SAFETY: The pool was sized for exactly these layouts.
            self.ctx
                .device()
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::DescriptorAllocation)?
        };
        Ok(())
    }

    /// Point binding 0 of set `i` at slot `i`'s block, full extent.
    fn write_descriptor_sets(&self) {
        let buffer_infos: Vec<[vk::DescriptorBufferInfo; 1]> = self
            .bindings
            .iter()
            .map(|b| {
                [vk::DescriptorBufferInfo::default()
                    .buffer(b.block.buffer())
                    .offset(0)
                    .range(b.block.size())]
            })
            .collect();

        let writes: Vec<vk::WriteDescriptorSet> = self
            .descriptor_sets
            .iter()
            .zip(&buffer_infos)
            .map(|(&set, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(0)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(info)
            })
            .collect();

        unsafe {
            // SAFETY: Every set was allocated from our pool and every buffer
            // is a live device-local storage buffer.
            self.ctx.device().update_descriptor_sets(&writes, &[]);
        }
    }

    /// Set layouts in slot order: set index == slot.
    fn create_pipeline_layout(&mut self) -> Result<(), VulkanError> {
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&self.set_layouts);

        self.pipeline_layout = unsafe {
            // SAFETY: Device is valid and every set layout is live.
            self.ctx
                .device()
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::PipelineLayoutCreation)?
        };
        Ok(())
    }

    fn create_pipeline(
        &mut self,
        program: &ShaderModule<'_>,
        specialization: &SpecializationConstants,
    ) -> Result<(), VulkanError> {
        let map_entries = specialization.map_entries();
        let data = specialization.data();
        let specialization_info = vk::SpecializationInfo::default()
            .map_entries(&map_entries)
            .data(&data);

        let stage_info = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(program.module())
            .name(ENTRY_POINT)
            .specialization_info(&specialization_info);

        let pipeline_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage_info)
            .layout(self.pipeline_layout);

        let pipelines = unsafe {
            // SAFETY: The shader module and pipeline layout are live; the
            // specialization data outlives this call.
            self.ctx
                .device()
                .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_pipelines, err)| VulkanError::PipelineCreation(err))?
        };

        self.pipeline = pipelines
            .first()
            .copied()
            .ok_or(VulkanError::PipelineCreation(vk::Result::ERROR_UNKNOWN))?;
        Ok(())
    }

    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Descriptor sets in slot order.
    #[inline]
    pub fn descriptor_sets(&self) -> &[vk::DescriptorSet] {
        &self.descriptor_sets
    }

    /// Binding roles in slot order.
    #[inline]
    pub fn roles(&self) -> &[BindingRole] {
        &self.roles
    }

    #[inline]
    pub fn bindings(&self) -> &[Binding<'a>] {
        &self.bindings
    }

    /// Buffer bound at `slot`.
    pub fn binding_buffer(&self, slot: usize) -> Option<vk::Buffer> {
        self.bindings.get(slot).map(|b| b.block.buffer())
    }

    #[inline]
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn context(&self) -> &'a DeviceContext {
        self.ctx
    }
}

impl Drop for ComputePipeline<'_> {
    fn drop(&mut self) {
        let device = self.ctx.device();
        unsafe {
            // SAFETY: We own these objects and no submission using them is
            // pending (every dispatch waits for completion). Null handles
            // come from a build that stopped early and are skipped.
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
            if self.descriptor_pool != vk::DescriptorPool::null() {
                device.destroy_descriptor_pool(self.descriptor_pool, None);
            }
            for &layout in &self.set_layouts {
                device.destroy_descriptor_set_layout(layout, None);
            }
        }
        debug!(name = %self.name, "Destroyed compute pipeline");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_read_and_write() {
        assert!(BindingRole::Input.reads());
        assert!(!BindingRole::Input.writes());
        assert!(!BindingRole::Output.reads());
        assert!(BindingRole::Output.writes());
        assert!(BindingRole::InputOutput.reads());
        assert!(BindingRole::InputOutput.writes());
    }

    #[test]
    fn slots_are_ordered() {
        assert_eq!(slot_order(&[0]).unwrap(), vec![0]);
        assert_eq!(slot_order(&[1, 0]).unwrap(), vec![1, 0]);
        assert_eq!(slot_order(&[2, 0, 1]).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn empty_bindings_rejected() {
        assert!(slot_order(&[]).is_err());
    }

    #[test]
    fn duplicate_slot_rejected() {
        let err = slot_order(&[0, 1, 1]).unwrap_err();
        assert!(err.contains("slot 1 is bound more than once"), "{err}");
    }

    #[test]
    fn gap_in_slots_rejected() {
        let err = slot_order(&[0, 2]).unwrap_err();
        assert!(err.contains("slot 1 is not bound"), "{err}");
        let err = slot_order(&[1]).unwrap_err();
        assert!(err.contains("slot 0 is not bound"), "{err}");
    }

    #[test]
    fn specialization_layout() {
        let spec = SpecializationConstants { element_count: 32 };
        let [entry] = spec.map_entries();
        assert_eq!(entry.constant_id, 0);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.size, 4);
        assert_eq!(spec.data(), 32u32.to_ne_bytes());
    }

    #[test]
    fn empty_descriptor() {
        let descriptor = BindingDescriptor::new();
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.len(), 0);
        assert!(matches!(
            descriptor.into_ordered(),
            Err(VulkanError::InvalidBindings(_))
        ));
    }
}
