//! End-to-end tests against a real Vulkan device.
//!
//! These exercise the full path from context creation through staging,
//! pipeline construction, dispatch and readback. Every test needs a
//! compute-capable Vulkan device, so they are marked `#[ignore]`:
//!
//! ```bash
//! cargo test -p hc-gpu-hal --test vulkan_dispatch -- --ignored
//! ```
//!
//! Tests that load a compute program skip themselves when glslc was not
//! available at build time.

use hc_common::{HostBuffer, ShaderVariant, Workload};
use hc_gpu_hal::kernels;
use hc_gpu_hal::vulkan::{
    stage, BindingDescriptor, BindingRole, BlockPair, ComputePipeline, ContextOptions, DeviceContext,
    DispatchEngine, DispatchState, MemoryBlock, MemoryKind, ShaderModule, SpecializationConstants,
    VulkanError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context() -> DeviceContext {
    init_tracing();
    DeviceContext::new(&ContextOptions::default()).expect("no usable Vulkan device")
}

fn program<'a>(ctx: &'a DeviceContext, name: &str) -> Option<ShaderModule<'a>> {
    let Some(path) = kernels::spirv_path(name) else {
        eprintln!("skipping: {name}.spv was not compiled");
        return None;
    };
    Some(ShaderModule::from_spirv_file(ctx, &path).expect("failed to load compiled program"))
}

// ---------------------------------------------------------------------------
// Memory and transfer
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn round_trip_preserves_bytes() {
    let ctx = context();
    for elements in [1u32, 7, 64, 1024] {
        let data: Vec<u32> = (0..elements).map(|i| i.wrapping_mul(2_654_435_761)).collect();
        let bytes: &[u8] = bytemuck::cast_slice(&data);

        let pair = BlockPair::allocate(&ctx, bytes.len() as u64).unwrap();
        pair.upload(bytes).unwrap();

        let mut back = vec![0u32; data.len()];
        pair.download(bytemuck::cast_slice_mut(&mut back)).unwrap();
        assert_eq!(back, data, "round trip of {elements} elements");
        pair.release();
    }
}

#[test]
#[ignore]
fn memory_type_choice_is_deterministic() {
    let ctx = context();
    for kind in [MemoryKind::HostVisible, MemoryKind::DeviceLocal] {
        let a = MemoryBlock::allocate(&ctx, kind, 256).unwrap();
        let b = MemoryBlock::allocate(&ctx, kind, 256).unwrap();
        assert_eq!(a.memory_type_index(), b.memory_type_index(), "{kind:?}");
        assert_eq!(a.kind(), kind);
    }
}

#[test]
#[ignore]
fn stage_rejects_size_mismatch() {
    let ctx = context();
    let small = MemoryBlock::allocate(&ctx, MemoryKind::HostVisible, 64).unwrap();
    let large = MemoryBlock::allocate(&ctx, MemoryKind::DeviceLocal, 128).unwrap();
    assert!(matches!(
        stage(&ctx, &small, &large),
        Err(VulkanError::SizeMismatch { src: 64, dst: 128 })
    ));
}

#[test]
#[ignore]
fn zero_sized_blocks_are_rejected() {
    let ctx = context();
    for kind in [MemoryKind::HostVisible, MemoryKind::DeviceLocal] {
        assert!(matches!(
            MemoryBlock::allocate(&ctx, kind, 0),
            Err(VulkanError::ZeroSizedBlock)
        ));
    }
    assert!(matches!(BlockPair::allocate(&ctx, 0), Err(VulkanError::ZeroSizedBlock)));
}

#[test]
#[ignore]
fn host_copy_needs_a_host_visible_block() {
    let ctx = context();
    let device = MemoryBlock::allocate(&ctx, MemoryKind::DeviceLocal, 64).unwrap();
    let err = hc_gpu_hal::vulkan::bridge::write_block(&device, &[0u8; 64]).unwrap_err();
    assert!(matches!(err, VulkanError::WrongMemoryKind { .. }));
}

#[test]
#[ignore]
fn host_copy_rejects_short_host_buffer() {
    let ctx = context();
    let host = MemoryBlock::allocate(&ctx, MemoryKind::HostVisible, 64).unwrap();
    let err = hc_gpu_hal::vulkan::bridge::write_block(&host, &[0u8; 16]).unwrap_err();
    assert!(matches!(err, VulkanError::HostBufferTooSmall { host: 16, block: 64 }));
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn identity_program_returns_its_input() {
    let ctx = context();
    let Some(program) = program(&ctx, "headless") else {
        return;
    };
    let workload = Workload::generate(ShaderVariant::Identity, 32, &mut StdRng::seed_from_u64(1));
    let pair = BlockPair::allocate(&ctx, workload.buffer_size()).unwrap();
    pair.upload(workload.inputs[0].as_bytes()).unwrap();

    let pipeline = ComputePipeline::build(
        &ctx,
        BindingDescriptor::new().bind(&pair.device, 0, BindingRole::InputOutput),
        &program,
        SpecializationConstants { element_count: 32 },
    )
    .unwrap();

    let mut engine = DispatchEngine::new(&ctx).unwrap();
    engine.dispatch(&pipeline).unwrap();
    assert_eq!(engine.state(), DispatchState::Complete);

    let mut output = workload.output_buffer();
    pair.download(output.as_bytes_mut()).unwrap();
    assert_eq!(output, HostBuffer::U32((0..32).collect()));
}

#[test]
#[ignore]
fn combine_program_sums_into_second_slot() {
    init_tracing();
    // Falls back to an unvalidated context when the layer is not installed.
    let ctx = DeviceContext::new(&ContextOptions {
        validation: true,
        ..ContextOptions::default()
    })
    .expect("no usable Vulkan device");
    let Some(program) = program(&ctx, "combine") else {
        return;
    };

    let workload = Workload::generate(ShaderVariant::Combine, 32, &mut StdRng::seed_from_u64(7));
    let pairs: Vec<BlockPair<'_>> = workload
        .inputs
        .iter()
        .map(|input| {
            let pair = BlockPair::allocate(&ctx, workload.buffer_size()).unwrap();
            pair.upload(input.as_bytes()).unwrap();
            pair
        })
        .collect();

    let pipeline = ComputePipeline::build(
        &ctx,
        BindingDescriptor::new()
            .bind(&pairs[0].device, 0, BindingRole::Input)
            .bind(&pairs[1].device, 1, BindingRole::InputOutput),
        &program,
        SpecializationConstants { element_count: 32 },
    )
    .unwrap();
    DispatchEngine::new(&ctx).unwrap().dispatch(&pipeline).unwrap();

    let mut output = workload.output_buffer();
    pairs[workload.readback_slot].download(output.as_bytes_mut()).unwrap();

    let (HostBuffer::F32(lhs), HostBuffer::F32(rhs), HostBuffer::F32(sum)) =
        (&workload.inputs[0], &workload.inputs[1], &output)
    else {
        panic!("combine workload is not f32");
    };
    assert_eq!(sum.len(), 32);
    for i in 0..32 {
        assert_eq!(sum[i], lhs[i] + rhs[i], "element {i}");
    }
    assert_eq!(ctx.validation_error_count(), 0);
}

#[test]
#[ignore]
fn bindings_in_any_order_map_to_their_slots() {
    let ctx = context();
    let Some(program) = program(&ctx, "combine") else {
        return;
    };
    let lhs: Vec<f32> = vec![1.0; 16];
    let rhs: Vec<f32> = vec![2.0; 16];
    let a = BlockPair::allocate(&ctx, 64).unwrap();
    let b = BlockPair::allocate(&ctx, 64).unwrap();
    a.upload(bytemuck::cast_slice(&lhs)).unwrap();
    b.upload(bytemuck::cast_slice(&rhs)).unwrap();

    // Slot 1 bound first.
    let pipeline = ComputePipeline::build(
        &ctx,
        BindingDescriptor::new()
            .bind(&b.device, 1, BindingRole::InputOutput)
            .bind(&a.device, 0, BindingRole::Input),
        &program,
        SpecializationConstants { element_count: 16 },
    )
    .unwrap();
    DispatchEngine::new(&ctx).unwrap().dispatch(&pipeline).unwrap();

    let mut out = vec![0f32; 16];
    b.download(bytemuck::cast_slice_mut(&mut out)).unwrap();
    assert!(out.iter().all(|&v| v == 3.0));
}

#[test]
#[ignore]
fn engine_reuses_its_fence_across_dispatches() {
    let ctx = context();
    let Some(program) = program(&ctx, "headless") else {
        return;
    };
    let data: Vec<u32> = (0..32).collect();
    let pair = BlockPair::allocate(&ctx, 128).unwrap();
    pair.upload(bytemuck::cast_slice(&data)).unwrap();

    let pipeline = ComputePipeline::build(
        &ctx,
        BindingDescriptor::new().bind(&pair.device, 0, BindingRole::InputOutput),
        &program,
        SpecializationConstants { element_count: 32 },
    )
    .unwrap();

    let mut engine = DispatchEngine::new(&ctx).unwrap();
    engine.dispatch(&pipeline).unwrap();
    engine.dispatch(&pipeline).unwrap();
    assert_eq!(engine.completed(), 2);
    assert_eq!(engine.state(), DispatchState::Complete);

    let mut back = vec![0u32; 32];
    pair.download(bytemuck::cast_slice_mut(&mut back)).unwrap();
    assert_eq!(back, data);
}

#[test]
#[ignore]
fn host_visible_blocks_cannot_be_bound() {
    let ctx = context();
    let Some(program) = program(&ctx, "headless") else {
        return;
    };
    let host = MemoryBlock::allocate(&ctx, MemoryKind::HostVisible, 128).unwrap();
    let result = ComputePipeline::build(
        &ctx,
        BindingDescriptor::new().bind(&host, 0, BindingRole::InputOutput),
        &program,
        SpecializationConstants { element_count: 32 },
    );
    assert!(matches!(result, Err(VulkanError::WrongMemoryKind { .. })));
}
