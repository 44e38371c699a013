//! The end-to-end dispatch flow: upload, bind, dispatch, read back.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use hc_common::{HarnessConfig, HostBuffer, ShaderVariant, Workload};
use hc_gpu_hal::kernels;
use hc_gpu_hal::vulkan::{
    BindingDescriptor, BindingRole, BlockPair, ComputePipeline, ContextOptions, DeviceContext,
    DispatchEngine, ShaderModule, SpecializationConstants,
};
use tracing::{info, warn};

/// Host data before and after one dispatch.
pub struct Outcome {
    pub inputs: Vec<HostBuffer>,
    pub output: HostBuffer,
}

/// How each slot of `variant`'s program uses its buffer.
pub fn binding_roles(variant: ShaderVariant) -> &'static [BindingRole] {
    match variant {
        ShaderVariant::Identity => &[BindingRole::InputOutput],
        ShaderVariant::Combine => &[BindingRole::Input, BindingRole::InputOutput],
    }
}

/// Where to load the configured program from.
fn program_path(config: &HarnessConfig) -> Result<PathBuf> {
    match &config.shader_dir {
        Some(dir) => Ok(config.program_path(dir)),
        None => kernels::spirv_dir()
            .map(|dir| config.program_path(dir))
            .ok_or_else(|| anyhow!("no compiled programs available; pass --shader-dir")),
    }
}

/// Run the configured program once and return its input and readback data.
pub fn run(config: &HarnessConfig) -> Result<Outcome> {
    let options = ContextOptions {
        validation: config.validation.resolve(cfg!(debug_assertions)),
        ..ContextOptions::default()
    };
    let ctx = DeviceContext::new(&options).context("failed to create device context")?;

    let workload = Workload::generate(config.variant, config.element_count, &mut rand::thread_rng());
    let size = workload.buffer_size();
    info!(
        variant = %config.variant,
        elements = workload.element_count(),
        bytes = size,
        "Generated workload"
    );

    let mut pairs = Vec::with_capacity(workload.inputs.len());
    for (slot, input) in workload.inputs.iter().enumerate() {
        let pair = BlockPair::allocate(&ctx, size)
            .with_context(|| format!("failed to allocate buffers for slot {slot}"))?;
        pair.upload(input.as_bytes())
            .with_context(|| format!("failed to upload slot {slot}"))?;
        pairs.push(pair);
    }

    let path = program_path(config)?;
    let program = ShaderModule::from_spirv_file(&ctx, &path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let roles = binding_roles(config.variant);
    let descriptor = pairs
        .iter()
        .zip(roles)
        .enumerate()
        .fold(BindingDescriptor::new(), |descriptor, (slot, (pair, &role))| {
            descriptor.bind(&pair.device, slot as u32, role)
        });

    let pipeline = ComputePipeline::build(
        &ctx,
        descriptor,
        &program,
        SpecializationConstants {
            element_count: workload.element_count(),
        },
    )
    .context("failed to build compute pipeline")?;

    let mut engine = DispatchEngine::new(&ctx).context("failed to create dispatch engine")?;
    engine.dispatch(&pipeline).context("dispatch failed")?;

    let mut output = workload.output_buffer();
    pairs[workload.readback_slot]
        .download(output.as_bytes_mut())
        .context("failed to read back results")?;

    drop(engine);
    drop(pipeline);
    drop(program);
    for pair in pairs {
        pair.release();
    }

    if ctx.validation_enabled() {
        let errors = ctx.validation_error_count();
        if errors > 0 {
            warn!(errors, "Validation layer reported errors during the run");
        } else {
            info!(warnings = ctx.validation_warning_count(), "Validation clean");
        }
    }

    Ok(Outcome {
        inputs: workload.inputs,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_cover_every_slot() {
        for variant in [ShaderVariant::Identity, ShaderVariant::Combine] {
            let roles = binding_roles(variant);
            assert_eq!(roles.len(), variant.buffer_count());
            assert!(roles.iter().any(|r| r.writes()), "{variant} writes nothing");
        }
    }

    #[test]
    fn combine_reads_back_the_written_slot() {
        let roles = binding_roles(ShaderVariant::Combine);
        assert!(!roles[0].writes());
        assert!(roles[1].reads() && roles[1].writes());
    }

    #[test]
    fn explicit_shader_dir_wins() {
        let config = HarnessConfig {
            shader_dir: Some(PathBuf::from("/tmp/spv")),
            ..Default::default()
        };
        assert_eq!(
            program_path(&config).unwrap(),
            PathBuf::from("/tmp/spv").join("headless.spv")
        );
    }
}
