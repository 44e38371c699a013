//! Location of the compute programs compiled at build time.
//!
//! `build.rs` compiles `kernels/vulkan/*.comp` into a directory under
//! `OUT_DIR`. Programs stay on disk and are loaded by path through
//! [`ShaderModule::from_spirv_file`](crate::vulkan::shader::ShaderModule::from_spirv_file),
//! so a caller can point the harness at another directory instead.
//!
//! | Source file      | Program name | Buffers                    |
//! |------------------|--------------|----------------------------|
//! | `headless.comp`  | `"headless"` | slot 0 (in/out, `u32`)     |
//! | `combine.comp`   | `"combine"`  | slot 0 (in), slot 1 (in/out, `f32`) |

use std::path::{Path, PathBuf};

/// Directory the build script wrote compiled programs into.
///
/// Returns `None` when glslc was not available at build time.
pub fn spirv_dir() -> Option<&'static Path> {
    #[cfg(no_vulkan_kernels)]
    {
        tracing::warn!("compute programs not available (glslc was not found at build time)");
        None
    }

    #[cfg(not(no_vulkan_kernels))]
    {
        Some(Path::new(env!("HC_SPIRV_DIR")))
    }
}

/// Path of a compiled program by source file stem, e.g. `spirv_path("headless")`.
///
/// Returns `None` if programs were not compiled or the file does not exist.
pub fn spirv_path(name: &str) -> Option<PathBuf> {
    let path = spirv_dir()?.join(format!("{name}.spv"));
    if path.is_file() {
        Some(path)
    } else {
        tracing::warn!(program = name, path = %path.display(), "compiled program missing");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_none() {
        assert!(spirv_path("definitely_not_a_program").is_none());
    }

    #[cfg(not(no_vulkan_kernels))]
    #[test]
    fn bundled_programs_are_present() {
        for name in ["headless", "combine"] {
            let path = spirv_path(name).expect("program should have been compiled");
            let bytes = std::fs::read(path).unwrap();
            assert_eq!(&bytes[..4], &0x0723_0203u32.to_le_bytes());
        }
    }
}
