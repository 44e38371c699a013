//! Compute program loading.
//!
//! Programs are opaque precompiled SPIR-V, read from disk and wrapped in a
//! [`ShaderModule`] that destroys the `VkShaderModule` on drop. The module is
//! only needed while a pipeline is being built.

use std::ffi::CStr;
use std::path::Path;

use ash::vk;
use tracing::{debug, warn};

use super::context::DeviceContext;
use super::error::VulkanError;

/// SPIR-V magic number (first word of any valid SPIR-V module).
const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Minimum SPIR-V size: a five-word header.
const SPIRV_HEADER_BYTES: usize = 20;

/// Entry point every compute program must export.
pub const ENTRY_POINT: &CStr = c"main";

/// A SPIR-V shader module with RAII cleanup.
pub struct ShaderModule<'a> {
    module: vk::ShaderModule,
    ctx: &'a DeviceContext,
    /// Name for logging.
    name: String,
}

impl<'a> ShaderModule<'a> {
    /// Create a shader module from SPIR-V bytes.
    ///
    /// The input need not be 4-byte aligned; it is copied into words first.
    ///
    /// # Errors
    ///
    /// [`VulkanError::InvalidSpirv`] when the bytes are too short, not a whole
    /// number of words, or do not start with the SPIR-V magic number.
    /// [`VulkanError::ShaderCreation`] when the driver rejects the module.
    pub fn from_spirv(ctx: &'a DeviceContext, spirv_bytes: &[u8], name: impl Into<String>) -> Result<Self, VulkanError> {
        let name = name.into();
        let words = spirv_words(spirv_bytes).inspect_err(|e| {
            warn!(name = %name, size = spirv_bytes.len(), error = %e, "Rejected SPIR-V");
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

        let module = unsafe {
            // SAFETY: Device is valid and the code passed the header checks.
            // The driver copies the code, so `words` need not outlive the call.
            ctx.device()
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::ShaderCreation)?
        };

        debug!(name = %name, size = spirv_bytes.len(), "Created shader module");

        Ok(Self { module, ctx, name })
    }

    /// Load a shader module from a SPIR-V file on disk.
    ///
    /// The module is named after the file stem.
    pub fn from_spirv_file(ctx: &'a DeviceContext, path: &Path) -> Result<Self, VulkanError> {
        let bytes = std::fs::read(path).map_err(|source| VulkanError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_spirv(ctx, &bytes, name)
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: We own this module. Pipelines built from it keep their
            // own copy of the code.
            self.ctx.device().destroy_shader_module(self.module, None);
        }
        debug!(name = %self.name, "Destroyed shader module");
    }
}

/// Check the SPIR-V header and convert bytes to native-endian words.
fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>, VulkanError> {
    if bytes.len() < SPIRV_HEADER_BYTES {
        return Err(VulkanError::InvalidSpirv(format!(
            "{} bytes is shorter than the SPIR-V header",
            bytes.len()
        )));
    }
    if !bytes.len().is_multiple_of(4) {
        return Err(VulkanError::InvalidSpirv(format!(
            "length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if words[0] != SPIRV_MAGIC {
        return Err(VulkanError::InvalidSpirv(format!("bad magic 0x{:08X}", words[0])));
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        [SPIRV_MAGIC, 0x0001_0000, 0, 8, 0]
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .collect()
    }

    #[test]
    fn valid_header_converts_to_words() {
        let words = spirv_words(&header()).unwrap();
        assert_eq!(words.len(), 5);
        assert_eq!(words[0], SPIRV_MAGIC);
        assert_eq!(words[3], 8);
    }

    #[test]
    fn unaligned_input_is_accepted() {
        let mut padded = vec![0u8];
        padded.extend(header());
        assert!(spirv_words(&padded[1..]).is_ok());
    }

    #[test]
    fn short_input_is_rejected() {
        assert!(matches!(spirv_words(&[0x03, 0x02, 0x23, 0x07]), Err(VulkanError::InvalidSpirv(_))));
    }

    #[test]
    fn ragged_length_is_rejected() {
        let mut bytes = header();
        bytes.push(0);
        let err = spirv_words(&bytes).unwrap_err();
        assert!(err.to_string().contains("multiple of 4"));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = header();
        bytes[0] ^= 0xFF;
        let err = spirv_words(&bytes).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn entry_point_is_main() {
        assert_eq!(ENTRY_POINT.to_str().unwrap(), "main");
    }
}
