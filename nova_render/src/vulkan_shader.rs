/// ShaderModule - wrapper over a VkShaderModule loaded from a SPIR-V file
///
/// Shader binaries are consumed as opaque blobs from fixed relative paths
/// in the working directory ("vert.spv", "frag.spv"). A missing or
/// malformed file is fatal.

use crate::error::{Error, Result};
use crate::render_error;
use ash::vk;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Vulkan shader module loaded from disk
pub struct ShaderModule {
    /// Vulkan device (for cleanup)
    device: Arc<ash::Device>,
    /// Shader module handle
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    /// Load a SPIR-V binary and create a shader module from it
    pub fn from_file<P: AsRef<Path>>(device: Arc<ash::Device>, path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| {
            render_error!("nova::shader", "Failed to open {}: {}", path.display(), e);
            Error::ShaderLoadFailed(format!("{}: {}", path.display(), e))
        })?;

        let code = ash::util::read_spv(&mut file).map_err(|e| {
            render_error!("nova::shader", "Failed to read SPIR-V from {}: {}", path.display(), e);
            Error::ShaderLoadFailed(format!("{}: {}", path.display(), e))
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe {
            device.create_shader_module(&create_info, None).map_err(|e| {
                render_error!(
                    "nova::shader",
                    "Failed to create shader module from {}: {:?}",
                    path.display(),
                    e
                );
                Error::ShaderLoadFailed(format!("{}: {:?}", path.display(), e))
            })?
        };

        Ok(Self { device, module })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
