//! Shader module management.
//!
//! Shader sources are GLSL compiled to SPIR-V at startup through `shaderc`;
//! precompiled SPIR-V files are accepted as well. Created modules carry
//! their stage and entry point so pipeline construction can consume them
//! directly.

use std::ffi::CStr;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Shader stage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader stage
    Vertex,
    /// Fragment shader stage
    Fragment,
}

impl ShaderStage {
    /// Converts the stage to Vulkan shader stage flags.
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    fn to_shaderc_kind(self) -> shaderc::ShaderKind {
        match self {
            ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
            ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        }
    }

    /// Returns a human-readable name for the stage.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Vulkan shader module wrapper.
pub struct Shader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
    /// Shader stage.
    stage: ShaderStage,
    /// Entry point name.
    entry_point: &'static CStr,
}

impl Shader {
    /// Creates a shader module from SPIR-V words.
    ///
    /// # Errors
    ///
    /// Returns an error if module creation fails.
    pub fn from_spirv(
        device: Arc<Device>,
        words: &[u32],
        stage: ShaderStage,
    ) -> RhiResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(words);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        debug!("Created {} shader module ({} words)", stage, words.len());

        Ok(Self {
            device,
            module,
            stage,
            entry_point: c"main",
        })
    }

    /// Compiles GLSL source to SPIR-V and creates the module.
    ///
    /// # Arguments
    ///
    /// * `source` - GLSL source text
    /// * `stage` - Shader stage the source targets
    /// * `input_name` - Name used in compiler diagnostics
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Shader`] with the compiler message on compilation
    /// failure.
    pub fn from_glsl_source(
        device: Arc<Device>,
        source: &str,
        stage: ShaderStage,
        input_name: &str,
    ) -> RhiResult<Self> {
        let compiler = shaderc::Compiler::new()
            .map_err(|e| RhiError::Shader(format!("shaderc init failed: {e}")))?;

        let artifact = compiler
            .compile_into_spirv(source, stage.to_shaderc_kind(), input_name, "main", None)
            .map_err(|e| RhiError::Shader(format!("GLSL compilation failed: {e}")))?;

        debug!("Compiled {} shader from GLSL source '{}'", stage, input_name);

        Self::from_spirv(device, artifact.as_binary(), stage)
    }

    /// Reads GLSL source from disk, compiles it and creates the module.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or compilation fails.
    pub fn from_glsl_file(device: Arc<Device>, path: &Path, stage: ShaderStage) -> RhiResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            RhiError::Shader(format!("failed to read shader file {:?}: {}", path, e))
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("shader");

        Self::from_glsl_source(device, &source, stage, name)
    }

    /// Returns the pipeline stage create info for this module.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(self.entry_point)
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Returns the shader stage.
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {} shader module", self.stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_flags() {
        assert_eq!(
            ShaderStage::Vertex.to_vk_stage(),
            vk::ShaderStageFlags::VERTEX
        );
        assert_eq!(
            ShaderStage::Fragment.to_vk_stage(),
            vk::ShaderStageFlags::FRAGMENT
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(ShaderStage::Vertex.name(), "vertex");
        assert_eq!(ShaderStage::Fragment.name(), "fragment");
    }
}
