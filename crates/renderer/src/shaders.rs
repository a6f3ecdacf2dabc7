//! The fixed shader pair.
//!
//! GLSL sources on disk (`shaders/mesh.vert` / `shaders/mesh.frag`)
//! override the embedded defaults; either way the sources are compiled to
//! SPIR-V at startup. The defaults match the descriptor layout: MVP block
//! at binding 0, sampler array at binding 1, unsized texture array at
//! binding 2 indexed non-uniformly per fragment.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use glaze_rhi::device::Device;
use glaze_rhi::shader::{Shader, ShaderStage};
use glaze_rhi::RhiResult;

/// Default vertex shader: MVP transform plus passthrough of the per-vertex
/// texture/sampler selection.
pub const DEFAULT_VERTEX_SHADER: &str = r"#version 450

layout (binding = 0) uniform MvpBlock {
    mat4 model;
    mat4 view;
    mat4 projection;
} mvp;

layout (location = 0) in vec3 inPosition;
layout (location = 1) in vec3 inColor;
layout (location = 2) in vec2 inTexCoord;
layout (location = 3) in int inTextureIndex;
layout (location = 4) in int inSamplerIndex;

layout (location = 0) out vec3 fragColor;
layout (location = 1) out vec2 fragTexCoord;
layout (location = 2) flat out int fragTextureIndex;
layout (location = 3) flat out int fragSamplerIndex;

void main()
{
    fragColor = inColor;
    fragTexCoord = inTexCoord;
    fragTextureIndex = inTextureIndex;
    fragSamplerIndex = inSamplerIndex;
    gl_Position = mvp.projection * mvp.view * mvp.model * vec4(inPosition, 1.0);
}
";

/// Default fragment shader: samples the bindless texture array and discards
/// mostly transparent fragments.
pub const DEFAULT_FRAGMENT_SHADER: &str = r"#version 450
#extension GL_EXT_nonuniform_qualifier : require
#define SAMPLER_COUNT 2

layout (binding = 1) uniform sampler texSampler[SAMPLER_COUNT];
layout (binding = 2) uniform texture2D textures[];

layout (location = 0) in vec3 fragColor;
layout (location = 1) in vec2 fragTexCoord;
layout (location = 2) flat in int fragTextureIndex;
layout (location = 3) flat in int fragSamplerIndex;

layout (location = 0) out vec4 outColor;

void main()
{
    int samplerIndex = fragTextureIndex <= 0 ? 0 : fragSamplerIndex;
    outColor = vec4(fragColor, 1.0)
        * texture(sampler2D(textures[nonuniformEXT(fragTextureIndex)], texSampler[samplerIndex]), fragTexCoord);
    if (outColor.a < 0.8)
    {
        discard;
    }
}
";

/// Loads the vertex/fragment pair, preferring on-disk sources.
///
/// # Arguments
///
/// * `shader_dir` - Directory searched for `mesh.vert` and `mesh.frag`
///
/// # Errors
///
/// Returns an error if compilation of either stage fails.
pub fn load_shader_pair(device: &Arc<Device>, shader_dir: &Path) -> RhiResult<(Shader, Shader)> {
    let vertex_path = shader_dir.join("mesh.vert");
    let fragment_path = shader_dir.join("mesh.frag");

    let vertex = if vertex_path.is_file() {
        info!("Compiling vertex shader from {:?}", vertex_path);
        Shader::from_glsl_file(device.clone(), &vertex_path, ShaderStage::Vertex)?
    } else {
        info!("Using built-in vertex shader");
        Shader::from_glsl_source(
            device.clone(),
            DEFAULT_VERTEX_SHADER,
            ShaderStage::Vertex,
            "mesh.vert",
        )?
    };

    let fragment = if fragment_path.is_file() {
        info!("Compiling fragment shader from {:?}", fragment_path);
        Shader::from_glsl_file(device.clone(), &fragment_path, ShaderStage::Fragment)?
    } else {
        info!("Using built-in fragment shader");
        Shader::from_glsl_source(
            device.clone(),
            DEFAULT_FRAGMENT_SHADER,
            ShaderStage::Fragment,
            "mesh.frag",
        )?
    };

    Ok((vertex, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sources_reference_all_bindings() {
        assert!(DEFAULT_VERTEX_SHADER.contains("binding = 0"));
        assert!(DEFAULT_FRAGMENT_SHADER.contains("binding = 1"));
        assert!(DEFAULT_FRAGMENT_SHADER.contains("binding = 2"));
    }

    #[test]
    fn fragment_shader_uses_nonuniform_indexing() {
        assert!(DEFAULT_FRAGMENT_SHADER.contains("GL_EXT_nonuniform_qualifier"));
        assert!(DEFAULT_FRAGMENT_SHADER.contains("nonuniformEXT"));
    }

    #[test]
    fn vertex_shader_consumes_five_attributes() {
        for location in 0..5 {
            assert!(
                DEFAULT_VERTEX_SHADER.contains(&format!("location = {location}) in")),
                "missing input at location {location}"
            );
        }
    }
}
