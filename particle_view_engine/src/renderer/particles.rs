/// Particles pipeline - the 3D point-primitive layer.
///
/// Two vertex streams: positions (vec3, binding 0) and the scalar potential
/// (float, binding 1) that colors each point. Both buffers are owned by the
/// simulation; this layer only binds and draws them.

use std::sync::Arc;
use glam::Mat4;

use crate::config::ShaderSet;
use crate::device::{
    Buffer, CommandList, GraphicsDevice, Pipeline, PipelineDesc, PrimitiveTopology,
    RenderPass, ShaderDesc, ShaderStage, VertexFormat, VertexStream,
    BlendMode, DepthState,
};
use crate::error::Result;

/// Byte stride of one position (vec3<f32>)
pub const POSITION_STRIDE: u64 = 12;

pub struct ParticlesPipeline {
    pipeline: Arc<dyn Pipeline>,
}

impl ParticlesPipeline {
    pub fn new(
        device: &dyn GraphicsDevice,
        render_pass: &Arc<dyn RenderPass>,
        shaders: &ShaderSet,
    ) -> Result<Self> {
        let vertex_shader = device.create_shader(ShaderDesc {
            code: shaders.particles_vert.clone(),
            stage: ShaderStage::Vertex,
            entry_point: "main".to_string(),
        })?;
        let fragment_shader = device.create_shader(ShaderDesc {
            code: shaders.particles_frag.clone(),
            stage: ShaderStage::Fragment,
            entry_point: "main".to_string(),
        })?;

        let pipeline = device.create_pipeline(PipelineDesc {
            label: "particles",
            render_pass: render_pass.clone(),
            topology: PrimitiveTopology::PointList,
            vertex_shader,
            fragment_shader,
            vertex_streams: vec![
                VertexStream { binding: 0, format: VertexFormat::Float32x3 },
                VertexStream { binding: 1, format: VertexFormat::Float32 },
            ],
            depth: DepthState::reversed_z(),
            blend: BlendMode::Opaque,
            texture_binding: false,
        })?;

        Ok(Self { pipeline })
    }

    /// Record this layer's draw. Non-indexed; the vertex count is derived
    /// from the position buffer's length.
    pub fn draw(
        &self,
        cmd: &mut dyn CommandList,
        transform: Mat4,
        positions: &Arc<dyn Buffer>,
        potential: &Arc<dyn Buffer>,
    ) -> Result<()> {
        cmd.bind_pipeline(&self.pipeline)?;
        cmd.bind_vertex_buffer(0, positions, 0)?;
        cmd.bind_vertex_buffer(1, potential, 0)?;
        cmd.push_constants(ShaderStage::Vertex, 0, bytemuck::bytes_of(&transform))?;

        let vertex_count = (positions.size() / POSITION_STRIDE) as u32;
        cmd.draw(vertex_count, 0)
    }
}
