/// Wireframe pipeline - the line-primitive bounding-cube layer.
///
/// Owns its geometry: 8 corners at ±`cube_size` per axis and a fixed index
/// buffer describing the 12 edges as a line list.

use std::sync::Arc;
use glam::Mat4;

use crate::config::ShaderSet;
use crate::device::{
    BlendMode, Buffer, BufferDesc, BufferUsage, CommandList, DepthState, GraphicsDevice,
    IndexType, Pipeline, PipelineDesc, PrimitiveTopology, RenderPass, ShaderDesc, ShaderStage,
    VertexFormat, VertexStream,
};
use crate::error::Result;

/// 24 indices for the cube's 12 edges
pub const CUBE_INDICES: [u32; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, // back face ring
    4, 5, 5, 6, 6, 7, 7, 4, // front face ring
    0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
];

/// The cube's 8 corners at ±`size` per axis
pub fn cube_corners(size: f32) -> [[f32; 3]; 8] {
    [
        [-size, -size, -size],
        [size, -size, -size],
        [size, size, -size],
        [-size, size, -size],
        [-size, -size, size],
        [size, -size, size],
        [size, size, size],
        [-size, size, size],
    ]
}

pub struct WireframePipeline {
    pipeline: Arc<dyn Pipeline>,
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
}

impl WireframePipeline {
    pub fn new(
        device: &dyn GraphicsDevice,
        render_pass: &Arc<dyn RenderPass>,
        shaders: &ShaderSet,
        cube_size: f32,
    ) -> Result<Self> {
        let vertex_shader = device.create_shader(ShaderDesc {
            code: shaders.wireframe_vert.clone(),
            stage: ShaderStage::Vertex,
            entry_point: "main".to_string(),
        })?;
        let fragment_shader = device.create_shader(ShaderDesc {
            code: shaders.wireframe_frag.clone(),
            stage: ShaderStage::Fragment,
            entry_point: "main".to_string(),
        })?;

        let pipeline = device.create_pipeline(PipelineDesc {
            label: "wireframe",
            render_pass: render_pass.clone(),
            topology: PrimitiveTopology::LineList,
            vertex_shader,
            fragment_shader,
            vertex_streams: vec![VertexStream { binding: 0, format: VertexFormat::Float32x3 }],
            depth: DepthState::reversed_z(),
            blend: BlendMode::Opaque,
            texture_binding: false,
        })?;

        let corners = cube_corners(cube_size);
        let vertex_buffer = device.create_buffer(BufferDesc {
            size: std::mem::size_of_val(&corners) as u64,
            usage: BufferUsage::Vertex,
            label: "wireframe_vertices",
        })?;
        vertex_buffer.update(0, bytemuck::cast_slice(&corners))?;

        let index_buffer = device.create_buffer(BufferDesc {
            size: std::mem::size_of_val(&CUBE_INDICES) as u64,
            usage: BufferUsage::Index,
            label: "wireframe_indices",
        })?;
        index_buffer.update(0, bytemuck::cast_slice(&CUBE_INDICES))?;

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
        })
    }

    /// Record this layer's draw: all 24 edge indices.
    pub fn draw(&self, cmd: &mut dyn CommandList, transform: Mat4) -> Result<()> {
        cmd.bind_pipeline(&self.pipeline)?;
        cmd.bind_vertex_buffer(0, &self.vertex_buffer, 0)?;
        cmd.bind_index_buffer(&self.index_buffer, 0, IndexType::U32)?;
        cmd.push_constants(ShaderStage::Vertex, 0, bytemuck::bytes_of(&transform))?;
        cmd.draw_indexed(CUBE_INDICES.len() as u32, 0, 0)
    }
}

#[cfg(test)]
#[path = "wireframe_tests.rs"]
mod wireframe_tests;
