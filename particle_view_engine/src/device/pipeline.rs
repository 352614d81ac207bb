/// Pipeline trait - graphics and compute pipeline state objects

use std::any::Any;
use std::sync::Arc;
use crate::device::render_pass::RenderPass;
use crate::device::shader::Shader;

/// Primitive topology of a graphics pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
}

/// Depth comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    /// Reversed-Z convention: greater depth values are nearer the camera
    Greater,
}

/// Depth test configuration
#[derive(Debug, Clone, Copy)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare: CompareOp,
}

impl DepthState {
    /// Depth testing with the reversed-Z comparison used by the 3D layers
    pub fn reversed_z() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare: CompareOp::Greater,
        }
    }

    /// No depth testing (2D overlay)
    pub fn disabled() -> Self {
        Self {
            test_enable: false,
            write_enable: false,
            compare: CompareOp::Less,
        }
    }
}

/// Color blend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// No blending
    Opaque,
    /// Standard source-over: src_alpha / one_minus_src_alpha (color),
    /// one / zero (alpha)
    Alpha,
}

/// Per-attribute vertex input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
}

impl VertexFormat {
    /// Tightly packed stride in bytes
    pub fn stride(&self) -> u32 {
        match self {
            VertexFormat::Float32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
        }
    }
}

/// One vertex input stream. Every pipeline in this engine feeds each
/// attribute from its own tightly packed buffer, so the shader location and
/// the binding index coincide and the stride is the attribute size.
#[derive(Debug, Clone, Copy)]
pub struct VertexStream {
    pub binding: u32,
    pub format: VertexFormat,
}

/// Descriptor for creating a graphics pipeline
///
/// All pipelines share the render pass they are created against, a dynamic
/// viewport/scissor, and a single vertex-stage push-constant range holding a
/// 4x4 transform.
#[derive(Clone)]
pub struct PipelineDesc {
    /// Debug label (also used by mock command recording in tests)
    pub label: &'static str,
    /// The shared render pass the pipeline renders in
    pub render_pass: Arc<dyn RenderPass>,
    pub topology: PrimitiveTopology,
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
    pub vertex_streams: Vec<VertexStream>,
    pub depth: DepthState,
    pub blend: BlendMode,
    /// Whether the pipeline layout carries one combined image+sampler
    /// binding at set 0, binding 0 (fragment stage). Used by the overlay.
    pub texture_binding: bool,
}

/// Descriptor for creating a compute pipeline
#[derive(Clone)]
pub struct ComputePipelineDesc {
    pub label: &'static str,
    pub shader: Arc<dyn Shader>,
}

/// Pipeline state object (graphics or compute)
pub trait Pipeline: Send + Sync {
    /// Debug label the pipeline was created with
    fn label(&self) -> &'static str;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
