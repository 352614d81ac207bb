//! Unit tests for the descriptor→Vulkan translation functions.
//! These are pure mappings and need no GPU.

use ash::vk;
use particle_view_engine::device::{
    BlendMode, BufferUsage, CompareOp, IndexType, PrimitiveTopology, ShaderStage, TextureFormat,
    VertexFormat,
};

use crate::vulkan_device::{
    blend_attachment, buffer_usage_to_vk, compare_op_to_vk, index_type_to_vk, shader_stage_to_vk,
    texture_format_to_vk, topology_to_vk, vertex_format_to_vk,
};

#[test]
fn test_texture_format_mapping() {
    assert_eq!(texture_format_to_vk(TextureFormat::R8_UNORM), vk::Format::R8_UNORM);
    assert_eq!(
        texture_format_to_vk(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_UNORM
    );
    assert_eq!(
        texture_format_to_vk(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::B8G8R8A8_SRGB
    );
    assert_eq!(texture_format_to_vk(TextureFormat::D32_SFLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(
        texture_format_to_vk(TextureFormat::D24_UNORM_S8_UINT),
        vk::Format::D24_UNORM_S8_UINT
    );
}

#[test]
fn test_depth_formats_are_depth() {
    assert!(TextureFormat::D32_SFLOAT.is_depth());
    assert!(TextureFormat::D32_SFLOAT_S8_UINT.is_depth());
    assert!(TextureFormat::D24_UNORM_S8_UINT.is_depth());
    assert!(!TextureFormat::B8G8R8A8_SRGB.is_depth());
}

#[test]
fn test_topology_mapping() {
    assert_eq!(
        topology_to_vk(PrimitiveTopology::PointList),
        vk::PrimitiveTopology::POINT_LIST
    );
    assert_eq!(
        topology_to_vk(PrimitiveTopology::LineList),
        vk::PrimitiveTopology::LINE_LIST
    );
    assert_eq!(
        topology_to_vk(PrimitiveTopology::TriangleList),
        vk::PrimitiveTopology::TRIANGLE_LIST
    );
}

#[test]
fn test_compare_op_mapping() {
    assert_eq!(compare_op_to_vk(CompareOp::Less), vk::CompareOp::LESS);
    assert_eq!(compare_op_to_vk(CompareOp::Greater), vk::CompareOp::GREATER);
}

#[test]
fn test_vertex_format_mapping_and_strides() {
    assert_eq!(vertex_format_to_vk(VertexFormat::Float32), vk::Format::R32_SFLOAT);
    assert_eq!(vertex_format_to_vk(VertexFormat::Float32x2), vk::Format::R32G32_SFLOAT);
    assert_eq!(
        vertex_format_to_vk(VertexFormat::Float32x3),
        vk::Format::R32G32B32_SFLOAT
    );

    assert_eq!(VertexFormat::Float32.stride(), 4);
    assert_eq!(VertexFormat::Float32x2.stride(), 8);
    assert_eq!(VertexFormat::Float32x3.stride(), 12);
}

#[test]
fn test_shader_stage_mapping() {
    assert_eq!(shader_stage_to_vk(ShaderStage::Vertex), vk::ShaderStageFlags::VERTEX);
    assert_eq!(shader_stage_to_vk(ShaderStage::Fragment), vk::ShaderStageFlags::FRAGMENT);
    assert_eq!(shader_stage_to_vk(ShaderStage::Compute), vk::ShaderStageFlags::COMPUTE);
}

#[test]
fn test_buffer_usage_mapping() {
    assert_eq!(
        buffer_usage_to_vk(BufferUsage::Vertex),
        vk::BufferUsageFlags::VERTEX_BUFFER
    );
    assert_eq!(buffer_usage_to_vk(BufferUsage::Index), vk::BufferUsageFlags::INDEX_BUFFER);
    assert_eq!(
        buffer_usage_to_vk(BufferUsage::Storage),
        vk::BufferUsageFlags::STORAGE_BUFFER
    );
}

#[test]
fn test_index_type_mapping() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

#[test]
fn test_opaque_blend_disables_blending() {
    let state = blend_attachment(BlendMode::Opaque);
    assert_eq!(state.blend_enable, vk::FALSE);
    assert_eq!(state.color_write_mask, vk::ColorComponentFlags::RGBA);
}

#[test]
fn test_alpha_blend_is_source_over() {
    let state = blend_attachment(BlendMode::Alpha);
    assert_eq!(state.blend_enable, vk::TRUE);
    assert_eq!(state.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
    assert_eq!(state.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(state.src_alpha_blend_factor, vk::BlendFactor::ONE);
    assert_eq!(state.dst_alpha_blend_factor, vk::BlendFactor::ZERO);
}
