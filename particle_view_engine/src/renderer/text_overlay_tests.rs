use super::*;
use crate::device::mock_device::{test_shader_set, MockBuffer, MockDevice, MockRasterizer};
use crate::device::RenderPassDesc;
use crate::text::FontRasterizer;
use std::path::Path;

fn build_pipeline(device: &MockDevice) -> TextPipeline {
    let render_pass = device
        .create_render_pass(RenderPassDesc {
            color_format: TextureFormat::B8G8R8A8_SRGB,
            depth_format: device.depth_format(),
        })
        .unwrap();
    let atlas = MockRasterizer.bake(Path::new("unused"), 20.0).unwrap();
    TextPipeline::new(device, &render_pass, &test_shader_set(), atlas, [400, 100]).unwrap()
}

#[test]
fn test_update_text_clears_then_composites() {
    let device = MockDevice::new();
    let pipeline = build_pipeline(&device);
    device.log.lock().unwrap().clear();

    pipeline
        .update_text(device.as_ref(), "hi\nthere", Vec2::new(10.0, 20.0))
        .unwrap();

    let log = device.log_snapshot();
    let fill_at = log.iter().position(|e| e == "fill(text_overlay)").unwrap();
    // 7 glyphs: the newline lays out nothing
    let blit_at = log
        .iter()
        .position(|e| e == "composite_glyphs(glyph_blit, 7)")
        .unwrap();
    assert!(fill_at < blit_at);
}

#[test]
fn test_update_text_moves_quad_to_top_left() {
    let device = MockDevice::new();
    let pipeline = build_pipeline(&device);

    pipeline
        .update_text(device.as_ref(), "x", Vec2::new(32.0, 64.0))
        .unwrap();

    let buffer = pipeline
        .vertex_buffer
        .as_any()
        .downcast_ref::<MockBuffer>()
        .unwrap();
    let data = buffer.data.lock().unwrap();
    let corners: &[[f32; 2]] = bytemuck::cast_slice(data.as_slice());
    assert_eq!(corners[0], [32.0, 64.0]);
    assert_eq!(corners[1], [432.0, 64.0]);
    assert_eq!(corners[2], [432.0, 164.0]);
    assert_eq!(corners[3], [32.0, 164.0]);
}

#[test]
fn test_update_text_truncates_to_placement_capacity() {
    let device = MockDevice::new();
    let pipeline = build_pipeline(&device);
    device.log.lock().unwrap().clear();

    let long_text = "a".repeat(MAX_GLYPHS + 50);
    pipeline
        .update_text(device.as_ref(), &long_text, Vec2::ZERO)
        .unwrap();

    let log = device.log_snapshot();
    assert!(log.contains(&format!("composite_glyphs(glyph_blit, {})", MAX_GLYPHS)));
}

#[test]
fn test_empty_text_skips_composite() {
    let device = MockDevice::new();
    let pipeline = build_pipeline(&device);
    device.log.lock().unwrap().clear();

    pipeline.update_text(device.as_ref(), "", Vec2::ZERO).unwrap();

    let log = device.log_snapshot();
    assert!(log.iter().any(|e| e == "fill(text_overlay)"));
    assert!(!log.iter().any(|e| e.starts_with("composite_glyphs")));
}

#[test]
fn test_draw_binds_overlay_and_issues_six_indices() {
    let device = MockDevice::new();
    let pipeline = build_pipeline(&device);
    let mut cmd = device.create_command_list().unwrap();
    device.log.lock().unwrap().clear();

    pipeline.draw(cmd.as_mut(), [800, 600]).unwrap();

    let log = device.log_snapshot();
    let expected = [
        "bind_pipeline(text)",
        "bind_texture(text, text_overlay)",
        "bind_vertex_buffer(0, overlay_vertices)",
        "bind_vertex_buffer(1, overlay_texcoords)",
        "bind_index_buffer(overlay_indices)",
        "push_constants(64)",
        "draw_indexed(6, 0, 0)",
    ];
    assert_eq!(log, expected);
}
