/// CommandList - Vulkan implementation of the engine CommandList trait
///
/// One primary command buffer in its own pool, reset and re-recorded every
/// frame that lands on its swap image.

use ash::vk;
use particle_view_engine::device::{
    Buffer as EngineBuffer, ClearValue, CommandList as EngineCommandList,
    Framebuffer as EngineFramebuffer, IndexType, Pipeline as EnginePipeline,
    RenderPass as EngineRenderPass, Rect2D, ShaderStage, Texture as EngineTexture, Viewport,
};
use particle_view_engine::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_device::{index_type_to_vk, shader_stage_to_vk};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_texture::Texture;

/// Vulkan command list implementation
pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    /// Layout of the most recently bound pipeline (for push constants)
    bound_layout: Option<vk::PipelineLayout>,
}

fn downcast<'a, T: 'static>(any: &'a dyn Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidResource(format!("{} from another backend", what)))
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = ctx
                .device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create command pool: {:?}", e)))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffers = ctx
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    ctx.device.destroy_command_pool(command_pool, None);
                    Error::BackendError(format!("Failed to allocate command buffer: {:?}", e))
                })?;

            Ok(Self {
                ctx,
                command_pool,
                command_buffer: command_buffers[0],
                is_recording: false,
                bound_layout: None,
            })
        }
    }

    fn require_recording(&self) -> Result<()> {
        if self.is_recording {
            Ok(())
        } else {
            Err(Error::BackendError("Command list not recording".to_string()))
        }
    }
}

impl EngineCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }
        self.is_recording = true;
        self.bound_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn EngineRenderPass>,
        framebuffer: &Arc<dyn EngineFramebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording()?;
        let render_pass = downcast::<RenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = downcast::<Framebuffer>(framebuffer.as_any(), "framebuffer")?;

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|value| match value {
                ClearValue::Color(rgba) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *rgba },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: *depth,
                        stencil: *stencil,
                    },
                },
            })
            .collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.ctx
                .device
                .cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D {
                x: scissor.x,
                y: scissor.y,
            },
            extent: vk::Extent2D {
                width: scissor.width,
                height: scissor.height,
            },
        };
        unsafe {
            self.ctx
                .device
                .cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn EnginePipeline>) -> Result<()> {
        self.require_recording()?;
        let pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                pipeline.bind_point,
                pipeline.pipeline,
            );
        }
        self.bound_layout = Some(pipeline.layout);
        Ok(())
    }

    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: &Arc<dyn EngineBuffer>,
        offset: u64,
    ) -> Result<()> {
        self.require_recording()?;
        let buffer = downcast::<Buffer>(buffer.as_any(), "buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                binding,
                &[buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn EngineBuffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.require_recording()?;
        let buffer = downcast::<Buffer>(buffer.as_any(), "buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn bind_texture(
        &mut self,
        pipeline: &Arc<dyn EnginePipeline>,
        texture: &Arc<dyn EngineTexture>,
    ) -> Result<()> {
        self.require_recording()?;
        let pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;
        let texture = downcast::<Texture>(texture.as_any(), "texture")?;
        let bindings = pipeline.bindings.as_ref().ok_or_else(|| {
            Error::InvalidResource("pipeline has no texture binding".to_string())
        })?;

        let image_infos = [vk::DescriptorImageInfo {
            sampler: vk::Sampler::null(), // immutable sampler in the layout
            image_view: texture.view,
            image_layout: vk::ImageLayout::GENERAL,
        }];
        let writes = [vk::WriteDescriptorSet::default()
            .dst_set(bindings.set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos)];

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                pipeline.bind_point,
                pipeline.layout,
                0,
                &[bindings.set],
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, stage: ShaderStage, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;
        let layout = self.bound_layout.ok_or_else(|| {
            Error::BackendError("push_constants with no bound pipeline".to_string())
        })?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                shader_stage_to_vk(stage),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx
                .device
                .cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Destroying the pool frees the command buffer with it
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
