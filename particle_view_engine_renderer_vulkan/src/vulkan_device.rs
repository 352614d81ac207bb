/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// The factory half builds every resource the orchestration core asks for;
/// the queue half implements fence waits, frame submission and the one-shot
/// glyph-blit dispatch.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use particle_view_engine::device::{
    Buffer as EngineBuffer, BufferDesc, BufferUsage, CommandList as EngineCommandList,
    CompareOp, ComputePipelineDesc, Fence as EngineFence, Framebuffer as EngineFramebuffer,
    FramebufferDesc, GraphicsDevice, IndexType, Pipeline as EnginePipeline, PipelineDesc,
    PrimitiveTopology, RenderPass as EngineRenderPass, RenderPassDesc,
    RenderTarget as EngineRenderTarget, Semaphore as EngineSemaphore, Shader as EngineShader,
    ShaderDesc, ShaderStage, Texture as EngineTexture, TextureDesc, TextureFormat, TextureUsage,
    BlendMode,
};
use particle_view_engine::{Error, Result};
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::{DescriptorPool, Pipeline, PipelineBindings};
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_shader::Shader;
use crate::vulkan_sync::{Fence, Semaphore};
use crate::vulkan_texture::{create_view, texel_size, Texture};

// ============================================================================
// Descriptor translation
// ============================================================================

pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8_UNORM => vk::Format::R8_UNORM,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
    }
}

pub(crate) fn compare_op_to_vk(compare: CompareOp) -> vk::CompareOp {
    match compare {
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Greater => vk::CompareOp::GREATER,
    }
}

pub(crate) fn vertex_format_to_vk(format: particle_view_engine::device::VertexFormat) -> vk::Format {
    use particle_view_engine::device::VertexFormat;
    match format {
        VertexFormat::Float32 => vk::Format::R32_SFLOAT,
        VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
        VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
    }
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn blend_attachment(blend: BlendMode) -> vk::PipelineColorBlendAttachmentState {
    match blend {
        BlendMode::Opaque => vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false),
        BlendMode::Alpha => vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD),
    }
}

/// Push-constant block of the glyph-blit kernel
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlyphBlitPush {
    bg_color: [f32; 4],
    text_color: [f32; 4],
    glyph_count: u32,
    _pad: [u32; 3],
}

/// Size of the per-draw transform push constant (one 4x4 matrix)
const TRANSFORM_PUSH_SIZE: u32 = 64;

// ============================================================================
// Device
// ============================================================================

/// Vulkan graphics device implementation
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    descriptor_pool: Arc<DescriptorPool>,
}

fn downcast<'a, T: 'static>(any: &'a dyn std::any::Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidResource(format!("{} from another backend", what)))
}

impl VulkanGraphicsDevice {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        const MAX_DESCRIPTORS: u32 = 16;
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: MAX_DESCRIPTORS,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLED_IMAGE,
                descriptor_count: MAX_DESCRIPTORS,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_IMAGE,
                descriptor_count: MAX_DESCRIPTORS,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: MAX_DESCRIPTORS,
            },
        ];
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(MAX_DESCRIPTORS / 4)
            .pool_sizes(&pool_sizes);

        let pool = unsafe {
            ctx.device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create descriptor pool: {:?}",
                        e
                    ))
                })?
        };

        Ok(Self {
            descriptor_pool: Arc::new(DescriptorPool::new(ctx.clone(), pool)),
            ctx,
        })
    }

    fn create_sampler(&self, filter: vk::Filter) -> Result<vk::Sampler> {
        let info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .border_color(vk::BorderColor::FLOAT_TRANSPARENT_BLACK);

        unsafe {
            self.ctx
                .device
                .create_sampler(&info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create sampler: {:?}", e)))
        }
    }

    fn allocate_descriptor_set(
        &self,
        set_layout: vk::DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet> {
        let set_layouts = [set_layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool.pool)
            .set_layouts(&set_layouts);
        unsafe {
            Ok(self
                .ctx
                .device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to allocate descriptor set: {:?}", e))
                })?[0])
        }
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn EngineBuffer>> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .ctx
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create buffer: {:?}", e)))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: desc.label,
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| Error::OutOfMemory)?;

            self.ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| Error::BackendError(format!("Failed to bind buffer memory: {:?}", e)))?;

            Ok(Arc::new(Buffer::new(
                self.ctx.clone(),
                buffer,
                allocation,
                desc.size,
            )))
        }
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn EngineTexture>> {
        unsafe {
            let usage = match desc.usage {
                TextureUsage::Sampled => {
                    vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST
                }
                TextureUsage::Storage => {
                    vk::ImageUsageFlags::STORAGE
                        | vk::ImageUsageFlags::SAMPLED
                        | vk::ImageUsageFlags::TRANSFER_DST
                }
            };

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(texture_format_to_vk(desc.format))
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .ctx
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create image: {:?}", e)))?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: desc.label,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| Error::OutOfMemory)?;

            self.ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| Error::BackendError(format!("Failed to bind image memory: {:?}", e)))?;

            let view = create_view(
                &self.ctx.device,
                image,
                desc.format,
                vk::ImageAspectFlags::COLOR,
            )?;

            // Textures spend their whole life in GENERAL (storage writes and
            // sampling both happen there).
            self.ctx.one_shot(|device, command_buffer| {
                GpuContext::transition_image_layout(
                    device,
                    command_buffer,
                    image,
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::GENERAL,
                );
            })?;

            Ok(Arc::new(Texture::new(
                self.ctx.clone(),
                image,
                view,
                allocation,
                desc.width,
                desc.height,
                desc.format,
                texel_size(desc.format),
            )))
        }
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn EngineShader>> {
        if desc.code.len() % 4 != 0 {
            return Err(Error::InvalidResource(
                "Shader code must be aligned to 4 bytes".to_string(),
            ));
        }

        let code_u32: Vec<u32> = desc
            .code
            .chunks_exact(4)
            .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code_u32);
        let module = unsafe {
            self.ctx
                .device
                .create_shader_module(&create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create shader module: {:?}", e)))?
        };

        Ok(Arc::new(Shader::new(
            self.ctx.clone(),
            module,
            desc.stage,
            desc.entry_point,
        )))
    }

    fn create_render_pass(&self, desc: RenderPassDesc) -> Result<Arc<dyn EngineRenderPass>> {
        unsafe {
            let color_attachment = vk::AttachmentDescription::default()
                .format(texture_format_to_vk(desc.color_format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

            let depth_attachment = vk::AttachmentDescription::default()
                .format(texture_format_to_vk(desc.depth_format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let color_attachment_ref = vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
            let depth_attachment_ref = vk::AttachmentReference::default()
                .attachment(1)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(std::slice::from_ref(&color_attachment_ref))
                .depth_stencil_attachment(&depth_attachment_ref);

            let dependency = vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                );

            let attachments = [color_attachment, depth_attachment];
            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(std::slice::from_ref(&subpass))
                .dependencies(std::slice::from_ref(&dependency));

            let render_pass = self
                .ctx
                .device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create render pass: {:?}", e)))?;

            Ok(Arc::new(RenderPass::new(self.ctx.clone(), render_pass)))
        }
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn EnginePipeline>> {
        unsafe {
            let render_pass = downcast::<RenderPass>(desc.render_pass.as_any(), "render pass")?;
            let vertex_shader = downcast::<Shader>(desc.vertex_shader.as_any(), "shader")?;
            let fragment_shader = downcast::<Shader>(desc.fragment_shader.as_any(), "shader")?;

            let entry_point_vert = CString::new(vertex_shader.entry_point.as_str())
                .map_err(|_| Error::InvalidResource("invalid shader entry point".to_string()))?;
            let entry_point_frag = CString::new(fragment_shader.entry_point.as_str())
                .map_err(|_| Error::InvalidResource("invalid shader entry point".to_string()))?;

            let shader_stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(vertex_shader.stage))
                    .module(vertex_shader.module)
                    .name(&entry_point_vert),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(fragment_shader.stage))
                    .module(fragment_shader.module)
                    .name(&entry_point_frag),
            ];

            // One tightly packed buffer per attribute; location == binding.
            let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
                .vertex_streams
                .iter()
                .map(|stream| vk::VertexInputBindingDescription {
                    binding: stream.binding,
                    stride: stream.format.stride(),
                    input_rate: vk::VertexInputRate::VERTEX,
                })
                .collect();
            let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
                .vertex_streams
                .iter()
                .map(|stream| vk::VertexInputAttributeDescription {
                    location: stream.binding,
                    binding: stream.binding,
                    format: vertex_format_to_vk(stream.format),
                    offset: 0,
                })
                .collect();

            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&vertex_attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(topology_to_vk(desc.topology))
                .primitive_restart_enable(false);

            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::CLOCKWISE)
                .depth_bias_enable(false);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(desc.depth.test_enable)
                .depth_write_enable(desc.depth.write_enable)
                .depth_compare_op(compare_op_to_vk(desc.depth.compare))
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false);

            let color_blend_attachment = blend_attachment(desc.blend);
            let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state =
                vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            let push_constant_range = vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::VERTEX)
                .offset(0)
                .size(TRANSFORM_PUSH_SIZE);

            // Pipelines that sample a texture get an immutable-sampler set
            // layout and one descriptor set from the shared pool.
            let bindings = if desc.texture_binding {
                let sampler = self.create_sampler(vk::Filter::NEAREST)?;
                let samplers = [sampler];
                let layout_bindings = [vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT)
                    .immutable_samplers(&samplers)];
                let layout_info =
                    vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings);
                let set_layout = self
                    .ctx
                    .device
                    .create_descriptor_set_layout(&layout_info, None)
                    .map_err(|e| {
                        Error::BackendError(format!("Failed to create set layout: {:?}", e))
                    })?;
                let set = self.allocate_descriptor_set(set_layout)?;
                Some(PipelineBindings {
                    pool: self.descriptor_pool.clone(),
                    set_layout,
                    set,
                    sampler,
                })
            } else {
                None
            };

            let set_layouts: Vec<vk::DescriptorSetLayout> = bindings
                .iter()
                .map(|b| b.set_layout)
                .collect();
            let layout_create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts)
                .push_constant_ranges(std::slice::from_ref(&push_constant_range));
            let layout = self
                .ctx
                .device
                .create_pipeline_layout(&layout_create_info, None)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to create pipeline layout: {:?}", e))
                })?;

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .multisample_state(&multisample_state)
                .depth_stencil_state(&depth_stencil_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(layout)
                .render_pass(render_pass.render_pass)
                .subpass(0);

            let pipelines = self
                .ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to create graphics pipeline: {:?}", e.1))
                })?;

            Ok(Arc::new(Pipeline::new(
                self.ctx.clone(),
                desc.label,
                pipelines[0],
                layout,
                vk::PipelineBindPoint::GRAPHICS,
                bindings,
            )))
        }
    }

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn EnginePipeline>> {
        unsafe {
            let shader = downcast::<Shader>(desc.shader.as_any(), "shader")?;
            let entry_point = CString::new(shader.entry_point.as_str())
                .map_err(|_| Error::InvalidResource("invalid shader entry point".to_string()))?;

            // Fixed glyph-blit interface: sampled atlas, storage overlay,
            // placement records. The atlas sampler is bilinear: the kernel
            // relies on it for the fractional destination offset.
            let sampler = self.create_sampler(vk::Filter::LINEAR)?;
            let samplers = [sampler];
            let layout_bindings = [
                vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE)
                    .immutable_samplers(&samplers),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1)
                    .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(2)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE),
            ];
            let layout_info =
                vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings);
            let set_layout = self
                .ctx
                .device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create set layout: {:?}", e)))?;
            let set = self.allocate_descriptor_set(set_layout)?;

            let push_constant_range = vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::COMPUTE)
                .offset(0)
                .size(std::mem::size_of::<GlyphBlitPush>() as u32);

            let set_layouts = [set_layout];
            let layout_create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts)
                .push_constant_ranges(std::slice::from_ref(&push_constant_range));
            let layout = self
                .ctx
                .device
                .create_pipeline_layout(&layout_create_info, None)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to create pipeline layout: {:?}", e))
                })?;

            let stage = vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::COMPUTE)
                .module(shader.module)
                .name(&entry_point);
            let pipeline_create_info = vk::ComputePipelineCreateInfo::default()
                .stage(stage)
                .layout(layout);

            let pipelines = self
                .ctx
                .device
                .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
                .map_err(|e| {
                    Error::BackendError(format!("Failed to create compute pipeline: {:?}", e.1))
                })?;

            Ok(Arc::new(Pipeline::new(
                self.ctx.clone(),
                desc.label,
                pipelines[0],
                layout,
                vk::PipelineBindPoint::COMPUTE,
                Some(PipelineBindings {
                    pool: self.descriptor_pool.clone(),
                    set_layout,
                    set,
                    sampler,
                }),
            )))
        }
    }

    fn create_depth_target(&self, width: u32, height: u32) -> Result<Arc<dyn EngineRenderTarget>> {
        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(self.ctx.vk_depth_format)
                .extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .ctx
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create depth image: {:?}", e)))?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: "depth_target",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| Error::OutOfMemory)?;

            self.ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| Error::BackendError(format!("Failed to bind depth memory: {:?}", e)))?;

            let view = create_view(
                &self.ctx.device,
                image,
                self.ctx.depth_format,
                vk::ImageAspectFlags::DEPTH,
            )?;

            Ok(Arc::new(RenderTarget::owned(
                self.ctx.clone(),
                image,
                allocation,
                view,
                width,
                height,
                self.ctx.depth_format,
            )))
        }
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn EngineFramebuffer>> {
        unsafe {
            let render_pass = downcast::<RenderPass>(desc.render_pass.as_any(), "render pass")?;
            let color = downcast::<RenderTarget>(desc.color.as_any(), "render target")?;
            let depth = downcast::<RenderTarget>(desc.depth.as_any(), "render target")?;

            let attachments = [color.view, depth.view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.render_pass)
                .attachments(&attachments)
                .width(desc.width)
                .height(desc.height)
                .layers(1);

            let framebuffer = self
                .ctx
                .device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create framebuffer: {:?}", e)))?;

            Ok(Arc::new(Framebuffer::new(
                self.ctx.clone(),
                framebuffer,
                desc.width,
                desc.height,
                [desc.color.clone(), desc.depth.clone()],
            )))
        }
    }

    fn create_command_list(&self) -> Result<Box<dyn EngineCommandList>> {
        Ok(Box::new(CommandList::new(self.ctx.clone())?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn EngineFence>> {
        let mut create_info = vk::FenceCreateInfo::default();
        if signaled {
            create_info = create_info.flags(vk::FenceCreateFlags::SIGNALED);
        }
        let fence = unsafe {
            self.ctx
                .device
                .create_fence(&create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create fence: {:?}", e)))?
        };
        Ok(Arc::new(Fence::new(self.ctx.clone(), fence)))
    }

    fn create_semaphore(&self) -> Result<Arc<dyn EngineSemaphore>> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe {
            self.ctx
                .device
                .create_semaphore(&create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create semaphore: {:?}", e)))?
        };
        Ok(Arc::new(Semaphore::new(self.ctx.clone(), semaphore)))
    }

    fn wait_for_fence(&self, fence: &Arc<dyn EngineFence>, timeout_ns: u64) -> Result<()> {
        let fence = downcast::<Fence>(fence.as_any(), "fence")?;
        unsafe {
            match self
                .ctx
                .device
                .wait_for_fences(&[fence.fence], true, timeout_ns)
            {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(Error::DeviceLost(
                    "fence wait timed out (GPU hang?)".to_string(),
                )),
                Err(e) => Err(Error::BackendError(format!(
                    "Failed to wait for fence: {:?}",
                    e
                ))),
            }
        }
    }

    fn reset_fence(&self, fence: &Arc<dyn EngineFence>) -> Result<()> {
        let fence = downcast::<Fence>(fence.as_any(), "fence")?;
        unsafe {
            self.ctx
                .device
                .reset_fences(&[fence.fence])
                .map_err(|e| Error::BackendError(format!("Failed to reset fence: {:?}", e)))
        }
    }

    fn submit(
        &self,
        cmd: &dyn EngineCommandList,
        wait: &Arc<dyn EngineSemaphore>,
        signal: &Arc<dyn EngineSemaphore>,
        fence: &Arc<dyn EngineFence>,
    ) -> Result<()> {
        let cmd = downcast::<CommandList>(cmd.as_any(), "command list")?;
        let wait = downcast::<Semaphore>(wait.as_any(), "semaphore")?;
        let signal = downcast::<Semaphore>(signal.as_any(), "semaphore")?;
        let fence = downcast::<Fence>(fence.as_any(), "fence")?;

        let wait_semaphores = [wait.semaphore];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [cmd.command_buffer];
        let signal_semaphores = [signal.semaphore];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.queue, &[submit_info], fence.fence)
                .map_err(|e| Error::BackendError(format!("Failed to submit queue: {:?}", e)))
        }
    }

    fn composite_glyphs(
        &self,
        pipeline: &Arc<dyn EnginePipeline>,
        atlas: &Arc<dyn EngineTexture>,
        overlay: &Arc<dyn EngineTexture>,
        placements: &Arc<dyn EngineBuffer>,
        glyph_count: u32,
        bg_color: [f32; 4],
        text_color: [f32; 4],
    ) -> Result<()> {
        let pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;
        let atlas = downcast::<Texture>(atlas.as_any(), "texture")?;
        let overlay = downcast::<Texture>(overlay.as_any(), "texture")?;
        let placements = downcast::<Buffer>(placements.as_any(), "buffer")?;
        let bindings = pipeline
            .bindings
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("compute pipeline has no bindings".to_string()))?;

        let atlas_info = [vk::DescriptorImageInfo {
            sampler: vk::Sampler::null(), // immutable sampler in the layout
            image_view: atlas.view,
            image_layout: vk::ImageLayout::GENERAL,
        }];
        let overlay_info = [vk::DescriptorImageInfo {
            sampler: vk::Sampler::null(),
            image_view: overlay.view,
            image_layout: vk::ImageLayout::GENERAL,
        }];
        let placement_info = [vk::DescriptorBufferInfo {
            buffer: placements.buffer,
            offset: 0,
            range: vk::WHOLE_SIZE,
        }];
        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(bindings.set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&atlas_info),
            vk::WriteDescriptorSet::default()
                .dst_set(bindings.set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .image_info(&overlay_info),
            vk::WriteDescriptorSet::default()
                .dst_set(bindings.set)
                .dst_binding(2)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .buffer_info(&placement_info),
        ];

        let push = GlyphBlitPush {
            bg_color,
            text_color,
            glyph_count,
            _pad: [0; 3],
        };

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }

        let (vk_pipeline, layout, set) = (pipeline.pipeline, pipeline.layout, bindings.set);
        self.ctx.one_shot(|device, command_buffer| unsafe {
            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::COMPUTE, vk_pipeline);
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::COMPUTE,
                layout,
                0,
                &[set],
                &[],
            );
            device.cmd_push_constants(
                command_buffer,
                layout,
                vk::ShaderStageFlags::COMPUTE,
                0,
                bytemuck::bytes_of(&push),
            );
            // One workgroup per glyph; threads stride over the glyph's texels
            device.cmd_dispatch(command_buffer, glyph_count, 1, 1);
        })
    }

    fn depth_format(&self) -> TextureFormat {
        self.ctx.depth_format
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| Error::BackendError(format!("Failed to wait idle: {:?}", e)))
        }
    }
}
