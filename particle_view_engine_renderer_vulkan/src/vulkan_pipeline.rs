/// Pipeline - Vulkan implementation of the engine Pipeline trait
///
/// Covers both the graphics pipelines (point/line/triangle layers) and the
/// glyph-blit compute pipeline. Pipelines that bind images carry their own
/// descriptor machinery: an immutable-sampler set layout and one descriptor
/// set allocated from the shared pool.

use ash::vk;
use particle_view_engine::device::Pipeline as EnginePipeline;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Shared descriptor pool, kept alive by every pipeline that allocated a
/// set from it (sets are freed back on pipeline drop)
pub(crate) struct DescriptorPool {
    ctx: Arc<GpuContext>,
    pub(crate) pool: vk::DescriptorPool,
}

impl DescriptorPool {
    pub(crate) fn new(ctx: Arc<GpuContext>, pool: vk::DescriptorPool) -> Self {
        Self { ctx, pool }
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Descriptor machinery for pipelines that bind images
pub(crate) struct PipelineBindings {
    pub(crate) pool: Arc<DescriptorPool>,
    pub(crate) set_layout: vk::DescriptorSetLayout,
    pub(crate) set: vk::DescriptorSet,
    pub(crate) sampler: vk::Sampler,
}

/// Vulkan pipeline implementation
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    label: &'static str,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    pub(crate) bind_point: vk::PipelineBindPoint,
    pub(crate) bindings: Option<PipelineBindings>,
}

impl Pipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        label: &'static str,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        bind_point: vk::PipelineBindPoint,
        bindings: Option<PipelineBindings>,
    ) -> Self {
        Self {
            ctx,
            label,
            pipeline,
            layout,
            bind_point,
            bindings,
        }
    }
}

impl EnginePipeline for Pipeline {
    fn label(&self) -> &'static str {
        self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            if let Some(bindings) = self.bindings.take() {
                self.ctx
                    .device
                    .free_descriptor_sets(bindings.pool.pool, &[bindings.set])
                    .ok();
                self.ctx
                    .device
                    .destroy_descriptor_set_layout(bindings.set_layout, None);
                self.ctx.device.destroy_sampler(bindings.sampler, None);
            }
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
