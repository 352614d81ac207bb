/// Texture - Vulkan implementation of the engine Texture trait
///
/// Images live in the GENERAL layout for their whole lifetime: the glyph
/// compositor writes the overlay as a storage image and the overlay pipeline
/// samples it in the same layout, so there is nothing to gain from per-pass
/// transitions here.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use particle_view_engine::device::{Texture as EngineTexture, TextureFormat};
use particle_view_engine::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_device::texture_format_to_vk;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    width: u32,
    height: u32,
    format: TextureFormat,
    /// Bytes per texel, for upload staging
    texel_size: u64,
}

impl Texture {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        width: u32,
        height: u32,
        format: TextureFormat,
        texel_size: u64,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            allocation: Some(allocation),
            width,
            height,
            format,
            texel_size,
        }
    }
}

impl EngineTexture for Texture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn fill(&self, color: [f32; 4]) -> Result<()> {
        let image = self.image;
        self.ctx.one_shot(|device, command_buffer| {
            let clear_color = vk::ClearColorValue { float32: color };
            let range = vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            };
            unsafe {
                device.cmd_clear_color_image(
                    command_buffer,
                    image,
                    vk::ImageLayout::GENERAL,
                    &clear_color,
                    &[range],
                );
            }
        })
    }

    fn upload(&self, pixels: &[u8]) -> Result<()> {
        let expected = self.width as u64 * self.height as u64 * self.texel_size;
        if pixels.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "texture upload size mismatch: {} != {}",
                pixels.len(),
                expected
            )));
        }

        // Stage through a host-visible buffer, then copy on the queue.
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(expected)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let staging = self
                .ctx
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create staging buffer: {:?}", e)))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(staging);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: "texture_staging",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| Error::OutOfMemory)?;

            self.ctx
                .device
                .bind_buffer_memory(staging, allocation.memory(), allocation.offset())
                .map_err(|e| Error::BackendError(format!("Failed to bind staging memory: {:?}", e)))?;

            let mapped = allocation
                .mapped_ptr()
                .ok_or_else(|| Error::BackendError("staging buffer not mapped".to_string()))?
                .as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(pixels.as_ptr(), mapped, pixels.len());

            let image = self.image;
            let (width, height) = (self.width, self.height);
            let copy_result = self.ctx.one_shot(|device, command_buffer| {
                let region = vk::BufferImageCopy::default()
                    .buffer_offset(0)
                    .image_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .image_extent(vk::Extent3D {
                        width,
                        height,
                        depth: 1,
                    });
                unsafe {
                    device.cmd_copy_buffer_to_image(
                        command_buffer,
                        staging,
                        image,
                        vk::ImageLayout::GENERAL,
                        &[region],
                    );
                }
            });

            // one_shot waited for the queue, so the staging buffer is free.
            self.ctx.allocator.lock().unwrap().free(allocation).ok();
            self.ctx.device.destroy_buffer(staging, None);

            copy_result
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

/// Map a color format to its texel size in bytes
pub(crate) fn texel_size(format: TextureFormat) -> u64 {
    match format {
        TextureFormat::R8_UNORM => 1,
        _ => 4,
    }
}

/// Build an image view over a whole 2D image
pub(crate) fn create_view(
    device: &ash::Device,
    image: vk::Image,
    format: TextureFormat,
    aspect: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(texture_format_to_vk(format))
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device
            .create_image_view(&create_info, None)
            .map_err(|e| Error::BackendError(format!("Failed to create image view: {:?}", e)))
    }
}
