/// Swapchain - Vulkan implementation of the engine Swapchain trait
///
/// Owns the VkSwapchainKHR and its presentable images, maps the two soft
/// surface conditions (`ERROR_OUT_OF_DATE_KHR`, `SUBOPTIMAL_KHR`) to the
/// engine's `Acquire`/`Present` outcomes, and recreates itself in place on
/// resize (reusing the old swapchain handle for smoother transitions).

use ash::vk;
use particle_view_engine::device::{
    Acquire, Present, RenderTarget as EngineRenderTarget, Semaphore as EngineSemaphore,
    Swapchain as EngineSwapchain, TextureFormat,
};
use particle_view_engine::{engine_info, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sync::Semaphore;
use crate::vulkan_texture::create_view;

const SOURCE: &str = "particle_view::vulkan";

/// Vulkan swapchain implementation
pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: TextureFormat,
    vk_format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: [u32; 2],
}

fn surface_format_to_engine(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        _ => None,
    }
}

fn downcast_semaphore(semaphore: &Arc<dyn EngineSemaphore>) -> Result<&Semaphore> {
    semaphore
        .as_any()
        .downcast_ref::<Semaphore>()
        .ok_or_else(|| Error::InvalidResource("semaphore from another backend".to_string()))
}

impl VulkanSwapchain {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let surface_capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to get surface capabilities: {:?}",
                        e
                    ))
                })?;

            let surface_formats = ctx
                .surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            // Prefer sRGB, but accept anything the engine can name
            let surface_format = surface_formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .or_else(|| {
                    surface_formats
                        .iter()
                        .find(|f| surface_format_to_engine(f.format).is_some())
                })
                .ok_or_else(|| {
                    Error::InitializationFailed("No usable surface format".to_string())
                })?;

            let format = surface_format_to_engine(surface_format.format)
                .expect("surface format filtered above");

            let extent = surface_capabilities.current_extent;
            let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

            let (swapchain, images) = create_swapchain(
                &ctx,
                &swapchain_loader,
                surface_format.format,
                surface_format.color_space,
                &surface_capabilities,
                extent,
                vk::SwapchainKHR::null(),
            )?;

            engine_info!(
                SOURCE,
                "swapchain created: {} images, {}x{}, {:?}",
                images.len(),
                extent.width,
                extent.height,
                format
            );

            Ok(Self {
                ctx,
                swapchain_loader,
                swapchain,
                images,
                format,
                vk_format: surface_format.format,
                color_space: surface_format.color_space,
                extent: [extent.width, extent.height],
            })
        }
    }
}

/// Create the swapchain object and fetch its images
fn create_swapchain(
    ctx: &GpuContext,
    loader: &ash::khr::swapchain::Device,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    capabilities: &vk::SurfaceCapabilitiesKHR,
    extent: vk::Extent2D,
    old_swapchain: vk::SwapchainKHR,
) -> Result<(vk::SwapchainKHR, Vec<vk::Image>)> {
    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count = image_count.min(capabilities.max_image_count);
    }

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(ctx.surface)
        .min_image_count(image_count)
        .image_format(format)
        .image_color_space(color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(vk::PresentModeKHR::FIFO)
        .clipped(true)
        .old_swapchain(old_swapchain);

    unsafe {
        let swapchain = loader
            .create_swapchain(&create_info, None)
            .map_err(|e| Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e)))?;
        let images = loader.get_swapchain_images(swapchain).map_err(|e| {
            Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
        })?;
        Ok((swapchain, images))
    }
}

impl EngineSwapchain for VulkanSwapchain {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> [u32; 2] {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn acquire(&mut self, image_available: &Arc<dyn EngineSemaphore>) -> Result<Acquire> {
        let semaphore = downcast_semaphore(image_available)?;
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore.semaphore,
                vk::Fence::null(),
            ) {
                Ok((index, false)) => Ok(Acquire::Ready(index)),
                Ok((index, true)) => Ok(Acquire::Suboptimal(index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Acquire::OutOfDate),
                Err(e) => Err(Error::BackendError(format!(
                    "Failed to acquire swapchain image: {:?}",
                    e
                ))),
            }
        }
    }

    fn present(
        &mut self,
        image_index: u32,
        render_finished: &Arc<dyn EngineSemaphore>,
    ) -> Result<Present> {
        let semaphore = downcast_semaphore(render_finished)?;
        let wait_semaphores = [semaphore.semaphore];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self
                .swapchain_loader
                .queue_present(self.ctx.queue, &present_info)
            {
                Ok(false) => Ok(Present::Presented),
                Ok(true) => Ok(Present::Suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Present::OutOfDate),
                Err(e) => Err(Error::BackendError(format!("Failed to present: {:?}", e))),
            }
        }
    }

    fn recreate(&mut self) -> Result<()> {
        unsafe {
            let surface_capabilities = self
                .ctx
                .surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.ctx.surface)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to get surface capabilities: {:?}",
                        e
                    ))
                })?;

            // current_extent == u32::MAX means the surface lets us choose;
            // keep the previous size clamped into the allowed range.
            let extent = if surface_capabilities.current_extent.width != u32::MAX {
                surface_capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: self.extent[0].clamp(
                        surface_capabilities.min_image_extent.width,
                        surface_capabilities.max_image_extent.width,
                    ),
                    height: self.extent[1].clamp(
                        surface_capabilities.min_image_extent.height,
                        surface_capabilities.max_image_extent.height,
                    ),
                }
            };

            let old_swapchain = self.swapchain;
            let (swapchain, images) = create_swapchain(
                &self.ctx,
                &self.swapchain_loader,
                self.vk_format,
                self.color_space,
                &surface_capabilities,
                extent,
                old_swapchain,
            )?;

            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            self.swapchain = swapchain;
            self.images = images;
            self.extent = [extent.width, extent.height];

            engine_info!(
                SOURCE,
                "swapchain recreated: {} images, {}x{}",
                self.images.len(),
                extent.width,
                extent.height
            );
            Ok(())
        }
    }

    fn color_target(&self, image_index: u32) -> Result<Arc<dyn EngineRenderTarget>> {
        let image = *self
            .images
            .get(image_index as usize)
            .ok_or_else(|| Error::InvalidResource("swap image index out of range".to_string()))?;
        let view = create_view(
            &self.ctx.device,
            image,
            self.format,
            vk::ImageAspectFlags::COLOR,
        )?;
        Ok(Arc::new(RenderTarget::swapchain_view(
            self.ctx.clone(),
            view,
            self.extent[0],
            self.extent[1],
            self.format,
        )))
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
