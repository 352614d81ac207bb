/// GpuContext - shared GPU state for all Vulkan objects
///
/// Owns the instance, surface, logical device, queue, memory allocator and
/// the reusable command pool for one-shot upload/transition work. Every
/// resource wrapper holds an `Arc<GpuContext>`, so the context outlives all
/// of them and tears the API objects down in the right order.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use particle_view_engine::device::TextureFormat;
use particle_view_engine::{engine_error, engine_info, Error, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use winit::window::Window;

const SOURCE: &str = "particle_view::vulkan";

/// Shared GPU context for all Vulkan resources
pub struct GpuContext {
    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,

    /// Vulkan logical device
    pub(crate) device: ash::Device,

    /// Single queue used for graphics, present and uploads
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,

    /// Window surface
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,

    /// GPU memory allocator (ManuallyDrop so it is released before the
    /// device is destroyed)
    pub(crate) allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Reusable command pool for one-shot upload operations. The mutex also
    /// serializes queue access for those submissions.
    upload_command_pool: Mutex<vk::CommandPool>,

    /// Depth format probed at startup
    pub(crate) depth_format: TextureFormat,
    pub(crate) vk_depth_format: vk::Format,

    #[cfg(feature = "vulkan-validation")]
    debug: Option<crate::debug::DebugMessenger>,
}

impl GpuContext {
    /// Bring up the full Vulkan context against a window
    pub fn new(window: &Window) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                Error::InitializationFailed(format!("Failed to load Vulkan: {}", e))
            })?;

            // Create Instance
            let app_info = vk::ApplicationInfo::default()
                .application_name(c"particle_view")
                .application_version(vk::make_api_version(0, 0, 1, 0))
                .engine_name(c"ParticleView")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle().map_err(|e| {
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            #[allow(unused_mut)]
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {:?}",
                            e
                        ))
                    })?
                    .to_vec();

            #[cfg(feature = "vulkan-validation")]
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());

            #[cfg(feature = "vulkan-validation")]
            let layer_names = vec![c"VK_LAYER_KHRONOS_validation".as_ptr()];
            #[cfg(not(feature = "vulkan-validation"))]
            let layer_names: Vec<*const std::ffi::c_char> = Vec::new();

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!(SOURCE, "Failed to create instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            #[cfg(feature = "vulkan-validation")]
            let debug = crate::debug::DebugMessenger::install(&entry, &instance);

            // Create Surface
            let window_handle = window.window_handle().map_err(|e| {
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick a physical device with a queue family doing both graphics
            // and present on this surface
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            let (physical_device, queue_family) = physical_devices
                .into_iter()
                .find_map(|physical_device| {
                    let families =
                        instance.get_physical_device_queue_family_properties(physical_device);
                    families.iter().enumerate().find_map(|(index, family)| {
                        let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
                        let present = surface_loader
                            .get_physical_device_surface_support(
                                physical_device,
                                index as u32,
                                surface,
                            )
                            .unwrap_or(false);
                        (graphics && present).then_some((physical_device, index as u32))
                    })
                })
                .ok_or_else(|| {
                    Error::InitializationFailed(
                        "No Vulkan-capable GPU with a graphics+present queue found".to_string(),
                    )
                })?;

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to create device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let queue = device.get_device_queue(queue_family, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // Command pool for one-shot upload operations
            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(
                    vk::CommandPoolCreateFlags::TRANSIENT
                        | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                );
            let upload_command_pool =
                device.create_command_pool(&pool_create_info, None).map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
                })?;

            let (depth_format, vk_depth_format) =
                find_depth_format(&instance, physical_device)?;

            engine_info!(SOURCE, "Vulkan context ready (depth format {:?})", depth_format);

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                queue,
                queue_family,
                surface,
                surface_loader,
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
                upload_command_pool: Mutex::new(upload_command_pool),
                depth_format,
                vk_depth_format,
                #[cfg(feature = "vulkan-validation")]
                debug,
            })
        }
    }

    /// Record and submit a one-shot command buffer, blocking until the GPU
    /// finishes it. Used for uploads, clears and layout transitions.
    pub(crate) fn one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        unsafe {
            // Holding the pool lock also serializes queue access for
            // these out-of-frame submissions.
            let pool = self.upload_command_pool.lock().unwrap();

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| Error::BackendError(format!("Failed to allocate command buffer: {:?}", e)))?
                [0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;

            record(&self.device, command_buffer);

            self.device.end_command_buffer(command_buffer).map_err(|e| {
                Error::BackendError(format!("Failed to end command buffer: {:?}", e))
            })?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            let result = self
                .device
                .queue_submit(self.queue, &[submit_info], vk::Fence::null())
                .map_err(|e| Error::BackendError(format!("Failed to submit upload: {:?}", e)))
                .and_then(|_| {
                    self.device.queue_wait_idle(self.queue).map_err(|e| {
                        Error::BackendError(format!("Failed to wait for upload: {:?}", e))
                    })
                });

            self.device.free_command_buffers(*pool, &command_buffers);
            result
        }
    }

    /// Record an image layout transition into `command_buffer`
    pub(crate) fn transition_image_layout(
        device: &ash::Device,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        aspect: vk::ImageAspectFlags,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE);

        unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

/// Probe for a depth format with optimal-tiling depth-attachment support
fn find_depth_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<(TextureFormat, vk::Format)> {
    let candidates = [
        (TextureFormat::D32_SFLOAT, vk::Format::D32_SFLOAT),
        (TextureFormat::D32_SFLOAT_S8_UINT, vk::Format::D32_SFLOAT_S8_UINT),
        (TextureFormat::D24_UNORM_S8_UINT, vk::Format::D24_UNORM_S8_UINT),
    ];

    for (format, vk_format) in candidates {
        let props =
            unsafe { instance.get_physical_device_format_properties(physical_device, vk_format) };
        if props
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        {
            return Ok((format, vk_format));
        }
    }

    Err(Error::InitializationFailed(
        "No supported depth format found".to_string(),
    ))
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            let pool = *self.upload_command_pool.lock().unwrap();
            self.device.destroy_command_pool(pool, None);

            // Free all GPU memory while the device is still valid
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            #[cfg(feature = "vulkan-validation")]
            if let Some(debug) = self.debug.take() {
                debug.destroy();
            }

            self.instance.destroy_instance(None);
        }
    }
}
