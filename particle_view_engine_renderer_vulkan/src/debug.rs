/// Vulkan debug messenger - routes validation layer messages through the
/// engine's logging system and keeps per-severity counters.
///
/// Compiled only with the `vulkan-validation` feature.

use ash::vk;
use particle_view_engine::{engine_debug, engine_error, engine_warn};
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};

const SOURCE: &str = "particle_view::vulkan::validation";

/// Thread-safe validation statistics
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
}

static ERRORS: AtomicU32 = AtomicU32::new(0);
static WARNINGS: AtomicU32 = AtomicU32::new(0);
static INFO: AtomicU32 = AtomicU32::new(0);

/// Snapshot of the validation message counters
pub fn validation_stats() -> ValidationStats {
    ValidationStats {
        errors: ERRORS.load(Ordering::Relaxed),
        warnings: WARNINGS.load(Ordering::Relaxed),
        info: INFO.load(Ordering::Relaxed),
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() || (*callback_data).p_message.is_null() {
        "<no message>".to_string()
    } else {
        CStr::from_ptr((*callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        ERRORS.fetch_add(1, Ordering::Relaxed);
        engine_error!(SOURCE, "{}", message);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        WARNINGS.fetch_add(1, Ordering::Relaxed);
        engine_warn!(SOURCE, "{}", message);
    } else {
        INFO.fetch_add(1, Ordering::Relaxed);
        engine_debug!(SOURCE, "{}", message);
    }

    vk::FALSE
}

/// Installed debug-utils messenger
pub(crate) struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    /// Install the messenger; returns None (logged) if creation fails, since
    /// missing validation support should not abort startup.
    pub(crate) fn install(entry: &ash::Entry, instance: &ash::Instance) -> Option<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        match unsafe { loader.create_debug_utils_messenger(&create_info, None) } {
            Ok(messenger) => Some(Self { loader, messenger }),
            Err(e) => {
                engine_warn!(SOURCE, "debug messenger unavailable: {:?}", e);
                None
            }
        }
    }

    pub(crate) fn destroy(self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}
