/// VkContext - instance, surface, device and queue, created once per process
///
/// Replaces the tutorial-style global handles with one explicit context
/// object that every other component borrows. Also owns a transient command
/// pool used for one-shot staging uploads, so uploads never depend on the
/// swapchain manager's per-frame pool (which is destroyed on recreation).

use crate::error::{Error, Result};
use crate::{render_debug, render_error, render_info};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// Always the first enumerated physical device. Documented simplification
/// carried over from the source material; tests assert on it.
pub const PHYSICAL_DEVICE_INDEX: usize = 0;

/// Always queue family 0, used for both graphics and present. The family
/// is still verified against the surface at init and a failure is fatal.
pub const QUEUE_FAMILY_INDEX: u32 = 0;

/// Shared Vulkan context for the whole process
///
/// Owns everything with process lifetime: entry, instance, surface,
/// logical device, the single graphics/present queue, and the upload
/// command pool. Swapchain-dependent resources live in
/// [`SwapchainManager`](crate::SwapchainManager) instead.
pub struct VkContext {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    /// Vulkan instance
    pub(crate) instance: ash::Instance,

    /// Window surface, fixed for the process lifetime
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,

    /// Selected physical device (index [`PHYSICAL_DEVICE_INDEX`])
    pub(crate) physical_device: vk::PhysicalDevice,
    /// Cached memory properties for memory-type selection
    pub(crate) memory_properties: vk::PhysicalDeviceMemoryProperties,

    /// Logical device
    pub device: Arc<ash::Device>,
    /// Graphics/present queue (family [`QUEUE_FAMILY_INDEX`], index 0)
    pub graphics_queue: vk::Queue,

    /// Reusable command pool for one-shot upload operations
    pub(crate) upload_command_pool: vk::CommandPool,
}

impl VkContext {
    /// Create the full Vulkan context for a window
    ///
    /// Enumerates instance layers/extensions and physical-device
    /// capabilities as diagnostic log output; selection itself follows the
    /// fixed policy constants. Fails with `InitializationFailed` if queue
    /// family [`QUEUE_FAMILY_INDEX`] cannot present to the window surface.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                render_error!("nova::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            log_instance_diagnostics(&entry);

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Nova Demo")
                .application_version(vk::make_api_version(0, 0, 1, 0))
                .engine_name(c"Nova")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_0);

            let display_handle = window.display_handle().map_err(|e| {
                render_error!("nova::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        render_error!("nova::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {}",
                            e
                        ))
                    })?
                    .to_vec();

            #[cfg(feature = "vulkan-validation")]
            let layer_names = vec![c"VK_LAYER_KHRONOS_validation".as_ptr()];
            #[cfg(not(feature = "vulkan-validation"))]
            let layer_names: Vec<*const std::os::raw::c_char> = vec![];

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                render_error!("nova::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let window_handle = window.window_handle().map_err(|e| {
                render_error!("nova::vulkan", "Failed to get window handle: {}", e);
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
                render_error!("nova::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                render_error!("nova::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            for (index, &physical_device) in physical_devices.iter().enumerate() {
                log_physical_device_diagnostics(
                    &instance,
                    &surface_loader,
                    physical_device,
                    surface,
                    index,
                );
            }

            let physical_device = physical_devices
                .get(PHYSICAL_DEVICE_INDEX)
                .copied()
                .ok_or_else(|| {
                    render_error!("nova::vulkan", "No Vulkan-capable GPU found");
                    Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
                })?;

            // The fixed queue family must be able to draw and present.
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_capable = queue_families
                .get(QUEUE_FAMILY_INDEX as usize)
                .map(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .unwrap_or(false);
            if !graphics_capable {
                render_error!(
                    "nova::vulkan",
                    "Queue family {} does not support graphics",
                    QUEUE_FAMILY_INDEX
                );
                return Err(Error::InitializationFailed(format!(
                    "Queue family {} does not support graphics",
                    QUEUE_FAMILY_INDEX
                )));
            }

            let present_supported = surface_loader
                .get_physical_device_surface_support(
                    physical_device,
                    QUEUE_FAMILY_INDEX,
                    surface,
                )
                .unwrap_or(false);
            if !present_supported {
                render_error!(
                    "nova::vulkan",
                    "Surface is not supported by queue family {} on the selected device",
                    QUEUE_FAMILY_INDEX
                );
                return Err(Error::InitializationFailed(format!(
                    "Surface not supported by queue family {}",
                    QUEUE_FAMILY_INDEX
                )));
            }

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(QUEUE_FAMILY_INDEX)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = Arc::new(
                instance
                    .create_device(physical_device, &device_create_info, None)
                    .map_err(|e| {
                        render_error!("nova::vulkan", "Failed to create logical device: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                    })?,
            );

            let graphics_queue = device.get_device_queue(QUEUE_FAMILY_INDEX, 0);
            let memory_properties =
                instance.get_physical_device_memory_properties(physical_device);

            // Transient pool for one-shot staging copies
            let pool_info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::TRANSIENT)
                .queue_family_index(QUEUE_FAMILY_INDEX);
            let upload_command_pool =
                device.create_command_pool(&pool_info, None).map_err(|e| {
                    render_error!("nova::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!(
                        "Failed to create upload command pool: {:?}",
                        e
                    ))
                })?;

            render_info!("nova::vulkan", "Vulkan context initialized");

            Ok(Self {
                _entry: entry,
                instance,
                surface,
                surface_loader,
                physical_device,
                memory_properties,
                device,
                graphics_queue,
                upload_command_pool,
            })
        }
    }

    /// Cached memory properties of the selected physical device
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// Current surface capabilities (queried fresh on every call)
    pub fn surface_capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    crate::render_err!(
                        "nova::vulkan",
                        "Failed to get surface capabilities: {:?}",
                        e
                    )
                })
        }
    }
}

impl Drop for VkContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_command_pool(self.upload_command_pool, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Dump instance layers and extensions to the log
///
/// Diagnostic output only; nothing here feeds selection logic.
fn log_instance_diagnostics(entry: &ash::Entry) {
    unsafe {
        match entry.enumerate_instance_layer_properties() {
            Ok(layers) => {
                render_debug!("nova::vulkan", "Instance layers: {}", layers.len());
                for layer in &layers {
                    let name = layer
                        .layer_name_as_c_str()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|_| "<invalid>".to_string());
                    render_debug!(
                        "nova::vulkan",
                        "  layer {} (spec {}, impl {})",
                        name,
                        layer.spec_version,
                        layer.implementation_version
                    );
                }
            }
            Err(e) => render_debug!("nova::vulkan", "Failed to enumerate layers: {:?}", e),
        }

        match entry.enumerate_instance_extension_properties(None) {
            Ok(extensions) => {
                render_debug!("nova::vulkan", "Instance extensions: {}", extensions.len());
                for ext in &extensions {
                    let name = ext
                        .extension_name_as_c_str()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|_| "<invalid>".to_string());
                    render_debug!("nova::vulkan", "  extension {} (spec {})", name, ext.spec_version);
                }
            }
            Err(e) => render_debug!("nova::vulkan", "Failed to enumerate extensions: {:?}", e),
        }
    }
}

/// Dump one physical device's properties, queue families, and surface
/// capabilities to the log
fn log_physical_device_diagnostics(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    index: usize,
) {
    unsafe {
        let props = instance.get_physical_device_properties(physical_device);
        let name = props
            .device_name_as_c_str()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<invalid>".to_string());
        render_debug!(
            "nova::vulkan",
            "Device {}: {} (API {}.{}.{}, driver {}, type {:?})",
            index,
            name,
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version),
            props.driver_version,
            props.device_type
        );

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        for (family_index, family) in queue_families.iter().enumerate() {
            render_debug!(
                "nova::vulkan",
                "  queue family {}: flags {:?}, count {}",
                family_index,
                family.queue_flags,
                family.queue_count
            );
        }

        if let Ok(caps) =
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)
        {
            render_debug!(
                "nova::vulkan",
                "  surface: images [{}, {}], extent {}x{} (min {}x{}, max {}x{})",
                caps.min_image_count,
                caps.max_image_count,
                caps.current_extent.width,
                caps.current_extent.height,
                caps.min_image_extent.width,
                caps.min_image_extent.height,
                caps.max_image_extent.width,
                caps.max_image_extent.height
            );
        }
    }
}
