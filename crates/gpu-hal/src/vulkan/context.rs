//! Device context: instance, physical device, logical device, queue and
//! command pool.
//!
//! [`DeviceContext`] is created once and dropped last. Every other Vulkan
//! object in this crate borrows it, so the borrow checker rejects teardown in
//! the wrong order.
//!
//! When validation is requested and `VK_LAYER_KHRONOS_validation` is present,
//! a `VK_EXT_debug_utils` messenger routes layer output to `tracing` (target
//! `vulkan_validation`) and counts errors and warnings. Synchronization
//! validation is switched on when `VK_EXT_validation_features` is exposed.

use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr};
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU64, Ordering};

use ash::vk;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::error::VulkanError;
use super::queue::CommandPool;

/// The standard Khronos validation layer name.
const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Priority of the single compute queue.
const QUEUE_PRIORITY: f32 = 0.0;

/// Options for [`DeviceContext::new`].
#[derive(Clone, Debug)]
pub struct ContextOptions {
    /// Request the Khronos validation layer and a debug messenger.
    pub validation: bool,
    /// Also request synchronization validation when the layer supports it.
    pub sync_validation: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            validation: cfg!(debug_assertions),
            sync_validation: true,
        }
    }
}

/// Counts of validation messages received by the debug messenger.
#[derive(Debug, Default)]
struct ValidationLog {
    errors: AtomicU64,
    warnings: AtomicU64,
}

impl ValidationLog {
    fn record(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            self.errors.fetch_add(1, Ordering::Relaxed);
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            self.warnings.fetch_add(1, Ordering::Relaxed);
        }
    }
}

struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

/// Objects created after the instance, torn down together if any step fails.
struct OpenedDevice {
    physical_device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    queue_family_index: u32,
    device: ash::Device,
    command_pool: CommandPool,
}

/// The device, its single compute queue and the command pool for that queue.
///
/// The queue and the command pool are externally synchronized Vulkan objects,
/// so both sit behind a [`Mutex`]; sharing `&DeviceContext` is race-free.
pub struct DeviceContext {
    /// The ash entry point (Vulkan loader). Must outlive the instance.
    _entry: ash::Entry,
    instance: ash::Instance,
    debug_messenger: Option<DebugMessenger>,
    /// Target of the messenger's user-data pointer; boxed so the address is stable.
    validation_log: Box<ValidationLog>,
    physical_device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    device: ash::Device,
    queue_family_index: u32,
    queue: Mutex<vk::Queue>,
    /// Destroyed by hand in `Drop`, before the device.
    command_pool: ManuallyDrop<Mutex<CommandPool>>,
}

impl DeviceContext {
    /// Load Vulkan, create a headless instance and open the first device that
    /// has a compute queue family.
    ///
    /// # Errors
    ///
    /// [`VulkanError::NoDevice`] when no physical device exists,
    /// [`VulkanError::NoComputeQueue`] when none of them can run compute work.
    pub fn new(options: &ContextOptions) -> Result<Self, VulkanError> {
        let entry = unsafe {
            // SAFETY: Loading the system Vulkan loader. The Entry is stored in
            // the context next to every object created from it.
            ash::Entry::load()
        }
        .map_err(|e| VulkanError::LoaderUnavailable(e.to_string()))?;

        info!("Vulkan loader initialized");

        let enable_validation = options.validation && has_validation_layer(&entry);
        if options.validation && !enable_validation {
            warn!("Validation layer requested but not available, running without validation");
        }
        let debug_utils =
            enable_validation && has_instance_extension(&entry, None, ash::ext::debug_utils::NAME);
        let sync_validation = enable_validation
            && options.sync_validation
            && has_instance_extension(
                &entry,
                Some(VALIDATION_LAYER_NAME),
                ash::ext::validation_features::NAME,
            );

        let instance = create_instance(&entry, enable_validation, debug_utils, sync_validation)?;
        info!(
            validation = enable_validation,
            sync_validation = sync_validation,
            "Vulkan instance created"
        );

        let validation_log = Box::new(ValidationLog::default());
        let debug_messenger = if debug_utils {
            match create_debug_messenger(&entry, &instance, &validation_log) {
                Ok(messenger) => {
                    debug!("Vulkan debug messenger created");
                    Some(messenger)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to create debug messenger, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        let opened = match open_device(&instance) {
            Ok(opened) => opened,
            Err(e) => {
                unsafe {
                    // SAFETY: Nothing else was created from the instance; the
                    // messenger goes first, then the instance.
                    if let Some(dm) = &debug_messenger {
                        dm.loader.destroy_debug_utils_messenger(dm.messenger, None);
                    }
                    instance.destroy_instance(None);
                }
                return Err(e);
            }
        };

        let queue = unsafe {
            // SAFETY: The device was created with exactly one queue in this family.
            opened.device.get_device_queue(opened.queue_family_index, 0)
        };

        let ctx = Self {
            _entry: entry,
            instance,
            debug_messenger,
            validation_log,
            physical_device: opened.physical_device,
            properties: opened.properties,
            memory_properties: opened.memory_properties,
            device: opened.device,
            queue_family_index: opened.queue_family_index,
            queue: Mutex::new(queue),
            command_pool: ManuallyDrop::new(Mutex::new(opened.command_pool)),
        };
        ctx.log_device_info();
        Ok(ctx)
    }

    // -- Accessors --

    /// Returns a reference to the ash Instance.
    #[inline]
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    #[inline]
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// Returns the physical device memory properties (heaps, memory types).
    #[inline]
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// Returns a reference to the logical device.
    #[inline]
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Lock the command pool. Allocation and freeing of command buffers must
    /// happen under this lock.
    pub fn command_pool(&self) -> MutexGuard<'_, CommandPool> {
        self.command_pool.lock()
    }

    /// Whether a debug messenger is installed (validation layer active).
    #[inline]
    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Number of validation errors reported since the context was created.
    pub fn validation_error_count(&self) -> u64 {
        self.validation_log.errors.load(Ordering::Relaxed)
    }

    /// Number of validation warnings reported since the context was created.
    pub fn validation_warning_count(&self) -> u64 {
        self.validation_log.warnings.load(Ordering::Relaxed)
    }

    /// Returns the GPU device name.
    pub fn device_name(&self) -> String {
        decode_device_name(&self.properties.device_name)
    }

    /// Returns the Vulkan API version string of the device.
    pub fn api_version_string(&self) -> String {
        let v = self.properties.api_version;
        format!(
            "{}.{}.{}",
            vk::api_version_major(v),
            vk::api_version_minor(v),
            vk::api_version_patch(v),
        )
    }

    /// Submit one command buffer to the compute queue, signalling `fence`.
    pub fn submit(&self, command_buffer: vk::CommandBuffer, fence: vk::Fence) -> Result<(), VulkanError> {
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        let queue = self.queue.lock();

        unsafe {
            // SAFETY: The queue lock is held for the duration of the call. The
            // command buffer is in the executable state and the fence is unsignaled.
            self.device
                .queue_submit(*queue, &[submit_info], fence)
                .map_err(VulkanError::QueueSubmit)
        }
    }

    /// Block until the compute queue is idle.
    pub fn queue_wait_idle(&self) -> Result<(), VulkanError> {
        let queue = self.queue.lock();
        unsafe {
            // SAFETY: The queue lock is held for the duration of the call.
            self.device
                .queue_wait_idle(*queue)
                .map_err(VulkanError::QueueWaitIdle)
        }
    }

    fn log_device_info(&self) {
        info!(
            device = %self.device_name(),
            device_type = ?self.properties.device_type,
            api_version = %self.api_version_string(),
            queue_family = self.queue_family_index,
            "Selected Vulkan physical device"
        );

        let limits = &self.properties.limits;
        debug!(
            max_work_group_count = ?limits.max_compute_work_group_count,
            max_work_group_size = ?limits.max_compute_work_group_size,
            max_work_group_invocations = limits.max_compute_work_group_invocations,
            max_storage_buffer_range = limits.max_storage_buffer_range,
            max_bound_descriptor_sets = limits.max_bound_descriptor_sets,
            non_coherent_atom_size = limits.non_coherent_atom_size,
            "Vulkan compute limits"
        );
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        info!("Destroying device context");

        unsafe {
            // SAFETY: Every borrower of the context is gone. Destruction runs
            // in reverse creation order: wait idle, command pool, device,
            // debug messenger, instance. The pool is not touched again.
            self.device.device_wait_idle().ok();
            ManuallyDrop::drop(&mut self.command_pool);
            self.device.destroy_device(None);

            if let Some(dm) = self.debug_messenger.take() {
                dm.loader.destroy_debug_utils_messenger(dm.messenger, None);
                info!(
                    errors = self.validation_error_count(),
                    warnings = self.validation_warning_count(),
                    "Validation summary"
                );
            }

            self.instance.destroy_instance(None);
        }

        debug!("Device context destroyed");
    }
}

/// Pick the first queue family (by index) that supports compute.
pub fn select_compute_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|f| f.queue_flags.contains(vk::QueueFlags::COMPUTE) && f.queue_count > 0)
        .map(|i| i as u32)
}

/// Pick the first device (by enumeration index) with a compute family.
///
/// `devices` holds the queue families of each enumerated device in order.
/// Returns `(device index, family index)`.
pub fn select_device(devices: &[Vec<vk::QueueFamilyProperties>]) -> Result<(usize, u32), VulkanError> {
    if devices.is_empty() {
        return Err(VulkanError::NoDevice);
    }
    devices
        .iter()
        .enumerate()
        .find_map(|(i, families)| select_compute_family(families).map(|family| (i, family)))
        .ok_or(VulkanError::NoComputeQueue)
}

/// Compare a loader-filled fixed-size name with `name`.
///
/// An array without a terminator never matches.
fn fixed_name_eq(raw: &[c_char], name: &CStr) -> bool {
    let bytes: Vec<u8> = raw.iter().map(|&c| c as u8).collect();
    CStr::from_bytes_until_nul(&bytes).is_ok_and(|found| found == name)
}

fn has_validation_layer(entry: &ash::Entry) -> bool {
    let layers = unsafe {
        // SAFETY: Entry is valid, this enumerates available instance layers.
        entry.enumerate_instance_layer_properties()
    };

    match layers {
        Ok(layers) => layers
            .iter()
            .any(|layer| fixed_name_eq(&layer.layer_name, VALIDATION_LAYER_NAME)),
        Err(e) => {
            warn!(error = ?e, "Failed to enumerate instance layers");
            false
        }
    }
}

fn has_instance_extension(entry: &ash::Entry, layer: Option<&CStr>, name: &CStr) -> bool {
    let extensions = unsafe {
        // SAFETY: Entry is valid; `layer` is a static null-terminated name.
        entry.enumerate_instance_extension_properties(layer)
    };

    extensions.is_ok_and(|extensions| {
        extensions
            .iter()
            .any(|ext| fixed_name_eq(&ext.extension_name, name))
    })
}

/// Create an instance with no surface extensions.
fn create_instance(
    entry: &ash::Entry,
    enable_validation: bool,
    debug_utils: bool,
    sync_validation: bool,
) -> Result<ash::Instance, VulkanError> {
    let app_info = vk::ApplicationInfo::default()
        .application_name(c"headless-compute")
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(c"headless-compute")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let mut layers: Vec<*const c_char> = Vec::new();
    if enable_validation {
        layers.push(VALIDATION_LAYER_NAME.as_ptr());
    }

    let mut extensions: Vec<*const c_char> = Vec::new();
    if debug_utils {
        extensions.push(ash::ext::debug_utils::NAME.as_ptr());
    }
    if sync_validation {
        extensions.push(ash::ext::validation_features::NAME.as_ptr());
    }

    let enabled_features = [vk::ValidationFeatureEnableEXT::SYNCHRONIZATION_VALIDATION];
    let mut validation_features =
        vk::ValidationFeaturesEXT::default().enabled_validation_features(&enabled_features);

    let mut create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions);
    if sync_validation {
        create_info = create_info.push_next(&mut validation_features);
    }

    unsafe {
        // SAFETY: All names are static C strings and the chained structures
        // live until this call returns.
        entry
            .create_instance(&create_info, None)
            .map_err(VulkanError::InstanceCreation)
    }
}

fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    log: &ValidationLog,
) -> Result<DebugMessenger, VulkanError> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);

    let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
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
        .pfn_user_callback(Some(vulkan_debug_callback))
        .user_data(log as *const ValidationLog as *mut c_void);

    let messenger = unsafe {
        // SAFETY: The instance has debug utils enabled. The user-data pointer
        // targets a boxed ValidationLog owned by the context, which is dropped
        // only after the messenger is destroyed.
        loader
            .create_debug_utils_messenger(&messenger_info, None)
            .map_err(VulkanError::DebugMessengerCreation)?
    };

    Ok(DebugMessenger { loader, messenger })
}

/// Select the device and family, then create the logical device and pool.
fn open_device(instance: &ash::Instance) -> Result<OpenedDevice, VulkanError> {
    let physical_devices = unsafe {
        // SAFETY: Instance is valid and was created by us.
        instance.enumerate_physical_devices()
    }
    .map_err(VulkanError::DeviceEnumeration)?;

    info!(count = physical_devices.len(), "Found Vulkan physical devices");

    let families: Vec<Vec<vk::QueueFamilyProperties>> = physical_devices
        .iter()
        .map(|&pd| unsafe {
            // SAFETY: pd was enumerated from this instance.
            instance.get_physical_device_queue_family_properties(pd)
        })
        .collect();
    let (device_index, queue_family_index) = select_device(&families)?;
    let physical_device = physical_devices[device_index];

    let (properties, memory_properties) = unsafe {
        // SAFETY: physical_device was enumerated from this instance.
        (
            instance.get_physical_device_properties(physical_device),
            instance.get_physical_device_memory_properties(physical_device),
        )
    };

    let queue_priorities = [QUEUE_PRIORITY];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(queue_family_index)
        .queue_priorities(&queue_priorities)];
    let device_create_info = vk::DeviceCreateInfo::default().queue_create_infos(&queue_create_infos);

    let device = unsafe {
        // SAFETY: The family index was taken from this device's own family list.
        instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(VulkanError::DeviceCreation)?
    };
    debug!(queue_family = queue_family_index, "Vulkan logical device created");

    let command_pool = match CommandPool::new(&device, queue_family_index) {
        Ok(pool) => pool,
        Err(e) => {
            unsafe {
                // SAFETY: Nothing was created from the device yet.
                device.destroy_device(None);
            }
            return Err(e);
        }
    };

    Ok(OpenedDevice {
        physical_device,
        properties,
        memory_properties,
        queue_family_index,
        device,
        command_pool,
    })
}

/// Routes validation layer messages to `tracing` and counts them.
///
/// # Safety
///
/// Invoked by the validation layer. `p_callback_data` is valid for the call
/// and `user_data` is either null or the context's `ValidationLog`.
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut c_void,
) -> vk::Bool32 {
    if !user_data.is_null() {
        // SAFETY: user_data was set to a ValidationLog that outlives the messenger.
        let log = unsafe { &*(user_data as *const ValidationLog) };
        log.record(message_severity);
    }

    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    // SAFETY: Non-null and valid for the duration of the callback.
    let callback_data = unsafe { &*p_callback_data };

    let message = if callback_data.p_message.is_null() {
        Cow::Borrowed("(no message)")
    } else {
        // SAFETY: p_message is a null-terminated string owned by the layer.
        let text = unsafe { CStr::from_ptr(callback_data.p_message) };
        text.to_string_lossy()
    };

    let kind = message_type_name(message_type);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: "vulkan_validation", kind, "{}", message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: "vulkan_validation", kind, "{}", message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::debug!(target: "vulkan_validation", kind, "{}", message);
        }
        _ => {
            tracing::trace!(target: "vulkan_validation", kind, "{}", message);
        }
    }

    // VK_FALSE: do not abort the call that triggered the message.
    vk::FALSE
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "performance"
    } else {
        "general"
    }
}

/// Decode a Vulkan device name from a fixed-size `c_char` array.
fn decode_device_name(name: &[c_char; vk::MAX_PHYSICAL_DEVICE_NAME_SIZE]) -> String {
    // SAFETY: deviceName is a null-terminated string filled by the driver.
    let cstr = unsafe { CStr::from_ptr(name.as_ptr()) };
    cstr.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn decode_device_name_basic() {
        let mut name = [0 as c_char; vk::MAX_PHYSICAL_DEVICE_NAME_SIZE];
        for (i, &b) in b"Test GPU\0".iter().enumerate() {
            name[i] = b as c_char;
        }
        assert_eq!(decode_device_name(&name), "Test GPU");
    }

    #[test]
    fn decode_device_name_empty() {
        let name = [0 as c_char; vk::MAX_PHYSICAL_DEVICE_NAME_SIZE];
        assert_eq!(decode_device_name(&name), "");
    }

    #[test]
    fn fixed_name_comparison() {
        let mut raw = [0 as c_char; vk::MAX_EXTENSION_NAME_SIZE];
        for (i, &b) in b"VK_LAYER_KHRONOS_validation".iter().enumerate() {
            raw[i] = b as c_char;
        }
        assert!(fixed_name_eq(&raw, VALIDATION_LAYER_NAME));
        assert!(!fixed_name_eq(&raw, c"VK_LAYER_KHRONOS"));
        assert!(!fixed_name_eq(&[b'x' as c_char; 4], c"xxxx"));
    }

    #[test]
    fn first_compute_family_wins() {
        let families = [
            family(vk::QueueFlags::TRANSFER, 1),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 16),
            family(vk::QueueFlags::COMPUTE, 8),
        ];
        assert_eq!(select_compute_family(&families), Some(1));
    }

    #[test]
    fn empty_compute_family_is_skipped() {
        let families = [
            family(vk::QueueFlags::COMPUTE, 0),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, 2),
        ];
        assert_eq!(select_compute_family(&families), Some(1));
        assert_eq!(select_compute_family(&[family(vk::QueueFlags::GRAPHICS, 1)]), None);
    }

    #[test]
    fn first_device_with_compute_wins() {
        let devices = vec![
            vec![family(vk::QueueFlags::GRAPHICS, 1)],
            vec![family(vk::QueueFlags::TRANSFER, 1), family(vk::QueueFlags::COMPUTE, 1)],
            vec![family(vk::QueueFlags::COMPUTE, 4)],
        ];
        assert_eq!(select_device(&devices).unwrap(), (1, 1));
    }

    #[test]
    fn no_devices_and_no_compute_are_distinct_errors() {
        assert!(matches!(select_device(&[]), Err(VulkanError::NoDevice)));
        let devices = vec![vec![family(vk::QueueFlags::GRAPHICS, 1)]];
        assert!(matches!(select_device(&devices), Err(VulkanError::NoComputeQueue)));
    }

    #[test]
    fn validation_log_counts_by_severity() {
        let log = ValidationLog::default();
        log.record(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
        log.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
        log.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
        log.record(vk::DebugUtilsMessageSeverityFlagsEXT::INFO);
        assert_eq!(log.errors.load(Ordering::Relaxed), 1);
        assert_eq!(log.warnings.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn message_type_names() {
        assert_eq!(
            message_type_name(
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION | vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            ),
            "validation"
        );
        assert_eq!(message_type_name(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "general");
    }

    #[test]
    fn default_options_follow_build_profile() {
        let options = ContextOptions::default();
        assert_eq!(options.validation, cfg!(debug_assertions));
        assert!(options.sync_validation);
        assert_eq!(VALIDATION_LAYER_NAME.to_str().unwrap(), "VK_LAYER_KHRONOS_validation");
    }
}
