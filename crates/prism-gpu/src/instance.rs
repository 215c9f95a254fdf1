//! Vulkan instance creation and the shared GPU context.

use crate::error::{GpuError, Result};
use crate::request::AppRequest;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{CStr, CString};

/// Per-platform surface extensions.
pub fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![
        ash::khr::surface::NAME,
        #[cfg(target_os = "windows")]
        ash::khr::win32_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::xlib_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::wayland_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::ext::metal_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::khr::portability_enumeration::NAME,
    ]
}

/// Validation layers enabled when the request asks for validation.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Application-wide GPU context: entry, instance, and surface loader.
///
/// Shared (behind an `Arc`) by every window thread in the process.
pub struct GpuInstance {
    // Entry must be kept alive for the lifetime of the instance
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: ash::khr::surface::Instance,
}

impl GpuInstance {
    /// Create the instance from an application request.
    ///
    /// Every required layer that is unavailable is collected into one
    /// [`GpuError::Unsatisfiable`] before instance creation is attempted.
    pub fn new(request: &AppRequest) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| GpuError::Other(format!("Failed to load Vulkan: {e}")))?;

        let instance = unsafe { create_instance(&entry, request) }?;
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        Ok(Self {
            entry,
            instance,
            surface_loader,
        })
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the surface extension loader.
    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    /// Create a render surface from native window handles.
    ///
    /// # Safety
    /// The handles must reference a live native window, and the window must
    /// outlive the returned surface.
    pub unsafe fn create_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR> {
        unsafe { ash_window::create_surface(&self.entry, &self.instance, display, window, None) }
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))
    }

    /// Destroy a surface created by [`Self::create_surface`].
    ///
    /// # Safety
    /// The surface must not be in use.
    pub unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        if surface != vk::SurfaceKHR::null() {
            unsafe { self.surface_loader.destroy_surface(surface, None) };
        }
    }
}

impl Drop for GpuInstance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

/// Create a Vulkan instance for an application request.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
unsafe fn create_instance(entry: &ash::Entry, request: &AppRequest) -> Result<ash::Instance> {
    let app_name = CString::new(request.app_name.as_str())
        .map_err(|e| GpuError::Other(format!("Invalid application name: {e}")))?;
    let engine_name = CString::new("Prism").unwrap();

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    // Platform surface extensions plus whatever the request asks for.
    let extra_extensions: Vec<CString> = request
        .required_extensions
        .iter()
        .filter_map(|name| CString::new(name.as_str()).ok())
        .collect();
    let mut extension_names: Vec<*const i8> = platform_surface_extensions()
        .iter()
        .map(|ext| ext.as_ptr())
        .collect();
    extension_names.extend(extra_extensions.iter().map(|ext| ext.as_ptr()));

    let mut layers: Vec<CString> = request
        .required_layers
        .iter()
        .filter_map(|name| CString::new(name.as_str()).ok())
        .collect();
    if request.validation {
        layers.extend(validation_layers().iter().map(|l| CString::from(*l)));
    }

    // Required layers must all be present; collect every absence.
    let available_layers = unsafe { entry.enumerate_instance_layer_properties() }?;
    let layer_available = |name: &CStr| {
        available_layers
            .iter()
            .any(|props| unsafe { CStr::from_ptr(props.layer_name.as_ptr()) } == name)
    };

    let missing: Vec<String> = request
        .required_layers
        .iter()
        .filter(|name| {
            CString::new(name.as_str()).map_or(true, |wanted| !layer_available(&wanted))
        })
        .map(|name| format!("layer: {name}"))
        .collect();
    if !missing.is_empty() {
        return Err(GpuError::Unsatisfiable { missing });
    }

    // Validation layers degrade gracefully instead.
    layers.retain(|layer| {
        let available = layer_available(layer);
        if !available {
            tracing::warn!("Layer {} not available, dropping", layer.to_string_lossy());
        }
        available
    });

    let layer_names: Vec<*const i8> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = unsafe { entry.create_instance(&create_info, None) }?;

    Ok(instance)
}
