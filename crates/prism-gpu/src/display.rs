//! Display session: graphics state owned by one window.
//!
//! A display session drives the negotiation stages in order — device pick,
//! queue resolution, logical device creation, swapchain negotiation,
//! pipeline build — and owns every resulting resource. Teardown releases the
//! resources in exact reverse acquisition order.

use crate::device::{self, ChosenDevice, DeviceCandidate};
use crate::error::{GpuError, Result};
use crate::instance::GpuInstance;
use crate::pipeline::RenderPipeline;
use crate::queue::{dedup_families, resolve_queue_assignments, QueueFamilyAssignment, QueueKind};
use crate::request::DisplayRequest;
use crate::swapchain::{Swapchain, SwapchainParams, SwapchainSupport};
use crate::{features, shader};
use ash::vk;
use prism_core::WindowGeometry;
use std::path::Path;
use std::sync::Arc;

/// Graphics state for one window: surface, device, swapchain, pipeline.
///
/// Exclusively owned by one window session; destroyed before the window's
/// native resources are released.
pub struct DisplaySession {
    gpu: Arc<GpuInstance>,
    request: DisplayRequest,
    surface: vk::SurfaceKHR,
    /// Compatible candidates from the last enumeration; the set a chosen
    /// device handle is verified against.
    candidates: Vec<DeviceCandidate>,
    physical_device: vk::PhysicalDevice,
    device_name: String,
    device: Option<ash::Device>,
    swapchain_loader: Option<ash::khr::swapchain::Device>,
    assignments: Vec<QueueFamilyAssignment>,
    swapchain: Option<Swapchain>,
    pipeline: Option<RenderPipeline>,
}

impl DisplaySession {
    /// Wrap a surface into a fresh, not-yet-negotiated session.
    ///
    /// # Safety
    /// `surface` must be a valid surface created from this `gpu` instance,
    /// or null for a headless request. Ownership of the surface transfers to
    /// the session.
    pub unsafe fn new(gpu: Arc<GpuInstance>, request: DisplayRequest, surface: vk::SurfaceKHR) -> Self {
        Self {
            gpu,
            request,
            surface,
            candidates: Vec::new(),
            physical_device: vk::PhysicalDevice::null(),
            device_name: String::new(),
            device: None,
            swapchain_loader: None,
            assignments: Vec::new(),
            swapchain: None,
            pipeline: None,
        }
    }

    /// The display request this session negotiates against.
    pub fn request(&self) -> &DisplayRequest {
        &self.request
    }

    /// Name of the selected device, empty before [`Self::set_device`].
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The logical device, once created.
    pub fn device(&self) -> Option<&ash::Device> {
        self.device.as_ref()
    }

    /// The current swapchain, once created.
    pub fn swapchain(&self) -> Option<&Swapchain> {
        self.swapchain.as_ref()
    }

    /// The built pipeline, once [`Self::build_pipeline`] has run.
    pub fn pipeline(&self) -> Option<&RenderPipeline> {
        self.pipeline.as_ref()
    }

    /// Enumerate, score, and select a device for this session.
    ///
    /// Any previously cached candidate list is discarded and rebuilt. The
    /// winner is reported but not yet selected; pass its handle to
    /// [`Self::set_device`].
    pub fn pick_device(&mut self) -> Result<ChosenDevice> {
        self.candidates.clear();
        self.candidates =
            unsafe { device::enumerate_candidates(&self.gpu, self.surface, &self.request) }?;

        let best = device::select_best(&self.candidates).ok_or(GpuError::NoCompatibleDevice)?;
        let chosen = ChosenDevice {
            handle: best.profile.handle,
            name: best.profile.name.clone(),
            score: best.score,
        };
        tracing::info!(device = %chosen.name, score = chosen.score, "picked device");
        Ok(chosen)
    }

    /// Create the logical device, queues, and swapchain for a chosen device.
    ///
    /// The handle must come from the last [`Self::pick_device`] enumeration;
    /// a stale handle is rejected rather than silently accepted. Any prior
    /// device and its dependent resources are destroyed first.
    pub fn set_device(&mut self, chosen: vk::PhysicalDevice, geometry: WindowGeometry) -> Result<()> {
        let candidate = self
            .candidates
            .iter()
            .find(|candidate| candidate.profile.handle == chosen)
            .ok_or(GpuError::StaleDevice)?;
        let profile = candidate.profile.clone();

        // Resolve queues and verify features; collect every missing item.
        let (assignments, mut missing) = resolve_queue_assignments(&profile, &self.request);
        missing.extend(features::missing_features(
            &profile.features,
            &self.request.required_features,
        ));
        if !missing.is_empty() {
            return Err(GpuError::Unsatisfiable { missing });
        }

        // One queue-create request per unique family.
        let unique_families = dedup_families(&assignments);
        let queue_priority = 1.0_f32;
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|assignment| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(assignment.family_index)
                    .queue_priorities(std::slice::from_ref(&queue_priority))
            })
            .collect();

        let mut extensions: Vec<std::ffi::CString> = self
            .request
            .required_extensions
            .iter()
            .filter_map(|name| std::ffi::CString::new(name.as_str()).ok())
            .collect();
        if !self.request.headless {
            extensions.push(std::ffi::CString::from(ash::khr::swapchain::NAME));
        }
        let extension_names: Vec<*const i8> = extensions.iter().map(|ext| ext.as_ptr()).collect();

        let enabled_features = features::enable_features(&self.request.required_features);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&enabled_features);

        // Replace any prior device: dependent resources go first.
        self.destroy_device_resources();

        let device = unsafe {
            self.gpu
                .instance()
                .create_device(profile.handle, &device_create_info, None)
        }
        .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let mut assignments = assignments;
        for assignment in assignments.iter_mut().filter(|a| a.exists) {
            assignment.queue = unsafe { device.get_device_queue(assignment.family_index, 0) };
        }

        self.physical_device = profile.handle;
        self.device_name = profile.name.clone();
        self.swapchain_loader = Some(ash::khr::swapchain::Device::new(
            self.gpu.instance(),
            &device,
        ));
        self.device = Some(device);
        self.assignments = assignments;

        if !self.request.headless {
            self.create_swapchain(geometry.extent.width, geometry.extent.height)?;
        }

        tracing::info!(device = %self.device_name, "logical device ready");
        Ok(())
    }

    /// Build the fixed-function pipeline from two compiled shader binaries.
    ///
    /// Replaces any previously built pipeline and its shader modules. Safe to
    /// run from a helper thread: it touches only session-owned state.
    pub fn build_pipeline(&mut self, vertex_path: &Path, fragment_path: &Path) -> Result<()> {
        let vertex_code = shader::load_spirv(vertex_path)?;
        let fragment_code = shader::load_spirv(fragment_path)?;

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| GpuError::Other("build_pipeline before set_device".to_string()))?;
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| GpuError::Other("build_pipeline without a swapchain".to_string()))?;

        if let Some(mut old) = self.pipeline.take() {
            unsafe { old.destroy(device) };
        }
        let pipeline =
            unsafe { RenderPipeline::build(device, swapchain, &vertex_code, &fragment_code) }?;
        self.pipeline = Some(pipeline);

        tracing::info!(device = %self.device_name, "render pipeline built");
        Ok(())
    }

    /// Renegotiate the swapchain for a new framebuffer size.
    ///
    /// The old chain is handed off through `old_swapchain` and retired after
    /// the replacement exists. Framebuffers follow when a pipeline is built.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.device.is_none() || self.request.headless {
            return Ok(());
        }
        self.create_swapchain(width, height)?;

        if let Some(mut pipeline) = self.pipeline.take() {
            let device = self.device.as_ref().expect("device checked above");
            let swapchain = self.swapchain.as_ref().expect("swapchain just created");
            unsafe { pipeline.rebuild_framebuffers(device, swapchain) }?;
            self.pipeline = Some(pipeline);
        }
        Ok(())
    }

    /// Resolved queue assignment for one kind, if it exists.
    pub fn queue(&self, kind: QueueKind) -> Option<&QueueFamilyAssignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.kind == kind && assignment.exists)
    }

    fn family_index(&self, kind: QueueKind) -> Result<u32> {
        self.queue(kind)
            .map(|assignment| assignment.family_index)
            .ok_or_else(|| GpuError::Unsatisfiable {
                missing: vec![format!("queue family: {kind:?}")],
            })
    }

    /// Negotiate and (re)build the swapchain; replaces the current chain.
    fn create_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        let graphics_family = self.family_index(QueueKind::Graphics)?;
        let present_family = self.family_index(QueueKind::Present)?;

        let support = unsafe {
            SwapchainSupport::query(self.gpu.surface_loader(), self.physical_device, self.surface)
        }?;
        let params = SwapchainParams::negotiate(
            &support,
            &self.request,
            width,
            height,
            graphics_family,
            present_family,
        )?;

        let device = self.device.as_ref().expect("device set before swapchain");
        let loader = self
            .swapchain_loader
            .as_ref()
            .expect("loader set with device");

        let old = self.swapchain.take();
        let swapchain = unsafe { Swapchain::create(device, loader, self.surface, &params, old) }?;
        tracing::debug!(
            width = swapchain.extent.width,
            height = swapchain.extent.height,
            images = swapchain.images.len(),
            layers = swapchain.array_layers,
            "swapchain ready"
        );
        self.swapchain = Some(swapchain);
        Ok(())
    }

    /// Destroy device-scoped resources in reverse acquisition order.
    fn destroy_device_resources(&mut self) {
        if let Some(device) = &self.device {
            unsafe {
                let _ = device.device_wait_idle();
                if let Some(mut pipeline) = self.pipeline.take() {
                    pipeline.destroy(device);
                }
                if let Some(mut swapchain) = self.swapchain.take() {
                    let loader = self
                        .swapchain_loader
                        .as_ref()
                        .expect("loader lives with the device");
                    swapchain.destroy(device, loader);
                }
                device.destroy_device(None);
            }
        }
        self.swapchain_loader = None;
        self.device = None;
        self.assignments.clear();
        self.physical_device = vk::PhysicalDevice::null();
    }

    /// Full teardown, in reverse acquisition order: framebuffers, pipeline,
    /// layout, render pass, shader modules, candidate list, image views,
    /// swapchain, surface, logical device.
    pub fn destroy(&mut self) {
        if let Some(device) = self.device.take() {
            unsafe {
                let _ = device.device_wait_idle();
                if let Some(mut pipeline) = self.pipeline.take() {
                    pipeline.destroy(&device);
                }
                self.candidates.clear();
                if let Some(mut swapchain) = self.swapchain.take() {
                    let loader = self
                        .swapchain_loader
                        .take()
                        .expect("loader lives with the device");
                    swapchain.destroy(&device, &loader);
                }
                self.gpu.destroy_surface(self.surface);
                self.surface = vk::SurfaceKHR::null();
                device.destroy_device(None);
            }
        } else {
            self.candidates.clear();
            unsafe { self.gpu.destroy_surface(self.surface) };
            self.surface = vk::SurfaceKHR::null();
        }
        self.swapchain_loader = None;
        self.assignments.clear();
        self.physical_device = vk::PhysicalDevice::null();
    }
}

impl Drop for DisplaySession {
    fn drop(&mut self) {
        self.destroy();
    }
}
