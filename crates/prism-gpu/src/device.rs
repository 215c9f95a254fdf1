//! Device capability evaluation.
//!
//! Enumerates candidate GPUs, scores them against a display request, and
//! selects the best compatible device. Scoring and selection are plain
//! functions over [`DeviceProfile`] snapshots so they can be exercised
//! without a live driver.

use crate::error::{GpuError, Result};
use crate::queue::resolve_queue_assignments;
use crate::request::DisplayRequest;
use crate::swapchain::SwapchainSupport;
use crate::{features, instance::GpuInstance};
use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// Base score awarded to discrete GPUs.
pub const DISCRETE_GPU_SCORE: i32 = 10_000;

/// Score marking a device as disqualified.
pub const DISQUALIFIED: i32 = -1;

/// Plain-data snapshot of one enumerable GPU.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Opaque handle to the physical device.
    pub handle: vk::PhysicalDevice,
    /// Human-readable device name.
    pub name: String,
    /// Hardware class (discrete, integrated, ...).
    pub device_type: vk::PhysicalDeviceType,
    /// Maximum 2D image dimension; rewards higher-resolution capability.
    pub max_image_dimension_2d: u32,
    /// Queue family properties in index order.
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Per-family presentation support against the session surface.
    pub present_support: Vec<bool>,
    /// Supported hardware features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Supported device extension names.
    pub extensions: HashSet<String>,
}

impl DeviceProfile {
    /// Snapshot a physical device against a surface.
    ///
    /// # Safety
    /// The instance, device, and surface must be valid. The surface may be
    /// null only for headless sessions.
    pub unsafe fn query(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let extensions = unsafe { instance.enumerate_device_extension_properties(device) }
            .unwrap_or_default()
            .iter()
            .filter_map(|ext| {
                unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let mut present_support = Vec::with_capacity(queue_families.len());
        for index in 0..queue_families.len() as u32 {
            let supported = if surface == vk::SurfaceKHR::null() {
                false
            } else {
                unsafe {
                    surface_loader.get_physical_device_surface_support(device, index, surface)
                }?
            };
            present_support.push(supported);
        }

        Ok(Self {
            handle: device,
            name,
            device_type: properties.device_type,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            queue_families,
            present_support,
            features,
            extensions,
        })
    }
}

/// One scored candidate GPU.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    /// The device snapshot this candidate was scored from.
    pub profile: DeviceProfile,
    /// Integer score; negative means disqualified.
    pub score: i32,
}

/// Handle and name of the device a pick selected.
#[derive(Debug, Clone)]
pub struct ChosenDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub score: i32,
}

/// Score one device against queried swapchain support.
///
/// Discrete GPUs start at [`DISCRETE_GPU_SCORE`]; every device earns its
/// maximum 2D image dimension on top. A presenting session with no
/// compatible format or present mode disqualifies the device outright.
/// `support` is `None` for headless sessions, which skip the surface check.
pub fn score_device(profile: &DeviceProfile, support: Option<&SwapchainSupport>) -> i32 {
    if let Some(support) = support {
        if !support.is_viable() {
            return DISQUALIFIED;
        }
    }

    let base = if profile.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        DISCRETE_GPU_SCORE
    } else {
        0
    };

    base + profile.max_image_dimension_2d as i32
}

/// Score one device and verify its required queues, features, and extensions.
///
/// A disqualified device is returned with a negative score and no further
/// checks. A qualified device missing any *required* item aborts the whole
/// pick with [`GpuError::Unsatisfiable`], listing every missing item at once.
pub fn evaluate_candidate(
    profile: DeviceProfile,
    support: Option<&SwapchainSupport>,
    request: &DisplayRequest,
) -> Result<DeviceCandidate> {
    let score = score_device(&profile, support);
    if score < 0 {
        tracing::debug!(device = %profile.name, "device disqualified: no compatible surface format or present mode");
        return Ok(DeviceCandidate { profile, score });
    }

    let (_, mut missing) = resolve_queue_assignments(&profile, request);
    missing.extend(features::missing_features(
        &profile.features,
        &request.required_features,
    ));
    missing.extend(
        request
            .required_extensions
            .iter()
            .filter(|name| !profile.extensions.contains(name.as_str()))
            .map(|name| format!("device extension: {name}")),
    );

    if missing.is_empty() {
        Ok(DeviceCandidate { profile, score })
    } else {
        Err(GpuError::Unsatisfiable { missing })
    }
}

/// Evaluate profile/support pairs into the compatible candidate set.
///
/// Devices with negative scores are removed; an empty result is
/// [`GpuError::NoCompatibleDevice`].
pub fn pick_from_profiles(
    pairs: Vec<(DeviceProfile, Option<SwapchainSupport>)>,
    request: &DisplayRequest,
) -> Result<Vec<DeviceCandidate>> {
    let mut candidates = Vec::with_capacity(pairs.len());
    for (profile, support) in pairs {
        candidates.push(evaluate_candidate(profile, support.as_ref(), request)?);
    }
    candidates.retain(|candidate| candidate.score >= 0);

    if candidates.is_empty() {
        return Err(GpuError::NoCompatibleDevice);
    }
    Ok(candidates)
}

/// The candidate with the strictly highest non-negative score; ties keep the
/// first device in enumeration order.
pub fn select_best(candidates: &[DeviceCandidate]) -> Option<&DeviceCandidate> {
    let mut best: Option<&DeviceCandidate> = None;
    for candidate in candidates {
        if candidate.score < 0 {
            continue;
        }
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Enumerate and evaluate every physical device for one session surface.
///
/// The previous candidate list, if any, is the caller's to discard; the
/// returned list is built fresh from this enumeration.
///
/// # Safety
/// The instance must be valid; `surface` must be valid or null for headless
/// requests.
pub unsafe fn enumerate_candidates(
    gpu: &GpuInstance,
    surface: vk::SurfaceKHR,
    request: &DisplayRequest,
) -> Result<Vec<DeviceCandidate>> {
    let devices = unsafe { gpu.instance().enumerate_physical_devices() }?;

    let mut pairs = Vec::with_capacity(devices.len());
    for device in devices {
        let profile =
            unsafe { DeviceProfile::query(gpu.instance(), gpu.surface_loader(), device, surface) }?;
        let support = if request.headless {
            None
        } else {
            Some(unsafe { SwapchainSupport::query(gpu.surface_loader(), device, surface) }?)
        };
        tracing::debug!(device = %profile.name, "enumerated physical device");
        pairs.push((profile, support));
    }

    pick_from_profiles(pairs, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, device_type: vk::PhysicalDeviceType, max_dim: u32) -> DeviceProfile {
        DeviceProfile {
            handle: vk::PhysicalDevice::null(),
            name: name.to_string(),
            device_type,
            max_image_dimension_2d: max_dim,
            queue_families: vec![vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS
                    | vk::QueueFlags::COMPUTE
                    | vk::QueueFlags::TRANSFER,
                queue_count: 1,
                ..Default::default()
            }],
            present_support: vec![true],
            features: vk::PhysicalDeviceFeatures::default(),
            extensions: HashSet::new(),
        }
    }

    fn viable_support() -> SwapchainSupport {
        SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                ..Default::default()
            },
            format: Some(vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }),
            present_mode: Some(vk::PresentModeKHR::MAILBOX),
        }
    }

    #[test]
    fn discrete_gpu_scores_above_integrated() {
        let discrete = profile("discrete", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
        let integrated = profile("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU, 16384);
        let support = viable_support();

        let discrete_score = score_device(&discrete, Some(&support));
        let integrated_score = score_device(&integrated, Some(&support));
        assert_eq!(discrete_score, DISCRETE_GPU_SCORE + 4096);
        assert_eq!(integrated_score, 16384);
        assert!(discrete_score > integrated_score);
    }

    #[test]
    fn no_surface_compatibility_disqualifies() {
        let device = profile("gpu", vk::PhysicalDeviceType::DISCRETE_GPU, 16384);
        let support = SwapchainSupport {
            format: None,
            ..viable_support()
        };
        assert_eq!(score_device(&device, Some(&support)), DISQUALIFIED);
    }

    #[test]
    fn headless_request_skips_surface_check() {
        let device = profile("gpu", vk::PhysicalDeviceType::INTEGRATED_GPU, 2048);
        assert_eq!(score_device(&device, None), 2048);
    }

    #[test]
    fn disqualified_device_is_never_selected() {
        let winner = DeviceCandidate {
            profile: profile("small", vk::PhysicalDeviceType::INTEGRATED_GPU, 1024),
            score: 1024,
        };
        let disqualified = DeviceCandidate {
            profile: profile("huge", vk::PhysicalDeviceType::DISCRETE_GPU, 16384),
            score: DISQUALIFIED,
        };
        let candidates = [disqualified, winner.clone()];
        let best = select_best(&candidates).unwrap();
        assert_eq!(best.profile.name, winner.profile.name);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let first = DeviceCandidate {
            profile: profile("first", vk::PhysicalDeviceType::DISCRETE_GPU, 4096),
            score: 100,
        };
        let second = DeviceCandidate {
            profile: profile("second", vk::PhysicalDeviceType::DISCRETE_GPU, 4096),
            score: 100,
        };
        let candidates = [first, second];
        let best = select_best(&candidates).unwrap();
        assert_eq!(best.profile.name, "first");
    }

    #[test]
    fn missing_required_feature_aborts_the_pick() {
        let device = profile("gpu", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
        let request = DisplayRequest::new().with_feature("geometryShader");
        let err = evaluate_candidate(device, Some(&viable_support()), &request).unwrap_err();
        match err {
            GpuError::Unsatisfiable { missing } => {
                assert_eq!(missing, vec!["feature: geometryShader".to_string()]);
            }
            other => panic!("expected Unsatisfiable, got {other}"),
        }
    }

    #[test]
    fn all_devices_disqualified_is_no_compatible_device() {
        let device = profile("gpu", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
        let support = SwapchainSupport {
            format: None,
            present_mode: None,
            ..viable_support()
        };
        let err = pick_from_profiles(
            vec![(device, Some(support))],
            &DisplayRequest::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GpuError::NoCompatibleDevice));
    }
}
