//! End-to-end negotiation scenarios over hand-built device profiles.

use ash::vk;
use prism_gpu::{
    pick_from_profiles, select_best, DeviceProfile, DisplayRequest, GpuError, SwapchainParams,
    SwapchainSupport, DISCRETE_GPU_SCORE,
};
use std::collections::HashSet;

fn full_queue_family() -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        queue_count: 1,
        ..Default::default()
    }
}

fn profile(name: &str, device_type: vk::PhysicalDeviceType, max_dim: u32) -> DeviceProfile {
    DeviceProfile {
        handle: vk::PhysicalDevice::null(),
        name: name.to_string(),
        device_type,
        max_image_dimension_2d: max_dim,
        queue_families: vec![full_queue_family()],
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
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        },
        format: Some(vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }),
        present_mode: Some(vk::PresentModeKHR::MAILBOX),
    }
}

// Scenario A: one compatible discrete GPU, plain presenting request.
#[test]
fn single_discrete_gpu_is_picked_with_one_layer() {
    let request = DisplayRequest::new();
    let discrete = profile("discrete", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);

    let candidates =
        pick_from_profiles(vec![(discrete, Some(viable_support()))], &request).unwrap();
    let best = select_best(&candidates).unwrap();
    assert_eq!(best.profile.name, "discrete");
    assert_eq!(best.score, DISCRETE_GPU_SCORE + 4096);

    let params =
        SwapchainParams::negotiate(&viable_support(), &request, 1280, 720, 0, 0).unwrap();
    assert_eq!(params.array_layers, 1);
}

// Scenario B: same device, stereoscopic request doubles the layer count.
#[test]
fn stereoscopic_request_creates_two_layers() {
    let request = DisplayRequest::new().with_stereoscopic(true);
    let discrete = profile("discrete", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);

    let candidates =
        pick_from_profiles(vec![(discrete, Some(viable_support()))], &request).unwrap();
    assert_eq!(select_best(&candidates).unwrap().profile.name, "discrete");

    let params =
        SwapchainParams::negotiate(&viable_support(), &request, 1280, 720, 0, 0).unwrap();
    assert_eq!(params.array_layers, 2);
}

// Scenario C: discrete GPU wins even when the integrated one has a larger
// raw dimension component.
#[test]
fn discrete_gpu_beats_integrated_with_larger_dimension() {
    let request = DisplayRequest::new();
    let discrete = profile("discrete", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
    let integrated = profile("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU, 16384);

    let candidates = pick_from_profiles(
        vec![
            (integrated, Some(viable_support())),
            (discrete, Some(viable_support())),
        ],
        &request,
    )
    .unwrap();
    assert_eq!(candidates.len(), 2);

    let best = select_best(&candidates).unwrap();
    assert_eq!(best.profile.name, "discrete");
}

// Scenario E: a required feature unsupported everywhere aborts the pick with
// a configuration-unsatisfiable error naming the feature.
#[test]
fn universally_missing_feature_reports_unsatisfiable() {
    let request = DisplayRequest::new().with_feature("sparseBinding");
    let a = profile("a", vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
    let b = profile("b", vk::PhysicalDeviceType::INTEGRATED_GPU, 8192);

    let err = pick_from_profiles(
        vec![
            (a, Some(viable_support())),
            (b, Some(viable_support())),
        ],
        &request,
    )
    .unwrap_err();

    match err {
        GpuError::Unsatisfiable { missing } => {
            assert_eq!(missing, vec!["feature: sparseBinding".to_string()]);
        }
        other => panic!("expected Unsatisfiable, got {other}"),
    }
}

// A device exposing zero formats or present modes is disqualified, never
// selected, and alone yields no compatible device.
#[test]
fn zero_format_device_is_disqualified() {
    let request = DisplayRequest::new();
    let starved = SwapchainSupport {
        format: None,
        present_mode: None,
        ..viable_support()
    };

    let strong = profile("strong", vk::PhysicalDeviceType::DISCRETE_GPU, 16384);
    let weak = profile("weak", vk::PhysicalDeviceType::INTEGRATED_GPU, 1024);

    let candidates = pick_from_profiles(
        vec![(strong, Some(starved)), (weak, Some(viable_support()))],
        &request,
    )
    .unwrap();
    // The disqualified device is removed from the candidate set entirely.
    assert_eq!(candidates.len(), 1);
    assert_eq!(select_best(&candidates).unwrap().profile.name, "weak");

    let solitary = profile("strong", vk::PhysicalDeviceType::DISCRETE_GPU, 16384);
    let err = pick_from_profiles(vec![(solitary, Some(starved))], &request).unwrap_err();
    assert!(matches!(err, GpuError::NoCompatibleDevice));
}
