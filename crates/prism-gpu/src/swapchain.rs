//! Surface/swapchain negotiation and the presentable image chain.

use crate::error::{GpuError, Result};
use crate::request::DisplayRequest;
use ash::vk;

/// What one device/surface pair can present.
///
/// `format` and `present_mode` stay empty when the pair exposes nothing
/// compatible; that is a disqualifying condition for device picking.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainSupport {
    /// Capability bounds: image counts and extents.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Chosen pixel format, if any compatible format exists.
    pub format: Option<vk::SurfaceFormatKHR>,
    /// Chosen present mode, if any compatible mode exists.
    pub present_mode: Option<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Query support for one device/surface pair.
    ///
    /// # Safety
    /// The physical device and surface must be valid.
    pub unsafe fn query(
        surface_loader: &ash::khr::surface::Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        let capabilities =
            unsafe { surface_loader.get_physical_device_surface_capabilities(device, surface) }?;
        let formats =
            unsafe { surface_loader.get_physical_device_surface_formats(device, surface) }?;
        let present_modes =
            unsafe { surface_loader.get_physical_device_surface_present_modes(device, surface) }?;

        Ok(Self {
            capabilities,
            format: select_surface_format(&formats),
            present_mode: select_present_mode(&present_modes),
        })
    }

    /// Whether this pair can present at all.
    pub fn is_viable(&self) -> bool {
        self.format.is_some() && self.present_mode.is_some()
    }
}

/// Select the surface format: prefer 8-bit BGRA sRGB, else the first
/// available, `None` when the device exposes no formats for the surface.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|format| {
            format.format == vk::Format::B8G8R8A8_SRGB
                && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.first())
        .copied()
}

/// Select the present mode: prefer low-latency mailbox, else the first
/// available, `None` when the device exposes no modes for the surface.
pub fn select_present_mode(available: &[vk::PresentModeKHR]) -> Option<vk::PresentModeKHR> {
    available
        .iter()
        .find(|&&mode| mode == vk::PresentModeKHR::MAILBOX)
        .or_else(|| available.first())
        .copied()
}

/// Clamp the requested framebuffer size into the surface bounds, per axis.
pub fn clamp_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Image count: one above the minimum, capped at the maximum when the
/// maximum is bounded (zero means unbounded).
pub fn image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Fully negotiated swapchain parameters, ready to create a chain from.
#[derive(Debug, Clone)]
pub struct SwapchainParams {
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    /// One layer per eye for stereoscopic sessions.
    pub array_layers: u32,
    pub sharing_mode: vk::SharingMode,
    /// Families sharing the images under concurrent sharing; empty for
    /// exclusive sharing.
    pub queue_family_indices: Vec<u32>,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainParams {
    /// Negotiate parameters from queried support and the display request.
    ///
    /// Sharing is concurrent across the graphics and present families when
    /// their indices differ, exclusive otherwise.
    pub fn negotiate(
        support: &SwapchainSupport,
        request: &DisplayRequest,
        width: u32,
        height: u32,
        graphics_family: u32,
        present_family: u32,
    ) -> Result<Self> {
        let (Some(format), Some(present_mode)) = (support.format, support.present_mode) else {
            return Err(GpuError::SwapchainCreation(
                "no compatible surface format or present mode".to_string(),
            ));
        };

        let (sharing_mode, queue_family_indices) = if graphics_family == present_family {
            (vk::SharingMode::EXCLUSIVE, Vec::new())
        } else {
            (
                vk::SharingMode::CONCURRENT,
                vec![graphics_family, present_family],
            )
        };

        Ok(Self {
            format,
            present_mode,
            extent: clamp_extent(&support.capabilities, width, height),
            image_count: image_count(&support.capabilities),
            array_layers: if request.stereoscopic { 2 } else { 1 },
            sharing_mode,
            queue_family_indices,
            pre_transform: support.capabilities.current_transform,
        })
    }
}

/// The presentable image chain for one display session.
pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub array_layers: u32,
}

impl Swapchain {
    /// Create the chain, retiring `old` only after the new chain exists.
    ///
    /// The old handle is passed through `old_swapchain` so in-flight
    /// presentation referencing its images hands off cleanly; it is
    /// destroyed here once the replacement is live.
    ///
    /// # Safety
    /// All handles must be valid; `old` must belong to the same surface.
    pub unsafe fn create(
        device: &ash::Device,
        loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        params: &SwapchainParams,
        old: Option<Swapchain>,
    ) -> Result<Self> {
        let old_handle = old.as_ref().map_or(vk::SwapchainKHR::null(), |s| s.handle);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(params.image_count)
            .image_format(params.format.format)
            .image_color_space(params.format.color_space)
            .image_extent(params.extent)
            .image_array_layers(params.array_layers)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(params.sharing_mode)
            .queue_family_indices(&params.queue_family_indices)
            .pre_transform(params.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(params.present_mode)
            .clipped(true)
            .old_swapchain(old_handle);

        let handle = unsafe { loader.create_swapchain(&create_info, None) }
            .map_err(|e| GpuError::SwapchainCreation(e.to_string()))?;

        // The retired chain no longer backs presentation once the new one
        // exists; release its views and handle now.
        if let Some(mut retired) = old {
            unsafe { retired.destroy(device, loader) };
        }

        let images = unsafe { loader.get_swapchain_images(handle) }?;

        let image_views: Vec<_> = images
            .iter()
            .map(|&image| {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(params.format.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(
                        vk::ImageSubresourceRange::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .base_mip_level(0)
                            .level_count(1)
                            .base_array_layer(0)
                            .layer_count(params.array_layers),
                    );

                unsafe { device.create_image_view(&view_info, None) }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            handle,
            images,
            image_views,
            format: params.format.format,
            extent: params.extent,
            array_layers: params.array_layers,
        })
    }

    /// Destroy the chain: views first, then the swapchain.
    ///
    /// # Safety
    /// All handles must be valid and the chain must not be in use.
    pub unsafe fn destroy(&mut self, device: &ash::Device, loader: &ash::khr::swapchain::Device) {
        for &view in &self.image_views {
            unsafe { device.destroy_image_view(view, None) };
        }
        self.image_views.clear();
        unsafe { loader.destroy_swapchain(self.handle, None) };
        self.handle = vk::SwapchainKHR::null();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(
        min_count: u32,
        max_count: u32,
        min_extent: (u32, u32),
        max_extent: (u32, u32),
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            min_image_extent: vk::Extent2D {
                width: min_extent.0,
                height: min_extent.1,
            },
            max_image_extent: vk::Extent2D {
                width: max_extent.0,
                height: max_extent.1,
            },
            ..Default::default()
        }
    }

    fn viable_support() -> SwapchainSupport {
        SwapchainSupport {
            capabilities: capabilities(2, 8, (1, 1), (4096, 4096)),
            format: Some(vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }),
            present_mode: Some(vk::PresentModeKHR::MAILBOX),
        }
    }

    #[test]
    fn prefers_bgra_srgb() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let chosen = select_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let chosen = select_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn empty_lists_yield_none() {
        assert!(select_surface_format(&[]).is_none());
        assert!(select_present_mode(&[]).is_none());
    }

    #[test]
    fn prefers_mailbox_present_mode() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            select_present_mode(&modes),
            Some(vk::PresentModeKHR::MAILBOX)
        );
        let fifo_only = [vk::PresentModeKHR::FIFO];
        assert_eq!(
            select_present_mode(&fifo_only),
            Some(vk::PresentModeKHR::FIFO)
        );
    }

    #[test]
    fn extent_is_clamped_per_axis() {
        let caps = capabilities(2, 0, (200, 100), (800, 600));
        assert_eq!(
            clamp_extent(&caps, 50, 5000),
            vk::Extent2D {
                width: 200,
                height: 600
            }
        );
        assert_eq!(
            clamp_extent(&caps, 640, 480),
            vk::Extent2D {
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn image_count_is_min_plus_one_capped() {
        assert_eq!(image_count(&capabilities(2, 3, (1, 1), (1, 1))), 3);
        assert_eq!(image_count(&capabilities(2, 8, (1, 1), (1, 1))), 3);
        // Zero max means unbounded.
        assert_eq!(image_count(&capabilities(4, 0, (1, 1), (1, 1))), 5);
    }

    #[test]
    fn stereoscopic_request_gets_two_layers() {
        let request = DisplayRequest::new().with_stereoscopic(true);
        let params =
            SwapchainParams::negotiate(&viable_support(), &request, 640, 480, 0, 0).unwrap();
        assert_eq!(params.array_layers, 2);

        let mono = SwapchainParams::negotiate(
            &viable_support(),
            &DisplayRequest::new(),
            640,
            480,
            0,
            0,
        )
        .unwrap();
        assert_eq!(mono.array_layers, 1);
    }

    #[test]
    fn sharing_is_concurrent_across_distinct_families() {
        let request = DisplayRequest::new();
        let split = SwapchainParams::negotiate(&viable_support(), &request, 640, 480, 0, 2).unwrap();
        assert_eq!(split.sharing_mode, vk::SharingMode::CONCURRENT);
        assert_eq!(split.queue_family_indices, vec![0, 2]);

        let shared =
            SwapchainParams::negotiate(&viable_support(), &request, 640, 480, 1, 1).unwrap();
        assert_eq!(shared.sharing_mode, vk::SharingMode::EXCLUSIVE);
        assert!(shared.queue_family_indices.is_empty());
    }

    #[test]
    fn unviable_support_is_rejected() {
        let support = SwapchainSupport {
            capabilities: capabilities(2, 8, (1, 1), (4096, 4096)),
            format: None,
            present_mode: None,
        };
        let err = SwapchainParams::negotiate(&support, &DisplayRequest::new(), 640, 480, 0, 0)
            .unwrap_err();
        assert!(matches!(err, GpuError::SwapchainCreation(_)));
    }
}
