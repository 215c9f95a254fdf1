//! Hardware feature verification by name.
//!
//! Required features arrive as stable string names in a
//! [`DisplayRequest`](crate::request::DisplayRequest). Verification is
//! exhaustive: every missing feature is collected and reported, not just the
//! first, which aids debugging on machines that miss several at once.

use ash::vk;

type Getter = fn(&vk::PhysicalDeviceFeatures) -> vk::Bool32;
type Setter = fn(&mut vk::PhysicalDeviceFeatures);

/// Known feature names mapped to their `VkPhysicalDeviceFeatures` fields.
const FEATURE_TABLE: &[(&str, Getter, Setter)] = &[
    ("robustBufferAccess", |f| f.robust_buffer_access, |f| {
        f.robust_buffer_access = vk::TRUE;
    }),
    ("fullDrawIndexUint32", |f| f.full_draw_index_uint32, |f| {
        f.full_draw_index_uint32 = vk::TRUE;
    }),
    ("imageCubeArray", |f| f.image_cube_array, |f| {
        f.image_cube_array = vk::TRUE;
    }),
    ("independentBlend", |f| f.independent_blend, |f| {
        f.independent_blend = vk::TRUE;
    }),
    ("geometryShader", |f| f.geometry_shader, |f| {
        f.geometry_shader = vk::TRUE;
    }),
    ("tessellationShader", |f| f.tessellation_shader, |f| {
        f.tessellation_shader = vk::TRUE;
    }),
    ("sampleRateShading", |f| f.sample_rate_shading, |f| {
        f.sample_rate_shading = vk::TRUE;
    }),
    ("dualSrcBlend", |f| f.dual_src_blend, |f| {
        f.dual_src_blend = vk::TRUE;
    }),
    ("logicOp", |f| f.logic_op, |f| {
        f.logic_op = vk::TRUE;
    }),
    ("multiDrawIndirect", |f| f.multi_draw_indirect, |f| {
        f.multi_draw_indirect = vk::TRUE;
    }),
    ("depthClamp", |f| f.depth_clamp, |f| {
        f.depth_clamp = vk::TRUE;
    }),
    ("depthBiasClamp", |f| f.depth_bias_clamp, |f| {
        f.depth_bias_clamp = vk::TRUE;
    }),
    ("fillModeNonSolid", |f| f.fill_mode_non_solid, |f| {
        f.fill_mode_non_solid = vk::TRUE;
    }),
    ("wideLines", |f| f.wide_lines, |f| {
        f.wide_lines = vk::TRUE;
    }),
    ("largePoints", |f| f.large_points, |f| {
        f.large_points = vk::TRUE;
    }),
    ("multiViewport", |f| f.multi_viewport, |f| {
        f.multi_viewport = vk::TRUE;
    }),
    ("samplerAnisotropy", |f| f.sampler_anisotropy, |f| {
        f.sampler_anisotropy = vk::TRUE;
    }),
    ("sparseBinding", |f| f.sparse_binding, |f| {
        f.sparse_binding = vk::TRUE;
    }),
    ("shaderInt64", |f| f.shader_int64, |f| {
        f.shader_int64 = vk::TRUE;
    }),
    ("shaderFloat64", |f| f.shader_float64, |f| {
        f.shader_float64 = vk::TRUE;
    }),
];

/// Collect every required feature the device does not support.
///
/// Unknown feature names are reported as missing as well; they cannot be
/// enabled, so treating them as supported would hide a configuration error.
pub fn missing_features(supported: &vk::PhysicalDeviceFeatures, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| {
            match FEATURE_TABLE.iter().find(|(n, _, _)| *n == name.as_str()) {
                Some((_, get, _)) => get(supported) != vk::TRUE,
                None => true,
            }
        })
        .map(|name| format!("feature: {name}"))
        .collect()
}

/// Build the feature set to enable at device creation.
///
/// Only known names contribute; callers are expected to have verified the
/// request with [`missing_features`] first.
pub fn enable_features(required: &[String]) -> vk::PhysicalDeviceFeatures {
    let mut features = vk::PhysicalDeviceFeatures::default();
    for name in required {
        if let Some((_, _, set)) = FEATURE_TABLE.iter().find(|(n, _, _)| *n == name.as_str()) {
            set(&mut features);
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_missing_feature() {
        let mut supported = vk::PhysicalDeviceFeatures::default();
        supported.sampler_anisotropy = vk::TRUE;

        let required = vec![
            "samplerAnisotropy".to_string(),
            "geometryShader".to_string(),
            "shaderInt64".to_string(),
        ];
        let missing = missing_features(&supported, &required);
        assert_eq!(
            missing,
            vec![
                "feature: geometryShader".to_string(),
                "feature: shaderInt64".to_string()
            ]
        );
    }

    #[test]
    fn unknown_feature_name_is_missing() {
        let supported = vk::PhysicalDeviceFeatures::default();
        let required = vec!["definitelyNotAFeature".to_string()];
        let missing = missing_features(&supported, &required);
        assert_eq!(missing, vec!["feature: definitelyNotAFeature".to_string()]);
    }

    #[test]
    fn enable_sets_requested_fields() {
        let required = vec!["geometryShader".to_string(), "wideLines".to_string()];
        let features = enable_features(&required);
        assert_eq!(features.geometry_shader, vk::TRUE);
        assert_eq!(features.wide_lines, vk::TRUE);
        assert_eq!(features.sampler_anisotropy, vk::FALSE);
    }
}
