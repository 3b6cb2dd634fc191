//! Global uniform data shared by every object draw: camera matrices plus the
//! room lighting.

use crate::gfx::camera::camera_utils::CameraUniform;

/// Per-frame global uniform content.
///
/// MUST match the `Globals` struct in `forward.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniforms {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    light_direction: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    ambient_intensity: f32,
    ambient_color: [f32; 4],
}

impl GlobalUniforms {
    pub fn compose(camera: CameraUniform, light: LightConfig) -> Self {
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_direction: light.direction,
            light_intensity: light.intensity,
            light_color: light.color,
            ambient_intensity: light.ambient_intensity,
            ambient_color: [
                light.ambient_color[0],
                light.ambient_color[1],
                light.ambient_color[2],
                1.0,
            ],
        }
    }
}

/// Directional-plus-ambient room lighting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    /// Direction the light travels, normalized.
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        // Key light from high front-right, soft white ambient fill.
        let (x, y, z) = (-5.0f32, -10.0, -7.5);
        let length = (x * x + y * y + z * z).sqrt();
        Self {
            direction: [x / length, y / length, z / length],
            color: [1.0, 1.0, 1.0],
            intensity: 0.8,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_is_gpu_aligned() {
        // The WGSL mirror relies on this exact size; a drifted field would
        // silently corrupt lighting.
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 128);
    }

    #[test]
    fn test_default_light_direction_is_normalized() {
        let light = LightConfig::default();
        let [x, y, z] = light.direction;
        assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-5);
        assert!(y < 0.0, "key light shines downward");
    }
}
