//! Orbit camera parameters and projection math.
//!
//! `CameraParams` is a passive, per-call value: the renderer never stores
//! it. The caller (typically the simulation's input handling) owns the orbit
//! state and passes a fresh copy to every `render` call.

use glam::{Mat4, Vec2, Vec3};

/// Vertical field of view of the 3D layers, in radians.
const FOV_Y: f32 = std::f32::consts::PI / 3.0; // 60 degrees
/// Near clipping plane.
const NEAR_CLIP: f32 = 0.01;
/// Far clipping plane.
const FAR_CLIP: f32 = 100.0;

/// Per-frame camera parameters: orbit distance, two orbit angles, 2D pan.
///
/// The camera orbits a target point at `pan` (in the XY plane, Z = 0),
/// looking at it from `distance` away. `yaw` rotates around the world Y
/// axis, `pitch` lifts the eye above or below the target plane.
#[derive(Debug, Clone, Copy)]
pub struct CameraParams {
    /// Distance from the eye to the orbit target.
    pub distance: f32,
    /// Rotation around the world Y axis, in radians.
    pub yaw: f32,
    /// Elevation angle above the XZ plane, in radians.
    pub pitch: f32,
    /// Pan offset applied to both the eye and the target, in the XY plane.
    pub pan: Vec2,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            distance: 2.0,
            yaw: 0.0,
            pitch: 0.0,
            pan: Vec2::ZERO,
        }
    }
}

impl CameraParams {
    /// Combined view-projection matrix for the 3D layers.
    ///
    /// Perspective projection with the Y axis flipped to match the surface's
    /// top-left-origin coordinate convention.
    pub fn view_projection(&self, extent: [u32; 2]) -> Mat4 {
        let aspect_ratio = extent[0] as f32 / extent[1].max(1) as f32;

        let target = Vec3::new(self.pan.x, self.pan.y, 0.0);
        let eye = target
            + self.distance
                * Vec3::new(
                    self.pitch.cos() * self.yaw.sin(),
                    self.pitch.sin(),
                    self.pitch.cos() * self.yaw.cos(),
                );

        let view = Mat4::look_at_rh(eye, target, Vec3::Y);

        let mut projection = Mat4::perspective_rh(FOV_Y, aspect_ratio, NEAR_CLIP, FAR_CLIP);
        // Flip Y (surface uses a top-left origin)
        projection.y_axis.y *= -1.0;

        projection * view
    }
}

/// Orthographic projection spanning the current surface extent, used by the
/// 2D overlay layer. Pixel coordinates map one-to-one.
pub fn overlay_projection(extent: [u32; 2]) -> Mat4 {
    Mat4::orthographic_rh(0.0, extent[0] as f32, 0.0, extent[1] as f32, -1.0, 1.0)
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod camera_tests;
