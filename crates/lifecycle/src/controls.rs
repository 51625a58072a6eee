use crate::config::HelperConfig;
use earthview_input::ControlInput;
use earthview_scene::PerspectiveCamera;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Changes smaller than this (squared distance) do not count as a view change.
const CHANGE_EPS: f32 = 1e-6;
/// Keeps the camera off the exact poles where `look_at` degenerates.
const POLE_EPS: f32 = 1e-4;

/// Orbit-style camera controller: the camera circles `camera.target` on a
/// sphere, dollies along the view ray, and pans camera and target together.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits in radians, measured from `+Y`.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::from_config(&HelperConfig::default())
    }
}

impl OrbitControls {
    pub fn from_config(config: &HelperConfig) -> Self {
        Self {
            enabled: true,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }

    /// Apply one input to the camera. Returns true if the view changed.
    ///
    /// `viewport_height` scales pointer deltas: a drag across the full
    /// height rotates by one full turn.
    pub fn apply(
        &self,
        camera: &mut PerspectiveCamera,
        input: ControlInput,
        viewport_height: u32,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let (position, target) = (camera.position, camera.target);
        let height = viewport_height.max(1) as f32;

        match input {
            ControlInput::Rotate { dx, dy } => self.rotate(camera, dx, dy, height),
            ControlInput::Pan { dx, dy } => self.pan(camera, dx, dy, height),
            ControlInput::Zoom { delta } => self.zoom(camera, delta),
        }

        position.distance_squared(camera.position) > CHANGE_EPS
            || target.distance_squared(camera.target) > CHANGE_EPS
    }

    fn rotate(&self, camera: &mut PerspectiveCamera, dx: f32, dy: f32, height: f32) {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let theta = offset.x.atan2(offset.z) - TAU * dx / height * self.rotate_speed;
        let phi =
            (offset.y / radius).clamp(-1.0, 1.0).acos() - TAU * dy / height * self.rotate_speed;
        let phi = phi.clamp(
            self.min_polar_angle.max(POLE_EPS),
            self.max_polar_angle.min(PI - POLE_EPS),
        );

        camera.position = camera.target + spherical(radius, phi, theta);
    }

    fn zoom(&self, camera: &mut PerspectiveCamera, delta: f32) {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let scaled = radius * 0.95_f32.powf(delta * self.zoom_speed);
        // max/min instead of clamp: a NaN bound is ignored rather than panicking.
        let clamped = scaled.max(self.min_distance).min(self.max_distance);
        if clamped.is_finite() {
            camera.position = camera.target + offset / radius * clamped;
        }
    }

    fn pan(&self, camera: &mut PerspectiveCamera, dx: f32, dy: f32, height: f32) {
        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);
        // World units per pixel at the target's depth.
        let scale = 2.0 * camera.distance_to_target() * (camera.fov / 2.0).tan() / height;

        let shift = (-right * dx + up * dy) * scale * self.pan_speed;
        camera.position += shift;
        camera.target += shift;
    }
}

fn spherical(radius: f32, phi: f32, theta: f32) -> Vec3 {
    Vec3::new(
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
        radius * phi.sin() * theta.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default()
    }

    #[test]
    fn rotate_keeps_distance_and_moves_camera() {
        let controls = OrbitControls::default();
        let mut cam = camera();
        let before = cam.position;
        let dist = cam.distance_to_target();

        assert!(controls.apply(&mut cam, ControlInput::Rotate { dx: 40.0, dy: 10.0 }, 720));

        assert_ne!(cam.position, before);
        assert!((cam.distance_to_target() - dist).abs() < 1e-3);
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn rotate_is_clamped_at_pole() {
        let controls = OrbitControls::default();
        let mut cam = camera();
        let dist = cam.distance_to_target();
        controls.apply(&mut cam, ControlInput::Rotate { dx: 0.0, dy: 10_000.0 }, 720);
        // Ends up just short of straight above the target, never past it.
        let horizontal = Vec3::new(cam.position.x, 0.0, cam.position.z).length();
        assert!(horizontal < dist * 0.01);
        assert!(cam.position.y > dist * 0.99);
        assert!(cam.position.y <= dist + 1e-3);
    }

    #[test]
    fn zoom_in_moves_closer_and_respects_min_distance() {
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        let dist = cam.distance_to_target();

        assert!(controls.apply(&mut cam, ControlInput::Zoom { delta: 1.0 }, 720));
        assert!((cam.distance_to_target() - dist * 0.95).abs() < 1e-3);

        controls.min_distance = 10.0;
        controls.apply(&mut cam, ControlInput::Zoom { delta: 100.0 }, 720);
        assert!((cam.distance_to_target() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn pan_moves_camera_and_target_together() {
        let controls = OrbitControls::default();
        let mut cam = camera();
        let offset = cam.position - cam.target;

        assert!(controls.apply(&mut cam, ControlInput::Pan { dx: 30.0, dy: -12.0 }, 720));

        assert_ne!(cam.target, Vec3::ZERO);
        assert!(((cam.position - cam.target) - offset).length() < 1e-4);
    }

    #[test]
    fn zero_delta_is_not_a_change() {
        let controls = OrbitControls::default();
        let mut cam = camera();
        assert!(!controls.apply(&mut cam, ControlInput::Rotate { dx: 0.0, dy: 0.0 }, 720));
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let controls = OrbitControls {
            enabled: false,
            ..OrbitControls::default()
        };
        let mut cam = camera();
        assert!(!controls.apply(&mut cam, ControlInput::Zoom { delta: 3.0 }, 720));
        assert_eq!(cam, camera());
    }

    #[test]
    fn zoom_with_nan_limits_still_dollies() {
        let controls = OrbitControls {
            min_distance: f32::NAN,
            max_distance: f32::NAN,
            ..OrbitControls::default()
        };
        let mut cam = camera();
        let before = cam.distance_to_target();

        assert!(controls.apply(&mut cam, ControlInput::Zoom { delta: 1.0 }, 720));

        let after = cam.distance_to_target();
        assert!(after.is_finite());
        assert!((after - before * 0.95).abs() < 1e-3);
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let controls = OrbitControls {
            min_distance: 15.0,
            max_distance: 20.0,
            ..OrbitControls::default()
        };
        let mut cam = camera();

        controls.apply(&mut cam, ControlInput::Zoom { delta: 40.0 }, 720);
        assert!((cam.distance_to_target() - 15.0).abs() < 1e-3);
        controls.apply(&mut cam, ControlInput::Zoom { delta: -40.0 }, 720);
        assert!((cam.distance_to_target() - 20.0).abs() < 1e-3);
    }
}
