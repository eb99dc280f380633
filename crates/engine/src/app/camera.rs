use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 0.002;

/// First-person camera pose.
///
/// Yaw rotates about +Y, pitch about the camera's local X axis. With both at
/// zero the camera looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut pose = Self::at(position);
        pose.look_at(target);
        pose
    }

    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        let flat = (dir.x * dir.x + dir.z * dir.z).sqrt();
        if flat <= f32::EPSILON && dir.y.abs() <= f32::EPSILON {
            return;
        }
        if flat > f32::EPSILON {
            self.yaw = (-dir.x).atan2(-dir.z);
        }
        self.set_pitch_clamped(dir.y.atan2(flat));
    }

    pub fn set_pitch_clamped(&mut self, pitch: f32) {
        self.pitch = clamp_pitch(pitch);
    }

    /// Applies a mouse-look delta in pixels.
    pub fn apply_mouse_delta(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw -= dx * sensitivity;
        self.set_pitch_clamped(self.pitch - dy * sensitivity);
    }

    /// View direction projected onto the ground plane, normalized.
    pub fn forward_flat(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, -cos_yaw)
    }

    pub fn right_flat(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, -sin_yaw)
    }
}

fn clamp_pitch(pitch: f32) -> f32 {
    if !pitch.is_finite() {
        return 0.0;
    }
    pitch.clamp(-FRAC_PI_2, FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.0001
    }

    #[test]
    fn default_pose_looks_down_negative_z() {
        let pose = CameraPose::default();
        assert!(approx(pose.forward_flat(), Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx(pose.right_flat(), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn look_at_faces_target() {
        let pose = CameraPose::looking_at(Vec3::new(0.0, 101.7, 8.0), Vec3::new(0.0, 101.7, -20.0));
        assert!(pose.yaw.abs() < 0.0001);
        assert!(pose.pitch.abs() < 0.0001);

        let side = CameraPose::looking_at(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));
        assert!(approx(side.forward_flat(), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn mouse_pitch_is_clamped() {
        let mut pose = CameraPose::default();
        pose.apply_mouse_delta(0.0, -100_000.0, DEFAULT_MOUSE_SENSITIVITY);
        assert!((pose.pitch - FRAC_PI_2).abs() < 0.0001);
        pose.apply_mouse_delta(0.0, 100_000.0, DEFAULT_MOUSE_SENSITIVITY);
        assert!((pose.pitch + FRAC_PI_2).abs() < 0.0001);
    }

    #[test]
    fn mouse_right_turns_clockwise() {
        let mut pose = CameraPose::default();
        pose.apply_mouse_delta(100.0, 0.0, DEFAULT_MOUSE_SENSITIVITY);
        assert!((pose.yaw + 0.2).abs() < 0.0001);
        assert!(pose.forward_flat().x > 0.0);
    }

    #[test]
    fn forward_flat_ignores_pitch() {
        let mut pose = CameraPose::default();
        pose.set_pitch_clamped(1.0);
        let flat = pose.forward_flat();
        assert!(flat.y.abs() < 0.0001);
        assert!((flat.length() - 1.0).abs() < 0.0001);
    }
}
