use glam::{Mat4, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::meshing::Aabb;

#[derive(Debug, Default, Clone, Copy)]
pub struct Clip {
    pub near: f32,
    pub far: f32,
}

/// Perspective camera orbiting a focus point
#[derive(Debug, Default, Clone, Copy)]
pub struct Camera {
    pub fov: f32,
    /// the proportional relationship between the width and height of the camera's view frustum
    pub aspect: f32,
    pub clip: Clip,
    pub focus: Vec3,
    pub distance: f32,
    /// rotation about the vertical axis, in radians
    pub yaw: f32,
    /// rotation above the horizon, in radians
    pub pitch: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera {
            aspect: 1.,
            fov: PI / 3.,
            clip: Clip {
                near: 0.01,
                far: 100.0,
            },
            distance: 1.,
            pitch: 0.3,
            ..Default::default()
        }
    }

    /// Looks at the center of `bounds` from far enough away to see all of it
    pub fn framing(bounds: Aabb) -> Self {
        let radius = bounds.size().length() * 0.5;
        let mut camera = Camera::new();
        camera.focus = bounds.center();
        camera.distance = radius / (camera.fov * 0.5).sin();
        camera.clip = Clip {
            near: camera.distance * 0.01,
            far: camera.distance + radius * 2.,
        };
        camera
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw) % (2. * PI);
        self.pitch = (self.pitch + delta_pitch).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).max(self.clip.near * 2.);
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn position(&self) -> Vec3 {
        self.focus - self.rotation() * Vec3::Z * self.distance
    }

    pub fn view(&self) -> Mat4 {
        let rotation = self.rotation();
        Mat4::look_at_lh(self.position(), self.focus, rotation * Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov, self.aspect, self.clip.near, self.clip.far)
    }
}
