use glam::{Mat4, Vec3};

/// Orbit camera around a fixed focus point.
pub struct Camera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 3],
    pub _pad: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut cam = Self {
            target: Vec3::new(0.0, 100.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            distance: 300.0,
            up: Vec3::Y,
            fov_y: 120f32.to_radians(),
            aspect: width as f32 / height as f32,
            z_near: 1.0,
            z_far: 4000.0,
        };
        cam.look_from(Vec3::new(100.0, 200.0, 300.0));
        cam
    }

    /// Place the eye at `eye` by deriving yaw/pitch/distance from the target.
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.distance = offset.length().max(1.0);
        let dir = offset / self.distance;
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin().clamp(-1.5533, 1.5533);
    }

    pub fn eye(&self) -> Vec3 {
        let cp = self.pitch.clamp(-1.5533, 1.5533);
        let offset = Vec3::new(
            self.yaw.cos() * cp.cos(),
            cp.sin(),
            self.yaw.sin() * cp.cos(),
        ) * self.distance;
        self.target + offset
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            eye: self.eye().to_array(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_from_round_trips_through_eye() {
        let mut cam = Camera::new(800, 600);
        cam.look_from(Vec3::new(100.0, 200.0, 300.0));
        let eye = cam.eye();
        assert_relative_eq!(eye.x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(eye.y, 200.0, epsilon = 1e-3);
        assert_relative_eq!(eye.z, 300.0, epsilon = 1e-3);
    }

    #[test]
    fn aspect_follows_resize() {
        let mut cam = Camera::new(800, 600);
        cam.set_aspect(1920, 1080);
        assert_relative_eq!(cam.aspect, 1920.0 / 1080.0);
    }
}
