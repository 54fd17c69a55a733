use glam::Vec3;

/// Scene-wide lighting and fog parameters, driven from the UI.
pub struct Environment {
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub hemi_sky_color: [f32; 3],
    pub hemi_ground_color: [f32; 3],
    pub hemi_intensity: f32,
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub sun_direction: Vec3,
}

/// Fixed clear color behind the fog.
pub const BACKGROUND_COLOR: [f64; 3] = [0.627, 0.627, 0.627];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvironmentUniform {
    pub hemi_sky: [f32; 3],
    pub hemi_intensity: f32,
    pub hemi_ground: [f32; 3],
    pub _pad0: f32,
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub sun_direction: [f32; 3],
    pub _pad1: f32,
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub _pad2: f32,
    pub _pad3: f32,
    pub _pad4: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            fog_color: [0.627, 0.627, 0.627],
            fog_near: 200.0,
            fog_far: 1000.0,
            hemi_sky_color: [1.0, 0.961, 0.333],
            hemi_ground_color: [0.267, 0.267, 0.267],
            hemi_intensity: 5.0,
            sun_color: [1.0, 0.961, 0.333],
            sun_intensity: 5.0,
            // Lamp sits at (0, 200, 100) aimed at the origin.
            sun_direction: Vec3::new(0.0, -200.0, -100.0).normalize(),
        }
    }
}

impl Environment {
    pub fn uniform(&self) -> EnvironmentUniform {
        EnvironmentUniform {
            hemi_sky: self.hemi_sky_color,
            hemi_intensity: self.hemi_intensity,
            hemi_ground: self.hemi_ground_color,
            _pad0: 0.0,
            sun_color: self.sun_color,
            sun_intensity: self.sun_intensity,
            sun_direction: self.sun_direction.to_array(),
            _pad1: 0.0,
            fog_color: self.fog_color,
            fog_near: self.fog_near,
            fog_far: self.fog_far,
            _pad2: 0.0,
            _pad3: 0.0,
            _pad4: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scene_setup() {
        let env = Environment::default();
        assert_eq!(env.fog_near, 200.0);
        assert_eq!(env.fog_far, 1000.0);
        assert_eq!(env.hemi_intensity, 5.0);
        assert_eq!(env.sun_intensity, 5.0);
        assert!(env.sun_direction.is_normalized());
    }
}
