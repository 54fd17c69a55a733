use glam::{Mat4, Vec3};

use crate::asset::ParsedCharacter;
use crate::model::Aabb;
use crate::utils::{self, Mesh, ModelHandle, ModelUniform, Vertex};

/// The simulated body of the controlled character: world position, the single
/// vertical velocity component the resolver integrates, and the model-space
/// bounds its world box is derived from.
#[derive(Debug, Clone)]
pub struct CharacterBody {
    pub position: Vec3,
    pub vertical_velocity: f32,
    pub local_bounds: Aabb,
}

impl CharacterBody {
    pub fn new(local_bounds: Aabb) -> Self {
        Self {
            position: Vec3::ZERO,
            vertical_velocity: 0.0,
            local_bounds,
        }
    }

    /// World-space box at the current position.
    pub fn bounds(&self) -> Aabb {
        self.local_bounds.translated(self.position)
    }

    pub fn is_grounded(&self) -> bool {
        self.vertical_velocity == 0.0 && self.position.y == 0.0
    }
}

/// An animation clip as found in the asset: name plus keyframe span.
#[derive(Debug, Clone)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
}

/// Per-vertex position displacements for one morph target.
#[derive(Debug, Clone)]
pub struct MorphTarget {
    pub name: String,
    pub position_deltas: Vec<[f32; 3]>,
}

/// Looping playback position over the active clip.
#[derive(Debug, Clone, Default)]
pub struct Playhead {
    pub clip: usize,
    pub time: f32,
}

impl Playhead {
    pub fn advance(&mut self, clips: &[Clip], dt: f32) {
        let Some(clip) = clips.get(self.clip) else {
            return;
        };
        if clip.duration > 0.0 {
            self.time = (self.time + dt) % clip.duration;
        }
    }
}

/// Displace base vertices by the weighted sum of morph target deltas.
/// Targets whose delta list is shorter than the vertex list leave the tail
/// untouched.
pub fn apply_morphs(base: &[Vertex], targets: &[MorphTarget], weights: &[f32]) -> Vec<Vertex> {
    let mut out = base.to_vec();
    for (target, &weight) in targets.iter().zip(weights) {
        if weight == 0.0 {
            continue;
        }
        for (v, delta) in out.iter_mut().zip(&target.position_deltas) {
            v.pos[0] += weight * delta[0];
            v.pos[1] += weight * delta[1];
            v.pos[2] += weight * delta[2];
        }
    }
    out
}

/// A loaded character: the body driven by the resolver, the asset's clips and
/// morph targets, and the GPU-side resources that are destroyed on swap.
pub struct Character {
    pub name: String,
    pub body: CharacterBody,
    pub base_color: [f32; 4],
    pub clips: Vec<Clip>,
    pub playhead: Playhead,
    pub morphs: Vec<MorphTarget>,
    pub morph_weights: Vec<f32>,
    pub morphs_dirty: bool,
    base_vertices: Vec<Vertex>,
    pub handle: ModelHandle,
    pub texture: Option<wgpu::Texture>,
    pub texture_bind_group: Option<wgpu::BindGroup>,
}

impl Character {
    pub fn install(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        parsed: ParsedCharacter,
    ) -> Self {
        let local_bounds = Aabb::from_points(parsed.vertices.iter().map(|v| &v.pos));
        let body = CharacterBody::new(local_bounds);

        let mesh = Mesh {
            vertices: parsed.vertices,
            indices: parsed.indices,
        };
        let handle = ModelHandle::new(
            device,
            model_layout,
            &mesh,
            ModelUniform::new(Mat4::from_translation(body.position), parsed.base_color),
        );

        let (texture, texture_bind_group) = match &parsed.texture {
            Some(tex) => {
                let (texture, bind_group) = utils::create_texture_bind_group(
                    device,
                    queue,
                    texture_layout,
                    tex.width,
                    tex.height,
                    &tex.pixels,
                );
                (Some(texture), Some(bind_group))
            }
            None => (None, None),
        };

        let morph_weights = vec![0.0; parsed.morph_targets.len()];

        Self {
            name: parsed.name,
            body,
            base_color: parsed.base_color,
            clips: parsed.clips,
            playhead: Playhead::default(),
            morphs: parsed.morph_targets,
            morph_weights,
            morphs_dirty: false,
            base_vertices: mesh.vertices,
            handle,
            texture,
            texture_bind_group,
        }
    }

    /// Re-upload the vertex buffer with current morph weights applied.
    pub fn refresh_morphs(&mut self, device: &wgpu::Device) {
        if !self.morphs_dirty {
            return;
        }
        let vertices = apply_morphs(&self.base_vertices, &self.morphs, &self.morph_weights);
        self.handle.mesh.replace_vertices(device, &vertices);
        self.morphs_dirty = false;
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue) {
        self.handle.write_uniform(
            queue,
            ModelUniform::new(Mat4::from_translation(self.body.position), self.base_color),
        );
    }

    pub fn active_clip(&self) -> Option<&Clip> {
        self.clips.get(self.playhead.clip)
    }

    /// Release geometry, material uniform, and texture before the character
    /// is dropped on swap.
    pub fn destroy(&self) {
        self.handle.destroy();
        if let Some(texture) = &self.texture {
            texture.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(pos: [f32; 3]) -> Vertex {
        Vertex {
            pos,
            normal: [0.0, 1.0, 0.0],
            color: [1.0; 4],
            uv: [0.0, 0.0],
        }
    }

    #[test]
    fn fresh_body_is_grounded_at_origin() {
        let body = CharacterBody::new(Aabb::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 180.0, 10.0),
        ));
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.vertical_velocity, 0.0);
        assert!(body.is_grounded());
    }

    #[test]
    fn bounds_follow_position() {
        let mut body = CharacterBody::new(Aabb::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 180.0, 10.0),
        ));
        body.position = Vec3::new(5.0, 2.0, -3.0);
        let b = body.bounds();
        assert_eq!(b.min, Vec3::new(-5.0, 2.0, -13.0));
        assert_eq!(b.max, Vec3::new(15.0, 182.0, 7.0));
    }

    #[test]
    fn morph_application_is_weighted_sum() {
        let base = vec![vert([0.0, 0.0, 0.0]), vert([1.0, 0.0, 0.0])];
        let targets = vec![
            MorphTarget {
                name: "wide".into(),
                position_deltas: vec![[2.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
            },
            MorphTarget {
                name: "tall".into(),
                position_deltas: vec![[0.0, 10.0, 0.0], [0.0, 10.0, 0.0]],
            },
        ];
        let out = apply_morphs(&base, &targets, &[0.5, 1.0]);
        assert_eq!(out[0].pos, [1.0, 10.0, 0.0]);
        assert_eq!(out[1].pos, [3.0, 10.0, 0.0]);
    }

    #[test]
    fn zero_weights_leave_vertices_untouched() {
        let base = vec![vert([1.0, 2.0, 3.0])];
        let targets = vec![MorphTarget {
            name: "m".into(),
            position_deltas: vec![[9.0, 9.0, 9.0]],
        }];
        let out = apply_morphs(&base, &targets, &[0.0]);
        assert_eq!(out[0].pos, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn playhead_wraps_at_clip_duration() {
        let clips = vec![Clip {
            name: "Samba Dancing".into(),
            duration: 2.0,
        }];
        let mut playhead = Playhead::default();
        playhead.advance(&clips, 1.5);
        assert!((playhead.time - 1.5).abs() < 1e-6);
        playhead.advance(&clips, 1.0);
        assert!((playhead.time - 0.5).abs() < 1e-6);
    }
}
