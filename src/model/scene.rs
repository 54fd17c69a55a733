use glam::{Mat4, Vec3};
use rand::Rng;
use tracing::info;

use crate::asset::ParsedCharacter;
use crate::model::{Aabb, Character, Environment};
use crate::utils::{self, ModelHandle, ModelUniform};

/// Number of obstacle boxes scattered at startup. The field is fixed for the
/// lifetime of the process.
pub const OBSTACLE_COUNT: usize = 20;

/// Obstacle box dimensions (full size 50 x 50 x 40).
pub const OBSTACLE_HALF_EXTENTS: Vec3 = Vec3::new(25.0, 25.0, 20.0);

/// Obstacles rest with their center this far above the ground.
pub const OBSTACLE_HEIGHT: f32 = 10.0;

/// Obstacles scatter across +/- half of this span on x and z.
pub const OBSTACLE_SPREAD: f32 = 1000.0;

const GROUND_WIDTH: f32 = 5000.0;
const GROUND_DEPTH: f32 = 1000.0;
const GRID_SIZE: f32 = 20.0;
const GRID_DIVISIONS: u32 = 20;

/// A static collision volume. The bounding box is cached and refreshed from
/// the transform before every overlap test, even though the transform never
/// changes after generation.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub position: Vec3,
    pub half_extents: Vec3,
    pub bounds: Aabb,
}

impl Obstacle {
    pub fn new(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            half_extents,
            bounds: Aabb::from_center_half_extents(position, half_extents),
        }
    }

    pub fn refresh_bounds(&mut self) {
        self.bounds = Aabb::from_center_half_extents(self.position, self.half_extents);
    }
}

/// Everything the frame loop simulates and the renderer draws: environment
/// parameters, the static world, and the currently loaded character.
///
/// `obstacles` and `obstacle_handles` are index-aligned; both are filled once
/// by [`Scene::new`] and never grow or shrink afterwards.
pub struct Scene {
    pub environment: Environment,
    pub ground: ModelHandle,
    pub grid: ModelHandle,
    pub obstacles: Vec<Obstacle>,
    pub obstacle_handles: Vec<ModelHandle>,
    pub character: Option<Character>,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        model_layout: &wgpu::BindGroupLayout,
        rng: &mut impl Rng,
    ) -> Self {
        let ground = ModelHandle::new(
            device,
            model_layout,
            &utils::create_ground_mesh(GROUND_WIDTH, GROUND_DEPTH),
            ModelUniform::new(Mat4::IDENTITY, [1.0, 1.0, 1.0, 1.0]),
        );
        let grid = ModelHandle::new(
            device,
            model_layout,
            &utils::create_grid_mesh(GRID_SIZE, GRID_DIVISIONS),
            // Line color and opacity live in the vertex data.
            ModelUniform::new(Mat4::IDENTITY, [1.0, 1.0, 1.0, 1.0]),
        );

        let obstacles = generate_obstacles(rng, OBSTACLE_COUNT);
        let obstacle_handles = obstacles
            .iter()
            .map(|obstacle| {
                let color = [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>(), 1.0];
                ModelHandle::new(
                    device,
                    model_layout,
                    &utils::create_box_mesh(obstacle.half_extents, color),
                    ModelUniform::new(Mat4::from_translation(obstacle.position), color),
                )
            })
            .collect();

        Self {
            environment: Environment::default(),
            ground,
            grid,
            obstacles,
            obstacle_handles,
            character: None,
        }
    }

    /// Swap in a freshly loaded character, releasing the previous one's GPU
    /// resources first. Body state starts over: position at the origin,
    /// vertical velocity zero.
    pub fn replace_character(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        parsed: ParsedCharacter,
    ) {
        if let Some(old) = self.character.take() {
            old.destroy();
        }
        let character = Character::install(device, queue, model_layout, texture_layout, parsed);
        info!(
            name = %character.name,
            clips = character.clips.len(),
            morphs = character.morphs.len(),
            "installed character"
        );
        self.character = Some(character);
    }
}

/// Scatter the fixed obstacle field: uniform on x/z, fixed height, fixed
/// extents.
pub fn generate_obstacles(rng: &mut impl Rng, count: usize) -> Vec<Obstacle> {
    (0..count)
        .map(|_| {
            let position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * OBSTACLE_SPREAD,
                OBSTACLE_HEIGHT,
                (rng.gen::<f32>() - 0.5) * OBSTACLE_SPREAD,
            );
            Obstacle::new(position, OBSTACLE_HALF_EXTENTS)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn obstacle_field_is_fixed_count_and_height() {
        let mut rng = StdRng::seed_from_u64(7);
        let obstacles = generate_obstacles(&mut rng, OBSTACLE_COUNT);
        assert_eq!(obstacles.len(), OBSTACLE_COUNT);
        for o in &obstacles {
            assert_eq!(o.position.y, OBSTACLE_HEIGHT);
            assert!(o.position.x.abs() <= OBSTACLE_SPREAD / 2.0);
            assert!(o.position.z.abs() <= OBSTACLE_SPREAD / 2.0);
            assert_eq!(o.half_extents, OBSTACLE_HALF_EXTENTS);
            // Cached bounds start in sync with the transform.
            assert!((o.bounds.center() - o.position).length() < 1e-3);
        }
    }

    #[test]
    fn obstacle_generation_is_deterministic_for_a_seed() {
        let a = generate_obstacles(&mut StdRng::seed_from_u64(42), 5);
        let b = generate_obstacles(&mut StdRng::seed_from_u64(42), 5);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
        }
    }
}
