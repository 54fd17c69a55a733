// MODEL: simulation state and scene data
pub mod aabb;
pub mod camera;
pub mod character;
pub mod environment;
pub mod scene;

pub use aabb::Aabb;
pub use camera::{Camera, CameraUniform};
pub use character::{apply_morphs, Character, CharacterBody, Clip, MorphTarget, Playhead};
pub use environment::{Environment, EnvironmentUniform, BACKGROUND_COLOR};
pub use scene::{Obstacle, Scene, OBSTACLE_COUNT, OBSTACLE_HALF_EXTENTS};
