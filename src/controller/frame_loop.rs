use tracing::error;

use crate::asset::AssetLoader;
use crate::controller::{ControlState, MovementSystem};
use crate::model::{Camera, Scene};
use crate::view::render::SceneBindings;

/// Longest frame the simulation will integrate; stalls are cut off here.
const MAX_FRAME_DT: f32 = 0.1;

/// Per-frame update: drains finished asset loads, steps the character, and
/// refreshes the GPU-side uniforms. Runs on the single simulation/render
/// thread on both platforms.
pub struct FrameContext {
    pub movement: MovementSystem,
}

impl FrameContext {
    pub fn new() -> Self {
        Self {
            movement: MovementSystem::new(),
        }
    }

    pub fn advance(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &SceneBindings,
        scene: &mut Scene,
        controls: &mut ControlState,
        loader: &AssetLoader,
        camera: &Camera,
        raw_dt: f32,
    ) {
        let dt = raw_dt.clamp(0.0, MAX_FRAME_DT);

        // Finished loads swap the character here, never concurrently with
        // the step below.
        while let Some(loaded) = loader.poll() {
            match loaded.result {
                Ok(parsed) => scene.replace_character(
                    device,
                    queue,
                    &bindings.model_layout,
                    &bindings.texture_layout,
                    parsed,
                ),
                Err(e) => error!(name = %loaded.name, "asset load failed: {e}"),
            }
        }

        if let Some(character) = scene.character.as_mut() {
            character.playhead.advance(&character.clips, dt);
            self.movement
                .step(&mut character.body, controls, &mut scene.obstacles, dt);
            character.refresh_morphs(device);
            character.write_uniform(queue);
        }

        queue.write_buffer(
            &bindings.camera_buffer,
            0,
            bytemuck::bytes_of(&camera.uniform()),
        );
        queue.write_buffer(
            &bindings.environment_buffer,
            0,
            bytemuck::bytes_of(&scene.environment.uniform()),
        );
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new()
    }
}
