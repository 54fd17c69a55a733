// VIEW: rendering and GPU bootstrap
pub mod gpu_init;
pub mod render;

pub use gpu_init::GpuContext;
pub use render::{RenderState, SceneBindings, ScenePipelines};
