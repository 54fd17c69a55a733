// CONTROLLER: input, simulation, and the per-frame update
pub mod frame_loop;
pub mod input;
pub mod movement;
pub mod orbit;

pub use frame_loop::FrameContext;
pub use input::{intent_from_code, ControlState, Intent};
pub use movement::{MovementSystem, GRAVITY, JUMP_BOOST, JUMP_IMPULSE, MOVE_SPEED};
pub use orbit::OrbitController;
