use crate::controller::movement::JUMP_IMPULSE;
use crate::model::CharacterBody;

/// Platform-independent movement intents. Both the WASM key listeners and the
/// native winit handler translate raw key events into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

/// Map a DOM `KeyboardEvent.code` to an intent.
pub fn intent_from_code(code: &str) -> Option<Intent> {
    match code {
        "ArrowUp" | "KeyW" => Some(Intent::Forward),
        "ArrowDown" | "KeyS" => Some(Intent::Backward),
        "ArrowLeft" | "KeyA" => Some(Intent::Left),
        "ArrowRight" | "KeyD" => Some(Intent::Right),
        "Space" => Some(Intent::Jump),
        _ => None,
    }
}

/// Current movement-intent flags plus the latched jump request.
///
/// The four directional flags are level-triggered (held key = set flag). The
/// jump is edge-triggered at key-down: it fires only when the body's vertical
/// velocity is exactly zero at event time, and it kicks the velocity to
/// [`JUMP_IMPULSE`] immediately, outside the frame step. The frame step later
/// consumes `jump_pending` as a second, dt-scaled write to the same velocity.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump_pending: bool,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, intent: Intent, body: Option<&mut CharacterBody>) {
        match intent {
            Intent::Forward => self.forward = true,
            Intent::Backward => self.backward = true,
            Intent::Left => self.left = true,
            Intent::Right => self.right = true,
            Intent::Jump => {
                if let Some(body) = body {
                    if body.vertical_velocity == 0.0 {
                        self.jump_pending = true;
                        body.vertical_velocity = JUMP_IMPULSE;
                    }
                }
            }
        }
    }

    pub fn key_up(&mut self, intent: Intent) {
        match intent {
            Intent::Forward => self.forward = false,
            Intent::Backward => self.backward = false,
            Intent::Left => self.left = false,
            Intent::Right => self.right = false,
            // Releasing the key does not cancel a latched jump.
            Intent::Jump => {}
        }
    }

    /// Drop held movement keys, e.g. when the window loses focus.
    pub fn clear_movement(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Aabb;
    use glam::Vec3;

    fn body() -> CharacterBody {
        CharacterBody::new(Aabb::new(Vec3::new(-10.0, 0.0, -10.0), Vec3::new(10.0, 180.0, 10.0)))
    }

    #[test]
    fn code_mapping_covers_wasd_and_arrows() {
        assert_eq!(intent_from_code("KeyW"), Some(Intent::Forward));
        assert_eq!(intent_from_code("ArrowUp"), Some(Intent::Forward));
        assert_eq!(intent_from_code("KeyA"), Some(Intent::Left));
        assert_eq!(intent_from_code("ArrowRight"), Some(Intent::Right));
        assert_eq!(intent_from_code("Space"), Some(Intent::Jump));
        assert_eq!(intent_from_code("KeyQ"), None);
    }

    #[test]
    fn directional_flags_follow_key_state() {
        let mut controls = ControlState::new();
        controls.key_down(Intent::Forward, None);
        controls.key_down(Intent::Left, None);
        assert!(controls.forward && controls.left);
        controls.key_up(Intent::Forward);
        assert!(!controls.forward && controls.left);
    }

    #[test]
    fn jump_edge_fires_only_at_zero_velocity() {
        let mut controls = ControlState::new();
        let mut body = body();

        controls.key_down(Intent::Jump, Some(&mut body));
        assert!(controls.jump_pending);
        assert_eq!(body.vertical_velocity, JUMP_IMPULSE);

        // Held key auto-repeat while airborne must not re-trigger.
        controls.jump_pending = false;
        controls.key_down(Intent::Jump, Some(&mut body));
        assert!(!controls.jump_pending);
        assert_eq!(body.vertical_velocity, JUMP_IMPULSE);
    }

    #[test]
    fn jump_requires_exactly_zero_velocity() {
        let mut controls = ControlState::new();
        let mut body = body();
        body.vertical_velocity = -1e-6;

        controls.key_down(Intent::Jump, Some(&mut body));
        assert!(!controls.jump_pending);
        assert_eq!(body.vertical_velocity, -1e-6);
    }

    #[test]
    fn jump_without_character_is_ignored() {
        let mut controls = ControlState::new();
        controls.key_down(Intent::Jump, None);
        assert!(!controls.jump_pending);
    }

    #[test]
    fn focus_loss_clears_movement_but_not_jump() {
        let mut controls = ControlState::new();
        let mut body = body();
        controls.key_down(Intent::Forward, None);
        controls.key_down(Intent::Jump, Some(&mut body));
        controls.clear_movement();
        assert!(!controls.forward);
        assert!(controls.jump_pending);
    }
}
