use crate::controller::input::ControlState;
use crate::model::{CharacterBody, Obstacle};

/// Horizontal speed per directional flag, units per second.
pub const MOVE_SPEED: f32 = 100.0;

/// Vertical velocity decrement per second.
pub const GRAVITY: f32 = 30.0;

/// Velocity set at the jump key-down edge.
pub const JUMP_IMPULSE: f32 = 10.0;

/// Velocity the frame step writes (scaled by dt) while a jump is pending.
/// Together with [`JUMP_IMPULSE`] these are two independent writes to the
/// same velocity; the frame-step write lands on the first step after the
/// edge and replaces it.
pub const JUMP_BOOST: f32 = 10.0;

/// Per-frame movement and collision resolution for the controlled character.
///
/// The vertical position advances by the raw velocity value (a per-frame
/// displacement, not velocity x dt) while the velocity itself decays by
/// `gravity * dt`. Horizontal flags translate each axis independently, so
/// opposite flags cancel and diagonals run at full speed on both axes.
/// Both are load-bearing for the movement feel; do not normalize them.
pub struct MovementSystem {
    pub move_speed: f32,
    pub gravity: f32,
    pub jump_boost: f32,
}

impl MovementSystem {
    pub fn new() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            gravity: GRAVITY,
            jump_boost: JUMP_BOOST,
        }
    }

    /// Advance the body by one frame and push it out of overlapping
    /// obstacles, one dominant axis per obstacle, in list order.
    pub fn step(
        &self,
        body: &mut CharacterBody,
        controls: &mut ControlState,
        obstacles: &mut [Obstacle],
        dt: f32,
    ) {
        let step = self.move_speed * dt;
        if controls.forward {
            body.position.z -= step;
        }
        if controls.backward {
            body.position.z += step;
        }
        if controls.left {
            body.position.x -= step;
        }
        if controls.right {
            body.position.x += step;
        }

        if controls.jump_pending {
            body.vertical_velocity = self.jump_boost * dt;
            controls.jump_pending = false;
        }

        body.position.y += body.vertical_velocity;
        body.vertical_velocity -= self.gravity * dt;

        if body.position.y < 0.0 {
            body.position.y = 0.0;
            body.vertical_velocity = 0.0;
        }

        self.resolve_collisions(body, obstacles);
    }

    /// The sweep tests every obstacle against the box the body occupied when
    /// the sweep started; corrections applied for earlier obstacles are not
    /// reflected in later overlap tests within the same frame.
    fn resolve_collisions(&self, body: &mut CharacterBody, obstacles: &mut [Obstacle]) {
        let body_box = body.bounds();
        let body_size = body_box.size();

        for obstacle in obstacles.iter_mut() {
            obstacle.refresh_bounds();
            let bounds = obstacle.bounds;
            if !body_box.intersects(&bounds) {
                continue;
            }

            // Push direction from obstacle center toward body center. When
            // the centers coincide this normalizes to NaN and every
            // comparison below is false; the final arm then runs.
            let push = (body_box.center() - bounds.center()).normalize();

            if push.y.abs() > push.x.abs() && push.y.abs() > push.z.abs() {
                if push.y > 0.0 {
                    body.position.y = bounds.max.y;
                } else {
                    body.position.y = bounds.min.y - body_size.y;
                }
                body.vertical_velocity = 0.0;
            } else if push.x.abs() > push.z.abs() {
                if push.x > 0.0 {
                    body.position.x = bounds.max.x;
                } else {
                    body.position.x = bounds.min.x - body_size.x;
                }
            } else if push.z > 0.0 {
                body.position.z = bounds.max.z;
            } else {
                body.position.z = bounds.min.z - body_size.z;
            }
        }
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::Intent;
    use crate::model::Aabb;
    use approx::assert_relative_eq;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    /// 20 x 180 x 20 box with the origin at the feet (rigged-model layout).
    fn standing_body() -> CharacterBody {
        CharacterBody::new(Aabb::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 180.0, 10.0),
        ))
    }

    /// Same box but vertically centered on the origin.
    fn centered_body() -> CharacterBody {
        CharacterBody::new(Aabb::new(
            Vec3::new(-10.0, -90.0, -10.0),
            Vec3::new(10.0, 90.0, 10.0),
        ))
    }

    fn obstacle_at(center: Vec3) -> Obstacle {
        Obstacle::new(center, Vec3::new(25.0, 25.0, 20.0))
    }

    #[test]
    fn idle_grounded_body_stays_put() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        let mut obstacles = vec![obstacle_at(Vec3::new(500.0, 10.0, 500.0))];

        sim.step(&mut body, &mut controls, &mut obstacles, DT);

        assert_eq!(body.position, Vec3::ZERO);
    }

    #[test]
    fn forward_moves_depth_axis_only() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        controls.forward = true;

        sim.step(&mut body, &mut controls, &mut [], DT);

        assert_relative_eq!(body.position.z, -MOVE_SPEED * DT);
        assert_eq!(body.position.x, 0.0);
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn opposite_flags_cancel() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        controls.forward = true;
        controls.backward = true;

        sim.step(&mut body, &mut controls, &mut [], DT);

        assert_eq!(body.position.z, 0.0);
    }

    #[test]
    fn diagonal_speed_is_uncapped() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        controls.forward = true;
        controls.right = true;

        sim.step(&mut body, &mut controls, &mut [], DT);

        // Full speed on both axes, not normalized.
        assert_relative_eq!(body.position.z, -MOVE_SPEED * DT);
        assert_relative_eq!(body.position.x, MOVE_SPEED * DT);
    }

    #[test]
    fn jump_boost_replaces_edge_impulse_on_first_step() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();

        controls.key_down(Intent::Jump, Some(&mut body));
        assert_eq!(body.vertical_velocity, JUMP_IMPULSE);

        sim.step(&mut body, &mut controls, &mut [], DT);

        // The pending flag rewrites the velocity to the dt-scaled boost
        // before integration, so the edge impulse never reaches the position.
        assert!(!controls.jump_pending);
        assert_relative_eq!(body.position.y, JUMP_BOOST * DT);
        assert_relative_eq!(body.vertical_velocity, JUMP_BOOST * DT - GRAVITY * DT);
    }

    #[test]
    fn jump_arc_returns_to_grounded() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();

        controls.key_down(Intent::Jump, Some(&mut body));

        let mut frames = 0;
        sim.step(&mut body, &mut controls, &mut [], DT);
        assert!(body.position.y > 0.0);
        while !body.is_grounded() {
            sim.step(&mut body, &mut controls, &mut [], DT);
            frames += 1;
            assert!(frames < 1000, "body never landed");
        }
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.vertical_velocity, 0.0);
    }

    #[test]
    fn gravity_integration_order_is_position_then_velocity() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        body.position.y = 50.0;
        body.vertical_velocity = 2.0;

        sim.step(&mut body, &mut controls, &mut [], DT);

        // pos += vel (raw, no dt), then vel -= gravity * dt
        assert_relative_eq!(body.position.y, 52.0);
        assert_relative_eq!(body.vertical_velocity, 2.0 - GRAVITY * DT);
    }

    #[test]
    fn ground_clamp_snaps_and_zeroes_velocity() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        body.position.y = 1.0;
        body.vertical_velocity = -5.0;

        sim.step(&mut body, &mut controls, &mut [], DT);

        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.vertical_velocity, 0.0);
        assert!(body.is_grounded());
    }

    #[test]
    fn resting_velocity_alternates_with_gravity() {
        // Gravity runs even when grounded; the clamp only fires when the
        // position actually dips below zero, so velocity alternates between
        // zero and a single gravity tick at rest.
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();

        sim.step(&mut body, &mut controls, &mut [], DT);
        assert_relative_eq!(body.vertical_velocity, -GRAVITY * DT);
        sim.step(&mut body, &mut controls, &mut [], DT);
        assert_eq!(body.vertical_velocity, 0.0);
    }

    #[test]
    fn vertical_dominant_overlap_lands_feet_on_obstacle_top() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        // Box below the feet: spans y in [-125, -75]; the body has sunk one
        // unit into it.
        let mut obstacles = vec![obstacle_at(Vec3::new(0.0, -100.0, 0.0))];
        body.position.y = -76.0;
        body.vertical_velocity = -3.0;

        sim.resolve_collisions(&mut body, &mut obstacles);

        assert_eq!(body.position.y, -75.0);
        assert_eq!(body.vertical_velocity, 0.0);
    }

    #[test]
    fn vertical_dominant_from_below_pushes_under() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        // Box overhead spanning y in [175, 225]; the body's head pokes in.
        let mut obstacles = vec![obstacle_at(Vec3::new(0.0, 200.0, 0.0))];
        body.vertical_velocity = 4.0;

        sim.resolve_collisions(&mut body, &mut obstacles);

        // Pushed below the obstacle bottom by the body's own height.
        assert_eq!(body.position.y, 175.0 - 180.0);
        assert_eq!(body.vertical_velocity, 0.0);
    }

    #[test]
    fn spec_scenario_depth_axis_pushout() {
        let sim = MovementSystem::new();
        let mut body = centered_body();
        // Entity at the origin, obstacle centered at (0, 0, -30) with half
        // extents (25, 25, 20): the boxes meet on z and the push direction
        // is dominated by z.
        let mut obstacles = vec![obstacle_at(Vec3::new(0.0, 0.0, -30.0))];
        body.vertical_velocity = -2.5;

        sim.resolve_collisions(&mut body, &mut obstacles);

        assert_eq!(body.position.z, -10.0); // obstacle max z
        assert_eq!(body.position.x, 0.0);
        assert_eq!(body.position.y, 0.0);
        // Horizontal resolution leaves vertical velocity untouched.
        assert_eq!(body.vertical_velocity, -2.5);
    }

    #[test]
    fn horizontal_dominant_pushes_to_negative_face_with_body_width() {
        let sim = MovementSystem::new();
        let mut body = centered_body();
        // Obstacle to the body's positive-x side, spanning x in [5, 55].
        let mut obstacles = vec![obstacle_at(Vec3::new(30.0, 10.0, 0.0))];
        body.position.x = -2.0;

        sim.resolve_collisions(&mut body, &mut obstacles);

        // min x face minus the body's 20-unit width.
        assert_eq!(body.position.x, 5.0 - 20.0);
        assert_eq!(body.position.z, 0.0);
        // The resolved axis is x; the obstacle's other axes left the body's
        // y and z alone.
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn horizontal_pushout_separates_the_boxes() {
        let sim = MovementSystem::new();
        let mut body = centered_body();
        let mut obstacles = vec![obstacle_at(Vec3::new(30.0, 10.0, 0.0))];
        body.position.x = -2.0;

        sim.resolve_collisions(&mut body, &mut obstacles);

        // After the negative-side push-out the boxes no longer overlap on x.
        let body_box = body.bounds();
        assert!(body_box.max.x <= obstacles[0].bounds.min.x);
        assert!(!body_box.intersects(&obstacles[0].bounds));
    }

    #[test]
    fn resolution_is_idempotent_for_separated_pairs() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut obstacles = vec![obstacle_at(Vec3::new(300.0, 10.0, 300.0))];
        body.position = Vec3::new(1.0, 0.0, 2.0);
        body.vertical_velocity = -1.0;

        sim.resolve_collisions(&mut body, &mut obstacles);

        assert_eq!(body.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(body.vertical_velocity, -1.0);
    }

    #[test]
    fn sweep_tests_against_the_box_cached_at_sweep_start() {
        let sim = MovementSystem::new();
        let mut body = centered_body();
        // The first obstacle pushes the body to x = -25. The second obstacle
        // overlaps that NEW position but not the cached starting box, so it
        // is skipped this frame.
        let mut obstacles = vec![
            obstacle_at(Vec3::new(20.0, 0.0, 0.0)),
            obstacle_at(Vec3::new(-40.0, 0.0, 0.0)),
        ];

        sim.resolve_collisions(&mut body, &mut obstacles);

        assert_eq!(body.position.x, -5.0 - 20.0);
        // A second sweep from the new position does see the second obstacle.
        sim.resolve_collisions(&mut body, &mut obstacles);
        assert_ne!(body.position.x, -25.0);
    }

    #[test]
    fn ground_level_holds_across_many_frames() {
        let sim = MovementSystem::new();
        let mut body = standing_body();
        let mut controls = ControlState::new();
        controls.forward = true;
        controls.right = true;

        for frame in 0..600 {
            if frame % 120 == 0 && body.vertical_velocity == 0.0 {
                controls.key_down(Intent::Jump, Some(&mut body));
            }
            sim.step(&mut body, &mut controls, &mut [], DT);
            assert!(body.position.y >= 0.0);
        }
        // Movement kept running the whole time.
        assert!(body.position.z < 0.0);
        assert!(body.position.x > 0.0);
    }

    #[test]
    fn obstacle_bounds_refresh_from_transform() {
        let mut obstacle = obstacle_at(Vec3::new(1.0, 2.0, 3.0));
        obstacle.bounds = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        obstacle.refresh_bounds();
        assert_eq!(obstacle.bounds.min, Vec3::new(-24.0, -23.0, -17.0));
        assert_eq!(obstacle.bounds.max, Vec3::new(26.0, 27.0, 23.0));
    }
}
