use std::f32::consts::{PI, TAU};
use std::time::Duration;

use fallhouse_engine::keys::{ElementState, KeyCode, MouseButton, PhysicalKey};
use fallhouse_engine::{InputCollector, InputSnapshot, LoopControl, Simulation, Vec3};
use tracing::info;

use super::gameplay::{GameSession, GameState, InteractableKind, SessionContext};

const ARRIVE_DISTANCE: f32 = 0.5;
const SPRINT_DISTANCE: f32 = 3.0;
const YAW_TOLERANCE: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Wait,
    LightUp,
    GoTo { kind: InteractableKind, target: Vec3 },
}

/// Plays the house section by synthesizing keyboard and mouse events, the
/// same way a window would feed [`InputCollector`].
pub(crate) struct Walkthrough {
    session: GameSession,
    input: InputCollector,
    current_goal: Option<InteractableKind>,
}

impl Walkthrough {
    pub(crate) fn new(session: GameSession) -> Self {
        Self {
            session,
            input: InputCollector::new(),
            current_goal: None,
        }
    }

    pub(crate) fn into_session(self) -> GameSession {
        self.session
    }

    fn drive(&mut self) {
        let required_parts = self.session.config().quest.required_parts;
        match plan(self.session.context(), required_parts) {
            Step::Wait => self.hold_movement(false, false),
            Step::LightUp => {
                self.hold_movement(false, false);
                self.tap(KeyCode::KeyF);
            }
            Step::GoTo { kind, target } => {
                if !self.input.pointer_locked() {
                    self.click();
                }
                if self.current_goal != Some(kind) {
                    self.current_goal = Some(kind);
                    info!(goal = kind.as_token(), "autopilot_goal");
                }
                self.steer_towards(target);
            }
        }
    }

    fn steer_towards(&mut self, target: Vec3) {
        let pose = *self.session.camera_pose();
        let mut offset = target - pose.position;
        offset.y = 0.0;
        let distance = offset.length();

        if distance > f32::EPSILON {
            let desired_yaw = (-offset.x).atan2(-offset.z);
            let error = wrap_angle(desired_yaw - pose.yaw);
            if error.abs() > YAW_TOLERANCE {
                let sensitivity = self.session.config().player.mouse_sensitivity;
                self.input
                    .handle_mouse_motion(f64::from(-error / sensitivity), 0.0);
            }
        }

        if distance > ARRIVE_DISTANCE {
            self.hold_movement(true, distance > SPRINT_DISTANCE);
        } else {
            self.hold_movement(false, false);
            self.tap(KeyCode::KeyE);
        }
    }

    fn hold_movement(&mut self, forward: bool, sprint: bool) {
        self.key(KeyCode::KeyW, forward);
        self.key(KeyCode::ShiftLeft, sprint);
    }

    fn key(&mut self, code: KeyCode, down: bool) {
        let state = if down {
            ElementState::Pressed
        } else {
            ElementState::Released
        };
        self.input.handle_key(PhysicalKey::Code(code), state);
    }

    fn tap(&mut self, code: KeyCode) {
        self.key(code, true);
        self.key(code, false);
    }

    fn click(&mut self) {
        self.input
            .handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        self.input
            .handle_mouse_button(MouseButton::Left, ElementState::Released);
    }
}

impl Simulation for Walkthrough {
    fn update(&mut self, fixed_dt: Duration, _window: &InputSnapshot) -> LoopControl {
        self.drive();
        let snapshot = self.input.snapshot_for_tick();
        self.session.update(fixed_dt, &snapshot)
    }
}

/// Picks the next thing to walk to from the live session state.
fn plan(ctx: &SessionContext, required_parts: u32) -> Step {
    if !ctx.state.is(GameState::House) || !ctx.progress.can_move() {
        return Step::Wait;
    }
    let player = ctx.camera.pose().position;
    let nearest = |kind: InteractableKind| -> Option<Vec3> {
        ctx.registry
            .pending()
            .filter(|entry| entry.kind == kind)
            .filter_map(|entry| ctx.scene.world_position(entry.node).ok())
            .min_by(|a, b| player.distance(*a).total_cmp(&player.distance(*b)))
    };
    let go = |kind: InteractableKind| match nearest(kind) {
        Some(target) => Step::GoTo { kind, target },
        None => Step::Wait,
    };

    let progress = &ctx.progress;
    let parts_left = nearest(InteractableKind::Part).is_some();
    if progress.collected_parts() < required_parts && parts_left {
        return go(InteractableKind::Part);
    }
    if !progress.has_key() {
        return go(InteractableKind::Key);
    }
    if !progress.crafted() {
        if !progress.flashlight_on() {
            return Step::LightUp;
        }
        return go(InteractableKind::CraftingTable);
    }
    if !progress.path_cleared() {
        return go(InteractableKind::Furniture);
    }
    go(InteractableKind::Vent)
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}
