use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    StrafeLeft,
    StrafeRight,
    Sprint,
    Interact,
    ToggleFlashlight,
    Skip,
    Quit,
}

const ACTION_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::StrafeLeft => 2,
            InputAction::StrafeRight => 3,
            InputAction::Sprint => 4,
            InputAction::Interact => 5,
            InputAction::ToggleFlashlight => 6,
            InputAction::Skip => 7,
            InputAction::Quit => 8,
        }
    }
}

/// Input as seen by one simulation tick.
///
/// Held actions report their current state; `*_pressed` flags are edges that
/// fire on the first tick after the key went down. Mouse motion is the
/// accumulated delta since the previous tick, in pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    interact_pressed: bool,
    flashlight_pressed: bool,
    skip_pressed: bool,
    quit_requested: bool,
    mouse_delta: (f32, f32),
    pointer_locked: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_pressed(mut self, pressed: bool) -> Self {
        self.interact_pressed = pressed;
        self
    }

    pub fn with_flashlight_pressed(mut self, pressed: bool) -> Self {
        self.flashlight_pressed = pressed;
        self
    }

    pub fn with_skip_pressed(mut self, pressed: bool) -> Self {
        self.skip_pressed = pressed;
        self
    }

    pub fn with_mouse_delta(mut self, dx: f32, dy: f32) -> Self {
        self.mouse_delta = (dx, dy);
        self
    }

    pub fn with_pointer_locked(mut self, locked: bool) -> Self {
        self.pointer_locked = locked;
        self
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn flashlight_pressed(&self) -> bool {
        self.flashlight_pressed
    }

    pub fn skip_pressed(&self) -> bool {
        self.skip_pressed
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct EdgeLatch {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeLatch {
    fn update(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        let was_pressed = self.pressed_edge;
        self.pressed_edge = false;
        was_pressed
    }
}

/// Folds raw keyboard and mouse events into per-tick snapshots.
///
/// Mouse motion only counts while the pointer is captured; the first left
/// click captures it instead of interacting.
#[derive(Debug, Default)]
pub struct InputCollector {
    action_states: ActionStates,
    interact: EdgeLatch,
    click: EdgeLatch,
    flashlight: EdgeLatch,
    skip: EdgeLatch,
    quit_requested: bool,
    pointer_locked: bool,
    mouse_dx: f64,
    mouse_dy: f64,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.action_states.set(InputAction::MoveForward, is_pressed);
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::MoveBack, is_pressed);
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::StrafeLeft, is_pressed);
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::StrafeRight, is_pressed);
            }
            KeyCode::Space | KeyCode::ShiftLeft => {
                self.action_states.set(InputAction::Sprint, is_pressed);
            }
            KeyCode::KeyE => {
                self.action_states.set(InputAction::Interact, is_pressed);
                self.interact.update(state);
            }
            KeyCode::KeyF => {
                self.action_states
                    .set(InputAction::ToggleFlashlight, is_pressed);
                self.flashlight.update(state);
            }
            KeyCode::Enter => {
                self.action_states.set(InputAction::Skip, is_pressed);
                self.skip.update(state);
            }
            KeyCode::Escape => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.quit_requested = true;
                }
            }
            _ => {}
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        if !self.pointer_locked {
            if state == ElementState::Pressed {
                self.pointer_locked = true;
            }
            return;
        }
        self.click.update(state);
    }

    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if !self.pointer_locked {
            return;
        }
        self.mouse_dx += dx;
        self.mouse_dy += dy;
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let interact_key = self.interact.take();
        let interact_click = self.click.take();
        let snapshot = InputSnapshot {
            actions: self.action_states,
            interact_pressed: interact_key || interact_click,
            flashlight_pressed: self.flashlight.take(),
            skip_pressed: self.skip.take(),
            quit_requested: self.quit_requested,
            mouse_delta: (self.mouse_dx as f32, self.mouse_dy as f32),
            pointer_locked: self.pointer_locked,
        };
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(collector: &mut InputCollector, code: KeyCode) {
        collector.handle_key(PhysicalKey::Code(code), ElementState::Pressed);
    }

    fn release(collector: &mut InputCollector, code: KeyCode) {
        collector.handle_key(PhysicalKey::Code(code), ElementState::Released);
    }

    #[test]
    fn held_movement_key_stays_down_across_ticks() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::KeyW);

        assert!(collector.snapshot_for_tick().is_down(InputAction::MoveForward));
        assert!(collector.snapshot_for_tick().is_down(InputAction::MoveForward));

        release(&mut collector, KeyCode::KeyW);
        assert!(!collector.snapshot_for_tick().is_down(InputAction::MoveForward));
    }

    #[test]
    fn interact_edge_fires_once_per_press() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::KeyE);
        // key repeat while held must not retrigger
        press(&mut collector, KeyCode::KeyE);

        assert!(collector.snapshot_for_tick().interact_pressed());
        assert!(!collector.snapshot_for_tick().interact_pressed());

        release(&mut collector, KeyCode::KeyE);
        press(&mut collector, KeyCode::KeyE);
        assert!(collector.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn first_click_captures_pointer_instead_of_interacting() {
        let mut collector = InputCollector::new();
        collector.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        collector.handle_mouse_button(MouseButton::Left, ElementState::Released);

        let first = collector.snapshot_for_tick();
        assert!(first.pointer_locked());
        assert!(!first.interact_pressed());

        collector.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(collector.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn mouse_motion_ignored_until_pointer_locked() {
        let mut collector = InputCollector::new();
        collector.handle_mouse_motion(10.0, 5.0);
        assert_eq!(collector.snapshot_for_tick().mouse_delta(), (0.0, 0.0));

        collector.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        collector.handle_mouse_button(MouseButton::Left, ElementState::Released);
        collector.handle_mouse_motion(10.0, 5.0);
        collector.handle_mouse_motion(2.0, -1.0);
        assert_eq!(collector.snapshot_for_tick().mouse_delta(), (12.0, 4.0));
        assert_eq!(collector.snapshot_for_tick().mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn escape_latches_quit() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::Escape);
        release(&mut collector, KeyCode::Escape);
        assert!(collector.snapshot_for_tick().quit_requested());
        assert!(collector.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn sprint_accepts_space_or_left_shift() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::ShiftLeft);
        assert!(collector.snapshot_for_tick().is_down(InputAction::Sprint));
        release(&mut collector, KeyCode::ShiftLeft);
        press(&mut collector, KeyCode::Space);
        assert!(collector.snapshot_for_tick().is_down(InputAction::Sprint));
    }
}
