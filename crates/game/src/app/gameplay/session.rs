use std::f32::consts::TAU;
use std::time::Duration;

use fallhouse_engine::{
    AudioHost, CameraPose, HudHost, InputAction, InputSnapshot, LoopControl, NodeId, SceneError,
    SceneGraph, SilentAudio, SimClock, Simulation, SoundCue,
};
#[cfg(test)]
use fallhouse_engine::Vec3;
use thiserror::Error;
use tracing::{debug, error, info};

use super::camera_rig::{CameraError, CameraRig};
use super::director::{DirectorError, DirectorStatus, SceneDirector};
use super::hud::HudController;
use super::interactables::InteractableRegistry;
use super::progress::PlayerProgress;
use super::resolver::{InteractError, InteractionResolver, ResolveReport};
#[cfg(test)]
use super::stalker::StalkerPhase;
use super::stalker::{Stalker, StalkerError};
use super::state::{CameraWriter, GameState, StateMachine, TransitionError};
use super::world::{build_world, WorldHandles};
use crate::app::config::{ConfigError, GameConfig};

const CLOCK_HAND_RADIANS_PER_SECOND: f32 = -2.0;
const FOOTSTEP_SOUND: &str = "footstep";
const LOOPED_SOUNDS: [&str; 2] = ["wind", "heartbeat"];

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("no HUD host was provided")]
    MissingHost,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build the world: {0}")]
    World(#[from] SceneError),
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error(transparent)]
    Director(#[from] DirectorError),
    #[error(transparent)]
    Interact(#[from] InteractError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Stalker(#[from] StalkerError),
}

/// Everything one play session mutates. The director, resolver and stalker
/// all operate on this instead of on shared globals, so sessions never see
/// each other.
pub(crate) struct SessionContext {
    pub(crate) clock: SimClock,
    pub(crate) state: StateMachine,
    pub(crate) progress: PlayerProgress,
    pub(crate) camera: CameraRig,
    pub(crate) scene: SceneGraph,
    pub(crate) registry: InteractableRegistry,
    pub(crate) world: WorldHandles,
    pub(crate) hand: Option<NodeId>,
    pub(crate) hud: HudController,
    pub(crate) audio: Box<dyn AudioHost>,
    pub(crate) required_parts: u32,
}

pub(crate) struct GameSessionBuilder {
    config: GameConfig,
    hud: Option<Box<dyn HudHost>>,
    audio: Option<Box<dyn AudioHost>>,
}

impl GameSessionBuilder {
    pub(crate) fn new(config: GameConfig) -> Self {
        Self {
            config,
            hud: None,
            audio: None,
        }
    }

    pub(crate) fn hud(mut self, host: impl HudHost + 'static) -> Self {
        self.hud = Some(Box::new(host));
        self
    }

    pub(crate) fn audio(mut self, host: impl AudioHost + 'static) -> Self {
        self.audio = Some(Box::new(host));
        self
    }

    pub(crate) fn build(self) -> Result<GameSession, StartupError> {
        let Self { config, hud, audio } = self;
        config.validate()?;
        let hud = hud.ok_or(StartupError::MissingHost)?;
        let audio = audio.unwrap_or_else(|| Box::new(SilentAudio));

        let mut scene = SceneGraph::default();
        let mut registry = InteractableRegistry::default();
        let world = build_world(
            &config.world,
            &config.quest,
            config.stalker.as_ref(),
            &mut scene,
            &mut registry,
        )?;
        let stalker = build_stalker(&config, &world);

        let ctx = SessionContext {
            clock: SimClock::new(),
            state: StateMachine::default(),
            progress: PlayerProgress::default(),
            camera: CameraRig::default(),
            scene,
            registry,
            world,
            hand: None,
            hud: HudController::new(hud, &config.hud),
            audio,
            required_parts: config.quest.required_parts,
        };
        let director = SceneDirector::new(&config.director, config.spawn_pose());
        let resolver = InteractionResolver::new(&config.quest, config.world.furniture_push);

        info!(
            required_parts = config.quest.required_parts,
            policy = ?config.quest.match_policy,
            stalker = stalker.is_some(),
            "session_built"
        );
        Ok(GameSession {
            ctx,
            director,
            resolver,
            stalker,
            config,
            footstep_elapsed: Duration::ZERO,
        })
    }
}

fn build_stalker(config: &GameConfig, world: &WorldHandles) -> Option<Stalker> {
    match (config.stalker.as_ref(), world.stalker) {
        (Some(stalker), Some(node)) => Some(Stalker::new(stalker, node)),
        _ => None,
    }
}

/// One play-through: owns the session context plus the systems that drive it.
pub(crate) struct GameSession {
    ctx: SessionContext,
    director: SceneDirector,
    resolver: InteractionResolver,
    stalker: Option<Stalker>,
    config: GameConfig,
    footstep_elapsed: Duration,
}

impl GameSession {
    pub(crate) fn builder(config: GameConfig) -> GameSessionBuilder {
        GameSessionBuilder::new(config)
    }

    pub(crate) fn state(&self) -> GameState {
        self.ctx.state.current()
    }

    pub(crate) fn progress(&self) -> &PlayerProgress {
        &self.ctx.progress
    }

    pub(crate) fn camera_pose(&self) -> &CameraPose {
        self.ctx.camera.pose()
    }

    pub(crate) fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub(crate) fn config(&self) -> &GameConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> Duration {
        self.ctx.clock.now()
    }

    #[cfg(test)]
    pub(crate) fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    #[cfg(test)]
    pub(crate) fn director_running(&self) -> bool {
        self.director.is_running()
    }

    #[cfg(test)]
    pub(crate) fn resolver_mut(&mut self) -> &mut InteractionResolver {
        &mut self.resolver
    }

    #[cfg(test)]
    pub(crate) fn stalker_phase(&self) -> Option<StalkerPhase> {
        self.stalker.as_ref().map(Stalker::phase)
    }

    pub(crate) fn finish_loading(&mut self) -> Result<(), TransitionError> {
        self.ctx.state.transition(GameState::Menu)?;
        self.ctx.hud.set_gui_visible(false);
        Ok(())
    }

    pub(crate) fn start(&mut self) -> Result<DirectorStatus, DirectorError> {
        self.director.start(&mut self.ctx)
    }

    /// Cancels the running intro and drops straight into the house.
    pub(crate) fn skip(&mut self) -> Result<(), DirectorError> {
        self.director.cancel(&mut self.ctx)
    }

    pub(crate) fn interact(&mut self) -> Result<ResolveReport, InteractError> {
        let result = self.resolver.resolve(&mut self.ctx);
        self.ctx.scene.apply_pending();
        result
    }

    /// Moves the player directly; only valid while the player owns the camera.
    #[cfg(test)]
    pub(crate) fn place_player(&mut self, position: Vec3) -> Result<(), CameraError> {
        let state = self.ctx.state.current();
        self.ctx
            .camera
            .write(state, CameraWriter::Player, |pose| pose.position = position)
    }

    #[cfg(test)]
    pub(crate) fn set_flashlight(&mut self, on: bool) {
        self.ctx.progress.set_flashlight(on);
    }

    /// Advances the session by one fixed tick.
    pub(crate) fn tick(
        &mut self,
        dt: Duration,
        input: &InputSnapshot,
    ) -> Result<(), SessionError> {
        let now = self.ctx.clock.advance(dt);

        // The player takes over the tick after the director lets go.
        let director_tick = self.director.is_running();
        if input.skip_pressed() && director_tick {
            self.skip()?;
        } else {
            self.director.advance(&mut self.ctx)?;
        }
        self.ctx.hud.tick(now);

        if self.ctx.state.is(GameState::House) {
            if input.flashlight_pressed() {
                let on = self.ctx.progress.toggle_flashlight();
                self.ctx.audio.play(SoundCue::once("click"));
                debug!(on, "flashlight_toggled");
            }
            if self.ctx.progress.can_move() && !director_tick {
                self.apply_player_input(dt, input)?;
            }
            self.spin_clock_hand(now)?;
        }

        if input.interact_pressed() {
            if director_tick {
                debug!(
                    state = self.ctx.state.current().as_token(),
                    "interaction_rejected"
                );
            } else {
                match self.interact() {
                    Ok(report) if report.is_empty() => debug!("interaction_missed"),
                    Ok(_) => {}
                    // already logged and prompted by the resolver
                    Err(InteractError::PreconditionNotMet { .. }) => {}
                    Err(err @ InteractError::NotInteractive { .. })
                    | Err(err @ InteractError::ControlLocked) => {
                        debug!(reason = %err, "interaction_rejected");
                    }
                    Err(other) => return Err(other.into()),
                }
            }
        }

        if let Some(stalker) = self.stalker.as_mut() {
            stalker.update(&mut self.ctx, dt)?;
        }

        self.ctx.scene.apply_pending();
        self.ctx.camera.end_tick();
        Ok(())
    }

    fn apply_player_input(
        &mut self,
        dt: Duration,
        input: &InputSnapshot,
    ) -> Result<(), SessionError> {
        let state = self.ctx.state.current();
        let player = &self.config.player;

        let (dx, dy) = input.mouse_delta();
        if dx != 0.0 || dy != 0.0 {
            let sensitivity = player.mouse_sensitivity;
            self.ctx.camera.write(state, CameraWriter::Player, |pose| {
                pose.apply_mouse_delta(dx, dy, sensitivity);
            })?;
        }

        let axis = |positive: InputAction, negative: InputAction| -> f32 {
            input.is_down(positive) as i8 as f32 - input.is_down(negative) as i8 as f32
        };
        let forward = axis(InputAction::MoveForward, InputAction::MoveBack);
        let strafe = axis(InputAction::StrafeRight, InputAction::StrafeLeft);
        if forward == 0.0 && strafe == 0.0 {
            self.footstep_elapsed = Duration::ZERO;
            return Ok(());
        }

        let speed = if input.is_down(InputAction::Sprint) {
            player.sprint_speed
        } else {
            player.walk_speed
        };
        let pose = *self.ctx.camera.pose();
        let direction =
            (pose.forward_flat() * forward + pose.right_flat() * strafe).normalize_or_zero();
        let step = direction * speed * dt.as_secs_f32();
        self.ctx
            .camera
            .write(state, CameraWriter::Player, |pose| pose.position += step)?;

        self.footstep_elapsed = self.footstep_elapsed.saturating_add(dt);
        let interval = Duration::from_millis(player.footstep_interval_ms);
        if self.footstep_elapsed >= interval {
            self.footstep_elapsed -= interval;
            self.ctx.audio.play(SoundCue::once(FOOTSTEP_SOUND));
        }
        Ok(())
    }

    fn spin_clock_hand(&mut self, now: Duration) -> Result<(), SceneError> {
        let angle = (now.as_secs_f32() * CLOCK_HAND_RADIANS_PER_SECOND) % TAU;
        self.ctx.scene.transform_mut(self.ctx.world.clock_hand)?.rotation.z = angle;
        Ok(())
    }

    /// Resets a finished run back to the menu with a freshly built house.
    pub(crate) fn retry(&mut self) -> Result<(), SessionError> {
        let from = self.ctx.state.current();
        self.ctx.state.transition(GameState::Menu)?;

        self.director.reset();
        self.ctx.clock.reset();
        for name in LOOPED_SOUNDS {
            self.ctx.audio.stop(name);
        }
        self.ctx.hud.reset();
        self.ctx.progress.reset();
        self.ctx.camera.reset(CameraPose::default());
        self.ctx.scene.clear();
        self.ctx.registry.clear();
        self.ctx.hand = None;
        self.ctx.world = build_world(
            &self.config.world,
            &self.config.quest,
            self.config.stalker.as_ref(),
            &mut self.ctx.scene,
            &mut self.ctx.registry,
        )?;
        self.stalker = build_stalker(&self.config, &self.ctx.world);
        self.footstep_elapsed = Duration::ZERO;

        info!(from = from.as_token(), "session_reset");
        Ok(())
    }
}

impl Simulation for GameSession {
    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> LoopControl {
        if let Err(err) = self.tick(fixed_dt, input) {
            error!(
                error = %err,
                state = self.state().as_token(),
                "session_update_failed"
            );
            return LoopControl::Exit;
        }
        let state = self.state();
        if state.is_terminal() {
            let progress = &self.ctx.progress;
            info!(
                state = state.as_token(),
                parts = progress.collected_parts(),
                has_key = progress.has_key(),
                crafted = progress.crafted(),
                at_ms = self.now().as_millis() as u64,
                transitions = self.ctx.state.transitions(),
                camera_rejected = self.ctx.camera.rejected_writes(),
                camera_peak_writers = self.ctx.camera.peak_writers_per_tick(),
                "session_finished"
            );
            return LoopControl::Exit;
        }
        LoopControl::Continue
    }
}
