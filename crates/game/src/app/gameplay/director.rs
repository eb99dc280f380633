use std::time::Duration;

use fallhouse_engine::{CameraPose, Rgb, SceneError, SoundCue, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::camera_rig::CameraError;
use super::session::SessionContext;
use super::state::{CameraWriter, GameState, TransitionError};
use crate::app::config::DirectorConfig;

const WIND_SOUND: &str = "wind";
const WIND_VOLUME: f32 = 0.6;
const HOUSE_OBJECTIVE: &str = "Find the missing parts";

#[derive(Debug, Error)]
pub(crate) enum DirectorError {
    #[error("the intro sequence is already running")]
    SequenceAlreadyRunning,
    #[error("the intro sequence cannot start from {state}")]
    InvalidStart { state: GameState },
    #[error("no sequence is running")]
    NotRunning,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// One step of the intro script. Multi-step cues (`Walk`, `Fall`) suspend
/// between their own steps; every other cue runs to completion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cue {
    Enter(GameState),
    LockControl,
    ReleaseControl,
    ShowGui(bool),
    PlaceCamera { position: Vec3, look_at: Vec3 },
    Teleport(CameraPose),
    Caption(String),
    Overlay(Option<Rgb>),
    PlayLoop { name: &'static str, volume: f32 },
    StopSound(&'static str),
    Wait(Duration),
    Walk { delta: Vec3, steps: u32, tick: Duration },
    Fall {
        gravity: f32,
        floor_y: f32,
        portal_spin: f32,
        tick: Duration,
        max_steps: u32,
    },
}

enum Flow {
    Next,
    Suspend(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    index: usize,
    resume_at: Duration,
    step: u32,
    velocity: f32,
}

/// Result of one [`SceneDirector::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectorStatus {
    Idle,
    Running,
    Finished,
}

pub(crate) fn intro_script(config: &DirectorConfig, spawn: CameraPose) -> Vec<Cue> {
    let tick = config.step_tick();
    let mut script = vec![
        Cue::Enter(GameState::Intro),
        Cue::LockControl,
        Cue::ShowGui(false),
        Cue::PlaceCamera {
            position: config.roof_vantage,
            look_at: config.roof_look_at,
        },
        Cue::Caption(config.intro_caption.clone()),
        Cue::Wait(Duration::from_millis(config.intro_hold_ms)),
        Cue::Walk {
            delta: config.walk_delta,
            steps: config.walk_steps,
            tick,
        },
        Cue::Enter(GameState::Falling),
        Cue::PlayLoop {
            name: WIND_SOUND,
            volume: WIND_VOLUME,
        },
        Cue::Fall {
            gravity: config.fall_gravity_per_step,
            floor_y: config.void_threshold_y,
            portal_spin: config.portal_spin_per_step,
            tick,
            max_steps: config.fall_max_steps,
        },
        Cue::StopSound(WIND_SOUND),
        Cue::Enter(GameState::Void),
        Cue::Overlay(Some(Rgb::BLACK)),
    ];

    let mut captions: Vec<_> = config.void_captions.iter().collect();
    captions.sort_by_key(|caption| caption.at_ms);
    let mut elapsed_ms = 0u64;
    for caption in captions {
        let at_ms = caption.at_ms.min(config.void_duration_ms);
        if at_ms > elapsed_ms {
            script.push(Cue::Wait(Duration::from_millis(at_ms - elapsed_ms)));
            elapsed_ms = at_ms;
        }
        script.push(Cue::Caption(caption.text.clone()));
    }
    if config.void_duration_ms > elapsed_ms {
        script.push(Cue::Wait(Duration::from_millis(
            config.void_duration_ms - elapsed_ms,
        )));
    }

    script.extend([
        Cue::Overlay(None),
        Cue::Teleport(spawn),
        Cue::Enter(GameState::House),
        Cue::ReleaseControl,
        Cue::ShowGui(true),
    ]);
    script
}

/// Runs the intro script against a session's virtual clock.
///
/// Time only moves through `advance`. Suspensions accumulate onto the
/// scheduled resume time rather than the observed clock, so a late or large
/// clock step replays every due cue in order without drifting the schedule.
#[derive(Debug)]
pub(crate) struct SceneDirector {
    script: Vec<Cue>,
    spawn: CameraPose,
    cursor: Option<Cursor>,
}

impl SceneDirector {
    pub(crate) fn new(config: &DirectorConfig, spawn: CameraPose) -> Self {
        Self::with_script(intro_script(config, spawn), spawn)
    }

    pub(crate) fn with_script(script: Vec<Cue>, spawn: CameraPose) -> Self {
        Self {
            script,
            spawn,
            cursor: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    pub(crate) fn start(
        &mut self,
        ctx: &mut SessionContext,
    ) -> Result<DirectorStatus, DirectorError> {
        if self.cursor.is_some() {
            warn!("director_start_rejected");
            return Err(DirectorError::SequenceAlreadyRunning);
        }
        let state = ctx.state.current();
        if !matches!(state, GameState::Loading | GameState::Menu) {
            return Err(DirectorError::InvalidStart { state });
        }
        let now = ctx.clock.now();
        self.cursor = Some(Cursor {
            index: 0,
            resume_at: now,
            step: 0,
            velocity: 0.0,
        });
        info!(
            cues = self.script.len(),
            at_ms = now.as_millis() as u64,
            "director_started"
        );
        self.advance(ctx)
    }

    /// Runs every cue that is due at the session's current time.
    pub(crate) fn advance(
        &mut self,
        ctx: &mut SessionContext,
    ) -> Result<DirectorStatus, DirectorError> {
        let Some(mut cursor) = self.cursor else {
            return Ok(DirectorStatus::Idle);
        };
        let now = ctx.clock.now();

        while cursor.resume_at <= now {
            let Some(cue) = self.script.get(cursor.index) else {
                self.cursor = None;
                info!(at_ms = now.as_millis() as u64, "director_finished");
                return Ok(DirectorStatus::Finished);
            };
            let flow = match run_cue(cue, &mut cursor, ctx) {
                Ok(flow) => flow,
                Err(error) => {
                    self.cursor = None;
                    return Err(error);
                }
            };
            match flow {
                Flow::Next => {}
                Flow::Suspend(delay) => {
                    cursor.resume_at = cursor.resume_at.saturating_add(delay);
                }
            }
        }

        self.cursor = Some(cursor);
        Ok(DirectorStatus::Running)
    }

    /// Skips the rest of the sequence and drops the player into the house.
    pub(crate) fn cancel(&mut self, ctx: &mut SessionContext) -> Result<(), DirectorError> {
        let Some(cursor) = self.cursor.take() else {
            return Err(DirectorError::NotRunning);
        };
        let state = ctx.state.current();
        ctx.audio.stop(WIND_SOUND);
        ctx.hud.hide_caption();
        ctx.hud.set_overlay(None);
        if state.camera_writer() == Some(CameraWriter::Director) {
            let spawn = self.spawn;
            ctx.camera
                .write(state, CameraWriter::Director, |pose| *pose = spawn)?;
        }
        if state != GameState::House {
            ctx.state.transition(GameState::House)?;
        }
        enter_house(ctx);
        info!(
            skipped_at_cue = cursor.index,
            from = state.as_token(),
            "director_cancelled"
        );
        Ok(())
    }

    /// Forgets any in-flight sequence without touching the session.
    pub(crate) fn reset(&mut self) {
        self.cursor = None;
    }
}

fn run_cue(
    cue: &Cue,
    cursor: &mut Cursor,
    ctx: &mut SessionContext,
) -> Result<Flow, DirectorError> {
    let state = ctx.state.current();
    match cue {
        Cue::Enter(next) => {
            ctx.state.transition(*next)?;
        }
        Cue::LockControl => ctx.progress.set_can_move(false),
        Cue::ReleaseControl => ctx.progress.set_can_move(true),
        Cue::ShowGui(false) => ctx.hud.set_gui_visible(false),
        Cue::ShowGui(true) => enter_house(ctx),
        Cue::PlaceCamera { position, look_at } => {
            let pose = CameraPose::looking_at(*position, *look_at);
            ctx.camera
                .write(state, CameraWriter::Director, |current| *current = pose)?;
        }
        Cue::Teleport(pose) => {
            let pose = *pose;
            ctx.camera
                .write(state, CameraWriter::Director, |current| *current = pose)?;
        }
        Cue::Caption(text) => ctx.hud.show_caption(text, cursor.resume_at),
        Cue::Overlay(color) => ctx.hud.set_overlay(*color),
        Cue::PlayLoop { name, volume } => {
            ctx.audio.play(SoundCue::looped(*name, *volume));
        }
        Cue::StopSound(name) => ctx.audio.stop(*name),
        Cue::Wait(delay) => {
            cursor.index += 1;
            return Ok(Flow::Suspend(*delay));
        }
        Cue::Walk { delta, steps, tick } => {
            if cursor.step >= *steps {
                cursor.step = 0;
                cursor.index += 1;
                return Ok(Flow::Next);
            }
            let delta = *delta;
            ctx.camera
                .write(state, CameraWriter::Director, |pose| pose.position += delta)?;
            cursor.step += 1;
            return Ok(Flow::Suspend(*tick));
        }
        Cue::Fall {
            gravity,
            floor_y,
            portal_spin,
            tick,
            max_steps,
        } => {
            let height = ctx.camera.pose().position.y;
            if height < *floor_y || cursor.step >= *max_steps {
                debug!(steps = cursor.step, height, "fall_finished");
                cursor.step = 0;
                cursor.velocity = 0.0;
                cursor.index += 1;
                return Ok(Flow::Next);
            }
            cursor.velocity += gravity;
            let velocity = cursor.velocity;
            ctx.camera.write(state, CameraWriter::Director, |pose| {
                pose.position.y -= velocity;
            })?;
            ctx.scene.transform_mut(ctx.world.portal)?.rotation.z += portal_spin;
            cursor.step += 1;
            return Ok(Flow::Suspend(*tick));
        }
    }
    cursor.index += 1;
    Ok(Flow::Next)
}

fn enter_house(ctx: &mut SessionContext) {
    ctx.progress.set_can_move(true);
    ctx.hud.set_gui_visible(true);
    ctx.hud.set_objective(HOUSE_OBJECTIVE);
    ctx.hud.refresh_inventory(&ctx.progress, ctx.required_parts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::TimedCaption;

    #[test]
    fn default_script_walks_states_in_order() {
        let config = DirectorConfig::default();
        let script = intro_script(&config, CameraPose::default());
        let states: Vec<_> = script
            .iter()
            .filter_map(|cue| match cue {
                Cue::Enter(state) => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                GameState::Intro,
                GameState::Falling,
                GameState::Void,
                GameState::House
            ]
        );
    }

    #[test]
    fn void_waits_land_captions_on_their_offsets() {
        let config = DirectorConfig {
            void_captions: vec![
                TimedCaption {
                    at_ms: 4000,
                    text: "second".to_string(),
                },
                TimedCaption {
                    at_ms: 1000,
                    text: "first".to_string(),
                },
            ],
            void_duration_ms: 8000,
            ..DirectorConfig::default()
        };
        let script = intro_script(&config, CameraPose::default());
        let void_start = script
            .iter()
            .position(|cue| *cue == Cue::Enter(GameState::Void))
            .expect("void cue");
        let tail: Vec<_> = script[void_start..]
            .iter()
            .filter(|cue| matches!(cue, Cue::Wait(_) | Cue::Caption(_)))
            .cloned()
            .collect();
        assert_eq!(
            tail,
            vec![
                Cue::Wait(Duration::from_millis(1000)),
                Cue::Caption("first".to_string()),
                Cue::Wait(Duration::from_millis(3000)),
                Cue::Caption("second".to_string()),
                Cue::Wait(Duration::from_millis(4000)),
            ]
        );
    }
}
