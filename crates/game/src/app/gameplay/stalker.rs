use std::time::Duration;

use fallhouse_engine::{NodeId, Rgb, SceneError, SoundCue, Vec3};
use thiserror::Error;
use tracing::info;

use super::session::SessionContext;
use super::state::{GameState, TransitionError};
use crate::app::config::StalkerConfig;

const HEARTBEAT_SOUND: &str = "heartbeat";
const CAUGHT_CAPTION: &str = "it found you.";

#[derive(Debug, Error)]
pub(crate) enum StalkerError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StalkerPhase {
    Dormant,
    Hunting,
    Caught,
}

/// The thing in the house. Wakes a fixed time after the player arrives and
/// walks straight at them along the floor.
#[derive(Debug)]
pub(crate) struct Stalker {
    node: NodeId,
    speed: f32,
    catch_radius: f32,
    activate_after: Duration,
    arrived_at: Option<Duration>,
    phase: StalkerPhase,
}

impl Stalker {
    pub(crate) fn new(config: &StalkerConfig, node: NodeId) -> Self {
        Self {
            node,
            speed: config.speed,
            catch_radius: config.catch_radius,
            activate_after: Duration::from_millis(config.activate_after_ms),
            arrived_at: None,
            phase: StalkerPhase::Dormant,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> StalkerPhase {
        self.phase
    }

    pub(crate) fn update(
        &mut self,
        ctx: &mut SessionContext,
        dt: Duration,
    ) -> Result<StalkerPhase, StalkerError> {
        if !ctx.state.is(GameState::House) || !ctx.progress.can_move() {
            return Ok(self.phase);
        }
        let now = ctx.clock.now();
        let arrived_at = *self.arrived_at.get_or_insert(now);

        if self.phase == StalkerPhase::Dormant {
            if now.saturating_sub(arrived_at) < self.activate_after {
                return Ok(self.phase);
            }
            self.phase = StalkerPhase::Hunting;
            ctx.scene.set_visible(self.node, true)?;
            ctx.audio.play(SoundCue::looped(HEARTBEAT_SOUND, 0.8));
            info!(
                after_ms = self.activate_after.as_millis() as u64,
                "stalker_activated"
            );
        }
        if self.phase != StalkerPhase::Hunting {
            return Ok(self.phase);
        }

        let player = ctx.camera.pose().position;
        let position = ctx.scene.world_position(self.node)?;
        let mut offset = player - position;
        offset.y = 0.0;
        let distance = offset.length();

        if distance > self.catch_radius {
            let step = (self.speed * dt.as_secs_f32()).min(distance);
            let heading = offset.normalize_or_zero();
            ctx.scene.transform_mut(self.node)?.position += heading * step;
        }

        let remaining = flat_distance(player, ctx.scene.world_position(self.node)?);
        if remaining <= self.catch_radius {
            self.phase = StalkerPhase::Caught;
            ctx.progress.set_can_move(false);
            ctx.state.transition(GameState::GameOver)?;
            ctx.audio.stop(HEARTBEAT_SOUND);
            ctx.audio.play(SoundCue::once("scream"));
            ctx.hud.set_overlay(Some(Rgb::BLOOD));
            ctx.hud.show_caption(CAUGHT_CAPTION, now);
            info!(distance = remaining, "player_caught");
        }
        Ok(self.phase)
    }
}

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let mut offset = a - b;
    offset.y = 0.0;
    offset.length()
}
