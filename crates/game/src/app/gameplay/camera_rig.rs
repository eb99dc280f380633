use fallhouse_engine::CameraPose;
use thiserror::Error;
use tracing::warn;

use super::state::{CameraWriter, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum CameraError {
    #[error("{writer:?} may not move the camera while in {state}")]
    NotAuthorized {
        writer: CameraWriter,
        state: GameState,
    },
}

/// Sole owner of the camera pose. Every write names its writer and is checked
/// against the current state's authority.
#[derive(Debug, Default)]
pub(crate) struct CameraRig {
    pose: CameraPose,
    director_wrote_this_tick: bool,
    player_wrote_this_tick: bool,
    peak_writers_per_tick: u8,
    rejected_writes: u32,
}

impl CameraRig {
    pub(crate) fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub(crate) fn write(
        &mut self,
        state: GameState,
        writer: CameraWriter,
        apply: impl FnOnce(&mut CameraPose),
    ) -> Result<(), CameraError> {
        if state.camera_writer() != Some(writer) {
            self.rejected_writes = self.rejected_writes.saturating_add(1);
            warn!(writer = ?writer, state = state.as_token(), "camera_write_rejected");
            return Err(CameraError::NotAuthorized { writer, state });
        }
        apply(&mut self.pose);
        match writer {
            CameraWriter::Director => self.director_wrote_this_tick = true,
            CameraWriter::Player => self.player_wrote_this_tick = true,
        }
        let writers = self.director_wrote_this_tick as u8 + self.player_wrote_this_tick as u8;
        self.peak_writers_per_tick = self.peak_writers_per_tick.max(writers);
        Ok(())
    }

    pub(crate) fn end_tick(&mut self) {
        self.director_wrote_this_tick = false;
        self.player_wrote_this_tick = false;
    }

    /// Highest number of distinct writers observed within a single tick.
    pub(crate) fn peak_writers_per_tick(&self) -> u8 {
        self.peak_writers_per_tick
    }

    pub(crate) fn rejected_writes(&self) -> u32 {
        self.rejected_writes
    }

    /// Reset to a fixed pose outside any writer's authority; used on retry.
    pub(crate) fn reset(&mut self, pose: CameraPose) {
        *self = Self {
            pose,
            ..Self::default()
        };
    }
}
