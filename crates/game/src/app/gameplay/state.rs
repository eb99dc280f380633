use std::fmt;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GameState {
    Loading,
    Menu,
    Intro,
    Falling,
    Void,
    House,
    End,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CameraWriter {
    Director,
    Player,
}

impl GameState {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Menu => "menu",
            Self::Intro => "intro",
            Self::Falling => "falling",
            Self::Void => "void",
            Self::House => "house",
            Self::End => "end",
            Self::GameOver => "game_over",
        }
    }

    pub(crate) fn is_cutscene(self) -> bool {
        matches!(self, Self::Intro | Self::Falling | Self::Void)
    }

    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::GameOver)
    }

    /// The only party allowed to move the camera in this state.
    pub(crate) fn camera_writer(self) -> Option<CameraWriter> {
        if self.is_cutscene() {
            return Some(CameraWriter::Director);
        }
        match self {
            Self::House => Some(CameraWriter::Player),
            _ => None,
        }
    }

    pub(crate) fn can_transition_to(self, next: GameState) -> bool {
        use GameState::*;
        match (self, next) {
            (Loading, Menu) | (Loading, Intro) | (Menu, Intro) => true,
            (Intro, Falling) | (Falling, Void) | (Void, House) => true,
            // cutscene skip
            (Intro, House) | (Falling, House) => true,
            (House, End) | (House, GameOver) => true,
            (End, Menu) | (GameOver, Menu) => true,
            _ => false,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid state transition {from} -> {to}")]
pub(crate) struct TransitionError {
    pub(crate) from: GameState,
    pub(crate) to: GameState,
}

/// Holds the single active [`GameState`] and rejects transitions outside the
/// table in [`GameState::can_transition_to`].
#[derive(Debug)]
pub(crate) struct StateMachine {
    current: GameState,
    transitions: u32,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            current: GameState::Loading,
            transitions: 0,
        }
    }
}

impl StateMachine {
    pub(crate) fn current(&self) -> GameState {
        self.current
    }

    pub(crate) fn is(&self, state: GameState) -> bool {
        self.current == state
    }

    pub(crate) fn transitions(&self) -> u32 {
        self.transitions
    }

    pub(crate) fn transition(&mut self, next: GameState) -> Result<GameState, TransitionError> {
        let from = self.current;
        if !from.can_transition_to(next) {
            return Err(TransitionError { from, to: next });
        }
        self.current = next;
        self.transitions = self.transitions.saturating_add(1);
        info!(from = from.as_token(), to = next.as_token(), "state_transition");
        Ok(from)
    }
}
