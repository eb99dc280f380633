mod camera_rig;
mod director;
mod hud;
mod interactables;
mod progress;
mod resolver;
mod session;
mod stalker;
mod state;
mod world;

pub(crate) use interactables::InteractableKind;
pub(crate) use session::{GameSession, SessionContext, StartupError};
pub(crate) use state::GameState;
