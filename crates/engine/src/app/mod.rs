mod camera;
mod host;
mod input;
mod loop_runner;
mod scene;
mod timers;

pub use camera::{CameraPose, DEFAULT_MOUSE_SENSITIVITY};
pub use host::{
    AudioHost, HostEvent, HudElement, HudHost, RecordingHost, Rgb, SilentAudio, SoundCue,
    TracingAudio, TracingHud,
};
pub use input::{InputAction, InputCollector, InputSnapshot};
pub use loop_runner::{
    run_loop, AppError, ExitReason, InputSource, LoopConfig, LoopControl, LoopSummary, Pacing,
    Simulation, SLOW_FRAME_ENV_VAR,
};
pub use scene::{NodeId, NodeIdAllocator, SceneError, SceneGraph, SceneNode, Transform};
pub use timers::{SimClock, TimerId, TimerQueue};
