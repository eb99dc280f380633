pub mod app;

pub use app::{
    run_loop, AppError, AudioHost, CameraPose, ExitReason, HostEvent, HudElement, HudHost,
    InputAction, InputCollector, InputSnapshot, InputSource, LoopConfig, LoopControl,
    LoopSummary, NodeId, Pacing, RecordingHost, Rgb, SceneError, SceneGraph, SceneNode,
    SilentAudio, SimClock, Simulation, SoundCue, TimerId, TimerQueue, TracingAudio, TracingHud,
    Transform, DEFAULT_MOUSE_SENSITIVITY, SLOW_FRAME_ENV_VAR,
};
pub use glam::Vec3;

/// Raw winit key types accepted by [`InputCollector`].
pub mod keys {
    pub use winit::event::{ElementState, MouseButton};
    pub use winit::keyboard::{KeyCode, PhysicalKey};
}
