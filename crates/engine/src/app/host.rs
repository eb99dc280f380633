use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HudElement {
    /// Root of the gameplay HUD; hidden during cutscenes.
    Gui,
    Parts,
    Key,
    Objective,
    Prompt,
    Caption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLOOD: Rgb = Rgb(120, 0, 0);
}

/// Text and visibility setters exposed by whatever draws the HUD.
pub trait HudHost {
    fn set_text(&mut self, element: HudElement, text: &str);
    fn set_visible(&mut self, element: HudElement, visible: bool);
    /// Full-screen colour overlay; `None` clears it.
    fn set_overlay(&mut self, color: Option<Rgb>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundCue {
    pub name: &'static str,
    pub looped: bool,
    pub volume: f32,
}

impl SoundCue {
    pub fn once(name: &'static str) -> Self {
        Self {
            name,
            looped: false,
            volume: 1.0,
        }
    }

    pub fn looped(name: &'static str, volume: f32) -> Self {
        Self {
            name,
            looped: true,
            volume,
        }
    }
}

/// Fire-and-forget sound playback. Implementations must never fail loudly.
pub trait AudioHost {
    fn play(&mut self, cue: SoundCue);
    fn stop(&mut self, name: &'static str);
}

#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioHost for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}

    fn stop(&mut self, _name: &'static str) {}
}

/// HUD host that writes every change to the log. Used by the headless runner.
#[derive(Debug, Default)]
pub struct TracingHud;

impl HudHost for TracingHud {
    fn set_text(&mut self, element: HudElement, text: &str) {
        info!(element = ?element, text, "hud_text");
    }

    fn set_visible(&mut self, element: HudElement, visible: bool) {
        debug!(element = ?element, visible, "hud_visibility");
    }

    fn set_overlay(&mut self, color: Option<Rgb>) {
        debug!(color = ?color, "hud_overlay");
    }
}

#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioHost for TracingAudio {
    fn play(&mut self, cue: SoundCue) {
        debug!(sound = cue.name, looped = cue.looped, volume = cue.volume, "sound_play");
    }

    fn stop(&mut self, name: &'static str) {
        debug!(sound = name, "sound_stop");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Text(HudElement, String),
    Visible(HudElement, bool),
    Overlay(Option<Rgb>),
    Play(SoundCue),
    Stop(&'static str),
}

/// Records every host call in order; cloned handles share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    events: std::rc::Rc<std::cell::RefCell<Vec<HostEvent>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn last_text(&self, element: HudElement) -> Option<String> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|event| match event {
                HostEvent::Text(target, text) if *target == element => Some(text.clone()),
                _ => None,
            })
    }

    pub fn is_visible(&self, element: HudElement) -> bool {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|event| match event {
                HostEvent::Visible(target, visible) if *target == element => Some(*visible),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn played(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, HostEvent::Play(cue) if cue.name == name))
            .count()
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl HudHost for RecordingHost {
    fn set_text(&mut self, element: HudElement, text: &str) {
        self.push(HostEvent::Text(element, text.to_string()));
    }

    fn set_visible(&mut self, element: HudElement, visible: bool) {
        self.push(HostEvent::Visible(element, visible));
    }

    fn set_overlay(&mut self, color: Option<Rgb>) {
        self.push(HostEvent::Overlay(color));
    }
}

impl AudioHost for RecordingHost {
    fn play(&mut self, cue: SoundCue) {
        self.push(HostEvent::Play(cue));
    }

    fn stop(&mut self, name: &'static str) {
        self.push(HostEvent::Stop(name));
    }
}
