use std::time::Duration;

use fallhouse_engine::{HudElement, HudHost, Rgb, TimerId, TimerQueue};
use tracing::debug;

use super::progress::PlayerProgress;
use crate::app::config::HudConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HideTarget {
    Caption,
    Prompt,
}

/// Drives the HUD host and owns the auto-hide timers for transient text.
///
/// A caption or prompt replaces the previous one and cancels its pending
/// hide, so an older timeout can never blank newer text.
pub(crate) struct HudController {
    host: Box<dyn HudHost>,
    timers: TimerQueue<HideTarget>,
    caption_hide: Option<TimerId>,
    prompt_hide: Option<TimerId>,
    caption_hold: Duration,
    prompt_hold: Duration,
}

impl HudController {
    pub(crate) fn new(host: Box<dyn HudHost>, config: &HudConfig) -> Self {
        Self {
            host,
            timers: TimerQueue::new(),
            caption_hide: None,
            prompt_hide: None,
            caption_hold: Duration::from_millis(config.caption_hold_ms),
            prompt_hold: Duration::from_millis(config.prompt_hold_ms),
        }
    }

    pub(crate) fn show_caption(&mut self, text: &str, now: Duration) {
        if let Some(previous) = self.caption_hide.take() {
            self.timers.cancel(previous);
        }
        self.host.set_text(HudElement::Caption, text);
        self.host.set_visible(HudElement::Caption, true);
        self.caption_hide = Some(
            self.timers
                .schedule(now.saturating_add(self.caption_hold), HideTarget::Caption),
        );
        debug!(text, "caption_shown");
    }

    pub(crate) fn hide_caption(&mut self) {
        if let Some(pending) = self.caption_hide.take() {
            self.timers.cancel(pending);
        }
        self.host.set_visible(HudElement::Caption, false);
    }

    pub(crate) fn show_prompt(&mut self, text: &str, now: Duration) {
        if let Some(previous) = self.prompt_hide.take() {
            self.timers.cancel(previous);
        }
        self.host.set_text(HudElement::Prompt, text);
        self.host.set_visible(HudElement::Prompt, true);
        self.prompt_hide = Some(
            self.timers
                .schedule(now.saturating_add(self.prompt_hold), HideTarget::Prompt),
        );
    }

    pub(crate) fn set_objective(&mut self, text: &str) {
        self.host.set_text(HudElement::Objective, text);
    }

    pub(crate) fn set_overlay(&mut self, color: Option<Rgb>) {
        self.host.set_overlay(color);
    }

    pub(crate) fn set_gui_visible(&mut self, visible: bool) {
        self.host.set_visible(HudElement::Gui, visible);
    }

    pub(crate) fn refresh_inventory(&mut self, progress: &PlayerProgress, required_parts: u32) {
        let parts = format!("Parts: {}/{}", progress.collected_parts(), required_parts);
        self.host.set_text(HudElement::Parts, &parts);
        let key = if progress.has_key() { "Key: yes" } else { "Key: no" };
        self.host.set_text(HudElement::Key, key);
    }

    /// Fires every due auto-hide.
    pub(crate) fn tick(&mut self, now: Duration) {
        for (id, target) in self.timers.pop_due(now) {
            match target {
                HideTarget::Caption => {
                    if self.caption_hide == Some(id) {
                        self.caption_hide = None;
                    }
                    self.host.set_visible(HudElement::Caption, false);
                }
                HideTarget::Prompt => {
                    if self.prompt_hide == Some(id) {
                        self.prompt_hide = None;
                    }
                    self.host.set_visible(HudElement::Prompt, false);
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.timers.clear();
        self.caption_hide = None;
        self.prompt_hide = None;
        self.host.set_visible(HudElement::Caption, false);
        self.host.set_visible(HudElement::Prompt, false);
        self.host.set_visible(HudElement::Gui, false);
        self.host.set_overlay(None);
    }
}

#[cfg(test)]
mod tests {
    use fallhouse_engine::{HostEvent, RecordingHost};

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn controller(probe: &RecordingHost) -> HudController {
        HudController::new(
            Box::new(probe.clone()),
            &HudConfig {
                caption_hold_ms: 2000,
                prompt_hold_ms: 1500,
            },
        )
    }

    #[test]
    fn caption_hides_after_hold() {
        let probe = RecordingHost::new();
        let mut hud = controller(&probe);

        hud.show_caption("wake up....", ms(0));
        hud.tick(ms(1999));
        assert!(probe.is_visible(HudElement::Caption));
        hud.tick(ms(2000));
        assert!(!probe.is_visible(HudElement::Caption));
    }

    #[test]
    fn newer_caption_is_not_cleared_by_older_timeout() {
        let probe = RecordingHost::new();
        let mut hud = controller(&probe);

        hud.show_caption("wake up....", ms(0));
        hud.show_caption("wake up......", ms(1500));

        // the first caption's hide would have landed here
        hud.tick(ms(2000));
        assert!(probe.is_visible(HudElement::Caption));
        assert_eq!(
            probe.last_text(HudElement::Caption).as_deref(),
            Some("wake up......")
        );

        hud.tick(ms(3500));
        assert!(!probe.is_visible(HudElement::Caption));
    }

    #[test]
    fn rapid_prompts_hide_once() {
        let probe = RecordingHost::new();
        let mut hud = controller(&probe);

        for step in 0..5u64 {
            hud.show_prompt("picked up a part", ms(step * 100));
        }
        probe.clear();
        hud.tick(ms(10_000));

        let hides = probe
            .events()
            .into_iter()
            .filter(|event| *event == HostEvent::Visible(HudElement::Prompt, false))
            .count();
        assert_eq!(hides, 1);
    }

    #[test]
    fn inventory_text_tracks_progress() {
        let probe = RecordingHost::new();
        let mut hud = controller(&probe);
        let mut progress = PlayerProgress::default();
        progress.collect_part();
        progress.take_key();

        hud.refresh_inventory(&progress, 3);
        assert_eq!(probe.last_text(HudElement::Parts).as_deref(), Some("Parts: 1/3"));
        assert_eq!(probe.last_text(HudElement::Key).as_deref(), Some("Key: yes"));
    }
}
