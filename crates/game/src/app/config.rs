use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fallhouse_engine::{CameraPose, Vec3, DEFAULT_MOUSE_SENSITIVITY};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "FALLHOUSE_CONFIG";
pub(crate) const REALTIME_ENV_VAR: &str = "FALLHOUSE_REALTIME";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) director: DirectorConfig,
    pub(crate) quest: QuestConfig,
    pub(crate) player: PlayerConfig,
    pub(crate) hud: HudConfig,
    pub(crate) world: WorldLayout,
    pub(crate) stalker: Option<StalkerConfig>,
    pub(crate) run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TimedCaption {
    pub(crate) at_ms: u64,
    pub(crate) text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DirectorConfig {
    pub(crate) roof_vantage: Vec3,
    pub(crate) roof_look_at: Vec3,
    pub(crate) intro_caption: String,
    pub(crate) intro_hold_ms: u64,
    pub(crate) walk_steps: u32,
    pub(crate) walk_delta: Vec3,
    pub(crate) step_tick_ms: u64,
    pub(crate) fall_gravity_per_step: f32,
    pub(crate) fall_max_steps: u32,
    pub(crate) void_threshold_y: f32,
    pub(crate) portal_spin_per_step: f32,
    pub(crate) void_captions: Vec<TimedCaption>,
    pub(crate) void_duration_ms: u64,
    /// Spawn position relative to the house origin.
    pub(crate) spawn_local: Vec3,
    pub(crate) spawn_yaw: f32,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            roof_vantage: Vec3::new(0.0, 101.7, 8.0),
            roof_look_at: Vec3::new(0.0, 101.7, -20.0),
            intro_caption: "don't look down.".to_string(),
            intro_hold_ms: 2000,
            walk_steps: 68,
            walk_delta: Vec3::new(0.0, 0.0, -0.25),
            step_tick_ms: 50,
            fall_gravity_per_step: 0.09,
            fall_max_steps: 400,
            void_threshold_y: 12.0,
            portal_spin_per_step: 0.3,
            void_captions: vec![
                TimedCaption {
                    at_ms: 1000,
                    text: "wake up....".to_string(),
                },
                TimedCaption {
                    at_ms: 4000,
                    text: "wake up......".to_string(),
                },
            ],
            void_duration_ms: 8000,
            spawn_local: Vec3::new(5.0, 1.7, 5.0),
            spawn_yaw: 0.0,
        }
    }
}

impl DirectorConfig {
    pub(crate) fn step_tick(&self) -> Duration {
        Duration::from_millis(self.step_tick_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MatchPolicy {
    /// Every eligible interactable triggers on one attempt.
    #[default]
    AllInRange,
    /// Only the closest eligible interactable triggers.
    NearestOnly,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct QuestConfig {
    pub(crate) required_parts: u32,
    pub(crate) part_radius: f32,
    pub(crate) key_radius: f32,
    pub(crate) table_radius: f32,
    pub(crate) furniture_radius: f32,
    pub(crate) vent_radius: f32,
    pub(crate) craft_requires_light: bool,
    pub(crate) vent_requires_clear_path: bool,
    pub(crate) match_policy: MatchPolicy,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            required_parts: 3,
            part_radius: 3.0,
            key_radius: 2.0,
            table_radius: 3.0,
            furniture_radius: 3.0,
            vent_radius: 3.0,
            craft_requires_light: true,
            vent_requires_clear_path: false,
            match_policy: MatchPolicy::AllInRange,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerConfig {
    pub(crate) walk_speed: f32,
    pub(crate) sprint_speed: f32,
    pub(crate) mouse_sensitivity: f32,
    pub(crate) footstep_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.2,
            sprint_speed: 12.0,
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            footstep_interval_ms: 450,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HudConfig {
    pub(crate) caption_hold_ms: u64,
    pub(crate) prompt_hold_ms: u64,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            caption_hold_ms: 2000,
            prompt_hold_ms: 1500,
        }
    }
}

/// Positions of house props, relative to `house_origin` unless noted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldLayout {
    /// World-space.
    pub(crate) roof: Vec3,
    /// World-space.
    pub(crate) portal: Vec3,
    pub(crate) house_origin: Vec3,
    pub(crate) clock_hand: Vec3,
    pub(crate) parts: Vec<Vec3>,
    pub(crate) key: Vec3,
    pub(crate) crafting_table: Vec3,
    pub(crate) furniture: Vec3,
    pub(crate) furniture_push: Vec3,
    pub(crate) vent: Vec3,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            roof: Vec3::new(0.0, 100.0, 0.0),
            portal: Vec3::new(0.0, 10.0, -5.0),
            house_origin: Vec3::new(500.0, 0.0, 500.0),
            clock_hand: Vec3::new(10.0, 7.0, 36.9),
            parts: vec![
                Vec3::new(-20.0, 0.4, -20.0),
                Vec3::new(15.0, 0.4, 10.0),
                Vec3::new(0.0, 0.4, -35.0),
            ],
            key: Vec3::new(25.0, 0.2, -25.0),
            crafting_table: Vec3::new(-30.0, 1.0, 30.0),
            furniture: Vec3::new(34.0, 1.0, -34.0),
            furniture_push: Vec3::new(-3.0, 0.0, 0.0),
            vent: Vec3::new(37.0, 0.5, -37.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StalkerConfig {
    pub(crate) spawn_local: Vec3,
    pub(crate) speed: f32,
    pub(crate) catch_radius: f32,
    pub(crate) activate_after_ms: u64,
}

impl Default for StalkerConfig {
    fn default() -> Self {
        Self {
            spawn_local: Vec3::new(-35.0, 0.0, -35.0),
            speed: 2.5,
            catch_radius: 1.2,
            activate_after_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    pub(crate) target_tps: u32,
    pub(crate) realtime: bool,
    pub(crate) max_ticks: Option<u64>,
    pub(crate) autopilot: bool,
    pub(crate) start_in_menu: bool,
    /// Play-throughs before exiting; each finished run is retried from the menu.
    pub(crate) runs: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            realtime: false,
            max_ticks: Some(60 * 60 * 10),
            autopilot: true,
            start_in_menu: false,
            runs: 1,
        }
    }
}

impl GameConfig {
    pub(crate) fn spawn_pose(&self) -> CameraPose {
        let mut pose = CameraPose::at(self.world.house_origin + self.director.spawn_local);
        pose.yaw = self.director.spawn_yaw;
        pose
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let quest = &self.quest;
        if quest.required_parts == 0 {
            return Err(invalid("quest.required_parts", "must be at least 1"));
        }
        if quest.required_parts as usize > self.world.parts.len() {
            return Err(invalid(
                "quest.required_parts",
                format!(
                    "needs {} parts but world.parts only places {}",
                    quest.required_parts,
                    self.world.parts.len()
                ),
            ));
        }
        for (field, radius) in [
            ("quest.part_radius", quest.part_radius),
            ("quest.key_radius", quest.key_radius),
            ("quest.table_radius", quest.table_radius),
            ("quest.furniture_radius", quest.furniture_radius),
            ("quest.vent_radius", quest.vent_radius),
        ] {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(invalid(field, format!("expected positive radius, got {radius}")));
            }
        }
        if self.director.step_tick_ms == 0 {
            return Err(invalid("director.step_tick_ms", "must be positive"));
        }
        if self.director.fall_gravity_per_step <= 0.0 {
            return Err(invalid(
                "director.fall_gravity_per_step",
                "must be positive",
            ));
        }
        if self.run.target_tps == 0 {
            return Err(invalid("run.target_tps", "must be positive"));
        }
        if self.run.runs == 0 {
            return Err(invalid("run.runs", "must be at least 1"));
        }
        if let Some(stalker) = &self.stalker {
            if stalker.catch_radius <= 0.0 || stalker.speed < 0.0 {
                return Err(invalid(
                    "stalker",
                    "catch_radius must be positive and speed non-negative",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub(crate) fn parse_config(raw: &str) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(
        |error| {
            let path = error.path().to_string();
            ConfigError::Parse {
                path,
                message: error.into_inner().to_string(),
            }
        },
    )?;
    config.validate()?;
    Ok(config)
}

pub(crate) fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw)
}
