use std::env;
use std::path::PathBuf;
use std::time::Duration;

use fallhouse_engine::{LoopConfig, Pacing, TracingAudio, TracingHud};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_config, GameConfig, CONFIG_ENV_VAR, REALTIME_ENV_VAR};
use super::gameplay::{GameSession, StartupError};

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) session: GameSession,
    pub(crate) autopilot: bool,
    pub(crate) start_in_menu: bool,
    pub(crate) runs: u32,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Fallhouse Startup ===");

    let mut config = match config_path_from_env() {
        Some(path) => {
            info!(path = %path.display(), "config_loading");
            load_config(&path)?
        }
        None => GameConfig::default(),
    };
    if let Some(realtime) = realtime_from_env() {
        config.run.realtime = realtime;
    }

    let run = config.run.clone();
    let loop_config = LoopConfig {
        target_tps: run.target_tps,
        pacing: if run.realtime {
            Pacing::RealTime
        } else {
            Pacing::FastForward
        },
        max_ticks: run.max_ticks,
        metrics_log_interval: Duration::from_secs(5),
        ..LoopConfig::default()
    };
    let session = GameSession::builder(config)
        .hud(TracingHud)
        .audio(TracingAudio)
        .build()?;

    Ok(AppWiring {
        loop_config,
        session,
        autopilot: run.autopilot,
        start_in_menu: run.start_in_menu,
        runs: run.runs,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn config_path_from_env() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn realtime_from_env() -> Option<bool> {
    let raw = env::var(REALTIME_ENV_VAR).ok()?;
    parse_flag(&raw)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
