use std::env;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use super::input::{InputCollector, InputSnapshot};

pub const SLOW_FRAME_ENV_VAR: &str = "FALLHOUSE_SLOW_FRAME_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep between frames so simulated time tracks wall time.
    RealTime,
    /// Run ticks back to back.
    FastForward,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub pacing: Pacing,
    /// Hard stop for runs that never reach a terminal state.
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            pacing: Pacing::FastForward,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Fixed-step simulation driven by [`run_loop`].
pub trait Simulation {
    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> LoopControl;
}

/// Produces the input for each tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self) -> InputSnapshot;
}

impl InputSource for InputCollector {
    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputCollector::snapshot_for_tick(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Finished,
    QuitRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub sim_time: Duration,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("loop stopped after {ticks} ticks without reaching a terminal state")]
    TickBudgetExhausted { ticks: u64 },
}

pub fn run_loop(
    config: &LoopConfig,
    sim: &mut dyn Simulation,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, AppError> {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        pacing = ?config.pacing,
        max_ticks = ?config.max_ticks,
        "loop_config"
    );

    let mut ticks = 0u64;
    let mut run_tick = |ticks: &mut u64| -> Result<Option<ExitReason>, AppError> {
        if let Some(budget) = config.max_ticks {
            if *ticks >= budget {
                return Err(AppError::TickBudgetExhausted { ticks: *ticks });
            }
        }
        let snapshot = input.snapshot_for_tick();
        *ticks = ticks.saturating_add(1);
        if snapshot.quit_requested() {
            info!(reason = "quit_key", "shutdown_requested");
            return Ok(Some(ExitReason::QuitRequested));
        }
        match sim.update(fixed_dt, &snapshot) {
            LoopControl::Continue => Ok(None),
            LoopControl::Exit => Ok(Some(ExitReason::Finished)),
        }
    };
    let summary = |ticks: u64, exit_reason: ExitReason| LoopSummary {
        ticks,
        sim_time: fixed_dt.saturating_mul(ticks.min(u32::MAX as u64) as u32),
        exit_reason,
    };

    if config.pacing == Pacing::FastForward {
        loop {
            if let Some(reason) = run_tick(&mut ticks)? {
                return Ok(summary(ticks, reason));
            }
        }
    }

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut interval_start = Instant::now();
    let mut interval_ticks = 0u32;

    loop {
        if slow_frame_delay > Duration::ZERO {
            // Explicit debug perturbation only; this is not the frame cap.
            thread::sleep(slow_frame_delay);
        }

        let frame_start = Instant::now();
        let raw_frame_dt = frame_start.saturating_duration_since(last_frame_instant);
        last_frame_instant = frame_start;
        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            if let Some(reason) = run_tick(&mut ticks)? {
                return Ok(summary(ticks, reason));
            }
            interval_ticks = interval_ticks.saturating_add(1);
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        let since_interval = frame_start.saturating_duration_since(interval_start);
        if since_interval >= metrics_log_interval {
            let tps = interval_ticks as f32 / since_interval.as_secs_f32();
            info!(tps, ticks, "loop_metrics");
            interval_start = frame_start;
            interval_ticks = 0;
        }

        let cap_sleep = compute_cap_sleep(
            Instant::now().saturating_duration_since(frame_start),
            Some(fixed_dt),
        );
        if cap_sleep > Duration::ZERO {
            thread::sleep(cap_sleep);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}
