use std::process::ExitCode;

use fallhouse_engine::{run_loop, AppError, InputCollector, LoopConfig, LoopSummary};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::gameplay::GameSession;
use super::walkthrough::Walkthrough;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        loop_config,
        mut session,
        autopilot,
        start_in_menu,
        runs,
    } = app;

    if start_in_menu {
        if let Err(err) = session.finish_loading() {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    }

    // Headless: nothing feeds this collector, so only the autopilot moves.
    let mut window_input = InputCollector::new();
    for attempt in 1..=runs {
        if let Err(err) = session.start() {
            error!(error = %err, attempt, "startup_failed");
            return ExitCode::FAILURE;
        }

        let (result, returned) = play(&loop_config, session, &mut window_input, autopilot);
        session = returned;
        match result {
            Ok(summary) => info!(
                attempt,
                ticks = summary.ticks,
                sim_ms = summary.sim_time.as_millis() as u64,
                exit_reason = ?summary.exit_reason,
                state = session.state().as_token(),
                "run_finished"
            ),
            Err(err) => {
                error!(error = %err, attempt, "run_failed");
                return ExitCode::FAILURE;
            }
        }

        if attempt == runs || !session.state().is_terminal() {
            break;
        }
        if let Err(err) = session.retry() {
            error!(error = %err, attempt, "retry_failed");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn play(
    loop_config: &LoopConfig,
    mut session: GameSession,
    window_input: &mut InputCollector,
    autopilot: bool,
) -> (Result<LoopSummary, AppError>, GameSession) {
    if autopilot {
        let mut pilot = Walkthrough::new(session);
        let result = run_loop(loop_config, &mut pilot, window_input);
        (result, pilot.into_session())
    } else {
        let result = run_loop(loop_config, &mut session, window_input);
        (result, session)
    }
}
