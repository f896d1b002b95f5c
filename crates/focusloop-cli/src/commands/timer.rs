use std::io::Write as _;
use std::time::Duration;

use clap::Subcommand;
use focusloop_core::storage::Config;
use focusloop_core::{
    IntervalTicker, LifecycleCoordinator, LifecycleSignal, NoopTicker, Phase, Platform,
    SessionEngine, SessionStore, SystemClock, Ticker,
};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Choose the session duration in minutes (idle only)
    Preset {
        minutes: u32,
    },
    /// Start a session from idle
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the session early
    Stop {
        /// Don't record the session in history
        #[arg(long)]
        discard: bool,
    },
    /// Reconcile against the wall clock and print the state as JSON
    Status,
    /// Stay in the foreground and tick until the session completes
    Run,
}

fn build_engine(ticker: Box<dyn Ticker>) -> Result<SessionEngine, Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;
    let mut engine = SessionEngine::new(store, Box::new(SystemClock), ticker, Platform::noop());
    if engine.phase() == Phase::Idle && engine.state().last_preset_min.is_none() {
        // First run: pre-fill from the configured default.
        engine.set_preset(Config::load_or_default().default_preset_min);
    }
    Ok(engine)
}

fn print_snapshot(engine: &SessionEngine) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    if let TimerAction::Run = action {
        let rt = tokio::runtime::Runtime::new()?;
        return rt.block_on(run_foreground());
    }

    let mut engine = build_engine(Box::new(NoopTicker::default()))?;

    match action {
        TimerAction::Preset { minutes } => {
            engine.set_preset(minutes);
            print_snapshot(&engine)?;
        }
        TimerAction::Start => {
            if let Some(event) = engine.start() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_snapshot(&engine)?;
            }
        }
        TimerAction::Pause => {
            if let Some(event) = engine.pause() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_snapshot(&engine)?;
            }
        }
        TimerAction::Resume => {
            if let Some(event) = engine.resume() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_snapshot(&engine)?;
            }
        }
        TimerAction::Stop { discard } => {
            engine.stop(!discard);
            print_snapshot(&engine)?;
        }
        TimerAction::Status => {
            // Reconcile first so a deadline that passed while no process
            // was alive is honored before anything is printed.
            let completed = engine.reconcile(false);
            print_snapshot(&engine)?;
            if let Some(event) = completed {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        TimerAction::Run => unreachable!("handled above"),
    }

    Ok(())
}

async fn run_foreground() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let (ticker, mut ticks) =
        IntervalTicker::new(Duration::from_secs(config.tick_interval_secs.max(1)));
    let mut engine = build_engine(Box::new(ticker))?;
    let coordinator = LifecycleCoordinator::new();

    coordinator.handle(&mut engine, LifecycleSignal::BecameActive);
    if engine.phase() != Phase::Running {
        print_snapshot(&engine)?;
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                // Leaving the foreground is not a stop: the deadline
                // stays armed and a later invocation reconciles.
                coordinator.handle(&mut engine, LifecycleSignal::EnteredBackground);
                eprintln!();
                print_snapshot(&engine)?;
                break;
            }
            tick = ticks.recv() => {
                if tick.is_none() {
                    break;
                }
                if let Some(event) = engine.reconcile(config.haptics) {
                    eprintln!();
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    break;
                }
                let snap = engine.snapshot();
                eprint!("\r{} remaining ", format_hms(snap.remaining_secs));
                std::io::stderr().flush()?;
            }
        }
    }

    Ok(())
}

fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0), "00:00");
        assert_eq!(format_hms(61), "01:01");
        assert_eq!(format_hms(1500), "25:00");
        assert_eq!(format_hms(3661), "1:01:01");
    }
}
