use std::io::Write;
use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use workbreak_core::format::{format_time, timeline_bar};
use workbreak_core::{
    Clock, CommandSink, Config, Event, MonotonicClock, NullSink, ReminderSink, SessionController,
    SessionSummary,
};

#[derive(Args)]
pub struct RunArgs {
    /// Print the session summary as JSON and skip the live clock
    #[arg(long)]
    json: bool,
    /// Do not speak reminders
    #[arg(long)]
    silent: bool,
    /// Width of the interval timeline bar
    #[arg(long, default_value = "40")]
    width: usize,
}

/// A line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Save,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "p" | "t" | "toggle" => Input::Toggle,
            "s" | "q" | "save" | "stop" => Input::Save,
            _ => Input::Unknown,
        }
    }
}

fn sink_for(config: &Config, silent: bool) -> Arc<dyn ReminderSink> {
    if silent || !config.reminder.enabled {
        return Arc::new(NullSink);
    }
    match &config.reminder.command {
        Some(command) => Arc::new(CommandSink::new(command)),
        None => Arc::new(CommandSink::platform_default()),
    }
}

fn status_line(snapshot: &Event) -> Option<String> {
    let Event::StateSnapshot {
        working,
        elapsed_ms,
        worked_ms,
        ..
    } = snapshot
    else {
        return None;
    };
    let phase = if *working { "working" } else { "on break" };
    Some(format!(
        "{}  time worked {}  [{phase}]",
        format_time(*elapsed_ms),
        format_time(*worked_ms)
    ))
}

async fn drive(args: &RunArgs, config: &Config) -> Result<SessionSummary, Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let mut controller =
        SessionController::from_config(config, clock.clone(), sink_for(config, args.silent))?;
    let mut snapshots = controller.subscribe();
    let mut events = controller.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let live = !args.json;

    controller.start().await;
    if live {
        eprintln!("[enter] switch work/break   [s] save and quit");
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Toggle => {
                        controller.toggle_phase().await;
                    }
                    Input::Save => break,
                    Input::Unknown => {
                        if live {
                            eprintln!("unknown input: {}", line.trim());
                        }
                    }
                }
            }
            changed = snapshots.changed(), if live => {
                if changed.is_err() {
                    break;
                }
                let line = status_line(&snapshots.borrow_and_update());
                if let Some(line) = line {
                    let mut stdout = std::io::stdout().lock();
                    let _ = write!(stdout, "\r{line}");
                    let _ = stdout.flush();
                }
            }
            event = events.recv() => {
                match event {
                    Ok(Event::ReminderDue { worked_since_last_ms, .. }) if live => {
                        println!("\nreminder: {} worked since the last one", format_time(worked_since_last_ms));
                    }
                    Ok(Event::PhaseToggled { .. }) if live => {
                        let state = controller.state().await;
                        println!("\n{}", timeline_bar(state.intervals(), args.width));
                    }
                    _ => {}
                }
            }
        }
    }

    controller.save().await;
    let state = controller.state().await;
    Ok(SessionSummary::from_state(&state, clock.now_ms()))
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(drive(&args, &config));
    // stdin reads block a worker thread; don't wait for it on shutdown.
    runtime.shutdown_background();
    let summary = summary?;

    if args.json {
        println!("{}", summary.to_json_pretty()?);
    } else {
        println!();
        println!("{}", timeline_bar(&summary.intervals, args.width));
        println!(
            "session saved: worked {}, {} interval(s), {} reminder(s)",
            summary.worked,
            summary.intervals.len(),
            summary.reminders
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_parsing() {
        assert_eq!(Input::parse(""), Input::Toggle);
        assert_eq!(Input::parse("  P \n"), Input::Toggle);
        assert_eq!(Input::parse("s"), Input::Save);
        assert_eq!(Input::parse("Save"), Input::Save);
        assert_eq!(Input::parse("what"), Input::Unknown);
    }

    #[test]
    fn status_line_shows_phase_and_times() {
        let snapshot = Event::StateSnapshot {
            working: true,
            is_running: true,
            elapsed_ms: 61_230,
            worked_ms: 3_600_000,
            since_last_reminder_ms: 0,
            interval_count: 3,
            at: 0,
        };
        assert_eq!(
            status_line(&snapshot).as_deref(),
            Some("00:01:01.23  time worked 01:00:00.00  [working]")
        );
    }

    #[test]
    fn status_line_ignores_other_events() {
        let event = Event::SessionStarted {
            session_id: "x".into(),
            at: 0,
        };
        assert!(status_line(&event).is_none());
    }

    #[test]
    fn silent_runs_use_null_sink() {
        let mut config = Config::default();
        config.reminder.command = Some("workbreak-definitely-missing-binary".into());
        let sink = sink_for(&config, true);
        let utterance = config.utterance().unwrap();
        assert!(sink.remind(&utterance).is_ok());
    }
}
