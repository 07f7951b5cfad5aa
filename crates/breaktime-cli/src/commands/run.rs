//! `breaktime run`: the scheduler and popup coordinator in a terminal.
//!
//! Popups are printed to stdout and close themselves after their configured
//! duration. Commands are read from stdin, one per line.

use std::error::Error;

use breaktime_core::timer::DEFAULT_PAUSE_MINUTES;
use breaktime_core::{
    BreakMode, CloseHandle, Config, DisplayError, Event, EventKind, PopupCoordinator,
    PopupDisplay, TimerEngine,
};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, Duration};
use tracing::{info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// End of the last break (RFC 3339), to continue a previous session
    #[arg(long)]
    last_break: Option<DateTime<Utc>>,
    /// Close every popup after this many seconds instead of its configured length
    #[arg(long)]
    popup_secs: Option<u64>,
    /// Print scheduler and popup events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Pause(u32),
    Resume,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        None => return Ok(None),
        Some("pause") => match words.next() {
            None => Command::Pause(DEFAULT_PAUSE_MINUTES),
            Some(arg) => match arg.parse::<u32>() {
                Ok(minutes) if minutes > 0 => Command::Pause(minutes),
                _ => return Err(format!("invalid pause length: {arg}")),
            },
        },
        Some("resume") => Command::Resume,
        Some("status") => Command::Status,
        Some("quit" | "exit") => Command::Quit,
        Some(other) => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(command))
}

/// Prints popups and closes them once their time is up.
struct TerminalDisplay {
    engine: TimerEngine,
    popup_secs: Option<u64>,
    quiet: bool,
}

impl PopupDisplay for TerminalDisplay {
    fn show(&self, kind: EventKind, on_close: CloseHandle) -> Result<(), DisplayError> {
        let config = self.engine.config();
        let with_eyes = kind == EventKind::BigBreak && self.engine.include_eyes_in_big_break();
        let secs = self
            .popup_secs
            .unwrap_or_else(|| config.popup_duration_secs(kind));
        if !self.quiet {
            println!(
                "[{}] {}",
                Local::now().format("%H:%M:%S"),
                popup_text(kind, &config, with_eyes)
            );
        }

        let quiet = self.quiet;
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(secs)).await;
            if !quiet {
                println!("[{}] {kind} over", Local::now().format("%H:%M:%S"));
            }
            on_close.close();
        });
        Ok(())
    }

    fn dismiss(&self, kind: EventKind) {
        if !self.quiet {
            println!("({kind} set aside for something more urgent)");
        }
    }
}

fn popup_text(kind: EventKind, config: &Config, with_eyes: bool) -> String {
    let mut text = match kind {
        EventKind::BigBreak => format!(
            "Time for a {}-minute break. Step away from the screen.",
            config.big_break_duration_min
        ),
        EventKind::SmallBreak => format!(
            "Short break: look away and stretch for {} seconds.",
            config.small_break_duration_sec
        ),
        EventKind::EyeExercise => "Eye exercise: roll your eyes, then focus near and far.".into(),
        EventKind::WaterReminder => "Drink some water.".into(),
    };
    if with_eyes {
        text.push_str(" Finish with the eye exercise.");
    }
    if config.break_mode == BreakMode::Aggressive && kind.priority() <= 2 {
        text.push_str(" (no skipping)");
    }
    text
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(config, args));
    // A pending stdin read would otherwise hold up runtime shutdown.
    runtime.shutdown_background();
    result
}

async fn serve(config: Config, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let engine = TimerEngine::new(config, args.last_break);
    if args.json {
        tokio::spawn(print_events(engine.events().subscribe()));
    }
    let display = TerminalDisplay {
        engine: engine.clone(),
        popup_secs: args.popup_secs,
        quiet: args.json,
    };
    let popups = PopupCoordinator::spawn(engine.clone(), display, engine.events());
    let ticker = engine
        .start(popups.clone())
        .ok_or("scheduler is already running")?;
    info!(
        work_method = %engine.config().work_method,
        "breaktime running; commands: pause [min], resume, status, quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Pause(minutes))) => engine.pause(minutes),
                    Ok(Some(Command::Resume)) => engine.resume(),
                    Ok(Some(Command::Status)) => print_status(&engine, &popups).await?,
                    Ok(Some(Command::Quit)) => break,
                    Err(message) => eprintln!("{message} (pause [min], resume, status, quit)"),
                }
            }
        }
    }

    engine.stop();
    ticker.await?;
    info!("breaktime stopped");
    Ok(())
}

async fn print_status(
    engine: &TimerEngine,
    popups: &PopupCoordinator,
) -> Result<(), Box<dyn Error>> {
    let status = serde_json::json!({
        "scheduler": engine.snapshot(),
        "popups": popups.inspect().await,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "could not serialize event"),
            },
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
