use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use wakeguard_core::platform::sim::SimulatedPlatform;
use wakeguard_core::platform::{ErrorReporter, StatusDisplay};
use wakeguard_core::runner::{self, Command};
use wakeguard_core::{
    AcquireMode, Config, CoreError, ErrorKind, Event, Platform, Presenter, Result,
    SessionOptions, VisibilityMonitor, VisibilityState, WakeSession,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Toggle-driven: `on` / `off` control the lock
    Explicit,
    /// Request the lock as soon as the session starts
    Immediate,
}

impl From<ModeArg> for AcquireMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Explicit => AcquireMode::Explicit,
            ModeArg::Immediate => AcquireMode::Immediate,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Json,
    Text,
}

#[derive(Args)]
pub struct RunArgs {
    /// Acquisition mode (defaults to `lock.mode` from config)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Simulate a platform without any screen lock
    #[arg(long)]
    unsupported: bool,
    /// Simulate a platform that refuses locks until the user interacts
    #[arg(long)]
    require_activation: bool,
    /// Clock tick in milliseconds (defaults to `clock.tick_interval_ms`)
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Event output format (defaults to `display.json`)
    #[arg(long, value_enum)]
    output: Option<OutputArg>,
}

const HELP: &str = "commands: on | off | hide | show | reclaim | interact | deny [n] | fail-release [n] | status | quit";

/// Prints every event on stdout, one per line.
struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    fn print(&self, event: &Event) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not serialize event"),
            }
            return;
        }
        match event {
            Event::SupportDetected { supported, .. } => {
                let text = if *supported { "supported" } else { "not supported" };
                println!("screen lock: {text}");
            }
            Event::StatusChanged { status, .. } => println!("status: {}", status.label()),
            Event::TimerTicked { timer, display, .. } => println!("{}: {display}", timer.label()),
            Event::ErrorRaised { kind, message, .. } => println!("error ({kind:?}): {message}"),
            Event::ControlAvailability { enabled, .. } => {
                println!("toggle {}", if *enabled { "enabled" } else { "disabled" });
            }
            Event::IntentChanged { intent, .. } => {
                println!("toggle {}", if *intent { "on" } else { "off" });
            }
        }
    }
}

impl StatusDisplay for EventPrinter {
    fn render(&self, event: &Event) {
        self.print(event);
    }
}

impl ErrorReporter for EventPrinter {
    fn report(&self, kind: ErrorKind, message: &str) {
        self.print(&Event::ErrorRaised {
            kind,
            message: message.to_string(),
            at: chrono::Utc::now(),
        });
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = Config::load_or_default();

    let mut options = SessionOptions::from(&config);
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    let tick = Duration::from_millis(args.tick_ms.unwrap_or(config.clock.tick_interval_ms).max(1));
    let json = match args.output {
        Some(OutputArg::Json) => true,
        Some(OutputArg::Text) => false,
        None => config.display.json,
    };

    let mut sim = if args.unsupported {
        SimulatedPlatform::unsupported()
    } else {
        SimulatedPlatform::new()
    };
    if args.require_activation {
        sim = sim.with_activation_required();
    }

    let printer = Arc::new(EventPrinter { json });
    let presenter = Presenter {
        display: printer.clone(),
        errors: printer,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(sim, options, presenter, tick))
}

async fn drive(
    sim: SimulatedPlatform,
    options: SessionOptions,
    presenter: Presenter,
    tick: Duration,
) -> Result<()> {
    let (session, notices) = WakeSession::new(Platform::simulated(&sim), presenter, options);
    let monitor = VisibilityMonitor::new(Arc::new(sim.clone()));
    let (tx, rx) = mpsc::channel(16);
    let session_task = tokio::spawn(runner::run(session, monitor, notices, rx, tick));

    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };
        let count = words.next().and_then(|n| n.parse::<u32>().ok()).unwrap_or(1);

        match word {
            "on" => {
                // Flipping the toggle is a user gesture.
                sim.interact();
                send(&tx, Command::Enable).await?;
            }
            "off" => {
                sim.interact();
                send(&tx, Command::Disable).await?;
            }
            "hide" => sim.set_visibility(VisibilityState::Background),
            "show" => sim.set_visibility(VisibilityState::Foreground),
            "reclaim" => {
                sim.reclaim();
            }
            "interact" => sim.interact(),
            "deny" => sim.deny_next_requests(count),
            "fail-release" => sim.fail_next_releases(count),
            "status" => {
                let (reply, snapshot) = oneshot::channel();
                send(&tx, Command::Status(reply)).await?;
                let snapshot = snapshot.await.map_err(|_| CoreError::SessionStopped)?;
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            "quit" | "exit" => break,
            other => eprintln!("unknown command: {other}\n{HELP}"),
        }
    }

    // The loop may already have stopped on its own.
    let _ = tx.send(Command::Shutdown).await;
    session_task
        .await
        .map_err(|e| CoreError::Custom(format!("session task failed: {e}")))?;
    Ok(())
}

async fn send(tx: &mpsc::Sender<Command>, command: Command) -> Result<()> {
    tx.send(command).await.map_err(|_| CoreError::SessionStopped)
}
