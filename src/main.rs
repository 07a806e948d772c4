use std::io;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossterm::terminal;

use drag_drop::config::EngineConfig;
use drag_drop::demo::{Demo, render};
use drag_drop::drivers::OutputDriver;
use drag_drop::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use drag_drop::effect::EffectAllowed;
use drag_drop::event_loop::{ControlFlow, EventLoop, Tick};
use drag_drop::log_buffer::{LogHandle, set_global_log};
use drag_drop::tracing_sub;

const AFTER_HELP: &str = indoc::indoc! {"
    Drag cards with the left mouse button and drop them on the zones on the
    right. Hold Ctrl (or Cmd) while dragging to copy instead of move when the
    card allows it. Esc cancels a drag, r rebuilds the board, q quits.

    Cards:
      Plain      repositions only, kept inside the board
      Policy     uses the effect policy given with --policy
      Copy       always copies
      Grip       drags only by its :: handle
      Files      only lands in the \"Files only\" zone
      Pair A/B   move together
"};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    Move,
    Copy,
    All,
}

impl From<Policy> for EffectAllowed {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Move => EffectAllowed::Move,
            Policy::Copy => EffectAllowed::Copy,
            Policy::All => EffectAllowed::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dd-demo",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pointer drag-and-drop playground in the terminal",
    after_help = AFTER_HELP
)]
struct DemoCli {
    /// Input poll interval.
    #[arg(short = 'p', long = "poll-ms", value_name = "MILLIS", default_value_t = 16)]
    poll_ms: u64,

    /// Longest a reverted card waits before it settles.
    #[arg(long = "settle-ms", value_name = "MILLIS", default_value_t = 260)]
    settle_ms: u64,

    /// Effect policy of the "Policy" card.
    #[arg(long, value_enum, default_value_t = Policy::All)]
    policy: Policy,

    /// Write logs to stderr instead of the in-app log panel.
    #[arg(long)]
    log_stderr: bool,

    /// Also log every pointer tick and subscription.
    #[arg(long)]
    trace: bool,

    /// Lines kept by the in-app log panel.
    #[arg(long, value_name = "LINES", default_value_t = 500)]
    log_lines: usize,
}

struct DemoConfig {
    poll_interval: Duration,
    engine: EngineConfig,
    policy: EffectAllowed,
    log_lines: Option<usize>,
    log_level: tracing::Level,
}

impl TryFrom<&DemoCli> for DemoConfig {
    type Error = String;

    fn try_from(cli: &DemoCli) -> Result<Self, Self::Error> {
        if !(1..=1000).contains(&cli.poll_ms) {
            return Err("poll interval must be between 1 and 1000 ms".to_string());
        }
        if cli.settle_ms > 10_000 {
            return Err("settle timeout must be at most 10000 ms".to_string());
        }
        if cli.log_lines == 0 {
            return Err("log panel needs at least one line".to_string());
        }
        Ok(Self {
            poll_interval: Duration::from_millis(cli.poll_ms),
            engine: EngineConfig {
                settle_timeout: Duration::from_millis(cli.settle_ms),
                ..EngineConfig::default()
            },
            policy: cli.policy.into(),
            log_lines: (!cli.log_stderr).then_some(cli.log_lines),
            log_level: if cli.trace {
                tracing::Level::TRACE
            } else {
                tracing::Level::DEBUG
            },
        })
    }
}

fn main() -> io::Result<()> {
    let cli = DemoCli::parse();
    let config = DemoConfig::try_from(&cli).map_err(io::Error::other)?;

    let log = config.log_lines.map(|lines| {
        let handle = LogHandle::new(lines);
        set_global_log(handle.clone());
        handle
    });
    tracing_sub::init(config.log_level);

    let (width, height) = terminal::size()?;
    let mut demo = Demo::new(
        render::viewport_for(width, height),
        config.policy,
        config.engine,
    )
    .map_err(io::Error::other)?;

    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;
    tracing::debug!(enhanced_keyboard = output.enhanced_keyboard(), "terminal ready");

    let mut event_loop = EventLoop::new(ConsoleInputDriver::new(), config.poll_interval);
    let result = event_loop.run(|_, tick| match tick {
        Tick::Idle(now) => {
            let wake = demo.tick(now);
            output.draw(|frame| render::render(frame, &demo, log.as_ref()))?;
            Ok(wake.map_or(ControlFlow::Continue, ControlFlow::WakeAt))
        }
        Tick::Input(event) => Ok(if demo.handle_event(&event) {
            ControlFlow::Quit
        } else {
            ControlFlow::Continue
        }),
    });

    output.exit()?;
    result?;
    println!("{}", demo.report());
    Ok(())
}
