//! sortscope CLI - headless playback of the sorting engine.
//!
//! ```text
//! config file ─> Settings <─ flags
//!                   │
//!                   v
//!              Controller::start()
//!                   │  advance() until Finished / step limit / Ctrl-C
//!                   v
//!              stdout: one line per applied step (or JSON events)
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable with `--json`.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sortscope_engine::{
    Advance, AlgorithmId, Controller, CustomLoad, DatasetSize, Pacing, PlaybackEvent, RunState,
    Settings, Speed, descriptors,
};

#[derive(Debug, Parser)]
#[command(name = "sortscope", version)]
#[command(about = "Step through instrumented sorting algorithms")]
struct Cli {
    /// Algorithm to run (bubble, selection, insertion, shell, merge, quick, heap, radix)
    #[arg(short, long, value_parser = parse_algorithm)]
    algorithm: Option<AlgorithmId>,
    /// Number of random values (10-200)
    #[arg(short, long)]
    size: Option<i64>,
    /// Playback speed (1-100); higher is faster
    #[arg(long)]
    speed: Option<i64>,
    /// Custom values instead of random data, e.g. "5, 3, 8, 1"
    #[arg(short, long)]
    data: Option<String>,
    /// List the available algorithms and exit
    #[arg(long)]
    list: bool,
    /// Print every event as a JSON line
    #[arg(long)]
    json: bool,
    /// Stop the run after this many steps
    #[arg(long)]
    step_limit: Option<usize>,
    /// Apply steps without pacing delays
    #[arg(long)]
    instant: bool,
}

fn parse_algorithm(raw: &str) -> Result<AlgorithmId, String> {
    AlgorithmId::parse(raw).ok_or_else(|| {
        let known: Vec<_> = AlgorithmId::all().iter().map(|id| id.as_str()).collect();
        format!("unknown algorithm '{raw}' (expected one of: {})", known.join(", "))
    })
}

impl Cli {
    /// Layer flags over the settings loaded from the config file.
    fn apply(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(algorithm) = self.algorithm {
            settings.algorithm = algorithm;
        }
        if let Some(size) = self.size {
            settings.size = DatasetSize::new(size).context("invalid --size")?;
        }
        if let Some(speed) = self.speed {
            settings.speed = Speed::new(speed).context("invalid --speed")?;
        }
        if self.instant {
            settings.pacing = Pacing::immediate();
        }
        Ok(settings)
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut out = io::stdout().lock();
    if cli.list {
        return print_algorithms(&mut out);
    }

    let loaded = sortscope_config::load_settings().unwrap_or_else(|err| {
        tracing::warn!("Ignoring config: {err}");
        Settings::default()
    });
    let settings = cli.apply(loaded)?;

    let mut controller = Controller::new(settings);
    if let Some(raw) = &cli.data
        && controller.load_custom(raw)? == CustomLoad::Ignored
    {
        tracing::warn!("--data contained no numbers; using random data");
    }

    let mut events = controller.subscribe();
    controller.start();
    let (state, steps) = play(
        &mut controller,
        &mut events,
        &mut out,
        cli.json,
        cli.step_limit,
    )
    .await?;

    if !cli.json {
        writeln!(
            out,
            "{} {state} after {steps} steps: {:?}",
            controller.algorithm().name,
            controller.dataset()
        )?;
    }
    Ok(())
}

/// Drive the run until it ends, the step limit is hit, or Ctrl-C, printing
/// events as they are applied. Returns the final state and the number of
/// steps shown.
async fn play(
    controller: &mut Controller,
    events: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
    out: &mut impl Write,
    json: bool,
    step_limit: Option<usize>,
) -> Result<(RunState, usize)> {
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        let advance = tokio::select! {
            advance = controller.advance() => advance,
            _ = &mut interrupt => {
                tracing::info!("Interrupted");
                let steps = controller.steps_applied();
                controller.stop();
                report(out, events, json)?;
                return Ok((RunState::Aborted, steps));
            }
        };
        report(out, events, json)?;

        let steps = controller.steps_applied();
        match advance? {
            Advance::Applied => {
                if step_limit.is_some_and(|limit| steps >= limit) {
                    tracing::info!(steps, "Step limit reached");
                    controller.stop();
                    report(out, events, json)?;
                    return Ok((RunState::Aborted, steps));
                }
            }
            Advance::Finished(state) => return Ok((state, steps)),
            Advance::Held | Advance::Inactive => return Ok((controller.state(), steps)),
        }
    }
}

fn report(
    out: &mut impl Write,
    events: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
    json: bool,
) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        if json {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
            continue;
        }
        match event {
            PlaybackEvent::Step { index, step } => writeln!(
                out,
                "{index:>6} {:<9} {:?}  {}",
                step.kind(),
                step.array(),
                step.description()
            )?,
            PlaybackEvent::Done { completed } => {
                writeln!(out, "completed {} positions", completed.len())?;
            }
            PlaybackEvent::Fault { message } => bail!("run failed: {message}"),
            PlaybackEvent::Lifecycle { .. } => {}
        }
    }
    Ok(())
}

fn print_algorithms(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{:<10} {:<15} {:<12} {:<12} {:<12} {:<9} STABLE",
        "ID", "NAME", "BEST", "AVERAGE", "WORST", "SPACE"
    )?;
    for d in descriptors() {
        writeln!(
            out,
            "{:<10} {:<15} {:<12} {:<12} {:<12} {:<9} {}",
            d.id.as_str(),
            d.name,
            d.best_case,
            d.average_case,
            d.worst_case,
            d.space_complexity,
            if d.stable { "yes" } else { "no" }
        )?;
    }
    Ok(())
}
