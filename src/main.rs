use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gcodelink::{
    init_logging, list_ports, CommandSource, Config, FirmwareKind, ParsedEvent, PortEvent,
    PortRegistry, WorkflowCommand, WorkflowState,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Stream G-code to Grbl, Marlin, Smoothieware and TinyG controllers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/gcodelink/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port, overriding connection.port
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate, overriding connection.baud_rate
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Firmware family (grbl, marlin, smoothie, tinyg), overriding connection.firmware
    #[arg(short, long, global = true)]
    firmware: Option<FirmwareKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports that look like motion controllers
    Ports,
    /// Stream a G-code file and wait for it to finish
    Stream {
        /// G-code file
        file: PathBuf,
    },
    /// Send one or more lines and wait for their acknowledgments
    Send {
        /// Lines to send, in order
        #[arg(required = true)]
        lines: Vec<String>,
    },
}

enum Job {
    Program { name: String, gcode: String },
    Lines(Vec<String>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    if let Some(port) = cli.port {
        config.connection.port = Some(port);
    }
    if let Some(baud) = cli.baud {
        config.connection.baud_rate = baud;
    }
    if let Some(firmware) = cli.firmware {
        config.connection.firmware = firmware;
    }
    config.validate()?;

    init_logging(&config.logging)?;
    tracing::debug!("gcodelink {} built {}", gcodelink::VERSION, gcodelink::BUILD_DATE);

    match cli.command {
        Command::Ports => print_ports(),
        Command::Stream { file } => {
            let gcode = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            run(&config, Job::Program { name, gcode }).await
        }
        Command::Send { lines } => run(&config, Job::Lines(lines)).await,
    }
}

fn print_ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No controller ports found");
    }
    for port in ports {
        match port.manufacturer {
            Some(manufacturer) => {
                println!("{}\t{} ({})", port.port_name, port.description, manufacturer)
            }
            None => println!("{}\t{}", port.port_name, port.description),
        }
    }
    Ok(())
}

async fn run(config: &Config, job: Job) -> anyhow::Result<()> {
    let port = config
        .connection
        .port
        .clone()
        .context("no port given; use --port or set connection.port")?;

    let registry = PortRegistry::serial(config.session_config());
    let handle = registry.open_port(
        &port,
        config.connection.baud_rate,
        config.connection.firmware,
    )?;
    let mut events = handle.receiver();

    if !handle.snapshot().ready {
        tokio::time::timeout(READY_TIMEOUT, wait_ready(&mut events))
            .await
            .with_context(|| format!("{} did not report ready", port))??;
    }

    match job {
        Job::Program { name, gcode } => {
            let lines = registry.load_program(&port, &name, &gcode).await?;
            tracing::info!("Loaded {} ({} lines)", name, lines);
        }
        Job::Lines(lines) => {
            for line in &lines {
                registry.enqueue(&port, line, CommandSource::System).await?;
            }
        }
    }
    registry
        .set_workflow_state(&port, WorkflowCommand::Start)
        .await?;

    let outcome = tokio::select! {
        outcome = follow(&mut events) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; stopping {}", port);
            if let Err(e) = registry.set_workflow_state(&port, WorkflowCommand::Stop).await {
                tracing::debug!("Stop after interrupt: {}", e);
            }
            Ok(())
        }
    };

    let snapshot = handle.snapshot();
    tracing::info!(
        "{}: {}/{} commands acknowledged",
        port,
        snapshot.queue_executed,
        snapshot.queue_total
    );

    if let Err(e) = registry.close_port(&port).await {
        tracing::debug!("Closing {}: {}", port, e);
    }
    outcome
}

async fn wait_ready(events: &mut broadcast::Receiver<PortEvent>) -> anyhow::Result<()> {
    loop {
        match events.recv().await {
            Ok(PortEvent::Ready) => return Ok(()),
            Ok(PortEvent::Disconnected { reason }) => bail!("port closed: {}", reason),
            Ok(event) => tracing::debug!("{}", event),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => bail!("event stream closed"),
        }
    }
}

/// Log events until the queue runs dry or the machine alarms
async fn follow(events: &mut broadcast::Receiver<PortEvent>) -> anyhow::Result<()> {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Missed {} events", missed);
                continue;
            }
            Err(RecvError::Closed) => bail!("event stream closed"),
        };

        match event {
            PortEvent::Parsed(ParsedEvent::Alarm(alarm)) => bail!("alarm: {}", alarm),
            PortEvent::Parsed(ParsedEvent::Feedback { message }) => {
                tracing::info!("[MSG] {}", message)
            }
            PortEvent::WorkflowChanged {
                to: WorkflowState::Idle,
                ..
            } => return Ok(()),
            PortEvent::CommandFailed { command, message } => {
                tracing::warn!("{} failed: {}", command.text, message)
            }
            PortEvent::QueueStalled { command, waited_ms } => {
                tracing::warn!("No acknowledgment for {} after {} ms", command.text, waited_ms)
            }
            PortEvent::Disconnected { reason } => bail!("port closed: {}", reason),
            other => tracing::debug!("{}", other),
        }
    }
}
