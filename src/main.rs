//! Lookahead host — reads JSON control messages from stdin, one per line,
//! and sends outbound messages to stdout or an OSC target.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::thread;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use lookahead::config::{SchedulerConfig, SinkConfig, DEFAULT_OSC_TARGET};
use lookahead::protocol::ControlMessage;
use lookahead::scheduler::{ControlSender, SchedulerHandle};
use lookahead::sink::osc::DEFAULT_ADDRESS_PREFIX;
use lookahead::sink::{EventSink, JsonLineSink, OscSink};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SinkKind {
    Stdout,
    Osc,
}

#[derive(Parser)]
#[command(name = "lookahead")]
#[command(about = "Lookahead note scheduler driven by JSON lines on stdin", long_about = None)]
struct Cli {
    /// Config file (default: ~/.lookahead/scheduler.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where outbound messages go; overrides the config file
    #[arg(short, long, value_enum)]
    sink: Option<SinkKind>,

    /// OSC target address, e.g. 127.0.0.1:57120
    #[arg(long)]
    osc_target: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SchedulerConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                process::exit(1);
            }
        },
        None => SchedulerConfig::load().unwrap_or_default(),
    };

    let sink = match build_sink(&cli, &config.sink) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("cannot open sink: {e}");
            process::exit(1);
        }
    };

    let handle = match SchedulerHandle::spawn(config, sink) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let quit = handle.sender();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = quit.send(ControlMessage::Quit);
    }) {
        log::warn!("no ctrl-c handler: {e}");
    }

    let input = handle.sender();
    thread::spawn(move || read_stdin(input));

    if let Err(e) = handle.join() {
        eprintln!("{e}");
        process::exit(1);
    }
}

/// Resolve the sink from command-line overrides, then the config file.
fn build_sink(cli: &Cli, configured: &SinkConfig) -> io::Result<Box<dyn EventSink + Send>> {
    let use_osc = match cli.sink {
        Some(SinkKind::Stdout) => false,
        Some(SinkKind::Osc) => true,
        None => cli.osc_target.is_some() || matches!(configured, SinkConfig::Osc { .. }),
    };
    if !use_osc {
        return Ok(Box::new(JsonLineSink::new(io::stdout())));
    }

    let (target, prefix) = match configured {
        SinkConfig::Osc {
            target,
            address_prefix,
        } => (target.clone(), address_prefix.clone()),
        SinkConfig::Stdout => (
            DEFAULT_OSC_TARGET.to_string(),
            DEFAULT_ADDRESS_PREFIX.to_string(),
        ),
    };
    let target = cli.osc_target.clone().unwrap_or(target);
    let sink = OscSink::connect(&target, prefix)?;
    log::info!("sending OSC to {}", sink.target());
    Ok(Box::new(sink))
}

fn read_stdin(sender: ControlSender) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if sender.send_json(&line).is_err() {
            return;
        }
    }
    let _ = sender.send(ControlMessage::Quit);
}
