//! liveparse-decode-worker - Decode a capture of live-parse messages.
//!
//! Reads a capture file (length-prefixed compressed messages), runs every
//! message through the decode pipeline and prints one JSON object per line
//! to stdout, ending with a summary.
//!
//! Usage: liveparse-decode-worker <capture> [--workers N] [--encounter UID] [--parse-log-lines]

mod capture;

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use liveparse_core::combat_log::{LogLineParser, ParsedLogEvent};
use liveparse_core::dispatch::{Dispatcher, PipelineEvent, ProtocolMismatchMonitor};
use liveparse_core::state::{CacheUpdate, DecodeWorkerOutput, EncounterCache};
use liveparse_core::{config, wire::Record};
use liveparse_types::formatting::{format_compact, format_elapsed_ms, format_loading};
use liveparse_types::{DecodeMode, PipelineConfig};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::filter::EnvFilter;

use crate::capture::Capture;

#[derive(Parser, Debug)]
#[command(version, about = "Decode a capture of compressed live-parse messages")]
struct Args {
    /// Capture file: u32 big-endian length + compressed payload, repeated
    capture: PathBuf,

    /// Pipeline config file (TOML). Defaults to the user config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decode on a pool of N worker threads instead of inline
    #[arg(long)]
    workers: Option<usize>,

    /// Only emit records belonging to this encounter
    #[arg(long)]
    encounter: Option<String>,

    /// Records per cooperative slice
    #[arg(long)]
    yield_every: Option<usize>,

    /// Attach parsed combat events to log line records
    #[arg(long)]
    parse_log_lines: bool,

    /// Print only the final summary
    #[arg(long)]
    summary_only: bool,
}

/// One line of worker output.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutputLine<'a> {
    Record {
        seq: u64,
        worker: Option<usize>,
        record: &'a Record,
        #[serde(skip_serializing_if = "Option::is_none")]
        parsed: Option<&'a ParsedLogEvent>,
        /// Names of the parsed event's set flags
        #[serde(skip_serializing_if = "Vec::is_empty")]
        flags: Vec<&'static str>,
    },
    Progress {
        seq: u64,
        fraction: f64,
        message: String,
    },
    Ready {
        seq: u64,
        worker: Option<usize>,
        records: usize,
        forwarded: usize,
        trailing_bytes: usize,
    },
    Failed {
        seq: u64,
        worker: Option<usize>,
        error: String,
        records_emitted: usize,
    },
    ProtocolWarning {
        seq: u64,
        consecutive_failures: u32,
    },
    Summary(&'a DecodeWorkerOutput),
}

/// Initialize logging, writing to LIVEPARSE_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("LIVEPARSE_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    let timer = Instant::now();
    match run(&args).await {
        Ok(mut output) => {
            output.elapsed_ms = timer.elapsed().as_millis();
            tracing::info!(
                messages = output.messages,
                records = %format_compact(output.records as u64),
                elapsed = %format_elapsed_ms(output.elapsed_ms),
                "Capture decoded"
            );
            let mut out = BufWriter::new(std::io::stdout());
            let written =
                write_line(&mut out, &OutputLine::Summary(&output)).and_then(|_| out.flush());
            if let Err(e) = written {
                tracing::error!(error = %e, "Failed to write summary");
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Decode error");
            std::process::exit(1);
        }
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig, String> {
    let mut config = config::resolve(args.config.as_deref()).map_err(|e| e.to_string())?;

    if let Some(workers) = args.workers {
        config.mode = DecodeMode::Parallel;
        config.workers = workers;
    }
    if let Some(uid) = &args.encounter {
        config.encounter_uid = Some(uid.clone());
    }
    if let Some(n) = args.yield_every {
        config.yield_every = n;
    }
    Ok(config)
}

async fn run(args: &Args) -> Result<DecodeWorkerOutput, String> {
    let config = build_config(args)?;
    tracing::debug!(?config, "Pipeline config");

    let capture = Capture::open(&args.capture)?;
    if capture.is_empty() {
        tracing::warn!(path = %args.capture.display(), "Capture file is empty");
    }
    let messages = capture.messages();
    let message_count = messages.len();

    let (mut dispatcher, rx) =
        Dispatcher::new(&config).map_err(|e| format!("Failed to start workers: {}", e))?;

    let consumer = Consumer {
        cache: EncounterCache::new(),
        parser: args.parse_log_lines.then(LogLineParser::new),
        monitor: ProtocolMismatchMonitor::new(config.mismatch_warn_threshold),
        print_events: !args.summary_only,
        records: 0,
        failed_messages: 0,
        protocol_warnings: 0,
    };
    let consumer = tokio::spawn(consumer.run(rx));

    for payload in messages {
        dispatcher.submit(payload.to_vec()).await.map_err(|e| e.to_string())?;
    }

    // Joining workers blocks; keep it off the runtime threads
    tokio::task::spawn_blocking(move || dispatcher.finish())
        .await
        .map_err(|e| format!("Dispatcher shutdown failed: {}", e))?;

    let consumer = consumer
        .await
        .map_err(|e| format!("Consumer task failed: {}", e))??;
    Ok(consumer.into_output(message_count))
}

/// Receives pipeline events, keeps the encounter cache, prints JSON lines.
struct Consumer {
    cache: EncounterCache,
    parser: Option<LogLineParser>,
    monitor: ProtocolMismatchMonitor,
    print_events: bool,
    records: usize,
    failed_messages: usize,
    protocol_warnings: usize,
}

impl Consumer {
    async fn run(mut self, mut rx: UnboundedReceiver<PipelineEvent>) -> Result<Self, String> {
        let mut out = BufWriter::new(std::io::stdout());

        // Ends once the dispatcher and every worker have dropped their senders
        while let Some(event) = rx.recv().await {
            if let Some(warning) = self.monitor.observe(&event) {
                self.protocol_warnings += 1;
                self.print(
                    &mut out,
                    &OutputLine::ProtocolWarning {
                        seq: warning.seq,
                        consecutive_failures: warning.consecutive_failures,
                    },
                )?;
            }
            self.handle(&mut out, event)?;
        }

        out.flush().map_err(|e| e.to_string())?;
        Ok(self)
    }

    fn handle(&mut self, out: &mut impl Write, event: PipelineEvent) -> Result<(), String> {
        match event {
            PipelineEvent::Record { seq, worker, record } => {
                self.records += 1;
                let update = self.cache.apply(&record, self.parser.as_ref());
                let parsed = match &update {
                    CacheUpdate::LogLine(Some(event)) => Some(event),
                    _ => None,
                };
                self.print(
                    out,
                    &OutputLine::Record {
                        seq,
                        worker,
                        record: &record,
                        parsed,
                        flags: parsed.map(|e| e.flags.names()).unwrap_or_default(),
                    },
                )
            }
            PipelineEvent::Progress { seq, fraction } => {
                tracing::info!(seq, progress = %format_loading(fraction), "Decoding large message");
                self.print(
                    out,
                    &OutputLine::Progress {
                        seq,
                        fraction,
                        message: format_loading(fraction),
                    },
                )
            }
            PipelineEvent::Ready { seq, worker, summary } => self.print(
                out,
                &OutputLine::Ready {
                    seq,
                    worker,
                    records: summary.records,
                    forwarded: summary.forwarded,
                    trailing_bytes: summary.trailing_bytes,
                },
            ),
            PipelineEvent::Failed { seq, worker, error } => {
                self.failed_messages += 1;
                tracing::warn!(seq, ?worker, error = %error, "Message failed");
                self.print(
                    out,
                    &OutputLine::Failed {
                        seq,
                        worker,
                        error: error.to_string(),
                        records_emitted: error.records_emitted(),
                    },
                )
            }
        }
    }

    fn print(&self, out: &mut impl Write, line: &OutputLine<'_>) -> Result<(), String> {
        if !self.print_events {
            return Ok(());
        }
        write_line(out, line).map_err(|e| e.to_string())
    }

    fn into_output(self, messages: usize) -> DecodeWorkerOutput {
        let mut output = self.cache.to_worker_output(messages, self.failed_messages, self.records);
        output.protocol_warnings = self.protocol_warnings;
        output
    }
}

fn write_line(out: &mut impl Write, line: &OutputLine<'_>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")
}
