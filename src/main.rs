//! Fibtrack command-line front end.
//!
//! Serves a movable cursor over the Fibonacci sequence on stdin/stdout, one
//! command per line:
//!
//! - `current`: value at the cursor
//! - `next`: advance, then serve
//! - `previous`: retreat (never below 0), then serve
//! - `stats`: direct/close/miss counters
//! - `quit`: journal the cursor and exit
//!
//! Every reply is a single JSON line. The cursor index is journaled to a file
//! on an interval and restored on startup; the cache always starts cold. If
//! the journal gives up, any pending command is answered with
//! `{"error":"journal stopped"}` and the process exits non-zero.

use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use fibtrack::config::Backend;
use fibtrack::config::Config;
use fibtrack::cursor::Cursor;
use fibtrack::journal::Journal;
use fibtrack::journal::JournalWorker;
use fibtrack::Error;
use fibtrack::SequenceSource;

#[derive(Parser)]
#[command(name = "fibtrack")]
#[command(version)]
#[command(about = "Serve a movable cursor over the Fibonacci sequence")]
struct Cli {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage strategy
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Cache every Nth pair
    #[arg(long)]
    pad: Option<u32>,

    /// Cached pairs (ring, lru) or prefix slots (dense)
    #[arg(long)]
    capacity: Option<usize>,

    /// Anchors probed before walking from the origin
    #[arg(long)]
    probe_window: Option<u32>,

    /// Values precomputed at startup
    #[arg(long)]
    initial_fill: Option<u32>,

    /// Dense store growth multiple
    #[arg(long)]
    growth_factor: Option<u32>,

    /// File the cursor index is journaled to
    #[arg(long)]
    file: Option<PathBuf>,

    /// Seconds between journal writes
    #[arg(long)]
    seconds: Option<u64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(pad) = self.pad {
            config.cache_pad = pad;
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(probe_window) = self.probe_window {
            config.probe_window = probe_window;
        }
        if let Some(initial_fill) = self.initial_fill {
            config.initial_fill = initial_fill;
        }
        if let Some(growth_factor) = self.growth_factor {
            config.growth_factor = growth_factor;
        }
        if let Some(file) = &self.file {
            config.journal_path = file.clone();
        }
        if let Some(seconds) = self.seconds {
            config.journal_seconds = seconds;
        }
        config.validate()?;
        return Ok(config);
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    error: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = cli.config().and_then(|config| match config.backend {
        Backend::Ring => serve(&config, config.ring_tracker()?),
        Backend::Lru => serve(&config, config.lru_tracker()?),
        Backend::Dense => serve(&config, config.dense_tracker()?),
    });

    match result {
        Ok(()) => return ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fibtrack stopped");
            return ExitCode::FAILURE;
        }
    }
}

/// Lines read from stdin on a separate thread, so the serving loop can also
/// watch the journal worker while input is idle.
fn spawn_reader() -> Result<mpsc::Receiver<std::io::Result<String>>, Error> {
    let (send, lines) = mpsc::channel();
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if send.send(line).is_err() {
                    return;
                }
            }
        })?;
    return Ok(lines);
}

/// Reply to one command, or `None` when the session should end.
fn respond<S: SequenceSource>(cursor: &Cursor<S>, command: &str) -> Option<Result<String, serde_json::Error>> {
    let reply = match command {
        "current" => serde_json::to_string(&cursor.current()),
        "next" => serde_json::to_string(&cursor.advance()),
        "previous" => serde_json::to_string(&cursor.retreat()),
        "stats" => serde_json::to_string(&cursor.stats()),
        "quit" => return None,
        other => {
            tracing::debug!(command = other, "unknown command");
            serde_json::to_string(&Failure { error: "unknown command" })
        }
    };
    return Some(reply);
}

fn serve<S: SequenceSource + 'static>(config: &Config, source: S) -> Result<(), Error> {
    let mut journal = Journal::open(&config.journal_path)?;
    let start = journal.resume_index();

    let cursor = Arc::new(Cursor::with_index(source, start));
    let worker = {
        let cursor = cursor.clone();
        JournalWorker::spawn(journal, config.journal_interval(), move || cursor.index())?
    };
    tracing::info!(backend = ?config.backend, pad = config.cache_pad, capacity = config.capacity, "serving on stdin");

    let lines = spawn_reader()?;
    let mut stdout = std::io::stdout().lock();
    loop {
        let line = match lines.recv_timeout(config.journal_interval()) {
            Ok(line) => line?,
            Err(RecvTimeoutError::Timeout) => {
                if worker.is_finished() {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if worker.is_finished() {
            let reply = serde_json::to_string(&Failure { error: "journal stopped" })?;
            writeln!(stdout, "{}", reply)?;
            stdout.flush()?;
            break;
        }
        let reply = match respond(&cursor, command) {
            Some(reply) => reply?,
            None => break,
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }

    // The stdin thread may still be blocked on a read; exiting main ends it.
    return worker.stop();
}
