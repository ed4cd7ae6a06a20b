use abengine::chess;
use abengine::uci::{EngineOptions, Flow, UciEngine};
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};
use std::io::{self, BufRead, Write};
use std::thread;

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI alpha-beta chess engine", long_about = None)]
struct Args {
    /// Transposition table size in MB
    #[arg(long, value_name = "MB", default_value_t = 16)]
    hash: usize,

    /// Plies of capture search below the horizon
    #[arg(long, value_name = "PLIES", default_value_t = 8)]
    qdepth: i32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    );
    // stdout carries protocol lines only
    builder
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();
}

/// Writes protocol lines to stdout until every sender is gone
fn print_lines(lines: Receiver<String>) -> io::Result<()> {
    let stdout = io::stdout();
    for line in lines {
        let mut out = stdout.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    chess::init();

    let options = EngineOptions {
        hash_mb: args.hash,
        quiescence_depth: args.qdepth.max(0),
        ..EngineOptions::default()
    };
    log::info!("starting with {options:?}");

    let (tx, rx) = unbounded();
    let printer = thread::Builder::new()
        .name("stdout".to_string())
        .spawn(move || print_lines(rx))
        .context("could not start the output thread")?;

    let mut engine = UciEngine::new(options, tx);
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read from stdin")?;
        if engine.handle_line(&line) == Flow::Quit {
            break;
        }
    }

    // finishes any running search and closes the output channel
    drop(engine);
    match printer.join() {
        Ok(result) => result.context("failed to write to stdout")?,
        Err(_) => anyhow::bail!("output thread panicked"),
    }
    Ok(())
}
