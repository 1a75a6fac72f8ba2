mod chrome;
mod dashboard;
mod format;
mod gauge;
mod layout;
mod metrics;
mod preferences;
mod probe;
mod recorder;
mod render;
mod sampler;
mod text;
mod theme;

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use chrome::{platform_chrome, WindowGeometry};
use metrics::Collector;
use preferences::Preferences;
use sampler::Sampler;

/// Terminal dashboard of host CPU, memory, disk and network vitals.
#[derive(Parser, Debug)]
#[command(name = "vitals", about = "Terminal system monitor", version)]
struct Args {
    /// Append every sample to the CSV log, whatever the config says.
    #[arg(long)]
    log: bool,

    /// Read configuration from this file instead of the default locations.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the effective configuration as JSON to PATH and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Draw a single frame without clearing the screen, then exit.
    #[arg(long)]
    once: bool,

    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long)]
    quiet: bool,
}

// ─── Logging ───────────────────────────────────────────────────────

/// Diagnostics go to stderr; stdout belongs to the dashboard.
/// `RUST_LOG` overrides the level picked from the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vitals={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

// ─── Entry ─────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let mut prefs = Preferences::load(args.config.as_deref());
    if args.log {
        prefs.logging_enabled = true;
    }
    debug!(?prefs, "effective configuration");

    if let Some(path) = &args.write_config {
        prefs.save(path).map_err(io::Error::other)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    for err in platform_chrome().prepare(&WindowGeometry::for_dashboard()) {
        debug!("terminal setup: {err}");
    }

    println!("Starting System Monitor...");
    let mut sampler = Sampler::new(Collector::new());
    let mut stdout = io::stdout();

    if args.once {
        let sample = sampler.tick(&prefs);
        sampler::record(&prefs, &sample);
        stdout.write_all(sampler::compose(&prefs, &sample).to_text().as_bytes())?;
        return stdout.flush();
    }

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("cannot install Ctrl-C handler: {e}");
    }

    sampler::run(&prefs, &mut sampler, &mut stdout, &stop)?;
    info!("interrupted by user");
    println!("\nStopped.");
    Ok(())
}
