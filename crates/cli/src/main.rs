//! CLI entry point for Kids Timelapse
//!
//! Loads the configuration, checks the external tools and compiles one
//! timelapse.

use clap::Parser;
use kids_timelapse::{run_startup_checks, Config, Ffmpeg, TimelapseCompiler};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Kids Timelapse - compile a folder of clips into one captioned timelapse
#[derive(Parser, Debug)]
#[command(name = "kids-timelapse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Skip the ffmpeg/ffprobe availability checks
    #[arg(long, default_value = "false")]
    skip_checks: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    info!(config = %args.config.display(), "kids-timelapse starting");

    let config = match Config::load_or_default(Some(args.config.as_path())) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.skip_checks {
        warn!("skipping startup checks (--skip-checks enabled)");
    } else if let Err(e) = run_startup_checks(&config) {
        error!("Startup check failed: {}", e);
        return ExitCode::FAILURE;
    }

    let compiler = match TimelapseCompiler::new(config, Ffmpeg) {
        Ok(compiler) => compiler,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match compiler.run() {
        Ok(path) => {
            info!(path = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
