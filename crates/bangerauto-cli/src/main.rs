mod app;
mod input;
mod settings;

use anyhow::Result;
use bangerauto_core::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bangerauto")]
#[command(about = "Autoplay toggler for the beatbanger rhythm game")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "bangerauto.toml")]
    config: PathBuf,

    /// Version configuration file, overrides the settings file
    #[arg(long, env = "BANGERAUTO_VERSIONS")]
    versions: Option<PathBuf>,

    /// Target process executable name, overrides the settings file
    #[arg(short, long)]
    process: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose {
        "bangerauto=debug"
    } else {
        "bangerauto=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    info!("bangerauto {} starting...", env!("CARGO_PKG_VERSION"));

    let settings = settings::load_settings(&args.config);
    let settings = settings::apply_overrides(settings, args.versions, args.process);

    run(settings)
}

#[cfg(target_os = "windows")]
fn run(settings: Settings) -> Result<()> {
    app::run(bangerauto_core::WindowsProcessProvider::new(), settings)
}

#[cfg(not(target_os = "windows"))]
fn run(_settings: Settings) -> Result<()> {
    anyhow::bail!("bangerauto only supports Windows")
}
