use std::io;

use clap::{
    Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use nowplaying::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

/// Prints the track currently playing on Spotify.
///
/// The first run asks for authorization in the browser; later runs reuse or
/// refresh the stored credential.
#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {}

fn init_tracing() {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=nowplaying=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _cli = Cli::parse();
    init_tracing();

    config::load_env();
    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    match cli::now_playing(&config).await {
        Ok(line) => println!("{line}"),
        Err(e) => error!("{}", e),
    }
}
