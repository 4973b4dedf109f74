//! Spotify "now playing" CLI library
//!
//! This library reports the track currently playing on a user's Spotify
//! account. It owns the OAuth2 token lifecycle: obtaining a first token pair
//! through the authorization-code flow, reusing a cached access token while
//! it is valid, and renewing it with the refresh token once it expires. The
//! token set is persisted to local disk between runs.
//!
//! # Modules
//!
//! - `cli` - The single command and its interactive authorization prompt
//! - `config` - Configuration loading from the environment and `.env` files
//! - `error` - The error taxonomy shared by every module
//! - `http` - The outbound HTTP capability and its reqwest implementation
//! - `management` - Credential persistence and the token lifecycle
//! - `spotify` - Authorization, refresh and playback queries against Spotify
//! - `types` - Data structures exchanged with Spotify and stored on disk
//! - `utils` - Clock abstraction and small helpers
//!
//! # Example
//!
//! ```
//! use nowplaying::{cli, config};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> nowplaying::Res<()> {
//!     config::load_env();
//!     let config = config::Config::from_env()?;
//!     println!("{}", cli::now_playing(&config).await?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod management;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports an [`Error`], so callers can
/// match on the failure class (configuration, store, authorization, refresh)
/// instead of inspecting strings.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Diagnostics go to stderr; stdout is reserved for the single status line.
///
/// # Example
///
/// ```
/// info!("Opening authorization page...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark to stderr.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 right after printing. Only used
/// from the binary for unrecoverable failures.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark to stderr.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
