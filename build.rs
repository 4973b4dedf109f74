//! Build script for the nowplaying CLI.
//!
//! Copies the `.env.example` configuration template into the user's local
//! data directory, next to where the application looks for its optional
//! `.env` file and its credential store.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root to the local data directory.
///
/// # Destination
///
/// - Linux: `~/.local/share/nowplaying/.env.example`
/// - macOS: `~/Library/Application Support/nowplaying/.env.example`
/// - Windows: `%LOCALAPPDATA%/nowplaying/.env.example`
///
/// A missing template only produces a `cargo:warning`; failing to create the
/// directory or write the copy fails the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("nowplaying");
    fs::create_dir_all(&out_dir)?;

    if template.is_file() {
        fs::copy(&template, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
    }

    Ok(())
}
