use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    Res, info,
    spotify::{CodePrompt, extract_code},
    success, warning,
};

/// Interactive prompt for the authorization code.
///
/// Opens the authorization page in the default browser, echoes the URL to
/// stderr in case that fails, and waits for the user to paste either the
/// code or the whole URL Spotify redirected to. There is no timeout.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    pub open_browser: bool,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        TerminalPrompt { open_browser: true }
    }
}

impl CodePrompt for TerminalPrompt {
    async fn request_code(&self, authorize_url: &str) -> Res<String> {
        info!("Please visit the following URL to authorize the application:\n\n{authorize_url}\n");
        if self.open_browser && webbrowser::open(authorize_url).is_err() {
            warning!("Failed to open browser. Please navigate to the URL above manually.");
        }
        info!("Enter the code (or the full URL) you were redirected to:");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        let code = extract_code(&line)?;
        if !code.is_empty() {
            success!("Authorization code received.");
        }
        Ok(code)
    }
}
