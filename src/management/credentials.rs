use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::AsyncWriteExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Error, Res, types::Credential};

const REQUIRED_FIELDS: [&str; 2] = ["access_token", "expires_in"];

/// Durable single-record storage of the current [`Credential`].
///
/// The store holds zero or one credential. Writes go to a sibling temporary
/// file that is flushed, synced and then renamed over the store, so a reader
/// sees either the previous record or the new one.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// Nothing is touched on disk until the first [`write`](Self::write).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if a credential file is present. Its contents are not checked;
    /// that happens in [`read`](Self::read).
    pub async fn exists(&self) -> bool {
        async_fs::metadata(&self.path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Reads and validates the stored credential.
    ///
    /// Records written without `issued_at` take it from the file's
    /// modification time.
    ///
    /// # Errors
    ///
    /// - [`Error::CorruptStore`] if the file is missing, is not a JSON object
    ///   or holds fields of the wrong type
    /// - [`Error::MissingField`] if `access_token` or `expires_in` is absent
    pub async fn read(&self) -> Res<Credential> {
        let content = async_fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.corrupt(e))?;
        let mut value: Value = serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;

        let Some(object) = value.as_object_mut() else {
            return Err(self.corrupt("expected a JSON object"));
        };

        for field in REQUIRED_FIELDS {
            if object.get(field).is_none_or(Value::is_null) {
                return Err(Error::MissingField {
                    path: self.path.clone(),
                    field,
                });
            }
        }

        if !object.contains_key("issued_at") {
            let issued_at = self.modified_at().await?;
            warn!(
                path = %self.path.display(),
                issued_at,
                "credential has no issued_at, using file modification time"
            );
            object.insert("issued_at".to_string(), Value::from(issued_at));
        }

        serde_json::from_value(value).map_err(|e| self.corrupt(e))
    }

    /// Replaces the stored credential.
    ///
    /// Creates missing parent directories. The record goes to
    /// `<name>.tmp` first and is renamed into place once it is on disk.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the directory, the temporary file or the rename
    /// fails. The previous record is left in place in that case.
    pub async fn write(&self, credential: &Credential) -> Res<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(credential)?;
        let tmp = self.temp_path();

        if let Err(e) = write_synced(&tmp, json.as_bytes()).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(e);
        }
        async_fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "credential written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn modified_at(&self) -> Res<i64> {
        let modified = async_fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| self.corrupt(e))?;
        Ok(DateTime::<Utc>::from(modified).timestamp())
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        Error::CorruptStore {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Writes `bytes` to a fresh file at `path`, flushed and synced.
///
/// On unix the file is created with mode 0600, so the tokens are never
/// readable by other users, not even before the rename.
async fn write_synced(path: &Path, bytes: &[u8]) -> Res<()> {
    // the mode only applies on creation, so a stale file must go first
    match async_fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = async_fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use async_fs::unix::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
