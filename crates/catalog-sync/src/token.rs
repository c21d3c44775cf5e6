//! # Token Store
//!
//! Holds the current partner access token and shares it with every task
//! that calls the partner.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Token Sharing                                       │
//! │                                                                         │
//! │  TokenStore (single writer)                                            │
//! │  └── owned by TokenRefresher                                           │
//! │       │                                                                 │
//! │       │ replace(token) ──► watch::Sender::send_replace                 │
//! │       │                └─► token file (optional)                       │
//! │       ▼                                                                 │
//! │  watch channel: Option<Arc<AccessToken>>                               │
//! │       │                                                                 │
//! │       ├──► TokenReader (OfferReconciler)                               │
//! │       ├──► TokenReader (ProductRegistrar)                              │
//! │       └──► TokenReader (health endpoint)                               │
//! │                                                                         │
//! │  Readers always see a complete token, old or new, never a mix.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token File
//! ```json
//! {"ACCESS_TOKEN": "eyJ...", "TIME": "2024-05-01T10:00:00Z"}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog_core::AccessToken;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

type TokenSlot = Option<Arc<AccessToken>>;

// =============================================================================
// Token Store
// =============================================================================

/// Writer side of the shared access token.
///
/// There is exactly one `TokenStore` per process. It is not `Clone`.
#[derive(Debug)]
pub struct TokenStore {
    tx: watch::Sender<TokenSlot>,
    file: Option<PathBuf>,
}

impl TokenStore {
    /// Creates an empty store, optionally backed by a token file.
    pub fn new(file: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, file }
    }

    /// Creates an empty store with no file backing.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Creates a store holding `token`, with no file backing.
    pub fn with_token(token: AccessToken) -> Self {
        let (tx, _rx) = watch::channel(Some(Arc::new(token)));
        Self { tx, file: None }
    }

    /// Creates a store seeded from the token file, if one is configured.
    ///
    /// A missing file starts the store empty. So does an unreadable or
    /// corrupt file (logged); the refresher will acquire a new token.
    pub fn load(file: Option<PathBuf>) -> Self {
        let store = Self::new(file);

        if let Some(path) = store.file.as_deref() {
            match read_token_file(path) {
                Ok(Some(token)) => {
                    info!(
                        path = %path.display(),
                        acquired_at = %token.acquired_at,
                        "Loaded access token from file"
                    );
                    store.tx.send_replace(Some(Arc::new(token)));
                }
                Ok(None) => debug!(path = %path.display(), "No token file yet"),
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable token file"),
            }
        }

        store
    }

    /// Returns a new reader of the shared token.
    pub fn reader(&self) -> TokenReader {
        TokenReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns the current token, if any.
    pub fn current(&self) -> Option<Arc<AccessToken>> {
        self.tx.borrow().clone()
    }

    /// Publishes a new token to every reader, then writes the token file.
    ///
    /// ## Errors
    /// * `SyncError::TokenPersist` - the file could not be written. Readers
    ///   already hold the new token at that point.
    pub async fn replace(&self, token: AccessToken) -> SyncResult<()> {
        let token = Arc::new(token);
        self.tx.send_replace(Some(Arc::clone(&token)));

        if let Some(path) = self.file.as_deref() {
            write_token_file(path, &token).await?;
            debug!(path = %path.display(), "Token file written");
        }

        Ok(())
    }

    /// The token file path, if configured.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

// =============================================================================
// Token Reader
// =============================================================================

/// Read side of the shared access token. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TokenReader {
    rx: watch::Receiver<TokenSlot>,
}

impl TokenReader {
    /// Returns a snapshot of the current token.
    pub fn current(&self) -> Option<Arc<AccessToken>> {
        self.rx.borrow().clone()
    }

    /// Returns the bearer value to put on an outbound request.
    pub fn bearer(&self) -> Option<String> {
        self.rx.borrow().as_ref().map(|t| t.token.clone())
    }

    /// When the current token was acquired.
    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.rx.borrow().as_ref().map(|t| t.acquired_at)
    }

    /// Waits until the token is replaced.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<AccessToken>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}

// =============================================================================
// Token File
// =============================================================================

fn read_token_file(path: &Path) -> SyncResult<Option<AccessToken>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::TokenPersist(e.to_string())),
    };

    let token = serde_json::from_str(&contents)?;
    Ok(Some(token))
}

/// Writes the record next to its final path and renames it into place.
async fn write_token_file(path: &Path, token: &AccessToken) -> SyncResult<()> {
    let persist = |e: std::io::Error| SyncError::TokenPersist(e.to_string());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persist)?;
    }

    let contents =
        serde_json::to_string(token).map_err(|e| SyncError::TokenPersist(e.to_string()))?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await.map_err(persist)?;
    tokio::fs::rename(&tmp, path).await.map_err(persist)?;

    Ok(())
}
