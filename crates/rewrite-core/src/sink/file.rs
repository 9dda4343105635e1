// # File Sink
//
// File-based implementation of ConfigSink with crash recovery.
//
// ## Purpose
//
// Persists the rewrite rules across restarts. Every committed mutation of
// the store rewrites the whole file.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good file
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "generation": 4,
//   "rewrites": [
//     { "domain": "ads.example.com", "answer": "0.0.0.0" }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::SinkConfig;
use crate::rule::Rule;
use crate::traits::config_sink::{ConfigSink, RuleSnapshot, SinkFactory};

/// Rewrites file format version
/// Used for future migration if format changes
const REWRITES_FILE_VERSION: &str = "1.0";

/// File-based sink with crash recovery
///
/// Writes are serialized. A snapshot whose generation is not newer than
/// the last one written by this sink is skipped, so out-of-order
/// notifications never overwrite a newer file.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rewrite_core::{FileSink, RuleStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = FileSink::new("/var/lib/rewrites/rewrites.json").await?;
///     let store = RuleStore::load(Arc::new(sink)).await?;
///
///     // Persisted to disk after the lock is released
///     store.add("ads.example.com", "0.0.0.0").await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    /// Generation of the last snapshot written
    written: Mutex<u64>,
}

/// Serializable rewrites file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RewritesFileFormat {
    version: String,
    saved_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    generation: u64,
    rewrites: Vec<Rule>,
}

impl FileSink {
    /// Create a file sink, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create rewrites directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path,
            written: Mutex::new(0),
        })
    }

    /// Path of the rewrites file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load rules with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main file
    /// 2. If JSON parse error, try loading backup
    /// 3. If backup also fails, start with no rules
    async fn load_with_recovery(path: &Path) -> Result<RuleSnapshot, Error> {
        match Self::load_file(path).await {
            Ok(loaded) => {
                tracing::debug!(
                    "Loaded rewrites from file: {} rules at generation {}",
                    loaded.rules.len(),
                    loaded.generation
                );
                Ok(loaded)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Rewrites file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with no rewrites.");
                    return Ok(RuleSnapshot::default());
                }

                match Self::load_file(&backup_path).await {
                    Ok(loaded) => {
                        tracing::info!(
                            "Recovered rewrites from backup: {} rules",
                            loaded.rules.len()
                        );

                        let restored = Self::restore_from_backup(path, &backup_path).await;
                        if let Err(restore_err) = restored {
                            tracing::error!(
                                "Failed to restore rewrites file from backup: {}",
                                restore_err
                            );
                        }

                        Ok(loaded)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with no rewrites.",
                            backup_err
                        );
                        Ok(RuleSnapshot::default())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load rules from file
    ///
    /// Parse failures are returned as [`Error::Json`] so the caller can tell
    /// corruption apart from I/O failures.
    async fn load_file(path: &Path) -> Result<RuleSnapshot, Error> {
        if !path.exists() {
            tracing::debug!("Rewrites file does not exist: {}", path.display());
            return Ok(RuleSnapshot::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to read rewrites file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: RewritesFileFormat = serde_json::from_str(&content)?;

        if file.version != REWRITES_FILE_VERSION {
            tracing::warn!(
                "Rewrites file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                REWRITES_FILE_VERSION,
                file.version
            );
        }

        Ok(RuleSnapshot::new(file.generation, file.rewrites))
    }

    /// Write a snapshot to file atomically
    async fn write_snapshot(&self, snapshot: &RuleSnapshot) -> Result<(), Error> {
        let file = RewritesFileFormat {
            version: REWRITES_FILE_VERSION.to_string(),
            saved_at: chrono::Utc::now(),
            generation: snapshot.generation,
            rewrites: snapshot.rules.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::sink(format!("Failed to serialize rewrites: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.flush().await.map_err(|e| {
                Error::sink(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(
            "Rewrites generation {} written to file: {}",
            snapshot.generation,
            self.path.display()
        );
        Ok(())
    }

    /// Restore rewrites file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored rewrites file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ConfigSink for FileSink {
    async fn config_modified(&self, snapshot: &RuleSnapshot) -> Result<(), Error> {
        let mut written = self.written.lock().await;
        if !snapshot.is_newer_than(*written) {
            tracing::debug!(
                "Skipping stale rewrites generation {} (already wrote {})",
                snapshot.generation,
                *written
            );
            return Ok(());
        }

        self.write_snapshot(snapshot).await?;
        *written = snapshot.generation;
        Ok(())
    }

    async fn load(&self) -> Result<RuleSnapshot, Error> {
        let mut written = self.written.lock().await;
        let loaded = Self::load_with_recovery(&self.path).await?;
        *written = loaded.generation;
        Ok(loaded)
    }

    fn sink_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for [`FileSink`]
#[derive(Debug, Default)]
pub struct FileSinkFactory;

#[async_trait]
impl SinkFactory for FileSinkFactory {
    async fn create(&self, config: &SinkConfig) -> Result<Box<dyn ConfigSink>, Error> {
        match config {
            SinkConfig::File { path } => Ok(Box::new(FileSink::new(path).await?)),
            other => Err(Error::config(format!(
                "File sink factory cannot build a {} sink",
                other.type_name()
            ))),
        }
    }
}
