//! Transcript storage trait and the file-backed implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chat_core::Transcript;
use tokio::fs;

use crate::error::Result;

/// Durable storage for transcripts, keyed by resource name.
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Load a transcript. A missing or unparsable resource recovers to an
    /// empty transcript; this is never an error.
    async fn load(&self, name: &str) -> Transcript;

    /// Persist a transcript. A subsequent `load` sees either the previous
    /// state or the new one, never a partial write.
    async fn save(&self, name: &str, transcript: &Transcript) -> Result<()>;

    async fn exists(&self, name: &str) -> bool;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn delete(&self, name: &str) -> Result<()>;

    /// Names of all stored transcripts, sorted.
    async fn list(&self) -> Result<Vec<String>>;

    /// First free name derived from `base`: the bare name, then `base_1`,
    /// `base_2`, and so on.
    async fn unique_name(&self, base: &str) -> String {
        if !self.exists(base).await {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.exists(&candidate).await {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// File-backed store: one pretty-printed JSON array per transcript, at
/// `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl HistoryStorage for FileHistoryStore {
    async fn load(&self, name: &str) -> Transcript {
        let path = self.path_for(name);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) => {
                log::debug!("no history at {}: {err}", path.display());
                return Transcript::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(transcript) => transcript,
            Err(err) => {
                log::warn!(
                    "history file {} is unparsable, starting empty: {err}",
                    path.display()
                );
                Transcript::new()
            }
        }
    }

    async fn save(&self, name: &str, transcript: &Transcript) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(name);
        let contents = serde_json::to_string_pretty(transcript)?;

        // Write through a temp sibling and rename over the target, so a
        // concurrent load never observes a half-written file.
        let tmp = self.dir.join(format!("{name}.json.tmp"));
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.path_for(from), self.path_for(to)).await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Default storage namespace: `~/.parley/history`.
pub fn default_history_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".parley")
        .join("history")
}
