use crate::directory::Directory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Durable home of a [`Directory`].
///
/// There is no incremental persistence: `save` always rewrites the whole
/// directory, `load` always rebuilds all of it.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self) -> Result<Directory>;
    async fn save(&self, directory: &Directory) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "accounts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn load(&self) -> Result<Directory> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No accounts file, starting empty");
                return Ok(Directory::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Directory::new());
        }

        let directory: Directory = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", self.path.display()))?;

        tracing::info!(
            path = %self.path.display(),
            accounts = directory.len(),
            "Loaded accounts"
        );
        Ok(directory)
    }

    async fn save(&self, directory: &Directory) -> Result<()> {
        let json = serde_json::to_vec_pretty(directory)?;
        let temp_path = self.temp_path();

        // Write the sibling first so a failed write never truncates the real file
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .with_context(|| format!("creating {}", temp_path.display()))?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            accounts = directory.len(),
            "Saved accounts"
        );
        Ok(())
    }
}

/// Keeps the last saved directory as serialized JSON, so every `load`
/// goes through the same decode and validation path as the file store.
pub struct InMemoryStore {
    snapshot: RwLock<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }

    pub async fn snapshot(&self) -> Option<String> {
        self.snapshot.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn load(&self) -> Result<Directory> {
        let snapshot = self.snapshot.read().await;
        match snapshot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Directory::new()),
        }
    }

    async fn save(&self, directory: &Directory) -> Result<()> {
        let json = serde_json::to_string(directory)?;
        *self.snapshot.write().await = Some(json);
        Ok(())
    }
}
