//! Artifact storage
//!
//! One flat directory holds every uploaded PDF and generated MP3, named
//! `<id>.pdf` / `<id>.mp3` where `<id>` is minted per conversion.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Identifier shared by a document and its audio artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Mint a fresh random identifier (32 lowercase hex characters)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn document_name(&self) -> String {
        format!("{}.pdf", self.0)
    }

    pub fn audio_name(&self) -> String {
        format!("{}.mp3", self.0)
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle on the storage directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await.map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the uploaded document
    pub async fn save_document(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        self.write(&id.document_name(), bytes).await
    }

    /// Persist the synthesized audio
    pub async fn save_audio(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        self.write(&id.audio_name(), bytes).await
    }

    /// Read a stored file by name
    ///
    /// Names that could escape the directory are reported as not found.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        if !is_safe_name(name) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let path = self.root.join(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            // A directory with a matching name is not a stored file
            Err(_) if path.is_dir() => Err(StorageError::NotFound(name.to_string())),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.root.join(name);
        fs::write(&path, bytes).await.map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Stored {} bytes at {:?}", bytes.len(), path);
        Ok(path)
    }
}

/// A single path component inside the storage directory
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
        && !name.chars().any(|c| c.is_control() || c == '"')
}

/// Get MIME type for a stored file
pub fn get_mime_type(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("pdf") => "application/pdf",
        Some("wav") => "audio/wav",
        Some("ogg") | Some("opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
