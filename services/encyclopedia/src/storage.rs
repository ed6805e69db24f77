//! Entries stored as `<dir>/<title>.md`

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::fs;
use tracing::info;

const EXTENSION: &str = ".md";

/// Longest title whose file name fits the usual 255-byte limit
pub const TITLE_MAX_BYTES: usize = 255 - EXTENSION.len();

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Check that a title maps to a single file inside the entries directory
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty.".to_string());
    }

    if title.starts_with('.') {
        return Err("Title cannot start with '.'.".to_string());
    }

    if title.contains(['/', '\\', '\0']) {
        return Err("Title cannot contain path separators.".to_string());
    }

    if title.len() > TITLE_MAX_BYTES {
        return Err(format!("Title must be at most {} bytes long.", TITLE_MAX_BYTES));
    }

    Ok(())
}

/// Markdown entry directory
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the entries directory if it is missing
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn path_for(&self, title: &str) -> StorageResult<PathBuf> {
        validate_title(title).map_err(StorageError::InvalidTitle)?;
        Ok(self.dir.join(format!("{}{}", title, EXTENSION)))
    }

    /// Titles of all entries, sorted
    pub async fn list_entries(&self) -> StorageResult<Vec<String>> {
        let mut titles = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(titles),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(title) = name.strip_suffix(EXTENSION) {
                if validate_title(title).is_ok() {
                    titles.push(title.to_string());
                }
            }
        }

        titles.sort();
        Ok(titles)
    }

    /// Content of an entry, or `None` if there is no such entry
    pub async fn get_entry(&self, title: &str) -> StorageResult<Option<String>> {
        let Ok(path) = self.path_for(title) else {
            return Ok(None);
        };

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite an entry
    pub async fn save_entry(&self, title: &str, content: &str) -> StorageResult<()> {
        let path = self.path_for(title)?;
        fs::write(&path, content).await?;

        info!("Saved entry: {}", title);
        Ok(())
    }

    /// Stored title equal to `title` ignoring case
    pub async fn find_title(&self, title: &str) -> StorageResult<Option<String>> {
        Ok(self
            .list_entries()
            .await?
            .into_iter()
            .find(|entry| entry.to_lowercase() == title.to_lowercase()))
    }
}
