//! Directory-entry producers consumed by the ingestor.
//!
//! A directory is opened into an [`EntryReader`] that hands out entries in
//! batches until it returns an empty one. Implementations decide the batch
//! size; callers must keep asking until the reader is exhausted.

use std::fs::FileType;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Default number of entries a local reader returns per batch.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Where the bytes of an ingested file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A resolved file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    pub source: FileSource,
}

impl FileHandle {
    pub fn in_memory(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Load the file contents.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

/// One item yielded by an [`EntryReader`].
pub enum Entry {
    File(Box<dyn FileEntry>),
    Directory(Box<dyn DirectoryEntry>),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
        }
    }
}

#[async_trait]
pub trait FileEntry: Send + Sync {
    fn name(&self) -> &str;

    /// Turn the entry into a concrete handle.
    async fn resolve(&self) -> Result<FileHandle>;
}

#[async_trait]
pub trait DirectoryEntry: Send + Sync {
    fn name(&self) -> &str;

    /// Start listing this directory.
    async fn open(&self) -> Result<Box<dyn EntryReader>>;
}

#[async_trait]
pub trait EntryReader: Send {
    /// Next batch of entries; an empty batch means the listing is exhausted.
    async fn next_batch(&mut self) -> Result<Vec<Entry>>;
}

// ── Local filesystem ─────────────────────────────────────────────────────────

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    batch_size: usize,
}

impl LocalDirectory {
    pub fn new(path: &Path, batch_size: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            name: file_name_of(path),
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl DirectoryEntry for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<Box<dyn EntryReader>> {
        let read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| AppError::Traversal {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Box::new(LocalReader {
            read_dir,
            path: self.path.clone(),
            batch_size: self.batch_size,
        }))
    }
}

struct LocalReader {
    read_dir: tokio::fs::ReadDir,
    path: PathBuf,
    batch_size: usize,
}

impl LocalReader {
    /// Turn one listed path into an entry, or `None` if it is skipped.
    async fn classify(
        path: PathBuf,
        file_type: std::io::Result<FileType>,
        batch_size: usize,
    ) -> Option<Entry> {
        let file_type = match file_type {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping entry with unknown type");
                return None;
            }
        };

        if file_type.is_dir() {
            Some(Entry::Directory(Box::new(LocalDirectory::new(&path, batch_size))))
        } else if file_type.is_file() {
            Some(Entry::File(Box::new(LocalFile::new(&path))))
        } else if file_type.is_symlink() {
            // Follow links to files; linked directories may loop back.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => Some(Entry::File(Box::new(LocalFile::new(&path)))),
                Ok(_) => {
                    debug!(path = %path.display(), "skipping symlinked directory");
                    None
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping broken symlink");
                    None
                }
            }
        } else {
            None
        }
    }

    /// A listing error ends the batch early; entries already read survive it.
    fn cut_short(&self, batch: Vec<Entry>, error: std::io::Error) -> Result<Vec<Entry>> {
        if batch.is_empty() {
            return Err(AppError::Traversal {
                path: self.path.display().to_string(),
                message: error.to_string(),
            });
        }
        warn!(
            path = %self.path.display(),
            error = %error,
            kept = batch.len(),
            "directory listing failed mid-batch"
        );
        Ok(batch)
    }
}

#[async_trait]
impl EntryReader for LocalReader {
    async fn next_batch(&mut self) -> Result<Vec<Entry>> {
        let mut batch = Vec::new();
        while batch.len() < self.batch_size {
            let entry = match self.read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return self.cut_short(batch, e),
            };
            let file_type = entry.file_type().await;
            if let Some(entry) = Self::classify(entry.path(), file_type, self.batch_size).await {
                batch.push(entry);
            }
        }
        Ok(batch)
    }
}

/// A regular file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            name: file_name_of(path),
        }
    }
}

#[async_trait]
impl FileEntry for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self) -> Result<FileHandle> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| AppError::Traversal {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(FileHandle {
            name: self.name.clone(),
            size: meta.len(),
            source: FileSource::Path(self.path.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_reader_respects_batch_size() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{}.txt", i)), "x").unwrap();
        }
        let local = LocalDirectory::new(dir.path(), 2);
        let mut reader = local.open().await.unwrap();

        let mut sizes = Vec::new();
        loop {
            let batch = reader.next_batch().await.unwrap();
            if batch.is_empty() {
                break;
            }
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn local_reader_classifies_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let mut reader = LocalDirectory::new(dir.path(), 10).open().await.unwrap();
        let batch = reader.next_batch().await.unwrap();
        let mut kinds: Vec<(String, bool)> = batch
            .iter()
            .map(|e| (e.name().to_string(), matches!(e, Entry::Directory(_))))
            .collect();
        kinds.sort();
        assert_eq!(
            kinds,
            vec![("a.txt".to_string(), false), ("sub".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn entry_with_unreadable_type_is_skipped() {
        let dir = TempDir::new().unwrap();
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let entry = LocalReader::classify(dir.path().join("locked"), Err(err), 4).await;
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn listing_error_keeps_entries_already_read() {
        let dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let reader = LocalReader {
            read_dir: tokio::fs::read_dir(dir.path()).await.unwrap(),
            path: dir.path().to_path_buf(),
            batch_size: 10,
        };

        let mut batch = Vec::new();
        for name in ["a.txt", "b.txt", "c.txt"] {
            let path = dir.path().join(name);
            let file_type = fs::metadata(&path).map(|m| m.file_type());
            batch.extend(LocalReader::classify(path, file_type, 10).await);
        }
        let io_error = || std::io::Error::new(std::io::ErrorKind::Other, "device gone");

        let kept = reader.cut_short(batch, io_error()).unwrap();
        let mut names: Vec<&str> = kept.iter().map(Entry::name).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

        let err = reader.cut_short(Vec::new(), io_error()).err().unwrap();
        assert!(matches!(err, AppError::Traversal { .. }));
    }

    #[tokio::test]
    async fn open_missing_directory_is_traversal_error() {
        let dir = TempDir::new().unwrap();
        let missing = LocalDirectory::new(&dir.path().join("nope"), 10);
        let err = missing.open().await.err().unwrap();
        assert!(matches!(err, AppError::Traversal { .. }));
    }

    #[tokio::test]
    async fn local_file_resolves_size_and_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "# title").unwrap();

        let handle = LocalFile::new(&path).resolve().await.unwrap();
        assert_eq!(handle.name, "doc.md");
        assert_eq!(handle.size, 7);
        assert_eq!(handle.read().await.unwrap(), b"# title".to_vec());
    }

    #[tokio::test]
    async fn in_memory_handle_reads_bytes() {
        let handle = FileHandle::in_memory("a.bin", vec![1, 2, 3]);
        assert_eq!(handle.size, 3);
        assert_eq!(handle.read().await.unwrap(), vec![1, 2, 3]);
    }
}
