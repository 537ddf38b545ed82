use std::path::Path;

use tracing::{debug, info, warn};

use super::source::{DirectoryEntry, Entry, EntryReader, FileEntry, LocalDirectory, LocalFile};
use super::IngestedFile;
use crate::error::{AppError, Result};

/// Default maximum directory nesting followed during ingestion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Summary of one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Files appended to the output list.
    pub files: usize,
    /// Directories fully or partially listed.
    pub directories: usize,
    /// One line per entry that could not be read.
    pub skipped: Vec<String>,
}

impl IngestReport {
    fn skip(&mut self, path: &str, reason: impl std::fmt::Display) {
        warn!(path, reason = %reason, "skipping entry during ingestion");
        self.skipped.push(format!("{}: {}", path, reason));
    }
}

enum FrameState {
    Pending(Box<dyn DirectoryEntry>),
    Open(Box<dyn EntryReader>),
}

struct Frame {
    state: FrameState,
    base: String,
    depth: usize,
}

/// Join a relative base and an entry name with `/`.
pub fn join_relative(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Walks a directory-entry tree into a flat list of files with relative paths.
#[derive(Debug, Clone)]
pub struct DirectoryIngestor {
    max_depth: usize,
}

impl Default for DirectoryIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl DirectoryIngestor {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Append every file below `root` to `out`, with paths relative to
    /// `base_path`.
    ///
    /// Depth-first with an explicit stack. A directory stays on the stack
    /// until its reader returns an empty batch, however many batches that
    /// takes. Unreadable entries and directories nested deeper than
    /// `max_depth` are skipped and reported; everything else is visited
    /// before this returns.
    pub async fn ingest(
        &self,
        root: &dyn DirectoryEntry,
        base_path: &str,
        out: &mut Vec<IngestedFile>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        let mut stack = match root.open().await {
            Ok(reader) => {
                report.directories += 1;
                vec![Frame {
                    state: FrameState::Open(reader),
                    base: base_path.to_string(),
                    depth: 0,
                }]
            }
            Err(e) => {
                let shown = if base_path.is_empty() { root.name() } else { base_path };
                report.skip(shown, e);
                return report;
            }
        };

        while let Some(frame) = stack.last_mut() {
            let reader = match &mut frame.state {
                FrameState::Open(reader) => reader,
                FrameState::Pending(dir) => match dir.open().await {
                    Ok(reader) => {
                        report.directories += 1;
                        frame.state = FrameState::Open(reader);
                        continue;
                    }
                    Err(e) => {
                        let base = frame.base.clone();
                        stack.pop();
                        report.skip(&base, e);
                        continue;
                    }
                },
            };

            let batch = match reader.next_batch().await {
                Ok(batch) => batch,
                Err(e) => {
                    // The reader is no longer trustworthy; keep what it gave so far.
                    let base = frame.base.clone();
                    stack.pop();
                    report.skip(&base, e);
                    continue;
                }
            };
            if batch.is_empty() {
                stack.pop();
                continue;
            }

            let base = frame.base.clone();
            let depth = frame.depth;
            let mut subdirs = Vec::new();

            for entry in batch {
                match entry {
                    Entry::File(file) => {
                        let relative_path = join_relative(&base, file.name());
                        match file.resolve().await {
                            Ok(handle) => {
                                out.push(IngestedFile {
                                    file: handle,
                                    relative_path,
                                });
                                report.files += 1;
                            }
                            Err(e) => report.skip(&relative_path, e),
                        }
                    }
                    Entry::Directory(dir) => {
                        let relative_path = join_relative(&base, dir.name());
                        if depth + 1 > self.max_depth {
                            report.skip(
                                &relative_path,
                                format!("nested deeper than {} levels", self.max_depth),
                            );
                            continue;
                        }
                        subdirs.push(Frame {
                            state: FrameState::Pending(dir),
                            base: relative_path,
                            depth: depth + 1,
                        });
                    }
                }
            }

            // Reversed so the first listed subdirectory is visited first.
            stack.extend(subdirs.into_iter().rev());
        }

        debug!(
            files = report.files,
            directories = report.directories,
            skipped = report.skipped.len(),
            "directory ingestion finished"
        );
        report
    }
}

/// Ingest a local path picked by the user.
///
/// A directory keeps its own name as the first path segment so the server
/// recreates it as a folder; a single file becomes a flat entry named after
/// itself.
pub async fn ingest_path(
    path: &Path,
    batch_size: usize,
    max_depth: usize,
) -> Result<(Vec<IngestedFile>, IngestReport)> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;

    let mut files = Vec::new();
    if meta.is_dir() {
        let root = LocalDirectory::new(path, batch_size);
        let base = root.name().to_string();
        let report = DirectoryIngestor::new(max_depth)
            .ingest(&root, &base, &mut files)
            .await;
        info!(
            path = %path.display(),
            files = report.files,
            skipped = report.skipped.len(),
            "ingested directory"
        );
        Ok((files, report))
    } else if meta.is_file() {
        let local = LocalFile::new(path);
        let handle = local.resolve().await?;
        files.push(IngestedFile {
            relative_path: handle.name.clone(),
            file: handle,
        });
        let report = IngestReport {
            files: 1,
            ..Default::default()
        };
        Ok((files, report))
    } else {
        Err(AppError::InvalidPath(format!(
            "{} is neither a file nor a directory",
            path.display()
        )))
    }
}
