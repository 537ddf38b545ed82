pub mod assemble;
pub mod source;
pub mod walker;

use source::FileHandle;

/// A local file queued for upload, with its `/`-separated path relative to
/// the picked root. The last segment is the file's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub file: FileHandle,
    pub relative_path: String,
}

impl IngestedFile {
    /// Whether the file was picked on its own rather than from a directory.
    pub fn is_flat(&self) -> bool {
        !self.relative_path.contains('/')
    }

    /// Path the server files this under: the relative path when keeping
    /// structure, otherwise just the file name.
    pub fn upload_path(&self, folder_mode: bool) -> &str {
        if folder_mode {
            &self.relative_path
        } else {
            &self.file.name
        }
    }

    /// The same file placed at the top level.
    pub fn flattened(&self) -> Self {
        Self {
            file: self.file.clone(),
            relative_path: self.file.name.clone(),
        }
    }
}
