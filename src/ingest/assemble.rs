//! Regroups a flat list of ingested files into a folder tree for preview.
//!
//! The structure only lives for one upload dialog; ordering is applied when
//! rows are produced, not while assembling.

use std::cmp::Ordering;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;

use super::IngestedFile;

/// A node of the preview tree.
#[derive(Debug)]
pub enum PreviewEntry<'a> {
    Folder(FolderTree<'a>),
    File { size: u64, file: &'a IngestedFile },
}

impl PreviewEntry<'_> {
    pub fn is_folder(&self) -> bool {
        matches!(self, PreviewEntry::Folder(_))
    }
}

/// Children of one preview folder, keyed by path segment.
#[derive(Debug, Default)]
pub struct FolderTree<'a> {
    pub entries: HashMap<String, PreviewEntry<'a>>,
}

/// One rendered line of the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub depth: usize,
    pub name: String,
    pub is_folder: bool,
    pub is_last_sibling: bool,
    /// File size; `None` for folders.
    pub size: Option<u64>,
}

/// Folders before files, then case-insensitive by name.
pub fn compare_entries(a: (&str, &PreviewEntry), b: (&str, &PreviewEntry)) -> Ordering {
    b.1.is_folder()
        .cmp(&a.1.is_folder())
        .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
        .then_with(|| a.0.cmp(b.0))
}

impl<'a> FolderTree<'a> {
    /// Entries in display order.
    pub fn sorted_entries(&self) -> Vec<(&str, &PreviewEntry<'a>)> {
        let mut entries: Vec<(&str, &PreviewEntry<'a>)> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        entries.sort_by(|a, b| compare_entries(*a, *b));
        entries
    }

    /// Flatten the whole tree into display rows.
    pub fn preview_rows(&self) -> Vec<PreviewRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(&str, &PreviewEntry<'a>, usize, bool)> = Vec::new();
        push_children(&mut stack, self, 0);

        while let Some((name, entry, depth, is_last)) = stack.pop() {
            match entry {
                PreviewEntry::Folder(children) => {
                    rows.push(PreviewRow {
                        depth,
                        name: name.to_string(),
                        is_folder: true,
                        is_last_sibling: is_last,
                        size: None,
                    });
                    push_children(&mut stack, children, depth + 1);
                }
                PreviewEntry::File { size, .. } => rows.push(PreviewRow {
                    depth,
                    name: name.to_string(),
                    is_folder: false,
                    is_last_sibling: is_last,
                    size: Some(*size),
                }),
            }
        }
        rows
    }

    /// (files, folders, total bytes) below this folder.
    pub fn totals(&self) -> (usize, usize, u64) {
        let mut files = 0;
        let mut folders = 0;
        let mut bytes = 0;
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            for entry in tree.entries.values() {
                match entry {
                    PreviewEntry::Folder(children) => {
                        folders += 1;
                        stack.push(children);
                    }
                    PreviewEntry::File { size, .. } => {
                        files += 1;
                        bytes += size;
                    }
                }
            }
        }
        (files, folders, bytes)
    }
}

fn push_children<'t, 'a>(
    stack: &mut Vec<(&'t str, &'t PreviewEntry<'a>, usize, bool)>,
    tree: &'t FolderTree<'a>,
    depth: usize,
) {
    let sorted = tree.sorted_entries();
    let last = sorted.len().saturating_sub(1);
    for (i, (name, entry)) in sorted.into_iter().enumerate().rev() {
        stack.push((name, entry, depth, i == last));
    }
}

/// Result of [`assemble`].
#[derive(Debug, Default)]
pub struct FolderPreview<'a> {
    pub root: FolderTree<'a>,
    /// Relative paths that could not be placed (empty, duplicate, or
    /// clashing with an entry of the other kind).
    pub conflicts: Vec<String>,
}

impl<'a> FolderPreview<'a> {
    pub fn file_count(&self) -> usize {
        self.root.totals().0
    }

    pub fn folder_count(&self) -> usize {
        self.root.totals().1
    }

    pub fn total_size(&self) -> u64 {
        self.root.totals().2
    }
}

/// Build the preview tree from relative paths. Pure, no I/O.
pub fn assemble(files: &[IngestedFile]) -> FolderPreview<'_> {
    let mut preview = FolderPreview::default();

    'files: for file in files {
        let segments: Vec<&str> = file
            .relative_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((leaf, folders)) = segments.split_last() else {
            preview.conflicts.push(file.relative_path.clone());
            continue;
        };

        let mut cursor = &mut preview.root;
        for segment in folders {
            let entry = cursor
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| PreviewEntry::Folder(FolderTree::default()));
            match entry {
                PreviewEntry::Folder(children) => cursor = children,
                PreviewEntry::File { .. } => {
                    preview.conflicts.push(file.relative_path.clone());
                    continue 'files;
                }
            }
        }

        match cursor.entries.entry(leaf.to_string()) {
            MapEntry::Vacant(slot) => {
                slot.insert(PreviewEntry::File {
                    size: file.file.size,
                    file,
                });
            }
            MapEntry::Occupied(_) => preview.conflicts.push(file.relative_path.clone()),
        }
    }

    preview
}
