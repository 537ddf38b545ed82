use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, warn};

use crate::api::client::ApiClient;
use crate::api::types::{CreateFolderRequest, CreateTagRequest};
use crate::config::AppConfig;
use crate::docs::index::IndexEntry;
use crate::docs::model::{ChildrenSummary, Node, NodeDetail, NodeId, Tag};
use crate::docs::selection::Selection;
use crate::docs::tree::DocTree;
use crate::error::{AppError, Result};
use crate::event::ActionOutcome;
use crate::ingest::assemble::assemble;
use crate::ingest::walker::IngestReport;
use crate::ingest::IngestedFile;
use crate::theme::{self, ThemeColors};
use crate::upload::{UploadOutcome, UploadRequest};

/// Colors handed out to new tags, in rotation.
pub const TAG_COLORS: &[&str] = &[
    "#89b4fa", "#a6e3a1", "#f9e2af", "#f38ba8", "#cba6f7", "#94e2d5", "#fab387",
];

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateFolder,
    Rename {
        id: NodeId,
        /// Known description, sent back unchanged with the new name.
        description: Option<String>,
    },
    DeleteConfirm {
        id: NodeId,
        name: String,
        is_folder: bool,
        /// Filled in once the server reports what lives below the folder.
        summary: Option<ChildrenSummary>,
    },
    CreateTag,
    UploadPath,
    UploadPreview,
    Error {
        message: String,
    },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Typing into the search box; every keystroke re-filters.
    Search,
    Dialog(DialogKind),
    Help,
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Files picked for upload plus the options chosen in the preview.
#[derive(Debug, Default)]
pub struct UploadSession {
    pub source: Option<PathBuf>,
    pub files: Vec<IngestedFile>,
    pub report: IngestReport,
    pub folder_mode: bool,
    pub description: String,
    pub tag_ids: Vec<i64>,
    pub scroll: usize,
    pub in_flight: bool,
}

impl UploadSession {
    /// Files as they will be laid out under the target.
    pub fn effective_files(&self) -> Cow<'_, [IngestedFile]> {
        if self.folder_mode {
            Cow::Borrowed(self.files.as_slice())
        } else {
            Cow::Owned(self.files.iter().map(IngestedFile::flattened).collect())
        }
    }

    /// Number of rows the preview tree shows.
    pub fn row_count(&self) -> usize {
        assemble(&self.effective_files()).root.preview_rows().len()
    }

    pub fn scroll_down(&mut self) {
        if self.scroll + 1 < self.row_count() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn toggle_tag(&mut self, tag_id: i64) {
        if let Some(pos) = self.tag_ids.iter().position(|id| *id == tag_id) {
            self.tag_ids.remove(pos);
        } else {
            self.tag_ids.push(tag_id);
        }
    }
}

/// A rename ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub id: NodeId,
    pub name: String,
    pub description: Option<String>,
    pub tag_ids: Vec<i64>,
}

/// Session state: the document tree, selection, upload buffer and UI mode.
pub struct App {
    pub client: ApiClient,
    pub tree: DocTree,
    pub selection: Selection,
    pub upload: UploadSession,
    pub tags: Vec<Tag>,
    /// Detail of the selected node, once fetched.
    pub detail: Option<NodeDetail>,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, StatusLevel, Instant)>,
    pub should_quit: bool,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub show_tags: bool,
    pub loading: bool,
    pub batch_size: usize,
    pub max_depth: usize,
    default_description: String,
    latest_ticket: u64,
    ingest_ticket: u64,
    pending_reveal: Option<NodeId>,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = ApiClient::new(config.base_url(), config.timeout())?;
        Ok(Self {
            client,
            tree: DocTree::new(),
            selection: Selection::new(),
            upload: UploadSession::default(),
            tags: Vec::new(),
            detail: None,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            should_quit: false,
            theme: theme::resolve_theme(&config.theme),
            use_icons: config.use_icons(),
            show_tags: config.show_tags(),
            loading: false,
            batch_size: config.batch_size(),
            max_depth: config.max_depth(),
            default_description: config.upload_description().to_string(),
            latest_ticket: 0,
            ingest_ticket: 0,
            pending_reveal: None,
        })
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Status ───────────────────────────────────────────────────────────────

    pub fn set_status(&mut self, msg: impl Into<String>, level: StatusLevel) {
        self.status_message = Some((msg.into(), level, Instant::now()));
    }

    pub fn set_error(&mut self, err: &AppError) {
        warn!(error = %err, "action failed");
        self.set_status(err.to_string(), StatusLevel::Error);
    }

    /// Drop the status message after it has been shown for a few seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, level, created)) = &self.status_message {
            let ttl = if *level == StatusLevel::Error { 6 } else { 3 };
            if created.elapsed().as_secs() > ttl {
                self.status_message = None;
            }
        }
    }

    // ── Tree reload ──────────────────────────────────────────────────────────

    /// Issue a new reload ticket. Responses carrying older tickets are
    /// ignored.
    pub fn begin_reload(&mut self) -> u64 {
        self.latest_ticket += 1;
        self.loading = true;
        self.latest_ticket
    }

    /// Apply a tree response. Returns `false` if it was stale.
    ///
    /// A failed reload keeps the current index.
    pub fn apply_tree(&mut self, ticket: u64, result: Result<Vec<Node>>) -> bool {
        if ticket != self.latest_ticket {
            debug!(ticket, latest = self.latest_ticket, "dropping stale tree response");
            return false;
        }
        self.loading = false;

        match result {
            Ok(nodes) => {
                self.tree.load(&nodes);
                self.selection.revalidate(&self.tree.index);
                if self.selection.selected_id() != self.detail.as_ref().map(|d| d.node.id) {
                    self.detail = None;
                }
                if let Some(id) = self.pending_reveal.take() {
                    if self.tree.index.contains(id) {
                        self.tree.reveal(id);
                    }
                }
                debug!(
                    nodes = self.tree.index.len(),
                    generation = self.tree.index.generation(),
                    "tree loaded"
                );
            }
            Err(e) => {
                self.pending_reveal = None;
                self.set_error(&e);
            }
        }
        true
    }

    pub fn apply_detail(&mut self, id: NodeId, result: Result<NodeDetail>) {
        if self.selection.selected_id() != Some(id) {
            return;
        }
        match result {
            Ok(detail) => self.detail = Some(detail),
            Err(e) => self.set_error(&e),
        }
    }

    pub fn apply_children_summary(&mut self, id: NodeId, result: Result<ChildrenSummary>) {
        match result {
            Ok(loaded) => {
                if let AppMode::Dialog(DialogKind::DeleteConfirm {
                    id: target,
                    summary,
                    ..
                }) = &mut self.mode
                {
                    if *target == id {
                        *summary = Some(loaded);
                    }
                }
            }
            Err(e) => self.set_error(&e),
        }
    }

    pub fn apply_tags(&mut self, result: Result<Vec<Tag>>) {
        match result {
            Ok(tags) => {
                let known: Vec<i64> = tags.iter().map(|t| t.id).collect();
                self.upload.tag_ids.retain(|id| known.contains(id));
                self.tags = tags;
            }
            Err(e) => self.set_error(&e),
        }
    }

    pub fn apply_tag_created(&mut self, result: Result<Tag>) {
        match result {
            Ok(tag) => {
                self.set_status(format!("Created tag \"{}\"", tag.name), StatusLevel::Success);
                if !self.tags.iter().any(|t| t.id == tag.id) {
                    self.tags.push(tag);
                }
            }
            Err(e) => self.set_error(&e),
        }
    }

    /// Apply the result of a create/rename/delete. Returns whether the tree
    /// should be reloaded.
    pub fn apply_action(&mut self, result: Result<ActionOutcome>) -> bool {
        match result {
            Ok(outcome) => {
                self.set_status(outcome.message, StatusLevel::Success);
                self.pending_reveal = outcome.reveal;
                true
            }
            Err(e) => {
                self.set_error(&e);
                false
            }
        }
    }

    // ── Navigation & selection ──────────────────────────────────────────────

    pub fn select_next(&mut self) {
        let len = self.tree.flat_items.len();
        if len > 0 && self.tree.cursor < len - 1 {
            self.tree.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.tree.cursor = self.tree.cursor.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.tree.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.tree.cursor = self.tree.flat_items.len().saturating_sub(1);
    }

    /// Toggle selection of the row under the cursor. Returns the id whose
    /// detail should be fetched, if a node became selected.
    pub fn toggle_select_cursor(&mut self) -> Option<NodeId> {
        let id = self.tree.selected_id()?;
        let entry = self.tree.index.get(id)?;
        self.selection.select(entry);
        self.detail = None;
        self.selection.selected_id()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.detail = None;
    }

    /// Node an action applies to: the selection, else the cursor row.
    pub fn subject(&self) -> Option<&IndexEntry> {
        self.selection
            .selected_id()
            .or_else(|| self.tree.selected_id())
            .and_then(|id| self.tree.index.get(id))
    }

    /// Display path of the upload / new-folder target.
    pub fn target_path(&self) -> String {
        self.selection.upload_target_path(&self.tree.index)
    }

    // ── Search ───────────────────────────────────────────────────────────────

    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
    }

    pub fn search_input_char(&mut self, c: char) {
        self.tree.filter_input.push(c);
        self.tree.apply_filter();
    }

    pub fn search_backspace(&mut self) {
        self.tree.filter_input.pop();
        self.tree.apply_filter();
    }

    /// Leave the search box, keeping the filtered view for navigation.
    pub fn confirm_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn cancel_search(&mut self) {
        self.tree.clear_filter();
        self.mode = AppMode::Normal;
    }

    /// Drop the filter but keep matched nodes expanded in the full tree.
    pub fn leave_filter(&mut self) {
        self.tree.keep_filter_expansion();
    }

    // ── Dialogs ──────────────────────────────────────────────────────────────

    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        match &kind {
            DialogKind::Rename { id, .. } => {
                if let Some(entry) = self.tree.index.get(*id) {
                    self.dialog_state.input = entry.name.clone();
                    self.dialog_state.cursor_position = entry.name.len();
                }
            }
            DialogKind::UploadPath => {
                if let Some(source) = &self.upload.source {
                    let text = source.display().to_string();
                    self.dialog_state.cursor_position = text.len();
                    self.dialog_state.input = text;
                }
            }
            _ => {}
        }
        self.mode = AppMode::Dialog(kind);
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    pub fn show_error(&mut self, err: &AppError) {
        warn!(error = %err, "showing error dialog");
        self.open_dialog(DialogKind::Error {
            message: err.to_string(),
        });
    }

    /// Open the rename dialog for the current subject.
    pub fn open_rename(&mut self) {
        let Some(id) = self.subject().map(|e| e.id) else {
            self.set_status("Nothing to rename", StatusLevel::Info);
            return;
        };
        let description = self
            .detail
            .as_ref()
            .filter(|d| d.node.id == id)
            .map(|d| d.description.clone().unwrap_or_default());
        self.open_dialog(DialogKind::Rename { id, description });
    }

    /// Open the delete confirmation for the current subject. Returns the id
    /// of a folder whose children summary should be fetched.
    pub fn open_delete(&mut self) -> Option<NodeId> {
        let Some(entry) = self.subject() else {
            self.set_status("Nothing to delete", StatusLevel::Info);
            return None;
        };
        let (id, name, is_folder) = (entry.id, entry.name.clone(), entry.is_folder());
        self.open_dialog(DialogKind::DeleteConfirm {
            id,
            name,
            is_folder,
            summary: None,
        });
        is_folder.then_some(id)
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Request builders (validated before any request is sent) ─────────────

    fn dialog_name(&self, what: &str) -> Result<String> {
        let name = self.dialog_state.input.trim();
        if name.is_empty() {
            return Err(AppError::Validation(format!("{} name cannot be empty", what)));
        }
        if name.contains('/') {
            return Err(AppError::Validation(format!(
                "{} name cannot contain '/'",
                what
            )));
        }
        Ok(name.to_string())
    }

    pub fn create_folder_request(&self) -> Result<CreateFolderRequest> {
        Ok(CreateFolderRequest {
            name: self.dialog_name("Folder")?,
            description: String::new(),
            parent_id: self.selection.upload_target(),
            tag_ids: None,
        })
    }

    pub fn rename_plan(&self) -> Result<RenamePlan> {
        let AppMode::Dialog(DialogKind::Rename { id, description }) = &self.mode else {
            return Err(AppError::Validation("No rename in progress".into()));
        };
        let entry = self
            .tree
            .index
            .get(*id)
            .ok_or_else(|| AppError::Validation("The node no longer exists".into()))?;
        Ok(RenamePlan {
            id: *id,
            name: self.dialog_name(if entry.is_folder() { "Folder" } else { "File" })?,
            description: description.clone(),
            tag_ids: entry.tags.iter().map(|t| t.id).collect(),
        })
    }

    pub fn create_tag_request(&self) -> Result<CreateTagRequest> {
        let name = self.dialog_name("Tag")?;
        if self
            .tags
            .iter()
            .any(|t| t.name.to_lowercase() == name.to_lowercase())
        {
            return Err(AppError::Validation(format!("Tag \"{}\" already exists", name)));
        }
        let color = TAG_COLORS[self.tags.len() % TAG_COLORS.len()];
        Ok(CreateTagRequest {
            name,
            color: color.to_string(),
        })
    }

    // ── Upload flow ──────────────────────────────────────────────────────────

    /// Resolve the typed upload path, expanding a leading `~`.
    pub fn upload_path(&self) -> Result<PathBuf> {
        let raw = self.dialog_state.input.trim();
        if raw.is_empty() {
            return Err(AppError::Validation("Enter a file or folder path".into()));
        }
        let path = match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(raw)),
            None => PathBuf::from(raw),
        };
        Ok(path)
    }

    /// Reset the upload session for a new scan and return its ticket.
    pub fn begin_ingest(&mut self, path: PathBuf) -> u64 {
        self.ingest_ticket += 1;
        self.upload = UploadSession {
            source: Some(path),
            description: self.default_description.clone(),
            ..Default::default()
        };
        self.close_dialog();
        self.set_status("Scanning…", StatusLevel::Info);
        self.ingest_ticket
    }

    /// Apply a scan result. Returns `false` if it was dropped.
    ///
    /// Results from superseded scans are ignored. A scan that finishes while
    /// another dialog is open is discarded so that dialog stays put; the
    /// path is kept for the next upload prompt.
    pub fn apply_ingested(
        &mut self,
        ticket: u64,
        result: Result<(Vec<IngestedFile>, IngestReport)>,
    ) -> bool {
        if ticket != self.ingest_ticket {
            debug!(ticket, latest = self.ingest_ticket, "dropping stale scan result");
            return false;
        }
        if matches!(self.mode, AppMode::Dialog(_)) {
            debug!(ticket, "scan finished behind an open dialog");
            self.set_status(
                "Scan finished while a dialog was open; press u to scan again",
                StatusLevel::Info,
            );
            return false;
        }

        match result {
            Ok((files, report)) if files.is_empty() => {
                let mut msg = "No files found to upload".to_string();
                if !report.skipped.is_empty() {
                    msg.push_str(&format!(" ({} entries unreadable)", report.skipped.len()));
                }
                self.status_message = None;
                self.show_error(&AppError::Validation(msg));
            }
            Ok((files, report)) => {
                self.upload.folder_mode = files.iter().any(|f| !f.is_flat());
                self.upload.files = files;
                self.upload.report = report;
                self.upload.scroll = 0;
                self.status_message = None;
                self.open_dialog(DialogKind::UploadPreview);
            }
            Err(e) => {
                self.status_message = None;
                self.show_error(&e);
            }
        }
        true
    }

    pub fn toggle_folder_mode(&mut self) {
        self.upload.folder_mode = !self.upload.folder_mode;
        self.upload.scroll = 0;
    }

    /// Toggle the n-th known tag (0-based) on the pending upload.
    pub fn toggle_upload_tag(&mut self, n: usize) {
        if let Some(tag) = self.tags.get(n) {
            let id = tag.id;
            self.upload.toggle_tag(id);
        }
    }

    pub fn upload_request(&self) -> Result<UploadRequest> {
        let request = UploadRequest {
            files: self.upload.files.clone(),
            target_folder_id: self.selection.upload_target(),
            description: self.upload.description.clone(),
            tag_ids: self.upload.tag_ids.clone(),
            folder_mode: self.upload.folder_mode,
        };
        request.plan()?;
        Ok(request)
    }

    /// Returns whether the tree should be reloaded.
    pub fn apply_upload(&mut self, result: Result<UploadOutcome>) -> bool {
        self.upload.in_flight = false;
        match result {
            Ok(outcome) => {
                self.upload = UploadSession::default();
                self.close_dialog();
                let mut msg = format!("Uploaded {} file(s)", outcome.total_files);
                if outcome.created_folders > 0 {
                    msg.push_str(&format!(", created {} folder(s)", outcome.created_folders));
                }
                self.set_status(msg, StatusLevel::Success);
                true
            }
            Err(e) => {
                self.upload = UploadSession::default();
                self.show_error(&e);
                false
            }
        }
    }
}
