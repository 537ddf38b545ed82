use super::index::{IndexEntry, NodeIndex};
use super::model::NodeId;

/// What is currently selected, cached from the index at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
    pub id: NodeId,
    pub is_folder: bool,
    pub parent_id: Option<NodeId>,
}

impl SelectedNode {
    fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            id: entry.id,
            is_folder: entry.is_folder(),
            parent_id: entry.parent_id,
        }
    }
}

/// Single-node selection and the upload target folder it implies.
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<SelectedNode>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `entry`, or clear the selection if it is already selected.
    pub fn select(&mut self, entry: &IndexEntry) {
        if self.selected_id() == Some(entry.id) {
            self.clear();
        } else {
            self.selected = Some(SelectedNode::from_entry(entry));
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&SelectedNode> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected.as_ref().map(|s| s.id)
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected_id() == Some(id)
    }

    /// Folder new uploads and folders go into.
    ///
    /// A selected folder is its own target; a selected file targets its
    /// parent. `None` means the top level.
    pub fn upload_target(&self) -> Option<NodeId> {
        self.selected.as_ref().and_then(|s| {
            if s.is_folder {
                Some(s.id)
            } else {
                s.parent_id
            }
        })
    }

    /// Display path of the selection, from the current index snapshot.
    pub fn build_path(&self, index: &NodeIndex) -> Option<String> {
        self.selected_id().map(|id| index.build_path(id))
    }

    /// Display path of the upload target, `"/"` for the top level.
    pub fn upload_target_path(&self, index: &NodeIndex) -> String {
        match self.upload_target() {
            Some(id) if index.contains(id) => index.build_path(id),
            Some(id) => format!("#{}", id),
            None => "/".to_string(),
        }
    }

    /// Re-sync with a freshly built index: drop a selection that vanished,
    /// refresh cached fields of one that survived.
    pub fn revalidate(&mut self, index: &NodeIndex) {
        if let Some(id) = self.selected_id() {
            self.selected = index.get(id).map(SelectedNode::from_entry);
        }
    }
}
