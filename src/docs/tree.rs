use std::collections::HashSet;

use super::index::{EntryKind, NodeIndex};
use super::model::{Node, NodeId, Tag};
use super::search::{self, FilterResult, Query};

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub id: NodeId,
    pub name: String,
    pub kind: EntryKind,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    pub has_children: bool,
    pub tags: Vec<Tag>,
    /// Set only while a filter is active and this row matched it.
    pub is_match: bool,
}

impl FlatItem {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// A query currently applied to the tree, with its result.
#[derive(Debug, Clone)]
pub struct ActiveFilter {
    pub query: Query,
    pub result: FilterResult,
}

/// Renderable state of the remote document tree.
///
/// Owns the node index for the current snapshot; rows are rebuilt from it in
/// server order whenever expansion, filter or snapshot change.
#[derive(Debug, Default)]
pub struct DocTree {
    pub index: NodeIndex,
    root_ids: Vec<NodeId>,
    expanded: HashSet<NodeId>,
    pub flat_items: Vec<FlatItem>,
    /// Cursor row in `flat_items`.
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Raw text of the search box.
    pub filter_input: String,
    filter: Option<ActiveFilter>,
}

impl DocTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot: rebuild the index, keep expansion for folders
    /// that still exist, re-run an active filter and re-flatten.
    pub fn load(&mut self, roots: &[Node]) {
        self.index.build(roots);
        self.root_ids = roots.iter().map(|n| n.id).collect();
        self.root_ids.dedup();

        let index = &self.index;
        self.expanded
            .retain(|id| index.get(*id).is_some_and(|e| e.is_folder()));

        if let Some(active) = &self.filter {
            let query = active.query.clone();
            let result = search::filter(&self.index, &query);
            self.filter = Some(ActiveFilter { query, result });
        }
        self.flatten();
    }

    /// Rebuild the flat rows, keeping the cursor on the same node if it is
    /// still visible.
    pub fn flatten(&mut self) {
        let previous = self.selected_id();
        self.flat_items.clear();

        let visible = |id: &NodeId| match &self.filter {
            Some(active) => active.result.is_visible(*id),
            None => true,
        };

        let roots: Vec<NodeId> = self.root_ids.iter().copied().filter(visible).collect();
        let mut stack: Vec<(NodeId, usize, bool)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, id)| (*id, 0, i == roots.len() - 1))
            .collect();

        while let Some((id, depth, is_last)) = stack.pop() {
            let Some(entry) = self.index.get(id) else {
                continue;
            };

            let children: Vec<NodeId> = entry.children.iter().copied().filter(visible).collect();
            let is_expanded = match &self.filter {
                Some(_) => !children.is_empty(),
                None => self.expanded.contains(&id),
            };

            self.flat_items.push(FlatItem {
                id,
                name: entry.name.clone(),
                kind: entry.kind.clone(),
                depth,
                is_expanded,
                is_last_sibling: is_last,
                has_children: !entry.children.is_empty(),
                tags: entry.tags.clone(),
                is_match: self
                    .filter
                    .as_ref()
                    .is_some_and(|f| f.result.is_match(id)),
            });

            if is_expanded {
                for (i, child) in children.iter().enumerate().rev() {
                    stack.push((*child, depth + 1, i == children.len() - 1));
                }
            }
        }

        if let Some(idx) = previous.and_then(|id| self.find_index_by_id(id)) {
            self.cursor = idx;
        }
        // Clamp cursor
        if !self.flat_items.is_empty() && self.cursor >= self.flat_items.len() {
            self.cursor = self.flat_items.len() - 1;
        }
    }

    pub fn selected_item(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.cursor)
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected_item().map(|item| item.id)
    }

    /// Find the row index of a node.
    pub fn find_index_by_id(&self, id: NodeId) -> Option<usize> {
        self.flat_items.iter().position(|item| item.id == id)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Expand the folder under the cursor.
    pub fn expand_selected(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        if !item.is_folder() || item.is_expanded {
            return;
        }
        self.expanded.insert(item.id);
        self.flatten();
    }

    /// Collapse the folder under the cursor, or jump to its parent.
    pub fn collapse_selected(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let id = item.id;

        if item.is_folder() && item.is_expanded {
            self.expanded.remove(&id);
            self.flatten();
            return;
        }

        let parent_row = self
            .index
            .get(id)
            .and_then(|e| e.parent_id)
            .and_then(|parent| self.find_index_by_id(parent));
        if let Some(row) = parent_row {
            self.cursor = row;
        }
    }

    /// Expand or collapse the folder under the cursor.
    pub fn toggle_selected(&mut self) {
        match self.selected_item() {
            Some(item) if item.is_folder() && item.is_expanded => self.collapse_selected(),
            Some(item) if item.is_folder() => self.expand_selected(),
            _ => {}
        }
    }

    /// Expand every ancestor of `id` and put the cursor on it.
    pub fn reveal(&mut self, id: NodeId) {
        self.expanded.extend(self.index.ancestors(id));
        self.flatten();
        if let Some(row) = self.find_index_by_id(id) {
            self.cursor = row;
        }
    }

    /// Update the scroll offset to ensure the cursor row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor - visible_height + 1;
        }
    }

    /// Apply `filter_input` as a query; blank input clears the filter.
    pub fn apply_filter(&mut self) {
        match Query::parse(&self.filter_input) {
            Some(query) => {
                let result = search::filter(&self.index, &query);
                self.filter = Some(ActiveFilter { query, result });
            }
            None => self.filter = None,
        }
        self.flatten();
    }

    /// Drop the filter and show the normal expansion state again.
    pub fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.filter = None;
        self.flatten();
    }

    pub fn active_filter(&self) -> Option<&ActiveFilter> {
        self.filter.as_ref()
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_some()
    }

    /// Hint to show when the active filter matched nothing.
    pub fn no_results_hint(&self) -> Option<String> {
        self.filter
            .as_ref()
            .filter(|f| f.result.is_empty())
            .map(|f| search::no_results_hint(&f.query))
    }

    /// Leave filter mode but keep matches reachable: their ancestors stay
    /// expanded in the normal view.
    pub fn keep_filter_expansion(&mut self) {
        if let Some(active) = self.filter.take() {
            self.expanded.extend(active.result.reveal.iter().copied());
        }
        self.filter_input.clear();
        self.flatten();
    }
}
