//! Flat id → node lookup, rebuilt wholesale from every tree snapshot.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::model::{Node, NodeId, NodeKind, Tag};

/// Separator used when rendering an ancestor path as a single string.
pub const PATH_SEPARATOR: &str = " / ";

/// Kind of an indexed node, without the nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File {
        file_size: Option<u64>,
        file_type: Option<String>,
    },
}

/// A single node's own fields, as registered in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub tags: Vec<Tag>,
    pub kind: EntryKind,
    /// Child ids in server order.
    pub children: Vec<NodeId>,
    /// Nesting depth in the snapshot (top level is 0).
    pub depth: usize,
}

impl IndexEntry {
    fn from_node(node: &Node, structural_parent: Option<NodeId>, depth: usize) -> Self {
        let kind = match &node.kind {
            NodeKind::Folder { .. } => EntryKind::Folder,
            NodeKind::File {
                file_size,
                file_type,
            } => EntryKind::File {
                file_size: *file_size,
                file_type: file_type.clone(),
            },
        };
        Self {
            id: node.id,
            name: node.name.clone(),
            parent_id: node.parent_id.or(structural_parent),
            tags: node.tags.clone(),
            kind,
            children: node.children().iter().map(|c| c.id).collect(),
            depth,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Lookup table from node id to its record.
///
/// Never patched incrementally: [`NodeIndex::build`] discards everything and
/// walks the new snapshot. The generation counter lets callers notice that a
/// rebuild happened between two reads.
#[derive(Debug, Default)]
pub struct NodeIndex {
    entries: HashMap<NodeId, IndexEntry>,
    /// Ids in depth-first pre-order (server tree order).
    order: Vec<NodeId>,
    generation: u64,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and repopulate the index from a snapshot of top-level nodes.
    ///
    /// Every node at every depth is registered. A repeated id overwrites the
    /// earlier registration (last write wins).
    pub fn build(&mut self, roots: &[Node]) {
        self.entries.clear();
        self.order.clear();
        self.generation += 1;

        let mut stack: Vec<(&Node, Option<NodeId>, usize)> =
            roots.iter().rev().map(|n| (n, None, 0)).collect();

        while let Some((node, parent, depth)) = stack.pop() {
            let entry = IndexEntry::from_node(node, parent, depth);
            if self.entries.insert(node.id, entry).is_some() {
                debug!(id = node.id, "duplicate node id, keeping the later record");
                self.order.retain(|id| *id != node.id);
            }
            self.order.push(node.id);

            for child in node.children().iter().rev() {
                stack.push((child, Some(node.id), depth + 1));
            }
        }

        debug!(
            nodes = self.entries.len(),
            generation = self.generation,
            "node index rebuilt"
        );
    }

    /// Number of completed builds since creation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: NodeId) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in server tree order.
    pub fn iter_in_tree_order(&self) -> impl Iterator<Item = &IndexEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Ancestor ids of `id`, nearest first.
    ///
    /// Stops at the first parent id that is not in the index, so the result
    /// may be a truncated chain.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.entries.get(&id).and_then(|e| e.parent_id);
        while let Some(parent_id) = current {
            if chain.len() >= self.entries.len() {
                warn!(id, "ancestor chain longer than the index, stopping");
                break;
            }
            match self.entries.get(&parent_id) {
                Some(parent) => {
                    chain.push(parent_id);
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        chain
    }

    /// Names from the top-level ancestor down to `id` itself.
    ///
    /// Returns whatever prefix is resolvable; an unknown `id` gives an empty path.
    pub fn resolve_path(&self, id: NodeId) -> Vec<String> {
        let Some(entry) = self.entries.get(&id) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .ancestors(id)
            .iter()
            .filter_map(|a| self.entries.get(a))
            .map(|e| e.name.clone())
            .collect();
        names.reverse();
        names.push(entry.name.clone());
        names
    }

    /// [`NodeIndex::resolve_path`] joined with [`PATH_SEPARATOR`].
    pub fn build_path(&self, id: NodeId) -> String {
        self.resolve_path(id).join(PATH_SEPARATOR)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            color: None,
        }
    }

    pub(crate) fn file(id: NodeId, name: &str, parent_id: Option<NodeId>, tags: Vec<Tag>) -> Node {
        Node {
            id,
            name: name.to_string(),
            parent_id,
            tags,
            kind: NodeKind::File {
                file_size: Some(100),
                file_type: Some("txt".into()),
            },
        }
    }

    pub(crate) fn folder(
        id: NodeId,
        name: &str,
        parent_id: Option<NodeId>,
        children: Vec<Node>,
    ) -> Node {
        Node {
            id,
            name: name.to_string(),
            parent_id,
            tags: Vec::new(),
            kind: NodeKind::Folder { children },
        }
    }

    /// Projects/
    ///   Alpha/
    ///     Specs/
    ///       design.md
    ///     notes.txt
    ///   Beta/
    /// readme.md
    pub(crate) fn sample_tree() -> Vec<Node> {
        vec![
            folder(
                1,
                "Projects",
                None,
                vec![
                    folder(
                        2,
                        "Alpha",
                        Some(1),
                        vec![
                            folder(
                                3,
                                "Specs",
                                Some(2),
                                vec![file(4, "design.md", Some(3), vec![tag(1, "urgent")])],
                            ),
                            file(5, "notes.txt", Some(2), vec![]),
                        ],
                    ),
                    folder(6, "Beta", Some(1), vec![]),
                ],
            ),
            file(7, "readme.md", None, vec![tag(2, "later")]),
        ]
    }

    fn built(roots: &[Node]) -> NodeIndex {
        let mut index = NodeIndex::new();
        index.build(roots);
        index
    }

    #[test]
    fn build_registers_every_depth() {
        let index = built(&sample_tree());
        assert_eq!(index.len(), 7);
        for id in 1..=7 {
            assert!(index.contains(id), "missing {}", id);
        }
        assert_eq!(index.get(4).unwrap().depth, 3);
        assert_eq!(index.get(2).unwrap().children, vec![3, 5]);
    }

    #[test]
    fn tree_order_is_preorder() {
        let index = built(&sample_tree());
        let ids: Vec<NodeId> = index.iter_in_tree_order().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn every_node_reaches_a_root() {
        let index = built(&sample_tree());
        for entry in index.iter_in_tree_order() {
            let path = index.resolve_path(entry.id);
            assert_eq!(path.len(), entry.depth + 1);
            let top = index.ancestors(entry.id).last().copied().unwrap_or(entry.id);
            assert!(index.get(top).unwrap().parent_id.is_none());
        }
    }

    #[test]
    fn resolve_path_root_to_leaf() {
        let index = built(&sample_tree());
        assert_eq!(
            index.resolve_path(4),
            vec!["Projects", "Alpha", "Specs", "design.md"]
        );
        assert_eq!(index.build_path(5), "Projects / Alpha / notes.txt");
        assert_eq!(index.build_path(7), "readme.md");
    }

    #[test]
    fn resolve_path_unknown_id_is_empty() {
        let index = built(&sample_tree());
        assert!(index.resolve_path(999).is_empty());
    }

    #[test]
    fn resolve_path_truncates_at_missing_ancestor() {
        // parent 42 is not part of the snapshot
        let roots = vec![folder(10, "Orphans", Some(42), vec![file(11, "a.txt", Some(10), vec![])])];
        let index = built(&roots);
        assert_eq!(index.resolve_path(11), vec!["Orphans", "a.txt"]);
        assert_eq!(index.ancestors(11), vec![10]);
    }

    #[test]
    fn missing_parent_id_falls_back_to_structure() {
        let roots = vec![folder(1, "top", None, vec![file(2, "inner", None, vec![])])];
        let index = built(&roots);
        assert_eq!(index.get(2).unwrap().parent_id, Some(1));
    }

    #[test]
    fn cyclic_parent_ids_terminate() {
        let roots = vec![folder(1, "a", Some(2), vec![]), folder(2, "b", Some(1), vec![])];
        let index = built(&roots);
        let path = index.resolve_path(1);
        assert!(path.len() <= 3);
    }

    #[test]
    fn duplicate_id_last_write_wins() {
        let roots = vec![
            file(1, "old name", None, vec![]),
            file(1, "new name", None, vec![]),
        ];
        let index = built(&roots);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(1).unwrap().name, "new name");
        assert_eq!(index.iter_in_tree_order().count(), 1);
    }

    #[test]
    fn rebuild_discards_previous_snapshot() {
        let mut index = built(&sample_tree());
        index.build(&[file(100, "only.txt", None, vec![])]);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(1));
    }

    #[test]
    fn build_twice_is_idempotent() {
        let tree = sample_tree();
        let once = built(&tree);
        let mut twice = built(&tree);
        twice.build(&tree);

        assert_eq!(once.len(), twice.len());
        let a: Vec<&IndexEntry> = once.iter_in_tree_order().collect();
        let b: Vec<&IndexEntry> = twice.iter_in_tree_order().collect();
        assert_eq!(a, b);
        assert_eq!(twice.generation(), once.generation() + 1);
    }

    #[test]
    fn deep_tree_builds_without_recursion() {
        let mut node = file(0, "leaf", None, vec![]);
        for id in 1..2_000 {
            node = folder(id, "d", None, vec![node]);
        }
        let index = built(&[node]);
        assert_eq!(index.len(), 2_000);
        assert_eq!(index.resolve_path(0).len(), 2_000);
    }
}
