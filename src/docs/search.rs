//! Incremental name / tag search over the node index.
//!
//! Query grammar: plain text matches case-insensitively against a node's name
//! or any of its tag names. If the text contains `tag:`, the token right after
//! the first `tag:` restricts matches to nodes carrying a tag whose name
//! contains it, and whatever text remains must also appear in the name.

use std::collections::HashSet;
use std::ops::Range;

use super::index::{IndexEntry, NodeIndex};
use super::model::NodeId;

/// Literal prefix that introduces a tag predicate.
pub const TAG_PREFIX: &str = "tag:";

/// A parsed, lower-cased search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Substring of the name or of any tag name.
    Plain(String),
    /// Substring of some tag name, AND (if present) substring of the name.
    Tagged { tag: String, name: Option<String> },
}

impl Query {
    /// Parse user input. Returns `None` for blank input.
    ///
    /// Only the first `tag:` token is a predicate; any later `tag:` text stays
    /// part of the name predicate.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let Some(pos) = trimmed.find(TAG_PREFIX) else {
            return Some(Query::Plain(fold_case(trimmed)));
        };

        let after = &trimmed[pos + TAG_PREFIX.len()..];
        let token_len = after.find(char::is_whitespace).unwrap_or(after.len());
        let token = &after[..token_len];
        let rest = format!("{} {}", &trimmed[..pos], &after[token_len..]);
        let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");

        Some(Query::Tagged {
            tag: fold_case(token),
            name: (!rest.is_empty()).then(|| fold_case(&rest)),
        })
    }

    pub fn is_tag_query(&self) -> bool {
        matches!(self, Query::Tagged { .. })
    }

    /// Whether `entry` satisfies the query.
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        match self {
            Query::Plain(needle) => {
                fold_case(&entry.name).contains(needle.as_str())
                    || entry
                        .tags
                        .iter()
                        .any(|t| fold_case(&t.name).contains(needle.as_str()))
            }
            Query::Tagged { tag, name } => {
                let tag_ok = entry
                    .tags
                    .iter()
                    .any(|t| fold_case(&t.name).contains(tag.as_str()));
                let name_ok = name
                    .as_deref()
                    .map_or(true, |n| fold_case(&entry.name).contains(n));
                tag_ok && name_ok
            }
        }
    }

    /// Span to emphasise inside a node's display name.
    pub fn name_highlight(&self, name: &str) -> Option<Range<usize>> {
        match self {
            Query::Plain(needle) => highlight(name, needle),
            Query::Tagged { name: needle, .. } => needle.as_deref().and_then(|n| highlight(name, n)),
        }
    }

    /// Span to emphasise inside a tag badge.
    pub fn tag_highlight(&self, tag_name: &str) -> Option<Range<usize>> {
        match self {
            Query::Plain(needle) => highlight(tag_name, needle),
            Query::Tagged { tag, .. } => highlight(tag_name, tag),
        }
    }
}

/// Outcome of running a query against the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    /// Matching ids in server tree order.
    pub matched: Vec<NodeId>,
    pub is_tag_query: bool,
    /// Ancestors of matches that must be shown and expanded.
    pub reveal: HashSet<NodeId>,
}

impl FilterResult {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn is_match(&self, id: NodeId) -> bool {
        self.matched.contains(&id)
    }

    /// Whether a row for `id` belongs in the filtered view.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.reveal.contains(&id) || self.is_match(id)
    }
}

/// Run `query` over every indexed node.
///
/// Order follows the tree, not relevance. Ancestor chains are truncated at
/// the first id missing from the index.
pub fn filter(index: &NodeIndex, query: &Query) -> FilterResult {
    let matched: Vec<NodeId> = index
        .iter_in_tree_order()
        .filter(|entry| query.matches(entry))
        .map(|entry| entry.id)
        .collect();

    let mut reveal = HashSet::new();
    for id in &matched {
        reveal.extend(index.ancestors(*id));
    }

    FilterResult {
        matched,
        is_tag_query: query.is_tag_query(),
        reveal,
    }
}

/// Hint shown when a query matches nothing.
pub fn no_results_hint(query: &Query) -> String {
    match query {
        Query::Tagged { tag, name: None } => format!(
            "No documents tagged \"{}\". Check the tag name or drop the tag: prefix.",
            tag
        ),
        Query::Tagged {
            tag,
            name: Some(name),
        } => format!(
            "No documents tagged \"{}\" with \"{}\" in the name.",
            tag, name
        ),
        Query::Plain(needle) => format!(
            "No names or tags contain \"{}\". Use tag:<name> to search by tag.",
            needle
        ),
    }
}

/// Lower-case `text` one char at a time.
///
/// Unlike `str::to_lowercase` this ignores word-final sigma, so matching and
/// highlighting agree on every character.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Byte range of the first case-insensitive occurrence of `needle` in `text`.
///
/// The search runs on lower-cased text; the returned range is mapped back to
/// character boundaries of the original string, so it can slice `text`
/// directly even when lower-casing changes byte lengths.
pub fn highlight(text: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let needle = fold_case(needle);

    let mut lowered = String::with_capacity(text.len());
    // (offset in lowered, offset in original) at each original char start
    let mut starts: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    for (orig, ch) in text.char_indices() {
        starts.push((lowered.len(), orig));
        lowered.extend(ch.to_lowercase());
    }

    let lo_start = lowered.find(&needle)?;
    let lo_end = lo_start + needle.len();

    let start = starts
        .iter()
        .rev()
        .find(|(lo, _)| *lo <= lo_start)
        .map(|(_, orig)| *orig)?;
    let end = starts
        .iter()
        .find(|(lo, _)| *lo >= lo_end)
        .map(|(_, orig)| *orig)
        .unwrap_or(text.len());
    Some(start..end)
}

/// Split `text` into before / matched / after around `range`.
pub fn split_highlight<'a>(text: &'a str, range: &Range<usize>) -> (&'a str, &'a str, &'a str) {
    (
        &text[..range.start],
        &text[range.start..range.end],
        &text[range.end..],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::index::tests::{file, folder, sample_tree, tag};

    fn index_of(roots: &[crate::docs::model::Node]) -> NodeIndex {
        let mut index = NodeIndex::new();
        index.build(roots);
        index
    }

    // === Parsing ===

    #[test]
    fn parse_blank_is_none() {
        assert_eq!(Query::parse(""), None);
        assert_eq!(Query::parse("   "), None);
    }

    #[test]
    fn parse_plain_lowercases_and_trims() {
        assert_eq!(Query::parse("  Report "), Some(Query::Plain("report".into())));
    }

    #[test]
    fn parse_tag_with_rest() {
        assert_eq!(
            Query::parse("tag:Urgent Q1 report"),
            Some(Query::Tagged {
                tag: "urgent".into(),
                name: Some("q1 report".into())
            })
        );
    }

    #[test]
    fn parse_tag_in_the_middle() {
        assert_eq!(
            Query::parse("report tag:urgent draft"),
            Some(Query::Tagged {
                tag: "urgent".into(),
                name: Some("report draft".into())
            })
        );
    }

    #[test]
    fn parse_tag_only() {
        assert_eq!(
            Query::parse("tag:urgent"),
            Some(Query::Tagged {
                tag: "urgent".into(),
                name: None
            })
        );
    }

    #[test]
    fn parse_only_first_tag_token_is_predicate() {
        assert_eq!(
            Query::parse("tag:a tag:b"),
            Some(Query::Tagged {
                tag: "a".into(),
                name: Some("tag:b".into())
            })
        );
    }

    #[test]
    fn parse_empty_tag_token() {
        assert_eq!(
            Query::parse("tag:"),
            Some(Query::Tagged {
                tag: String::new(),
                name: None
            })
        );
    }

    // === Matching ===

    #[test]
    fn tag_query_scenario() {
        let roots = vec![
            file(1, "Q1 report", None, vec![tag(1, "urgent")]),
            file(2, "Q2 report", None, vec![tag(2, "later")]),
        ];
        let index = index_of(&roots);
        let query = Query::parse("tag:urgent report").unwrap();
        let result = filter(&index, &query);
        assert_eq!(result.matched, vec![1]);
        assert!(result.is_tag_query);
    }

    #[test]
    fn tag_query_requires_name_when_rest_given() {
        let roots = vec![
            file(1, "Q1 report", None, vec![tag(1, "urgent")]),
            file(2, "minutes", None, vec![tag(1, "urgent")]),
        ];
        let index = index_of(&roots);
        let result = filter(&index, &Query::parse("tag:urg minutes").unwrap());
        assert_eq!(result.matched, vec![2]);
    }

    #[test]
    fn empty_tag_token_matches_any_tagged_node() {
        let index = index_of(&sample_tree());
        let result = filter(&index, &Query::parse("tag:").unwrap());
        assert_eq!(result.matched, vec![4, 7]);
    }

    #[test]
    fn plain_query_matches_name_or_tag_exactly() {
        let index = index_of(&sample_tree());
        for q in ["a", "md", "urg", "LATER", "s", "alpha", "zzz", "e"] {
            let query = Query::parse(q).unwrap();
            let needle = fold_case(q);
            let expected: Vec<NodeId> = index
                .iter_in_tree_order()
                .filter(|e| {
                    fold_case(&e.name).contains(&needle)
                        || e.tags.iter().any(|t| fold_case(&t.name).contains(&needle))
                })
                .map(|e| e.id)
                .collect();
            assert_eq!(filter(&index, &query).matched, expected, "query {:?}", q);
        }
    }

    #[test]
    fn plain_query_hits_tag_name() {
        let index = index_of(&sample_tree());
        let result = filter(&index, &Query::parse("URGENT").unwrap());
        assert_eq!(result.matched, vec![4]);
        assert!(!result.is_tag_query);
    }

    #[test]
    fn plain_query_does_not_match_across_tag_boundaries() {
        let roots = vec![file(1, "x", None, vec![tag(1, "ab"), tag(2, "cd")])];
        let index = index_of(&roots);
        assert!(filter(&index, &Query::parse("bc").unwrap()).is_empty());
    }

    #[test]
    fn matches_reveal_every_ancestor() {
        let index = index_of(&sample_tree());
        let result = filter(&index, &Query::parse("design").unwrap());
        assert_eq!(result.matched, vec![4]);
        let expected: HashSet<NodeId> = [1, 2, 3].into_iter().collect();
        assert_eq!(result.reveal, expected);
        assert!(result.is_visible(2));
        assert!(!result.is_visible(5));
    }

    #[test]
    fn no_matches_is_empty_result() {
        let index = index_of(&sample_tree());
        let result = filter(&index, &Query::parse("nothing-here").unwrap());
        assert!(result.is_empty());
        assert!(result.reveal.is_empty());
    }

    #[test]
    fn reveal_truncates_on_missing_ancestor() {
        let roots = vec![folder(10, "dangling", Some(99), vec![file(11, "hit", Some(10), vec![])])];
        let index = index_of(&roots);
        let result = filter(&index, &Query::parse("hit").unwrap());
        let expected: HashSet<NodeId> = [10].into_iter().collect();
        assert_eq!(result.reveal, expected);
    }

    #[test]
    fn no_results_hint_differs_by_query_kind() {
        let tag_hint = no_results_hint(&Query::parse("tag:x").unwrap());
        let name_hint = no_results_hint(&Query::parse("x").unwrap());
        assert!(tag_hint.contains("tagged"));
        assert!(name_hint.contains("tag:<name>"));
        assert_ne!(tag_hint, name_hint);
    }

    // === Highlighting ===

    #[test]
    fn highlight_first_occurrence_only() {
        assert_eq!(highlight("Report of reports", "report"), Some(0..6));
    }

    #[test]
    fn highlight_preserves_original_case() {
        let text = "Quarterly REPORT.pdf";
        let range = highlight(text, "report").unwrap();
        assert_eq!(&text[range.clone()], "REPORT");
        let (before, hit, after) = split_highlight(text, &range);
        assert_eq!(before, "Quarterly ");
        assert_eq!(hit, "REPORT");
        assert_eq!(after, ".pdf");
    }

    #[test]
    fn highlight_none_when_absent_or_empty() {
        assert_eq!(highlight("abc", "z"), None);
        assert_eq!(highlight("abc", ""), None);
    }

    #[test]
    fn highlight_maps_back_when_lowercase_changes_length() {
        // 'İ' lower-cases to two chars, shifting every later offset
        let text = "İstanbul notes";
        let range = highlight(text, "notes").unwrap();
        assert_eq!(&text[range], "notes");
    }

    #[test]
    fn final_sigma_matches_and_highlights_alike() {
        let index = index_of(&[file(1, "ΟΔΟΣ.pdf", None, vec![])]);
        let query = Query::parse("οδοσ").unwrap();
        assert_eq!(filter(&index, &query).matched, vec![1]);
        assert_eq!(query.name_highlight("ΟΔΟΣ.pdf"), Some(0.."ΟΔΟΣ".len()));
    }

    #[test]
    fn query_highlights_follow_predicates() {
        let query = Query::parse("tag:urg report").unwrap();
        assert_eq!(query.name_highlight("Q1 Report"), Some(3..9));
        assert_eq!(query.tag_highlight("Urgent"), Some(0..3));

        let tag_only = Query::parse("tag:urg").unwrap();
        assert_eq!(tag_only.name_highlight("Q1 Report"), None);
    }
}
