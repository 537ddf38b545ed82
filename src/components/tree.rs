use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::docs::index::EntryKind;
use crate::docs::search::{split_highlight, Query};
use crate::docs::selection::Selection;
use crate::docs::tree::{DocTree, FlatItem};
use crate::theme::ThemeColors;

/// Tree widget that renders the document tree with box-drawing characters.
pub struct TreeWidget<'a> {
    tree: &'a DocTree,
    selection: &'a Selection,
    theme: &'a ThemeColors,
    use_icons: bool,
    show_tags: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree: &'a DocTree, selection: &'a Selection, theme: &'a ThemeColors) -> Self {
        Self {
            tree,
            selection,
            theme,
            use_icons: true,
            show_tags: true,
            block: None,
        }
    }

    pub fn use_icons(mut self, use_icons: bool) -> Self {
        self.use_icons = use_icons;
        self
    }

    pub fn show_tags(mut self, show_tags: bool) -> Self {
        self.show_tags = show_tags;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Indentation guides for one row.
    ///
    /// Continuation lines depend on whether each ancestor was the last of its
    /// siblings, found by walking back to the nearest row at that depth.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 1..item.depth {
            let ancestor_is_last = items[..item_index]
                .iter()
                .rev()
                .take_while(|row| row.depth >= d)
                .find(|row| row.depth == d)
                .is_some_and(|row| row.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (&item.kind, self.use_icons) {
            (EntryKind::Folder, true) if item.is_expanded => "\u{f07c} ",
            (EntryKind::Folder, true) => "\u{f07b} ",
            (EntryKind::File { .. }, true) => Self::file_icon_by_ext(&item.name),
            (EntryKind::Folder, false) if !item.has_children => "[ ] ",
            (EntryKind::Folder, false) if item.is_expanded => "[-] ",
            (EntryKind::Folder, false) => "[+] ",
            (EntryKind::File { .. }, false) => "    ",
        }
    }

    fn file_icon_by_ext(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "md" | "markdown" | "rst" | "txt" => "\u{f15c} ",
            "pdf" => "\u{f1c1} ",
            "doc" | "docx" | "odt" => "\u{f1c2} ",
            "xls" | "xlsx" | "csv" | "ods" => "\u{f1c3} ",
            "ppt" | "pptx" | "odp" => "\u{f1c4} ",
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp" => "\u{f1c5} ",
            "zip" | "tar" | "gz" | "7z" => "\u{f1c6} ",
            "json" | "yaml" | "yml" | "toml" | "xml" | "html" => "\u{f1c9} ",
            _ => "\u{f15b} ",
        }
    }

    /// Split `text` into spans, emphasising `range` if present.
    fn highlighted(
        &self,
        text: &str,
        range: Option<Range<usize>>,
        base: Style,
    ) -> Vec<Span<'static>> {
        match range {
            Some(range) => {
                let (before, matched, after) = split_highlight(text, &range);
                let emphasis = Style::default()
                    .fg(self.theme.match_fg)
                    .bg(self.theme.match_bg)
                    .add_modifier(Modifier::BOLD);
                vec![
                    Span::styled(before.to_string(), base),
                    Span::styled(matched.to_string(), emphasis),
                    Span::styled(after.to_string(), base),
                ]
            }
            None => vec![Span::styled(text.to_string(), base)],
        }
    }

    fn row_line(&self, item: &FlatItem, idx: usize, query: Option<&Query>) -> Line<'static> {
        let items = &self.tree.flat_items;
        let is_cursor = idx == self.tree.cursor;
        let is_selected = self.selection.is_selected(item.id);

        let mut base = match item.kind {
            EntryKind::Folder => Style::default()
                .fg(self.theme.tree_folder_fg)
                .add_modifier(Modifier::BOLD),
            EntryKind::File { .. } => Style::default().fg(self.theme.tree_file_fg),
        };
        if query.is_some() && !item.is_match {
            // Shown only as an ancestor of a match.
            base = base.fg(self.theme.dim_fg);
        }
        if is_selected {
            base = base.bg(self.theme.tree_marked_bg);
        }
        if is_cursor {
            base = base
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
        }

        let mut spans = vec![Span::styled(
            Self::build_prefix(item, items, idx),
            Style::default().fg(self.theme.border_fg),
        )];
        if is_selected {
            spans.push(Span::styled(
                "● ",
                base.fg(self.theme.accent_fg),
            ));
        }
        spans.push(Span::styled(self.item_indicator(item), base));

        let name_range = query
            .filter(|_| item.is_match)
            .and_then(|q| q.name_highlight(&item.name));
        spans.extend(self.highlighted(&item.name, name_range, base));

        if self.show_tags {
            let tag_style = Style::default().fg(self.theme.tag_fg);
            for tag in &item.tags {
                let range = query
                    .filter(|_| item.is_match)
                    .and_then(|q| q.tag_highlight(&tag.name));
                spans.push(Span::styled(" #", tag_style));
                spans.extend(self.highlighted(&tag.name, range, tag_style));
            }
        }

        Line::from(spans)
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        if let Some(hint) = self.tree.no_results_hint() {
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "No results",
                    Style::default()
                        .fg(self.theme.warning_fg)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(hint, Style::default().fg(self.theme.dim_fg))),
            ])
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
            return;
        }

        let items = &self.tree.flat_items;
        if items.is_empty() {
            let line = Line::from(Span::styled(
                "No documents",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let query = self.tree.active_filter().map(|f| &f.query);
        let visible = items
            .iter()
            .enumerate()
            .skip(self.tree.scroll_offset)
            .take(inner_area.height as usize);

        for (row, (idx, item)) in visible.enumerate() {
            let y = inner_area.y + row as u16;
            let line = self.row_line(item, idx, query);
            if idx == self.tree.cursor {
                buf.set_style(
                    Rect::new(inner_area.x, y, inner_area.width, 1),
                    Style::default().bg(self.theme.tree_selected_bg),
                );
            }
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
