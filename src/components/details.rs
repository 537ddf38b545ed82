use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use super::format_size;
use crate::docs::index::{EntryKind, IndexEntry, NodeIndex};
use crate::docs::model::NodeDetail;
use crate::theme::ThemeColors;

/// Side panel describing the node actions apply to and where uploads go.
pub struct DetailsWidget<'a> {
    index: &'a NodeIndex,
    subject: Option<&'a IndexEntry>,
    detail: Option<&'a NodeDetail>,
    target_path: &'a str,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> DetailsWidget<'a> {
    pub fn new(index: &'a NodeIndex, target_path: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            index,
            subject: None,
            detail: None,
            target_path,
            theme,
            block: None,
        }
    }

    pub fn subject(mut self, subject: Option<&'a IndexEntry>) -> Self {
        self.subject = subject;
        self
    }

    /// Fetched detail; ignored unless it belongs to the subject.
    pub fn detail(mut self, detail: Option<&'a NodeDetail>) -> Self {
        self.detail = detail;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn field(&self, label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{:<12}", label),
                Style::default().fg(self.theme.dim_fg),
            ),
            Span::styled(value, Style::default().fg(self.theme.tree_fg)),
        ])
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        match self.subject {
            None => lines.push(Line::from(Span::styled(
                "Nothing selected",
                Style::default().fg(self.theme.dim_fg),
            ))),
            Some(entry) => {
                lines.push(Line::from(Span::styled(
                    entry.name.clone(),
                    Style::default()
                        .fg(self.theme.accent_fg)
                        .add_modifier(Modifier::BOLD),
                )));
                lines.push(self.field("Path", self.index.build_path(entry.id)));
                match &entry.kind {
                    EntryKind::Folder => {
                        lines.push(self.field("Kind", "Folder".into()));
                        lines.push(self.field("Children", entry.children.len().to_string()));
                    }
                    EntryKind::File {
                        file_size,
                        file_type,
                    } => {
                        lines.push(self.field(
                            "Kind",
                            file_type.clone().unwrap_or_else(|| "File".into()),
                        ));
                        if let Some(size) = file_size {
                            lines.push(self.field("Size", format_size(*size)));
                        }
                    }
                }
                if !entry.tags.is_empty() {
                    let mut spans = vec![Span::styled(
                        format!("{:<12}", "Tags"),
                        Style::default().fg(self.theme.dim_fg),
                    )];
                    for tag in &entry.tags {
                        spans.push(Span::styled(
                            format!("#{} ", tag.name),
                            Style::default().fg(self.theme.tag_fg),
                        ));
                    }
                    lines.push(Line::from(spans));
                }

                if let Some(detail) = self.detail.filter(|d| d.node.id == entry.id) {
                    lines.push(Line::from(""));
                    if let Some(desc) = detail.description.as_deref().filter(|d| !d.is_empty()) {
                        lines.push(self.field("Description", desc.to_string()));
                    }
                    if let Some(vectorized) = detail.is_vectorized {
                        let text = if vectorized { "yes" } else { "pending" };
                        lines.push(self.field("Indexed", text.into()));
                    }
                    if let Some(created) = &detail.created_at {
                        lines.push(self.field("Created", created.clone()));
                    }
                    if let Some(updated) = &detail.updated_at {
                        lines.push(self.field("Updated", updated.clone()));
                    }
                }
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<12}", "Upload to"),
                Style::default().fg(self.theme.dim_fg),
            ),
            Span::styled(
                self.target_path.to_string(),
                Style::default()
                    .fg(self.theme.success_fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        lines
    }
}

impl<'a> Widget for DetailsWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.build_lines();
        let mut paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
