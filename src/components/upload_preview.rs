use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use super::dialog::centered_rect;
use super::format_size;
use crate::app::UploadSession;
use crate::docs::model::Tag;
use crate::ingest::assemble::{assemble, PreviewRow};
use crate::theme::ThemeColors;

/// Known tags beyond this many cannot be toggled from the preview.
pub const MAX_TOGGLE_TAGS: usize = 9;

/// Modal showing what an upload will create before it is sent.
pub struct UploadPreviewWidget<'a> {
    upload: &'a UploadSession,
    tags: &'a [Tag],
    target_path: &'a str,
    theme: &'a ThemeColors,
}

impl<'a> UploadPreviewWidget<'a> {
    pub fn new(
        upload: &'a UploadSession,
        tags: &'a [Tag],
        target_path: &'a str,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            upload,
            tags,
            target_path,
            theme,
        }
    }

    fn row_line(&self, row: &PreviewRow, rows: &[PreviewRow], idx: usize) -> Line<'static> {
        let mut prefix = String::new();
        for d in 1..=row.depth {
            let ancestor_is_last = rows[..idx]
                .iter()
                .rev()
                .find(|r| r.depth == d - 1)
                .is_some_and(|r| r.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if row.is_last_sibling { "└── " } else { "├── " });

        let mut spans = vec![Span::styled(prefix, Style::default().fg(self.theme.border_fg))];
        if row.is_folder {
            spans.push(Span::styled(
                format!("{}/", row.name),
                Style::default()
                    .fg(self.theme.tree_folder_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                row.name.clone(),
                Style::default().fg(self.theme.tree_file_fg),
            ));
        }
        if let Some(size) = row.size {
            spans.push(Span::styled(
                format!("  {}", format_size(size)),
                Style::default().fg(self.theme.dim_fg),
            ));
        }
        Line::from(spans)
    }

    fn tag_line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            "Tags: ",
            Style::default().fg(self.theme.dim_fg),
        )];
        if self.tags.is_empty() {
            spans.push(Span::styled("none defined", Style::default().fg(self.theme.dim_fg)));
        }
        for (i, tag) in self.tags.iter().take(MAX_TOGGLE_TAGS).enumerate() {
            let checked = self.upload.tag_ids.contains(&tag.id);
            let style = if checked {
                Style::default()
                    .fg(self.theme.tag_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.dim_fg)
            };
            spans.push(Span::styled(
                format!("{}[{}] {}  ", i + 1, if checked { "x" } else { " " }, tag.name),
                style,
            ));
        }
        Line::from(spans)
    }
}

impl<'a> Widget for UploadPreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width as f32 * 0.8).min(90.0) as u16;
        let height = (area.height as f32 * 0.8).min(36.0) as u16;
        let rect = centered_rect(width, height, area);

        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" Upload to {} ", self.target_path))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dialog_border_fg))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        if inner.height < 5 || inner.width == 0 {
            return;
        }

        let files = self.upload.effective_files();
        let preview = assemble(&files);
        let [summary_area, rows_area, tags_area, hint_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        // ── Summary ──
        let mode = if self.upload.folder_mode {
            "folder mode: structure kept"
        } else {
            "flat mode: files only"
        };
        let summary = Line::from(vec![
            Span::styled(
                format!(
                    "{} files, {} folders, {}",
                    preview.file_count(),
                    preview.folder_count(),
                    format_size(preview.total_size())
                ),
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  ({})", mode), Style::default().fg(self.theme.info_fg)),
        ]);
        buf.set_line(summary_area.x, summary_area.y, &summary, summary_area.width);

        let mut warnings = Vec::new();
        if !preview.conflicts.is_empty() {
            warnings.push(format!("{} conflicting path(s) left out", preview.conflicts.len()));
        }
        if !self.upload.report.skipped.is_empty() {
            warnings.push(format!(
                "{} unreadable entr{} skipped",
                self.upload.report.skipped.len(),
                if self.upload.report.skipped.len() == 1 { "y" } else { "ies" }
            ));
        }
        if self.upload.in_flight {
            warnings.push("uploading…".to_string());
        }
        if !warnings.is_empty() && summary_area.height > 1 {
            let line = Line::from(Span::styled(
                warnings.join(", "),
                Style::default().fg(self.theme.warning_fg),
            ));
            buf.set_line(summary_area.x, summary_area.y + 1, &line, summary_area.width);
        }

        // ── Rows ──
        let rows = preview.root.preview_rows();
        let visible = rows_area.height as usize;
        let scroll = self.upload.scroll.min(rows.len().saturating_sub(visible));
        for (i, idx) in (scroll..rows.len()).take(visible).enumerate() {
            let line = self.row_line(&rows[idx], &rows, idx);
            buf.set_line(rows_area.x, rows_area.y + i as u16, &line, rows_area.width);
        }

        buf.set_line(tags_area.x, tags_area.y, &self.tag_line(), tags_area.width);

        let hint = Line::from(Span::styled(
            "[Enter] Upload  [f] Folder mode  [1-9] Tags  [j/k] Scroll  [Esc] Cancel",
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));
        buf.set_line(hint_area.x, hint_area.y, &hint, hint_area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::index::tests::tag;
    use crate::ingest::source::FileHandle;
    use crate::ingest::IngestedFile;
    use crate::theme;

    fn ingested(path: &str, size: usize) -> IngestedFile {
        let name = path.rsplit('/').next().unwrap_or(path);
        IngestedFile {
            file: FileHandle::in_memory(name, vec![b'x'; size]),
            relative_path: path.to_string(),
        }
    }

    fn render(upload: &UploadSession, tags: &[Tag]) -> String {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        UploadPreviewWidget::new(upload, tags, "Projects", &tc).render(area, &mut buf);
        let mut s = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn shows_tree_totals_and_target() {
        let upload = UploadSession {
            files: vec![
                ingested("docs/a.md", 10),
                ingested("docs/sub/b.md", 20),
                ingested("c.txt", 2048),
            ],
            folder_mode: true,
            ..Default::default()
        };
        let content = render(&upload, &[]);
        assert!(content.contains("Upload to Projects"));
        assert!(content.contains("3 files, 2 folders"));
        assert!(content.contains("folder mode"));
        assert!(content.contains("├── docs/"));
        assert!(content.contains("│  ├── sub/"));
        assert!(content.contains("│  │  └── b.md"));
        assert!(content.contains("│  └── a.md"));
        assert!(content.contains("└── c.txt  2.00 KB"));
    }

    #[test]
    fn tags_are_numbered_and_checked() {
        let upload = UploadSession {
            files: vec![ingested("a.md", 1)],
            tag_ids: vec![2],
            ..Default::default()
        };
        let content = render(&upload, &[tag(1, "urgent"), tag(2, "later")]);
        assert!(content.contains("1[ ] urgent"));
        assert!(content.contains("2[x] later"));
        assert!(content.contains("flat mode"));
    }

    #[test]
    fn flat_mode_lists_files_at_top_level() {
        let upload = UploadSession {
            files: vec![ingested("docs/a.md", 1), ingested("docs/sub/b.md", 1)],
            folder_mode: false,
            ..Default::default()
        };
        let content = render(&upload, &[]);
        assert!(content.contains("2 files, 0 folders"));
        assert!(content.contains("├── a.md"));
        assert!(content.contains("└── b.md"));
        assert!(!content.contains("docs/"));
    }

    #[test]
    fn reports_conflicts_and_skips() {
        let mut upload = UploadSession {
            files: vec![ingested("a/b", 1), ingested("a", 1)],
            ..Default::default()
        };
        upload.report.skipped.push("x: denied".into());
        let content = render(&upload, &[]);
        assert!(content.contains("1 conflicting path(s) left out"));
        assert!(content.contains("1 unreadable entry skipped"));
    }
}
