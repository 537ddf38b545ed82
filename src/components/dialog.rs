use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::docs::model::ChildrenSummary;
use crate::theme::ThemeColors;

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

/// Dialog widget that renders a centered modal overlay.
///
/// The upload preview has its own widget; this one draws the text-input,
/// confirmation and error dialogs.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
    target_path: &'a str,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
            target_path: "/",
        }
    }

    /// Display path of the folder new items go into.
    pub fn target_path(mut self, target_path: &'a str) -> Self {
        self.target_path = target_path;
        self
    }

    fn frame(&self, title: String, border: Color, rect: Rect, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &'static str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let line = Line::from(Span::styled(
                text,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
            buf.set_line(inner.x, inner.y + inner.height - 1, &line, inner.width);
        }
    }

    fn render_input(&self, title: String, area: Rect, buf: &mut Buffer) {
        let width = 56.min(area.width.saturating_sub(4));
        let rect = centered_rect(width, 5, area);
        let inner = self.frame(format!(" {} ", title), self.theme.dialog_border_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let pos = self.dialog_state.cursor_position.min(input.len());
        let (before, rest) = input.split_at(pos);
        let mut rest_chars = rest.chars();
        let cursor_char = rest_chars
            .next()
            .map(String::from)
            .unwrap_or_else(|| " ".to_string());
        let after = rest_chars.as_str();

        // Scroll from the left so the cursor stays visible.
        let max_width = inner.width as usize;
        let before_len = before.chars().count();
        let before_display: String = if before_len + 1 > max_width {
            before
                .chars()
                .skip(before_len + 1 - max_width)
                .collect()
        } else {
            before.to_string()
        };

        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.dialog_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after.to_string(), input_style),
        ]);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_delete(
        &self,
        name: &str,
        is_folder: bool,
        summary: Option<&ChildrenSummary>,
        area: Rect,
        buf: &mut Buffer,
    ) {
        let name_width = u16::try_from(name.chars().count()).unwrap_or(u16::MAX);
        let width = name_width
            .saturating_add(12)
            .max(48)
            .min(area.width.saturating_sub(4));
        let rect = centered_rect(width, 8, area);
        let inner = self.frame(
            " Delete Confirmation ".to_string(),
            self.theme.error_fg,
            rect,
            buf,
        );
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let kind = if is_folder { "folder" } else { "document" };
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("Delete {} ", kind),
                Style::default().fg(self.theme.tree_fg),
            ),
            Span::styled(
                name.to_string(),
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("?", Style::default().fg(self.theme.tree_fg)),
        ])];

        if is_folder {
            let text = match summary {
                None => "Checking contents…".to_string(),
                Some(s) => delete_summary_text(s),
            };
            lines.push(Line::from(Span::styled(
                text,
                Style::default().fg(self.theme.error_fg),
            )));
        }

        let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(body, buf);

        self.hint("[y/Enter] Delete  [n/Esc] Cancel", inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = 60.min(area.width.saturating_sub(4));
        let text_width = width.saturating_sub(4).max(1) as usize;
        let body_lines = (message.chars().count() / text_width + 1) as u16;
        let rect = centered_rect(width, (body_lines + 3).min(12), area);
        let inner = self.frame(" Error ".to_string(), self.theme.error_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(Span::styled(
            message.to_string(),
            Style::default().fg(self.theme.error_fg),
        ))
        .wrap(Wrap { trim: true })
        .render(body, buf);

        self.hint("[Enter/Esc] Close", inner, buf);
    }
}

/// What the server said will be removed along with a folder.
pub fn delete_summary_text(summary: &ChildrenSummary) -> String {
    if !summary.has_children || summary.total_descendants == 0 {
        return "The folder is empty.".to_string();
    }
    match summary.children_summary.as_deref() {
        Some(text) if !text.trim().is_empty() => format!("This will also delete {}.", text.trim()),
        _ => format!(
            "This will also delete {} item{}.",
            summary.total_descendants,
            if summary.total_descendants == 1 { "" } else { "s" }
        ),
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::CreateFolder => {
                self.render_input(format!("New Folder in {}", self.target_path), area, buf)
            }
            DialogKind::Rename { .. } => self.render_input("Rename".to_string(), area, buf),
            DialogKind::CreateTag => self.render_input("New Tag".to_string(), area, buf),
            DialogKind::UploadPath => self.render_input(
                format!("Upload into {} from path", self.target_path),
                area,
                buf,
            ),
            DialogKind::DeleteConfirm {
                name,
                is_folder,
                summary,
                ..
            } => self.render_delete(name, *is_folder, summary.as_ref(), area, buf),
            DialogKind::Error { message } => self.render_error(message, area, buf),
            DialogKind::UploadPreview => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn render(mode: &AppMode, state: &DialogState) -> String {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(mode, state, &tc)
            .target_path("Projects / Alpha")
            .render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn create_folder_dialog_names_target() {
        let mode = AppMode::Dialog(DialogKind::CreateFolder);
        let state = DialogState {
            input: "Drafts".to_string(),
            cursor_position: 6,
        };
        let content = render(&mode, &state);
        assert!(content.contains("New Folder in Projects / Alpha"));
        assert!(content.contains("Drafts"));
    }

    #[test]
    fn rename_dialog_handles_multibyte_cursor() {
        let mode = AppMode::Dialog(DialogKind::Rename {
            id: 4,
            description: None,
        });
        let state = DialogState {
            input: "résumé.pdf".to_string(),
            cursor_position: 1,
        };
        let content = render(&mode, &state);
        assert!(content.contains("Rename"));
        assert!(content.contains("résumé.pdf"));
    }

    #[test]
    fn delete_dialog_shows_pending_then_summary() {
        let pending = AppMode::Dialog(DialogKind::DeleteConfirm {
            id: 1,
            name: "Projects".into(),
            is_folder: true,
            summary: None,
        });
        let content = render(&pending, &DialogState::default());
        assert!(content.contains("Delete folder Projects?"));
        assert!(content.contains("Checking contents"));

        let loaded = AppMode::Dialog(DialogKind::DeleteConfirm {
            id: 1,
            name: "Projects".into(),
            is_folder: true,
            summary: Some(ChildrenSummary {
                has_children: true,
                children_summary: Some("3 folders and 2 files".into()),
                total_descendants: 5,
            }),
        });
        let content = render(&loaded, &DialogState::default());
        assert!(content.contains("3 folders and 2 files"));
    }

    #[test]
    fn delete_dialog_with_huge_name_fills_width() {
        let mode = AppMode::Dialog(DialogKind::DeleteConfirm {
            id: 1,
            name: "x".repeat(65_530),
            is_folder: false,
            summary: None,
        });
        let content = render(&mode, &DialogState::default());
        assert!(content.contains("Delete document xxx"));
        assert!(content.contains("[y/Enter] Delete"));
    }

    #[test]
    fn summary_text_falls_back_to_count() {
        let summary = ChildrenSummary {
            has_children: true,
            children_summary: None,
            total_descendants: 1,
        };
        assert_eq!(delete_summary_text(&summary), "This will also delete 1 item.");
        assert_eq!(
            delete_summary_text(&ChildrenSummary::default()),
            "The folder is empty."
        );
    }

    #[test]
    fn error_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::Error {
            message: "Server error (500): boom".to_string(),
        });
        let content = render(&mode, &DialogState::default());
        assert!(content.contains("Error"));
        assert!(content.contains("boom"));
    }

    #[test]
    fn no_dialog_mode_noop() {
        let content = render(&AppMode::Normal, &DialogState::default());
        assert!(content.trim().is_empty());
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(50, 50, area), area);
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }
}
