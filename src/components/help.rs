use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// A single keybinding entry for display.
struct KeyEntry {
    key: &'static str,
    description: &'static str,
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: &'static [KeyEntry],
}

const NAVIGATION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "j / ↓",
        description: "Move down",
    },
    KeyEntry {
        key: "k / ↑",
        description: "Move up",
    },
    KeyEntry {
        key: "g / Home",
        description: "Jump to first item",
    },
    KeyEntry {
        key: "G / End",
        description: "Jump to last item",
    },
    KeyEntry {
        key: "l / →",
        description: "Expand folder",
    },
    KeyEntry {
        key: "h / ←",
        description: "Collapse folder / go to parent",
    },
    KeyEntry {
        key: "Enter",
        description: "Toggle folder",
    },
];

const SELECTION_SEARCH_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "Space",
        description: "Select / deselect node",
    },
    KeyEntry {
        key: "/",
        description: "Search names and tags",
    },
    KeyEntry {
        key: "tag:<name> [text]",
        description: "Search by tag, optionally by name",
    },
    KeyEntry {
        key: "Enter",
        description: "Keep search results",
    },
    KeyEntry {
        key: "Esc",
        description: "Leave search / clear selection",
    },
];

const DOCUMENT_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "n",
        description: "New folder in target",
    },
    KeyEntry {
        key: "r",
        description: "Rename node",
    },
    KeyEntry {
        key: "d",
        description: "Delete node",
    },
    KeyEntry {
        key: "t",
        description: "Create tag",
    },
];

const UPLOAD_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "u",
        description: "Upload a local file or folder",
    },
    KeyEntry {
        key: "f",
        description: "Toggle folder mode (preview)",
    },
    KeyEntry {
        key: "1-9",
        description: "Toggle tag (preview)",
    },
    KeyEntry {
        key: "Enter",
        description: "Start upload (preview)",
    },
];

const GENERAL_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "?",
        description: "Toggle this help overlay",
    },
    KeyEntry {
        key: "R",
        description: "Reload tree and tags",
    },
    KeyEntry {
        key: "q",
        description: "Quit",
    },
    KeyEntry {
        key: "Ctrl+C",
        description: "Quit",
    },
];

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: NAVIGATION_KEYS,
    },
    KeyCategory {
        name: "Selection & Search",
        entries: SELECTION_SEARCH_KEYS,
    },
    KeyCategory {
        name: "Documents",
        entries: DOCUMENT_KEYS,
    },
    KeyCategory {
        name: "Upload",
        entries: UPLOAD_KEYS,
    },
    KeyCategory {
        name: "General",
        entries: GENERAL_KEYS,
    },
];

/// Help overlay widget showing all keybindings.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors) -> Self {
        Self { theme }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = vec![
            Line::from(Span::styled(
                " Keybinding Reference ",
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for category in CATEGORIES {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("── {} ", category.name),
                    Style::default()
                        .fg(self.theme.accent_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("─".repeat(40), Style::default().fg(self.theme.dim_fg)),
            ]));

            for entry in category.entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:<20}", entry.key),
                        Style::default()
                            .fg(self.theme.warning_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.description,
                        Style::default().fg(self.theme.tree_file_fg),
                    ),
                ]));
            }
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(self.theme.dim_fg),
        )));
        lines
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let overlay_width = (area.width as f32 * 0.70).min(72.0) as u16;
        let overlay_height = (area.height as f32 * 0.85).min(45.0) as u16;
        let overlay_area = super::dialog::centered_rect(overlay_width, overlay_height, area);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg));
        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        for (i, line) in self
            .build_content_lines()
            .iter()
            .take(inner.height as usize)
            .enumerate()
        {
            buf.set_line(
                inner.x + 1,
                inner.y + i as u16,
                line,
                inner.width.saturating_sub(2),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_categories_have_entries() {
        for cat in CATEGORIES {
            assert!(
                !cat.entries.is_empty(),
                "Category '{}' has no entries",
                cat.name
            );
        }
    }

    #[test]
    fn content_lists_every_entry() {
        let theme = crate::theme::dark_theme();
        let lines = HelpOverlay::new(&theme).build_content_lines();
        let entries: usize = CATEGORIES.iter().map(|c| c.entries.len() + 2).sum();
        assert_eq!(lines.len(), entries + 3);
    }

    #[test]
    fn renders_categories() {
        let theme = crate::theme::dark_theme();
        let area = Rect::new(0, 0, 100, 50);
        let mut buf = Buffer::empty(area);
        HelpOverlay::new(&theme).render(area, &mut buf);
        let content: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|pos| buf.cell(pos).unwrap().symbol().to_string())
            .collect();
        assert!(content.contains("Selection & Search"));
        assert!(content.contains("Upload a local file or folder"));
    }
}
