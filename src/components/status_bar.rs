use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::app::StatusLevel;
use crate::theme::ThemeColors;

const KEY_HINTS: &str = " /:find  n:new  u:upload  r:ren  d:del  ?:help ";

/// Status bar widget: a transient message, or the upload target, node count
/// and key hints.
pub struct StatusBarWidget<'a> {
    target_path: &'a str,
    node_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<(&'a str, StatusLevel)>,
    loading: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(target_path: &'a str, node_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            target_path,
            node_info,
            theme,
            status_message: None,
            loading: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, level: StatusLevel) -> Self {
        self.status_message = Some((msg, level));
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

/// Keep the last `budget` characters, prefixed with `...` when cut.
fn truncate_left(text: &str, budget: usize) -> String {
    let len = text.chars().count();
    if len <= budget {
        return text.to_string();
    }
    if budget <= 3 {
        return text.chars().take(budget).collect();
    }
    let tail: String = text.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some((msg, level)) = self.status_message {
            let style = match level {
                StatusLevel::Error => Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg),
                StatusLevel::Success => Style::default().fg(self.theme.success_fg),
                StatusLevel::Info => Style::default().fg(self.theme.info_fg),
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        // [target] [loading] [node info] [key hints]
        let hints_len = KEY_HINTS.chars().count();
        let loading = if self.loading { " loading… " } else { "" };
        let remaining = width
            .saturating_sub(hints_len)
            .saturating_sub(loading.chars().count());

        let info_len = self.node_info.chars().count();
        let path_budget = remaining.saturating_sub(info_len).saturating_sub(1);
        let target = format!("→ {}", self.target_path);
        let path_display = truncate_left(&target, path_budget);
        let info_display: String = self
            .node_info
            .chars()
            .take(remaining.saturating_sub(path_display.chars().count()))
            .collect();
        let gap = remaining
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count());

        let mut spans = vec![
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, Style::default().fg(self.theme.info_fg)),
        ];
        if self.loading {
            spans.push(Span::styled(
                loading,
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
