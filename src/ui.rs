use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppMode, DialogKind};
use crate::components::details::DetailsWidget;
use crate::components::dialog::DialogWidget;
use crate::components::help::HelpOverlay;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::components::upload_preview::UploadPreviewWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let show_search = app.mode == AppMode::Search || app.tree.is_filtering();

    let [main_area, search_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(if show_search { 1 } else { 0 }),
        Constraint::Length(1),
    ])
    .areas(area);
    let [tree_area, details_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(main_area);

    // Keep the cursor row visible inside the bordered tree panel.
    app.tree.update_scroll(tree_area.height.saturating_sub(2) as usize);

    let target_path = app.target_path();
    let theme = &app.theme;

    let tree_block = Block::default()
        .title(format!(" Documents ({}) ", app.tree.index.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused_fg))
        .style(Style::default().bg(theme.tree_bg).fg(theme.tree_fg));
    frame.render_widget(
        TreeWidget::new(&app.tree, &app.selection, theme)
            .use_icons(app.use_icons)
            .show_tags(app.show_tags)
            .block(tree_block),
        tree_area,
    );

    let details_title = match app.selection.build_path(&app.tree.index) {
        Some(path) => format!(" Selected: {} ", path),
        None => " Details ".to_string(),
    };
    let details_block = Block::default()
        .title(details_title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg));
    frame.render_widget(
        DetailsWidget::new(&app.tree.index, &target_path, theme)
            .subject(app.subject())
            .detail(app.detail.as_ref())
            .block(details_block),
        details_area,
    );

    if show_search {
        render_search_bar(app, frame, search_area);
    }

    let node_info = format!("{} nodes", app.tree.index.len());
    let mut status = StatusBarWidget::new(&target_path, &node_info, theme).loading(app.loading);
    if let Some((msg, level, _)) = &app.status_message {
        status = status.status_message(msg, *level);
    }
    frame.render_widget(status, status_area);

    // ── Overlays ──
    match &app.mode {
        AppMode::Dialog(DialogKind::UploadPreview) => frame.render_widget(
            UploadPreviewWidget::new(&app.upload, &app.tags, &target_path, theme),
            area,
        ),
        AppMode::Dialog(_) => frame.render_widget(
            DialogWidget::new(&app.mode, &app.dialog_state, theme).target_path(&target_path),
            area,
        ),
        AppMode::Help => frame.render_widget(HelpOverlay::new(theme), area),
        AppMode::Normal | AppMode::Search => {}
    }
}

fn render_search_bar(app: &App, frame: &mut Frame, area: Rect) {
    let theme = &app.theme;
    let editing = app.mode == AppMode::Search;
    let mut spans = vec![
        Span::styled(
            "/",
            Style::default()
                .fg(theme.accent_fg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.tree.filter_input.clone(), Style::default().fg(theme.tree_fg)),
    ];
    if editing {
        spans.push(Span::styled(" ", Style::default().bg(theme.tree_fg)));
    }
    let hint = if editing {
        "  [Enter] keep  [Esc] cancel"
    } else {
        "  [Esc] leave search"
    };
    spans.push(Span::styled(hint, Style::default().fg(theme.dim_fg)));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.status_bg)),
        area,
    );
}
