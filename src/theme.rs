//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light), plus custom color overrides from
//! the config file.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_folder_fg: Color,
    pub tree_file_fg: Color,
    /// Background of the node chosen as upload target / action subject.
    pub tree_marked_bg: Color,

    // Search
    pub match_fg: Color,
    pub match_bg: Color,
    pub tag_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Dialogs
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Semantic colors (not configurable)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_folder_fg: Color::Rgb(137, 180, 250),   // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tree_marked_bg: Color::Rgb(49, 50, 68),      // #313244 (surface0)

        match_fg: Color::Rgb(30, 30, 46),    // #1e1e2e (base)
        match_bg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        tag_fg: Color::Rgb(148, 226, 213),   // #94e2d5 (teal)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        dialog_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_folder_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),
        tree_marked_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)

        match_fg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        match_bg: Color::Rgb(223, 142, 29),  // #df8e1d (yellow)
        tag_fg: Color::Rgb(23, 146, 153),    // #179299 (teal)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        dialog_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"`. Returns `None` for malformed
/// input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// `"custom"` starts from the dark palette and applies the hex overrides;
/// unknown schemes fall back to dark.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn set(slot: &mut Color, value: &Option<String>) {
    if let Some(color) = value.as_deref().and_then(parse_hex_color) {
        *slot = color;
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    set(&mut theme.tree_bg, &custom.tree_bg);
    set(&mut theme.tree_fg, &custom.tree_fg);
    set(&mut theme.tree_selected_bg, &custom.tree_selected_bg);
    set(&mut theme.tree_selected_fg, &custom.tree_selected_fg);
    set(&mut theme.tree_folder_fg, &custom.tree_folder_fg);
    set(&mut theme.tree_file_fg, &custom.tree_file_fg);
    set(&mut theme.match_fg, &custom.match_fg);
    set(&mut theme.tag_fg, &custom.tag_fg);
    set(&mut theme.status_bg, &custom.status_bg);
    set(&mut theme.status_fg, &custom.status_fg);
    set(&mut theme.border_fg, &custom.border_fg);
    set(&mut theme.dialog_bg, &custom.dialog_bg);
    set(&mut theme.dialog_border_fg, &custom.dialog_border_fg);
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_valid() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#1a1b26"), Some(Color::Rgb(26, 27, 38)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_resolve_schemes() {
        let light = resolve_theme(&ThemeConfig {
            scheme: Some("light".to_string()),
            custom: None,
        });
        assert_eq!(light.tree_folder_fg, Color::Rgb(30, 102, 245));

        let default = resolve_theme(&ThemeConfig::default());
        assert_eq!(default.tree_folder_fg, Color::Rgb(137, 180, 250));

        let unknown = resolve_theme(&ThemeConfig {
            scheme: Some("neon".to_string()),
            custom: None,
        });
        assert_eq!(unknown.tree_folder_fg, Color::Rgb(137, 180, 250));
    }

    #[test]
    fn test_resolve_custom_overrides() {
        let config = ThemeConfig {
            scheme: Some("custom".to_string()),
            custom: Some(ThemeColorsConfig {
                tree_bg: Some("#1a1b26".to_string()),
                tag_fg: Some("#c0caf5".to_string()),
                match_fg: Some("#zzzzzz".to_string()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.tree_bg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.tag_fg, Color::Rgb(192, 202, 245));
        // Invalid hex keeps the dark default.
        assert_eq!(theme.match_fg, dark_theme().match_fg);
        assert_eq!(theme.tree_folder_fg, Color::Rgb(137, 180, 250));
    }
}
