//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--server`, `--theme`, etc.)
//! 2. `$DOCNAV_CONFIG` environment variable (path to config file)
//! 3. Project-local `.docnav.toml` in the current working directory
//! 4. Global `~/.config/docnav/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::ingest::source::DEFAULT_BATCH_SIZE;
use crate::ingest::walker::DEFAULT_MAX_DEPTH;

// ── Section configs ──────────────────────────────────────────────────────────

/// Document server connection.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
    /// Show tag badges next to node names.
    pub show_tags: Option<bool>,
}

/// Upload defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UploadConfig {
    /// Description attached to every upload.
    pub description: Option<String>,
    /// Directory entries read per batch while ingesting.
    pub batch_size: Option<usize>,
    /// Deepest directory level ingested below the picked root.
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `DOCNAV_LOG` is unset.
    pub level: Option<String>,
    pub file: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_folder_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub match_fg: Option<String>,
    pub tag_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tree: TreeConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("DOCNAV_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".docnav.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("docnav").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                base_url: other.server.base_url.clone().or(self.server.base_url),
                timeout_secs: other.server.timeout_secs.or(self.server.timeout_secs),
            },
            tree: TreeConfig {
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
                show_tags: other.tree.show_tags.or(self.tree.show_tags),
            },
            upload: UploadConfig {
                description: other
                    .upload
                    .description
                    .clone()
                    .or(self.upload.description),
                batch_size: other.upload.batch_size.or(self.upload.batch_size),
                max_depth: other.upload.max_depth.or(self.upload.max_depth),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                file: other.logging.file.clone().or(self.logging.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so later sources overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn base_url(&self) -> &str {
        self.server.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    pub fn show_tags(&self) -> bool {
        self.tree.show_tags.unwrap_or(true)
    }

    pub fn upload_description(&self) -> &str {
        self.upload.description.as_deref().unwrap_or("")
    }

    pub fn batch_size(&self) -> usize {
        self.upload.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    pub fn max_depth(&self) -> usize {
        self.upload.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log file path; `<cache dir>/docnav/docnav.log` unless configured.
    pub fn log_file(&self) -> PathBuf {
        match &self.logging.file {
            Some(file) => PathBuf::from(file),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("docnav")
                .join("docnav.log"),
        }
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.base_url(), "http://127.0.0.1:8000");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(cfg.use_icons());
        assert!(cfg.show_tags());
        assert_eq!(cfg.upload_description(), "");
        assert_eq!(cfg.batch_size(), 64);
        assert_eq!(cfg.max_depth(), 64);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.log_file().ends_with("docnav/docnav.log"));
        assert_eq!(cfg.theme_scheme(), "dark");
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[server]
base_url = "http://docs.internal:9000"
timeout_secs = 5

[tree]
use_icons = false
show_tags = false

[upload]
description = "imported"
batch_size = 16
max_depth = 8

[logging]
level = "debug"
file = "/tmp/dn.log"

[theme]
scheme = "light"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.base_url(), "http://docs.internal:9000");
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert!(!cfg.use_icons());
        assert!(!cfg.show_tags());
        assert_eq!(cfg.upload_description(), "imported");
        assert_eq!(cfg.batch_size(), 16);
        assert_eq!(cfg.max_depth(), 8);
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.log_file(), PathBuf::from("/tmp/dn.log"));
        assert_eq!(cfg.theme_scheme(), "light");
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[server]
base_url = "http://localhost:1234"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.base_url(), "http://localhost:1234");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.batch_size(), 64);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let cfg: AppConfig = toml::from_str("[upload]\nbatch_size = 0").expect("parse failed");
        assert_eq!(cfg.batch_size(), 1);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            server: ServerConfig {
                base_url: Some("http://a".into()),
                timeout_secs: Some(10),
            },
            ..Default::default()
        };
        let over = AppConfig {
            server: ServerConfig {
                base_url: Some("http://b".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.base_url(), "http://b");
        assert_eq!(merged.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            upload: UploadConfig {
                batch_size: Some(8),
                max_depth: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert_eq!(merged.batch_size(), 8);
        assert_eq!(merged.max_depth(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[server]
timeout_secs = 3

[tree]
show_tags = false
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.timeout(), Duration::from_secs(3));
        assert!(!cfg.show_tags());
        assert!(cfg.use_icons());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[server]
base_url = "http://from-file"
timeout_secs = 12
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            server: ServerConfig {
                base_url: Some("http://from-cli".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.base_url(), "http://from-cli");
        assert_eq!(cfg.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_theme_custom_colors() {
        let toml = r##"
[theme]
scheme = "custom"

[theme.custom]
tree_bg = "#1a1b26"
match_fg = "#e0af68"
"##;
        let cfg: AppConfig = toml::from_str(toml).expect("parse");
        assert_eq!(cfg.theme_scheme(), "custom");
        let custom = cfg.theme.custom.as_ref().expect("custom present");
        assert_eq!(custom.tree_bg.as_deref(), Some("#1a1b26"));
        assert_eq!(custom.match_fg.as_deref(), Some("#e0af68"));
        assert!(custom.dialog_bg.is_none());
    }
}
