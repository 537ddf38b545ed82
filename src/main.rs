mod api;
mod app;
mod components;
mod config;
mod docs;
mod error;
mod event;
mod handler;
mod ingest;
mod logging;
mod theme;
mod tui;
mod ui;
mod upload;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use crate::app::App;
use crate::config::{AppConfig, LoggingConfig, ServerConfig, ThemeConfig, TreeConfig};
use crate::event::EventHandler;
use crate::tui::{install_panic_hook, Tui};

/// Terminal navigator for a document-retrieval server.
#[derive(Parser, Debug)]
#[command(name = "dn", version, about)]
struct Cli {
    /// Base URL of the document server (e.g. http://localhost:8000)
    #[arg(long, short)]
    server: Option<String>,

    /// Path to a config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Color scheme: dark or light
    #[arg(long)]
    theme: Option<String>,

    /// Use plain markers instead of nerd-font icons
    #[arg(long)]
    no_icons: bool,

    /// Write logs to this file instead of the cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Partial config holding only what was given on the command line.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                base_url: self.server.clone(),
                ..Default::default()
            },
            tree: TreeConfig {
                use_icons: self.no_icons.then_some(false),
                ..Default::default()
            },
            logging: LoggingConfig {
                file: self.log_file.as_ref().map(|p| p.display().to_string()),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let _log_guard = logging::init(&config.log_file(), config.log_level())?;
    info!(server = config.base_url(), "starting");

    install_panic_hook();

    let mut app = App::new(&config)?;
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let event_tx = events.sender();

    handler::spawn_reload(&mut app, &event_tx);
    handler::spawn_tags(&app, &event_tx);

    let result = run(&mut app, &mut tui, &mut events, &event_tx).await;
    tui.restore()?;
    if let Err(e) = &result {
        error!(error = %e, "event loop stopped");
    }
    info!("exiting");
    result
}

async fn run(
    app: &mut App,
    tui: &mut Tui,
    events: &mut EventHandler,
    event_tx: &tokio::sync::mpsc::UnboundedSender<event::Event>,
) -> error::Result<()> {
    loop {
        tui.draw(app)?;
        let event = events.next().await?;
        handler::handle_event(app, event, event_tx);
        if app.should_quit {
            return Ok(());
        }
    }
}
