use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::docs::model::{ChildrenSummary, Node, NodeDetail, NodeId, Tag};
use crate::error::{AppError, Result};
use crate::ingest::walker::IngestReport;
use crate::ingest::IngestedFile;
use crate::upload::UploadOutcome;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// A tree fetch finished. Only the newest ticket is applied.
    TreeLoaded {
        ticket: u64,
        result: Result<Vec<Node>>,
    },
    DetailLoaded {
        id: NodeId,
        result: Result<NodeDetail>,
    },
    ChildrenSummaryLoaded {
        id: NodeId,
        result: Result<ChildrenSummary>,
    },
    TagsLoaded(Result<Vec<Tag>>),
    TagCreated(Result<Tag>),
    /// Local directory ingestion finished. Only the newest ticket is applied.
    Ingested {
        ticket: u64,
        result: Result<(Vec<IngestedFile>, IngestReport)>,
    },
    UploadComplete(Result<UploadOutcome>),
    /// A create/rename/delete request finished; success carries the status
    /// text and the node to reveal after reloading.
    ActionComplete(Result<ActionOutcome>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub message: String,
    pub reveal: Option<NodeId>,
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::task::spawn_blocking(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => continue,
                }
            } else {
                Event::Tick
            };
            if event_tx.send(event).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Sender clone for background tasks to report completion.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (waits until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("Event channel closed".into()))
    }
}
