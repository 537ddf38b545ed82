//! Key handling per mode and the background tasks it starts.
//!
//! Every network call and directory walk runs on its own tokio task and
//! reports back through the event channel; state is only touched here, on
//! the event loop.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::api::types::UpdateDocumentRequest;
use crate::app::{App, AppMode, DialogKind, StatusLevel};
use crate::docs::model::NodeId;
use crate::error::AppError;
use crate::event::{ActionOutcome, Event};
use crate::ingest::walker;
use crate::upload;

/// Dispatch one event from the channel.
pub fn handle_event(app: &mut App, event: Event, tx: &UnboundedSender<Event>) {
    match event {
        Event::Key(key) => handle_key_event(app, key, tx),
        Event::Tick => app.clear_expired_status(),
        Event::Resize(_, _) => {}
        Event::TreeLoaded { ticket, result } => {
            app.apply_tree(ticket, result);
        }
        Event::DetailLoaded { id, result } => app.apply_detail(id, result),
        Event::ChildrenSummaryLoaded { id, result } => app.apply_children_summary(id, result),
        Event::TagsLoaded(result) => app.apply_tags(result),
        Event::TagCreated(result) => app.apply_tag_created(result),
        Event::Ingested { ticket, result } => {
            app.apply_ingested(ticket, result);
        }
        Event::UploadComplete(result) => {
            if app.apply_upload(result) {
                spawn_reload(app, tx);
            }
        }
        Event::ActionComplete(result) => {
            if app.apply_action(result) {
                spawn_reload(app, tx);
            }
        }
    }
}

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent, tx: &UnboundedSender<Event>) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key, tx),
        AppMode::Search => handle_search_mode(app, key),
        AppMode::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter
            ) {
                app.mode = AppMode::Normal;
            }
        }
        AppMode::Dialog(kind) => handle_dialog_mode(app, kind, key, tx),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<Event>) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('l') | KeyCode::Right => app.tree.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.tree.collapse_selected(),
        KeyCode::Enter => app.tree.toggle_selected(),
        KeyCode::Char(' ') => {
            if let Some(id) = app.toggle_select_cursor() {
                spawn_detail(app, id, tx);
            }
        }
        KeyCode::Esc => {
            if app.tree.is_filtering() {
                app.leave_filter();
            } else {
                app.clear_selection();
            }
        }
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('R') => {
            spawn_reload(app, tx);
            spawn_tags(app, tx);
        }
        KeyCode::Char('n') => app.open_dialog(DialogKind::CreateFolder),
        KeyCode::Char('r') => app.open_rename(),
        KeyCode::Char('d') => {
            if let Some(id) = app.open_delete() {
                spawn_children_summary(app, id, tx);
            }
        }
        KeyCode::Char('t') => app.open_dialog(DialogKind::CreateTag),
        KeyCode::Char('u') => app.open_dialog(DialogKind::UploadPath),
        KeyCode::Char('?') => app.mode = AppMode::Help,
        _ => {}
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Char(c) => app.search_input_char(c),
        _ => {}
    }
}

fn handle_dialog_mode(app: &mut App, kind: DialogKind, key: KeyEvent, tx: &UnboundedSender<Event>) {
    match kind {
        DialogKind::CreateFolder
        | DialogKind::Rename { .. }
        | DialogKind::CreateTag
        | DialogKind::UploadPath => handle_input_dialog(app, kind, key, tx),
        DialogKind::DeleteConfirm { id, name, .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                app.close_dialog();
                spawn_delete(app, id, name, tx);
            }
            KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::UploadPreview => handle_upload_preview(app, key, tx),
        DialogKind::Error { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                app.close_dialog();
            }
        }
    }
}

fn handle_input_dialog(
    app: &mut App,
    kind: DialogKind,
    key: KeyEvent,
    tx: &UnboundedSender<Event>,
) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => submit_input_dialog(app, kind, tx),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

/// Validate the dialog input and start the matching request. Validation
/// errors keep the dialog open.
fn submit_input_dialog(app: &mut App, kind: DialogKind, tx: &UnboundedSender<Event>) {
    match kind {
        DialogKind::CreateFolder => match app.create_folder_request() {
            Ok(req) => {
                app.close_dialog();
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = client.create_folder(&req).await.map(|id| ActionOutcome {
                        message: format!("Created folder \"{}\"", req.name),
                        reveal: id,
                    });
                    let _ = tx.send(Event::ActionComplete(result));
                });
            }
            Err(e) => app.set_error(&e),
        },
        DialogKind::Rename { .. } => match app.rename_plan() {
            Ok(plan) => {
                app.close_dialog();
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = async {
                        let description = match plan.description {
                            Some(known) => known,
                            None => client
                                .fetch_detail(plan.id)
                                .await?
                                .description
                                .unwrap_or_default(),
                        };
                        let body = UpdateDocumentRequest {
                            name: plan.name.clone(),
                            description,
                            tag_ids: Some(plan.tag_ids),
                        };
                        client.update_document(plan.id, &body).await?;
                        Ok::<_, AppError>(ActionOutcome {
                            message: format!("Renamed to \"{}\"", plan.name),
                            reveal: Some(plan.id),
                        })
                    }
                    .await;
                    let _ = tx.send(Event::ActionComplete(result));
                });
            }
            Err(e) => app.set_error(&e),
        },
        DialogKind::CreateTag => match app.create_tag_request() {
            Ok(req) => {
                app.close_dialog();
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = client.create_tag(&req).await;
                    let _ = tx.send(Event::TagCreated(result));
                });
            }
            Err(e) => app.set_error(&e),
        },
        DialogKind::UploadPath => match app.upload_path() {
            Ok(path) => {
                let ticket = app.begin_ingest(path.clone());
                let (batch_size, max_depth) = (app.batch_size, app.max_depth);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = walker::ingest_path(&path, batch_size, max_depth).await;
                    let _ = tx.send(Event::Ingested { ticket, result });
                });
            }
            Err(e) => app.set_error(&e),
        },
        _ => {}
    }
}

fn handle_upload_preview(app: &mut App, key: KeyEvent, tx: &UnboundedSender<Event>) {
    if app.upload.in_flight {
        return;
    }
    match key.code {
        KeyCode::Esc => {
            app.upload = Default::default();
            app.close_dialog();
        }
        KeyCode::Char('f') => app.toggle_folder_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.upload.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.upload.scroll_up(),
        KeyCode::Char(c @ '1'..='9') => app.toggle_upload_tag(c as usize - '1' as usize),
        KeyCode::Enter => match app.upload_request() {
            Ok(request) => {
                app.upload.in_flight = true;
                app.set_status(
                    format!("Uploading {} file(s)…", request.files.len()),
                    StatusLevel::Info,
                );
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = upload::submit(&client, &request).await;
                    let _ = tx.send(Event::UploadComplete(result));
                });
            }
            Err(e) => app.set_error(&e),
        },
        _ => {}
    }
}

// ── Background tasks ─────────────────────────────────────────────────────────

/// Fetch the tree under a fresh ticket.
pub fn spawn_reload(app: &mut App, tx: &UnboundedSender<Event>) {
    let ticket = app.begin_reload();
    info!(ticket, "reloading tree");
    let client = app.client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_tree().await;
        let _ = tx.send(Event::TreeLoaded { ticket, result });
    });
}

pub fn spawn_tags(app: &App, tx: &UnboundedSender<Event>) {
    let client = app.client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Event::TagsLoaded(client.list_tags().await));
    });
}

fn spawn_detail(app: &App, id: NodeId, tx: &UnboundedSender<Event>) {
    let client = app.client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_detail(id).await;
        let _ = tx.send(Event::DetailLoaded { id, result });
    });
}

fn spawn_children_summary(app: &App, id: NodeId, tx: &UnboundedSender<Event>) {
    let client = app.client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_children_summary(id).await;
        let _ = tx.send(Event::ChildrenSummaryLoaded { id, result });
    });
}

fn spawn_delete(app: &mut App, id: NodeId, name: String, tx: &UnboundedSender<Event>) {
    debug!(id, "deleting node");
    if app.selection.selected_id() == Some(id) {
        app.clear_selection();
    }
    let client = app.client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.delete_document(id).await.map(|_| ActionOutcome {
            message: format!("Deleted \"{}\"", name),
            reveal: None,
        });
        let _ = tx.send(Event::ActionComplete(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::docs::index::tests::sample_tree;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (App, UnboundedSender<Event>, mpsc::UnboundedReceiver<Event>) {
        let mut app = App::new(&AppConfig::default()).unwrap();
        let ticket = app.begin_reload();
        app.apply_tree(ticket, Ok(sample_tree()));
        let (tx, rx) = mpsc::unbounded_channel();
        (app, tx, rx)
    }

    #[tokio::test]
    async fn navigation_keys_move_cursor() {
        let (mut app, tx, _rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('j')), &tx);
        assert_eq!(app.tree.cursor, 1);
        handle_key_event(&mut app, key(KeyCode::Char('k')), &tx);
        assert_eq!(app.tree.cursor, 0);
        handle_key_event(&mut app, key(KeyCode::Char('l')), &tx);
        assert!(app.tree.is_expanded(1));
    }

    #[tokio::test]
    async fn search_mode_round_trip() {
        let (mut app, tx, _rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('/')), &tx);
        for c in "readme".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)), &tx);
        }
        // 'q' while typing is text, not quit.
        handle_key_event(&mut app, key(KeyCode::Char('q')), &tx);
        assert!(!app.should_quit);
        assert_eq!(app.tree.filter_input, "readmeq");
        assert!(app.tree.no_results_hint().is_some());

        handle_key_event(&mut app, key(KeyCode::Backspace), &tx);
        handle_key_event(&mut app, key(KeyCode::Enter), &tx);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.tree.flat_items.len(), 1);

        handle_key_event(&mut app, key(KeyCode::Esc), &tx);
        assert!(!app.tree.is_filtering());
    }

    #[tokio::test]
    async fn empty_folder_name_keeps_dialog_open() {
        let (mut app, tx, mut rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('n')), &tx);
        handle_key_event(&mut app, key(KeyCode::Enter), &tx);
        assert_eq!(app.mode, AppMode::Dialog(DialogKind::CreateFolder));
        assert!(rx.try_recv().is_err());
        let (msg, level, _) = app.status_message.as_ref().unwrap();
        assert_eq!(*level, StatusLevel::Error);
        assert_eq!(msg, "Folder name cannot be empty");
    }

    #[tokio::test]
    async fn empty_upload_path_is_rejected() {
        let (mut app, tx, _rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('u')), &tx);
        handle_key_event(&mut app, key(KeyCode::Enter), &tx);
        assert_eq!(app.mode, AppMode::Dialog(DialogKind::UploadPath));
    }

    #[tokio::test]
    async fn upload_path_ingests_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "b").unwrap();

        let (mut app, tx, mut rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('u')), &tx);
        for c in dir.path().display().to_string().chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)), &tx);
        }
        handle_key_event(&mut app, key(KeyCode::Enter), &tx);

        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event, &tx);
        assert_eq!(app.mode, AppMode::Dialog(DialogKind::UploadPreview));
        assert_eq!(app.upload.files.len(), 2);
        assert!(app.upload.folder_mode);

        handle_key_event(&mut app, key(KeyCode::Char('f')), &tx);
        assert!(!app.upload.folder_mode);
        handle_key_event(&mut app, key(KeyCode::Esc), &tx);
        assert!(app.upload.files.is_empty());
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[tokio::test]
    async fn stale_tree_event_is_ignored() {
        let (mut app, tx, _rx) = setup();
        let old = app.begin_reload();
        let _new = app.begin_reload();
        handle_event(
            &mut app,
            Event::TreeLoaded {
                ticket: old,
                result: Ok(Vec::new()),
            },
            &tx,
        );
        assert_eq!(app.tree.index.len(), 7);
        assert!(app.loading);
    }

    #[tokio::test]
    async fn help_opens_and_closes() {
        let (mut app, tx, _rx) = setup();
        handle_key_event(&mut app, key(KeyCode::Char('?')), &tx);
        assert_eq!(app.mode, AppMode::Help);
        handle_key_event(&mut app, key(KeyCode::Esc), &tx);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_any_mode() {
        let (mut app, tx, _rx) = setup();
        app.start_search();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &tx,
        );
        assert!(app.should_quit);
    }
}
