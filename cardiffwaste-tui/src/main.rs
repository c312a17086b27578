//! Terminal UI for configuring properties and viewing waste collection sensors.

mod app;
mod input;
mod ui;

use std::{fs, io, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cardiffwaste_client::CardiffWasteClient;
use cardiffwaste_core::{
    mock::MockClient,
    model::{AddressMatch, CollectionKind, CollectionRecord, CollectionsSnapshot, Uprn},
    ports::WasteClient,
    service::{ServiceError, WasteService},
    storage::EntryStore,
};

use crate::app::{App, Screen};
use crate::input::Action;

const DEFAULT_STORE_PATH: &str = "cardiffwaste-entries.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr and stay quiet unless RUST_LOG is set.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let demo_mode = std::env::args().any(|arg| arg == "--demo");
    let client: Arc<dyn WasteClient> = if demo_mode {
        Arc::new(demo_client().await)
    } else {
        let http = Client::builder()
            .user_agent("cardiffwaste/0.1")
            .timeout(StdDuration::from_secs(10))
            .build()?;
        Arc::new(CardiffWasteClient::new(http))
    };

    let store_path = std::env::var("CARDIFFWASTE_STORE")
        .unwrap_or_else(|_| DEFAULT_STORE_PATH.to_owned());
    let service = Arc::new(WasteService::new(client, Some(EntryStore::new(store_path))));

    let restored = service.restore().await?;
    info!(restored, demo_mode, "service ready");

    // App state
    let entries = service.entries().await;
    let app = App::new(Arc::clone(&service), entries);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::SubmitPostcode => submit_postcode(terminal, &mut app).await?,
                Action::ChooseAddress => choose_address(terminal, &mut app).await?,
                Action::OpenCollections => open_collections(&mut app).await,
                Action::ApplyOptions => apply_options(&mut app).await,
                Action::RefreshEntry => refresh_entry(terminal, &mut app).await?,
                Action::DumpDiagnostics => dump_diagnostics(&mut app).await,
                Action::RemoveEntry => remove_entry(&mut app).await,
            }
        }
    }

    Ok(())
}

async fn submit_postcode(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let postcode = app.postcode_input.trim().to_owned();
    if postcode.is_empty() {
        app.error_message = Some("Type a postcode, then press Enter".into());
        return Ok(());
    }
    if app.wizard.is_none() {
        app.wizard = Some(app.service.create_wizard());
    }

    app.is_loading = true;
    app.error_message = None;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let outcome = match app.wizard.as_mut() {
        Some(wizard) => wizard.submit_postcode(&postcode).await,
        None => return Ok(()),
    };

    app.is_loading = false;
    app.address_list_index = 0;
    app.handle_wizard_outcome(outcome);
    Ok(())
}

async fn choose_address(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let index = app.address_list_index;
    let existing = app.service.entries().await;

    app.is_loading = true;
    app.error_message = None;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let outcome = match app.wizard.as_mut() {
        Some(wizard) => wizard.choose_address(index, &existing).await,
        None => return Ok(()),
    };

    app.is_loading = false;
    let Some(entry) = app.handle_wizard_outcome(outcome) else {
        return Ok(());
    };

    let entry_id = entry.entry_id.clone();
    let title = entry.title.clone();
    match app.service.add_entry(entry).await {
        Ok(()) => {
            app.wizard = None;
            app.entries = app.service.entries().await;
            app.selected_entry = Some(entry_id.clone());
            app.sensors = app.service.sensor_views(&entry_id).await.unwrap_or_default();
            app.status_message = Some(format!("Added {title}"));
            app.screen = Screen::Collections;
        }
        Err(ServiceError::DuplicateUprn) => {
            app.error_message = Some("This property is already configured".into());
        }
        Err(err) => {
            app.error_message = Some(format!("Failed to add property: {err}"));
        }
    }
    Ok(())
}

async fn open_collections(app: &mut App) {
    let Some(entry) = app.current_list_entry() else {
        app.error_message = Some("No property selected".into());
        return;
    };
    let entry_id = entry.entry_id.clone();

    match app.service.sensor_views(&entry_id).await {
        Ok(sensors) => {
            app.sensors = sensors;
            app.selected_entry = Some(entry_id);
            app.error_message = None;
            app.screen = Screen::Collections;
        }
        Err(err) => {
            app.error_message = Some(format!("Failed to load sensors: {err}"));
        }
    }
}

async fn apply_options(app: &mut App) {
    let Some(entry_id) = app.selected_entry.clone() else {
        return;
    };
    let Some(form) = app.options_form.take() else {
        return;
    };

    match app.service.update_options(&entry_id, form.into_options()).await {
        Ok(()) => {
            app.entries = app.service.entries().await;
            app.sensors = app.service.sensor_views(&entry_id).await.unwrap_or_default();
            app.status_message = Some("Options applied".into());
            app.screen = Screen::Collections;
        }
        Err(err) => {
            app.error_message = Some(format!("Failed to apply options: {err}"));
        }
    }
}

async fn refresh_entry(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let Some(entry_id) = app.selected_entry.clone() else {
        return Ok(());
    };

    app.is_loading = true;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let result = app.service.refresh_entry(&entry_id, true).await;
    app.is_loading = false;
    match result {
        Ok(()) => {
            app.status_message = Some("Collections refreshed".into());
            app.error_message = None;
        }
        Err(err) => {
            app.error_message = Some(format!("Refresh failed: {err}"));
        }
    }
    app.sensors = app.service.sensor_views(&entry_id).await.unwrap_or_default();
    Ok(())
}

async fn dump_diagnostics(app: &mut App) {
    let Some(entry_id) = app.selected_entry.clone() else {
        return;
    };

    let diagnostics = match app.service.diagnostics(&entry_id).await {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            app.error_message = Some(format!("Diagnostics failed: {err}"));
            return;
        }
    };

    let path = format!("cardiffwaste-diagnostics-{entry_id}.json");
    let rendered = match serde_json::to_string_pretty(&diagnostics) {
        Ok(rendered) => rendered,
        Err(err) => {
            app.error_message = Some(format!("Diagnostics failed: {err}"));
            return;
        }
    };
    match fs::write(&path, rendered) {
        Ok(()) => {
            app.status_message = Some(format!("Diagnostics written to {path}"));
            app.error_message = None;
        }
        Err(err) => {
            app.error_message = Some(format!("Failed to write {path}: {err}"));
        }
    }
}

async fn remove_entry(app: &mut App) {
    let Some(entry) = app.current_list_entry() else {
        return;
    };
    let entry_id = entry.entry_id.clone();

    match app.service.remove_entry(&entry_id).await {
        Ok(removed) => {
            app.entries = app.service.entries().await;
            if app.entry_list_index >= app.entries.len() && app.entry_list_index > 0 {
                app.entry_list_index -= 1;
            }
            app.status_message = Some(format!("Removed {}", removed.title));
            if app.entries.is_empty() {
                app.start_wizard();
            }
        }
        Err(err) => {
            app.error_message = Some(format!("Failed to remove property: {err}"));
        }
    }
}

/// Canned client for `--demo`: one Cardiff address with a full schedule.
async fn demo_client() -> MockClient {
    let client = MockClient::new();
    client
        .set_matches(vec![AddressMatch {
            uprn: Uprn::new("100100123456"),
            label: "12 Working Street, Cardiff, CF10 1AA".to_owned(),
        }])
        .await;

    let today = chrono::Local::now().date_naive();
    let records = CollectionKind::ALL
        .into_iter()
        .zip(1i64..)
        .map(|(kind, offset)| CollectionRecord {
            kind,
            date: today + chrono::Duration::days(offset),
            type_label: kind.display_name(),
            image_url: format!("https://example.invalid/{}.png", kind.slug()),
        })
        .collect();
    client
        .set_snapshot(CollectionsSnapshot::from_records(records))
        .await;
    client
}
