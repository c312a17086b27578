use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    // Title / header
    let header = Paragraph::new("cardiffwaste – bin collection sensors")
        .block(Block::default().borders(Borders::ALL).title("Cardiff Waste"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.screen {
        Screen::Entries => draw_entries(frame, app, *content_area),
        Screen::Postcode => draw_postcode(frame, app, *content_area),
        Screen::AddressPicker => draw_address_picker(frame, app, *content_area),
        Screen::Collections => draw_collections(frame, app, *content_area),
        Screen::Options => draw_options(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Entries => "↑/↓ move · Enter open · a add property · x remove · q/Ctrl-C quit",
        Screen::Postcode => "Type a postcode · Enter search · Esc back · Ctrl-C quit",
        Screen::AddressPicker => "↑/↓ move · Enter select address · Esc back · q/Ctrl-C quit",
        Screen::Collections => {
            "o options · r refresh · d diagnostics · Esc/←/b back · q/Ctrl-C quit"
        }
        Screen::Options => "↑/↓ move · Space toggle · Enter apply · Esc cancel · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(msg) = &app.status_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_entries(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let prefix = if idx == app.entry_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{} ({})", entry.title, entry.uprn.redacted()))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Configured properties (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.entries.is_empty() {
        state.select(Some(app.entry_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_postcode(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(0),    // hint
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, hint_area] = chunks else {
        return;
    };

    let input = Paragraph::new(app.postcode_input.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Postcode (e.g. CF10 1AA)"),
    );
    frame.render_widget(input, *input_area);

    let hint = Paragraph::new(
        "Enter the postcode of the property to track.\n\
         Matched addresses are shown on the next step.",
    )
    .block(Block::default().borders(Borders::ALL).title("Add property"))
    .wrap(Wrap { trim: true });
    frame.render_widget(hint, *hint_area);
}

fn draw_address_picker(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let matches = app
        .wizard
        .as_ref()
        .map(|wizard| wizard.matches())
        .unwrap_or_default();

    let items = matches
        .iter()
        .enumerate()
        .map(|(idx, address)| {
            let prefix = if idx == app.address_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", address.label))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select your address (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !matches.is_empty() {
        state.select(Some(app.address_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_collections(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = app
        .selected_entry_details()
        .map_or_else(|| "Collections".to_owned(), |entry| entry.title.clone());

    let rows = app
        .sensors
        .iter()
        .map(|sensor| {
            let date = sensor
                .value
                .map_or_else(|| "—".to_owned(), |date| date.format("%a %d %b %Y").to_string());
            let label = sensor
                .attributes
                .collection_type
                .clone()
                .unwrap_or_default();
            let freshness = if sensor.stale { "stale" } else { "" };
            Row::new(vec![
                Cell::from(sensor.name.clone()),
                Cell::from(date),
                Cell::from(label),
                Cell::from(freshness).style(Style::default().fg(Color::Yellow)),
            ])
        })
        .collect::<Vec<Row<'_>>>();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["Sensor", "Next date", "Round", ""])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

fn draw_options(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let toggles: &[_] = app
        .options_form
        .as_ref()
        .map_or(&[], |form| form.toggles());

    let items = toggles
        .iter()
        .enumerate()
        .map(|(idx, (kind, enabled))| {
            let cursor = if idx == app.options_index { "> " } else { "  " };
            let mark = if *enabled { "[x]" } else { "[ ]" };
            ListItem::new(format!("{cursor}{mark} {}", kind.display_name()))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Enabled collections (Space toggle, Enter apply)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !toggles.is_empty() {
        state.select(Some(app.options_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
