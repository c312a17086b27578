use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run the wizard's postcode search.
    SubmitPostcode,
    /// Validate the highlighted address and create the entry.
    ChooseAddress,
    /// Open the collections view for the highlighted entry.
    OpenCollections,
    /// Apply the options form to the selected entry.
    ApplyOptions,
    /// Force a refresh of the selected entry.
    RefreshEntry,
    /// Write the diagnostics JSON for the selected entry.
    DumpDiagnostics,
    /// Remove the highlighted entry.
    RemoveEntry,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() && app.screen != Screen::Postcode {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Entries => match key.code {
            Up | Char('k') => {
                if app.entry_list_index > 0 {
                    app.entry_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.entry_list_index + 1 < app.entries.len() {
                    app.entry_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                action = Action::OpenCollections;
            }
            Char('a') => {
                app.start_wizard();
            }
            Char('x') => {
                action = Action::RemoveEntry;
            }
            _ => {}
        },

        Screen::Postcode => match key.code {
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.postcode_input.push(character);
                }
            }
            Backspace => {
                app.postcode_input.pop();
            }
            Enter => {
                action = Action::SubmitPostcode;
            }
            Esc => {
                if !app.entries.is_empty() {
                    app.wizard = None;
                    app.screen = Screen::Entries;
                }
            }
            _ => {}
        },

        Screen::AddressPicker => {
            let match_count = app
                .wizard
                .as_ref()
                .map_or(0, |wizard| wizard.matches().len());
            match key.code {
                Up | Char('k') => {
                    if app.address_list_index > 0 {
                        app.address_list_index -= 1;
                    }
                }
                Down | Char('j') => {
                    if app.address_list_index + 1 < match_count {
                        app.address_list_index += 1;
                    }
                }
                Enter | Char(' ') => {
                    action = Action::ChooseAddress;
                }
                Left | Esc => {
                    app.screen = Screen::Postcode;
                    app.error_message = None;
                }
                _ => {}
            }
        }

        Screen::Collections => match key.code {
            Char('o') => {
                let form = app
                    .selected_entry_details()
                    .map(cardiffwaste_core::flow::OptionsForm::for_entry);
                if let Some(form) = form {
                    app.options_form = Some(form);
                    app.options_index = 0;
                    app.screen = Screen::Options;
                }
            }
            Char('r') => {
                action = Action::RefreshEntry;
            }
            Char('d') => {
                action = Action::DumpDiagnostics;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::Entries;
                app.sensors.clear();
                app.selected_entry = None;
            }
            _ => {}
        },

        Screen::Options => {
            let row_count = app
                .options_form
                .as_ref()
                .map_or(0, |form| form.toggles().len());
            match key.code {
                Up | Char('k') => {
                    if app.options_index > 0 {
                        app.options_index -= 1;
                    }
                }
                Down | Char('j') => {
                    if app.options_index + 1 < row_count {
                        app.options_index += 1;
                    }
                }
                Char(' ') => {
                    let row = app.options_index;
                    if let Some(form) = app.options_form.as_mut() {
                        form.toggle(row);
                    }
                }
                Enter => {
                    action = Action::ApplyOptions;
                }
                Left | Esc => {
                    app.options_form = None;
                    app.screen = Screen::Collections;
                }
                _ => {}
            }
        }
    }
    action
}
