use std::sync::Arc;

use cardiffwaste_core::{
    entry::ConfigEntry,
    flow::{ConfigWizard, FlowError, FlowOutcome, FlowStep, OptionsForm},
    sensor::SensorView,
    service::WasteService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Entries,
    Postcode,
    AddressPicker,
    Collections,
    Options,
}

pub(crate) struct App {
    pub service: Arc<WasteService>,

    pub screen: Screen,

    pub entries: Vec<ConfigEntry>,
    pub entry_list_index: usize,
    pub selected_entry: Option<String>,

    pub wizard: Option<ConfigWizard>,
    pub postcode_input: String,
    pub address_list_index: usize,

    pub options_form: Option<OptionsForm>,
    pub options_index: usize,

    pub sensors: Vec<SensorView>,

    pub is_loading: bool,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<WasteService>, entries: Vec<ConfigEntry>) -> Self {
        let screen = if entries.is_empty() {
            Screen::Postcode
        } else {
            Screen::Entries
        };
        let wizard = if entries.is_empty() {
            Some(service.create_wizard())
        } else {
            None
        };
        Self {
            service,
            screen,
            entries,
            entry_list_index: 0,
            selected_entry: None,
            wizard,
            postcode_input: String::new(),
            address_list_index: 0,
            options_form: None,
            options_index: 0,
            sensors: Vec::new(),
            is_loading: false,
            status_message: None,
            error_message: None,
        }
    }

    pub(crate) fn start_wizard(&mut self) {
        self.wizard = Some(self.service.create_wizard());
        self.postcode_input.clear();
        self.address_list_index = 0;
        self.error_message = None;
        self.screen = Screen::Postcode;
    }

    /// Full entry record behind the `selected_entry` id, if still loaded.
    pub(crate) fn selected_entry_details(&self) -> Option<&ConfigEntry> {
        let entry_id = self.selected_entry.as_deref()?;
        self.entries.iter().find(|entry| entry.entry_id == entry_id)
    }

    pub(crate) fn current_list_entry(&self) -> Option<&ConfigEntry> {
        self.entries.get(self.entry_list_index)
    }

    /// Move the wizard UI to whatever the flow told us to render.
    ///
    /// Created/Abort outcomes are handled by the caller; this only maps the
    /// re-rendered forms and their error codes.
    pub(crate) fn show_form(&mut self, step: FlowStep, error: Option<FlowError>) {
        self.screen = match step {
            FlowStep::Postcode => Screen::Postcode,
            FlowStep::AddressPicker => Screen::AddressPicker,
        };
        self.error_message = error.map(|code| format!("{} ({})", code.message(), code.code()));
    }

    pub(crate) fn handle_wizard_outcome(&mut self, outcome: FlowOutcome) -> Option<ConfigEntry> {
        match outcome {
            FlowOutcome::Form { step, error } => {
                self.show_form(step, error);
                None
            }
            FlowOutcome::Created(entry) => Some(entry),
            FlowOutcome::Abort(reason) => {
                self.error_message =
                    Some(format!("Setup aborted: {}", reason.code().replace('_', " ")));
                self.wizard = None;
                self.screen = if self.entries.is_empty() {
                    Screen::Postcode
                } else {
                    Screen::Entries
                };
                None
            }
        }
    }
}
