//! Multi-step configuration wizard and the post-setup options form.

use std::sync::Arc;

use tracing::{debug, error};

use crate::entry::{CollectionOptions, ConfigEntry};
use crate::model::{AddressMatch, CollectionKind};
use crate::ports::{ClientError, WasteClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Steps a user can be on during setup.
pub enum FlowStep {
    /// Asking for a postcode.
    Postcode,
    /// Picking one of the matched addresses.
    AddressPicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Scoped error codes re-rendered with the current form.
pub enum FlowError {
    /// The address lookup timed out.
    Timeout,
    /// The postcode matched no addresses.
    NoMatch,
    /// The selected address failed identifier validation.
    InvalidUprn,
    /// Anything unexpected.
    Unknown,
}

impl FlowError {
    /// Stable code for the error, as shown in diagnostics and logs.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NoMatch => "no_match",
            Self::InvalidUprn => "invalid_uprn",
            Self::Unknown => "unknown",
        }
    }

    /// Human wording for form rendering.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Timeout => "The address lookup timed out, try again",
            Self::NoMatch => "No addresses found for that postcode",
            Self::InvalidUprn => "The council does not recognise that address",
            Self::Unknown => "Something went wrong, try again",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reasons the wizard refuses to create an entry.
pub enum AbortReason {
    /// The property already has a configured entry.
    AlreadyConfigured,
}

impl AbortReason {
    /// Stable code for the abort reason.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyConfigured => "already_configured",
        }
    }
}

#[derive(Debug)]
/// Result of driving the wizard one step forward.
pub enum FlowOutcome {
    /// Render (or re-render) a form, optionally with a scoped error.
    Form {
        /// Step to render.
        step: FlowStep,
        /// Error from the previous submission, if any.
        error: Option<FlowError>,
    },
    /// Terminal state: a new entry was created.
    Created(ConfigEntry),
    /// Terminal state: entry creation was refused.
    Abort(AbortReason),
}

/// Interactive setup flow: postcode search, address picker, UPRN validation.
///
/// Client failures never escape a step; they re-render the current form with
/// a [`FlowError`] instead.
pub struct ConfigWizard {
    client: Arc<dyn WasteClient>,
    matches: Vec<AddressMatch>,
}

impl ConfigWizard {
    /// Start a fresh wizard against the given client.
    #[must_use]
    pub fn new(client: Arc<dyn WasteClient>) -> Self {
        Self {
            client,
            matches: Vec::new(),
        }
    }

    /// Initial form shown to the user.
    #[must_use]
    pub fn start(&self) -> FlowOutcome {
        FlowOutcome::Form {
            step: FlowStep::Postcode,
            error: None,
        }
    }

    /// Addresses matched by the last successful postcode search.
    #[must_use]
    pub fn matches(&self) -> &[AddressMatch] {
        &self.matches
    }

    /// Search for addresses and advance to the picker step.
    pub async fn submit_postcode(&mut self, postcode: &str) -> FlowOutcome {
        match self.client.address_search(postcode.trim()).await {
            Ok(matches) => {
                self.matches = matches;
                FlowOutcome::Form {
                    step: FlowStep::AddressPicker,
                    error: None,
                }
            }
            Err(ClientError::Timeout) => {
                debug!("timed out trying to look up addresses");
                FlowOutcome::Form {
                    step: FlowStep::Postcode,
                    error: Some(FlowError::Timeout),
                }
            }
            Err(ClientError::EmptyMatches) => {
                debug!("no matches for address search");
                FlowOutcome::Form {
                    step: FlowStep::Postcode,
                    error: Some(FlowError::NoMatch),
                }
            }
            Err(err) => {
                error!(error = %err, "unexpected error during address search");
                FlowOutcome::Form {
                    step: FlowStep::Postcode,
                    error: Some(FlowError::Unknown),
                }
            }
        }
    }

    /// Validate the picked address and create the entry.
    ///
    /// `existing` is consulted for duplicate detection; a UPRN that already
    /// has an entry aborts the flow.
    pub async fn choose_address(
        &mut self,
        index: usize,
        existing: &[ConfigEntry],
    ) -> FlowOutcome {
        let Some(address) = self.matches.get(index).cloned() else {
            return FlowOutcome::Form {
                step: FlowStep::AddressPicker,
                error: Some(FlowError::Unknown),
            };
        };

        debug!(uprn = %address.uprn.redacted(), "validating uprn");
        match self.client.check_valid_uprn(&address.uprn).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(uprn = %address.uprn.redacted(), "uprn is invalid");
                return FlowOutcome::Form {
                    step: FlowStep::AddressPicker,
                    error: Some(FlowError::InvalidUprn),
                };
            }
            Err(err) => {
                error!(
                    uprn = %address.uprn.redacted(),
                    error = %err,
                    "unexpected error during uprn validation"
                );
                return FlowOutcome::Form {
                    step: FlowStep::AddressPicker,
                    error: Some(FlowError::Unknown),
                };
            }
        }

        if existing.iter().any(|entry| entry.uprn == address.uprn) {
            debug!(
                uprn = %address.uprn.redacted(),
                "property already configured, aborting"
            );
            return FlowOutcome::Abort(AbortReason::AlreadyConfigured);
        }

        let title = address.short_title().to_owned();
        FlowOutcome::Created(ConfigEntry::new(title, address.uprn))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Single-step options form seeded from an entry's current toggles.
pub struct OptionsForm {
    toggles: Vec<(CollectionKind, bool)>,
}

impl OptionsForm {
    /// Seed the form from the entry's current options.
    #[must_use]
    pub fn for_entry(entry: &ConfigEntry) -> Self {
        let toggles = CollectionKind::ALL
            .into_iter()
            .map(|kind| (kind, entry.options.enabled(kind)))
            .collect();
        Self { toggles }
    }

    /// Current toggle rows, in canonical category order.
    #[must_use]
    pub fn toggles(&self) -> &[(CollectionKind, bool)] {
        &self.toggles
    }

    /// Flip one toggle. Out-of-range rows are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some((_, enabled)) = self.toggles.get_mut(index) {
            *enabled = !*enabled;
        }
    }

    /// Submit the form: the result replaces the entry's options wholesale.
    #[must_use]
    pub fn into_options(self) -> CollectionOptions {
        let mut options = CollectionOptions::default();
        for (kind, enabled) in self.toggles {
            options.set_enabled(kind, enabled);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClient, MockFailure};
    use crate::model::Uprn;

    fn cardiff_matches() -> Vec<AddressMatch> {
        vec![AddressMatch {
            uprn: Uprn::new("100100123456"),
            label: "12 Working Street, Cardiff, CF10 1AA".to_owned(),
        }]
    }

    #[tokio::test]
    async fn no_match_keeps_postcode_step() {
        let client = Arc::new(MockClient::new());
        let mut wizard = ConfigWizard::new(client);

        let outcome = wizard.submit_postcode("CF10 1AA").await;
        assert!(matches!(
            outcome,
            FlowOutcome::Form {
                step: FlowStep::Postcode,
                error: Some(FlowError::NoMatch),
            }
        ));
    }

    #[tokio::test]
    async fn timeout_keeps_postcode_step() {
        let client = Arc::new(MockClient::new());
        client.fail_search(Some(MockFailure::Timeout)).await;
        let mut wizard = ConfigWizard::new(client);

        let outcome = wizard.submit_postcode("CF10 1AA").await;
        assert!(matches!(
            outcome,
            FlowOutcome::Form {
                step: FlowStep::Postcode,
                error: Some(FlowError::Timeout),
            }
        ));
    }

    #[tokio::test]
    async fn invalid_uprn_returns_to_picker() {
        let client = Arc::new(MockClient::new());
        client.set_matches(cardiff_matches()).await;
        client.remove_valid_uprn(&Uprn::new("100100123456")).await;
        let mut wizard = ConfigWizard::new(client);

        wizard.submit_postcode("CF10 1AA").await;
        let outcome = wizard.choose_address(0, &[]).await;
        assert!(matches!(
            outcome,
            FlowOutcome::Form {
                step: FlowStep::AddressPicker,
                error: Some(FlowError::InvalidUprn),
            }
        ));
    }

    #[tokio::test]
    async fn duplicate_uprn_aborts() {
        let client = Arc::new(MockClient::new());
        client.set_matches(cardiff_matches()).await;
        let mut wizard = ConfigWizard::new(client);

        let existing = vec![ConfigEntry::new(
            "12 Working Street",
            Uprn::new("100100123456"),
        )];

        wizard.submit_postcode("CF10 1AA").await;
        let outcome = wizard.choose_address(0, &existing).await;
        assert!(matches!(
            outcome,
            FlowOutcome::Abort(AbortReason::AlreadyConfigured)
        ));
    }

    #[tokio::test]
    async fn happy_path_creates_entry_with_defaults() {
        let client = Arc::new(MockClient::new());
        client.set_matches(cardiff_matches()).await;
        let mut wizard = ConfigWizard::new(client);

        let outcome = wizard.submit_postcode("CF10 1AA").await;
        assert!(matches!(
            outcome,
            FlowOutcome::Form {
                step: FlowStep::AddressPicker,
                error: None,
            }
        ));
        assert_eq!(wizard.matches().len(), 1);

        let outcome = wizard.choose_address(0, &[]).await;
        let FlowOutcome::Created(entry) = outcome else {
            panic!("expected entry creation, got {outcome:?}");
        };
        assert_eq!(entry.title, "12 Working Street");
        assert_eq!(entry.uprn, Uprn::new("100100123456"));
        assert_eq!(entry.options, CollectionOptions::defaults());
    }

    #[test]
    fn options_form_replaces_wholesale() {
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));
        let mut form = OptionsForm::for_entry(&entry);

        let glass_row = form
            .toggles()
            .iter()
            .position(|(kind, _)| *kind == CollectionKind::Glass)
            .expect("glass row present");
        form.toggle(glass_row);

        let options = form.into_options();
        assert!(options.enabled(CollectionKind::Glass));
        assert!(options.enabled(CollectionKind::General));
        assert!(!options.enabled(CollectionKind::Hygiene));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(FlowError::Timeout.code(), "timeout");
        assert_eq!(FlowError::NoMatch.code(), "no_match");
        assert_eq!(FlowError::InvalidUprn.code(), "invalid_uprn");
        assert_eq!(FlowError::Unknown.code(), "unknown");
        assert_eq!(AbortReason::AlreadyConfigured.code(), "already_configured");
    }
}
