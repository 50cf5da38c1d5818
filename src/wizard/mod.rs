//! Wizard state machine - Per-integration step flows.
//!
//! The wizard is either on the integration list or inside exactly one
//! integration's flow. Each flow kind has its own step enum (see [`steps`]);
//! forward moves happen only through explicit [`WizardEvent`]s, backward
//! moves through [`WizardState::back`].
//!
//! Every navigation bumps an epoch. Asynchronous work captures a [`Ticket`]
//! before it starts and applies its result only while the ticket is still
//! current, so results that arrive after the user moved on are dropped.

mod modal;
pub mod steps;


pub use modal::ModalState;
pub use steps::{CredentialStep, FlowStep, OAuthStep, PickerStep, UploadStep};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::events::Banner;
use crate::integration::{FlowKind, IntegrationName};
use crate::upload::{SelectedFile, UploadTracker};

/// User actions that move a flow forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WizardEvent {
    CredentialsAccepted,
    FilesSelected,
    ReviewSubmitted,
    BrowseFinished,
    AddMoreFiles,
}

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view")]
pub enum ActiveFlow {
    IntegrationList,
    Integration {
        id: IntegrationName,
        step: FlowStep,
    },
}

/// Snapshot of the navigation epoch at the start of an async operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum WizardError {
    /// `event` is not legal at `step`.
    InvalidTransition { step: FlowStep, event: WizardEvent },
    /// An event arrived while the list was showing.
    NoActiveIntegration(WizardEvent),
    /// The integration is not among the resolved ones.
    NotEnabled(IntegrationName),
    /// A batch of this flow is still uploading.
    UploadInProgress,
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::InvalidTransition { step, event } => {
                write!(f, "{:?} is not allowed at {:?}", event, step)
            }
            WizardError::NoActiveIntegration(event) => {
                write!(f, "{:?} received with no integration open", event)
            }
            WizardError::NotEnabled(id) => write!(f, "integration {} is not enabled", id),
            WizardError::UploadInProgress => write!(f, "an upload is already in progress"),
        }
    }
}

impl std::error::Error for WizardError {}

/// Transient data of the active flow. Cleared whenever the flow changes.
#[derive(Debug, Default)]
pub struct FormData {
    pub credentials: BTreeMap<String, String>,
    pub selected_files: Vec<SelectedFile>,
    pub folder_name: Option<String>,
    pub banner: Option<Banner>,
    pub oauth_url: Option<String>,
    pub tracker: Arc<UploadTracker>,
}

#[derive(Debug)]
pub struct WizardState {
    flow: ActiveFlow,
    form: FormData,
    epoch: u64,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            flow: ActiveFlow::IntegrationList,
            form: FormData::default(),
            epoch: 0,
        }
    }

    pub fn flow(&self) -> ActiveFlow {
        self.flow
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn active_integration(&self) -> Option<IntegrationName> {
        match self.flow {
            ActiveFlow::Integration { id, .. } => Some(id),
            ActiveFlow::IntegrationList => None,
        }
    }

    pub fn step(&self) -> Option<FlowStep> {
        match self.flow {
            ActiveFlow::Integration { step, .. } => Some(step),
            ActiveFlow::IntegrationList => None,
        }
    }

    /// 1-based step number, `None` on the list.
    pub fn step_number(&self) -> Option<u8> {
        self.step().map(FlowStep::number)
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.epoch)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch == ticket.0
    }

    /// Enter `id`'s flow at step 1 with empty form data.
    pub fn select(&mut self, id: IntegrationName, kind: FlowKind) {
        self.navigate(ActiveFlow::Integration {
            id,
            step: FlowStep::initial(kind),
        });
        self.form = FormData::default();
    }

    /// Return to the integration list.
    pub fn show_list(&mut self) {
        self.navigate(ActiveFlow::IntegrationList);
        self.form = FormData::default();
    }

    /// Go back one step, or to the list from step 1.
    pub fn back(&mut self) -> ActiveFlow {
        match self.flow {
            ActiveFlow::IntegrationList => {}
            ActiveFlow::Integration { id, step } => match step.previous() {
                Some(previous) => {
                    self.navigate(ActiveFlow::Integration { id, step: previous });
                    self.form.banner = None;
                }
                None => self.show_list(),
            },
        }
        self.flow
    }

    /// Move forward on `event`. Illegal events leave the state untouched.
    pub fn apply(&mut self, event: WizardEvent) -> Result<FlowStep, WizardError> {
        let ActiveFlow::Integration { id, step } = self.flow else {
            return Err(WizardError::NoActiveIntegration(event));
        };
        let next = step
            .on(event)
            .ok_or(WizardError::InvalidTransition { step, event })?;
        self.navigate(ActiveFlow::Integration { id, step: next });
        Ok(next)
    }

    fn navigate(&mut self, flow: ActiveFlow) {
        debug!(from = ?self.flow, to = ?flow, "Wizard navigation");
        self.flow = flow;
        self.epoch += 1;
    }

    pub fn set_credential(&mut self, key: &str, value: impl Into<String>) {
        self.form.credentials.insert(key.to_string(), value.into());
    }

    pub fn clear_credentials(&mut self) {
        self.form.credentials.clear();
    }

    pub fn set_banner(&mut self, banner: Option<Banner>) {
        self.form.banner = banner;
    }

    pub fn set_oauth_url(&mut self, url: Option<String>) {
        self.form.oauth_url = url;
    }

    /// Record a file selection. Does not move the flow.
    pub fn set_selection(&mut self, files: Vec<SelectedFile>, folder_name: Option<String>) {
        self.form.selected_files = files;
        self.form.folder_name = folder_name;
    }

    pub fn tracker(&self) -> Arc<UploadTracker> {
        Arc::clone(&self.form.tracker)
    }
}
