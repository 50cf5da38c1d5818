//! Provider - One mounted CarbonConnect instance.
//!
//! Owns the host configuration, the session, the resolved integrations and
//! the wizard. Renderers call the methods here and redraw from
//! [`CarbonProvider::snapshot`].
//!
//! Locks on wizard and modal state are never held across an `.await`;
//! async operations capture a wizard ticket and re-check it when they resume.


use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::connect::{self, ConnectOutcome, CredentialError};
use crate::events::{Banner, EventSink, HostEvent, HostNotifier};
use crate::integration::{catalog, FlowKind, IntegrationName};
use crate::resolver::{self, FileLimits, ProcessedIntegration, Resolution};
use crate::session::{LoadState, Session, TokenFetcher};
use crate::upload::{
    folder_name, run_batch, validate_selection, ApiUploader, BatchReport, SelectedFile,
    SelectionError, Uploader,
};
use crate::wizard::{ActiveFlow, FlowStep, ModalState, WizardError, WizardEvent, WizardState};

/// Integrations that the modal returns to when it closes.
const CLOSE_TARGETS: &[IntegrationName] = &[IntegrationName::LocalFiles, IntegrationName::WebScraper];

/// Failure of a provider action that never reached the network.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    Wizard(WizardError),
    Selection(SelectionError),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Wizard(e) => write!(f, "{}", e),
            ActionError::Selection(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<WizardError> for ActionError {
    fn from(e: WizardError) -> Self {
        ActionError::Wizard(e)
    }
}

impl From<SelectionError> for ActionError {
    fn from(e: SelectionError) -> Self {
        ActionError::Selection(e)
    }
}

/// What happened to a credential submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A required field was empty. Nothing was sent.
    Invalid(CredentialError),
    /// The attempt finished and its result was applied to the wizard.
    Finished(ConnectOutcome),
    /// The attempt finished after the user navigated away. Host callbacks
    /// still fired; the wizard was left alone.
    Stale(ConnectOutcome),
}

/// Everything a renderer needs to draw the current state.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSnapshot {
    pub open: bool,
    pub flow: ActiveFlow,
    pub step_number: Option<u8>,
    pub banner: Option<Banner>,
    pub selected_files: Vec<SelectedFile>,
    pub folder_name: Option<String>,
    pub oauth_url: Option<String>,
    pub upload_progress: f64,
    pub uploading: bool,
    pub load_state: LoadState,
    pub remove_branding: bool,
}

pub struct CarbonProvider {
    host: HostConfig,
    session: Arc<Session>,
    resolution: Resolution,
    wizard: Mutex<WizardState>,
    modal: Mutex<ModalState>,
    notifier: HostNotifier,
    uploader: Arc<dyn Uploader>,
}

impl CarbonProvider {
    /// Mount a provider: resolve the configuration and open the entry point.
    pub fn new(
        host: HostConfig,
        token_fetcher: Option<Arc<dyn TokenFetcher>>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        let session = Arc::new(Session::new(
            host.base_url(),
            token_fetcher,
            &host.connect.user_agent,
        ));
        let resolution = resolver::resolve(catalog(), &host);
        let uploader: Arc<dyn Uploader> = Arc::new(ApiUploader::new(Arc::clone(&session)));

        let mut wizard = WizardState::new();
        if let Some(entry) = resolution.entry_integration() {
            wizard.select(entry.id(), entry.descriptor.flow);
        }
        let modal = ModalState::new(host.open, host.always_open);

        info!(
            org = %host.org_name,
            base_url = %session.base_url(),
            integrations = resolution.integrations.len(),
            "CarbonConnect mounted"
        );

        Self {
            host,
            session,
            resolution,
            wizard: Mutex::new(wizard),
            modal: Mutex::new(modal),
            notifier: HostNotifier::new(sink),
            uploader,
        }
    }

    /// Replace the upload transport.
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// Fetch the first token and white-labeling data.
    pub async fn initialize(&self) -> LoadState {
        self.session.fetch_tokens().await
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Enabled integrations in display order.
    pub fn integrations(&self) -> &[ProcessedIntegration] {
        &self.resolution.integrations
    }

    fn wizard(&self) -> MutexGuard<'_, WizardState> {
        self.wizard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn modal(&self) -> MutexGuard<'_, ModalState> {
        self.modal.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ProviderSnapshot {
        let open = self.modal().is_open();
        let wizard = self.wizard();
        let form = wizard.form();
        ProviderSnapshot {
            open,
            flow: wizard.flow(),
            step_number: wizard.step_number(),
            banner: form.banner.clone(),
            selected_files: form.selected_files.clone(),
            folder_name: form.folder_name.clone(),
            oauth_url: form.oauth_url.clone(),
            upload_progress: form.tracker.progress(),
            uploading: form.tracker.is_uploading(),
            load_state: self.session.load_state(),
            remove_branding: self
                .session
                .white_labeling()
                .map_or(false, |wl| wl.remove_branding),
        }
    }

    pub fn is_open(&self) -> bool {
        self.modal().is_open()
    }

    /// Open or close the modal. Closing resets the wizard.
    ///
    /// Ignored when the host set `always_open`.
    pub fn set_modal_open(&self, open: bool) -> bool {
        let changed = self.modal().set_open(open);
        if !changed {
            return false;
        }
        if !open {
            let mut wizard = self.wizard();
            match self
                .resolution
                .entry
                .filter(|id| CLOSE_TARGETS.contains(id))
                .and_then(|id| self.resolution.get(id))
            {
                Some(entry) => wizard.select(entry.id(), entry.descriptor.flow),
                None => wizard.show_list(),
            }
        }
        debug!(open, "Modal state changed");
        self.notifier.open_changed(open);
        true
    }

    /// Enter an integration's flow at step 1.
    pub fn open_integration(&self, id: IntegrationName) -> Result<FlowStep, WizardError> {
        let integration = self
            .resolution
            .get(id)
            .ok_or(WizardError::NotEnabled(id))?;
        let mut wizard = self.wizard();
        wizard.select(id, integration.descriptor.flow);
        Ok(FlowStep::initial(integration.descriptor.flow))
    }

    pub fn show_list(&self) {
        self.wizard().show_list();
    }

    pub fn back(&self) -> ActiveFlow {
        self.wizard().back()
    }

    /// Apply an explicit forward event (review submitted, add more files...).
    pub fn advance(&self, event: WizardEvent) -> Result<FlowStep, WizardError> {
        self.wizard().apply(event)
    }

    /// Set a credential field of the active flow.
    pub fn set_credential(&self, key: &str, value: impl Into<String>) {
        let mut wizard = self.wizard();
        if wizard.active_integration().is_none() {
            debug!(key, "Ignoring credential input on the integration list");
            return;
        }
        wizard.set_credential(key, value);
    }

    fn active(&self, event: WizardEvent) -> Result<(&ProcessedIntegration, FlowStep), WizardError> {
        let wizard = self.wizard();
        let (id, step) = match wizard.flow() {
            ActiveFlow::Integration { id, step } => (id, step),
            ActiveFlow::IntegrationList => return Err(WizardError::NoActiveIntegration(event)),
        };
        let integration = self
            .resolution
            .get(id)
            .ok_or(WizardError::NotEnabled(id))?;
        Ok((integration, step))
    }

    fn issue_request_id(&self, integration: &ProcessedIntegration) -> Option<String> {
        self.host
            .use_request_ids
            .then(|| self.session.issue_request_id(integration.descriptor.data_source_type))
    }

    /// Submit the credential form of the active flow.
    ///
    /// On success the flow moves to its next step; credential-only flows
    /// then return to the list after the configured close delay.
    pub async fn submit_credentials(&self) -> Result<SubmitOutcome, WizardError> {
        let event = WizardEvent::CredentialsAccepted;
        let (integration, step) = self.active(event)?;
        if step.on(event).is_none() {
            return Err(WizardError::InvalidTransition { step, event });
        }

        let (credentials, ticket) = {
            let mut wizard = self.wizard();
            let validated =
                connect::validate_credentials(integration.descriptor, &wizard.form().credentials);
            match validated {
                Ok(credentials) => {
                    wizard.set_banner(None);
                    (credentials, wizard.ticket())
                }
                Err(e) => {
                    debug!(integration = %integration.id(), field = e.field, "Credential missing");
                    wizard.set_banner(Some(Banner::error(e.message)));
                    return Ok(SubmitOutcome::Invalid(e));
                }
            }
        };

        self.notifier.success(HostEvent::initiate(integration.id()));
        let request_id = self.issue_request_id(integration);
        let outcome =
            connect::execute(&self.session, integration, &credentials, request_id.as_deref())
                .await;
        if let Some(event) = outcome.host_error(integration) {
            self.notifier.error(event);
        }

        let close_ticket = {
            let mut wizard = self.wizard();
            if !wizard.is_current(ticket) {
                info!(integration = %integration.id(), "Connect finished after navigation, result dropped");
                return Ok(SubmitOutcome::Stale(outcome));
            }
            wizard.set_banner(Some(outcome.banner(integration.name())));
            if !outcome.is_connected() {
                return Ok(SubmitOutcome::Finished(outcome));
            }
            wizard.clear_credentials();
            wizard.apply(event)?;
            wizard.ticket()
        };

        if integration.descriptor.flow == FlowKind::Credentials {
            tokio::time::sleep(self.host.connect.success_close_delay()).await;
            let still_here = {
                let mut wizard = self.wizard();
                let current = wizard.is_current(close_ticket);
                if current {
                    wizard.show_list();
                }
                current
            };
            if still_here {
                self.set_modal_open(false);
            }
        }
        Ok(SubmitOutcome::Finished(outcome))
    }

    /// Request the consent URL for the active OAuth flow.
    pub async fn launch_oauth(&self) -> Result<ConnectOutcome, WizardError> {
        let event = WizardEvent::CredentialsAccepted;
        let (integration, step) = self.active(event)?;
        if integration.descriptor.flow != FlowKind::OAuth {
            return Err(WizardError::InvalidTransition { step, event });
        }
        let ticket = self.wizard().ticket();

        self.notifier.success(HostEvent::initiate(integration.id()));
        let request_id = self.issue_request_id(integration);
        let outcome =
            connect::request_oauth_url(&self.session, integration, request_id.as_deref()).await;
        if let Some(event) = outcome.host_error(integration) {
            self.notifier.error(event);
        }

        let mut wizard = self.wizard();
        if wizard.is_current(ticket) {
            match &outcome {
                ConnectOutcome::Connected { data, .. } => {
                    let url = data
                        .get("oauth_url")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    wizard.set_oauth_url(url);
                    wizard.set_banner(None);
                }
                failed => wizard.set_banner(Some(failed.banner(integration.name()))),
            }
        }
        Ok(outcome)
    }

    /// Limits for the active upload flow, with organization limits if loaded.
    pub fn file_limits(&self) -> Option<FileLimits> {
        let id = self.wizard().active_integration()?;
        let integration = self.resolution.get(id)?;
        let org = self.session.white_labeling().map(|wl| wl.custom_limits);
        Some(resolver::file_limits(integration, &self.host, org.as_ref()))
    }

    /// Record a file selection and move to review.
    ///
    /// A selection that breaks the limits shows a banner and stays on pick.
    pub fn select_files(&self, files: Vec<SelectedFile>) -> Result<FlowStep, ActionError> {
        let event = WizardEvent::FilesSelected;
        let (integration, step) = self.active(event)?;
        if step.on(event).is_none() {
            return Err(WizardError::InvalidTransition { step, event }.into());
        }
        let org = self.session.white_labeling().map(|wl| wl.custom_limits);
        let limits = resolver::file_limits(integration, &self.host, org.as_ref());

        let mut wizard = self.wizard();
        if let Err(e) = validate_selection(&files, &limits) {
            warn!(integration = %integration.id(), error = %e, "File selection refused");
            wizard.set_banner(Some(Banner::error(e.to_string())));
            return Err(e.into());
        }
        let folder = folder_name(&files);
        wizard.set_banner(None);
        wizard.set_selection(files, folder);
        Ok(wizard.apply(event)?)
    }

    /// Upload the reviewed selection and report it to the host.
    ///
    /// Refused while an earlier batch is outstanding. A batch that finishes
    /// while its flow is still current moves the flow on to browsing.
    pub async fn upload_selected(&self) -> Result<BatchReport, WizardError> {
        let event = WizardEvent::ReviewSubmitted;
        let (integration, step) = self.active(event)?;
        if step.on(event).is_none() {
            return Err(WizardError::InvalidTransition { step, event });
        }
        let (files, tracker, ticket) = {
            let wizard = self.wizard();
            let files = wizard.form().selected_files.clone();
            let tracker = wizard.tracker();
            if !tracker.try_start_batch(files.len()) {
                warn!(integration = %integration.id(), "Upload refused, batch still running");
                return Err(WizardError::UploadInProgress);
            }
            (files, tracker, wizard.ticket())
        };

        let report = run_batch(
            self.uploader.as_ref(),
            &files,
            &integration.config,
            &tracker,
        )
        .await;

        if !report.uploaded.is_empty() {
            self.notifier.success(HostEvent::added(
                integration.id(),
                json!(report.uploaded),
            ));
        }
        if !report.failed.is_empty() {
            let data = report
                .failed
                .iter()
                .map(|(name, message)| json!({ "message": message, "file": name }))
                .collect();
            self.notifier.error(HostEvent {
                data: serde_json::Value::Array(data),
                ..HostEvent::error(integration.id(), 400, "")
            });
        }

        let mut wizard = self.wizard();
        if wizard.is_current(ticket) {
            let banner = if report.failed.is_empty() {
                Banner::success(format!("{} file(s) uploaded.", report.uploaded.len()))
            } else {
                Banner::error(format!(
                    "{} of {} file(s) failed to upload.",
                    report.failed.len(),
                    files.len()
                ))
            };
            wizard.set_banner(Some(banner));
            wizard.apply(event)?;
        }
        Ok(report)
    }
}
