use serde::Serialize;

use super::WizardEvent;
use crate::integration::FlowKind;

/// Credential form followed by a confirmation banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialStep {
    Credentials,
    Confirming,
}

/// Credential form followed by a repository/file selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickerStep {
    Auth,
    Select,
}

/// Local upload: pick, review the selection, browse stored files, done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStep {
    Pick,
    Review,
    Browse,
    Success,
}

/// Single-screen hand-off to an OAuth consent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OAuthStep {
    Launch,
}

impl CredentialStep {
    fn number(self) -> u8 {
        match self {
            CredentialStep::Credentials => 1,
            CredentialStep::Confirming => 2,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            CredentialStep::Credentials => None,
            CredentialStep::Confirming => Some(CredentialStep::Credentials),
        }
    }

    fn on(self, event: WizardEvent) -> Option<Self> {
        match (self, event) {
            (CredentialStep::Credentials, WizardEvent::CredentialsAccepted) => {
                Some(CredentialStep::Confirming)
            }
            _ => None,
        }
    }
}

impl PickerStep {
    fn number(self) -> u8 {
        match self {
            PickerStep::Auth => 1,
            PickerStep::Select => 2,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            PickerStep::Auth => None,
            PickerStep::Select => Some(PickerStep::Auth),
        }
    }

    fn on(self, event: WizardEvent) -> Option<Self> {
        match (self, event) {
            (PickerStep::Auth, WizardEvent::CredentialsAccepted) => Some(PickerStep::Select),
            _ => None,
        }
    }
}

impl UploadStep {
    fn number(self) -> u8 {
        match self {
            UploadStep::Pick => 1,
            UploadStep::Review => 2,
            UploadStep::Browse => 3,
            UploadStep::Success => 4,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            UploadStep::Pick => None,
            UploadStep::Review => Some(UploadStep::Pick),
            UploadStep::Browse => Some(UploadStep::Review),
            UploadStep::Success => Some(UploadStep::Browse),
        }
    }

    fn on(self, event: WizardEvent) -> Option<Self> {
        use UploadStep::*;
        match (self, event) {
            (Pick, WizardEvent::FilesSelected) => Some(Review),
            (Review, WizardEvent::ReviewSubmitted) => Some(Browse),
            (Review, WizardEvent::AddMoreFiles) => Some(Pick),
            (Browse, WizardEvent::BrowseFinished) => Some(Success),
            (Success, WizardEvent::AddMoreFiles) => Some(Pick),
            _ => None,
        }
    }
}

/// Step of whichever flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "flow", content = "step")]
pub enum FlowStep {
    Credentials(CredentialStep),
    Picker(PickerStep),
    Upload(UploadStep),
    OAuth(OAuthStep),
}

impl FlowStep {
    /// First step of a flow of `kind`.
    pub fn initial(kind: FlowKind) -> Self {
        match kind {
            FlowKind::Credentials => FlowStep::Credentials(CredentialStep::Credentials),
            FlowKind::FilePicker => FlowStep::Picker(PickerStep::Auth),
            FlowKind::Upload => FlowStep::Upload(UploadStep::Pick),
            FlowKind::OAuth => FlowStep::OAuth(OAuthStep::Launch),
        }
    }

    /// 1-based position within the flow.
    pub fn number(self) -> u8 {
        match self {
            FlowStep::Credentials(s) => s.number(),
            FlowStep::Picker(s) => s.number(),
            FlowStep::Upload(s) => s.number(),
            FlowStep::OAuth(OAuthStep::Launch) => 1,
        }
    }

    /// Step before this one, `None` at step 1.
    pub fn previous(self) -> Option<Self> {
        match self {
            FlowStep::Credentials(s) => s.previous().map(FlowStep::Credentials),
            FlowStep::Picker(s) => s.previous().map(FlowStep::Picker),
            FlowStep::Upload(s) => s.previous().map(FlowStep::Upload),
            FlowStep::OAuth(_) => None,
        }
    }

    /// Step reached by `event`, `None` if the event is illegal here.
    pub fn on(self, event: WizardEvent) -> Option<Self> {
        match self {
            FlowStep::Credentials(s) => s.on(event).map(FlowStep::Credentials),
            FlowStep::Picker(s) => s.on(event).map(FlowStep::Picker),
            FlowStep::Upload(s) => s.on(event).map(FlowStep::Upload),
            FlowStep::OAuth(_) => None,
        }
    }
}
