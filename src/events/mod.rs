//! Host event adapter.
//!
//! Core operations return typed outcomes; this module turns them into host
//! callback invocations. Host callbacks run behind `catch_unwind` so a
//! panicking handler is logged and never unwinds into the wizard.

use serde::Serialize;
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::integration::IntegrationName;

/// Kind of host-visible event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// A connect attempt has started.
    Initiate,
    /// Files were added to the data source.
    Add,
    Error,
}

/// Payload passed to `on_success` and `on_error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostEvent {
    pub status: u16,
    pub data: Value,
    pub action: ActionType,
    pub event: ActionType,
    pub integration: IntegrationName,
}

impl HostEvent {
    pub fn initiate(integration: IntegrationName) -> Self {
        Self {
            status: 200,
            data: Value::Null,
            action: ActionType::Initiate,
            event: ActionType::Initiate,
            integration,
        }
    }

    pub fn added(integration: IntegrationName, data: Value) -> Self {
        Self {
            status: 200,
            data,
            action: ActionType::Add,
            event: ActionType::Add,
            integration,
        }
    }

    /// Error event. `data` is `[{"message": message}]`.
    pub fn error(integration: IntegrationName, status: u16, message: &str) -> Self {
        Self {
            status,
            data: json!([{ "message": message }]),
            action: ActionType::Error,
            event: ActionType::Error,
            integration,
        }
    }

    /// First `message` in the data array, if any.
    pub fn message(&self) -> Option<&str> {
        self.data.get(0)?.get("message")?.as_str()
    }
}

/// Host-registered handlers.
pub trait EventSink: Send + Sync {
    fn on_success(&self, event: &HostEvent);
    fn on_error(&self, event: &HostEvent);

    /// Called after every applied modal open/close change.
    fn on_open_change(&self, _open: bool) {}
}

/// Forwards events to the host's sink, isolating host failures.
#[derive(Clone, Default)]
pub struct HostNotifier {
    sink: Option<Arc<dyn EventSink>>,
}

impl HostNotifier {
    pub fn new(sink: Option<Arc<dyn EventSink>>) -> Self {
        Self { sink }
    }

    pub fn success(&self, event: HostEvent) {
        info!(
            integration = %event.integration,
            action = ?event.action,
            status = event.status,
            "Host success event"
        );
        self.dispatch("on_success", |sink| sink.on_success(&event));
    }

    pub fn error(&self, event: HostEvent) {
        warn!(
            integration = %event.integration,
            status = event.status,
            message = event.message().unwrap_or_default(),
            "Host error event"
        );
        self.dispatch("on_error", |sink| sink.on_error(&event));
    }

    pub fn open_changed(&self, open: bool) {
        self.dispatch("on_open_change", |sink| sink.on_open_change(open));
    }

    fn dispatch<F>(&self, callback: &str, f: F)
    where
        F: FnOnce(&dyn EventSink),
    {
        let Some(sink) = &self.sink else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| f(sink.as_ref()))).is_err() {
            error!(callback, "Host callback panicked");
        }
    }
}

/// Sink that only logs. Used when the host registers nothing else.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_success(&self, event: &HostEvent) {
        info!(
            integration = %event.integration,
            action = ?event.action,
            data = %event.data,
            "on_success"
        );
    }

    fn on_error(&self, event: &HostEvent) {
        error!(
            integration = %event.integration,
            status = event.status,
            data = %event.data,
            "on_error"
        );
    }

    fn on_open_change(&self, open: bool) {
        info!(open, "on_open_change");
    }
}

/// Severity of an in-flow banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
}

/// Short message shown inside the active flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
    pub kind: BannerKind,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: BannerKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: BannerKind::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        successes: Mutex<Vec<HostEvent>>,
        errors: Mutex<Vec<HostEvent>>,
    }

    impl EventSink for Recording {
        fn on_success(&self, event: &HostEvent) {
            self.successes.lock().unwrap().push(event.clone());
        }

        fn on_error(&self, event: &HostEvent) {
            self.errors.lock().unwrap().push(event.clone());
        }
    }

    struct Panicking;

    impl EventSink for Panicking {
        fn on_success(&self, _event: &HostEvent) {
            panic!("host handler blew up");
        }

        fn on_error(&self, _event: &HostEvent) {
            panic!("host handler blew up");
        }

        fn on_open_change(&self, _open: bool) {
            panic!("host handler blew up");
        }
    }

    #[test]
    fn test_error_event_shape() {
        let event = HostEvent::error(IntegrationName::Guru, 400, "invalid token");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({
                "status": 400,
                "data": [{"message": "invalid token"}],
                "action": "ERROR",
                "event": "ERROR",
                "integration": "GURU"
            })
        );
        assert_eq!(event.message(), Some("invalid token"));
    }

    #[test]
    fn test_action_wire_names() {
        let names: Vec<_> = [ActionType::Initiate, ActionType::Add, ActionType::Error]
            .iter()
            .map(|a| serde_json::to_value(a).unwrap())
            .collect();
        assert_eq!(names, vec![json!("INITIATE"), json!("ADD"), json!("ERROR")]);
        assert_eq!(
            HostEvent::added(IntegrationName::LocalFiles, json!([])).action,
            ActionType::Add
        );
    }

    #[test]
    fn test_initiate_event() {
        let event = HostEvent::initiate(IntegrationName::Github);
        assert_eq!(event.action, ActionType::Initiate);
        assert_eq!(event.status, 200);
        assert!(event.message().is_none());
    }

    #[test]
    fn test_notifier_forwards() {
        let sink = Arc::new(Recording::default());
        let notifier = HostNotifier::new(Some(sink.clone()));
        notifier.success(HostEvent::initiate(IntegrationName::Guru));
        notifier.error(HostEvent::error(IntegrationName::Guru, 500, "boom"));

        assert_eq!(sink.successes.lock().unwrap().len(), 1);
        assert_eq!(sink.errors.lock().unwrap()[0].status, 500);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let notifier = HostNotifier::new(Some(Arc::new(Panicking)));
        notifier.success(HostEvent::initiate(IntegrationName::Guru));
        notifier.error(HostEvent::error(IntegrationName::Guru, 400, "x"));
        notifier.open_changed(true);
    }

    #[test]
    fn test_no_sink_is_noop() {
        HostNotifier::default().success(HostEvent::initiate(IntegrationName::Guru));
    }
}
