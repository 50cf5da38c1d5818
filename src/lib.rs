// Static integration registry
pub mod integration;

// Host configuration, defaults and env overrides
pub mod config;

// Effective per-integration configuration
pub mod resolver;

// Access token, authenticated requests, request ids
pub mod session;

// Host callbacks and in-flow banners
pub mod events;

// Per-integration step flows and modal state
pub mod wizard;

// Credential connect and OAuth URL requests
pub mod connect;

// File selection, progress tracking and uploaders
pub mod upload;

// Mounted instance tying the above together
pub mod provider;

pub use config::{load_config, HostConfig};
pub use provider::{CarbonProvider, SubmitOutcome};
