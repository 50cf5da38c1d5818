use super::{Environment, HostConfig};

/// Apply `CARBON_CONNECT_*` environment overrides on top of a loaded config.
///
/// Unparseable values are ignored and the file/default value is kept.
pub fn apply_env_overrides(config: &mut HostConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides_from<F>(config: &mut HostConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("CARBON_CONNECT_ENVIRONMENT") {
        match v.parse::<Environment>() {
            Ok(env) => config.environment = env,
            Err(e) => tracing::warn!(error = %e, "Ignoring CARBON_CONNECT_ENVIRONMENT"),
        }
    }
    if let Some(v) = lookup("CARBON_CONNECT_API_URL") {
        if !v.trim().is_empty() {
            config.api_url = Some(v);
        }
    }
    if let Some(v) = lookup("CARBON_CONNECT_MAX_FILE_SIZE") {
        if let Ok(n) = v.parse::<u64>() {
            config.max_file_size = n;
        }
    }
    if let Some(v) = lookup("CARBON_CONNECT_USE_REQUEST_IDS") {
        if let Ok(b) = v.parse::<bool>() {
            config.use_request_ids = b;
        }
    }
}
