use serde::{Deserialize, Serialize};

/// Organization-level branding and limit overrides, fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteLabeling {
    #[serde(default)]
    pub remove_branding: bool,
    #[serde(default)]
    pub custom_limits: CustomLimits,
}

/// Organization limits. Absent values impose no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomLimits {
    #[serde(default)]
    pub file_size_limit: Option<u64>,
    #[serde(default)]
    pub max_files_count: Option<u32>,
}
