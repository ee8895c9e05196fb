use sct_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Who produced an artifact, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_unix_ms: u128,
}

impl ArtifactMeta {
    /// Stamp with the current time.
    pub fn now() -> Result<Self> {
        let d = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Computation(format!("system time error: {}", e)))?;
        Ok(Self {
            tool: "sctrends".to_string(),
            tool_version: sct_core::VERSION.to_string(),
            created_unix_ms: d.as_millis(),
        })
    }
}
