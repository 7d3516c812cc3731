//! Embedder-level engine settings.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Feature toggles the embedder decides once per coordinator. Platforms
/// usually deserialize these from their own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Never persist the credential of the signed-in sync account; stale
    /// store copies of it are wiped when it is seen at login.
    #[serde(default = "default_true")]
    pub drop_sync_credential: bool,

    /// Allow a submitted username to be matched against the alternative
    /// usernames recorded on stored credentials.
    #[serde(default)]
    pub allow_other_possible_usernames: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            drop_sync_credential: true,
            allow_other_possible_usernames: false,
        }
    }
}
