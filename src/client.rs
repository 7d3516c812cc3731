//! The embedder-facing client interface.
//!
//! Each platform provides one `ManagerClient` implementation wiring the
//! engine to its UI, preferences and navigation state. The engine only ever
//! talks to the trait. Most hooks have conservative defaults so a minimal
//! embedder (and a test double) only implements what it cares about.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::coordinator::ProvisionalSaveFailure;
use crate::form::CredentialForm;
use crate::form_manager::PendingFormManager;
use crate::store::{PassThroughFilter, PromptPolicy, StoreResultFilter};

/// Where a credential offered to the user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// The password manager's own save/update flow.
    PasswordManager,
    /// The site-initiated credential management API.
    CredentialManagementApi,
}

/// Embedder hooks: page state, preferences, prompts and telemetry.
pub trait ManagerClient {
    // ── Page and preference state ──────────────────────────────────────────

    /// Whether credentials may be saved for the current page at all.
    fn is_saving_enabled_for_current_page(&self) -> bool {
        true
    }

    /// Whether confirmed logins are persisted without asking the user.
    fn is_automatic_password_saving_enabled(&self) -> bool {
        false
    }

    /// Whether the update-password UI is available in this embedder.
    fn is_update_password_ui_enabled(&self) -> bool {
        false
    }

    fn is_off_the_record(&self) -> bool {
        false
    }

    fn did_last_page_load_encounter_ssl_errors(&self) -> bool {
        false
    }

    fn was_last_navigation_http_error(&self) -> bool {
        false
    }

    /// The user-visible URL of the main frame, when there is one.
    fn main_frame_url(&self) -> Option<Url> {
        None
    }

    /// Whether `username`/`realm` identify the credential of the signed-in
    /// sync account.
    fn is_sync_account_credential(&self, _username: &str, _realm: &str) -> bool {
        false
    }

    /// Store authorization-prompt policy for a query about `observed_form`.
    fn authorization_prompt_policy(&self, _observed_form: &CredentialForm) -> PromptPolicy {
        PromptPolicy::AllowPrompt
    }

    /// Per-query store-result filter.
    fn create_store_result_filter(&self) -> Box<dyn StoreResultFilter> {
        Box::new(PassThroughFilter)
    }

    /// Current time. The engine never reads the system clock directly;
    /// embedders that need determinism (tests, replays) override this.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    // ── Prompts and notifications driven by the engine ─────────────────────

    /// Offer to save or update the pending credentials. Ownership of the
    /// manager transfers to the embedder, which calls `save()` on it if the
    /// user accepts. Returns whether a prompt was actually shown.
    fn prompt_user_to_save_or_update_password(
        &mut self,
        pending: PendingFormManager,
        source: CredentialSource,
        is_update: bool,
    ) -> bool;

    /// Ask the user to pick one of several matching credentials. Part of the
    /// credential-chooser surface of the same client; the save flow never
    /// drives it.
    fn prompt_user_to_choose_credentials(
        &mut self,
        _local_forms: Vec<CredentialForm>,
        _federated_forms: Vec<CredentialForm>,
        _origin: Option<&Url>,
    ) -> Option<CredentialForm> {
        None
    }

    /// Tell the user they were signed in automatically. Credential-chooser
    /// surface as well.
    fn notify_user_auto_signin(&mut self, _forms: Vec<CredentialForm>) {}

    /// A credential was saved without prompting; show the lightweight
    /// confirmation UI. Ownership of the manager transfers to the embedder.
    fn automatic_password_save(&mut self, _manager: PendingFormManager) {}

    /// The engine decided what to fill for a form. `wait_for_username`
    /// means the choices are offered but nothing is prefilled until the user
    /// picks a username.
    fn password_was_autofilled(
        &mut self,
        _best_matches: &BTreeMap<String, CredentialForm>,
        _preferred_match: &CredentialForm,
        _wait_for_username: bool,
    ) {
    }

    // ── Diagnostics and telemetry ──────────────────────────────────────────

    /// Whether save-progress log collection is active. When false, the
    /// engine never constructs log messages.
    fn is_logging_active(&self) -> bool {
        false
    }

    /// Receive one scrubbed save-progress log line.
    fn log_save_progress(&self, _message: &str) {}

    /// Telemetry: a provisional save was abandoned.
    fn record_provisional_save_failure(
        &mut self,
        _failure: ProvisionalSaveFailure,
        _origin: Option<&Url>,
    ) {
    }
}
