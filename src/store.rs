//! The credential store interface consumed by the engine.
//!
//! The store itself (SQL, keychain, sync-backed, ...) is owned by the
//! platform. The engine only issues requests against this trait; `get_logins`
//! results come back asynchronously through
//! `SubmissionCoordinator::on_store_results`, routed by the `FormManagerId`
//! handed out with the query. Write operations are fire-and-forget.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::form::CredentialForm;
use crate::form_manager::FormManagerId;

/// Whether the store may put up an OS-level authorization prompt (e.g. a
/// keychain unlock dialog) while servicing a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptPolicy {
    #[default]
    AllowPrompt,
    DisallowPrompt,
}

/// Asynchronous keyed credential storage, implemented by the platform.
pub trait CredentialStore {
    /// Request all credentials relevant to `observed_form` (including
    /// public-suffix and affiliation relaxations, which are the store's
    /// concern). The platform delivers results by calling
    /// `SubmissionCoordinator::on_store_results(consumer, results, ...)`
    /// once the query completes.
    fn get_logins(
        &mut self,
        observed_form: &CredentialForm,
        prompt_policy: PromptPolicy,
        consumer: FormManagerId,
    );

    fn add_login(&mut self, form: &CredentialForm);

    fn update_login(&mut self, form: &CredentialForm);

    /// Update a credential whose primary-key fields (username value, element
    /// names) changed; `old_primary_key` identifies the row to rewrite.
    fn update_login_with_primary_key(
        &mut self,
        new_form: &CredentialForm,
        old_primary_key: &CredentialForm,
    );

    fn remove_login(&mut self, form: &CredentialForm);

    /// Report store-level usage metrics. Invoked at most once per process,
    /// guarded by [`StoreMetricsReporter`].
    fn report_metrics(&mut self, sync_username: &str, custom_passphrase_sync_enabled: bool);
}

/// Per-query filter removing store results the page must not see, supplied
/// by the client. The default is a pass-through.
pub trait StoreResultFilter {
    fn filter_results(&self, results: Vec<CredentialForm>) -> Vec<CredentialForm>;
}

/// Filter that keeps every result.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughFilter;

impl StoreResultFilter for PassThroughFilter {
    fn filter_results(&self, results: Vec<CredentialForm>) -> Vec<CredentialForm> {
        results
    }
}

/// One-shot guard for `CredentialStore::report_metrics`.
///
/// The embedder owns a single reporter at its root and funnels every
/// coordinator through it; the first call wins and every later call is a
/// no-op, regardless of which thread it arrives on.
#[derive(Debug, Default)]
pub struct StoreMetricsReporter {
    reported: AtomicBool,
}

impl StoreMetricsReporter {
    pub const fn new() -> Self {
        StoreMetricsReporter {
            reported: AtomicBool::new(false),
        }
    }

    /// Report metrics unless a previous call already did. Returns whether
    /// this call was the one that reported.
    pub fn report_once(
        &self,
        store: &mut dyn CredentialStore,
        sync_username: &str,
        custom_passphrase_sync_enabled: bool,
    ) -> bool {
        if self.reported.swap(true, Ordering::SeqCst) {
            return false;
        }
        store.report_metrics(sync_username, custom_passphrase_sync_enabled);
        true
    }
}
