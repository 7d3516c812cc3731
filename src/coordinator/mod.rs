//! Page-scoped submission coordination.
//!
//! A [`SubmissionCoordinator`] owns one [`PendingFormManager`] per distinct
//! form observed on the current page, matches a submitted form to the best
//! of them, holds the resulting provisional save across the post-submit
//! navigation, and decides — once the page settles — whether the login
//! succeeded and whether to prompt, save silently, or drop.

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{CredentialSource, ManagerClient};
use crate::domain::same_domain_or_host;
use crate::form::{CredentialForm, FormScheme};
use crate::form_manager::{FormManagerId, OtherUsernamesAction, PendingFormManager};
use crate::form_matcher::is_signup_form;
use crate::logger;
use crate::settings::EngineSettings;
use crate::store::CredentialStore;
use crate::urls::{is_cryptographic_scheme, urls_equal_up_to_http_https_substitution};

/// Proxy authentication pseudo-realm; forms under it are not real logins.
const SPDY_PROXY_REALM_SUFFIX: &str = "/SpdyProxy";

/// Why a provisional save was abandoned. Purely telemetry: every value is a
/// policy rejection, none is fatal, and the coordinator keeps operating on
/// the next form or page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionalSaveFailure {
    SavingDisabled,
    EmptyPassword,
    NoMatchingForm,
    MatchingNotComplete,
    FormBlacklisted,
    InvalidForm,
    SyncCredential,
}

/// Tracks all pending form managers for a page and mediates submission.
pub struct SubmissionCoordinator {
    settings: EngineSettings,
    /// One manager per distinct observed form on the current page.
    pending_login_managers: Vec<PendingFormManager>,
    /// The manager chosen at submission time; survives the post-submit
    /// navigation. Single slot: a new submission discards the previous one.
    provisional_save_manager: Option<PendingFormManager>,
    /// Form snapshots across frames, collected while the post-submit page
    /// loads and cleared after each load-completion check.
    all_visible_forms: Vec<CredentialForm>,
    /// Main-frame URL cached at provisional-save time, for the
    /// did-the-submission-navigate-away telemetry.
    main_frame_url: Option<Url>,
    next_manager_id: u64,
}

impl SubmissionCoordinator {
    pub fn new(settings: EngineSettings) -> Self {
        SubmissionCoordinator {
            settings,
            pending_login_managers: Vec::new(),
            provisional_save_manager: None,
            all_visible_forms: Vec::new(),
            main_frame_url: None,
            next_manager_id: 0,
        }
    }

    pub fn pending_managers(&self) -> &[PendingFormManager] {
        &self.pending_login_managers
    }

    pub fn provisional_save_manager(&self) -> Option<&PendingFormManager> {
        self.provisional_save_manager.as_ref()
    }

    fn allocate_manager_id(&mut self) -> FormManagerId {
        let id = FormManagerId(self.next_manager_id);
        self.next_manager_id += 1;
        id
    }

    /// Main-frame navigation: every tracked form belongs to the old page.
    /// The provisional slot is untouched — it is exactly the post-submit
    /// navigation being observed.
    pub fn did_navigate_main_frame(&mut self) {
        self.pending_login_managers.clear();
    }

    /// The renderer reported freshly parsed forms.
    pub fn on_password_forms_parsed(
        &mut self,
        forms: &[CredentialForm],
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        self.create_pending_login_managers(forms, client, store);
    }

    fn create_pending_login_managers(
        &mut self,
        forms: &[CredentialForm],
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        if client.did_last_page_load_encounter_ssl_errors()
            || !client.is_saving_enabled_for_current_page()
        {
            return;
        }

        for form in forms {
            // Proxy authentication, not a real login form.
            if form.signon_realm.ends_with(SPDY_PROXY_REALM_SUFFIX) {
                continue;
            }
            let already_managed = self
                .pending_login_managers
                .iter()
                .any(|manager| manager.does_manage(form).is_complete_match());
            if already_managed {
                continue;
            }

            logger::log_form(&*client, "Adding manager for form", form);
            let ssl_valid = form
                .origin
                .as_ref()
                .map_or(false, is_cryptographic_scheme);
            let id = self.allocate_manager_id();
            let mut manager = PendingFormManager::new(id, form.clone(), ssl_valid);
            let prompt_policy = client.authorization_prompt_policy(form);
            manager.fetch_matching_logins(prompt_policy, &*client, store);
            self.pending_login_managers.push(manager);
        }
    }

    /// Deliver the results of a store query to the manager that issued it.
    /// Results for a manager that no longer exists (the page navigated away)
    /// are dropped.
    pub fn on_store_results(
        &mut self,
        consumer: FormManagerId,
        results: Vec<CredentialForm>,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        if let Some(manager) = self
            .pending_login_managers
            .iter_mut()
            .find(|manager| manager.id() == consumer)
        {
            manager.on_store_results(results, client, store);
            return;
        }
        if let Some(manager) = self.provisional_save_manager.as_mut() {
            if manager.id() == consumer {
                manager.on_store_results(results, client, store);
                return;
            }
        }
        debug!("dropping store results for retired manager {:?}", consumer);
    }

    /// The renderer reported a form submission. After the provisional save
    /// the remaining managers are moot: the page is about to navigate.
    pub fn on_password_form_submitted(
        &mut self,
        form: &CredentialForm,
        client: &mut dyn ManagerClient,
    ) {
        self.provisionally_save_password(form, client);
        self.pending_login_managers.clear();
    }

    /// Match a submitted form to the best tracked manager and capture the
    /// submission on it.
    pub fn provisionally_save_password(
        &mut self,
        form: &CredentialForm,
        client: &mut dyn ManagerClient,
    ) {
        logger::log_form(&*client, "Provisionally saving form", form);

        if !client.is_saving_enabled_for_current_page() {
            self.record_failure(client, ProvisionalSaveFailure::SavingDisabled, form);
            return;
        }

        // No password to save? Then don't.
        if form.password_to_save().is_empty() {
            self.record_failure(client, ProvisionalSaveFailure::EmptyPassword, form);
            return;
        }

        let mut matched_index: Option<usize> = None;
        let mut current_strength = 0u8;
        for (index, manager) in self.pending_login_managers.iter_mut().enumerate() {
            let result = manager.does_manage(form);
            if !result.is_match() {
                continue;
            }

            manager.set_submitted_form(form, &*client);

            if manager.is_ignorable_change_password_form() {
                // Saving it could only produce a wrong prompt.
                continue;
            }

            if result.is_complete_match() {
                // An exact match including the action URL ends the search.
                matched_index = Some(index);
                break;
            } else if result.matches_without_action() && result.strength() > current_strength {
                // Everything but the action matches; actions change in the
                // wild, so remember this candidate and keep looking for an
                // exact match.
                matched_index = Some(index);
                current_strength = result.strength();
            } else if is_signup_form(form) && result.strength() > current_strength {
                // Signup forms never need to be refilled, so the HTML
                // attributes need not match; take the best match available.
                matched_index = Some(index);
                current_strength = result.strength();
            }
        }

        let mut manager = match matched_index {
            Some(index) => self.pending_login_managers.swap_remove(index),
            None => {
                // The form was submitted without the page first reporting
                // it; don't offer to save.
                self.record_failure(client, ProvisionalSaveFailure::NoMatchingForm, form);
                return;
            }
        };

        if !manager.has_valid_password_form() {
            self.record_failure(client, ProvisionalSaveFailure::InvalidForm, form);
            return;
        }

        let mut provisional = form.clone();
        provisional.ssl_valid = form
            .origin
            .as_ref()
            .map_or(false, is_cryptographic_scheme)
            && !client.did_last_page_load_encounter_ssl_errors();
        provisional.preferred = true;

        let action = if self.settings.allow_other_possible_usernames {
            OtherUsernamesAction::Allow
        } else {
            OtherUsernamesAction::Ignore
        };
        manager.provisionally_save(provisional, action, &*client);
        self.provisional_save_manager = Some(manager);

        // Cache the user-visible URL; once the post-submit navigation
        // concludes, the landing URL is compared against it.
        self.main_frame_url = client.main_frame_url();
    }

    /// The renderer reported the forms visible after (re)rendering. When the
    /// page finished loading this is where a captured submission is judged:
    /// the tracked form reappearing means the login failed.
    pub fn on_password_forms_rendered(
        &mut self,
        visible_forms: &[CredentialForm],
        did_stop_loading: bool,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        // Pages can render forms lazily; pick up any new ones.
        self.create_pending_login_managers(visible_forms, client, store);

        if !self.can_provisional_manager_save(client) {
            return;
        }

        // An internal error, access-denied or not-found page after a login
        // attempt means the credentials were not accepted.
        if client.was_last_navigation_http_error() {
            logger::log_message(&*client, "Last navigation was an HTTP error; dropping");
            if let Some(manager) = self.provisional_save_manager.as_mut() {
                manager.submit_failed();
            }
            self.provisional_save_manager = None;
            return;
        }

        self.all_visible_forms
            .extend(visible_forms.iter().cloned());

        if !did_stop_loading {
            return;
        }

        let mut login_failed = false;
        {
            let manager = self
                .provisional_save_manager
                .as_mut()
                .expect("checked by can_provisional_manager_save");
            if manager.pending_credentials().scheme == FormScheme::Html {
                // Generated passwords are saved unconditionally: failing to
                // submit one is common and must not block the save that
                // already assisted the user.
                if manager.has_generated_password() {
                    self.all_visible_forms.clear();
                }
                let pending_action = manager.pending_credentials().action.clone();
                for visible in &self.all_visible_forms {
                    if let (Some(pending), Some(reappeared)) =
                        (pending_action.as_ref(), visible.action.as_ref())
                    {
                        if urls_equal_up_to_http_https_substitution(pending, reappeared) {
                            logger::log_form(&*client, "Form reappeared; dropping", visible);
                            manager.submit_failed();
                            login_failed = true;
                            break;
                        }
                    }
                }
            }
        }
        self.all_visible_forms.clear();

        if login_failed {
            self.provisional_save_manager = None;
            return;
        }

        self.on_login_successful(client, store);
    }

    /// An in-page (pushState/fragment) navigation with a submitted form:
    /// there is no reload to watch for, judge the submission immediately.
    pub fn on_in_page_navigation(
        &mut self,
        form: &CredentialForm,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        self.provisionally_save_password(form, client);

        if !self.can_provisional_manager_save(client) {
            return;
        }

        self.on_login_successful(client, store);
    }

    /// Mark the form matching a generated password, creating a manager when
    /// the form slipped past form detection.
    pub fn set_has_generated_password(
        &mut self,
        form: &CredentialForm,
        password_is_generated: bool,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        debug_assert!(client.is_saving_enabled_for_current_page());

        for manager in &mut self.pending_login_managers {
            if manager.does_manage(form).is_complete_match() {
                manager.set_has_generated_password(password_is_generated);
                return;
            }
        }

        if !password_is_generated {
            return;
        }

        // No manager tracks this form; that only happens when form detection
        // missed it. The generated password must be tracked regardless.
        let ssl_valid = form
            .origin
            .as_ref()
            .map_or(false, is_cryptographic_scheme);
        let id = self.allocate_manager_id();
        let mut manager = PendingFormManager::new(id, form.clone(), ssl_valid);
        manager.set_has_generated_password(true);
        let prompt_policy = client.authorization_prompt_policy(form);
        manager.fetch_matching_logins(prompt_policy, &*client, store);
        self.pending_login_managers.push(manager);
    }

    // ── Internals ──────────────────────────────────────────────────────────

    fn can_provisional_manager_save(&mut self, client: &mut dyn ManagerClient) -> bool {
        let (completed, blacklisted, form) = match self.provisional_save_manager.as_ref() {
            Some(manager) => {
                let completed = manager.has_completed_matching();
                (
                    completed,
                    completed && manager.is_blacklisted(),
                    manager.observed_form().clone(),
                )
            }
            None => {
                logger::log_message(&*client, "No provisional save manager");
                return false;
            }
        };

        if !completed {
            // The store didn't answer yet; give up on this submission.
            self.record_failure(client, ProvisionalSaveFailure::MatchingNotComplete, &form);
            self.provisional_save_manager = None;
            return false;
        }

        if blacklisted {
            self.record_failure(client, ProvisionalSaveFailure::FormBlacklisted, &form);
            self.provisional_save_manager = None;
            return false;
        }

        true
    }

    /// The login went through: decide between prompting, saving silently
    /// and dropping a sync-account credential.
    fn on_login_successful(
        &mut self,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        let mut manager = match self.provisional_save_manager.take() {
            Some(manager) => manager,
            None => return,
        };
        manager.submit_passed();

        if let (Some(source), Some(target)) =
            (self.main_frame_url.as_ref(), client.main_frame_url())
        {
            debug!(
                "submission navigated to a different domain: {}",
                !same_domain_or_host(source, &target)
            );
        }

        // The sync-account credential is managed by the account, not by us.
        // Stored copies with a different password are definitely stale; wipe
        // them, then drop the submission.
        if self.settings.drop_sync_credential
            && client.is_sync_account_credential(
                &manager.pending_credentials().username_value,
                &manager.pending_credentials().signon_realm,
            )
        {
            manager.wipe_store_copy_if_outdated(store);
            let form = manager.observed_form().clone();
            self.record_failure(client, ProvisionalSaveFailure::SyncCredential, &form);
            return;
        }

        let should_prompt = !client.is_automatic_password_saving_enabled()
            && (manager.is_new_login()
                || manager.is_possible_change_password_form_without_username()
                || (manager.password_overridden() && client.is_update_password_ui_enabled()))
            && !manager.has_generated_password()
            && !manager.is_pending_credentials_public_suffix_match();

        if should_prompt {
            logger::log_message(&*client, "Decision: ask the user");
            let is_update = !manager.is_new_login();
            client.prompt_user_to_save_or_update_password(
                manager,
                CredentialSource::PasswordManager,
                is_update,
            );
        } else {
            logger::log_message(&*client, "Decision: save");
            manager.save(client, store);
            if manager.has_generated_password() {
                client.automatic_password_save(manager);
            }
        }
    }

    fn record_failure(
        &mut self,
        client: &mut dyn ManagerClient,
        failure: ProvisionalSaveFailure,
        form: &CredentialForm,
    ) {
        debug!(
            "provisional save failed for {}: {:?}",
            form.signon_realm, failure
        );
        logger::log_message(&*client, &format!("Decision: drop ({:?})", failure));
        client.record_provisional_save_failure(failure, form.origin.as_ref());
    }
}
