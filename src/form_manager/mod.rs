//! Per-form decision lifecycle.
//!
//! A [`PendingFormManager`] owns everything that happens to one observed
//! form: fetching candidate credentials from the store, ranking them,
//! capturing a submission, deciding between saving a new credential and
//! updating a stored one, and finally writing the result back.
//!
//! Store access is asynchronous: between issuing a query and receiving its
//! results the manager sits in the matching phase and tolerates both an
//! early provisional save (replayed once matching completes) and a second
//! fetch request (coalesced into a single re-query; two queries never run
//! concurrently).

mod scoring;
mod sensitive;

pub use scoring::{
    is_blacklist_match, resolve_candidates, resolve_candidates_json, score_candidate,
    CandidateResolution, CandidateResolutionInput,
};

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::client::ManagerClient;
use crate::form::{is_android_realm, is_probably_not_username, CredentialForm, CredentialKind, FormScheme};
use crate::form_matcher::{does_manage, MatchResult};
use crate::logger;
use crate::store::{CredentialStore, PromptPolicy};
use crate::urls::same_scheme_host_port_opt;

use sensitive::{is_ssn, is_valid_credit_card_number};

/// Opaque identity of one manager, used to route asynchronous store results
/// back to it. Allocated by the coordinator; stable for the manager's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormManagerId(pub u64);

/// Progress of the store round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingState {
    /// No query issued yet.
    PreMatching,
    /// A query is in flight.
    Matching,
    /// Results arrived and were ranked.
    PostMatching,
}

/// Whether a submitted username may be matched against the alternative
/// usernames recorded on stored credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherUsernamesAction {
    Allow,
    Ignore,
}

/// Outcome of the submission this manager captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    NotSubmitted,
    Passed,
    Failed,
}

/// Owns one observed form's lifecycle, from candidate retrieval through
/// final credential selection and persistence.
pub struct PendingFormManager {
    id: FormManagerId,
    observed_form: CredentialForm,

    state: MatchingState,
    /// Prompt policy of a fetch request that arrived while a query was
    /// already in flight; triggers a single re-query when the current one
    /// completes.
    next_prompt_policy: Option<PromptPolicy>,

    best_matches: BTreeMap<String, CredentialForm>,
    preferred_username: Option<String>,
    blacklisted_matches: Vec<CredentialForm>,

    provisionally_saved_form: Option<CredentialForm>,
    other_usernames_action: OtherUsernamesAction,
    pending_credentials: CredentialForm,
    is_new_login: bool,
    has_generated_password: bool,
    password_overridden: bool,
    /// Alternative username the user actually submitted; renaming the stored
    /// credential to it is deferred to save time because the username is
    /// part of the store's primary key.
    selected_username: String,

    is_ignorable_change_password_form: bool,
    is_possible_change_password_form_without_username: bool,
    submit_result: SubmitResult,
}

impl PendingFormManager {
    /// Create a manager for a form observed on a page. `ssl_valid` reflects
    /// the state of the page the form was seen on and is baked into the
    /// observed form.
    pub fn new(id: FormManagerId, mut observed_form: CredentialForm, ssl_valid: bool) -> Self {
        observed_form.ssl_valid = ssl_valid;
        let is_possible_change_password_form_without_username =
            observed_form.is_possible_change_password_form_without_username();
        PendingFormManager {
            id,
            observed_form,
            state: MatchingState::PreMatching,
            next_prompt_policy: None,
            best_matches: BTreeMap::new(),
            preferred_username: None,
            blacklisted_matches: Vec::new(),
            provisionally_saved_form: None,
            other_usernames_action: OtherUsernamesAction::Ignore,
            pending_credentials: CredentialForm::default(),
            is_new_login: true,
            has_generated_password: false,
            password_overridden: false,
            selected_username: String::new(),
            is_ignorable_change_password_form: false,
            is_possible_change_password_form_without_username,
            submit_result: SubmitResult::NotSubmitted,
        }
    }

    pub fn id(&self) -> FormManagerId {
        self.id
    }

    pub fn observed_form(&self) -> &CredentialForm {
        &self.observed_form
    }

    pub fn best_matches(&self) -> &BTreeMap<String, CredentialForm> {
        &self.best_matches
    }

    pub fn preferred_match(&self) -> Option<&CredentialForm> {
        self.preferred_username
            .as_ref()
            .and_then(|username| self.best_matches.get(username))
    }

    pub fn blacklisted_matches(&self) -> &[CredentialForm] {
        &self.blacklisted_matches
    }

    /// The finalized candidate to write. Only meaningful once matching has
    /// completed and a submission was captured.
    pub fn pending_credentials(&self) -> &CredentialForm {
        &self.pending_credentials
    }

    pub fn is_new_login(&self) -> bool {
        debug_assert_eq!(self.state, MatchingState::PostMatching);
        self.is_new_login
    }

    pub fn password_overridden(&self) -> bool {
        self.password_overridden
    }

    pub fn has_generated_password(&self) -> bool {
        self.has_generated_password
    }

    pub fn set_has_generated_password(&mut self, generated: bool) {
        self.has_generated_password = generated;
    }

    pub fn is_ignorable_change_password_form(&self) -> bool {
        self.is_ignorable_change_password_form
    }

    pub fn is_possible_change_password_form_without_username(&self) -> bool {
        self.is_possible_change_password_form_without_username
    }

    pub fn submit_result(&self) -> SubmitResult {
        self.submit_result
    }

    /// The user told us never to offer saving for this site.
    pub fn is_blacklisted(&self) -> bool {
        debug_assert_eq!(self.state, MatchingState::PostMatching);
        !self.blacklisted_matches.is_empty()
    }

    pub fn is_pending_credentials_public_suffix_match(&self) -> bool {
        self.pending_credentials.is_public_suffix_match()
    }

    pub fn has_completed_matching(&self) -> bool {
        self.state == MatchingState::PostMatching
    }

    /// An HTML form with neither a password nor a new-password element can
    /// never be saved; callers must short-circuit before any save logic.
    /// Non-HTML forms carry no element names and are always valid.
    pub fn has_valid_password_form(&self) -> bool {
        debug_assert!(matches!(
            self.state,
            MatchingState::Matching | MatchingState::PostMatching
        ));
        if self.observed_form.scheme != FormScheme::Html {
            return true;
        }
        !self.observed_form.password_element.is_empty()
            || !self.observed_form.new_password_element.is_empty()
    }

    /// Grade `form` against the observed form this manager tracks.
    pub fn does_manage(&self, form: &CredentialForm) -> MatchResult {
        does_manage(&self.observed_form, form)
    }

    /// Issue (or coalesce) a store query for credentials matching the
    /// observed form.
    pub fn fetch_matching_logins(
        &mut self,
        prompt_policy: PromptPolicy,
        client: &dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        if self.state == MatchingState::Matching {
            // A query is already in flight. Remember the prompt policy so a
            // fresh query can be issued once the current results are back.
            self.next_prompt_policy = Some(prompt_policy);
            return;
        }

        logger::log_message(client, "Fetching matching logins from the store");
        self.state = MatchingState::Matching;
        store.get_logins(&self.observed_form, prompt_policy, self.id);
    }

    /// Handle the results of the store query this manager issued.
    pub fn on_store_results(
        &mut self,
        results: Vec<CredentialForm>,
        client: &mut dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        debug_assert_eq!(self.state, MatchingState::Matching);

        if let Some(prompt_policy) = self.next_prompt_policy.take() {
            // The received results are no longer up to date; re-request.
            self.state = MatchingState::PreMatching;
            self.fetch_matching_logins(prompt_policy, &*client, store);
            return;
        }

        logger::log_number(&*client, "Store results", results.len());

        let mut results = results;
        if !self.observed_form.ssl_valid {
            // On a page with broken SSL, credentials saved on intact pages
            // must not be surfaced.
            results.retain(|form| !form.ssl_valid);
        }
        let results = client.create_store_result_filter().filter_results(results);

        let resolution = resolve_candidates(&self.observed_form, results);
        self.best_matches = resolution.best_matches;
        self.preferred_username = resolution.preferred_username;
        self.blacklisted_matches = resolution.blacklisted_matches;
        self.state = MatchingState::PostMatching;

        // If the store was slow, the provisionally saved form is already
        // here; its pending credentials can be computed now.
        if self.provisionally_saved_form.is_some() {
            self.create_pending_credentials(&*client);
        }

        self.process_fill(client);
    }

    /// Classify a submitted form relative to this manager's knowledge. A
    /// change-password form whose typed credentials match nothing we know,
    /// on an embedder without update UI, is ignorable: provisionally saving
    /// it could only produce a wrong prompt.
    pub fn set_submitted_form(&mut self, form: &CredentialForm, client: &dyn ManagerClient) {
        let is_change_password_form =
            !form.new_password_value.is_empty() && !form.password_value.is_empty();
        self.is_ignorable_change_password_form = is_change_password_form
            && !form.username_marked_by_site
            && !self.typed_credentials_match(&form.username_value, &form.password_value)
            && !client.is_update_password_ui_enabled();
    }

    fn typed_credentials_match(&self, typed_username: &str, typed_password: &str) -> bool {
        self.best_matches.values().any(|stored| {
            stored.username_value == typed_username && stored.password_value == typed_password
        })
    }

    /// Capture a submission. If matching already completed the pending
    /// credentials are computed immediately; otherwise the computation is
    /// replayed when the store results arrive.
    pub fn provisionally_save(
        &mut self,
        credentials: CredentialForm,
        action: OtherUsernamesAction,
        client: &dyn ManagerClient,
    ) {
        debug_assert!(matches!(
            self.state,
            MatchingState::Matching | MatchingState::PostMatching
        ));
        debug_assert!(self.does_manage(&credentials).is_match());

        let mut credentials = credentials;
        if credentials.is_possible_change_password_form()
            && !credentials.username_value.is_empty()
            && is_probably_not_username(&credentials.username_value)
        {
            // A short all-digit "username" on a change form is noise from a
            // mis-parsed field, not an account name.
            credentials.username_value.clear();
            credentials.username_element.clear();
            self.is_possible_change_password_form_without_username = true;
        }
        self.provisionally_saved_form = Some(credentials);
        self.other_usernames_action = action;

        if self.has_completed_matching() {
            self.create_pending_credentials(client);
        }
    }

    /// Persist the pending credentials: add a new store entry or update the
    /// matched one.
    pub fn save(&mut self, client: &mut dyn ManagerClient, store: &mut dyn CredentialStore) {
        debug_assert_eq!(self.state, MatchingState::PostMatching);
        debug_assert!(!client.is_off_the_record());

        if self.is_new_login {
            self.save_as_new_login(client, store);
            self.delete_empty_username_credentials(store);
        } else {
            self.update_login(store);
        }
    }

    /// The update-password UI resolved which stored credential the user
    /// meant; persist the pending password onto it.
    pub fn update(
        &mut self,
        credentials_to_update: CredentialForm,
        store: &mut dyn CredentialStore,
    ) {
        let password_to_save = self.pending_credentials.password_value.clone();
        self.pending_credentials = credentials_to_update;
        self.pending_credentials.password_value = password_to_save;
        self.pending_credentials.preferred = true;
        self.is_new_login = false;
        self.update_login(store);
    }

    /// Store a blacklist marker: never offer saving for this form again.
    pub fn permanently_blacklist(
        &mut self,
        client: &dyn ManagerClient,
        store: &mut dyn CredentialStore,
    ) {
        debug_assert_eq!(self.state, MatchingState::PostMatching);
        debug_assert!(!client.is_off_the_record());

        let mut marker = self.pending_credentials.clone();
        marker.preferred = false;
        marker.blacklisted_by_user = true;
        marker.username_value.clear();
        marker.password_value.clear();
        marker.other_possible_usernames.clear();
        marker.date_created = Some(client.now());

        store.add_login(&marker);
        self.blacklisted_matches.push(marker);
    }

    /// Remove stored copies of the pending credential whose password went
    /// stale: same account (e-mail-equivalent username), different password.
    pub fn wipe_store_copy_if_outdated(&mut self, store: &mut dyn CredentialStore) {
        debug_assert_ne!(self.state, MatchingState::PreMatching);

        let mut wiped: Vec<String> = Vec::new();
        for (username, stored) in &self.best_matches {
            if stored.password_value == self.pending_credentials.password_value {
                continue;
            }
            if !crate::domain::are_emails_equivalent(
                &self.pending_credentials.username_value,
                username,
            ) {
                continue;
            }
            store.remove_login(stored);
            wiped.push(username.clone());
        }
        for username in wiped {
            if self.preferred_username.as_deref() == Some(username.as_str()) {
                self.preferred_username = None;
            }
            self.best_matches.remove(&username);
        }
    }

    pub fn submit_passed(&mut self) {
        debug!("submission for {} passed", self.observed_form.signon_realm);
        self.submit_result = SubmitResult::Passed;
    }

    pub fn submit_failed(&mut self) {
        debug!("submission for {} failed", self.observed_form.signon_realm);
        self.submit_result = SubmitResult::Failed;
    }

    // ── Internals ──────────────────────────────────────────────────────────

    /// Resolve the captured submission into the credentials to persist.
    ///
    /// Priority order: (1) the submitted username names a best match — an
    /// update, except that a public-suffix match forces a copy scoped to the
    /// exact current origin; (2) the submitted username is one of the
    /// alternative usernames of a best match — adopt that credential and
    /// defer the rename; (3) a change-password form without username on an
    /// embedder with update UI — pick the unique best match by password;
    /// (4) a brand-new credential.
    fn create_pending_credentials(&mut self, client: &dyn ManagerClient) {
        let submitted = match self.provisionally_saved_form.take() {
            Some(form) => form,
            None => return,
        };
        let password_to_save = submitted.password_to_save().to_string();

        if let Some(stored) = self.best_matches.get(&submitted.username_value).cloned() {
            // The user signed in with a login we autofilled.
            self.pending_credentials = stored;
            self.password_overridden =
                self.pending_credentials.password_value != password_to_save;

            if self.pending_credentials.is_public_suffix_match() {
                // Store a copy with the current origin and signon realm, so
                // the next visit finds a precise match.
                self.is_new_login = true;

                // This credential will not overwrite a previously saved one,
                // so the username can be updated right away.
                if !self.selected_username.is_empty() {
                    self.pending_credentials.username_value = self.selected_username.clone();
                }

                self.update_metadata_for_usage();

                // A changed password on a relaxed match may represent a
                // different account; dropping the original realm unmarks the
                // copy as a public-suffix match so the user is asked before
                // it is saved.
                if self.password_overridden {
                    self.pending_credentials.original_signon_realm.clear();
                    debug_assert!(!self.is_pending_credentials_public_suffix_match());
                }
            } else {
                self.is_new_login = false;
            }
        } else if self.other_usernames_action == OtherUsernamesAction::Allow
            && self.adopt_match_by_other_possible_username(&submitted.username_value)
        {
            // The username value stays the stored one for now; the rename is
            // applied at save time against the old primary key.
            self.selected_username = submitted.username_value.clone();
            self.is_new_login = false;
        } else if client.is_update_password_ui_enabled()
            && !self.best_matches.is_empty()
            && submitted.is_possible_change_password_form_without_username()
        {
            match self
                .find_best_match_for_update_password(&submitted.password_value)
                .cloned()
            {
                Some(best_update_match) => self.pending_credentials = best_update_match,
                // No unique password match: the user will pick the right
                // credential in the update UI, only the origin matters here.
                None => self.pending_credentials.origin = submitted.origin.clone(),
            }
            self.is_new_login = false;
            // The submission, not just the observed form, is what makes this
            // a username-less change; the save decision keys off the flag.
            self.is_possible_change_password_form_without_username = true;
        } else {
            // The user typed a new, unknown username.
            self.pending_credentials = self.observed_form.clone();
            if submitted.was_parsed_using_autofill_predictions {
                self.pending_credentials.username_element = submitted.username_element.clone();
            }
            self.pending_credentials.username_value = submitted.username_value.clone();
            self.pending_credentials.other_possible_usernames =
                submitted.other_possible_usernames.clone();

            // The password value is filled in below; remove any garbage now.
            self.pending_credentials.password_value.clear();
            self.pending_credentials.new_password_value.clear();

            // On a sign-up or change form the element names are likely
            // different from those on the login form. Leave them empty; they
            // get meaningful values on the first real login via the
            // primary-key update path.
            if !submitted.new_password_element.is_empty() {
                self.pending_credentials.password_element.clear();
            }
        }

        self.pending_credentials.action = submitted.action.clone();
        // Credentials imported from other browsers may carry no action URL;
        // bless them with the action of the observed form.
        if self.pending_credentials.action.is_none() {
            self.pending_credentials.action = self.observed_form.action.clone();
        }

        self.pending_credentials.password_value = password_to_save;
        self.pending_credentials.preferred = submitted.preferred;

        // Overriding the password of a generated credential by hand makes it
        // a manual one.
        if self.password_overridden
            && self.pending_credentials.kind == CredentialKind::Generated
            && !self.has_generated_password
        {
            self.pending_credentials.kind = CredentialKind::Manual;
        }
        if self.has_generated_password {
            self.pending_credentials.kind = CredentialKind::Generated;
        }
    }

    fn adopt_match_by_other_possible_username(&mut self, username: &str) -> bool {
        let adopted = self
            .best_matches
            .values()
            .find(|stored| stored.other_possible_usernames.iter().any(|u| u == username))
            .cloned();
        match adopted {
            Some(form) => {
                self.pending_credentials = form;
                true
            }
            None => false,
        }
    }

    /// Among the best matches, the unique credential with this password.
    /// With a single stored credential there is nothing to disambiguate; an
    /// ambiguous password collision yields no selection and is left for an
    /// explicit user choice.
    fn find_best_match_for_update_password(&self, password: &str) -> Option<&CredentialForm> {
        if self.best_matches.len() == 1 {
            return self.best_matches.values().next();
        }
        if password.is_empty() {
            return None;
        }

        let mut found: Option<&CredentialForm> = None;
        for stored in self.best_matches.values() {
            if stored.password_value == password {
                if found.is_some() {
                    return None;
                }
                found = Some(stored);
            }
        }
        found
    }

    fn save_as_new_login(&mut self, client: &dyn ManagerClient, store: &mut dyn CredentialStore) {
        debug_assert!(self.is_new_login);
        // The pending form is being used to sign in, so it is preferred.
        debug_assert!(self.pending_credentials.preferred);
        debug_assert!(!self.pending_credentials.blacklisted_by_user);

        self.pending_credentials.date_created = Some(client.now());
        sanitize_possible_usernames(&mut self.pending_credentials);
        store.add_login(&self.pending_credentials);

        self.update_preferred_login_state(store);
    }

    fn update_login(&mut self, store: &mut dyn CredentialStore) {
        debug_assert_eq!(self.state, MatchingState::PostMatching);
        debug_assert!(!self.is_new_login && self.pending_credentials.preferred);

        self.update_metadata_for_usage();
        self.update_preferred_login_state(store);

        if !self.selected_username.is_empty() {
            // The username changed. It is part of the store's primary key,
            // so the old key must be supplied alongside the rewrite.
            let old_primary_key = self.pending_credentials.clone();
            self.pending_credentials.username_value = self.selected_username.clone();
            store.update_login_with_primary_key(&self.pending_credentials, &old_primary_key);
        } else if self.observed_form.new_password_element.is_empty()
            && (self.pending_credentials.password_element.is_empty()
                || self.pending_credentials.username_element.is_empty()
                || self.pending_credentials.submit_element.is_empty())
        {
            // The credential was first saved off a sign-up or change form
            // and carries blank element names; now that a real login form
            // was used, fill them in. Element names are primary-key fields
            // too, so the old key must be supplied.
            let old_primary_key = self.pending_credentials.clone();
            self.pending_credentials.password_element =
                self.observed_form.password_element.clone();
            self.pending_credentials.username_element =
                self.observed_form.username_element.clone();
            self.pending_credentials.submit_element = self.observed_form.submit_element.clone();
            store.update_login_with_primary_key(&self.pending_credentials, &old_primary_key);
        } else {
            store.update_login(&self.pending_credentials);
        }
    }

    /// The identity of the credential is confirmed by this use: bump the
    /// usage counter and drop the alternative usernames.
    fn update_metadata_for_usage(&mut self) {
        self.pending_credentials.times_used += 1;
        self.pending_credentials.other_possible_usernames.clear();
    }

    /// Demote any stored credential for a different username under the same
    /// realm that is still flagged preferred.
    fn update_preferred_login_state(&mut self, store: &mut dyn CredentialStore) {
        for (username, stored) in self.best_matches.iter_mut() {
            if *username != self.pending_credentials.username_value && stored.preferred {
                // This wasn't the selected login but it used to be preferred.
                stored.preferred = false;
                store.update_login(stored);
            }
        }
    }

    /// A saved no-username credential with the same password as the one just
    /// persisted is a redundant import; remove it.
    fn delete_empty_username_credentials(&mut self, store: &mut dyn CredentialStore) {
        if self.best_matches.is_empty() || self.pending_credentials.username_value.is_empty() {
            return;
        }
        for stored in self.best_matches.values() {
            if !stored.is_public_suffix_match()
                && stored.username_value.is_empty()
                && stored.password_value == self.pending_credentials.password_value
            {
                store.remove_login(stored);
            }
        }
    }

    /// Announce what to fill for the observed form once matching completes.
    fn process_fill(&self, client: &mut dyn ManagerClient) {
        if self.best_matches.is_empty() {
            return;
        }
        let preferred = match self.preferred_match() {
            Some(preferred) => preferred,
            None => return,
        };

        // Provide the choices but don't prefill a value when (1) in
        // incognito, (2) the action hosts differ, (3) the preferred match
        // came from public-suffix matching, or (4) this is a change-password
        // form. Android credentials found via affiliation matching are
        // exempt from (2) and (3).
        let actions_differ = !same_scheme_host_port_opt(
            self.observed_form.action.as_ref(),
            preferred.action.as_ref(),
        );
        let wait_for_username = client.is_off_the_record()
            || (!is_android_realm(&preferred.original_signon_realm)
                && (actions_differ
                    || preferred.is_public_suffix_match()
                    || self.observed_form.is_possible_change_password_form()));

        client.password_was_autofilled(&self.best_matches, preferred, wait_for_username);
    }
}

/// Remove alternative usernames that could be credit cards or SSNs, the
/// chosen username itself, and duplicates. Runs right before a credential is
/// first persisted.
fn sanitize_possible_usernames(form: &mut CredentialForm) {
    let mut kept: BTreeSet<String> = BTreeSet::new();
    for username in &form.other_possible_usernames {
        if !is_valid_credit_card_number(username) && !is_ssn(username) {
            kept.insert(username.clone());
        }
    }
    kept.remove(&form.username_value);
    form.other_possible_usernames = kept.into_iter().collect();
}
