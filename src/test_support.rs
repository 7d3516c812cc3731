//! Shared test doubles: a recording store, a configurable fake client and
//! form builders used across the engine's test modules.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use url::Url;

use crate::client::{CredentialSource, ManagerClient};
use crate::coordinator::ProvisionalSaveFailure;
use crate::form::{CredentialForm, FormScheme};
use crate::form_manager::{FormManagerId, PendingFormManager};
use crate::store::{CredentialStore, PromptPolicy};

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// The login form used as the observed form throughout the tests.
pub fn observed_login_form() -> CredentialForm {
    CredentialForm {
        signon_realm: "https://www.example.com/".to_string(),
        origin: Some(url("https://www.example.com/login")),
        action: Some(url("https://www.example.com/do_login")),
        username_element: "username".to_string(),
        password_element: "password".to_string(),
        submit_element: "submit".to_string(),
        ..Default::default()
    }
}

/// A stored credential shaped like a previous save off the observed form.
pub fn saved_match(username: &str, password: &str) -> CredentialForm {
    let mut form = observed_login_form();
    form.username_value = username.to_string();
    form.password_value = password.to_string();
    form.ssl_valid = true;
    form.date_created = Some(Utc.with_ymd_and_hms(2015, 1, 15, 9, 0, 0).unwrap());
    form
}

/// A stored credential found through public-suffix relaxation. The store
/// rewrites realm and origin to the queried site and records the realm the
/// credential was saved under in `original_signon_realm`.
pub fn psl_saved_match(username: &str, password: &str) -> CredentialForm {
    let mut form = saved_match(username, password);
    form.original_signon_realm = "https://m.example.com/".to_string();
    form
}

/// A submission of the observed form with the given values typed in.
pub fn submitted_form(username: &str, password: &str) -> CredentialForm {
    let mut form = observed_login_form();
    form.username_value = username.to_string();
    form.password_value = password.to_string();
    form
}

/// A store operation as recorded by [`RecordingStore`].
#[derive(Debug, Clone)]
pub enum StoreOp {
    GetLogins {
        realm: String,
        prompt_policy: PromptPolicy,
        consumer: FormManagerId,
    },
    Add(CredentialForm),
    Update(CredentialForm),
    UpdateWithPrimaryKey {
        new_form: CredentialForm,
        old_primary_key: CredentialForm,
    },
    Remove(CredentialForm),
    ReportMetrics,
}

/// Store double that records every operation in order.
#[derive(Default)]
pub struct RecordingStore {
    pub ops: Vec<StoreOp>,
}

impl RecordingStore {
    pub fn get_logins_consumers(&self) -> Vec<FormManagerId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::GetLogins { consumer, .. } => Some(*consumer),
                _ => None,
            })
            .collect()
    }

    pub fn added(&self) -> Vec<&CredentialForm> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Add(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    pub fn updated(&self) -> Vec<&CredentialForm> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Update(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    pub fn primary_key_updates(&self) -> Vec<(&CredentialForm, &CredentialForm)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::UpdateWithPrimaryKey {
                    new_form,
                    old_primary_key,
                } => Some((new_form, old_primary_key)),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<&CredentialForm> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Remove(form) => Some(form),
                _ => None,
            })
            .collect()
    }
}

impl CredentialStore for RecordingStore {
    fn get_logins(
        &mut self,
        observed_form: &CredentialForm,
        prompt_policy: PromptPolicy,
        consumer: FormManagerId,
    ) {
        self.ops.push(StoreOp::GetLogins {
            realm: observed_form.signon_realm.clone(),
            prompt_policy,
            consumer,
        });
    }

    fn add_login(&mut self, form: &CredentialForm) {
        self.ops.push(StoreOp::Add(form.clone()));
    }

    fn update_login(&mut self, form: &CredentialForm) {
        self.ops.push(StoreOp::Update(form.clone()));
    }

    fn update_login_with_primary_key(
        &mut self,
        new_form: &CredentialForm,
        old_primary_key: &CredentialForm,
    ) {
        self.ops.push(StoreOp::UpdateWithPrimaryKey {
            new_form: new_form.clone(),
            old_primary_key: old_primary_key.clone(),
        });
    }

    fn remove_login(&mut self, form: &CredentialForm) {
        self.ops.push(StoreOp::Remove(form.clone()));
    }

    fn report_metrics(&mut self, _sync_username: &str, _custom_passphrase: bool) {
        self.ops.push(StoreOp::ReportMetrics);
    }
}

/// One recorded fill announcement: usernames offered, preferred username,
/// wait-for-username flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FillAnnouncement {
    pub usernames: Vec<String>,
    pub preferred: String,
    pub wait_for_username: bool,
}

/// Client double with switchable page state and recorded interactions.
pub struct FakeClient {
    pub saving_enabled: bool,
    pub automatic_saving_enabled: bool,
    pub update_password_ui_enabled: bool,
    pub off_the_record: bool,
    pub ssl_errors: bool,
    pub http_error: bool,
    pub main_frame: Option<Url>,
    pub sync_usernames: Vec<String>,
    pub logging_active: bool,
    pub now: DateTime<Utc>,
    pub prompt_return: bool,

    pub logged: RefCell<Vec<String>>,
    pub failures: Vec<ProvisionalSaveFailure>,
    pub prompts: Vec<(CredentialSource, bool)>,
    pub prompted_manager: Option<PendingFormManager>,
    pub auto_saved_manager: Option<PendingFormManager>,
    pub fills: Vec<FillAnnouncement>,
}

impl Default for FakeClient {
    fn default() -> Self {
        FakeClient {
            saving_enabled: true,
            automatic_saving_enabled: false,
            update_password_ui_enabled: false,
            off_the_record: false,
            ssl_errors: false,
            http_error: false,
            main_frame: Some(url("https://www.example.com/login")),
            sync_usernames: Vec::new(),
            logging_active: false,
            now: Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap(),
            prompt_return: true,
            logged: RefCell::new(Vec::new()),
            failures: Vec::new(),
            prompts: Vec::new(),
            prompted_manager: None,
            auto_saved_manager: None,
            fills: Vec::new(),
        }
    }
}

impl ManagerClient for FakeClient {
    fn is_saving_enabled_for_current_page(&self) -> bool {
        self.saving_enabled
    }

    fn is_automatic_password_saving_enabled(&self) -> bool {
        self.automatic_saving_enabled
    }

    fn is_update_password_ui_enabled(&self) -> bool {
        self.update_password_ui_enabled
    }

    fn is_off_the_record(&self) -> bool {
        self.off_the_record
    }

    fn did_last_page_load_encounter_ssl_errors(&self) -> bool {
        self.ssl_errors
    }

    fn was_last_navigation_http_error(&self) -> bool {
        self.http_error
    }

    fn main_frame_url(&self) -> Option<Url> {
        self.main_frame.clone()
    }

    fn is_sync_account_credential(&self, username: &str, _realm: &str) -> bool {
        self.sync_usernames.iter().any(|u| u == username)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn prompt_user_to_save_or_update_password(
        &mut self,
        pending: PendingFormManager,
        source: CredentialSource,
        is_update: bool,
    ) -> bool {
        self.prompts.push((source, is_update));
        self.prompted_manager = Some(pending);
        self.prompt_return
    }

    fn automatic_password_save(&mut self, manager: PendingFormManager) {
        self.auto_saved_manager = Some(manager);
    }

    fn password_was_autofilled(
        &mut self,
        best_matches: &BTreeMap<String, CredentialForm>,
        preferred_match: &CredentialForm,
        wait_for_username: bool,
    ) {
        self.fills.push(FillAnnouncement {
            usernames: best_matches.keys().cloned().collect(),
            preferred: preferred_match.username_value.clone(),
            wait_for_username,
        });
    }

    fn is_logging_active(&self) -> bool {
        self.logging_active
    }

    fn log_save_progress(&self, message: &str) {
        self.logged.borrow_mut().push(message.to_string());
    }

    fn record_provisional_save_failure(
        &mut self,
        failure: ProvisionalSaveFailure,
        _origin: Option<&Url>,
    ) {
        self.failures.push(failure);
    }
}

/// A non-HTML (HTTP basic auth) form for the scheme-matching tests.
pub fn basic_auth_form(realm: &str) -> CredentialForm {
    CredentialForm {
        signon_realm: realm.to_string(),
        origin: Some(url("https://www.example.com/")),
        scheme: FormScheme::Basic,
        ..Default::default()
    }
}
