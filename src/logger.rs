//! Save-progress diagnostics.
//!
//! Log collection is an embedder feature: unless the client reports it
//! active, nothing is formatted and nothing is sent. Messages are scrubbed —
//! element names and realms are loggable, credential values never are.
//! Logging must never affect control flow.

use crate::client::ManagerClient;
use crate::form::CredentialForm;

/// Send one message to the client's log collector, if active.
pub fn log_message(client: &dyn ManagerClient, message: &str) {
    if !client.is_logging_active() {
        return;
    }
    client.log_save_progress(message);
}

/// Send a labeled number.
pub fn log_number(client: &dyn ManagerClient, label: &str, value: usize) {
    if !client.is_logging_active() {
        return;
    }
    client.log_save_progress(&format!("{}: {}", label, value));
}

/// Send a labeled boolean.
pub fn log_boolean(client: &dyn ManagerClient, label: &str, value: bool) {
    if !client.is_logging_active() {
        return;
    }
    client.log_save_progress(&format!("{}: {}", label, value));
}

/// Send a scrubbed description of a form: identity and structure only,
/// never field values.
pub fn log_form(client: &dyn ManagerClient, label: &str, form: &CredentialForm) {
    if !client.is_logging_active() {
        return;
    }
    let origin_host = form
        .origin
        .as_ref()
        .and_then(|url| url.host_str())
        .unwrap_or("");
    client.log_save_progress(&format!(
        "{}: scheme={:?} realm={} origin_host={} username_element={} password_element={} \
         new_password_element={} submit_element={} psl_match={} generated={} times_used={}",
        label,
        form.scheme,
        form.signon_realm,
        origin_host,
        form.username_element,
        form.password_element,
        form.new_password_element,
        form.submit_element,
        form.is_public_suffix_match(),
        form.kind == crate::form::CredentialKind::Generated,
        form.times_used,
    ));
}
