//! The credential form data entity.
//!
//! A [`CredentialForm`] is either a login/change-password form observed on a
//! page (already parsed by the platform) or a credential loaded from the
//! store. Both sides of the matching algorithm use the same shape, exactly
//! like the platforms that feed this library do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Authentication scheme the form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormScheme {
    #[default]
    Html,
    Basic,
    Digest,
    Other,
}

/// How the credential came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Typed by the user.
    #[default]
    Manual,
    /// Synthesized by the password generator.
    Generated,
}

/// Classification of the form's field layout as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormLayout {
    #[default]
    Other,
    /// A single form containing both a login and a signup section.
    LoginAndSignup,
}

/// A parsed login form or a stored credential.
///
/// `signon_realm` is the primary grouping key: scheme+host+port for web
/// forms, or an opaque `android://hash@package` facet for app credentials.
/// It must never be empty on a form that is meant to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialForm {
    pub signon_realm: String,
    /// Set only when the store matched this credential through public-suffix
    /// relaxation; holds the realm the credential was originally saved under.
    pub original_signon_realm: String,
    /// Page URL the form was seen on. `None` models an invalid/empty URL.
    pub origin: Option<Url>,
    /// Form submission target.
    pub action: Option<Url>,

    pub username_element: String,
    pub username_value: String,
    /// Other field values that could plausibly be the username, in document
    /// order. Sanitized before the credential is first persisted.
    pub other_possible_usernames: Vec<String>,
    pub password_element: String,
    pub password_value: String,
    pub new_password_element: String,
    pub new_password_value: String,
    pub submit_element: String,

    pub ssl_valid: bool,
    pub preferred: bool,
    pub blacklisted_by_user: bool,
    pub username_marked_by_site: bool,
    pub new_password_marked_by_site: bool,
    pub was_parsed_using_autofill_predictions: bool,

    pub scheme: FormScheme,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
    pub layout: FormLayout,
    pub times_used: i32,
    pub date_created: Option<DateTime<Utc>>,
}

impl CredentialForm {
    /// The password value that a submission of this form asks us to persist.
    /// The new-password field wins whenever both it and its element name are
    /// present; otherwise the current-password field is the one to save.
    pub fn password_to_save(&self) -> &str {
        if self.new_password_element.is_empty() || self.new_password_value.is_empty() {
            &self.password_value
        } else {
            &self.new_password_value
        }
    }

    /// True when the store produced this credential through public-suffix
    /// relaxation rather than an exact realm match.
    pub fn is_public_suffix_match(&self) -> bool {
        !self.original_signon_realm.is_empty()
    }

    /// A form with a new-password field may be a change-password form.
    pub fn is_possible_change_password_form(&self) -> bool {
        !self.new_password_element.is_empty()
    }

    /// A change-password form with no username field at all.
    pub fn is_possible_change_password_form_without_username(&self) -> bool {
        self.is_possible_change_password_form() && self.username_element.is_empty()
    }
}

/// True for realms of credentials found via Android affiliation matching.
pub fn is_android_realm(realm: &str) -> bool {
    realm.starts_with("android://")
}

/// Heuristic for values that are very unlikely to be a username: short
/// all-digit strings (pin pads, one-time codes).
pub fn is_probably_not_username(s: &str) -> bool {
    !s.is_empty() && s.len() < 3 && s.chars().all(|c| c.is_ascii_digit())
}
