//! Deciding whether two forms denote "the same form".
//!
//! A manager tracks one observed form; when the renderer later reports a
//! parsed or submitted form, [`does_manage`] grades how well it lines up
//! with the tracked one. The result is a set of named facets rather than a
//! single boolean because callers pick the *best* of several candidate
//! managers: an action mismatch is tolerable, an origin mismatch is not.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::form::{CredentialForm, FormScheme};
use crate::urls::is_cryptographic_scheme;

/// Outcome of matching a form against a tracked one.
///
/// `origins_match` gates everything: when it is false the other facets are
/// false as well and the forms are unrelated. `strength()` orders partial
/// results for tie-breaking; an action match outranks an attribute match,
/// which outranks a bare origin match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub origins_match: bool,
    pub attributes_match: bool,
    pub action_match: bool,
}

impl MatchResult {
    pub const NO_MATCH: MatchResult = MatchResult {
        origins_match: false,
        attributes_match: false,
        action_match: false,
    };

    pub const COMPLETE_MATCH: MatchResult = MatchResult {
        origins_match: true,
        attributes_match: true,
        action_match: true,
    };

    /// Any usable match at all.
    pub fn is_match(&self) -> bool {
        self.origins_match
    }

    pub fn is_complete_match(&self) -> bool {
        self.origins_match && self.attributes_match && self.action_match
    }

    /// Origins and HTML attributes line up but the action URL changed.
    /// Actions are volatile in the wild, so this is the strongest partial
    /// result a caller should still accept.
    pub fn matches_without_action(&self) -> bool {
        self.origins_match && self.attributes_match && !self.action_match
    }

    /// Ranking weight for choosing among several partially matching
    /// managers: origins 1, attributes 2, action 4.
    pub fn strength(&self) -> u8 {
        (self.origins_match as u8) | (self.attributes_match as u8) << 1 | (self.action_match as u8) << 2
    }
}

/// A signup form collects a new password and no current one. Such forms
/// never need to be refilled, so matching them does not insist on the HTML
/// attributes lining up.
pub fn is_signup_form(form: &CredentialForm) -> bool {
    !form.new_password_element.is_empty() && form.password_element.is_empty()
}

/// Grade `form` against the `observed` form a manager is tracking.
pub fn does_manage(observed: &CredentialForm, form: &CredentialForm) -> MatchResult {
    // Non-HTML case: the realm carries all the identity there is.
    if observed.scheme != FormScheme::Html || form.scheme != FormScheme::Html {
        let forms_match =
            observed.signon_realm == form.signon_realm && observed.scheme == form.scheme;
        return if forms_match {
            MatchResult::COMPLETE_MATCH
        } else {
            MatchResult::NO_MATCH
        };
    }

    let mut origins_match = form.origin == observed.origin;
    // If this is a replay of the same form after the user entered an invalid
    // password, the origin of the new form may equal the action of the first
    // one instead.
    origins_match = origins_match || (form.origin == observed.action);
    // A failed login on an HTTP page may redirect to an HTTPS copy of the
    // same form (http://example.org -> https://example.org/auth): same host
    // and port, upgraded scheme, path equal to or extending the old one.
    if !origins_match {
        if let (Some(observed_origin), Some(form_origin)) =
            (observed.origin.as_ref(), form.origin.as_ref())
        {
            origins_match = !is_cryptographic_scheme(observed_origin)
                && is_cryptographic_scheme(form_origin)
                && observed_origin.host_str() == form_origin.host_str()
                && observed_origin.port() == form_origin.port()
                && form_origin.path().starts_with(observed_origin.path());
        }
    }

    if !origins_match {
        return MatchResult::NO_MATCH;
    }

    let mut result = MatchResult {
        origins_match: true,
        ..MatchResult::NO_MATCH
    };

    // Autofill predictions can overwrite the default username selection, so
    // a form parsed with predictions may name a different username element.
    if (form.was_parsed_using_autofill_predictions
        || form.username_element == observed.username_element)
        && form.password_element == observed.password_element
    {
        result.attributes_match = true;
    }

    if form.action == observed.action {
        result.action_match = true;
    }

    result
}

/// Input for form matching over a serialization boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInput {
    /// The form a manager is tracking.
    pub observed_form: CredentialForm,
    /// The form the renderer just reported.
    pub submitted_form: CredentialForm,
}

/// Match two forms from a JSON string input and return the [`MatchResult`]
/// as a JSON string. Convenience function for FFI.
pub fn match_forms_json(input_json: &str) -> EngineResult<String> {
    let input: MatchInput = serde_json::from_str(input_json)?;
    let output = does_manage(&input.observed_form, &input.submitted_form);
    let output_json = serde_json::to_string(&output)?;
    Ok(output_json)
}
