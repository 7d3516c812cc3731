//! Candidate scoring and best-match resolution.
//!
//! Given an observed form and the credentials the store returned for it,
//! rank each candidate, keep the best one per username, protect a few
//! lower-scoring ones that must stay fillable, and separate out blacklist
//! markers. This step is pure and is the part of the matching phase exposed
//! over FFI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::form::{CredentialForm, CredentialKind, FormScheme};
use crate::urls::{path_segments, same_scheme_host_port_opt};

/// When comparing path segments, only consider at most 63 of them, so that
/// the potential gain from a shared path prefix is never more than from an
/// exact origin match.
const SEGMENT_COUNT_CAP: usize = 63;

/// Score a stored candidate against the observed form.
///
/// The most important element that should match is the signon realm,
/// followed by the origin, the action, the password element name, the
/// submit element name, and finally the username element name:
/// - not being a public-suffix match adds 128 (bit 7);
/// - an exact origin match adds 64 (bit 6) plus the capped number of path
///   segments;
/// - a partial origin match adds 1 per shared leading path segment, plus 32
///   (bit 5) when any segment matched at all.
///
/// That way a partial match cannot trump an exact match even if the partial
/// one matches all other attributes, regardless of the matching depth in
/// the URL path.
pub fn score_candidate(
    observed: &CredentialForm,
    observed_path_segments: &[String],
    candidate: &CredentialForm,
) -> u32 {
    debug_assert!(!candidate.blacklisted_by_user);

    let capped_segment_count = observed_path_segments.len().min(SEGMENT_COUNT_CAP);

    let mut score = 0u32;
    if !candidate.is_public_suffix_match() {
        score += 1 << 7;
    }
    if candidate.origin == observed.origin {
        // The common case is a single match in the store for the given host,
        // so the full path walk below is usually not needed.
        score += (1 << 6) + capped_segment_count as u32;
    } else {
        // Walk the origin URL paths one directory at a time to see how deep
        // the two match.
        let candidate_segments = candidate
            .origin
            .as_ref()
            .map(path_segments)
            .unwrap_or_default();
        let max_dirs = capped_segment_count.min(candidate_segments.len());
        let mut depth = 0usize;
        while depth < max_dirs && observed_path_segments[depth] == candidate_segments[depth] {
            depth += 1;
            score += 1;
        }
        if depth > 0 {
            score += 1 << 5;
        }
    }
    if observed.scheme == FormScheme::Html {
        if candidate.action == observed.action {
            score += 1 << 3;
        }
        if candidate.password_element == observed.password_element {
            score += 1 << 2;
        }
        if candidate.submit_element == observed.submit_element {
            score += 1 << 1;
        }
        if candidate.username_element == observed.username_element {
            score += 1 << 0;
        }
    }

    score
}

/// Return false iff the strings are neither empty nor equal.
fn strings_equal_or_empty(a: &str, b: &str) -> bool {
    a.is_empty() || b.is_empty() || a == b
}

/// Whether a stored blacklist marker applies to the observed form: same
/// scheme+host+port origin, not itself a public-suffix match, and (for HTML
/// forms) element names pairwise equal or absent.
pub fn is_blacklist_match(observed: &CredentialForm, blacklisted_form: &CredentialForm) -> bool {
    debug_assert!(blacklisted_form.blacklisted_by_user);

    if blacklisted_form.is_public_suffix_match() {
        return false;
    }
    if !same_scheme_host_port_opt(
        blacklisted_form.origin.as_ref(),
        observed.origin.as_ref(),
    ) {
        return false;
    }
    if observed.scheme == FormScheme::Html {
        if !strings_equal_or_empty(&blacklisted_form.submit_element, &observed.submit_element) {
            return false;
        }
        if !strings_equal_or_empty(&blacklisted_form.password_element, &observed.password_element) {
            return false;
        }
        if !strings_equal_or_empty(&blacklisted_form.username_element, &observed.username_element) {
            return false;
        }
    }
    true
}

/// Input for candidate resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResolutionInput {
    /// The observed form being matched.
    pub observed_form: CredentialForm,
    /// Credentials the store returned for that form, already filtered by the
    /// platform where filtering is needed.
    #[serde(default)]
    pub store_results: Vec<CredentialForm>,
}

/// Outcome of candidate resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateResolution {
    /// The best-scoring stored credential per username, at most one entry
    /// per username.
    pub best_matches: BTreeMap<String, CredentialForm>,
    /// Username of the entry the platform should prefill, when any.
    pub preferred_username: Option<String>,
    /// Stored blacklist markers that apply to the observed form.
    pub blacklisted_matches: Vec<CredentialForm>,
}

/// Rank the store results for an observed form and keep the usable ones.
///
/// Candidates scoring below the best score are dropped, except for two
/// protected classes that must stay fillable: empty-path origins (most
/// commonly imports from other browsers) and generated passwords (a
/// password generated on a signup form must show on the login form even if
/// a better-matching credential exists). Protected candidates only fill in
/// usernames that no best-scoring candidate claimed.
pub fn resolve_candidates(
    observed: &CredentialForm,
    results: Vec<CredentialForm>,
) -> CandidateResolution {
    let mut resolution = CandidateResolution::default();

    // Separate out blacklist markers; the ones that don't apply to this form
    // are dropped entirely.
    let mut candidates: Vec<CredentialForm> = Vec::with_capacity(results.len());
    for form in results {
        if form.blacklisted_by_user {
            if is_blacklist_match(observed, &form) {
                resolution.blacklisted_matches.push(form);
            }
        } else {
            candidates.push(form);
        }
    }

    let observed_segments = observed
        .origin
        .as_ref()
        .map(path_segments)
        .unwrap_or_default();

    let scores: Vec<u32> = candidates
        .iter()
        .map(|candidate| score_candidate(observed, &observed_segments, candidate))
        .collect();
    let best_score = scores.iter().copied().max().unwrap_or(0);
    if best_score == 0 {
        return resolution;
    }

    // Fill best_matches with the best-scoring credentials first and keep the
    // worse-scoring protected ones for later.
    let mut protected_credentials: Vec<CredentialForm> = Vec::new();
    for (candidate, score) in candidates.into_iter().zip(scores) {
        if score < best_score {
            let empty_path_origin = candidate
                .origin
                .as_ref()
                .map_or(true, |url| url.path().is_empty() || url.path() == "/");
            let mut is_protected =
                observed.scheme == FormScheme::Html && empty_path_origin && score > 0;
            is_protected |= candidate.kind == CredentialKind::Generated;

            if is_protected {
                protected_credentials.push(candidate);
            }
            continue;
        }

        // If there is another best-score match for the same username, the
        // later candidate replaces it.
        let username = candidate.username_value.clone();
        if resolution.preferred_username.as_deref() == Some(username.as_str())
            && resolution.best_matches.contains_key(&username)
        {
            resolution.preferred_username = None;
        }
        let is_preferred = candidate.preferred;
        resolution.best_matches.insert(username.clone(), candidate);
        if is_preferred {
            resolution.preferred_username = Some(username);
        }
    }

    // Add the protected results for usernames that don't already have one.
    for protege in protected_credentials {
        let username = protege.username_value.clone();
        resolution.best_matches.entry(username).or_insert(protege);
    }

    // A user may have chosen to forget the previously preferred match, so
    // there can be matches without a preferred one. Pick the first; whatever
    // the user submits will be saved as preferred.
    if resolution.preferred_username.is_none() {
        resolution.preferred_username = resolution.best_matches.keys().next().cloned();
    }

    resolution
}

/// Resolve candidates from a JSON string input and return JSON string
/// output. Convenience function for FFI.
pub fn resolve_candidates_json(input_json: &str) -> EngineResult<String> {
    let input: CandidateResolutionInput = serde_json::from_str(input_json)?;
    let output = resolve_candidates(&input.observed_form, input.store_results);
    let output_json = serde_json::to_string(&output)?;
    Ok(output_json)
}
