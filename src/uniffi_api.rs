//! UniFFI API module for Swift and Kotlin bindings.
//!
//! This module exposes the pure decision steps via UniFFI for mobile
//! platforms. All functions use JSON strings for input/output to simplify
//! cross-language marshalling; the stateful coordinator stays on the Rust
//! side of each platform's glue layer.

use crate::error::EngineError;

/// Get the version of the credkeeper-core library.
#[uniffi::export]
pub fn get_core_version() -> String {
    crate::core_version().to_string()
}

/// Rank store results against an observed form.
///
/// # Arguments
/// * `input_json` - JSON string with format:
///   ```json
///   {
///     "observed_form": {"signon_realm": "...", "origin": "...", ...},
///     "store_results": [{...}, {...}]
///   }
///   ```
///
/// # Returns
/// JSON string with format:
///   ```json
///   {
///     "best_matches": {"alice": {...}},
///     "preferred_username": "alice",
///     "blacklisted_matches": []
///   }
///   ```
#[uniffi::export]
pub fn resolve_candidates_json(input_json: String) -> Result<String, EngineError> {
    crate::form_manager::resolve_candidates_json(&input_json)
}

/// Grade a submitted form against an observed one.
///
/// # Arguments
/// * `input_json` - JSON string with format:
///   ```json
///   {
///     "observed_form": {...},
///     "submitted_form": {...}
///   }
///   ```
///
/// # Returns
/// JSON string with format:
///   ```json
///   {"origins_match": true, "attributes_match": true, "action_match": false}
///   ```
#[uniffi::export]
pub fn match_forms_json(input_json: String) -> Result<String, EngineError> {
    crate::form_matcher::match_forms_json(&input_json)
}

/// Extract the registrable (root) domain from a host.
/// Example: "sub.example.co.uk" -> "example.co.uk"
#[uniffi::export]
pub fn extract_root_domain(host: String) -> String {
    crate::domain::extract_root_domain(&host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_candidates_json() {
        let input = r#"{
            "observed_form": {
                "signon_realm": "https://example.com/",
                "origin": "https://example.com/login"
            },
            "store_results": []
        }"#;

        let result = resolve_candidates_json(input.to_string());
        assert!(result.is_ok());

        let output: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();
        assert!(output["best_matches"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_match_forms_json() {
        let form = r#"{
            "signon_realm": "https://example.com/",
            "origin": "https://example.com/login",
            "action": "https://example.com/do_login",
            "username_element": "u",
            "password_element": "p"
        }"#;
        let input = format!(
            r#"{{"observed_form": {}, "submitted_form": {}}}"#,
            form, form
        );

        let output_json = match_forms_json(input).unwrap();
        let output: serde_json::Value = serde_json::from_str(&output_json).unwrap();
        assert_eq!(output["origins_match"], true);
        assert_eq!(output["attributes_match"], true);
        assert_eq!(output["action_match"], true);
    }

    #[test]
    fn test_extract_root_domain() {
        assert_eq!(
            extract_root_domain("www.example.com".to_string()),
            "example.com"
        );
        assert_eq!(
            extract_root_domain("login.example.co.uk".to_string()),
            "example.co.uk"
        );
    }
}
