//! WASM bindings for browser extension.
//!
//! The extension owns the store and the page hooks; it calls into the pure
//! decision steps exposed here.

use wasm_bindgen::prelude::*;

use crate::form_manager::{resolve_candidates, CandidateResolution, CandidateResolutionInput};
use crate::form_matcher::{does_manage, MatchInput, MatchResult};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

/// Initialize panic hook for better error messages.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the version of the credkeeper-core library.
#[wasm_bindgen(js_name = getCoreVersion)]
pub fn get_core_version() -> String {
    crate::core_version().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Candidate Resolution WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Rank store results against an observed form.
///
/// Takes a JsValue (CandidateResolutionInput) and returns a JsValue
/// (CandidateResolution).
#[wasm_bindgen(js_name = resolveCandidates)]
pub fn resolve_candidates_js(input: JsValue) -> Result<JsValue, JsValue> {
    let input: CandidateResolutionInput = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;

    let output: CandidateResolution =
        resolve_candidates(&input.observed_form, input.store_results);

    serde_wasm_bindgen::to_value(&output)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {}", e)))
}

/// Resolve candidates using JSON strings (alternative API).
///
/// Takes a JSON string and returns a JSON string.
#[wasm_bindgen(js_name = resolveCandidatesJson)]
pub fn resolve_candidates_json_js(input_json: &str) -> Result<String, JsValue> {
    crate::form_manager::resolve_candidates_json(input_json)
        .map_err(|e| JsValue::from_str(&format!("Resolution failed: {}", e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Form Matching WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Grade a submitted form against an observed one.
///
/// Takes a JsValue (MatchInput) and returns a JsValue (MatchResult).
#[wasm_bindgen(js_name = matchForms)]
pub fn match_forms_js(input: JsValue) -> Result<JsValue, JsValue> {
    let input: MatchInput = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;

    let output: MatchResult = does_manage(&input.observed_form, &input.submitted_form);

    serde_wasm_bindgen::to_value(&output)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {}", e)))
}

/// Match forms using JSON strings (alternative API).
///
/// Takes a JSON string and returns a JSON string.
#[wasm_bindgen(js_name = matchFormsJson)]
pub fn match_forms_json_js(input_json: &str) -> Result<String, JsValue> {
    crate::form_matcher::match_forms_json(input_json)
        .map_err(|e| JsValue::from_str(&format!("Matching failed: {}", e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Domain Helper WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Extract the registrable (root) domain from a host.
///
/// E.g., "sub.example.com" -> "example.com"
/// E.g., "sub.example.co.uk" -> "example.co.uk"
#[wasm_bindgen(js_name = extractRootDomain)]
pub fn extract_root_domain_js(host: &str) -> String {
    crate::domain::extract_root_domain(host)
}
