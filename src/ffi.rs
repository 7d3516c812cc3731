//! C FFI exports for .NET P/Invoke.
//!
//! These functions provide a C-compatible interface for calling Rust functions from C#.
//! All functions use JSON strings for input/output to simplify marshalling.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::form_manager::{resolve_candidates, CandidateResolutionInput};
use crate::form_matcher::{does_manage, MatchInput};

/// Rank store results against an observed form.
///
/// # Safety
///
/// - `input_json` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result
/// (CandidateResolution). Returns null on error.
#[no_mangle]
pub unsafe extern "C" fn resolve_candidates_ffi(input_json: *const c_char) -> *mut c_char {
    if input_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(input_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let input: CandidateResolutionInput = match serde_json::from_str(c_str) {
        Ok(i) => i,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    let output = resolve_candidates(&input.observed_form, input.store_results);

    match serde_json::to_string(&output) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Grade a submitted form against an observed one.
///
/// # Safety
///
/// - `input_json` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result (MatchResult).
/// Returns null on error.
#[no_mangle]
pub unsafe extern "C" fn match_forms_ffi(input_json: *const c_char) -> *mut c_char {
    if input_json.is_null() {
        return ptr::null_mut();
    }

    let c_str = match CStr::from_ptr(input_json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let input: MatchInput = match serde_json::from_str(c_str) {
        Ok(i) => i,
        Err(e) => {
            return create_error_response(&format!("Failed to parse input: {}", e));
        }
    };

    let output = does_manage(&input.observed_form, &input.submitted_form);

    match serde_json::to_string(&output) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Failed to serialize output: {}", e)),
    }
}

/// Get the version of the credkeeper-core library.
///
/// # Safety
///
/// - The returned pointer must be freed by calling `free_string`
#[no_mangle]
pub extern "C" fn get_core_version_ffi() -> *mut c_char {
    string_to_c_char(crate::core_version().to_string())
}

/// Free a string that was allocated by Rust.
///
/// # Safety
///
/// - `s` must be a pointer that was returned by one of the FFI functions
/// - This function must only be called once per pointer
/// - After calling this function, the pointer is invalid
#[no_mangle]
pub unsafe extern "C" fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Convert a Rust string to a C string pointer.
fn string_to_c_char(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Create an error response JSON string.
fn create_error_response(message: &str) -> *mut c_char {
    let error_json = format!(
        r#"{{"success":false,"error":"{}"}}"#,
        message.replace('"', r#"\""#)
    );
    string_to_c_char(error_json)
}
