//! CredKeeper Core Library
//!
//! Cross-platform core functionality for CredKeeper, including:
//! - **form_manager**: per-form decision lifecycle — candidate scoring,
//!   provisional save, save-vs-update resolution
//! - **coordinator**: page-scoped submission tracking and the final
//!   prompt-or-save decision
//! - **form_matcher**: deciding whether two parsed forms denote the same form
//!
//! The stateful engine is the Rust-native API: the embedder owns a
//! [`SubmissionCoordinator`] per page and implements the [`CredentialStore`]
//! and [`ManagerClient`] traits for its storage and UI. The pure decision
//! steps (candidate resolution, form matching) are additionally exposed as
//! JSON entry points so the non-Rust platforms (browser extension, iOS,
//! Android, .NET) can call them directly.
//!
//! # Example (conceptual)
//! ```ignore
//! let mut coordinator = SubmissionCoordinator::new(EngineSettings::default());
//!
//! // Page load: the renderer reports parsed forms, the store is queried.
//! coordinator.on_password_forms_parsed(&forms, &mut client, &mut store);
//! coordinator.on_store_results(consumer_id, results, &mut client, &mut store);
//!
//! // Submission and post-submit load: prompt-or-save happens inside.
//! coordinator.on_password_form_submitted(&submitted, &mut client);
//! coordinator.on_password_forms_rendered(&visible, true, &mut client, &mut store);
//! ```

pub mod client;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod form;
pub mod form_manager;
pub mod form_matcher;
pub mod logger;
pub mod settings;
pub mod store;
pub mod urls;

pub use client::{CredentialSource, ManagerClient};
pub use coordinator::{ProvisionalSaveFailure, SubmissionCoordinator};
pub use error::{EngineError, EngineResult};
pub use form::{CredentialForm, CredentialKind, FormLayout, FormScheme};
pub use form_manager::{
    resolve_candidates, resolve_candidates_json, CandidateResolution, CandidateResolutionInput,
    FormManagerId, OtherUsernamesAction, PendingFormManager, SubmitResult,
};
pub use form_matcher::{does_manage, match_forms_json, MatchInput, MatchResult};
pub use settings::EngineSettings;
pub use store::{
    CredentialStore, PassThroughFilter, PromptPolicy, StoreMetricsReporter, StoreResultFilter,
};

/// Version of the credkeeper-core library.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// WASM bindings
#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::*;

// C FFI exports for .NET P/Invoke
#[cfg(feature = "ffi")]
pub mod ffi;

// UniFFI bindings for Swift/Kotlin
#[cfg(feature = "uniffi")]
pub mod uniffi_api;

#[cfg(feature = "uniffi")]
pub use uniffi_api::*;

// UniFFI scaffolding - generates the FFI glue code
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

#[cfg(test)]
pub(crate) mod test_support;
