// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Rapport analysis service.
//!
//! This crate provides the error type, the transcript and report types, and
//! the capability traits for the external collaborators (identity,
//! generation, storage). Every other crate in the workspace builds on it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RapportError;
pub use types::{AdapterType, HealthStatus, UserId};

pub use traits::{GenerationAdapter, IdentityAdapter, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Generation,
            AdapterType::Identity,
            AdapterType::Storage,
        ] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = types::AuthToken("secret-value".into());
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-value"));
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_generation_adapter<T: GenerationAdapter>() {}
        fn _assert_identity_adapter<T: IdentityAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
