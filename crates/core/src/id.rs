// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed entity identifiers
//!
//! Every entity gets its own newtype over an owned string so a run id can
//! never be passed where a worker id is expected. Generated ids carry a
//! four-character type prefix (`run-`, `wkr-`, …) followed by a random
//! suffix; seeded rows use short fixed ids (`default`, `admin`) instead,
//! so no length is imposed on parsed ids.

/// Random characters after the type prefix in a generated id.
pub const ID_RANDOM_LEN: usize = 19;

/// Define an entity identifier newtype with a type prefix.
///
/// Generates `new()` (prefix + [`ID_RANDOM_LEN`] random characters),
/// `from_string()` for values arriving from the database, paths, or query
/// strings, and the comparison and formatting impls the repositories and
/// in-process registries rely on. `Borrow<str>` keeps ids usable as map
/// keys looked up by `&str`.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct RunId("run-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random id with the type prefix.
            pub fn new() -> Self {
                Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(($crate::id::ID_RANDOM_LEN))))
            }

            /// Wrap an id that already exists elsewhere: a database row, a
            /// path segment, a query parameter, or a seeded fixed id.
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
