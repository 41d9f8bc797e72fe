//! Sandboxed per-request script provider (spec §4.E).
//!
//! The original specification describes a JavaScript-like engine exposing
//! `class UserLoginProvider`/`UserValidationProvider` with property
//! getters. `rhai` (the embeddable scripting language this crate and its
//! sibling "Unified-Auth-Controller"-shaped services in the ecosystem
//! reach for) has no JS class syntax, so tenant scripts instead define two
//! plain functions returning object maps -- the getters become map fields,
//! "class instantiation" becomes a function call. This is a syntactic
//! adaptation only; the behavioral contract (inputs, outputs, `commit`,
//! `fetch`, host logging) is unchanged:
//!
//! ```text
//! fn user_login_provider(credentials) {
//!     // credentials.username / credentials.password
//!     #{ can_login: true, user_profile: #{}, role: "member", scopes: ["read"] }
//! }
//!
//! fn user_validation_provider(user) {
//!     #{ is_valid: true }
//! }
//! ```

mod error;
mod fetch;
mod host;
mod provider;
#[cfg(test)]
mod tests;

pub use error::ScriptError;
pub use provider::{LoginOutcome, ScriptProvider, ValidationOutcome};
