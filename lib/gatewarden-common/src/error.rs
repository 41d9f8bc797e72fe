//! Canonical error reasons (spec §7 "Error handling design").
//!
//! Kept independent of any HTTP framework so the script provider, session
//! store and web layer can all produce/match the same reasons; the axum
//! `IntoResponse` mapping lives in the root crate's `error` module.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("NOT_ACCEPTABLE_REQUEST")]
    NotAcceptableRequest,
    #[error("NO_TENANT")]
    NoTenant,
    #[error("NO_CLIENT")]
    NoClient,
    #[error("WRONG_CLIENT_SECRET")]
    WrongClientSecret,
    #[error("UNSUPPORTED_GRANT_TYPE")]
    UnsupportedGrantType,
    #[error("INVALID_CODE")]
    InvalidCode,
    #[error("INVALID_TOKEN")]
    InvalidToken,
    #[error("CODE_CHALLENGE_METHOD_MISMATCH")]
    CodeChallengeMethodMismatch,
    #[error("TENANT_MISMATCH")]
    TenantMismatch,
    #[error("REDIRECT_MISMATCH")]
    RedirectMismatch,
    #[error("WRONG_REFERER")]
    WrongReferer,
    #[error("CLIENT_ONLY_SUPPORTS_PKCE")]
    ClientOnlySupportsPkce,
    #[error("WRONG_CREDENTIALS")]
    WrongCredentials,
    #[error("INVALIDATE")]
    Invalidate,
    #[error("EXPECTED_VALUE_UNSET")]
    ExpectedValueUnset,
    #[error("CODE_STORAGE_AVAILABILITY")]
    CodeStorageAvailability,
    #[error("TENANT_NOT_ALLOWED")]
    TenantNotAllowed,
    #[error("BADLOGINID")]
    BadLoginId,
    #[error("CODE_TAKEN")]
    CodeTaken,
    #[error("PROVIDER_UNAVAILABLE")]
    ProviderUnavailable,
}

impl ErrorKind {
    /// The numeric status a REST handler should answer with, per spec §7's
    /// table. Kept here (rather than depending on `http::StatusCode`) so
    /// this crate has no HTTP dependency.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotAcceptableRequest
            | Self::NoTenant
            | Self::NoClient
            | Self::UnsupportedGrantType
            | Self::ClientOnlySupportsPkce
            | Self::BadLoginId => 400,
            Self::WrongClientSecret | Self::InvalidToken => 401,
            Self::InvalidCode
            | Self::CodeChallengeMethodMismatch
            | Self::TenantMismatch
            | Self::RedirectMismatch
            | Self::WrongReferer
            | Self::WrongCredentials
            | Self::Invalidate
            | Self::TenantNotAllowed
            | Self::CodeTaken => 403,
            Self::ExpectedValueUnset | Self::ProviderUnavailable => 500,
            Self::CodeStorageAvailability => 507,
        }
    }

    /// The `ERRORS.*` reason key rendered to API/HTML clients.
    pub fn reason_key(self) -> String {
        format!("ERRORS.{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_key_is_prefixed() {
        assert_eq!(ErrorKind::NoTenant.reason_key(), "ERRORS.NO_TENANT");
    }
}
