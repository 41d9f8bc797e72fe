//! Types shared between the web layer, the session store and the script
//! provider: token claims, PKCE verification and the canonical error
//! reasons from the error handling design.

pub mod claims;
pub mod error;
pub mod pkce;

pub use claims::TokenPayload;
pub use error::ErrorKind;
