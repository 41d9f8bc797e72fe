//! PKCE (RFC 7636) challenge/verifier handling.
//!
//! Per spec §9 "Open questions", the `plain` method is normalized to
//! `verifier == challenge` uniformly -- the legacy source's inconsistent
//! branch (sometimes comparing against `code_challenge` on the token
//! request) is treated as a defect and not reproduced here.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MIN_VERIFIER_LEN: usize = 43;
pub const MAX_VERIFIER_LEN: usize = 128;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChallengeMethod {
    Plain,
    S256,
}

impl ChallengeMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(Self::Plain),
            "S256" => Some(Self::S256),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PkceChallenge {
    pub challenge: String,
    pub method: ChallengeMethod,
}

/// `true` iff `verifier` is a valid RFC 7636 code verifier: `[A-Za-z0-9-._~]`,
/// length in `[43, 128]`.
pub fn is_valid_verifier(verifier: &str) -> bool {
    let len = verifier.len();
    (MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len)
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

pub fn derive_s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Verify a token-request `code_verifier` against the challenge captured at
/// `/authorize` time.
pub fn verify(challenge: &PkceChallenge, verifier: &str) -> bool {
    match challenge.method {
        ChallengeMethod::Plain => verifier == challenge.challenge,
        ChallengeMethod::S256 => derive_s256_challenge(verifier) == challenge.challenge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_happy_path() {
        let verifier = "a".repeat(43);
        let challenge = derive_s256_challenge(&verifier);
        assert_eq!(challenge, "OOsYWuMQkiVOQxZzRmfxzEyiM2nmX_fNMg-4G2H7XTU");
        assert!(verify(
            &PkceChallenge {
                challenge: challenge.clone(),
                method: ChallengeMethod::S256,
            },
            &verifier
        ));
    }

    #[test]
    fn verifier_length_boundary() {
        assert!(is_valid_verifier(&"a".repeat(43)));
        assert!(!is_valid_verifier(&"a".repeat(42)));
        assert!(!is_valid_verifier(&"a".repeat(129)));
    }

    #[test]
    fn plain_requires_exact_match() {
        let challenge = PkceChallenge {
            challenge: "xyz".to_string(),
            method: ChallengeMethod::Plain,
        };
        assert!(verify(&challenge, "xyz"));
        assert!(!verify(&challenge, "abc"));
    }
}
