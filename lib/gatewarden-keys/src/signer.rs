//! Dual-algorithm JWT Signer (spec §4.C).
//!
//! Verification never trusts the caller's expectation of which algorithm
//! was used -- it dispatches purely off the token header's own `alg`/`kid`,
//! so a token signed under one algorithm can never be accepted as if it
//! were signed under the other (spec §8 "No downgrade").

use std::sync::Arc;

use gatewarden_common::TokenPayload;
use jsonwebtoken::{decode, decode_header, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::SignerError, key_store::parse_private_pem, KeyStore};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    Hs256,
    Rs256,
}

impl Algorithm {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HS256" => Some(Self::Hs256),
            "RS256" => Some(Self::Rs256),
            _ => None,
        }
    }
}

pub struct Signer {
    keys: Arc<KeyStore>,
    default_algorithm: Algorithm,
}

impl Signer {
    pub fn new(keys: Arc<KeyStore>, default_algorithm: Algorithm) -> Self {
        Self {
            keys,
            default_algorithm,
        }
    }

    /// Sign `claims` under `algorithm_override` if given, falling back to
    /// the process default (spec §4.C: "tenant config (preferred) or a
    /// process env; default HS256").
    pub fn sign(
        &self,
        claims: &TokenPayload,
        algorithm_override: Option<Algorithm>,
    ) -> Result<String, SignerError> {
        match algorithm_override.unwrap_or(self.default_algorithm) {
            Algorithm::Hs256 => {
                let header = Header::new(jsonwebtoken::Algorithm::HS256);
                let key = EncodingKey::from_secret(&self.keys.symmetric_secret_bytes());
                encode(&header, claims, &key).map_err(|err| SignerError::Encode(err.to_string()))
            }
            Algorithm::Rs256 => {
                let meta = self.keys.ensure_active_key()?;
                let (kid, pem) = self
                    .keys
                    .active_signing_pem()
                    .filter(|(active_kid, _)| *active_kid == meta.kid)
                    .ok_or(SignerError::KeyStore(crate::KeyStoreError::NoActiveKey))?;

                let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
                header.kid = Some(kid);

                let private_key = parse_private_pem(&pem)?;
                let der = private_key_to_pkcs1_der(&private_key)
                    .map_err(|err| SignerError::Encode(err.to_string()))?;
                let key = EncodingKey::from_rsa_der(&der);

                encode(&header, claims, &key).map_err(|err| SignerError::Encode(err.to_string()))
            }
        }
    }

    /// Verify signature only -- expiration is left to the caller so the
    /// request context can surface an `expired` flag instead of a hard
    /// failure (spec §4.C).
    pub fn verify(&self, token: &str) -> Result<TokenPayload, SignerError> {
        let header = decode_header(token).map_err(|_| SignerError::UnknownVerifier)?;

        let mut validation = match header.alg {
            jsonwebtoken::Algorithm::HS256 => Validation::new(jsonwebtoken::Algorithm::HS256),
            jsonwebtoken::Algorithm::RS256 => Validation::new(jsonwebtoken::Algorithm::RS256),
            _ => return Err(SignerError::UnknownVerifier),
        };
        validation.validate_exp = false;
        validation.validate_aud = false;

        let decoding_key = match header.alg {
            jsonwebtoken::Algorithm::HS256 => {
                DecodingKey::from_secret(&self.keys.symmetric_secret_bytes())
            }
            jsonwebtoken::Algorithm::RS256 => {
                let kid = header.kid.as_deref().ok_or(SignerError::UnknownVerifier)?;
                let pem = self
                    .keys
                    .find_public_pem(kid)
                    .ok_or(SignerError::UnknownVerifier)?;
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|err| SignerError::Verification(err.to_string()))?
            }
            _ => unreachable!("filtered above"),
        };

        let data = decode::<TokenPayload>(token, &decoding_key, &validation)
            .map_err(|err| SignerError::Verification(err.to_string()))?;
        Ok(data.claims)
    }
}

fn private_key_to_pkcs1_der(key: &rsa::RsaPrivateKey) -> Result<Vec<u8>, rsa::pkcs1::Error> {
    use rsa::pkcs1::EncodeRsaPrivateKey;
    key.to_pkcs1_der().map(|doc| doc.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> TokenPayload {
        TokenPayload {
            iss: "gatewarden".into(),
            sub: "user-1".into(),
            aud: "client-1".into(),
            exp: i64::MAX / 2,
            iat: 0,
            auth_time: 0,
            tenant: "acme".into(),
            responsibility: "hash".into(),
            role: "member".into(),
            user: "user-1".into(),
            scope: "read+write".into(),
            profile: json!({"name": "unicode-\u{1F600}", "nested": {"a": 1}}),
        }
    }

    #[test]
    fn hs256_sign_then_verify_round_trips() {
        let store = Arc::new(KeyStore::new("very-secret".into()));
        let signer = Signer::new(store, Algorithm::Hs256);

        let claims = sample_claims();
        let token = signer.sign(&claims, None).unwrap();
        let verified = signer.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn rs256_sign_then_verify_round_trips() {
        let store = Arc::new(KeyStore::new("secret".into()));
        let signer = Signer::new(store, Algorithm::Rs256);

        let claims = sample_claims();
        let token = signer.sign(&claims, Some(Algorithm::Rs256)).unwrap();
        let verified = signer.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn alg_confusion_attack_is_rejected() {
        // Classic RS256 -> HS256 downgrade: forge an HS256 token using the
        // RSA public PEM bytes as the HMAC secret. It must not verify,
        // since our symmetric secret is unrelated to the RSA public key.
        let store = Arc::new(KeyStore::new("unrelated-secret".into()));
        store.generate_and_store("k1", true).unwrap();
        let public_pem = store.active_key_metadata().map(|m| m.kid).unwrap();
        let public_pem = store.find_public_pem(&public_pem).unwrap();

        let mut header = Header::new(jsonwebtoken::Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let forged = encode(
            &header,
            &sample_claims(),
            &EncodingKey::from_secret(public_pem.as_bytes()),
        )
        .unwrap();

        let signer = Signer::new(store, Algorithm::Rs256);
        assert!(signer.verify(&forged).is_err());
    }
}
