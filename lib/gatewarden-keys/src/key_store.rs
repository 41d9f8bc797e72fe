//! Key Store (spec §4.B): `N` RSA key pairs plus a process-scoped symmetric
//! secret. Operations are serialized behind a single mutex -- readers of
//! the JWK set see a point-in-time snapshot, and key generation blocks
//! other key-store operations until it completes (spec §5).

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding},
    RsaPrivateKey, RsaPublicKey,
};
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;

use crate::{
    error::KeyStoreError,
    jwks::{Jwk, Jwks},
};

pub const RSA_KEY_BITS: usize = 2048;

#[derive(Clone)]
pub struct RsaKeyPair {
    pub kid: String,
    pub private_pem: String,
    pub public_pem: String,
    pub created_at: OffsetDateTime,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub struct KeyMetadata {
    pub kid: String,
    pub created_at: OffsetDateTime,
}

struct Inner {
    secret: SecretString,
    rsa_keys: Vec<RsaKeyPair>,
}

pub struct KeyStore {
    inner: Mutex<Inner>,
}

impl KeyStore {
    pub fn new(symmetric_secret: String) -> Self {
        Self {
            inner: Mutex::new(Inner {
                secret: SecretString::from(symmetric_secret),
                rsa_keys: Vec::new(),
            }),
        }
    }

    pub fn symmetric_secret(&self) -> SecretString {
        self.inner.lock().secret.clone()
    }

    pub fn symmetric_secret_bytes(&self) -> Vec<u8> {
        self.inner.lock().secret.expose_secret().as_bytes().to_vec()
    }

    /// Generate a fresh 2048-bit RSA pair, store it under `kid`, optionally
    /// marking it active (deactivating all others).
    pub fn generate_and_store(
        &self,
        kid: impl Into<String>,
        set_active: bool,
    ) -> Result<KeyMetadata, KeyStoreError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|err| KeyStoreError::Generation(err.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|err| KeyStoreError::Pem(err.to_string()))?
            .to_string();
        let public_pem = public_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|err| KeyStoreError::Pem(err.to_string()))?;

        let kid = kid.into();
        let created_at = OffsetDateTime::now_utc();

        let mut guard = self.inner.lock();
        if set_active {
            for key in guard.rsa_keys.iter_mut() {
                key.active = false;
            }
        }
        guard.rsa_keys.push(RsaKeyPair {
            kid: kid.clone(),
            private_pem,
            public_pem,
            created_at,
            active: set_active || guard.rsa_keys.is_empty(),
        });

        Ok(KeyMetadata { kid, created_at })
    }

    /// Lazily generate the first active key if none exists yet (spec §4.B:
    /// "On process start with no keys present and RS256 selected, the Key
    /// Store lazily generates one before first sign").
    pub fn ensure_active_key(&self) -> Result<KeyMetadata, KeyStoreError> {
        if let Some(meta) = self.active_key_metadata() {
            return Ok(meta);
        }
        let today = OffsetDateTime::now_utc();
        let kid = format!(
            "{:04}-{:02}-{:02}",
            today.year(),
            u8::from(today.month()),
            today.day()
        );
        self.generate_and_store(kid, true)
    }

    pub fn active_signing_pem(&self) -> Option<(String, String)> {
        let guard = self.inner.lock();
        guard
            .rsa_keys
            .iter()
            .find(|key| key.active)
            .map(|key| (key.kid.clone(), key.private_pem.clone()))
    }

    pub fn active_key_metadata(&self) -> Option<KeyMetadata> {
        let guard = self.inner.lock();
        guard.rsa_keys.iter().find(|key| key.active).map(|key| KeyMetadata {
            kid: key.kid.clone(),
            created_at: key.created_at,
        })
    }

    pub fn find_public_pem(&self, kid: &str) -> Option<String> {
        let guard = self.inner.lock();
        guard
            .rsa_keys
            .iter()
            .find(|key| key.kid == kid)
            .map(|key| key.public_pem.clone())
    }

    /// Emit a point-in-time JWK Set snapshot (spec §4.B, §4.J, §8 scenario 6).
    pub fn public_jwks(&self) -> Jwks {
        let guard = self.inner.lock();
        let keys = guard
            .rsa_keys
            .iter()
            .filter_map(|key| Jwk::from_pkcs1_public_pem(&key.kid, &key.public_pem).ok())
            .collect();
        Jwks { keys }
    }

    /// Delete keys created before `cutoff`, never touching the active one.
    pub fn remove_older_than(&self, cutoff: OffsetDateTime) {
        let mut guard = self.inner.lock();
        guard
            .rsa_keys
            .retain(|key| key.active || key.created_at >= cutoff);
    }
}

pub(crate) fn parse_public_pem(pem: &str) -> Result<RsaPublicKey, KeyStoreError> {
    RsaPublicKey::from_pkcs1_pem(pem).map_err(|err| KeyStoreError::Pem(err.to_string()))
}

pub(crate) fn parse_private_pem(pem: &str) -> Result<RsaPrivateKey, KeyStoreError> {
    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|err| KeyStoreError::Pem(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_and_store_marks_single_active_key() {
        let store = KeyStore::new("secret".to_string());
        store.generate_and_store("2026-01-01", true).unwrap();
        store.generate_and_store("2026-02-01", true).unwrap();

        let active: Vec<_> = store
            .inner
            .lock()
            .rsa_keys
            .iter()
            .filter(|k| k.active)
            .map(|k| k.kid.clone())
            .collect();
        assert_eq!(active, vec!["2026-02-01"]);
    }

    #[test]
    fn remove_older_than_never_deletes_active() {
        let store = KeyStore::new("secret".to_string());
        store.generate_and_store("old", true).unwrap();
        store.remove_older_than(OffsetDateTime::now_utc() + time::Duration::days(1));

        assert!(store.active_key_metadata().is_some());
    }
}
