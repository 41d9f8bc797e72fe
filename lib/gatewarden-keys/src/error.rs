use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("rsa key generation failed: {0}")]
    Generation(String),
    #[error("no active RSA key")]
    NoActiveKey,
    #[error("pem encode/decode error: {0}")]
    Pem(String),
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("unknown alg/kid in token header")]
    UnknownVerifier,
    #[error("signature verification failed: {0}")]
    Verification(String),
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
}
