//! CSPRNG value generation (spec §4.D): `[A-Za-z0-9]`, length >= 32 for
//! codes/refresh/login-nonce values. PKCE verifiers are generated by the
//! client, not here -- see `gatewarden_common::pkce` for their validation.

use rand::{distributions::Alphanumeric, Rng};

pub const CODE_VALUE_LEN: usize = 40;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_code_value() -> String {
    random_alphanumeric(CODE_VALUE_LEN)
}

pub fn generate_login_nonce() -> String {
    random_alphanumeric(CODE_VALUE_LEN)
}
