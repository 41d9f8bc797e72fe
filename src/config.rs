use std::path::PathBuf;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use gatewarden_keys::Algorithm;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Environment-driven configuration (spec §6, ambient knobs per SPEC_FULL §2.1).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnvConfig {
    pub bind_addr: String,
    pub public_domain: String,
    pub secure: bool,

    #[serde(with = "humantime_serde")]
    pub cookie_expiration: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub token_expiration: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub token_refresh_expiration: std::time::Duration,

    pub jwt_secret: Option<String>,
    pub jwt_algorithm: String,

    pub redis_host: Option<String>,
    pub redis_password: Option<String>,

    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: Environment,

    pub allow_missing_providers: bool,

    /// Directory containing `Tenants/*.yaml` and `Clients/*.yaml` (spec §6 persisted layout).
    pub data_dir: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn is_prod(self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("GATEWARDEN_"))
            .extract()
            .unwrap()
    }

    pub fn jwt_algorithm(&self) -> Algorithm {
        Algorithm::parse(&self.jwt_algorithm).unwrap_or(Algorithm::Hs256)
    }

    /// A 64-char random secret when none is configured, per spec §6.
    pub fn jwt_secret_or_generated(&self) -> String {
        self.jwt_secret.clone().unwrap_or_else(|| {
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(64)
                .map(char::from)
                .collect()
        })
    }

    pub fn tenants_dir(&self) -> PathBuf {
        self.data_dir.join("Configurations/Tenants")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.data_dir.join("Configurations/Clients")
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            public_domain: "localhost".to_string(),
            secure: true,

            cookie_expiration: std::time::Duration::from_secs(60 * 60 * 24 * 7),
            token_expiration: std::time::Duration::from_secs(60 * 60 * 2),
            token_refresh_expiration: std::time::Duration::from_secs(60 * 60 * 720),

            jwt_secret: None,
            jwt_algorithm: "HS256".to_string(),

            redis_host: None,
            redis_password: None,

            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            environment: Environment::Dev,

            allow_missing_providers: false,

            data_dir: PathBuf::from("."),
        }
    }
}
