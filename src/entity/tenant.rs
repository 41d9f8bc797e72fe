use gatewarden_keys::Algorithm;
use serde::{Deserialize, Serialize};

/// A tenant as loaded from `Configurations/Tenants/*.yaml` (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,

    /// Host patterns this tenant answers for; `*.` prefix matches one leading label.
    pub host_patterns: Vec<String>,

    #[serde(default)]
    pub interceptor: InterceptorConfig,

    /// Provider scripts, concatenated at load time (spec §4.E).
    #[serde(default)]
    pub provider_scripts: Vec<String>,

    #[serde(default)]
    pub jwt_algorithm: Option<AlgorithmConfig>,

    #[serde(default = "default_true")]
    pub silent_login: bool,

    #[serde(default)]
    pub info_urls: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlgorithmConfig {
    Hs256,
    Rs256,
}

impl From<AlgorithmConfig> for Algorithm {
    fn from(value: AlgorithmConfig) -> Self {
        match value {
            AlgorithmConfig::Hs256 => Algorithm::Hs256,
            AlgorithmConfig::Rs256 => Algorithm::Rs256,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterceptorConfig {
    #[serde(default)]
    pub enabled: bool,
    pub login_domain: Option<String>,
    pub cookie_domain: Option<String>,
}

impl Tenant {
    /// Scripts concatenated into a single source for the Script Provider.
    pub fn concatenated_scripts(&self) -> String {
        self.provider_scripts.join("\n")
    }

    /// Matches a host against this tenant's patterns. A pattern like
    /// `*.example.com` matches exactly one leading label; returns the
    /// length of the matched literal suffix for tie-breaking in the store.
    pub fn host_match_len(&self, host: &str) -> Option<usize> {
        self.host_patterns
            .iter()
            .filter_map(|pattern| match_host_pattern(pattern, host))
            .max()
    }
}

/// Returns `Some(literal_suffix_len)` on match, biasing toward the most
/// specific (longest literal) pattern when several tenants could match
/// (spec §4.A: "ties broken by most-specific (longest literal suffix) first").
fn match_host_pattern(pattern: &str, host: &str) -> Option<usize> {
    if let Some(suffix) = pattern.strip_prefix("*.") {
        if host == suffix {
            return None;
        }
        if let Some(label) = host.strip_suffix(suffix) {
            if label.ends_with('.') && !label[..label.len() - 1].contains('.') {
                return Some(suffix.len());
            }
        }
        None
    } else if pattern == host {
        Some(pattern.len())
    } else {
        None
    }
}
