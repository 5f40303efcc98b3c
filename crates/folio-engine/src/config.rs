//! # Engine Configuration
//!
//! Configuration management for the renumbering engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FOLIO_DB_PATH=/var/lib/folio/folio.db                              │
//! │     FOLIO_AUTHORITY_URL=https://validator.internal/submit              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/folio/folio.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.folio.engine/folio.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./folio.db, 1000 ms pacing, 30 s authority timeout                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # folio.toml
//! [database]
//! path = "./folio.db"
//! tenant_id = "00000000-0000-0000-0000-000000000001"
//!
//! [authority]
//! endpoint = "https://validator.internal/submit"
//! api_token = "secret"
//! call_timeout_secs = 30
//!
//! [store]
//! timeout_secs = 10
//!
//! [resubmit]
//! delay_ms = 1000
//!
//! [classifier]
//! duplicate_codes = ["0100", "2033", "2800", "4000"]
//! sending_grace_secs = 300
//!
//! [numbering]
//! counter_policy = "keep_active_series"  # keep_active_series | promote_target
//! duplicate_policy = "deduplicate"       # deduplicate | reject
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use folio_core::classifier::{DEFAULT_DUPLICATE_CODES, DEFAULT_DUPLICATE_PHRASES, DEFAULT_TRANSIENT_MARKERS};
use folio_core::{
    CounterPolicy, DuplicatePolicy, SignatureClassifier, TransientErrorClassifier, DEFAULT_TENANT_ID,
};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Database Settings
// =============================================================================

/// Where the document store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Tenant whose documents this engine renumbers.
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./folio.db")
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            tenant_id: default_tenant_id(),
        }
    }
}

// =============================================================================
// Authority Settings
// =============================================================================

/// External validation authority endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritySettings {
    /// Submission URL. Required only for resubmission.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent with every submission.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Upper bound on one submission call (seconds).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout() -> u64 {
    30
}

impl Default for AuthoritySettings {
    fn default() -> Self {
        AuthoritySettings {
            endpoint: None,
            api_token: None,
            call_timeout_secs: default_call_timeout(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Upper bound on one document store call (seconds).
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    10
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            timeout_secs: default_store_timeout(),
        }
    }
}

// =============================================================================
// Resubmit Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResubmitSettings {
    /// Pause between consecutive submissions (milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    1000
}

impl Default for ResubmitSettings {
    fn default() -> Self {
        ResubmitSettings {
            delay_ms: default_delay_ms(),
        }
    }
}

// =============================================================================
// Classifier Settings
// =============================================================================

/// Signature lists for the duplicate and outage heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_duplicate_codes")]
    pub duplicate_codes: Vec<String>,

    #[serde(default = "default_duplicate_phrases")]
    pub duplicate_phrases: Vec<String>,

    #[serde(default = "default_transient_markers")]
    pub transient_markers: Vec<String>,

    /// How long a document may sit in `sending` before it counts as stuck.
    #[serde(default = "default_sending_grace")]
    pub sending_grace_secs: u64,
}

fn default_duplicate_codes() -> Vec<String> {
    DEFAULT_DUPLICATE_CODES.iter().map(|s| s.to_string()).collect()
}

fn default_duplicate_phrases() -> Vec<String> {
    DEFAULT_DUPLICATE_PHRASES.iter().map(|s| s.to_string()).collect()
}

fn default_transient_markers() -> Vec<String> {
    DEFAULT_TRANSIENT_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_sending_grace() -> u64 {
    300
}

/// Upper bound for `sending_grace_secs` (one week).
pub const MAX_SENDING_GRACE_SECS: u64 = 7 * 24 * 60 * 60;

impl Default for ClassifierSettings {
    fn default() -> Self {
        ClassifierSettings {
            duplicate_codes: default_duplicate_codes(),
            duplicate_phrases: default_duplicate_phrases(),
            transient_markers: default_transient_markers(),
            sending_grace_secs: default_sending_grace(),
        }
    }
}

impl ClassifierSettings {
    pub fn duplicate_classifier(&self) -> SignatureClassifier {
        SignatureClassifier::new(
            self.duplicate_codes.iter().map(String::as_str),
            self.duplicate_phrases.iter().map(String::as_str),
        )
    }

    pub fn transient_classifier(&self) -> TransientErrorClassifier {
        TransientErrorClassifier::new(self.transient_markers.iter().map(String::as_str))
    }

    pub fn sending_grace(&self) -> EngineResult<chrono::Duration> {
        i64::try_from(self.sending_grace_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "classifier.sending_grace_secs out of range: {}",
                    self.sending_grace_secs
                ))
            })
    }
}

// =============================================================================
// Numbering Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingSettings {
    #[serde(default)]
    pub counter_policy: CounterPolicy,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub authority: AuthoritySettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub resubmit: ResubmitSettings,

    #[serde(default)]
    pub classifier: ClassifierSettings,

    #[serde(default)]
    pub numbering: NumberingSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (folio.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.database.tenant_id.trim().is_empty() {
            return Err(EngineError::InvalidConfig("database.tenant_id is empty".into()));
        }

        if let Some(ref endpoint) = self.authority.endpoint {
            let url = url::Url::parse(endpoint)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(EngineError::InvalidUrl(format!(
                    "Authority URL must start with http:// or https://, got: {}",
                    endpoint
                )));
            }
        }

        if self.authority.call_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "authority.call_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.store.timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "store.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.classifier.sending_grace_secs > MAX_SENDING_GRACE_SECS {
            return Err(EngineError::InvalidConfig(format!(
                "classifier.sending_grace_secs must be at most {}",
                MAX_SENDING_GRACE_SECS
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FOLIO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(tenant) = std::env::var("FOLIO_TENANT_ID") {
            self.database.tenant_id = tenant;
        }

        if let Ok(url) = std::env::var("FOLIO_AUTHORITY_URL") {
            debug!(url = %url, "Overriding authority URL from environment");
            self.authority.endpoint = Some(url);
        }

        if let Ok(token) = std::env::var("FOLIO_AUTHORITY_TOKEN") {
            self.authority.api_token = Some(token);
        }

        if let Ok(delay) = std::env::var("FOLIO_RESUBMIT_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                self.resubmit.delay_ms = ms;
            }
        }

        if let Ok(timeout) = std::env::var("FOLIO_CALL_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.authority.call_timeout_secs = secs;
            }
        }

        if let Ok(policy) = std::env::var("FOLIO_COUNTER_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.numbering.counter_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown counter policy in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "folio", "engine").map(|dirs| {
            let config_dir = dirs.config_dir();
            config_dir.join("folio.toml")
        })
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.authority.call_timeout_secs)
    }

    pub fn resubmit_delay(&self) -> Duration {
        Duration::from_millis(self.resubmit.delay_ms)
    }
}
