//! Per-invocation skill settings
//!
//! Everything here is read from the environment on every request and
//! handed to the fetcher and formatter as plain values. Nothing is cached.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `NIGHTSCOUT_URL` | Base URL of the Nightscout site | required |
//! | `NIGHTSCOUT_TOKEN` | Access token or API secret | none |
//! | `NIGHTSCOUT_AUTH_MODE` | `bearer` or `apisecret-hash` | `bearer` |
//! | `NIGHTSCOUT_TIMEOUT_SECS` | Request timeout | `8` |
//! | `UNITS` | `mgdl` or `mmol` | `mgdl` |

use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const NIGHTSCOUT_URL_ENV: &str = "NIGHTSCOUT_URL";
pub const NIGHTSCOUT_TOKEN_ENV: &str = "NIGHTSCOUT_TOKEN";
pub const NIGHTSCOUT_AUTH_MODE_ENV: &str = "NIGHTSCOUT_AUTH_MODE";
pub const NIGHTSCOUT_TIMEOUT_ENV: &str = "NIGHTSCOUT_TIMEOUT_SECS";
pub const UNITS_ENV: &str = "UNITS";

/// Default bound on a Nightscout request, headers and body included
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Readings older than this many minutes get a heads-up
pub const STALE_THRESHOLD_MINUTES: i64 = 15;

/// How the token is presented to Nightscout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `api-secret: <sha1 hex of token>`
    ApiSecretHash,
}

impl AuthMode {
    /// Unknown modes fall back to bearer
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "bearer" => Self::Bearer,
            "apisecret-hash" | "apisecret_sha1" | "api-secret" => Self::ApiSecretHash,
            other => {
                warn!("Unknown auth mode '{}', using bearer", other);
                Self::Bearer
            }
        }
    }
}

/// Display unit for spoken readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    MgDl,
    Mmol,
}

impl UnitSystem {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("mmol") {
            Self::Mmol
        } else {
            Self::MgDl
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MgDl => "mgdl",
            Self::Mmol => "mmol",
        }
    }
}

/// Where and how to fetch the latest entry
#[derive(Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub auth_mode: AuthMode,
    pub timeout: Duration,
}

impl FetchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            auth_mode: AuthMode::default(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, auth_mode: AuthMode) -> Self {
        self.token = Some(token.into());
        self.auth_mode = auth_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Token stays out of logs
impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auth_mode", &self.auth_mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// How to phrase a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechConfig {
    pub units: UnitSystem,
    pub stale_after_minutes: i64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            stale_after_minutes: STALE_THRESHOLD_MINUTES,
        }
    }
}

/// Everything one glucose query needs
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fetch: FetchConfig,
    pub speech: SpeechConfig,
}

impl Settings {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(NIGHTSCOUT_URL_ENV).unwrap_or_default();
        let token = lookup(NIGHTSCOUT_TOKEN_ENV).filter(|t| !t.is_empty());
        let auth_mode = lookup(NIGHTSCOUT_AUTH_MODE_ENV)
            .map(|m| AuthMode::parse(&m))
            .unwrap_or_default();

        let timeout = match lookup(NIGHTSCOUT_TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!("Ignoring invalid {}='{}'", NIGHTSCOUT_TIMEOUT_ENV, raw);
                    DEFAULT_FETCH_TIMEOUT
                }
            },
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let units = lookup(UNITS_ENV)
            .map(|u| UnitSystem::parse(&u))
            .unwrap_or_default();

        Self {
            fetch: FetchConfig {
                base_url,
                token,
                auth_mode,
                timeout,
            },
            speech: SpeechConfig {
                units,
                ..SpeechConfig::default()
            },
        }
    }
}
