use std::time::Duration;

/// Base URL of the import service.
pub const ENV_API_URL: &str = "CONTACTHUB_API_URL";
/// Default owner identity sent with uploads.
pub const ENV_OWNER_EMAIL: &str = "CONTACTHUB_OWNER_EMAIL";
/// Optional whole-request timeout, in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CONTACTHUB_REQUEST_TIMEOUT_SECS";

/// Import client configuration loaded from environment variables.
///
/// Every field is optional: a missing base URL is a valid state, and the
/// caller decides whether that means "fail" or "use a mock".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportConfig {
    pub base_url: Option<String>,
    pub owner_email: Option<String>,
    /// No client-side timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CONTACTHUB_API_URL must be set to the import service base URL")]
    MissingBaseUrl,

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ImportConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `CONTACTHUB_API_URL`              | unset   |
    /// | `CONTACTHUB_OWNER_EMAIL`          | unset   |
    /// | `CONTACTHUB_REQUEST_TIMEOUT_SECS` | unset   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let request_timeout_secs = match get(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: ENV_REQUEST_TIMEOUT_SECS,
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            base_url: get(ENV_API_URL),
            owner_email: get(ENV_OWNER_EMAIL),
            request_timeout_secs,
        })
    }

    /// The configured base URL, or [`ConfigError::MissingBaseUrl`].
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        self.base_url.as_deref().ok_or(ConfigError::MissingBaseUrl)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
