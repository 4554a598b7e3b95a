use std::time::Duration;

use secrecy::SecretString;

use super::directory_client::{TargetError, UserTarget};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8095";
pub const DEFAULT_USER_ID: &str = "2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the profile panel finds its user, read from the environment.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub service_url: String,
    pub user_id: String,
    pub token: Option<SecretString>,
    pub timeout: Duration,
}

impl DirectoryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match var("USER_SERVICE_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "invalid USER_SERVICE_TIMEOUT_SECS; using default");
                    DEFAULT_TIMEOUT
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Self {
            service_url: var("USER_SERVICE_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            user_id: var("USER_SERVICE_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            token: var("USER_SERVICE_TOKEN").map(|t| SecretString::new(t.into())),
            timeout,
        }
    }

    pub fn target(&self) -> Result<UserTarget, TargetError> {
        UserTarget::new(&self.service_url, &self.user_id, self.token.clone())
    }
}
