//! Client settings loadable from serde sources or the environment.

use serde::{Deserialize, Serialize};

use crate::auth;
use crate::client::{Client, ClientBuilder, DEFAULT_BASE_URL};

pub const ENV_BASE_URL: &str = "APPSERVICES_BASE_URL";
pub const ENV_AUTH_URL: &str = "APPSERVICES_AUTH_URL";
pub const ENV_USER_AGENT: &str = "APPSERVICES_USER_AGENT";
pub const ENV_WITH_RAW: &str = "APPSERVICES_WITH_RAW";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_url: String,
    /// Prepended to the default user agent when set.
    pub user_agent: Option<String>,
    pub with_raw: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: auth::DEFAULT_AUTH_URL.to_string(),
            user_agent: None,
            with_raw: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset or
    /// empty keys. `APPSERVICES_WITH_RAW` accepts `1`, `true` or `yes`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = Self::default();

        Self {
            base_url: get(ENV_BASE_URL).unwrap_or(defaults.base_url),
            auth_url: get(ENV_AUTH_URL).unwrap_or(defaults.auth_url),
            user_agent: get(ENV_USER_AGENT),
            with_raw: get(ENV_WITH_RAW)
                .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.with_raw),
        }
    }

    /// A client builder carrying these settings; set a transport before
    /// building to authenticate.
    pub fn client_builder(&self) -> ClientBuilder {
        let mut builder = Client::builder().base_url(self.base_url.clone());
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if self.with_raw {
            builder = builder.with_raw();
        }
        builder
    }

    pub fn auth_config(&self) -> auth::Config {
        auth::Config::new().auth_url(self.auth_url.clone())
    }
}
