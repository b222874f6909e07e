//! External service configuration
//!
//! One [`ServiceConfig`] per outbound API (web search, mail, calendar, ...).
//! Loaded from `services.json` (global, then project) with secrets optionally
//! pulled from the environment.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Services file name
pub const SERVICES_FILE: &str = "services.json";

fn default_rate_limit() -> u32 {
    60
}
fn default_rate_period_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// How a service authenticates outbound calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode<'a> {
    /// OAuth2 client-credentials exchange against `{base_url}/oauth/token`
    ClientCredentials {
        client_id: &'a str,
        client_secret: &'a str,
    },
    /// Static key used directly as the bearer token
    ApiKey(&'a str),
    /// No credentials; requests go out without `Authorization`
    Anonymous,
}

/// Settings for one external service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the api key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Environment variable holding the client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    /// Calls admitted per `rate_period_secs`
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    #[serde(default = "default_rate_period_secs")]
    pub rate_period_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            api_key_env: None,
            client_id: None,
            client_secret: None,
            client_secret_env: None,
            scopes: Vec::new(),
            rate_limit: default_rate_limit(),
            rate_period_secs: default_rate_period_secs(),
            timeout_secs: default_timeout_secs(),
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.rate_limit == 0 || self.rate_period_secs == 0 {
            return Err(Error::Config(
                "rate_limit and rate_period_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Only one of `client_id` / `client_secret` is set, so OAuth is skipped
    pub fn has_partial_oauth(&self) -> bool {
        self.client_id.is_some() != self.client_secret.is_some()
    }

    /// Credentials win over a static key; neither means anonymous
    pub fn auth_mode(&self) -> AuthMode<'_> {
        match (
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
            self.api_key.as_deref(),
        ) {
            (Some(client_id), Some(client_secret), _) => AuthMode::ClientCredentials {
                client_id,
                client_secret,
            },
            (_, _, Some(key)) => AuthMode::ApiKey(key),
            _ => AuthMode::Anonymous,
        }
    }

    pub fn rate_period(&self) -> Duration {
        Duration::from_secs(self.rate_period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fill secrets from `*_env` variables; explicit values are kept
    pub fn resolve_env(&mut self) {
        self.resolve_env_with(|name| std::env::var(name).ok());
    }

    pub fn resolve_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            if let Some(var) = &self.api_key_env {
                self.api_key = lookup(var);
            }
        }
        if self.client_secret.is_none() {
            if let Some(var) = &self.client_secret_env {
                self.client_secret = lookup(var);
            }
        }
    }

    // builders
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn rate_limit(mut self, calls: u32, period_secs: u64) -> Self {
        self.rate_limit = calls;
        self.rate_period_secs = period_secs;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// All configured services, keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

impl ServicesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global + project merge, then environment secrets
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<ServicesConfig>(SERVICES_FILE)? {
                config.merge(global_config);
            }
        }

        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.load_optional::<ServicesConfig>(SERVICES_FILE)? {
                config.merge(project_config);
            }
        }

        for service in config.services.values_mut() {
            service.resolve_env();
        }

        Ok(config)
    }

    pub fn load_from(store: &JsonStore) -> Result<Self> {
        let mut config: Self = store.load_optional(SERVICES_FILE)?.unwrap_or_default();
        for service in config.services.values_mut() {
            service.resolve_env();
        }
        Ok(config)
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(SERVICES_FILE, self)
    }

    /// Entries from `other` replace same-named entries
    pub fn merge(&mut self, other: ServicesConfig) {
        self.services.extend(other.services);
    }

    pub fn add(&mut self, name: impl Into<String>, service: ServiceConfig) {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Enabled services sorted by name
    pub fn list_enabled(&self) -> Vec<(&String, &ServiceConfig)> {
        let mut enabled: Vec<_> = self.services.iter().filter(|(_, s)| s.enabled).collect();
        enabled.sort_by(|a, b| a.0.cmp(b.0));
        enabled
    }
}
