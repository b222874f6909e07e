//! API Manager - one front door for every outbound service call
//!
//! Per registered service the manager keeps the config, a rate limiter and
//! the current token. A request goes through, in order:
//!
//! ```text
//! lookup ─► admission (RateLimiter) ─► token (cached / refreshed) ─► transport
//!   │              │                         │                           │
//! UnknownService  RateLimitExceeded        Authentication        RequestFailed / Transport
//! ```
//!
//! Nothing is retried here; see [`with_retry`](crate::retry::with_retry).

use crate::auth::{self, TokenRecord};
use crate::error::ApiError;
use crate::rate_limit::RateLimiter;
use crate::request::RequestOptions;
use crate::transport::{join_url, OutboundRequest, RequestBody, ReqwestTransport, Transport};
use aide_foundation::{Error, Result, ServiceConfig, ServicesConfig};
use parking_lot::RwLock;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle of a service as seen by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unregistered,
    /// Registered, no token held (not yet authenticated, or anonymous)
    Registered,
    Authenticated,
    TokenExpired,
}

struct ServiceSlot {
    name: String,
    config: ServiceConfig,
    limiter: RateLimiter,
    /// Held across the auth exchange so refreshes for one service never overlap
    token: tokio::sync::Mutex<Option<TokenRecord>>,
}

impl ServiceSlot {
    fn new(name: String, config: ServiceConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit, config.rate_period());
        Self {
            name,
            config,
            limiter,
            token: tokio::sync::Mutex::new(None),
        }
    }
}

/// Registry of external services with rate limiting and token management
pub struct ApiManager {
    services: RwLock<HashMap<String, Arc<ServiceSlot>>>,
    transport: Arc<dyn Transport>,
}

impl ApiManager {
    /// Manager backed by a real HTTP session (opened on first use)
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            transport,
        }
    }

    /// Manager with every enabled service from `config` registered
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        let manager = Self::new();
        manager.register_all(config)?;
        Ok(manager)
    }

    /// Load `services.json` (global + project + env) and register
    pub fn load() -> Result<Self> {
        let config = ServicesConfig::load()?;
        Self::from_config(&config)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register (or replace) a service
    ///
    /// Replacing drops the old token and rate-limit window.
    pub fn register(&self, name: impl Into<String>, config: ServiceConfig) -> Result<()> {
        let name = name.into();
        config.validate().map_err(|e| match e {
            Error::Config(message) => Error::Config(format!("service '{}': {}", name, message)),
            other => other,
        })?;

        if config.has_partial_oauth() {
            warn!(
                service = %name,
                "Only one of client_id/client_secret is set; skipping OAuth"
            );
        }

        info!(
            service = %name,
            base_url = %config.base_url,
            rate_limit = config.rate_limit,
            rate_period_secs = config.rate_period_secs,
            "Registered service"
        );

        let slot = Arc::new(ServiceSlot::new(name.clone(), config));
        if self.services.write().insert(name.clone(), slot).is_some() {
            debug!(service = %name, "Replaced previous registration");
        }
        Ok(())
    }

    /// Register every enabled service; returns how many were registered
    pub fn register_all(&self, config: &ServicesConfig) -> Result<usize> {
        let enabled = config.list_enabled();
        for (name, service) in &enabled {
            self.register(name.as_str(), (*service).clone())?;
        }
        Ok(enabled.len())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// Registered service names, sorted
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn service_config(&self, name: &str) -> Option<ServiceConfig> {
        self.services
            .read()
            .get(name)
            .map(|slot| slot.config.clone())
    }

    pub async fn state(&self, name: &str) -> ServiceState {
        let Ok(slot) = self.slot(name) else {
            return ServiceState::Unregistered;
        };
        let token = slot.token.lock().await;
        match token.as_ref() {
            None => ServiceState::Registered,
            Some(record) if record.is_expired() => ServiceState::TokenExpired,
            Some(_) => ServiceState::Authenticated,
        }
    }

    fn slot(&self, name: &str) -> std::result::Result<Arc<ServiceSlot>, ApiError> {
        self.services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::unknown_service(name))
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Current token for `name`, authenticating if none is held or it expired
    ///
    /// `Ok(None)` for services without credentials.
    pub async fn get_token(&self, name: &str) -> std::result::Result<Option<String>, ApiError> {
        let slot = self.slot(name)?;
        self.resolve_token(&slot).await
    }

    async fn resolve_token(
        &self,
        slot: &ServiceSlot,
    ) -> std::result::Result<Option<String>, ApiError> {
        let mut record = slot.token.lock().await;

        if let Some(current) = record.as_ref() {
            if !current.is_expired() {
                return Ok(Some(current.token.clone()));
            }
            debug!(service = %slot.name, "Token expired, re-authenticating");
        }

        match auth::authenticate(self.transport.as_ref(), &slot.name, &slot.config).await {
            Ok(fresh) => {
                let token = fresh.as_ref().map(|r| r.token.clone());
                *record = fresh;
                Ok(token)
            }
            Err(e) => {
                error!(service = %slot.name, error = %e, "Authentication failed");
                Err(e)
            }
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Call `endpoint` on service `name` and return the decoded JSON body
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    pub async fn request(
        &self,
        name: &str,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> std::result::Result<Value, ApiError> {
        let result = self.try_request(name, &method, endpoint, options).await;

        if let Err(e) = &result {
            match e {
                ApiError::RateLimitExceeded { retry_after_ms, .. } => warn!(
                    service = name,
                    method = %method,
                    endpoint,
                    retry_after_ms,
                    "Request denied by rate limiter"
                ),
                _ => error!(
                    service = name,
                    method = %method,
                    endpoint,
                    error = %e,
                    "API request failed"
                ),
            }
        }
        result
    }

    pub async fn get(
        &self,
        name: &str,
        endpoint: &str,
        options: RequestOptions,
    ) -> std::result::Result<Value, ApiError> {
        self.request(name, Method::GET, endpoint, options).await
    }

    pub async fn post(
        &self,
        name: &str,
        endpoint: &str,
        options: RequestOptions,
    ) -> std::result::Result<Value, ApiError> {
        self.request(name, Method::POST, endpoint, options).await
    }

    async fn try_request(
        &self,
        name: &str,
        method: &Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> std::result::Result<Value, ApiError> {
        let slot = self.slot(name)?;

        if !slot.limiter.acquire() {
            return Err(ApiError::RateLimitExceeded {
                service: name.to_string(),
                retry_after_ms: slot.limiter.retry_after().as_millis() as u64,
            });
        }

        let token = self.resolve_token(&slot).await?;

        let mut request = OutboundRequest::new(
            method.clone(),
            join_url(&slot.config.base_url, endpoint),
            slot.config.timeout(),
        );
        request.query = options.params;
        request.headers = options.headers;
        if let Some(token) = token {
            request
                .headers
                .retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        if let Some(body) = options.json {
            request.body = RequestBody::Json(body);
        }

        debug!(service = name, method = %method, url = %request.url, "Sending request");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ApiError::Transport {
                service: name.to_string(),
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                message: e.message,
                timed_out: e.timed_out,
            })?;

        if !response.is_success() {
            return Err(ApiError::RequestFailed {
                service: name.to_string(),
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                status: response.status,
                body: response.body,
            });
        }

        debug!(service = name, status = response.status, "Request succeeded");

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::InvalidResponse {
            service: name.to_string(),
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release the shared HTTP session
    pub fn shutdown(&self) {
        self.transport.close();
        info!(services = self.services.read().len(), "API manager shut down");
    }
}

impl Default for ApiManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApiManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiManager")
            .field("services", &self.services())
            .finish()
    }
}
