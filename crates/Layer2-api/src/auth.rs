//! Token acquisition
//!
//! - client id + secret: OAuth2 client-credentials exchange at
//!   `{base_url}/oauth/token`
//! - static api key: the key itself, valid for a year
//! - neither: anonymous, no token

use crate::error::ApiError;
use crate::transport::{join_url, OutboundRequest, RequestBody, Transport};
use aide_foundation::{AuthMode, ServiceConfig};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

/// Token endpoint, relative to the service base URL
pub const TOKEN_PATH: &str = "oauth/token";

const API_KEY_LIFETIME_DAYS: i64 = 365;

/// Used when the token response omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Bearer token plus the instant after which it must be refreshed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Obtain a token for `service` according to its configured auth mode
pub(crate) async fn authenticate(
    transport: &dyn Transport,
    service: &str,
    config: &ServiceConfig,
) -> Result<Option<TokenRecord>, ApiError> {
    match config.auth_mode() {
        AuthMode::ClientCredentials {
            client_id,
            client_secret,
        } => client_credentials(transport, service, config, client_id, client_secret)
            .await
            .map(Some),
        AuthMode::ApiKey(key) => {
            debug!(service, "Using static api key");
            Ok(Some(TokenRecord::new(
                key,
                Utc::now() + TimeDelta::days(API_KEY_LIFETIME_DAYS),
            )))
        }
        AuthMode::Anonymous => Ok(None),
    }
}

async fn client_credentials(
    transport: &dyn Transport,
    service: &str,
    config: &ServiceConfig,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenRecord, ApiError> {
    let fail = |message: String| ApiError::Authentication {
        service: service.to_string(),
        message,
    };

    let mut form = vec![
        ("client_id".to_string(), client_id.to_string()),
        ("client_secret".to_string(), client_secret.to_string()),
        ("grant_type".to_string(), "client_credentials".to_string()),
    ];
    if !config.scopes.is_empty() {
        form.push(("scope".to_string(), config.scopes.join(" ")));
    }

    let mut request = OutboundRequest::new(
        Method::POST,
        join_url(&config.base_url, TOKEN_PATH),
        config.timeout(),
    );
    request.body = RequestBody::Form(form);

    let response = transport
        .send(request)
        .await
        .map_err(|e| fail(format!("token request failed: {}", e)))?;

    if !response.is_success() {
        return Err(fail(format!(
            "token endpoint returned HTTP {}: {}",
            response.status, response.body
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|e| fail(format!("malformed token response: {}", e)))?;

    let lifetime = parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    let expires_at = Utc::now() + TimeDelta::seconds(lifetime);

    info!(service, expires_at = %expires_at, "Obtained OAuth token");
    Ok(TokenRecord::new(parsed.access_token, expires_at))
}
