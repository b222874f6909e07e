//! Named endpoint bindings
//!
//! Binds a service, method and path once so call sites only supply options:
//!
//! ```rust,ignore
//! const INBOX: &str = "/v1/messages";
//! let list_inbox = ApiEndpoint::get("mail", INBOX);
//!
//! let messages: Vec<Message> = list_inbox
//!     .call_as(&api, RequestOptions::new().param("unread", "true"))
//!     .await?;
//! ```

use crate::error::ApiError;
use crate::manager::ApiManager;
use crate::request::RequestOptions;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub service: String,
    pub method: Method,
    pub path: String,
}

impl ApiEndpoint {
    pub fn new(service: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method,
            path: path.into(),
        }
    }

    pub fn get(service: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(service, Method::GET, path)
    }

    pub fn post(service: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(service, Method::POST, path)
    }

    pub async fn call(
        &self,
        manager: &ApiManager,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        manager
            .request(&self.service, self.method.clone(), &self.path, options)
            .await
    }

    /// Call and decode the body as `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        manager: &ApiManager,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.call(manager, options).await?;
        serde_json::from_value(body).map_err(|e| ApiError::InvalidResponse {
            service: self.service.clone(),
            endpoint: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.method, self.service, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use aide_foundation::ServiceConfig;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Event {
        title: String,
    }

    fn setup() -> (Arc<MockTransport>, ApiManager) {
        let mock = Arc::new(MockTransport::new());
        let manager = ApiManager::with_transport(mock.clone());
        manager
            .register("calendar", ServiceConfig::new("https://cal.example.com"))
            .unwrap();
        (mock, manager)
    }

    #[tokio::test]
    async fn test_call_routes_through_manager() {
        let (mock, manager) = setup();
        mock.push_json(200, json!({"id": 1}));

        let endpoint = ApiEndpoint::post("calendar", "/events");
        let body = endpoint
            .call(&manager, RequestOptions::new().json(json!({"title": "standup"})))
            .await
            .unwrap();

        assert_eq!(body, json!({"id": 1}));
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url, "https://cal.example.com/events");
    }

    #[tokio::test]
    async fn test_call_as_decodes() {
        let (mock, manager) = setup();
        mock.push_json(200, json!([{"title": "standup"}, {"title": "review"}]));
        mock.push_json(200, json!({"unexpected": true}));

        let list = ApiEndpoint::get("calendar", "/events");
        let events: Vec<Event> = list.call_as(&manager, RequestOptions::new()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "standup");

        let err = list
            .call_as::<Vec<Event>>(&manager, RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ApiEndpoint::get("mail", "/inbox").to_string(),
            "GET mail:/inbox"
        );
    }
}
