//! Per-call request options

use serde::Serialize;
use serde_json::Value;

/// Optional body, query parameters and headers for one call
///
/// ```rust,ignore
/// let options = RequestOptions::new()
///     .param("q", "rust async")
///     .param("limit", "10")
///     .header("Accept-Language", "en");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub json: Option<Value>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// JSON body from any serializable value
    pub fn json_from<T: Serialize + ?Sized>(self, body: &T) -> serde_json::Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}
