//! Re-buildable request descriptions.
//!
//! A `reqwest::RequestBuilder` is consumed on send, so the refresh protocol
//! keeps the request as plain data and rebuilds it for the replay.

use reqwest::Method;
use serde::Serialize;

/// A request against the REST API, relative to `<base>/api`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) refresh_on_unauthorized: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            refresh_on_unauthorized: true,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment, percent-encoding anything outside the
    /// unreserved set so ids cannot alter the path or query.
    #[must_use]
    pub fn segment(mut self, segment: &str) -> Self {
        if !self.path.ends_with('/') {
            self.path.push('/');
        }
        self.path.push_str(&urlencoding::encode(segment));
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Treat a 401 as a plain rejection instead of starting the refresh protocol.
    ///
    /// Used for the credential-issuing endpoints themselves.
    #[must_use]
    pub const fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the API root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute URL for this request under `api_root`.
    pub(crate) fn url(&self, api_root: &str) -> String {
        format!(
            "{}/{}",
            api_root.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let req = ApiRequest::get("/cart");
        assert_eq!(req.url("http://localhost:8080/api/"), "http://localhost:8080/api/cart");
        assert_eq!(
            ApiRequest::delete("cart/items/i1").url("http://h/api"),
            "http://h/api/cart/items/i1"
        );
    }

    #[test]
    fn test_segment_is_percent_encoded() {
        let req = ApiRequest::put("/cart/items").segment("a/b?c#d e");
        assert_eq!(req.path(), "/cart/items/a%2Fb%3Fc%23d%20e");
        assert_eq!(
            req.url("http://h/api"),
            "http://h/api/cart/items/a%2Fb%3Fc%23d%20e"
        );

        let plain = ApiRequest::delete("/cart/items/").segment("item-1");
        assert_eq!(plain.path(), "/cart/items/item-1");
    }

    #[test]
    fn test_builder_collects_query_and_body() {
        let req = ApiRequest::post("/cart/items")
            .query("sessionId", "guest_1_a")
            .json(&serde_json::json!({"quantity": 2}))
            .unwrap();
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.query, vec![("sessionId".to_string(), "guest_1_a".to_string())]);
        assert_eq!(req.body, Some(serde_json::json!({"quantity": 2})));
        assert!(req.refresh_on_unauthorized);
        assert!(!req.without_refresh().refresh_on_unauthorized);
    }
}
