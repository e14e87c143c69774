//! Request descriptions, responses and the headers sent with every request.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use wayfare_core::error::{ApiError, Error, InvalidInputError, TransportError};
use wayfare_core::{AccessToken, Result};

/// A description of an outbound API call.
///
/// Requests are plain values so that a rejected request can be replayed
/// unchanged after a token refresh.
///
/// # Example
///
/// ```
/// use wayfare_http::ApiRequest;
///
/// let request = ApiRequest::get("/places")
///     .query("category", "museum")
///     .query("limit", "20");
/// assert_eq!(request.path(), "/places");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    timeout: Option<Duration>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Body {
            reason: e.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Override the client's per-request timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// True once this request has been replayed after a refresh.
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retry(&mut self) {
        self.retried = true;
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(body).map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }
}

/// Headers the HTTP client sends with every request.
pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Build a sensitive `Authorization` header value.
pub(crate) fn bearer_value(token: &AccessToken) -> Result<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&token.bearer()).map_err(|e| InvalidInputError::Header {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Map a reqwest failure to a transport error.
pub(crate) fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

/// Parse a non-success body into an [`ApiError`].
///
/// The backend answers `{ "message": ... }`, sometimes with an `error` code.
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|value| value.get(name))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };
    ApiError::new(status.as_u16(), field("error"), field("message"))
}

/// Read a response, turning non-2xx statuses into [`Error::Api`].
pub(crate) async fn read_response(response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(transport_error)?.to_vec();

    if status.is_success() {
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    } else {
        Err(Error::Api(api_error(status, &body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let request = ApiRequest::post("/bookings")
            .json(&serde_json::json!({ "eventId": "e1", "seats": 2 }))
            .unwrap()
            .header("X-Client", "mobile")
            .unwrap()
            .query("notify", "true")
            .timeout(Duration::from_secs(3));

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/bookings");
        assert_eq!(request.body().unwrap()["seats"], 2);
        assert_eq!(request.headers()["x-client"], "mobile");
        assert_eq!(request.query_pairs(), [("notify".to_string(), "true".to_string())]);
        assert_eq!(request.timeout_override(), Some(Duration::from_secs(3)));
        assert!(!request.is_retry());
    }

    #[test]
    fn invalid_header_is_rejected() {
        assert!(ApiRequest::get("/places").header("bad header", "x").is_err());
        assert!(ApiRequest::get("/places").header("x-ok", "line\nbreak").is_err());
    }

    #[test]
    fn retry_marker_survives_clone() {
        let mut request = ApiRequest::get("/events");
        request.mark_retry();
        assert!(request.clone().is_retry());
    }

    #[test]
    fn default_headers_carry_no_bearer() {
        let headers = default_headers();
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_value_is_sensitive() {
        let value = bearer_value(&AccessToken::new("T2")).unwrap();
        assert_eq!(value, "Bearer T2");
        assert!(value.is_sensitive());
    }

    #[test]
    fn api_error_reads_message_and_code() {
        let err = api_error(
            StatusCode::UNAUTHORIZED,
            br#"{"error":"TokenExpired","message":"jwt expired"}"#,
        );
        assert_eq!(err.status, 401);
        assert_eq!(err.error.as_deref(), Some("TokenExpired"));
        assert_eq!(err.message.as_deref(), Some("jwt expired"));
    }

    #[test]
    fn api_error_tolerates_non_json() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err, ApiError::new(502, None, None));
    }

    #[test]
    fn empty_body_decodes_as_null() {
        let response = ApiResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        let value: Option<serde_json::Value> = response.json().unwrap();
        assert!(value.is_none());
    }
}
