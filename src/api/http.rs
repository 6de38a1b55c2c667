use rand::Rng;
use reqwest::cookie::Jar;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::errors::ApiError;
use crate::api::types::ErrorEnvelope;
use crate::config::ApiConfig;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
/// Cookie the backend issues on login and reads on every request
pub const SESSION_COOKIE_NAME: &str = "jwt_session";
const LOGIN_PATH: &str = "/auth/login";

/// JSON client for the judge backend.
///
/// Authentication rides on the session cookie, so the client keeps a cookie
/// jar for its whole lifetime. The jar is seeded from `api.session_cookie` or
/// filled by [`HttpClient::login`]. Every request carries an `X-Request-ID`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let base = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ApiError::Rejected(format!("Invalid api.base_url '{}': {e}", config.base_url))
        })?;
        let jar = Arc::new(Jar::default());
        if let Some(session) = config.session_cookie.as_deref().filter(|s| !s.is_empty()) {
            jar.add_cookie_str(&format!("{SESSION_COOKIE_NAME}={session}; Path=/"), &base);
        }

        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session cookie, stored in the client's jar
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = json!({ "user_name": username, "password": password });
        let _: Value = self.post(LOGIN_PATH, &body).await.map_err(|e| match e {
            ApiError::SessionExpired => {
                ApiError::Rejected(format!("Login rejected for user '{username}'"))
            }
            other => other,
        })?;
        info!(user = %username, "Logged in");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, generate_request_id())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path).query(query);
        let body = self.send(Method::GET, path, request).await?;
        decode(body)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path).json(body);
        let body = self.send(Method::POST, path, request).await?;
        decode(body)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::PUT, path).query(query).json(body);
        let body = self.send(Method::PUT, path, request).await?;
        decode(body)
    }

    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path).query(query);
        self.send(Method::DELETE, path, request).await?;
        Ok(())
    }

    /// Execute the request and return the (possibly empty) JSON payload
    async fn send(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Value, ApiError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        debug!(method = %method, path = %path, "API request");

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout_ms))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout_ms))?;

        debug!(method = %method, path = %path, status = status.as_u16(), "API response");

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %path, "Session rejected by server");
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let envelope = serde_json::from_str::<ErrorEnvelope>(&text).ok();
            let (code, message) = match envelope {
                Some(envelope) => (envelope.error.code, envelope.error.message),
                None => (None, None),
            };
            match status.as_u16() {
                403 => warn!(path = %path, "Access denied"),
                404 => warn!(path = %path, "Resource not found"),
                500..=599 => warn!(path = %path, status = status.as_u16(), "Server error"),
                _ => {}
            }
            return Err(ApiError::Server {
                status: status.as_u16(),
                code,
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse {
            message: format!("{method} {path}: {e}"),
        })
    }
}

/// Decode a payload, unwrapping a `{"success": true, "data": ...}` envelope if present
fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let payload = match body {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(payload).map_err(|e| ApiError::InvalidResponse {
        message: e.to_string(),
    })
}

/// `{unix millis}-{9 base36 chars}`
pub fn generate_request_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_shape() {
        let id = generate_request_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_decode_unwraps_success_envelope() {
        let value: Vec<u32> = decode(json!({"success": true, "data": [1, 2, 3]})).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_accepts_bare_payload() {
        let value: Vec<u32> = decode(json!([4, 5])).unwrap();
        assert_eq!(value, vec![4, 5]);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpClient::new(&ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_ms: 1000,
            ..ApiConfig::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/locks"), "http://localhost:8080/api/locks");
    }

    #[test]
    fn test_malformed_base_url_is_rejected() {
        let err = HttpClient::new(&ApiConfig {
            base_url: "judge without scheme".to_string(),
            ..ApiConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
    }
}
