//! Shared JSON-over-HTTP transport for the analytics clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use adaptquiz_core::error::AnalyticsError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retry delay assumed when a 429 carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Base URL, bearer token, and a configured `reqwest` client.
pub(crate) struct ApiClient {
    base_url: reqwest::Url,
    auth_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

impl ApiClient {
    pub(crate) fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalyticsError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| AnalyticsError::NetworkError(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AnalyticsError::NetworkError(format!("invalid base URL '{base_url}'")).into());
        }

        Ok(Self {
            base_url,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so caller-supplied ids cannot introduce `/`, `..`, `?` or `#`.
    pub(crate) fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn get(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub(crate) fn post(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode its JSON body, mapping failures onto
    /// [`AnalyticsError`]. `resource` names the thing a 404 refers to.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> anyhow::Result<T> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyticsError::Timeout(self.timeout_secs)
            } else {
                AnalyticsError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(AnalyticsError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(AnalyticsError::NotFound(resource.to_string()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(AnalyticsError::ApiError { status, message }.into());
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AnalyticsError::Timeout(self.timeout_secs)
            } else {
                AnalyticsError::NetworkError(e.to_string())
            }
        })?;
        // An empty 2xx body is treated as an empty object so defaults apply.
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        let parsed = serde_json::from_str::<T>(body)
            .map_err(|e| AnalyticsError::MalformedResponse(format!("{resource}: {e}")))?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default, Deserialize)]
    struct Payload {
        #[serde(default)]
        value: u32,
    }

    async fn call(server: &MockServer, token: Option<&str>) -> anyhow::Result<Payload> {
        let api = ApiClient::new(&server.uri(), token.map(String::from), 5).unwrap();
        api.send(api.get(api.url(&["thing"])), "thing").await
    }

    fn analytics_error(err: &anyhow::Error) -> &AnalyticsError {
        err.downcast_ref::<AnalyticsError>().unwrap()
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
            .mount(&server)
            .await;

        assert_eq!(call(&server, Some("secret")).await.unwrap().value, 7);
    }

    #[tokio::test]
    async fn empty_body_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(call(&server, None).await.unwrap().value, 0);
    }

    #[tokio::test]
    async fn status_codes_map_to_typed_errors() {
        let cases = [
            (401, "authentication failed"),
            (404, "not found: thing"),
            (500, "API error (HTTP 500)"),
        ];
        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status).set_body_string("boom"))
                .mount(&server)
                .await;

            let err = call(&server, None).await.unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "status {status}: got '{err}'"
            );
        }
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let err = call(&server, None).await.unwrap_err();
        assert_eq!(analytics_error(&err).retry_after_ms(), Some(2_000));
    }

    #[tokio::test]
    async fn huge_retry_after_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
            )
            .mount(&server)
            .await;

        let err = call(&server, None).await.unwrap_err();
        assert_eq!(analytics_error(&err).retry_after_ms(), Some(u64::MAX));
    }

    #[tokio::test]
    async fn api_error_extracts_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"message": "bad window"})),
            )
            .mount(&server)
            .await;

        let err = call(&server, None).await.unwrap_err();
        assert!(matches!(
            analytics_error(&err),
            AnalyticsError::ApiError { status: 422, message } if message == "bad window"
        ));
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
            .mount(&server)
            .await;

        let err = call(&server, None).await.unwrap_err();
        assert!(matches!(
            analytics_error(&err),
            AnalyticsError::MalformedResponse(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let api = ApiClient::new("http://127.0.0.1:1", None, 2).unwrap();
        let err = api.send::<Payload>(api.get(api.url(&["thing"])), "thing").await.unwrap_err();
        assert!(matches!(
            analytics_error(&err),
            AnalyticsError::NetworkError(_) | AnalyticsError::Timeout(_)
        ));
    }

    #[test]
    fn url_joins_segments() {
        let api = ApiClient::new("http://host/", None, 5).unwrap();
        assert_eq!(api.url(&["api", "x"]).as_str(), "http://host/api/x");

        let prefixed = ApiClient::new("http://host/v2", None, 5).unwrap();
        assert_eq!(prefixed.url(&["api", "x"]).as_str(), "http://host/v2/api/x");
    }

    #[test]
    fn url_escapes_segments() {
        let api = ApiClient::new("http://host", None, 5).unwrap();
        let url = api.url(&["sessions", "a/../../b?c#d", "adjustments"]);
        assert_eq!(url.path(), "/sessions/a%2F..%2F..%2Fb%3Fc%23d/adjustments");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ApiClient::new("not a url", None, 5).is_err());
        assert!(ApiClient::new("mailto:someone@example.com", None, 5).is_err());
    }
}
