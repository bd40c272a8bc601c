//! DNS provider management API client.
//!
//! Speaks the provider's v4 REST surface: look the zone up by name, then
//! list its A records. Authentication is the account email plus API key
//! header pair. Responses arrive in an envelope whose `success` flag must
//! be honored even on HTTP 200.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sitesweep_core::{Result, Secret, SweepError};
use tracing::{debug, warn};

/// The provider API base URL
const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider account credentials: email plus API key
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    /// Account email, sent as `X-Auth-Email`
    pub email: String,
    /// Account API key, sent as `X-Auth-Key`
    pub api_key: Secret,
}

impl ProviderCredentials {
    /// Build a credential pair
    #[must_use]
    pub fn new(email: impl Into<String>, api_key: impl Into<Secret>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
        }
    }
}

/// Client for the provider management API
#[derive(Clone)]
pub struct ProviderClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    credentials: ProviderCredentials,
    base_url: String,
    timeout: Duration,
}

/// Response envelope wrapping every provider payload
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ZoneRecord {
    #[serde(rename = "type")]
    record_type: String,
    #[allow(dead_code)]
    name: String,
    content: String,
}

impl ProviderClient {
    /// Create a client with default settings
    #[must_use]
    pub fn new(credentials: ProviderCredentials) -> Self {
        ProviderClientBuilder::new(credentials).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(credentials: ProviderCredentials) -> ProviderClientBuilder {
        ProviderClientBuilder::new(credentials)
    }

    /// A records for a domain: zone lookup by name, then record list.
    pub async fn a_records(&self, domain: &str) -> Result<Vec<Ipv4Addr>> {
        let zone = self.find_zone(domain).await?;
        debug!(zone = %zone.name, id = %zone.id, "listing A records");

        let records: Vec<ZoneRecord> = self
            .get(
                &format!("/zones/{}/dns_records", zone.id),
                &[("type", "A"), ("name", domain)],
            )
            .await?;

        let mut addrs = Vec::with_capacity(records.len());
        for record in records {
            if record.record_type != "A" {
                continue;
            }
            match record.content.parse() {
                Ok(addr) => addrs.push(addr),
                Err(_) => {
                    warn!(domain = %domain, content = %record.content, "skipping bad A record");
                }
            }
        }
        Ok(addrs)
    }

    async fn find_zone(&self, domain: &str) -> Result<Zone> {
        let zones: Vec<Zone> = self.get("/zones", &[("name", domain)]).await?;
        zones
            .into_iter()
            .next()
            .ok_or_else(|| SweepError::ApiRejected(format!("no zone named {domain}")))
    }

    /// Perform an authenticated GET request
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.inner.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(&url)
            .query(params)
            .header("X-Auth-Email", &self.inner.credentials.email)
            .header("X-Auth-Key", self.inner.credentials.api_key.reveal())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SweepError::Timeout(self.inner.timeout.as_secs())
                } else {
                    SweepError::Http(e.to_string())
                }
            })?;

        self.handle_response(response).await
    }

    /// Unwrap the provider envelope, honoring both HTTP status and the
    /// in-band `success` flag
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SweepError::Http(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .map(|envelope| join_errors(&envelope.errors))
                .filter(|message| !message.is_empty())
                .unwrap_or(body);
            return Err(SweepError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(SweepError::ApiRejected(join_errors(&envelope.errors)));
        }
        envelope
            .result
            .ok_or_else(|| SweepError::ApiRejected("response carried no result".to_owned()))
    }
}

fn join_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unspecified error".to_owned();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builder for configuring a [`ProviderClient`]
pub struct ProviderClientBuilder {
    credentials: ProviderCredentials,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl ProviderClientBuilder {
    /// Create a new builder with the given credentials
    #[must_use]
    pub fn new(credentials: ProviderCredentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("sitesweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> ProviderClient {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        ProviderClient {
            inner: Arc::new(ClientInner {
                http,
                credentials: self.credentials,
                base_url: self.base_url,
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProviderClient {
        ProviderClient::builder(ProviderCredentials::new("ops@example.com", "test-key"))
            .base_url(server.uri())
            .build()
    }

    #[tokio::test]
    async fn a_records_walks_zone_then_records() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .and(header("X-Auth-Email", "ops@example.com"))
            .and(header("X-Auth-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [{"id": "zone-1", "name": "example.com"}],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zones/zone-1/dns_records"))
            .and(query_param("type", "A"))
            .and(query_param("name", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [
                    {"id": "r1", "type": "A", "name": "example.com", "content": "203.0.113.5"},
                    {"id": "r2", "type": "A", "name": "example.com", "content": "198.51.100.9"},
                ],
            })))
            .mount(&server)
            .await;

        let records = client_for(&server).a_records("example.com").await.unwrap();
        assert_eq!(
            records,
            vec![
                "203.0.113.5".parse::<Ipv4Addr>().unwrap(),
                "198.51.100.9".parse::<Ipv4Addr>().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": [{"code": 9103, "message": "Unknown X-Auth-Key or X-Auth-Email"}],
                "result": null,
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).a_records("example.com").await.unwrap_err();
        assert!(matches!(err, SweepError::ApiRejected(_)), "got {err:?}");
        assert!(err.to_string().contains("9103"));
    }

    #[tokio::test]
    async fn http_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "errors": [{"code": 9109, "message": "Invalid access token"}],
                "result": null,
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).a_records("example.com").await.unwrap_err();
        match err {
            SweepError::Api { code, message } => {
                assert_eq!(code, 403);
                assert!(message.contains("9109"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_zone_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [],
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).a_records("unknown.com").await.unwrap_err();
        assert!(matches!(err, SweepError::ApiRejected(_)));
    }

    #[tokio::test]
    async fn non_a_and_unparsable_records_are_skipped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [{"id": "zone-1", "name": "example.com"}],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zones/zone-1/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [
                    {"id": "r1", "type": "CNAME", "name": "www.example.com", "content": "x.com"},
                    {"id": "r2", "type": "A", "name": "example.com", "content": "not-an-ip"},
                    {"id": "r3", "type": "A", "name": "example.com", "content": "203.0.113.5"},
                ],
            })))
            .mount(&server)
            .await;

        let records = client_for(&server).a_records("example.com").await.unwrap();
        assert_eq!(records, vec!["203.0.113.5".parse::<Ipv4Addr>().unwrap()]);
    }
}
