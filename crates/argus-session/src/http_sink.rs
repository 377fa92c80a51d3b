use argus_foundation::error::EmitError;
use async_trait::async_trait;
use std::time::Duration;

/// Contract for the external event-forwarding transport.
///
/// `post` is best-effort: the emitter dispatches it on its own task and
/// discards failures after logging, so a slow or dead sink never blocks
/// the data channel path.
#[async_trait]
pub trait SinkClient: Send + Sync {
    async fn post(&self, path: &str, body: String, correlation_id: &str) -> Result<(), EmitError>;
}

/// HTTP implementation of [`SinkClient`]: POSTs event JSON to
/// `{base_url}/{path}` with the forwarding headers. Responses are ignored
/// and status codes are not interpreted.
pub struct HttpSink {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSink {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Share one pre-built client across sessions.
    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn event_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SinkClient for HttpSink {
    async fn post(&self, path: &str, body: String, correlation_id: &str) -> Result<(), EmitError> {
        let url = self.event_url(path);
        self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-API-Key", &self.api_key)
            .header("X-Correlation-Id", correlation_id)
            .body(body)
            .send()
            .await
            .map_err(|e| EmitError::HttpFailed(format!("{}: {}", url, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_normalizes_slashes() {
        let sink = HttpSink::new("http://localhost:8080/", "", Duration::from_secs(10));
        assert_eq!(
            sink.event_url("events/object"),
            "http://localhost:8080/events/object"
        );
        assert_eq!(
            sink.event_url("/events/emotion"),
            "http://localhost:8080/events/emotion"
        );
    }

    #[tokio::test]
    async fn unreachable_sink_reports_failure() {
        // Reserved TEST-NET address: connection fails fast, nothing listens.
        let sink = HttpSink::new("http://192.0.2.1:1", "key", Duration::from_millis(200));
        let result = sink.post("events/object", "{}".into(), "abc").await;
        assert!(result.is_err());
    }
}
