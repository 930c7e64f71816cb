use crate::{ClientConfig, Transport, TransportError};
use std::io::Read;
use std::time::Duration;

/// Blocking HTTP transport for the disk image API.
///
/// Every request carries `User-Agent`, plus `Authorization: Bearer <key>` when
/// an API key is configured. A configured region is appended to the query
/// string as `region=<region>`.
pub struct HttpTransport {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        Self { config, agent }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        let mut url = format!("{}{}", self.config.url, path);
        if let Some(ref region) = self.config.region {
            let sep = if path.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str("region=");
            url.push_str(&urlencoding::encode(region));
        }
        url
    }

    fn with_headers<B>(&self, req: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let req = req
            .header("User-Agent", crate::USER_AGENT)
            .header("Accept", "application/json");
        match self.config.api_key {
            Some(ref key) => req.header("Authorization", &format!("Bearer {key}")),
            None => req,
        }
    }

    fn finish(
        path: &str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<Vec<u8>, TransportError> {
        let resp = match result {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(TransportError::from_response(code, path, &[]));
            }
            Err(e) => return Err(TransportError::Connection(e.to_string())),
        };

        let code = resp.status().as_u16();
        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if code >= 400 {
            let err = TransportError::from_response(code, path, &body);
            tracing::debug!("{err}");
            return Err(err);
        }
        Ok(body)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        tracing::debug!("GET {url}");
        let result = self.with_headers(self.agent.get(&url)).call();
        Self::finish(path, result)
    }

    fn post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        tracing::debug!("POST {url} ({} bytes)", body.len());
        let result = self
            .with_headers(self.agent.post(&url))
            .header("Content-Type", "application/json")
            .send(body);
        Self::finish(path, result)
    }

    fn delete(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        tracing::debug!("DELETE {url}");
        let result = self.with_headers(self.agent.delete(&url)).call();
        Self::finish(path, result)
    }
}
