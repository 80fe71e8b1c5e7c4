//! HTTP(S) GET over `ureq`.

use std::time::Duration;

use url::Url;

use baodweb_types::FetchError;

use super::CancelToken;

/// Maximum response body size (8 MB).
const MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

const USER_AGENT: &str = concat!("BaodWeb/", env!("CARGO_PKG_VERSION"));

/// Blocking client with one global timeout per request.
pub struct HttpClient {
    agent: ureq::Agent,
    timeout: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            timeout,
        }
    }

    /// GET `url`. Redirects are followed; a non-2xx final status is an
    /// error.
    pub fn get(&self, url: &Url, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| self.map_error(url, e))?;
        cancel.check()?;
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .map_err(|e| self.map_error(url, e))?;
        cancel.check()?;
        log::debug!("GET {url}: {} bytes", body.len());
        Ok(body)
    }

    fn map_error(&self, url: &Url, err: ureq::Error) -> FetchError {
        match err {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            ureq::Error::Timeout(_) => FetchError::Timeout(self.timeout),
            ureq::Error::Io(e) => FetchError::Io(e),
            other => FetchError::Unreachable(format!("{url}: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_status() {
        let client = HttpClient::new(Duration::from_secs(1));
        let url = Url::parse("http://x.test/").unwrap();
        assert!(matches!(
            client.map_error(&url, ureq::Error::StatusCode(404)),
            FetchError::Status(404)
        ));
    }

    #[test]
    fn other_errors_are_unreachable() {
        let client = HttpClient::new(Duration::from_secs(1));
        let url = Url::parse("http://x.test/").unwrap();
        let err = client.map_error(&url, ureq::Error::HostNotFound);
        assert!(matches!(err, FetchError::Unreachable(m) if m.contains("x.test")));
    }
}
