use std::time::Duration;

use reqwest::{redirect, Client, Url};

use super::Probe;
use crate::error::{Result, ScanError};
use crate::types::{Measurement, ProbeOutcome};

pub const USER_AGENT: &str = concat!("recon-scan-rs/", env!("CARGO_PKG_VERSION"));

/// Status codes that mean "something lives here", even when access is denied or
/// the server answers with a redirect.
pub fn is_found_status(status: u16) -> bool {
    (200..300).contains(&status) || matches!(status, 301 | 302 | 401 | 403 | 407)
}

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// GET `base/path` for every candidate path. Redirects are reported, not followed.
#[derive(Debug, Clone)]
pub struct PathProbe {
    client: Client,
    base: String,
}

impl PathProbe {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;
        Self::with_client(client, base)
    }

    /// Use a caller-built client. It should not follow redirects.
    pub fn with_client(client: Client, base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        let url = Url::parse(&base)
            .map_err(|e| ScanError::InvalidSpecification(format!("{base}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidSpecification(format!(
                "{base}: only http and https URLs can be probed"
            )));
        }
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Probe<String> for PathProbe {
    async fn probe(&self, candidate: String, timeout: Duration) -> ProbeOutcome {
        let url = join_url(&self.base, &candidate);
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let measurement = Measurement::Http {
                    status,
                    size: resp.content_length(),
                };
                if is_found_status(status) {
                    ProbeOutcome::positive(candidate, measurement)
                } else {
                    ProbeOutcome::negative(candidate, None).with_measurement(measurement)
                }
            }
            Err(e) => ProbeOutcome::negative(candidate, Some(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_statuses() {
        for s in [200, 204, 299, 301, 302, 401, 403, 407] {
            assert!(is_found_status(s), "{s}");
        }
        for s in [100, 300, 303, 304, 307, 400, 404, 405, 500, 503] {
            assert!(!is_found_status(s), "{s}");
        }
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(join_url("http://h/", "/admin"), "http://h/admin");
        assert_eq!(join_url("http://h", "api/v1"), "http://h/api/v1");
        assert_eq!(join_url("http://h//", "//x"), "http://h/x");
    }

    #[test]
    fn non_http_base_is_rejected() {
        assert!(matches!(
            PathProbe::new("ftp://example.com"),
            Err(ScanError::InvalidSpecification(_))
        ));
        assert!(matches!(
            PathProbe::new("not a url"),
            Err(ScanError::InvalidSpecification(_))
        ));
    }
}
