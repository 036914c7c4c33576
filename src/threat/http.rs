use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{tls, Certificate, Client, StatusCode};

use super::ThreatListSource;
use crate::error::ScanError;
use crate::platform::find_ca_bundle;

const USER_AGENT: &str = "lockscan-security-scanner";

/// Downloads the threat list over HTTPS with certificate verification.
///
/// When a system CA bundle is found it becomes the only trust store;
/// otherwise the platform roots are used.
pub struct HttpThreatSource {
    client: Client,
    url: String,
}

impl HttpThreatSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ScanError> {
        let mut builder = Client::builder()
            .https_only(true)
            .min_tls_version(tls::Version::TLS_1_2)
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT);

        if let Some(bundle) = find_ca_bundle() {
            let pem = fs::read(&bundle).map_err(|e| ScanError::io(&bundle, e))?;
            let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
                ScanError::ThreatListFetch(format!(
                    "invalid CA bundle {}: {}",
                    bundle.display(),
                    e
                ))
            })?;

            if !certs.is_empty() {
                tracing::debug!(bundle = %bundle.display(), certs = certs.len(), "pinning CA bundle");
                builder = builder.tls_built_in_root_certs(false);
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::ThreatListFetch(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ThreatListSource for HttpThreatSource {
    fn name(&self) -> &'static str {
        "HTTPS"
    }

    async fn fetch(&self) -> Result<String, ScanError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ScanError::ThreatListFetch(e.to_string()))?;

        check_status(response.status())?;

        response
            .text()
            .await
            .map_err(|e| ScanError::ThreatListFetch(e.to_string()))
    }
}

/// Anything outside 2xx is a failed download.
fn check_status(status: StatusCode) -> Result<(), ScanError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ScanError::ThreatListFetch(format!("HTTP {}", status.as_u16())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::valid_list;
    use crate::cache::ThreatListCache;
    use crate::config::ThreatListConfig;
    use std::time::Instant;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    /// Accepts connections and never answers, so the TLS handshake stalls.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("https://{}/compromised-packages.txt", addr)
    }

    #[test]
    fn test_new_keeps_url() {
        let source = HttpThreatSource::new(
            "https://example.com/compromised-packages.txt",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(source.url(), "https://example.com/compromised-packages.txt");
        assert_eq!(source.name(), "HTTPS");
    }

    #[tokio::test]
    async fn test_plain_http_is_refused() {
        let source =
            HttpThreatSource::new("http://127.0.0.1:9/list.txt", Duration::from_secs(1)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ScanError::ThreatListFetch(_)));
    }

    #[test]
    fn test_non_success_status_is_fetch_error() {
        assert!(check_status(StatusCode::OK).is_ok());
        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::NOT_MODIFIED,
        ] {
            let err = check_status(status).unwrap_err();
            assert_eq!(
                err.to_string(),
                ScanError::ThreatListFetch(format!("HTTP {}", status.as_u16())).to_string()
            );
        }
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let url = silent_server().await;
        let source = HttpThreatSource::new(&url, Duration::from_millis(300)).unwrap();

        let started = Instant::now();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ScanError::ThreatListFetch(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_cached_list() {
        let dir = TempDir::new().unwrap();
        let url = silent_server().await;
        let config = ThreatListConfig {
            url: url.clone(),
            timeout: Duration::from_millis(300),
            ..ThreatListConfig::with_cache_dir(dir.path())
        };
        std::fs::write(config.cache_file(), valid_list(&["left-pad:1.3.0"])).unwrap();

        let source = HttpThreatSource::new(&url, config.timeout).unwrap();
        let cache = ThreatListCache::new(config, source);
        let threats = cache.compromised_packages(true).await.unwrap();

        assert!(threats.fallback_warning.is_some());
        assert!(threats.contains(&crate::model::PackageIdentity::new("left-pad", "1.3.0")));
    }
}
