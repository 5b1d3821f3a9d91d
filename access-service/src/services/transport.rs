//! Mocked transport standing in for the HTTP client.
//!
//! Each request waits a simulated latency, then either fails with a
//! transient fault (with the configured probability) or runs the local
//! operation and wraps its result in an `{ ok, status, data }` envelope.
//! Nothing is retried here.

use std::future::Future;
use std::time::Duration;

use http::{Method, StatusCode};
use rand::Rng;
use serde::Serialize;
use tokio::time::sleep;

use super::ServiceError;
use crate::config::TransportConfig;

/// Mocked response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub status: u16,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            status: StatusCode::OK.as_u16(),
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            ok: true,
            status: StatusCode::CREATED.as_u16(),
            data,
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    config: TransportConfig,
}

impl MockTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Transport with no latency and no faults.
    pub fn instant() -> Self {
        Self::new(TransportConfig::instant())
    }

    /// Join the base path, a resource path and a url-encoded query.
    /// Parameters with empty values are skipped.
    pub fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ServiceError> {
        let mut url = format!(
            "{}/{}",
            self.config.base_path.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let present: Vec<(&str, &str)> = params
            .iter()
            .copied()
            .filter(|(_, v)| !v.is_empty())
            .collect();
        if !present.is_empty() {
            let query = serde_urlencoded::to_string(&present).map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Invalid query parameters: {}", e))
            })?;
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    fn simulated_delay(&self) -> Duration {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.config.latency + Duration::from_millis(jitter)
    }

    fn should_fail(&self) -> bool {
        let rate = self.config.failure_rate.clamp(0.0, 1.0);
        rate > 0.0 && rand::thread_rng().gen_bool(rate)
    }

    /// Simulate the network boundary, then run `operation` locally.
    ///
    /// `operation` is only polled after the delay, so reads and mutations
    /// observe the store as it is when the simulated response "arrives".
    pub async fn request<T, F>(
        &self,
        method: Method,
        url: &str,
        operation: F,
    ) -> Result<ApiResponse<T>, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let delay = self.simulated_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        if self.should_fail() {
            tracing::warn!(method = %method, url = url, "Simulated network failure");
            return Err(ServiceError::Transient {
                operation: format!("{} {}", method, url),
            });
        }

        let data = operation.await?;
        tracing::debug!(
            method = %method,
            url = url,
            delay_ms = delay.as_millis() as u64,
            "Mock request completed"
        );

        if method == Method::POST {
            Ok(ApiResponse::created(data))
        } else {
            Ok(ApiResponse::success(data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(failure_rate: f64) -> MockTransport {
        MockTransport::new(TransportConfig {
            failure_rate,
            ..TransportConfig::instant()
        })
    }

    #[test]
    fn test_build_url() {
        let t = MockTransport::instant();
        assert_eq!(t.build_url("/policies", &[]).unwrap(), "/api/policies");
        assert_eq!(
            t.build_url("policy-links", &[("entity_type", "user"), ("entity_id", "u1")])
                .unwrap(),
            "/api/policy-links?entity_type=user&entity_id=u1"
        );
        assert_eq!(
            t.build_url("/statements", &[("policy_id", "")]).unwrap(),
            "/api/statements"
        );
    }

    #[test]
    fn test_build_url_encodes_reserved_characters() {
        let t = MockTransport::instant();
        assert_eq!(
            t.build_url("/policies", &[("search", "r&d budget=x")]).unwrap(),
            "/api/policies?search=r%26d+budget%3Dx"
        );
        assert_eq!(
            t.build_url("/policy-links", &[("entity_type", ""), ("entity_id", "a/b?c")])
                .unwrap(),
            "/api/policy-links?entity_id=a%2Fb%3Fc"
        );
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = transport(0.0)
            .request(Method::GET, "/api/policies", async { Ok(vec![1, 2, 3]) })
            .await
            .unwrap();
        assert!(response.ok);
        assert_eq!(response.status, 200);
        assert_eq!(response.into_data(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_post_returns_created() {
        let response = transport(0.0)
            .request(Method::POST, "/api/policies", async { Ok("p1") })
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_certain_failure_is_transient_and_skips_operation() {
        let ran = std::sync::atomic::AtomicBool::new(false);
        let result = transport(1.0)
            .request(Method::DELETE, "/api/policies/p1", async {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Transient { .. })));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let t = MockTransport::new(TransportConfig {
            latency: Duration::from_millis(300),
            ..TransportConfig::instant()
        });
        let started = tokio::time::Instant::now();
        t.request(Method::GET, "/api/policies", async { Ok(()) })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_delay_stays_within_jitter_bound() {
        let t = MockTransport::new(TransportConfig {
            latency: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
            ..TransportConfig::instant()
        });
        for _ in 0..50 {
            let d = t.simulated_delay();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(150));
        }
    }
}
