//! HTTP 수집 클라이언트.
//!
//! `MetricsTransport` 포트 구현. 페이로드 1건을 JSON 본문으로 POST 한다 (재시도 없음).

use async_trait::async_trait;
use perfwatch_core::config::CollectorConfig;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::TelemetryPayload;
use perfwatch_core::ports::transport::MetricsTransport;
use std::time::Duration;
use tracing::{debug, warn};

/// 수집 서버 HTTP 클라이언트: `MetricsTransport` 포트 구현
pub struct HttpCollectorClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCollectorClient {
    /// 새 클라이언트 생성
    pub fn new(base_url: &str, endpoint_path: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), endpoint_path),
        })
    }

    /// 설정으로부터 생성
    pub fn from_config(config: &CollectorConfig) -> Result<Self, CoreError> {
        Self::new(
            &config.base_url,
            &config.endpoint_path,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    /// 전송 대상 URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(&self, resp: reqwest::Response) -> Result<(), CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            503 => Err(CoreError::ServiceUnavailable(text)),
            code => Err(CoreError::Http {
                status: code,
                body: text,
            }),
        }
    }
}

#[async_trait]
impl MetricsTransport for HttpCollectorClient {
    async fn submit(&self, payload: &TelemetryPayload) -> Result<(), CoreError> {
        let body = serde_json::to_vec(payload)?;
        debug!(
            "메트릭 전송: type={}, {}B → {}",
            payload.category,
            body.len(),
            self.endpoint
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("메트릭 전송 요청 실패: {e}")))?;

        self.check_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::models::metrics::{MetricValue, NetworkQuality};

    fn payload() -> TelemetryPayload {
        TelemetryPayload::new(
            MetricValue::Network(NetworkQuality {
                effective_type: "4g".to_string(),
                downlink: 10.0,
                rtt: 50,
                save_data: false,
            }),
            "perfwatch-test/1.0",
        )
    }

    #[tokio::test]
    async fn submit_posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/metrics")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "type": "network",
                "data": { "effectiveType": "4g", "downlink": 10.0, "rtt": 50, "saveData": false },
                "userAgent": "perfwatch-test/1.0",
            })))
            .with_status(200)
            .create_async()
            .await;

        let client =
            HttpCollectorClient::new(&server.url(), "/api/metrics", Duration::from_secs(5)).unwrap();
        client.submit(&payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn base_url_trailing_slash_is_trimmed() {
        let client = HttpCollectorClient::new(
            "http://localhost:8000/",
            "/api/metrics",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/metrics");
    }

    #[tokio::test]
    async fn service_unavailable_maps_to_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/metrics")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client =
            HttpCollectorClient::new(&server.url(), "/api/metrics", Duration::from_secs(5)).unwrap();
        let err = client.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, CoreError::ServiceUnavailable(body) if body == "maintenance"));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/metrics")
            .with_status(500)
            .create_async()
            .await;

        let client =
            HttpCollectorClient::new(&server.url(), "/api/metrics", Duration::from_secs(5)).unwrap();
        let err = client.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, CoreError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn unreachable_collector_is_network_error() {
        let client =
            HttpCollectorClient::new("http://127.0.0.1:1", "/api/metrics", Duration::from_secs(2))
                .unwrap();
        let err = client.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }
}
