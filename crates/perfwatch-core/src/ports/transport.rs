//! 수집 서버 전송 포트.
//!
//! 구현: `perfwatch-network::http_client::HttpCollectorClient`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metrics::TelemetryPayload;

/// 텔레메트리 페이로드 전송
#[async_trait]
pub trait MetricsTransport: Send + Sync {
    /// 페이로드 1건 전송: 응답 본문은 사용하지 않는다
    async fn submit(&self, payload: &TelemetryPayload) -> Result<(), CoreError>;
}
