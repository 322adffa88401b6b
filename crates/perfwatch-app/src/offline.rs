//! 오프라인 전송: 수집 서버 없이 페이로드를 로그로만 남긴다.

use async_trait::async_trait;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::TelemetryPayload;
use perfwatch_core::ports::transport::MetricsTransport;
use tracing::info;

pub struct LogOnlyTransport;

#[async_trait]
impl MetricsTransport for LogOnlyTransport {
    async fn submit(&self, payload: &TelemetryPayload) -> Result<(), CoreError> {
        let body = serde_json::to_string(payload)?;
        info!("[offline] {} {body}", payload.category);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::models::metrics::MetricValue;

    #[tokio::test]
    async fn submit_always_succeeds() {
        let payload = TelemetryPayload::new(MetricValue::IdleTime(6000.0), "test");
        assert!(LogOnlyTransport.submit(&payload).await.is_ok());
    }
}
