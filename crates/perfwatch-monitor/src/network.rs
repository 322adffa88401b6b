//! 네트워크 품질 소스 (1회 스냅샷).

use perfwatch_core::models::metrics::{MetricCategory, MetricValue};
use perfwatch_core::ports::environment::ConnectionProbe;
use perfwatch_core::ports::signal::{Emitter, SignalSource, SourceHandle};
use std::sync::Arc;
use tracing::{info, warn};

/// 시작 시 연결 품질을 한 번 읽어 내보내는 소스
pub struct NetworkSource {
    probe: Arc<dyn ConnectionProbe>,
}

impl NetworkSource {
    pub fn new(probe: Arc<dyn ConnectionProbe>) -> Self {
        Self { probe }
    }
}

impl SignalSource for NetworkSource {
    fn name(&self) -> &'static str {
        "network"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Network
    }

    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle {
        SourceHandle::spawn(self.name(), self.category(), move |_stop_rx| async move {
            let quality = match self.probe.connection() {
                Ok(quality) => quality,
                Err(e) => {
                    warn!("연결 품질 조회 실패: {e}");
                    return;
                }
            };

            info!(
                "연결 품질: {} (downlink {}Mbps, rtt {}ms, saveData={})",
                quality.effective_type, quality.downlink, quality.rtt, quality.save_data
            );
            if let Err(e) = emit(MetricValue::Network(quality)) {
                warn!("연결 품질 기록 실패: {e}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelHost;
    use parking_lot::Mutex;
    use perfwatch_core::models::metrics::NetworkQuality;
    use std::time::Duration;

    #[tokio::test]
    async fn emits_connection_snapshot_once() {
        let host = Arc::new(ChannelHost::new());
        host.set_connection(Some(NetworkQuality {
            effective_type: "4g".to_string(),
            downlink: 10.0,
            rtt: 50,
            save_data: false,
        }));

        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let emit: Emitter = Arc::new(move |value| {
            sink.lock().push(value);
            Ok(())
        });
        let handle = Arc::new(NetworkSource::new(host)).start(emit);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let values = values.lock();
        assert_eq!(values.len(), 1);
        assert!(matches!(
            &values[0],
            MetricValue::Network(q) if q.effective_type == "4g" && q.rtt == 50
        ));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn probe_failure_emits_nothing() {
        let host = Arc::new(ChannelHost::new());
        let values = Arc::new(Mutex::new(0usize));
        let sink = values.clone();
        let emit: Emitter = Arc::new(move |_| {
            *sink.lock() += 1;
            Ok(())
        });
        let _handle = Arc::new(NetworkSource::new(host)).start(emit);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*values.lock(), 0);
    }
}
