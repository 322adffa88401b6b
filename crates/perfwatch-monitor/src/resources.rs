//! 리소스 로드 소스 (스트리밍).
//!
//! 리소스 엔트리 옵저버를 구독하고 알림마다 정규화된 레코드 묶음을 내보낸다.

use perfwatch_core::models::metrics::{MetricCategory, MetricValue, ResourceRecord};
use perfwatch_core::models::timing::{EntryType, PerformanceEntry, ResourceTiming};
use perfwatch_core::ports::environment::PerformanceTimeline;
use perfwatch_core::ports::signal::{stopped, Emitter, SignalSource, SourceHandle};
use std::sync::Arc;
use tracing::{debug, warn};

/// 요청 주체를 알 수 없을 때 사용하는 값
const UNKNOWN_INITIATOR: &str = "other";

/// 리소스 타이밍을 와이어 레코드로 변환
fn to_record(timing: ResourceTiming) -> ResourceRecord {
    ResourceRecord {
        name: timing.name,
        duration_ms: timing.duration.max(0.0),
        size_bytes: timing.transfer_size.unwrap_or(0),
        initiator_type: timing
            .initiator_type
            .filter(|initiator| !initiator.is_empty())
            .unwrap_or_else(|| UNKNOWN_INITIATOR.to_string()),
    }
}

/// 리소스 로드 소스
pub struct ResourceSource {
    timeline: Arc<dyn PerformanceTimeline>,
}

impl ResourceSource {
    pub fn new(timeline: Arc<dyn PerformanceTimeline>) -> Self {
        Self { timeline }
    }
}

impl SignalSource for ResourceSource {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Resources
    }

    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle {
        // 시작 직후 알림도 받도록 태스크 생성 전에 구독
        let stream = self.timeline.observe(EntryType::Resource);

        SourceHandle::spawn(self.name(), self.category(), move |mut stop_rx| async move {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("리소스 옵저버 구독 불가, 리소스 수집 생략: {e}");
                    return;
                }
            };

            loop {
                let batch = tokio::select! {
                    _ = stopped(&mut stop_rx) => break,
                    batch = stream.recv() => batch,
                };
                let Some(batch) = batch else {
                    debug!("리소스 옵저버 종료");
                    break;
                };

                let records: Vec<ResourceRecord> = batch
                    .into_iter()
                    .filter_map(|entry| match entry {
                        PerformanceEntry::Resource(timing) => Some(to_record(timing)),
                        _ => None,
                    })
                    .collect();
                if records.is_empty() {
                    continue;
                }

                debug!("리소스 {}건 관찰", records.len());
                if let Err(e) = emit(MetricValue::Resources(records)) {
                    warn!("리소스 레코드 기록 실패: {e}");
                }
            }
        })
    }
}
