//! 힙 메모리 소스 (주기 폴링).

use perfwatch_core::models::metrics::{MetricCategory, MetricValue};
use perfwatch_core::ports::environment::HeapProbe;
use perfwatch_core::ports::signal::{stopped, Emitter, SignalSource, SourceHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// 힙 메모리 소스: 주기마다 스냅샷을 내보낸다
pub struct MemorySource {
    probe: Arc<dyn HeapProbe>,
    tick: Duration,
}

impl MemorySource {
    pub fn new(probe: Arc<dyn HeapProbe>, tick: Duration) -> Self {
        Self { probe, tick }
    }
}

impl SignalSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Memory
    }

    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle {
        SourceHandle::spawn(self.name(), self.category(), move |mut stop_rx| async move {
            let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stopped(&mut stop_rx) => break,
                    _ = ticker.tick() => {}
                }

                let snapshot = match self.probe.heap_usage() {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("힙 사용량 조회 실패: {e}");
                        continue;
                    }
                };

                debug!("힙 스냅샷: {}B 사용", snapshot.used_bytes);
                if let Err(e) = emit(MetricValue::Memory(snapshot)) {
                    warn!("메모리 스냅샷 기록 실패: {e}");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use perfwatch_core::error::CoreError;
    use perfwatch_core::models::metrics::MemorySnapshot;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// 호출마다 사용량이 늘어나는 프로브, 두 번째 호출은 실패
    struct CountingProbe {
        calls: AtomicU64,
    }

    impl HeapProbe for CountingProbe {
        fn heap_usage(&self) -> Result<MemorySnapshot, CoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                return Err(CoreError::Internal("probe failed".to_string()));
            }
            Ok(MemorySnapshot {
                used_bytes: n * 1024,
                total_bytes: 8 * 1024,
                limit_bytes: 64 * 1024,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn samples_every_tick_and_skips_failures() {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let emit: Emitter = Arc::new(move |value| {
            sink.lock().push(value);
            Ok(())
        });
        let probe = Arc::new(CountingProbe {
            calls: AtomicU64::new(0),
        });
        let source = Arc::new(MemorySource::new(probe, Duration::from_millis(10_000)));
        let handle = source.start(emit);

        tokio::time::sleep(Duration::from_millis(9_999)).await;
        assert!(values.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(20_002)).await;
        let used: Vec<u64> = values
            .lock()
            .iter()
            .map(|value| match value {
                MetricValue::Memory(snapshot) => snapshot.used_bytes,
                other => panic!("unexpected value: {other:?}"),
            })
            .collect();
        assert_eq!(used, vec![1024, 3072]);

        handle.stop();
    }
}
