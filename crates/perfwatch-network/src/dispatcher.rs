//! 메트릭 디스패처.
//!
//! 카테고리 값을 페이로드로 감싸 백그라운드 태스크로 전송한다.
//! 호출자는 결과를 기다리지 않으며, 실패는 로그와 통계에만 남는다 (재시도 없음).

use perfwatch_core::models::metrics::{MetricCategory, MetricValue, TelemetryPayload};
use perfwatch_core::ports::transport::MetricsTransport;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// 전송 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 성공한 전송 수
    pub sent: u64,
    /// 실패한 전송 수
    pub failed: u64,
    /// 진행 중인 전송 수
    pub in_flight: usize,
}

struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Counters {
    fn finish(&self, ok: bool) {
        if ok {
            self.sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// fire-and-forget 디스패처
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MetricsTransport>,
    client_context: Arc<str>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// 새 디스패처 생성
    pub fn new(transport: Arc<dyn MetricsTransport>, client_context: impl Into<String>) -> Self {
        Self {
            transport,
            client_context: Arc::from(client_context.into()),
            counters: Arc::new(Counters {
                sent: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// 값 전송: 즉시 반환하고 전송은 백그라운드에서 진행
    ///
    /// 값이 `category`에 속하지 않거나 tokio 런타임 밖에서 호출되면
    /// 전송하지 않고 실패로 집계한다.
    pub fn send(&self, category: MetricCategory, value: MetricValue) {
        if value.category() != category {
            warn!("{category} 전송 생략: {} 값이 전달됨", value.category());
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let payload = TelemetryPayload::new(value, &self.client_context);

        let Ok(runtime) = Handle::try_current() else {
            warn!("tokio 런타임 없음, {} 전송 생략", payload.category);
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        };

        self.counters.in_flight.fetch_add(1, Ordering::AcqRel);
        let transport = Arc::clone(&self.transport);
        let counters = Arc::clone(&self.counters);
        runtime.spawn(async move {
            match transport.submit(&payload).await {
                Ok(()) => {
                    debug!("{} 전송 완료", payload.category);
                    counters.finish(true);
                }
                Err(e) => {
                    warn!("{} 전송 실패 (재시도 없음): {e}", payload.category);
                    counters.finish(false);
                }
            }
        });
    }

    /// 현재 통계
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            in_flight: self.counters.in_flight.load(Ordering::Acquire),
        }
    }

    /// 진행 중인 전송이 모두 끝날 때까지 대기 (최대 `timeout`)
    ///
    /// 제한 시간 안에 끝났으면 true.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.counters.idle.notified();
                if self.counters.in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("client_context", &self.client_context)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use perfwatch_core::error::CoreError;
    use std::sync::Mutex;

    /// 받은 페이로드를 기록하고, 설정에 따라 실패하는 전송
    struct RecordingTransport {
        received: Mutex<Vec<TelemetryPayload>>,
        fail: bool,
        delay: Duration,
    }

    impl RecordingTransport {
        fn new(fail: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                fail,
                delay,
            })
        }
    }

    #[async_trait]
    impl MetricsTransport for RecordingTransport {
        async fn submit(&self, payload: &TelemetryPayload) -> Result<(), CoreError> {
            tokio::time::sleep(self.delay).await;
            self.received.lock().unwrap().push(payload.clone());
            if self.fail {
                return Err(CoreError::Network("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn send_returns_before_transport_completes() {
        let transport = RecordingTransport::new(false, Duration::from_secs(3));
        let dispatcher = Dispatcher::new(transport.clone(), "ua/1.0");

        dispatcher.send(MetricCategory::IdleTime, MetricValue::IdleTime(6000.0));
        assert_eq!(dispatcher.stats().in_flight, 1);
        assert!(transport.received.lock().unwrap().is_empty());

        assert!(dispatcher.wait_idle(Duration::from_secs(10)).await);
        let received = transport.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].category, MetricCategory::IdleTime);
        assert_eq!(received[0].client_context, "ua/1.0");
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                sent: 1,
                failed: 0,
                in_flight: 0
            }
        );
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let transport = RecordingTransport::new(true, Duration::ZERO);
        let dispatcher = Dispatcher::new(transport.clone(), "ua/1.0");

        dispatcher.send(MetricCategory::IdleTime, MetricValue::IdleTime(5500.0));
        dispatcher.send(MetricCategory::IdleTime, MetricValue::IdleTime(7000.0));
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

        let stats = dispatcher.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.sent, 0);
        // 재시도 없음
        assert_eq!(transport.received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn mismatched_category_is_dropped() {
        let transport = RecordingTransport::new(false, Duration::ZERO);
        let dispatcher = Dispatcher::new(transport.clone(), "ua/1.0");

        dispatcher.send(MetricCategory::Memory, MetricValue::IdleTime(1.0));
        assert!(dispatcher.wait_idle(Duration::from_secs(1)).await);
        assert_eq!(dispatcher.stats().failed, 1);
        assert!(transport.received.lock().unwrap().is_empty());
    }

    #[test]
    fn send_outside_runtime_is_dropped() {
        let transport = RecordingTransport::new(false, Duration::ZERO);
        let dispatcher = Dispatcher::new(transport.clone(), "ua/1.0");

        dispatcher.send(MetricCategory::IdleTime, MetricValue::IdleTime(1.0));
        assert_eq!(dispatcher.stats().failed, 1);
        assert!(transport.received.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_idle_times_out_while_in_flight() {
        let transport = RecordingTransport::new(false, Duration::from_secs(60));
        let dispatcher = Dispatcher::new(transport, "ua/1.0");

        dispatcher.send(MetricCategory::IdleTime, MetricValue::IdleTime(1.0));
        assert!(!dispatcher.wait_idle(Duration::from_secs(1)).await);
    }
}
