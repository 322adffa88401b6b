//! 유휴 시간 감지 모듈.
//!
//! 마지막 사용자 상호작용 시각을 추적하고, 주기마다 유휴 간격이 임계값을 넘으면
//! `idleTime` 값을 내보낸다.

use perfwatch_core::clock::SessionClock;
use perfwatch_core::config::MonitorConfig;
use perfwatch_core::models::metrics::{MetricCategory, MetricValue};
use perfwatch_core::ports::environment::InteractionNotifier;
use perfwatch_core::ports::signal::{stopped, Emitter, SignalSource, SourceHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::rate_control::throttle;

/// 유휴 추적기
///
/// 마지막 상호작용 시각(세션 기준 ms)을 원자적으로 보관한다.
pub struct IdleTracker {
    clock: SessionClock,
    /// f64 비트 패턴
    last_interaction_ms: AtomicU64,
    threshold_ms: f64,
}

impl IdleTracker {
    /// 새 유휴 추적기 생성: 생성 시점을 마지막 상호작용으로 간주
    pub fn new(clock: SessionClock, threshold: Duration) -> Self {
        Self {
            clock,
            last_interaction_ms: AtomicU64::new(clock.now_ms().to_bits()),
            threshold_ms: threshold.as_secs_f64() * 1000.0,
        }
    }

    /// 상호작용 기록
    pub fn record_interaction(&self) {
        self.last_interaction_ms
            .store(self.clock.now_ms().to_bits(), Ordering::Relaxed);
    }

    /// 마지막 상호작용 시각 (세션 기준 ms)
    pub fn last_interaction_ms(&self) -> f64 {
        f64::from_bits(self.last_interaction_ms.load(Ordering::Relaxed))
    }

    /// 현재 유휴 간격 (ms)
    pub fn idle_gap_ms(&self) -> f64 {
        (self.clock.now_ms() - self.last_interaction_ms()).max(0.0)
    }

    /// 임계값을 초과한 경우에만 유휴 간격 반환
    pub fn check(&self) -> Option<f64> {
        let gap = self.idle_gap_ms();
        (gap > self.threshold_ms).then_some(gap)
    }

    pub fn threshold_ms(&self) -> f64 {
        self.threshold_ms
    }
}

/// 유휴 시간 소스 (주기 폴링)
pub struct IdleSource {
    interactions: Arc<dyn InteractionNotifier>,
    tracker: Arc<IdleTracker>,
    tick: Duration,
    interaction_throttle: Duration,
}

impl IdleSource {
    pub fn new(
        interactions: Arc<dyn InteractionNotifier>,
        clock: SessionClock,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            interactions,
            tracker: Arc::new(IdleTracker::new(clock, config.idle_threshold())),
            tick: config.idle_tick(),
            interaction_throttle: config.interaction_throttle(),
        }
    }

    pub fn tracker(&self) -> &Arc<IdleTracker> {
        &self.tracker
    }
}

impl SignalSource for IdleSource {
    fn name(&self) -> &'static str {
        "idle_time"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::IdleTime
    }

    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle {
        let mut interactions = self.interactions.subscribe();

        SourceHandle::spawn(self.name(), self.category(), move |mut stop_rx| async move {
            let tracker = self.tracker.clone();
            let bursty = throttle(
                move |_: ()| tracker.record_interaction(),
                self.interaction_throttle,
            );

            let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut listening = true;

            loop {
                tokio::select! {
                    _ = stopped(&mut stop_rx) => break,
                    _ = ticker.tick() => {
                        if let Some(gap) = self.tracker.check() {
                            debug!("유휴 {:.0}ms", gap);
                            if let Err(e) = emit(MetricValue::IdleTime(gap)) {
                                warn!("유휴 시간 기록 실패: {e}");
                            }
                        }
                    }
                    received = interactions.recv(), if listening => match received {
                        Ok(kind) if kind.is_bursty() => {
                            bursty.call(());
                        }
                        Ok(kind) => {
                            trace!("상호작용: {kind:?}");
                            self.tracker.record_interaction();
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            trace!("상호작용 {skipped}건 누락 (활동으로 간주)");
                            self.tracker.record_interaction();
                        }
                        Err(RecvError::Closed) => {
                            debug!("상호작용 알림 종료");
                            listening = false;
                        }
                    },
                }
            }
        })
    }
}
