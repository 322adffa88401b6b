//! 세션 시계.
//!
//! 에이전트 시작 시점을 원점으로 하는 단조 증가 밀리초 시계.
//! `tokio::time::Instant` 기반이라 테스트에서 `pause()`된 시간으로 구동된다.

use std::time::Duration;
use tokio::time::Instant;

/// 세션 원점 기준 시계 (복사 가능)
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    /// 현재 시각을 원점으로 시작
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// 지정 시각을 원점으로 사용
    pub fn with_origin(origin: Instant) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// 원점 이후 경과 시간 (밀리초, 소수)
    pub fn now_ms(&self) -> f64 {
        self.elapsed().as_nanos() as f64 / 1_000_000.0
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }

    /// 원점 기준 밀리초를 `Instant`로 변환
    pub fn instant_at(&self, offset_ms: f64) -> Instant {
        self.origin + Duration::from_secs_f64(offset_ms.max(0.0) / 1000.0)
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}
