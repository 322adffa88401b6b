//! 시그널 소스 포트.
//!
//! 성능 사실이 알려지는 다섯 가지 방식(1회 이벤트, 스트리밍 옵저버, 주기 폴링,
//! 1회 스냅샷, 조건 충족까지 재귀 폴링)을 하나의 계약으로 추상화한다.
//! 구현: `perfwatch-monitor` crate

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::CoreError;
use crate::models::metrics::{MetricCategory, MetricValue};

/// 소스가 값을 내보내는 콜백
///
/// 저장소 반영에 실패하면 에러를 돌려준다. 소스는 로그만 남기고 계속 동작한다.
pub type Emitter = Arc<dyn Fn(MetricValue) -> Result<(), CoreError> + Send + Sync>;

/// 시그널 소스
///
/// `start`는 tokio 런타임 안에서 호출해야 한다.
/// 소스 내부 실패는 소스 안에서 처리하며 다른 소스의 실행을 막지 않는다.
pub trait SignalSource: Send + Sync {
    /// 로그용 소스 이름
    fn name(&self) -> &'static str;

    /// 값을 기록하는 카테고리
    fn category(&self) -> MetricCategory;

    /// 소스 태스크 시작
    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle;
}

/// 실행 중인 소스 핸들: 타이머/옵저버 정리용
pub struct SourceHandle {
    name: &'static str,
    category: MetricCategory,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SourceHandle {
    /// 종료 신호 수신기를 받아 소스 루프를 태스크로 실행
    pub fn spawn<F, Fut>(name: &'static str, category: MetricCategory, body: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(body(stop_rx));
        debug!("시그널 소스 시작: {name} ({category})");
        Self {
            name,
            category,
            stop_tx,
            task,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> MetricCategory {
        self.category
    }

    /// 소스 정지: 타이머 해제, 옵저버 구독 해제
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
        debug!("시그널 소스 정지: {}", self.name);
    }

    /// 소스 태스크 종료 여부 (1회성 소스는 값을 내보낸 뒤 종료)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl std::fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHandle")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

/// 종료 신호가 올 때까지 대기
///
/// 송신 측이 사라진 경우도 종료로 본다.
pub async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    while !*stop_rx.borrow() {
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}
