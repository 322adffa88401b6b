//! 텔레메트리 에이전트.
//!
//! 호스트 기능에 맞춰 시그널 소스를 만들고, 소스가 내보낸 값을 저장소에 기록한 뒤
//! 카테고리별 전송 정책에 따라 디스패처로 넘긴다.

use perfwatch_core::clock::SessionClock;
use perfwatch_core::config::AppConfig;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::{MetricCategory, MetricValue, ValueShape};
use perfwatch_core::ports::environment::HostCapabilities;
use perfwatch_core::ports::signal::{Emitter, SignalSource, SourceHandle};
use perfwatch_monitor::idle::IdleSource;
use perfwatch_monitor::memory::MemorySource;
use perfwatch_monitor::network::NetworkSource;
use perfwatch_monitor::page_load::PageLoadSource;
use perfwatch_monitor::resources::ResourceSource;
use perfwatch_network::dispatcher::Dispatcher;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::store::MetricsStore;

/// 카테고리 상태: 소스가 시작되면 Active, 세션 동안 되돌아가지 않는다
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    Idle,
    Active,
}

/// 소스 출력 → 저장소 기록 → 전송
///
/// 1회성/스트리밍 카테고리는 값마다 바로 보내고,
/// 폴링 카테고리는 소스의 틱마다 값이 오므로 그 자체가 전송 시점이다.
struct MetricSink {
    store: Arc<MetricsStore>,
    dispatcher: Dispatcher,
}

impl MetricSink {
    fn accept(&self, category: MetricCategory, value: MetricValue) -> Result<(), CoreError> {
        match (category.shape(), value) {
            (ValueShape::Sequence, MetricValue::Resources(records)) => {
                self.store.append(category, records.clone())?;
                self.dispatcher.send(category, MetricValue::Resources(records));
            }
            (_, value) => {
                self.store.set(category, value.clone())?;
                self.dispatcher.send(category, value);
            }
        }
        Ok(())
    }
}

/// 텔레메트리 에이전트
///
/// 호스트가 한 번 만들어 소유한다. drop 되면 모든 소스가 정지한다.
pub struct TelemetryAgent {
    store: Arc<MetricsStore>,
    dispatcher: Dispatcher,
    active: [AtomicBool; MetricCategory::COUNT],
    handles: Vec<SourceHandle>,
    clock: SessionClock,
    stopped: AtomicBool,
}

impl TelemetryAgent {
    /// 에이전트 시작
    ///
    /// 기능이 있고 설정에서 켜진 카테고리의 소스만 생성해 시작한다.
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn start(
        capabilities: HostCapabilities,
        dispatcher: Dispatcher,
        config: &AppConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        if Handle::try_current().is_err() {
            return Err(CoreError::Internal(
                "tokio 런타임 밖에서 에이전트를 시작할 수 없습니다".to_string(),
            ));
        }

        let clock = SessionClock::start();
        let store = Arc::new(MetricsStore::new());
        let active: [AtomicBool; MetricCategory::COUNT] =
            std::array::from_fn(|_| AtomicBool::new(false));

        let sink = Arc::new(MetricSink {
            store: store.clone(),
            dispatcher: dispatcher.clone(),
        });

        let handles: Vec<SourceHandle> = build_sources(&capabilities, clock, config)
            .into_iter()
            .map(|source| {
                let category = source.category();
                let sink = sink.clone();
                let emit: Emitter = Arc::new(move |value| sink.accept(category, value));
                let handle = source.start(emit);
                active[category.index()].store(true, Ordering::Release);
                debug!(
                    "카테고리 활성: {category} (전송 시점 {:?})",
                    category.flush_policy()
                );
                handle
            })
            .collect();

        info!(
            "텔레메트리 에이전트 시작: 소스 {}개 ({})",
            handles.len(),
            handles
                .iter()
                .map(|handle| handle.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            store,
            dispatcher,
            active,
            handles,
            clock,
            stopped: AtomicBool::new(false),
        })
    }

    /// 현재 지표 스냅샷 (읽기 전용 복사본)
    pub fn metrics(&self) -> BTreeMap<MetricCategory, MetricValue> {
        self.store.snapshot_all()
    }

    /// 카테고리 상태
    pub fn category_state(&self, category: MetricCategory) -> CategoryState {
        if self.active[category.index()].load(Ordering::Acquire) {
            CategoryState::Active
        } else {
            CategoryState::Idle
        }
    }

    /// 생성된 소스 이름 목록
    pub fn active_sources(&self) -> Vec<&'static str> {
        self.handles.iter().map(|handle| handle.name()).collect()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn clock(&self) -> SessionClock {
        self.clock
    }

    /// 모든 소스 정지
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        for handle in &self.handles {
            handle.stop();
        }
        info!("텔레메트리 에이전트 정지");
    }
}

impl Drop for TelemetryAgent {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TelemetryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryAgent")
            .field("sources", &self.active_sources())
            .field("categories", &self.store.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// 기능/설정에 맞는 시그널 소스 목록 생성
fn build_sources(
    capabilities: &HostCapabilities,
    clock: SessionClock,
    config: &AppConfig,
) -> Vec<Arc<dyn SignalSource>> {
    let enabled = |category: MetricCategory| {
        let on = config.categories.is_enabled(category);
        if !on {
            debug!("설정에서 비활성화된 카테고리: {category}");
        }
        on
    };

    let mut sources: Vec<Arc<dyn SignalSource>> = Vec::new();

    if enabled(MetricCategory::PageLoad) {
        sources.push(Arc::new(PageLoadSource::new(
            capabilities.timeline.clone(),
            capabilities.lifecycle.clone(),
            clock,
            &config.monitor,
        )));
    }

    if enabled(MetricCategory::Resources) {
        sources.push(Arc::new(ResourceSource::new(capabilities.timeline.clone())));
    }

    if enabled(MetricCategory::IdleTime) {
        sources.push(Arc::new(IdleSource::new(
            capabilities.interactions.clone(),
            clock,
            &config.monitor,
        )));
    }

    if enabled(MetricCategory::Memory) {
        match &capabilities.heap {
            Some(heap) => sources.push(Arc::new(MemorySource::new(
                heap.clone(),
                config.monitor.memory_tick(),
            ))),
            None => info!("힙 정보 기능 없음, 메모리 수집 생략"),
        }
    }

    if enabled(MetricCategory::Network) {
        match &capabilities.connection {
            Some(connection) => sources.push(Arc::new(NetworkSource::new(connection.clone()))),
            None => info!("연결 정보 기능 없음, 네트워크 품질 수집 생략"),
        }
    }

    sources
}
