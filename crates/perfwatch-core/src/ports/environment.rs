//! 호스트 환경 기능 포트.
//!
//! 렌더링 환경(페이지 세션)이 제공하는 읽기 전용 기능들.
//! 구현: `perfwatch-monitor::host::ChannelHost`, `perfwatch-monitor::heap::SysInfoHeapProbe`

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::error::CoreError;
use crate::models::metrics::{MemorySnapshot, NetworkQuality};
use crate::models::timing::{EntryType, InteractionKind, PerformanceEntry};

/// 옵저버 알림 스트림: 알림 1회당 엔트리 묶음 1개
pub type EntryBatchStream = mpsc::UnboundedReceiver<Vec<PerformanceEntry>>;

/// 네비게이션/페인트/리소스 타이밍 소스
pub trait PerformanceTimeline: Send + Sync {
    /// 이미 버퍼링된 엔트리 조회
    fn entries_by_type(&self, kind: EntryType) -> Vec<PerformanceEntry>;

    /// 엔트리 옵저버 구독
    ///
    /// 관찰할 수 없는 유형이면 `CoreError::Unsupported`.
    fn observe(&self, kind: EntryType) -> Result<EntryBatchStream, CoreError>;
}

/// 문서 라이프사이클
#[async_trait]
pub trait PageLifecycle: Send + Sync {
    /// load 완료 이벤트 대기 (이미 발생했으면 즉시 반환)
    async fn wait_for_load(&self);

    /// 문서 준비 완료 여부 (readyState == complete)
    fn is_document_complete(&self) -> bool;
}

/// 사용자 상호작용 알림 (click/keypress/scroll/pointermove)
///
/// passive 구독: 수신 측이 느려도 발신 측을 막지 않는다.
pub trait InteractionNotifier: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<InteractionKind>;
}

/// 힙 사용량 조회 (선택 기능)
pub trait HeapProbe: Send + Sync {
    fn heap_usage(&self) -> Result<MemorySnapshot, CoreError>;
}

/// 연결 품질 조회 (선택 기능)
pub trait ConnectionProbe: Send + Sync {
    fn connection(&self) -> Result<NetworkQuality, CoreError>;
}

/// 시작 시 한 번 조사한 호스트 기능 묶음
///
/// 선택 기능이 `None`이면 해당 시그널 소스는 생성되지 않는다.
#[derive(Clone)]
pub struct HostCapabilities {
    pub timeline: Arc<dyn PerformanceTimeline>,
    pub lifecycle: Arc<dyn PageLifecycle>,
    pub interactions: Arc<dyn InteractionNotifier>,
    pub heap: Option<Arc<dyn HeapProbe>>,
    pub connection: Option<Arc<dyn ConnectionProbe>>,
    /// 페이로드 `userAgent` 값
    pub client_context: String,
}

impl HostCapabilities {
    /// 필수 기능만으로 생성 (선택 기능 없음)
    pub fn new(
        timeline: Arc<dyn PerformanceTimeline>,
        lifecycle: Arc<dyn PageLifecycle>,
        interactions: Arc<dyn InteractionNotifier>,
        client_context: impl Into<String>,
    ) -> Self {
        Self {
            timeline,
            lifecycle,
            interactions,
            heap: None,
            connection: None,
            client_context: client_context.into(),
        }
    }

    /// 힙 프로브 설정
    pub fn with_heap(mut self, heap: Arc<dyn HeapProbe>) -> Self {
        self.heap = Some(heap);
        self
    }

    /// 연결 프로브 설정
    pub fn with_connection(mut self, connection: Arc<dyn ConnectionProbe>) -> Self {
        self.connection = Some(connection);
        self
    }
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("heap", &self.heap.is_some())
            .field("connection", &self.connection.is_some())
            .field("client_context", &self.client_context)
            .finish()
    }
}
