//! 채널 기반 호스트 어댑터.
//!
//! 임베더(또는 세션 재생기, 테스트)가 이벤트를 밀어 넣으면
//! `PerformanceTimeline` / `PageLifecycle` / `InteractionNotifier` / `ConnectionProbe`
//! 포트로 노출한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::NetworkQuality;
use perfwatch_core::models::timing::{EntryType, InteractionKind, PerformanceEntry};
use perfwatch_core::ports::environment::{
    ConnectionProbe, EntryBatchStream, HostCapabilities, InteractionNotifier, PageLifecycle,
    PerformanceTimeline,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::debug;

/// 상호작용 브로드캐스트 버퍼 크기
const INTERACTION_CAPACITY: usize = 256;

/// 유형별 버퍼 최대 엔트리 수 (가득 차면 이후 엔트리는 옵저버에만 전달)
pub const ENTRY_BUFFER_LIMIT: usize = 250;

/// 채널 기반 호스트
pub struct ChannelHost {
    /// 버퍼링된 엔트리 (유형별, 도착 순, 유형당 `ENTRY_BUFFER_LIMIT`까지)
    buffered: Mutex<HashMap<EntryType, Vec<PerformanceEntry>>>,
    /// 유형별 옵저버
    observers: Mutex<HashMap<EntryType, Vec<mpsc::UnboundedSender<Vec<PerformanceEntry>>>>>,
    /// 관찰 불가 유형
    unsupported: Mutex<HashSet<EntryType>>,
    loaded_tx: watch::Sender<bool>,
    document_complete: AtomicBool,
    interactions_tx: broadcast::Sender<InteractionKind>,
    connection: Mutex<Option<NetworkQuality>>,
}

impl ChannelHost {
    /// 새 호스트 생성
    pub fn new() -> Self {
        let (loaded_tx, _) = watch::channel(false);
        let (interactions_tx, _) = broadcast::channel(INTERACTION_CAPACITY);
        Self {
            buffered: Mutex::new(HashMap::new()),
            observers: Mutex::new(HashMap::new()),
            unsupported: Mutex::new(HashSet::new()),
            loaded_tx,
            document_complete: AtomicBool::new(false),
            interactions_tx,
            connection: Mutex::new(None),
        }
    }

    /// 엔트리 기록: 버퍼에 쌓고 해당 유형 옵저버에 묶음 단위로 알린다
    pub fn record_entries(&self, entries: Vec<PerformanceEntry>) {
        let mut batches: HashMap<EntryType, Vec<PerformanceEntry>> = HashMap::new();
        {
            let mut buffered = self.buffered.lock();
            for entry in entries {
                let kind = entry.entry_type();
                let buffer = buffered.entry(kind).or_default();
                if buffer.len() < ENTRY_BUFFER_LIMIT {
                    buffer.push(entry.clone());
                }
                batches.entry(kind).or_default().push(entry);
            }
        }

        let mut observers = self.observers.lock();
        for (kind, batch) in batches {
            if let Some(senders) = observers.get_mut(&kind) {
                // 닫힌 옵저버는 정리
                senders.retain(|tx| tx.send(batch.clone()).is_ok());
            }
        }
    }

    /// load 완료 이벤트 발생
    pub fn fire_load(&self) {
        debug!("호스트 load 이벤트");
        self.loaded_tx.send_replace(true);
    }

    /// 문서 준비 상태 설정
    pub fn set_document_complete(&self, complete: bool) {
        self.document_complete.store(complete, Ordering::Relaxed);
    }

    /// 사용자 상호작용 발생: 구독자가 없어도 무시
    pub fn interact(&self, kind: InteractionKind) {
        let _ = self.interactions_tx.send(kind);
    }

    /// 연결 품질 설정 (None이면 기능 없음)
    pub fn set_connection(&self, quality: Option<NetworkQuality>) {
        *self.connection.lock() = quality;
    }

    /// 특정 엔트리 유형을 관찰 불가로 표시
    pub fn mark_unsupported(&self, kind: EntryType) {
        self.unsupported.lock().insert(kind);
    }

    /// 현재 옵저버 수 (유형별)
    pub fn observer_count(&self, kind: EntryType) -> usize {
        self.observers
            .lock()
            .get(&kind)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// 호스트 기능 묶음 생성
    ///
    /// 연결 품질은 이 시점에 설정되어 있을 때만 기능으로 노출된다.
    pub fn capabilities(self: &Arc<Self>, client_context: impl Into<String>) -> HostCapabilities {
        let mut caps = HostCapabilities::new(
            self.clone(),
            self.clone(),
            self.clone(),
            client_context,
        );
        if self.connection.lock().is_some() {
            caps = caps.with_connection(self.clone());
        }
        caps
    }
}

impl Default for ChannelHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTimeline for ChannelHost {
    fn entries_by_type(&self, kind: EntryType) -> Vec<PerformanceEntry> {
        self.buffered.lock().get(&kind).cloned().unwrap_or_default()
    }

    fn observe(&self, kind: EntryType) -> Result<EntryBatchStream, CoreError> {
        if self.unsupported.lock().contains(&kind) {
            return Err(CoreError::Unsupported(format!(
                "PerformanceObserver({})",
                kind.as_str()
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().entry(kind).or_default().push(tx);
        Ok(rx)
    }
}

#[async_trait]
impl PageLifecycle for ChannelHost {
    async fn wait_for_load(&self) {
        let mut loaded_rx = self.loaded_tx.subscribe();
        // 송신 측은 self가 보유하므로 닫히지 않는다
        let _ = loaded_rx.wait_for(|loaded| *loaded).await;
    }

    fn is_document_complete(&self) -> bool {
        self.document_complete.load(Ordering::Relaxed)
    }
}

impl InteractionNotifier for ChannelHost {
    fn subscribe(&self) -> broadcast::Receiver<InteractionKind> {
        self.interactions_tx.subscribe()
    }
}

impl ConnectionProbe for ChannelHost {
    fn connection(&self) -> Result<NetworkQuality, CoreError> {
        self.connection
            .lock()
            .clone()
            .ok_or_else(|| CoreError::Unsupported("navigator.connection".to_string()))
    }
}
