//! 에이전트 전체 흐름 테스트.
//!
//! 채널 호스트로 페이지 세션을 흉내 내고, 저장소 스냅샷과 전송된 페이로드를 검증한다.

use async_trait::async_trait;
use perfwatch_agent::{CategoryState, TelemetryAgent};
use perfwatch_core::config::AppConfig;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::{
    MemorySnapshot, MetricCategory, MetricValue, TelemetryPayload,
};
use perfwatch_core::models::timing::{NavigationTiming, PerformanceEntry, ResourceTiming};
use perfwatch_core::ports::environment::HeapProbe;
use perfwatch_core::ports::transport::MetricsTransport;
use perfwatch_monitor::host::ChannelHost;
use perfwatch_network::dispatcher::Dispatcher;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// 받은 페이로드를 JSON으로 기록하는 전송
struct RecordingTransport {
    sent: Mutex<Vec<serde_json::Value>>,
    reject: bool,
}

impl RecordingTransport {
    fn new(reject: bool) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            reject,
        })
    }

    fn of_type(&self, kind: &str) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|payload| payload["type"] == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MetricsTransport for RecordingTransport {
    async fn submit(&self, payload: &TelemetryPayload) -> Result<(), CoreError> {
        self.sent
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());
        if self.reject {
            return Err(CoreError::Http {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

struct FixedHeap;

impl HeapProbe for FixedHeap {
    fn heap_usage(&self) -> Result<MemorySnapshot, CoreError> {
        Ok(MemorySnapshot {
            used_bytes: 10_000_000,
            total_bytes: 20_000_000,
            limit_bytes: 2_000_000_000,
        })
    }
}

fn resource(name: &str) -> PerformanceEntry {
    PerformanceEntry::Resource(ResourceTiming {
        name: name.to_string(),
        duration: 35.0,
        transfer_size: Some(1200),
        initiator_type: Some("img".to_string()),
    })
}

/// 시간을 진행시키지 않고 준비된 태스크만 실행
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

fn start(host: &Arc<ChannelHost>, transport: Arc<RecordingTransport>) -> TelemetryAgent {
    let capabilities = host.capabilities("perfwatch-test/1.0");
    let dispatcher = Dispatcher::new(transport, capabilities.client_context.clone());
    TelemetryAgent::start(capabilities, dispatcher, &AppConfig::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn page_load_is_recorded_and_sent_once() {
    let host = Arc::new(ChannelHost::new());
    host.set_document_complete(true);
    host.record_entries(vec![PerformanceEntry::Navigation(NavigationTiming {
        load_event_start: 1000.0,
        load_event_end: 1120.0,
        dom_content_loaded_event_start: 500.0,
        dom_content_loaded_event_end: 580.0,
    })]);
    let transport = RecordingTransport::new(false);
    let agent = start(&host, transport.clone());

    host.fire_load();
    // LCP 후보가 없으므로 대기 한도(5000ms) 후 기록
    sleep(Duration::from_millis(5500)).await;
    assert!(agent.dispatcher().wait_idle(Duration::from_secs(1)).await);

    let metrics = agent.metrics();
    let Some(MetricValue::PageLoad(page_load)) = metrics.get(&MetricCategory::PageLoad) else {
        panic!("pageLoad missing: {metrics:?}");
    };
    assert_eq!(page_load.total_load_time, 120.0);
    assert_eq!(page_load.dom_content_loaded, 80.0);
    assert_eq!(page_load.first_paint, 0.0);
    assert_eq!(page_load.first_contentful_paint, 0.0);
    assert_eq!(page_load.largest_contentful_paint, None);

    let sent = transport.of_type("pageLoad");
    assert_eq!(sent.len(), 1);
    let payload = &sent[0];
    assert_eq!(payload["data"]["totalLoadTime"], 120.0);
    assert_eq!(payload["data"]["domContentLoaded"], 80.0);
    assert_eq!(payload["data"]["firstPaint"], 0.0);
    assert!(payload["data"]["largestContentfulPaint"].is_null());
    assert_eq!(payload["userAgent"], "perfwatch-test/1.0");
    assert!(payload["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(
        agent.category_state(MetricCategory::PageLoad),
        CategoryState::Active
    );
}

#[tokio::test(start_paused = true)]
async fn absent_capabilities_leave_no_keys() {
    let host = Arc::new(ChannelHost::new());
    let agent = start(&host, RecordingTransport::new(false));

    sleep(Duration::from_secs(25)).await;

    let metrics = agent.metrics();
    assert!(metrics.contains_key(&MetricCategory::IdleTime));
    assert!(!metrics.contains_key(&MetricCategory::Memory));
    assert!(!metrics.contains_key(&MetricCategory::Network));
    assert!(!agent.active_sources().contains(&"memory"));
    assert_eq!(
        agent.category_state(MetricCategory::IdleTime),
        CategoryState::Active
    );
    assert_eq!(
        agent.category_state(MetricCategory::Memory),
        CategoryState::Idle
    );
}

#[tokio::test(start_paused = true)]
async fn resources_accumulate_in_arrival_order() {
    let host = Arc::new(ChannelHost::new());
    let transport = RecordingTransport::new(false);
    let agent = start(&host, transport.clone());

    for i in 0..5 {
        host.record_entries(vec![resource(&format!("img-{i}.png"))]);
        sleep(Duration::from_millis(10)).await;
    }
    sleep(Duration::from_millis(500)).await;
    host.record_entries(vec![resource("late.png")]);
    sleep(Duration::from_millis(500)).await;
    assert!(agent.dispatcher().wait_idle(Duration::from_secs(1)).await);

    let Some(MetricValue::Resources(records)) = agent.metrics().remove(&MetricCategory::Resources)
    else {
        panic!("resources missing");
    };
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        ["img-0.png", "img-1.png", "img-2.png", "img-3.png", "img-4.png", "late.png"]
    );

    // 알림 1회 = 전송 1회, 그 알림의 레코드만 포함
    let sent = transport.of_type("resources");
    assert_eq!(sent.len(), 6);
    assert!(sent
        .iter()
        .all(|payload| payload["data"].as_array().unwrap().len() == 1));
    assert_eq!(sent[0]["data"][0]["name"], "img-0.png");
    assert_eq!(sent[5]["data"][0]["name"], "late.png");
    assert_eq!(sent[5]["data"][0]["initiatorType"], "img");
}

#[tokio::test(start_paused = true)]
async fn resource_batch_is_sent_without_waiting_for_a_timer() {
    let host = Arc::new(ChannelHost::new());
    let transport = RecordingTransport::new(false);
    let _agent = start(&host, transport.clone());
    let started = Instant::now();

    host.record_entries(vec![resource("a.js"), resource("b.css")]);
    settle().await;

    assert_eq!(Instant::now(), started);
    let sent = transport.of_type("resources");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["data"][0]["name"], "a.js");
    assert_eq!(sent[0]["data"][1]["name"], "b.css");

    host.record_entries(vec![resource("c.png")]);
    settle().await;
    assert_eq!(transport.of_type("resources").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn memory_is_sent_every_tick() {
    let host = Arc::new(ChannelHost::new());
    let transport = RecordingTransport::new(false);
    let capabilities = host
        .capabilities("perfwatch-test/1.0")
        .with_heap(Arc::new(FixedHeap));
    let dispatcher = Dispatcher::new(transport.clone(), "perfwatch-test/1.0");
    let agent = TelemetryAgent::start(capabilities, dispatcher, &AppConfig::default()).unwrap();

    sleep(Duration::from_millis(30_500)).await;
    assert!(agent.dispatcher().wait_idle(Duration::from_secs(1)).await);

    let sent = transport.of_type("memory");
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["data"]["usedBytes"], 10_000_000);
    assert!(matches!(
        agent.metrics().get(&MetricCategory::Memory),
        Some(MetricValue::Memory(snapshot)) if snapshot.limit_bytes == 2_000_000_000
    ));
}

#[tokio::test(start_paused = true)]
async fn rejected_sends_do_not_disturb_collection() {
    let host = Arc::new(ChannelHost::new());
    host.set_document_complete(true);
    let transport = RecordingTransport::new(true);
    let agent = start(&host, transport.clone());

    host.fire_load();
    host.record_entries(vec![resource("a.js")]);
    sleep(Duration::from_millis(12_500)).await;
    assert!(agent.dispatcher().wait_idle(Duration::from_secs(1)).await);

    let metrics = agent.metrics();
    assert!(metrics.contains_key(&MetricCategory::PageLoad));
    assert!(metrics.contains_key(&MetricCategory::Resources));
    assert!(matches!(
        metrics.get(&MetricCategory::IdleTime),
        Some(MetricValue::IdleTime(gap)) if *gap == 12_000.0
    ));

    let stats = agent.dispatcher().stats();
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.failed as usize, transport.sent.lock().unwrap().len());
    // idleTime 7회(6000..12000ms) 모두 시도됨
    assert_eq!(transport.of_type("idleTime").len(), 7);
}

#[tokio::test(start_paused = true)]
async fn stop_keeps_already_sent_batches() {
    let host = Arc::new(ChannelHost::new());
    let transport = RecordingTransport::new(false);
    let agent = start(&host, transport.clone());

    host.record_entries(vec![resource("a.js")]);
    settle().await;
    agent.stop();
    host.record_entries(vec![resource("b.js")]);
    sleep(Duration::from_secs(1)).await;

    let sent = transport.of_type("resources");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["data"][0]["name"], "a.js");
    assert!(matches!(
        agent.metrics().get(&MetricCategory::Resources),
        Some(MetricValue::Resources(records)) if records.len() == 1
    ));
}
