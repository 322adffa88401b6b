//! 페이지 로드 소스 (1회성).
//!
//! load 완료 이벤트를 한 번 기다린 뒤 네비게이션/페인트 타이밍을 읽어
//! `pageLoad` 레코드를 한 번 내보내고 종료한다.

use perfwatch_core::clock::SessionClock;
use perfwatch_core::config::MonitorConfig;
use perfwatch_core::models::metrics::{MetricCategory, MetricValue, PageLoadMetrics};
use perfwatch_core::models::timing::{EntryType, NavigationTiming, PerformanceEntry};
use perfwatch_core::ports::environment::{PageLifecycle, PerformanceTimeline};
use perfwatch_core::ports::signal::{stopped, Emitter, SignalSource, SourceHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::interactive::{largest_contentful_paint, time_to_interactive};

const FIRST_PAINT: &str = "first-paint";
const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// 페이지 로드 소스
pub struct PageLoadSource {
    timeline: Arc<dyn PerformanceTimeline>,
    lifecycle: Arc<dyn PageLifecycle>,
    clock: SessionClock,
    lcp_timeout: Duration,
    tti_poll: Duration,
    tti_timeout: Duration,
}

impl PageLoadSource {
    pub fn new(
        timeline: Arc<dyn PerformanceTimeline>,
        lifecycle: Arc<dyn PageLifecycle>,
        clock: SessionClock,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            timeline,
            lifecycle,
            clock,
            lcp_timeout: config.lcp_timeout(),
            tti_poll: config.tti_poll(),
            tti_timeout: config.tti_timeout(),
        }
    }

    /// load 이후 타이밍 수집
    async fn collect(&self) -> PageLoadMetrics {
        let navigation = self
            .timeline
            .entries_by_type(EntryType::Navigation)
            .into_iter()
            .find_map(|entry| match entry {
                PerformanceEntry::Navigation(nav) => Some(nav),
                _ => None,
            })
            .unwrap_or_else(|| {
                warn!("네비게이션 엔트리 없음: 로드 시간 0으로 기록");
                NavigationTiming::default()
            });

        let paints = self.timeline.entries_by_type(EntryType::Paint);
        let paint_time = |name: &str| {
            paints
                .iter()
                .find_map(|entry| match entry {
                    PerformanceEntry::Paint(paint) if paint.name == name => Some(paint.start_time),
                    _ => None,
                })
                .unwrap_or(0.0)
        };

        let (largest_contentful_paint, time_to_interactive) = tokio::join!(
            largest_contentful_paint(self.timeline.as_ref(), self.lcp_timeout),
            time_to_interactive(
                self.lifecycle.as_ref(),
                self.clock,
                self.tti_poll,
                self.tti_timeout
            ),
        );

        PageLoadMetrics {
            total_load_time: navigation.load_duration(),
            dom_content_loaded: navigation.dom_content_loaded_duration(),
            first_paint: paint_time(FIRST_PAINT),
            first_contentful_paint: paint_time(FIRST_CONTENTFUL_PAINT),
            largest_contentful_paint,
            time_to_interactive,
        }
    }
}

impl SignalSource for PageLoadSource {
    fn name(&self) -> &'static str {
        "page_load"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::PageLoad
    }

    fn start(self: Arc<Self>, emit: Emitter) -> SourceHandle {
        SourceHandle::spawn(self.name(), self.category(), move |mut stop_rx| async move {
            tokio::select! {
                _ = stopped(&mut stop_rx) => return,
                _ = self.lifecycle.wait_for_load() => {}
            }

            let metrics = self.collect().await;
            info!(
                "페이지 로드 지표: load={:.1}ms, DCL={:.1}ms, FP={:.1}ms, FCP={:.1}ms",
                metrics.total_load_time,
                metrics.dom_content_loaded,
                metrics.first_paint,
                metrics.first_contentful_paint
            );

            if let Err(e) = emit(MetricValue::PageLoad(metrics)) {
                warn!("페이지 로드 지표 기록 실패: {e}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelHost;
    use parking_lot::Mutex;
    use perfwatch_core::models::timing::{LcpTiming, PaintTiming};

    fn capture() -> (Arc<Mutex<Vec<MetricValue>>>, Emitter) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let emit: Emitter = Arc::new(move |value| {
            sink.lock().push(value);
            Ok(())
        });
        (values, emit)
    }

    fn source(host: &Arc<ChannelHost>) -> Arc<PageLoadSource> {
        Arc::new(PageLoadSource::new(
            host.clone(),
            host.clone(),
            SessionClock::start(),
            &MonitorConfig::default(),
        ))
    }

    fn navigation() -> PerformanceEntry {
        PerformanceEntry::Navigation(NavigationTiming {
            load_event_start: 900.0,
            load_event_end: 1020.0,
            dom_content_loaded_event_start: 600.0,
            dom_content_loaded_event_end: 680.0,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn emits_once_after_load() {
        let host = Arc::new(ChannelHost::new());
        host.set_document_complete(true);
        host.record_entries(vec![
            navigation(),
            PerformanceEntry::Paint(PaintTiming {
                name: "first-paint".to_string(),
                start_time: 210.0,
            }),
            PerformanceEntry::Paint(PaintTiming {
                name: "first-contentful-paint".to_string(),
                start_time: 260.0,
            }),
            PerformanceEntry::LargestContentfulPaint(LcpTiming {
                start_time: 540.0,
                size: 4096,
            }),
        ]);
        let (values, emit) = capture();
        let handle = source(&host).start(emit);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(values.lock().is_empty());

        host.fire_load();
        tokio::time::sleep(Duration::from_millis(100)).await;
        host.fire_load();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let values = values.lock();
        assert_eq!(values.len(), 1);
        match &values[0] {
            MetricValue::PageLoad(m) => {
                assert_eq!(m.total_load_time, 120.0);
                assert_eq!(m.dom_content_loaded, 80.0);
                assert_eq!(m.first_paint, 210.0);
                assert_eq!(m.first_contentful_paint, 260.0);
                assert_eq!(m.largest_contentful_paint, Some(540.0));
                assert_eq!(m.time_to_interactive, Some(100.0));
            }
            other => panic!("unexpected value: {other:?}"),
        }
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_paint_entries_default_to_zero() {
        let host = Arc::new(ChannelHost::new());
        host.set_document_complete(true);
        host.record_entries(vec![navigation()]);
        let (values, emit) = capture();
        let _handle = source(&host).start(emit);

        host.fire_load();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let values = values.lock();
        let MetricValue::PageLoad(m) = &values[0] else {
            panic!("unexpected value");
        };
        assert_eq!(m.first_paint, 0.0);
        assert_eq!(m.first_contentful_paint, 0.0);
        assert_eq!(m.largest_contentful_paint, None);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_navigation_entry_records_zero() {
        let host = Arc::new(ChannelHost::new());
        host.set_document_complete(true);
        let (values, emit) = capture();
        let _handle = source(&host).start(emit);

        host.fire_load();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let values = values.lock();
        let MetricValue::PageLoad(m) = &values[0] else {
            panic!("unexpected value");
        };
        assert_eq!(m.total_load_time, 0.0);
        assert_eq!(m.dom_content_loaded, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_load_emits_nothing() {
        let host = Arc::new(ChannelHost::new());
        let (values, emit) = capture();
        let handle = source(&host).start(emit);

        handle.stop();
        host.fire_load();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(values.lock().is_empty());
    }
}
