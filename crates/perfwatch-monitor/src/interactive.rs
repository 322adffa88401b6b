//! LCP / TTI 프로브.
//!
//! 페이지 로드 레코드에 포함되는 두 지표를 제한 시간 안에서 기다린다.
//! 제한 시간을 넘기면 None: 레코드에는 null로 기록된다.

use perfwatch_core::clock::SessionClock;
use perfwatch_core::models::timing::{EntryType, PerformanceEntry};
use perfwatch_core::ports::environment::{PageLifecycle, PerformanceTimeline};
use std::time::Duration;
use tracing::debug;

/// 마지막 LCP 후보의 시작 시각
fn last_lcp(entries: &[PerformanceEntry]) -> Option<f64> {
    entries.iter().rev().find_map(|entry| match entry {
        PerformanceEntry::LargestContentfulPaint(lcp) => Some(lcp.start_time),
        _ => None,
    })
}

/// Largest Contentful Paint
///
/// 버퍼링된 후보가 있으면 마지막 후보, 없으면 첫 옵저버 알림의 마지막 후보.
pub async fn largest_contentful_paint(
    timeline: &dyn PerformanceTimeline,
    timeout: Duration,
) -> Option<f64> {
    // 버퍼 조회와 구독 사이에 들어온 엔트리를 놓치지 않도록 먼저 구독
    let stream = timeline.observe(EntryType::LargestContentfulPaint);

    if let Some(start_time) = last_lcp(&timeline.entries_by_type(EntryType::LargestContentfulPaint))
    {
        return Some(start_time);
    }

    let mut stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            debug!("LCP 관찰 불가: {e}");
            return None;
        }
    };

    match tokio::time::timeout(timeout, stream.recv()).await {
        Ok(Some(batch)) => last_lcp(&batch),
        Ok(None) => {
            debug!("LCP 옵저버 종료");
            None
        }
        Err(_) => {
            debug!("LCP 대기 시간 초과 ({}ms)", timeout.as_millis());
            None
        }
    }
}

/// Time To Interactive 추정
///
/// 문서 준비 완료가 확인될 때까지 프레임마다 다시 확인하고, 그 시각(세션 기준 ms)을 반환.
pub async fn time_to_interactive(
    lifecycle: &dyn PageLifecycle,
    clock: SessionClock,
    poll: Duration,
    timeout: Duration,
) -> Option<f64> {
    let ready = async {
        loop {
            if lifecycle.is_document_complete() {
                return clock.now_ms();
            }
            tokio::time::sleep(poll).await;
        }
    };

    match tokio::time::timeout(timeout, ready).await {
        Ok(tti) => Some(tti),
        Err(_) => {
            debug!("TTI 대기 시간 초과 ({}ms)", timeout.as_millis());
            None
        }
    }
}
