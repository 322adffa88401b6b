//! 페이지 세션 재생.
//!
//! 기록된 세션 파일(JSON)의 이벤트를 시각에 맞춰 `ChannelHost`에 주입한다.
//!
//! ```json
//! {
//!   "userAgent": "Mozilla/5.0 ...",
//!   "connection": { "effectiveType": "4g", "downlink": 10.0, "rtt": 50, "saveData": false },
//!   "unsupported": ["largest-contentful-paint"],
//!   "steps": [
//!     { "atMs": 120, "action": "entries", "entries": [ { "entryType": "paint", "name": "first-paint", "startTime": 120 } ] },
//!     { "atMs": 900, "action": "documentComplete" },
//!     { "atMs": 950, "action": "load" },
//!     { "atMs": 3000, "action": "interaction", "kind": "click" }
//!   ]
//! }
//! ```

use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::NetworkQuality;
use perfwatch_core::models::timing::{
    EntryType, InteractionKind, LcpTiming, NavigationTiming, PaintTiming, PerformanceEntry,
    ResourceTiming,
};
use perfwatch_monitor::host::ChannelHost;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// 재생 단계의 동작
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ReplayAction {
    /// 성능 엔트리 기록 (옵저버에는 한 번의 알림)
    Entries { entries: Vec<PerformanceEntry> },
    /// 사용자 상호작용
    Interaction { kind: InteractionKind },
    /// 문서 준비 완료
    DocumentComplete,
    /// load 완료 이벤트
    Load,
}

/// 세션 원점 기준 시각의 재생 단계
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ReplayAction,
}

/// 기록된 페이지 세션
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplaySession {
    pub user_agent: Option<String>,
    pub connection: Option<NetworkQuality>,
    /// 관찰 불가로 취급할 엔트리 유형
    pub unsupported: Vec<EntryType>,
    pub steps: Vec<ReplayStep>,
}

impl ReplaySession {
    /// 세션 파일 로드
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let mut session: Self = serde_json::from_str(&content)?;
        session.steps.sort_by_key(|step| step.at_ms);
        info!(
            "세션 파일 로드: {} ({}단계)",
            path.display(),
            session.steps.len()
        );
        Ok(session)
    }

    /// 내장 데모 세션: 세션 파일 없이 실행할 때 사용
    pub fn builtin() -> Self {
        let resource = |name: &str, duration: f64, size: u64, initiator: &str| {
            PerformanceEntry::Resource(ResourceTiming {
                name: name.to_string(),
                duration,
                transfer_size: Some(size),
                initiator_type: Some(initiator.to_string()),
            })
        };
        let step = |at_ms: u64, action: ReplayAction| ReplayStep { at_ms, action };

        Self {
            user_agent: None,
            connection: Some(NetworkQuality {
                effective_type: "4g".to_string(),
                downlink: 10.0,
                rtt: 50,
                save_data: false,
            }),
            unsupported: Vec::new(),
            steps: vec![
                step(
                    80,
                    ReplayAction::Entries {
                        entries: vec![
                            resource("/static/app.js", 64.0, 182_340, "script"),
                            resource("/static/app.css", 21.5, 24_118, "link"),
                        ],
                    },
                ),
                step(
                    180,
                    ReplayAction::Entries {
                        entries: vec![
                            PerformanceEntry::Paint(PaintTiming {
                                name: "first-paint".to_string(),
                                start_time: 176.4,
                            }),
                            PerformanceEntry::Paint(PaintTiming {
                                name: "first-contentful-paint".to_string(),
                                start_time: 178.9,
                            }),
                        ],
                    },
                ),
                step(
                    420,
                    ReplayAction::Entries {
                        entries: vec![
                            resource("/img/hero.webp", 140.2, 301_522, "img"),
                            PerformanceEntry::LargestContentfulPaint(LcpTiming {
                                start_time: 417.3,
                                size: 480_000,
                            }),
                        ],
                    },
                ),
                step(610, ReplayAction::DocumentComplete),
                step(
                    640,
                    ReplayAction::Entries {
                        entries: vec![PerformanceEntry::Navigation(NavigationTiming {
                            load_event_start: 631.0,
                            load_event_end: 644.5,
                            dom_content_loaded_event_start: 402.0,
                            dom_content_loaded_event_end: 409.7,
                        })],
                    },
                ),
                step(650, ReplayAction::Load),
                step(
                    1_500,
                    ReplayAction::Interaction {
                        kind: InteractionKind::Click,
                    },
                ),
                step(
                    2_200,
                    ReplayAction::Entries {
                        entries: vec![resource("/api/feed", 88.0, 5_210, "fetch")],
                    },
                ),
            ],
        }
    }

    /// 재생 전 호스트 기능 설정 (연결 품질, 미지원 엔트리 유형)
    pub fn prepare(&self, host: &ChannelHost) {
        host.set_connection(self.connection.clone());
        for kind in &self.unsupported {
            host.mark_unsupported(*kind);
        }
    }

    /// 마지막 단계 시각
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.steps.iter().map(|step| step.at_ms).max().unwrap_or(0))
    }

    /// 단계를 시각에 맞춰 재생
    ///
    /// 모든 단계를 재생했으면 true, 종료 신호로 중단되었으면 false.
    pub async fn play(&self, host: &ChannelHost, mut shutdown: watch::Receiver<bool>) -> bool {
        let origin = Instant::now();

        for step in &self.steps {
            let deadline = origin + Duration::from_millis(step.at_ms);
            tokio::select! {
                Ok(_) = shutdown.wait_for(|stop| *stop) => {
                    debug!("재생 중단 ({}ms 단계 이전)", step.at_ms);
                    return false;
                }
                _ = tokio::time::sleep_until(deadline) => {}
            }
            apply(host, &step.action);
        }

        info!("세션 재생 완료 ({}단계)", self.steps.len());
        true
    }
}

fn apply(host: &ChannelHost, action: &ReplayAction) {
    match action {
        ReplayAction::Entries { entries } => host.record_entries(entries.clone()),
        ReplayAction::Interaction { kind } => host.interact(*kind),
        ReplayAction::DocumentComplete => host.set_document_complete(true),
        ReplayAction::Load => host.fire_load(),
    }
}
