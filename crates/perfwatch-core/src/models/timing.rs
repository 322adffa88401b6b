//! 호스트 환경이 제공하는 원시 타이밍/이벤트 모델.
//!
//! 필드 구성은 브라우저 Performance Timeline 엔트리를 따른다.
//! 선택 필드가 빠진 엔트리도 역직렬화되며, 정규화 단계에서 기본값(0)으로 대체된다.

use serde::{Deserialize, Serialize};

/// 타임라인 엔트리 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    Navigation,
    Paint,
    Resource,
    LargestContentfulPaint,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Navigation => "navigation",
            EntryType::Paint => "paint",
            EntryType::Resource => "resource",
            EntryType::LargestContentfulPaint => "largest-contentful-paint",
        }
    }
}

/// 네비게이션 타이밍 (세션 원점 기준 밀리초)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    pub load_event_start: f64,
    pub load_event_end: f64,
    pub dom_content_loaded_event_start: f64,
    pub dom_content_loaded_event_end: f64,
}

impl NavigationTiming {
    /// load 이벤트 처리 시간
    pub fn load_duration(&self) -> f64 {
        (self.load_event_end - self.load_event_start).max(0.0)
    }

    /// DOMContentLoaded 이벤트 처리 시간
    pub fn dom_content_loaded_duration(&self) -> f64 {
        (self.dom_content_loaded_event_end - self.dom_content_loaded_event_start).max(0.0)
    }
}

/// 페인트 타이밍 ("first-paint", "first-contentful-paint")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintTiming {
    pub name: String,
    pub start_time: f64,
}

/// 리소스 타이밍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
    pub name: String,
    #[serde(default)]
    pub duration: f64,
    /// 캐시 히트/교차 출처 등으로 보고되지 않을 수 있음
    #[serde(default)]
    pub transfer_size: Option<u64>,
    #[serde(default)]
    pub initiator_type: Option<String>,
}

/// LCP 후보 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcpTiming {
    pub start_time: f64,
    #[serde(default)]
    pub size: u64,
}

/// 타임라인 엔트리
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    Navigation(NavigationTiming),
    Paint(PaintTiming),
    Resource(ResourceTiming),
    LargestContentfulPaint(LcpTiming),
}

impl PerformanceEntry {
    pub fn entry_type(&self) -> EntryType {
        match self {
            PerformanceEntry::Navigation(_) => EntryType::Navigation,
            PerformanceEntry::Paint(_) => EntryType::Paint,
            PerformanceEntry::Resource(_) => EntryType::Resource,
            PerformanceEntry::LargestContentfulPaint(_) => EntryType::LargestContentfulPaint,
        }
    }
}

/// 유휴 시간 계산에 쓰이는 사용자 상호작용 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Click,
    KeyPress,
    Scroll,
    PointerMove,
}

impl InteractionKind {
    /// 고빈도로 발생하는 유형 (쓰로틀 대상)
    pub fn is_bursty(&self) -> bool {
        matches!(self, InteractionKind::PointerMove | InteractionKind::Scroll)
    }
}
