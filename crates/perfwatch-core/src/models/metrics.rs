//! 메트릭 모델.
//!
//! 카테고리별 값 형태와 수집 서버로 전송되는 페이로드를 정의한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 메트릭 카테고리: 고정 집합
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    /// 페이지 로드 (1회성)
    PageLoad,
    /// 리소스 로드 (스트리밍, 누적)
    Resources,
    /// 유휴 시간 (주기 폴링)
    IdleTime,
    /// 힙 메모리 (주기 폴링)
    Memory,
    /// 네트워크 품질 (시작 시 스냅샷)
    Network,
}

/// 카테고리 값의 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// 이름 있는 필드 묶음: 덮어쓰기
    Record,
    /// 순서 있는 레코드 목록: 추가만 가능
    Sequence,
    /// 단일 수치: 덮어쓰기
    Scalar,
}

/// 카테고리별 전송 시점
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// 값이 생기는 즉시 전송 (1회성, 스트리밍)
    Immediate,
    /// 소스 자체 틱마다 전송 (틱이 곧 flush 시점)
    OnTick,
}

impl MetricCategory {
    pub const COUNT: usize = 5;

    /// 전체 카테고리 (정렬 순서)
    pub const ALL: [MetricCategory; Self::COUNT] = [
        MetricCategory::PageLoad,
        MetricCategory::Resources,
        MetricCategory::IdleTime,
        MetricCategory::Memory,
        MetricCategory::Network,
    ];

    /// 와이어 이름 (`type` 필드 값)
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::PageLoad => "pageLoad",
            MetricCategory::Resources => "resources",
            MetricCategory::IdleTime => "idleTime",
            MetricCategory::Memory => "memory",
            MetricCategory::Network => "network",
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            MetricCategory::PageLoad | MetricCategory::Memory | MetricCategory::Network => {
                ValueShape::Record
            }
            MetricCategory::Resources => ValueShape::Sequence,
            MetricCategory::IdleTime => ValueShape::Scalar,
        }
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        match self {
            MetricCategory::PageLoad | MetricCategory::Resources | MetricCategory::Network => {
                FlushPolicy::Immediate
            }
            MetricCategory::IdleTime | MetricCategory::Memory => FlushPolicy::OnTick,
        }
    }

    /// 저장소 슬롯 인덱스
    pub fn index(&self) -> usize {
        match self {
            MetricCategory::PageLoad => 0,
            MetricCategory::Resources => 1,
            MetricCategory::IdleTime => 2,
            MetricCategory::Memory => 3,
            MetricCategory::Network => 4,
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 페이지 로드 지표 (밀리초)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadMetrics {
    /// loadEventEnd - loadEventStart
    pub total_load_time: f64,
    /// domContentLoadedEventEnd - domContentLoadedEventStart
    pub dom_content_loaded: f64,
    /// first-paint 시작 시각 (없으면 0)
    pub first_paint: f64,
    /// first-contentful-paint 시작 시각 (없으면 0)
    pub first_contentful_paint: f64,
    /// 마지막 LCP 후보 시각 (타임아웃 시 null)
    pub largest_contentful_paint: Option<f64>,
    /// 문서 준비 완료 추정 시각 (타임아웃 시 null)
    pub time_to_interactive: Option<f64>,
}

/// 리소스 로드 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// 리소스 URL
    pub name: String,
    /// 로드 소요 시간 (밀리초)
    pub duration_ms: f64,
    /// 전송 크기 (바이트)
    pub size_bytes: u64,
    /// 요청 주체 (img, script, css, fetch ...)
    pub initiator_type: String,
}

/// 힙 메모리 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

/// 네트워크 연결 품질
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQuality {
    /// 유효 연결 유형 ("4g", "3g" ...)
    pub effective_type: String,
    /// 추정 대역폭 (Mbps)
    pub downlink: f64,
    /// 추정 왕복 시간 (밀리초)
    pub rtt: u32,
    /// 데이터 절약 모드
    pub save_data: bool,
}

/// 카테고리 값
///
/// 와이어에서는 태그 없이 내용만 직렬화된다 (`type` 필드가 카테고리를 나타냄).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    PageLoad(PageLoadMetrics),
    Resources(Vec<ResourceRecord>),
    IdleTime(f64),
    Memory(MemorySnapshot),
    Network(NetworkQuality),
}

impl MetricValue {
    /// 값이 속한 카테고리
    pub fn category(&self) -> MetricCategory {
        match self {
            MetricValue::PageLoad(_) => MetricCategory::PageLoad,
            MetricValue::Resources(_) => MetricCategory::Resources,
            MetricValue::IdleTime(_) => MetricCategory::IdleTime,
            MetricValue::Memory(_) => MetricCategory::Memory,
            MetricValue::Network(_) => MetricCategory::Network,
        }
    }
}

/// 수집 서버 전송 레코드: 전송마다 새로 생성
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryPayload {
    /// 카테고리
    #[serde(rename = "type")]
    pub category: MetricCategory,
    /// 카테고리 값
    pub data: MetricValue,
    /// 전송 시각 (epoch 밀리초)
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// 클라이언트 식별 문자열 (user agent)
    #[serde(rename = "userAgent")]
    pub client_context: String,
}

impl TelemetryPayload {
    /// 현재 시각으로 페이로드 생성
    pub fn new(data: MetricValue, client_context: &str) -> Self {
        Self {
            category: data.category(),
            data,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            client_context: client_context.to_string(),
        }
    }
}
