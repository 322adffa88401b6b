//! 애플리케이션 설정 구조체.
//!
//! 수집 서버 주소, 시그널 소스 주기/임계값, 카테고리별 수집 여부를 정의한다.
//! 모든 필드에 serde 기본값이 있어 일부만 적힌 설정 파일도 로드된다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::metrics::MetricCategory;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 수집 서버 연결 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 시그널 소스 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 카테고리별 수집 여부
    #[serde(default)]
    pub categories: CategoryConfig,
}

// ============================================================
// 수집 서버 설정
// ============================================================

/// 수집 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 수집 서버 기본 URL (예: "https://metrics.example.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 메트릭 수신 경로
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 페이로드 `userAgent` 값 (None이면 호스트가 제공한 값 사용)
    #[serde(default)]
    pub client_context: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint_path: default_endpoint_path(),
            request_timeout_ms: default_request_timeout_ms(),
            client_context: None,
        }
    }
}

// ============================================================
// 시그널 소스 설정
// ============================================================

/// 시그널 소스 주기/임계값
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 유휴 시간 확인 주기 (밀리초)
    #[serde(default = "default_idle_tick_ms")]
    pub idle_tick_ms: u64,
    /// 유휴로 판단하는 최소 간격 (밀리초, 초과해야 기록)
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,
    /// 힙 메모리 수집 주기 (밀리초)
    #[serde(default = "default_memory_tick_ms")]
    pub memory_tick_ms: u64,
    /// 고빈도 상호작용(pointermove/scroll) 쓰로틀 간격 (밀리초)
    #[serde(default = "default_interaction_throttle_ms")]
    pub interaction_throttle_ms: u64,
    /// LCP 대기 한도 (밀리초)
    #[serde(default = "default_lcp_timeout_ms")]
    pub lcp_timeout_ms: u64,
    /// 문서 준비 상태 재확인 주기: 프레임 간격 (밀리초)
    #[serde(default = "default_tti_poll_ms")]
    pub tti_poll_ms: u64,
    /// TTI 대기 한도 (밀리초)
    #[serde(default = "default_tti_timeout_ms")]
    pub tti_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            idle_tick_ms: default_idle_tick_ms(),
            idle_threshold_ms: default_idle_threshold_ms(),
            memory_tick_ms: default_memory_tick_ms(),
            interaction_throttle_ms: default_interaction_throttle_ms(),
            lcp_timeout_ms: default_lcp_timeout_ms(),
            tti_poll_ms: default_tti_poll_ms(),
            tti_timeout_ms: default_tti_timeout_ms(),
        }
    }
}

// ============================================================
// 카테고리 설정
// ============================================================

/// 카테고리별 수집 여부: 기본 전부 활성
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    #[serde(default = "default_true")]
    pub page_load: bool,
    #[serde(default = "default_true")]
    pub resources: bool,
    #[serde(default = "default_true")]
    pub idle_time: bool,
    #[serde(default = "default_true")]
    pub memory: bool,
    #[serde(default = "default_true")]
    pub network: bool,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            page_load: true,
            resources: true,
            idle_time: true,
            memory: true,
            network: true,
        }
    }
}

impl CategoryConfig {
    pub fn is_enabled(&self, category: MetricCategory) -> bool {
        match category {
            MetricCategory::PageLoad => self.page_load,
            MetricCategory::Resources => self.resources,
            MetricCategory::IdleTime => self.idle_time,
            MetricCategory::Memory => self.memory,
            MetricCategory::Network => self.network,
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정값 검증
    ///
    /// 0 주기는 tokio interval이 허용하지 않으므로 미리 거부한다.
    pub fn validate(&self) -> Result<(), CoreError> {
        let periods = [
            ("monitor.idle_tick_ms", self.monitor.idle_tick_ms),
            ("monitor.memory_tick_ms", self.monitor.memory_tick_ms),
            ("monitor.tti_poll_ms", self.monitor.tti_poll_ms),
            ("collector.request_timeout_ms", self.collector.request_timeout_ms),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(CoreError::Validation {
                    field: field.to_string(),
                    message: "0보다 커야 합니다".to_string(),
                });
            }
        }

        if !self.collector.endpoint_path.starts_with('/') {
            return Err(CoreError::Validation {
                field: "collector.endpoint_path".to_string(),
                message: format!("'/'로 시작해야 합니다: {}", self.collector.endpoint_path),
            });
        }

        Ok(())
    }

    /// 수집 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.collector.request_timeout_ms)
    }
}

impl MonitorConfig {
    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    pub fn memory_tick(&self) -> Duration {
        Duration::from_millis(self.memory_tick_ms)
    }

    pub fn interaction_throttle(&self) -> Duration {
        Duration::from_millis(self.interaction_throttle_ms)
    }

    pub fn lcp_timeout(&self) -> Duration {
        Duration::from_millis(self.lcp_timeout_ms)
    }

    pub fn tti_poll(&self) -> Duration {
        Duration::from_millis(self.tti_poll_ms)
    }

    pub fn tti_timeout(&self) -> Duration {
        Duration::from_millis(self.tti_timeout_ms)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_endpoint_path() -> String {
    "/api/metrics".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_idle_tick_ms() -> u64 {
    1_000
}
fn default_idle_threshold_ms() -> u64 {
    5_000
}
fn default_memory_tick_ms() -> u64 {
    10_000
}
fn default_interaction_throttle_ms() -> u64 {
    100
}
fn default_lcp_timeout_ms() -> u64 {
    5_000
}
fn default_tti_poll_ms() -> u64 {
    16 // 약 60fps 프레임 간격
}
fn default_tti_timeout_ms() -> u64 {
    10_000
}
