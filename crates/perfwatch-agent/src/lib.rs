//! # perfwatch-agent
//!
//! 텔레메트리 에이전트.
//! 시그널 소스를 호스트 기능에 맞춰 조립하고, 카테고리별 최신 값을 보관하며
//! 카테고리별 전송 정책(즉시 / 묶음 / 틱)에 따라 수집 서버로 내보낸다.

pub mod agent;
pub mod store;

pub use agent::{CategoryState, TelemetryAgent};
pub use store::MetricsStore;
