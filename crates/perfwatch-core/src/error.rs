//! PERFWATCH 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 `CoreError`를 그대로 반환한다.
//! 에이전트 안에서는 어떤 에러도 치명적이지 않다: 로그 후 해당 카테고리만 포기한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 수집 서버가 2xx 이외의 상태 코드로 응답
    #[error("수집 서버 에러 ({status}): {body}")]
    Http {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 (진단용)
        body: String,
    },

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 호스트 환경이 해당 기능을 지원하지 않음
    #[error("미지원 기능: {0}")]
    Unsupported(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 호스트 기능 부재 에러인지 확인
    pub fn is_capability_absent(&self) -> bool {
        matches!(self, CoreError::Unsupported(_))
    }
}
