//! # perfwatch-network
//!
//! 수집 서버 전송 어댑터.
//! `MetricsTransport` 포트의 HTTP 구현과, 전송을 백그라운드로 내보내고
//! 실패를 로그로만 남기는 디스패처를 제공한다.

pub mod dispatcher;
pub mod http_client;
