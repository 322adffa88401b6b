//! PERFWATCH 도메인 모델.
//!
//! 수집 서버와 주고받는 메트릭 구조체, 호스트가 제공하는 원시 엔트리를 정의한다.

pub mod metrics;
pub mod timing;
