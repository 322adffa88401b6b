//! # perfwatch-monitor
//!
//! 시그널 소스 어댑터.
//! 페이지 로드, 리소스 로드, 유휴 시간, 힙 메모리, 네트워크 품질을 수집하고
//! 고빈도 콜백용 debounce/throttle 래퍼를 제공한다.
//! 호스트 기능은 `host::ChannelHost`(이벤트 주입형)와 `heap::SysInfoHeapProbe`로 구현.

pub mod heap;
pub mod host;
pub mod idle;
pub mod interactive;
pub mod memory;
pub mod network;
pub mod page_load;
pub mod rate_control;
pub mod resources;
