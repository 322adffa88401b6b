//! 프로세스 힙 사용량 프로브.
//!
//! `HeapProbe` 포트 구현. sysinfo 기반으로 현재 프로세스 메모리를 수집한다.

use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::MemorySnapshot;
use perfwatch_core::ports::environment::HeapProbe;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;

/// sysinfo 기반 힙 프로브: `HeapProbe` 포트 구현
///
/// used = 프로세스 상주 메모리, total = 프로세스 가상 메모리, limit = 시스템 전체 메모리
pub struct SysInfoHeapProbe {
    sys: Mutex<System>,
    pid: Pid,
}

impl SysInfoHeapProbe {
    /// 현재 프로세스용 프로브 생성
    ///
    /// 프로세스 ID를 알 수 없는 플랫폼이면 None: 메모리 카테고리는 수집하지 않는다.
    pub fn current_process() -> Option<Self> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(Self {
                sys: Mutex::new(System::new()),
                pid,
            }),
            Err(e) => {
                debug!("현재 프로세스 ID 조회 실패: 힙 프로브 없음: {e}");
                None
            }
        }
    }
}

impl HeapProbe for SysInfoHeapProbe {
    fn heap_usage(&self) -> Result<MemorySnapshot, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Internal(format!("시스템 잠금 실패: {e}")))?;

        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = sys
            .process(self.pid)
            .ok_or_else(|| CoreError::Internal(format!("프로세스 정보 없음: {}", self.pid)))?;

        let snapshot = MemorySnapshot {
            used_bytes: process.memory(),
            total_bytes: process.virtual_memory(),
            limit_bytes: sys.total_memory(),
        };

        debug!(
            "힙 사용량: {}/{}MB (한도 {}MB)",
            snapshot.used_bytes / 1_048_576,
            snapshot.total_bytes / 1_048_576,
            snapshot.limit_bytes / 1_048_576
        );

        Ok(snapshot)
    }
}
