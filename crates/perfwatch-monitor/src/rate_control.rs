//! 호출 빈도 제한 (debounce / throttle).
//!
//! 고빈도로 발생하는 콜백을 감싸 실제 실행 횟수를 제한한다.
//! 시간 측정은 `tokio::time::Instant` 기준이라 테스트에서 멈춘 시간으로 검증할 수 있다.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

// ============================================================
// debounce
// ============================================================

/// debounce된 콜백
///
/// 호출마다 대기 타이머가 리셋되고, `wait` 동안 추가 호출이 없을 때 마지막 인자로 한 번 실행된다.
/// `fire_immediately`면 조용한 구간의 첫 호출이 즉시 실행되고 그 버스트의 후행 실행은 생략된다.
pub struct Debounced<T> {
    inner: Arc<DebounceInner<T>>,
}

struct DebounceInner<T> {
    func: Callback<T>,
    wait: Duration,
    fire_immediately: bool,
    state: Mutex<DebounceState>,
}

/// 인스턴스당 살아있는 타이머는 최대 1개
struct DebounceState {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// 콜백을 debounce로 감싼다
pub fn debounce<T, F>(func: F, wait: Duration, fire_immediately: bool) -> Debounced<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debounced {
        inner: Arc::new(DebounceInner {
            func: Arc::new(func),
            wait,
            fire_immediately,
            state: Mutex::new(DebounceState {
                generation: 0,
                timer: None,
            }),
        }),
    }
}

impl<T: Send + 'static> Debounced<T> {
    /// 호출: 대기 타이머를 리셋한다
    pub fn call(&self, arg: T) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("tokio 런타임 없음: debounce 없이 즉시 실행");
            (self.inner.func)(arg);
            return;
        };

        let immediate_arg = {
            let mut state = self.inner.state.lock();
            let had_timer = match state.timer.take() {
                Some(timer) => {
                    timer.abort();
                    true
                }
                None => false,
            };

            state.generation = state.generation.wrapping_add(1);
            let generation = state.generation;

            let (immediate_arg, trailing_arg) = if self.inner.fire_immediately {
                ((!had_timer).then_some(arg), None)
            } else {
                (None, Some(arg))
            };

            // 마감 시각은 호출 시점 기준
            let deadline = Instant::now() + self.inner.wait;
            let inner = Arc::clone(&self.inner);
            state.timer = Some(runtime.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                {
                    let mut state = inner.state.lock();
                    if state.generation != generation {
                        return;
                    }
                    state.timer = None;
                }
                if let Some(arg) = trailing_arg {
                    (inner.func)(arg);
                }
            }));

            immediate_arg
        };

        if let Some(arg) = immediate_arg {
            (self.inner.func)(arg);
        }
    }

    /// 대기 중인 실행 취소
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.generation = state.generation.wrapping_add(1);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// 대기 중인 타이머 존재 여부
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }
}

impl<T> Clone for Debounced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ============================================================
// throttle
// ============================================================

/// throttle된 콜백
///
/// 윈도우의 첫 호출만 즉시 실행되고, 이후 `limit` 동안의 호출은 버려진다 (지연 실행 없음).
pub struct Throttled<T> {
    func: Callback<T>,
    limit: Duration,
    window_start: Arc<Mutex<Option<Instant>>>,
}

/// 콜백을 throttle로 감싼다
pub fn throttle<T, F>(func: F, limit: Duration) -> Throttled<T>
where
    F: Fn(T) + Send + Sync + 'static,
{
    Throttled {
        func: Arc::new(func),
        limit,
        window_start: Arc::new(Mutex::new(None)),
    }
}

impl<T> Throttled<T> {
    /// 호출: 실행되었으면 true, 버려졌으면 false
    pub fn call(&self, arg: T) -> bool {
        let now = Instant::now();
        {
            let mut window_start = self.window_start.lock();
            if let Some(start) = *window_start {
                if now.saturating_duration_since(start) < self.limit {
                    return false;
                }
            }
            *window_start = Some(now);
        }

        (self.func)(arg);
        true
    }
}

impl<T> Clone for Throttled<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            limit: self.limit,
            window_start: Arc::clone(&self.window_start),
        }
    }
}
