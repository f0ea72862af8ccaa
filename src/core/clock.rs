use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// 轮播时钟 - 所有定时器的时间基准（毫秒）
///
/// - `system()`：基于 Instant 的真实时间
/// - `manual()`：只有调用 `advance` 才推进，用于测试和回放
#[derive(Clone)]
pub struct KioskClock {
    inner: Arc<Mutex<ClockInner>>,
}

struct ClockInner {
    base_instant: Instant,
    manual: bool,
    manual_now: u64,
}

impl KioskClock {
    pub fn system() -> Self {
        Self::with_mode(false)
    }

    pub fn manual() -> Self {
        Self::with_mode(true)
    }

    fn with_mode(manual: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                base_instant: Instant::now(),
                manual,
                manual_now: 0,
            })),
        }
    }

    /// 当前时间（毫秒，从时钟创建开始计）
    pub fn now_ms(&self) -> u64 {
        let inner = self.inner.lock();
        if inner.manual {
            inner.manual_now
        } else {
            inner.base_instant.elapsed().as_millis() as u64
        }
    }

    /// 手动推进时间（真实时钟上无效）
    pub fn advance(&self, ms: u64) {
        let mut inner = self.inner.lock();
        if inner.manual {
            inner.manual_now += ms;
        }
    }
}

impl Default for KioskClock {
    fn default() -> Self {
        Self::system()
    }
}
