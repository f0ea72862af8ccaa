use std::collections::BTreeMap;

use crate::core::{Generation, Indicator};

/// 定时器用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// 切换后延迟执行的预加载 + 清理
    PreloadPass,
    /// 播放失败后的宽限期，到期跳到下一个
    FailureSkip,
    /// 自动播放被拒绝后的重试
    AutoplayRetry { attempt: u32 },
    /// 嵌入播放器的模拟结束
    SimulatedEnd,
    /// 嵌入播放器的可用性检测
    AvailabilityProbe,
    /// 结束画面停留
    EndScreenDwell,
    HideIndicator { indicator: Indicator, seq: u64 },
    HideControls { seq: u64 },
    HideCursor { seq: u64 },
}

/// 一次性定时器
///
/// `generation` 为 None 的定时器只影响 UI，不受加载代数约束
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub deadline_ms: u64,
    pub generation: Option<Generation>,
    pub kind: TimerKind,
}

/// 定时器队列 - 按到期时间排序，同一时间按创建顺序
///
/// 定时器不会被取消；过期代数的定时器由调用方在触发时丢弃
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: BTreeMap<(u64, u64), Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        now_ms: u64,
        delay_ms: u64,
        generation: Option<Generation>,
        kind: TimerKind,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let deadline_ms = now_ms.saturating_add(delay_ms);
        self.timers.insert(
            (deadline_ms, id),
            Timer {
                id,
                deadline_ms,
                generation,
                kind,
            },
        );
        id
    }

    /// 取出最早一个已到期的定时器
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let (&(deadline, _), _) = self.timers.first_key_value()?;
        if deadline > now_ms {
            return None;
        }
        self.timers.pop_first().map(|(_, timer)| timer)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Timer> {
        self.timers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_deadline_then_creation_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(0, 4000, Some(Generation(1)), TimerKind::EndScreenDwell);
        queue.schedule(0, 1000, Some(Generation(1)), TimerKind::PreloadPass);
        queue.schedule(0, 1000, None, TimerKind::HideControls { seq: 3 });

        assert_eq!(queue.next_deadline(), Some(1000));
        assert!(queue.pop_due(999).is_none());

        assert_eq!(queue.pop_due(1000).map(|t| t.kind), Some(TimerKind::PreloadPass));
        assert_eq!(
            queue.pop_due(1000).map(|t| t.kind),
            Some(TimerKind::HideControls { seq: 3 })
        );
        assert!(queue.pop_due(3999).is_none());
        assert_eq!(queue.pop_due(5000).map(|t| t.kind), Some(TimerKind::EndScreenDwell));
        assert!(queue.is_empty());
    }
}
