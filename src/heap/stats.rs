//! 定时器堆统计信息
//! Timer heap statistics

use std::fmt;

/// A snapshot of the heap's population.
/// 堆内条目数量的快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHeapStats {
    /// Total scheduled entries.
    /// 已调度条目总数。
    pub total_timers: usize,
    /// Entries that re-arm after firing.
    /// 触发后会重新武装的条目数。
    pub repeating_timers: usize,
}

impl fmt::Display for TimerHeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimerHeapStats {{ timers: {}, repeating: {} }}",
            self.total_timers, self.repeating_timers
        )
    }
}
