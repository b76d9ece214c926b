//! 定时器堆条目实现
//! Timer entry implementation for the timer heap

use crate::task::{Task, TaskPriority, TraceLocation};
use std::time::{Duration, Instant};

/// Timer entry ID, used to uniquely identify timer entries in the heap.
/// 定时器条目ID，用于在堆中唯一标识定时器条目。
pub type TimerEntryId = u64;

/// A single schedulable unit in the timer heap.
///
/// The entry is in the heap iff it has a pending fire time; both are
/// tracked here and the pairing is verified by the heap's debug
/// consistency check. Every mutation happens on the owning thread.
///
/// 定时器堆中的单个可调度单元。
///
/// 条目在堆中当且仅当它有待定的触发时间；两者都在此记录，其配对关系
/// 由堆的调试一致性检查验证。所有修改都发生在拥有线程上。
#[derive(Debug)]
pub struct TimerEntry {
    /// Entry ID.
    /// 条目ID。
    id: TimerEntryId,
    /// Absolute fire time; `None` while the entry is not scheduled.
    /// 绝对触发时间；条目未被调度时为 `None`。
    fire_time: Option<Instant>,
    /// Repeat interval; `None` for one-shot entries.
    /// 重复间隔；一次性条目为 `None`。
    repeat_interval: Option<Duration>,
    /// Position in the owning heap; `None` while not in the heap.
    /// 在所属堆中的位置；不在堆中时为 `None`。
    heap_index: Option<usize>,
    /// Tie-break stamp assigned at request-creation time.
    /// 在请求创建时分配的决胜戳。
    insertion_order: u64,
    /// Advisory priority class; never consulted by the heap comparator.
    /// 建议性优先级类别；堆比较器从不查询它。
    priority: TaskPriority,
    /// The task to execute when the entry fires.
    /// 条目触发时要执行的任务。
    task: Task,
    /// Where the task was posted from.
    /// 任务的提交位置。
    location: TraceLocation,
}

impl TimerEntry {
    pub(crate) fn new(
        id: TimerEntryId,
        fire_time: Instant,
        insertion_order: u64,
        priority: TaskPriority,
        repeat_interval: Option<Duration>,
        task: Task,
        location: TraceLocation,
    ) -> Self {
        Self {
            id,
            fire_time: Some(fire_time),
            repeat_interval,
            heap_index: None,
            insertion_order,
            priority,
            task,
            location,
        }
    }

    /// The entry's stable ID.
    /// 条目的稳定ID。
    pub fn id(&self) -> TimerEntryId {
        self.id
    }

    /// The pending absolute fire time, if scheduled.
    /// 待定的绝对触发时间（若已调度）。
    pub fn fire_time(&self) -> Option<Instant> {
        self.fire_time
    }

    /// The repeat interval, if the entry repeats.
    /// 重复间隔（若条目为重复条目）。
    pub fn repeat_interval(&self) -> Option<Duration> {
        self.repeat_interval
    }

    /// The insertion-order stamp.
    /// 插入序戳。
    pub fn insertion_order(&self) -> u64 {
        self.insertion_order
    }

    /// The advisory priority class.
    /// 建议性优先级类别。
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// The submission location.
    /// 提交位置。
    pub fn location(&self) -> TraceLocation {
        self.location
    }

    pub(crate) fn heap_index(&self) -> Option<usize> {
        self.heap_index
    }

    pub(crate) fn set_heap_index(&mut self, index: Option<usize>) {
        self.heap_index = index;
    }

    pub(crate) fn set_fire_time(&mut self, fire_time: Instant) {
        self.fire_time = Some(fire_time);
    }

    pub(crate) fn clear_fire_time(&mut self) {
        self.fire_time = None;
    }

    /// Runs the attached task once.
    /// 运行一次附着的任务。
    pub(crate) fn run_task(&mut self) {
        self.task.run();
    }

    /// Whether the attached task may run more than once.
    /// 附着的任务是否可以运行多次。
    pub(crate) fn is_repeating(&self) -> bool {
        self.task.is_repeating()
    }

    /// Heap ordering: earlier fire time wins; equal fire times fall back
    /// to the insertion-order stamp. Priority is deliberately ignored.
    /// 堆排序：更早的触发时间优先；触发时间相同则回退到插入序戳。
    /// 优先级被有意忽略。
    pub(crate) fn precedes(&self, other: &Self) -> bool {
        match (self.fire_time, other.fire_time) {
            (Some(a), Some(b)) => {
                if a != b {
                    a < b
                } else {
                    order_precedes(self.insertion_order, other.insertion_order)
                }
            }
            // Unscheduled entries never participate in heap ordering.
            // 未调度的条目不参与堆排序。
            _ => false,
        }
    }
}

/// Whether stamp `a` was assigned before stamp `b`, using wraparound-safe
/// modular comparison so the counter can roll over after billions of
/// submissions.
/// 判断戳 `a` 是否先于戳 `b` 分配，使用回绕安全的模运算比较，
/// 使计数器在数十亿次提交后回绕仍然正确。
pub(crate) fn order_precedes(a: u64, b: u64) -> bool {
    (b.wrapping_sub(a) as i64) > 0
}
