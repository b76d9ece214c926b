//! 跨线程任务请求
//! Cross-thread task request

use crate::task::{Task, TaskPriority, TraceLocation};
use std::time::{Duration, Instant};

/// How a request is converted once the owning thread drains it.
/// 拥有线程排空请求时的转换方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    /// Becomes a heap insertion at `origin_time + delay`.
    /// 成为堆插入，触发时间为 `origin_time + delay`。
    Delayed,
    /// Joins the idle queue, serviced when no timer is due.
    /// 进入空闲队列，在没有定时器到期时被服务。
    Idle,
}

/// A task posted from a non-owning thread, parked in the shared
/// submission queue until the owning thread converts it.
///
/// The origin timestamp and the insertion-order stamp are both captured
/// at request-creation time: the timestamp keeps relative delays measured
/// on the caller's clock consistent however late the drain happens, and
/// the stamp keeps FIFO ordering across threads stable regardless of
/// queueing delay.
///
/// 从非拥有线程投递的任务，停放在共享提交队列中，直至拥有线程将其转换。
///
/// 起源时间戳与插入序戳都在请求创建时捕获：时间戳使按调用方时钟测量的
/// 相对延迟无论排空多晚都保持一致，插入序戳使跨线程的FIFO顺序不受
/// 排队延迟影响。
#[derive(Debug)]
pub(crate) struct CrossThreadRequest {
    pub location: TraceLocation,
    pub task: Task,
    pub delay: Duration,
    pub priority: TaskPriority,
    pub origin_time: Instant,
    pub insertion_order: u64,
    pub kind: RequestKind,
}
