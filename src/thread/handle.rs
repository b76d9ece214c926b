//! 调度器线程句柄与启动函数
//! Scheduler thread handle and startup functions
//!
//! 本模块包含调度器线程的跨线程句柄（任意线程都可以经由它投递任务、
//! 挂起/恢复定时器队列或请求关闭），以及派生专用OS线程的便捷函数。
//!
//! This module contains the cross-thread handle of a scheduler thread
//! (any thread may post tasks, suspend/resume the timer queue or request
//! shutdown through it), and the convenience functions for spawning a
//! dedicated OS thread.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{HostWaker, NullHostWaker};
use crate::task::{Task, TaskPriority, TraceLocation};
use crate::thread::core::SchedulerThread;
use crate::thread::request::{CrossThreadRequest, RequestKind};
use crate::thread::shared::SharedState;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A clone-able handle for interacting with a scheduler thread from any
/// thread. Posting through the handle always goes via the shared
/// submission queue; the owning thread is woken and, if a host waker is
/// registered, a heartbeat pump is requested.
///
/// 可克隆的句柄，用于从任意线程与调度器线程交互。经句柄投递总是走共享
/// 提交队列；拥有线程会被唤醒，若注册了宿主唤醒器还会请求一次心跳泵。
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<SharedState>,
}

impl SchedulerHandle {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Posts a task with zero delay.
    /// 以零延迟投递任务。
    pub fn post_task<F>(&self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_delayed_task(location, task, Duration::ZERO);
    }

    /// Posts a delayed task. Cross-thread posts default to the
    /// lower-urgency loading class.
    /// 投递延迟任务。跨线程投递默认使用低紧迫度的加载类别。
    pub fn post_delayed_task<F>(&self, location: TraceLocation, task: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_delayed_task_with_priority(location, task, delay, TaskPriority::LOADING);
    }

    /// Posts a delayed task with an explicit priority class.
    /// 以显式优先级类别投递延迟任务。
    pub fn post_delayed_task_with_priority<F>(
        &self,
        location: TraceLocation,
        task: F,
        delay: Duration,
        priority: TaskPriority,
    ) where
        F: FnOnce() + Send + 'static,
    {
        self.submit(location, Task::once(task), delay, priority, RequestKind::Delayed);
    }

    /// Posts a task onto the owning thread's idle queue.
    /// 将任务投递到拥有线程的空闲队列。
    pub fn post_idle_task<F>(&self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(
            location,
            Task::once(task),
            Duration::ZERO,
            TaskPriority::LOADING,
            RequestKind::Idle,
        );
    }

    /// The one expected non-fatal error path: a post that arrives from
    /// another thread after exit was requested releases the task without
    /// running it, and still signals the wake primitive so the draining
    /// thread observes the exit request promptly. Posts made on the
    /// owning thread itself — work enqueued by tasks firing during the
    /// exit drain — are still accepted, and the drain loop fires them.
    /// 唯一预期中的非致命错误路径：在请求退出之后从其他线程到达的投递
    /// 会释放任务而不运行它，并仍然触发唤醒原语，使排空中的线程及时
    /// 观察到退出请求。在拥有线程自身上的投递（退出排空期间触发的任务
    /// 所排入的工作）仍被接受，由排空循环触发。
    fn submit(
        &self,
        location: TraceLocation,
        task: Task,
        delay: Duration,
        priority: TaskPriority,
        kind: RequestKind,
    ) {
        if self.shared.is_exit_requested()
            && (!self.shared.is_owner_thread() || self.shared.is_exit_completed())
        {
            self.shared.bump_dropped_after_exit();
            drop(task);
            self.shared.wake_owner();
            warn!(location = %location, "Task posted after exit was requested; dropping it");
            return;
        }

        let request = CrossThreadRequest {
            location,
            task,
            delay,
            priority,
            // Both stamps are captured now, at request creation, not at
            // drain time.
            // 两个戳都在此刻（请求创建时）而非排空时捕获。
            origin_time: self.shared.now(),
            insertion_order: self.shared.next_order(),
            kind,
        };
        self.shared.enqueue(request);
        self.shared.host().request_heartbeat();
    }

    /// Suspends the timer queue. Due timers stay queued until resumed.
    /// 挂起定时器队列。到期定时器保持排队直至恢复。
    pub fn suspend_timer_queue(&self) {
        self.shared.set_suspended(true);
        debug!("Timer queue suspended");
    }

    /// Resumes the timer queue and wakes the owning thread so overdue
    /// timers fire on its next pass.
    /// 恢复定时器队列并唤醒拥有线程，使逾期定时器在其下一遍中触发。
    pub fn resume_timer_queue(&self) {
        self.shared.set_suspended(false);
        self.shared.wake_owner();
        debug!("Timer queue resumed");
    }

    /// Requests exit and wakes the owning thread. The owning thread will
    /// run its drain-to-completion path before closing.
    /// 请求退出并唤醒拥有线程。拥有线程会在关闭前运行排空到完成路径。
    pub fn request_shutdown(&self) {
        self.shared.request_exit();
        self.shared.wake_owner();
    }

    /// Whether the owning thread has finished its exit drain.
    /// 拥有线程是否已完成退出排空。
    pub fn is_closed(&self) -> bool {
        self.shared.is_exit_completed()
    }
}

/// A scheduler running on its own spawned OS thread.
///
/// Dropping the value shuts the thread down; prefer calling
/// [`shutdown`](Self::shutdown) explicitly to observe failures.
///
/// 运行在自有派生OS线程上的调度器。
///
/// 丢弃该值会关闭线程；建议显式调用 [`shutdown`](Self::shutdown)
/// 以便观察失败。
pub struct SpawnedScheduler {
    handle: SchedulerHandle,
    shared: Arc<SharedState>,
    join: Option<JoinHandle<()>>,
    poll_interval: Duration,
}

impl SpawnedScheduler {
    /// A handle for posting to the spawned thread.
    /// 用于向派生线程投递的句柄。
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Requests exit, then blocks (sleep-polling the exit-completed flag)
    /// until the owning thread has drained and fired all pending work,
    /// and finally joins the OS thread.
    /// 请求退出，然后阻塞（轮询退出完成标志）直至拥有线程排空并触发了
    /// 所有待处理工作，最后join该OS线程。
    pub fn shutdown(mut self) -> Result<()> {
        self.shutdown_inner()
    }

    fn shutdown_inner(&mut self) -> Result<()> {
        let Some(join) = self.join.take() else {
            return Err(Error::SchedulerClosed);
        };
        self.handle.request_shutdown();
        while !self.shared.is_exit_completed() && !join.is_finished() {
            std::thread::sleep(self.poll_interval);
        }
        join.join().map_err(|_| Error::ThreadPanicked)?;
        info!("Scheduler thread joined");
        Ok(())
    }
}

impl Drop for SpawnedScheduler {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.shutdown_inner();
        }
    }
}

/// Spawns a scheduler on a dedicated OS thread with the system clock and
/// no host waker. Blocks until the new thread reports itself initialized.
/// 在专用OS线程上派生调度器，使用系统时钟且不带宿主唤醒器。阻塞直至
/// 新线程报告自身已初始化。
pub fn start_scheduler_thread(config: Config) -> Result<SpawnedScheduler> {
    start_scheduler_thread_with(config, Arc::new(SystemClock), Arc::new(NullHostWaker))
}

/// Spawns a scheduler thread with an injected clock and host waker.
/// 以注入的时钟与宿主唤醒器派生调度器线程。
pub fn start_scheduler_thread_with(
    config: Config,
    clock: Arc<dyn Clock>,
    host: Arc<dyn HostWaker>,
) -> Result<SpawnedScheduler> {
    let shared = Arc::new(SharedState::new(clock, host));
    let poll_interval = config.shutdown.poll_interval;

    let thread_shared = shared.clone();
    let join = std::thread::Builder::new()
        .name("kestrel-sched".into())
        .spawn(move || {
            let mut core = SchedulerThread::with_shared(thread_shared, config);
            core.run_loop();
        })?;

    // Synchronous startup handshake: do not hand the scheduler out until
    // the loop thread is up.
    // 同步启动握手：在循环线程就绪之前不把调度器交出去。
    shared.wait_initialized();
    info!("Scheduler thread spawned");

    Ok(SpawnedScheduler {
        handle: SchedulerHandle::new(shared.clone()),
        shared,
        join: Some(join),
        poll_interval,
    })
}
