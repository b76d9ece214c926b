//! 调度器线程核心实现
//! Scheduler thread core implementation
//!
//! 本模块包含拥有线程一侧的核心逻辑：将跨线程请求排空为堆插入、按
//! 预算服务到期定时器、维护任务观察者与空闲队列，以及退出时的
//! 排空到完成路径。
//!
//! This module contains the owning-thread side of the core: draining
//! cross-thread requests into heap insertions, servicing due timers under
//! a budget, maintaining task observers and the idle queue, and the
//! drain-to-completion path taken on exit.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::heap::{TimerEntryId, TimerHeap, TimerHeapStats};
use crate::host::{HostWaker, NullHostWaker};
use crate::location;
use crate::task::{Task, TaskPriority, TraceLocation};
use crate::thread::handle::SchedulerHandle;
use crate::thread::observer::TaskObserver;
use crate::thread::request::RequestKind;
use crate::thread::shared::SharedState;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// The thread-bound scheduling core. Exclusively owns the timer heap and
/// the idle queue; every method runs on the owning thread. Cross-thread
/// interaction goes through the [`SchedulerHandle`] instead.
///
/// 线程绑定的调度核心。独占拥有定时器堆与空闲队列；所有方法都在拥有
/// 线程上运行。跨线程交互改走 [`SchedulerHandle`]。
pub struct SchedulerThread {
    shared: Arc<SharedState>,
    /// The timer heap. Only the owning thread touches it, so no lock.
    /// 定时器堆。只有拥有线程访问，因此无锁。
    heap: TimerHeap,
    /// Idle tasks, serviced only when a pass finds no due timer.
    /// 空闲任务，仅在服务遍未发现到期定时器时被服务。
    idle_queue: VecDeque<(TraceLocation, Task)>,
    /// Pre/post hooks around every fired task.
    /// 每个被触发任务前后的钩子。
    observers: Vec<Arc<dyn TaskObserver>>,
    /// Re-entrancy guard: a nested service pass is a no-op.
    /// 重入保护：嵌套的服务遍是空操作。
    firing: bool,
    config: Config,
    processed_tasks: u64,
    processed_idle_tasks: u64,
    service_passes: u64,
}

impl SchedulerThread {
    /// Wraps the calling thread in place as a scheduler thread, the
    /// designated-primary-thread construction: no OS thread is spawned
    /// and no handshake is needed. The host pump drives [`fire`] and the
    /// embedder tears the scheduler down with [`shutdown`] when its own
    /// loop exits.
    ///
    /// 将调用线程就地包装为调度器线程，即指定主线程的构造方式：不派生
    /// OS线程，也不需要握手。宿主泵驱动 [`fire`]，嵌入方在自身循环退出
    /// 时用 [`shutdown`] 拆除调度器。
    ///
    /// [`fire`]: Self::fire
    /// [`shutdown`]: Self::shutdown
    pub fn current_thread(config: Config) -> (Self, SchedulerHandle) {
        Self::current_thread_with(config, Arc::new(SystemClock), Arc::new(NullHostWaker))
    }

    /// Same as [`current_thread`](Self::current_thread) with an injected
    /// clock and host waker.
    /// 与 [`current_thread`](Self::current_thread) 相同，但注入时钟与
    /// 宿主唤醒器。
    pub fn current_thread_with(
        config: Config,
        clock: Arc<dyn Clock>,
        host: Arc<dyn HostWaker>,
    ) -> (Self, SchedulerHandle) {
        let shared = Arc::new(SharedState::new(clock, host));
        shared.adopt_owner_thread();
        shared.mark_initialized();
        let handle = SchedulerHandle::new(shared.clone());
        (Self::with_shared(shared, config), handle)
    }

    pub(crate) fn with_shared(shared: Arc<SharedState>, config: Config) -> Self {
        Self {
            shared,
            heap: TimerHeap::new(),
            idle_queue: VecDeque::new(),
            observers: Vec::new(),
            firing: false,
            config,
            processed_tasks: 0,
            processed_idle_tasks: 0,
            service_passes: 0,
        }
    }

    /// A handle for posting from other threads.
    /// 用于从其他线程投递的句柄。
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle::new(self.shared.clone())
    }

    /// Posts a task to run as soon as the next service pass reaches it.
    /// 投递一个任务，在下一个服务遍到达它时尽快运行。
    pub fn post_task<F>(&mut self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_delayed_task(location, task, Duration::ZERO);
    }

    /// Posts a task to run once `delay` has elapsed.
    /// 投递一个任务，在 `delay` 流逝后运行。
    pub fn post_delayed_task<F>(&mut self, location: TraceLocation, task: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_delayed_task_with_priority(location, task, delay, TaskPriority::NORMAL);
    }

    /// Posts a delayed task with an explicit priority class. Called on
    /// the owning thread, the request becomes a heap insertion directly,
    /// with no queue indirection; the insertion-order stamp still comes
    /// from the shared counter so ordering against concurrent
    /// cross-thread posts holds.
    ///
    /// 以显式优先级类别投递延迟任务。在拥有线程上调用时，请求直接成为
    /// 堆插入，无需经过队列；插入序戳仍来自共享计数器，因此与并发的
    /// 跨线程投递之间的顺序依然成立。
    pub fn post_delayed_task_with_priority<F>(
        &mut self,
        location: TraceLocation,
        task: F,
        delay: Duration,
        priority: TaskPriority,
    ) where
        F: FnOnce() + Send + 'static,
    {
        let order = self.shared.next_order();
        let fire_time = self.shared.now() + delay;
        self.heap.schedule(
            fire_time,
            order,
            priority,
            None,
            Task::once(task),
            location,
        );
    }

    /// Starts a repeating timer. It first fires after `interval` and
    /// re-arms to `scheduled_fire_time + interval` on every firing, so it
    /// does not drift under load. The returned ID stops it via
    /// [`stop_timer`](Self::stop_timer).
    ///
    /// 启动一个重复定时器。它在 `interval` 后首次触发，并在每次触发时
    /// 重新武装到 `计划触发时间 + interval`，因此在负载下不会漂移。
    /// 返回的ID可通过 [`stop_timer`](Self::stop_timer) 停止它。
    pub fn post_repeating_task<F>(
        &mut self,
        location: TraceLocation,
        task: F,
        interval: Duration,
    ) -> TimerEntryId
    where
        F: FnMut() + Send + 'static,
    {
        debug_assert!(!interval.is_zero(), "repeat interval must be non-zero");
        let order = self.shared.next_order();
        let fire_time = self.shared.now() + interval;
        self.heap.schedule(
            fire_time,
            order,
            TaskPriority::NORMAL,
            Some(interval),
            Task::repeating(task),
            location,
        )
    }

    /// Posts a task onto the idle queue, run only when a service pass
    /// finds no due timer.
    /// 将任务投递到空闲队列，仅在服务遍未发现到期定时器时运行。
    pub fn post_idle_task<F>(&mut self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.idle_queue.push_back((location, Task::once(task)));
    }

    /// Stops a timer: clears its fire time and removes it from the heap.
    /// Stopping an already-inactive timer is a no-op and returns false.
    /// 停止定时器：清除其触发时间并将其从堆中移除。停止已不活跃的
    /// 定时器是空操作并返回 false。
    pub fn stop_timer(&mut self, id: TimerEntryId) -> bool {
        let stopped = self.heap.remove(id).is_some();
        if stopped {
            trace!(entry_id = id, "Timer stopped");
        }
        stopped
    }

    /// Moves a pending timer to fire `delay` from now. Returns false if
    /// the timer is unknown or inactive.
    /// 将待定定时器移动为从现在起 `delay` 后触发。定时器未知或不活跃时
    /// 返回 false。
    pub fn reschedule_timer(&mut self, id: TimerEntryId, delay: Duration) -> bool {
        let fire_time = self.shared.now() + delay;
        self.heap.reschedule(id, fire_time)
    }

    /// Suspends the timer queue: due timers stay queued instead of firing
    /// on subsequent service passes. Submission and heap insertion still
    /// proceed, so work accumulates rather than being dropped.
    /// 挂起定时器队列：到期定时器在后续服务遍中保持排队而不触发。
    /// 提交与堆插入仍然进行，因此工作会累积而不会被丢弃。
    pub fn suspend_timer_queue(&mut self) {
        self.shared.set_suspended(true);
        debug!("Timer queue suspended");
    }

    /// Resumes the timer queue; every timer whose deadline has already
    /// passed fires on the next service pass, in order.
    /// 恢复定时器队列；所有截止时间已过的定时器都在下一个服务遍中按序
    /// 触发。
    pub fn resume_timer_queue(&mut self) {
        self.shared.set_suspended(false);
        debug!("Timer queue resumed");
    }

    /// Registers an observer for pre/post hooks around every fired task.
    /// A no-op task is pushed behind the registration so the list update
    /// is ordered with respect to already-queued work.
    /// 注册观察者以接收每个被触发任务前后的钩子。注册后会压入一个空
    /// 操作任务，使列表更新与已排队的工作保持有序。
    pub fn add_task_observer(&mut self, observer: Arc<dyn TaskObserver>) {
        self.observers.push(observer);
        let order = self.shared.next_order();
        let fire_time = self.shared.now();
        self.heap.schedule(
            fire_time,
            order,
            TaskPriority::NORMAL,
            None,
            Task::no_op(),
            location!(),
        );
    }

    /// Unregisters a previously added observer.
    /// 注销先前添加的观察者。
    pub fn remove_task_observer(&mut self, observer: &Arc<dyn TaskObserver>) {
        self.observers
            .retain(|registered| !Arc::ptr_eq(registered, observer));
    }

    /// The externally-triggered service entry point: drains the
    /// cross-thread queue into the heap, then services due timers once.
    /// This is what an embedding host calls from its message pump. On a
    /// primary-thread scheduler a baseline re-arm is requested afterwards
    /// so `fire()` keeps being called even with no other host events.
    ///
    /// 外部触发的服务入口：先将跨线程队列排空进堆，然后服务一次到期
    /// 定时器。嵌入宿主在其消息泵中调用它。在主线程调度器上，之后会
    /// 请求一次基线重新武装，使 `fire()` 在没有其他宿主事件时也能持续
    /// 被调用。
    pub fn fire(&mut self) {
        debug_assert!(
            self.shared.is_owner_thread(),
            "fire() called off the owning thread"
        );
        self.drain_cross_thread_queue();
        self.service_due_timers();
        if self.config.heartbeat.primary {
            self.shared
                .host()
                .request_rearm(self.config.heartbeat.rearm_interval);
        }
    }

    /// Tears the scheduler down from the owning thread: requests exit and
    /// synchronously runs the drain-to-completion path. Every pending
    /// entry is treated as due and fired, including work the dying tasks
    /// enqueue, until the heap and the submission queue are both empty.
    ///
    /// 从拥有线程拆除调度器：请求退出并同步运行排空到完成路径。所有
    /// 待定条目都被视为到期并触发，包括临终任务新排入的工作，直至堆与
    /// 提交队列都为空。
    pub fn shutdown(mut self) {
        info!("Scheduler shutdown requested on the owning thread");
        self.shared.request_exit();
        self.fire_on_exit();
    }

    /// Statistics snapshot. Owning thread only.
    /// 统计信息快照。仅限拥有线程。
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            processed_tasks: self.processed_tasks,
            processed_idle_tasks: self.processed_idle_tasks,
            service_passes: self.service_passes,
            dropped_after_exit: self.shared.dropped_after_exit(),
            heap_stats: self.heap.stats(),
        }
    }

    /// The wait/fire loop run by a spawned scheduler thread. Parks on the
    /// wake primitive between passes, bounded by the next deadline.
    /// 派生的调度器线程运行的等待/触发循环。在两遍之间停靠于唤醒原语，
    /// 以下一个截止时间为界。
    pub(crate) fn run_loop(&mut self) {
        self.shared.adopt_owner_thread();
        self.shared.mark_initialized();
        info!("Scheduler thread started");

        loop {
            if self.shared.is_exit_requested() {
                break;
            }
            self.fire();
            if self.shared.is_exit_requested() {
                break;
            }

            let now = self.shared.now();
            let timeout = match self.heap.peek_deadline() {
                Some(deadline) if !self.shared.is_suspended() => deadline
                    .saturating_duration_since(now)
                    .min(self.config.service.max_park),
                _ => self.config.service.max_park,
            };
            if timeout.is_zero() {
                continue;
            }
            self.shared.park(timeout);
        }

        self.fire_on_exit();
        info!("Scheduler thread shutdown completed");
    }

    /// The final-drain routine: fires everything left, draining whatever
    /// the fired tasks themselves enqueue, then releases the remains and
    /// flips the exit-completed flag other threads poll on.
    /// 最终排空例程：触发剩余的一切，并排空被触发任务自身新排入的工作，
    /// 然后释放残留并翻转其他线程轮询的退出完成标志。
    pub(crate) fn fire_on_exit(&mut self) {
        debug_assert!(self.shared.is_exit_requested());
        loop {
            self.drain_cross_thread_queue();
            self.service_due_timers();
            if self.heap.is_empty()
                && self.idle_queue.is_empty()
                && self.shared.queue_is_empty()
            {
                break;
            }
        }
        self.heap.clear();
        self.shared.mark_exit_completed();

        // Requests that raced past the exit check after the last drain
        // are released unexecuted.
        // 在最后一次排空之后才越过退出检查的请求未执行即被释放。
        let raced = self.shared.swap_queue();
        if !raced.is_empty() {
            for _ in &raced {
                self.shared.bump_dropped_after_exit();
            }
            warn!(count = raced.len(), "Releasing task requests that arrived during close");
        }

        debug!(
            processed_tasks = self.processed_tasks,
            "Scheduler exit drain completed"
        );
    }

    /// Converts pending cross-thread requests into heap insertions. The
    /// whole list is swapped out under the lock and converted outside it;
    /// the loop repeats because a task executed earlier in the same pass
    /// may have enqueued more requests.
    /// 将待处理的跨线程请求转换为堆插入。整个列表在持锁下换出、在锁外
    /// 转换；循环重复进行，因为同一遍中先前执行的任务可能又排入了新的
    /// 请求。
    fn drain_cross_thread_queue(&mut self) {
        loop {
            let pending = self.shared.swap_queue();
            if pending.is_empty() {
                break;
            }
            let count = pending.len();
            for request in pending {
                match request.kind {
                    RequestKind::Delayed => {
                        // The captured origin timestamp plus the requested
                        // delay is the absolute fire time, so delays measured
                        // on the caller's clock hold however late the drain
                        // runs.
                        // 捕获的起源时间戳加请求延迟即绝对触发时间，
                        // 使按调用方时钟测量的延迟无论排空多晚都成立。
                        let fire_time = request.origin_time + request.delay;
                        self.heap.schedule(
                            fire_time,
                            request.insertion_order,
                            request.priority,
                            None,
                            request.task,
                            request.location,
                        );
                    }
                    RequestKind::Idle => {
                        self.idle_queue.push_back((request.location, request.task));
                    }
                }
            }
            trace!(count, "Drained cross-thread task requests");
        }
    }

    /// One service pass: pops and runs every currently-due entry in
    /// (fire time, insertion order) sequence, bounded by the configured
    /// wall-clock budget. While the queue is suspended, due timers stay
    /// queued. While exiting, every entry counts as due and the budget
    /// and suspension are both ignored.
    /// 一个服务遍：按（触发时间, 插入序）顺序弹出并运行当前所有到期
    /// 条目，受配置的墙上时钟预算限制。队列挂起期间，到期定时器保持
    /// 排队。退出期间，所有条目都算作到期，预算与挂起均被忽略。
    fn service_due_timers(&mut self) {
        if self.firing {
            trace!("Nested service pass suppressed");
            return;
        }
        self.firing = true;
        self.service_passes += 1;

        let pass_start = self.shared.now();
        let budget = self.config.service.pass_budget;
        let mut budget_exhausted = false;

        loop {
            let exiting = self.shared.is_exit_requested();
            if !exiting && self.shared.is_suspended() {
                break;
            }
            let now = self.shared.now();
            if !exiting && now.saturating_duration_since(pass_start) > budget {
                budget_exhausted = true;
                debug!("Service pass budget exhausted, leaving due timers for the next fire");
                break;
            }

            let Some(mut entry) = self.heap.pop_due(now, exiting) else {
                break;
            };
            let scheduled = entry.fire_time().unwrap_or(now);
            let location = entry.location();

            // Repeating entries re-arm from the scheduled time, not from
            // now, so periodic timers do not drift under load. They are
            // not re-armed while exiting, or the drain would never end.
            // 重复条目从计划时间而非当前时间重新武装，使周期定时器在
            // 负载下不漂移。退出期间不重新武装，否则排空永远不会结束。
            let repeat = if exiting { None } else { entry.repeat_interval() };
            match repeat {
                Some(interval) => entry.set_fire_time(scheduled + interval),
                None => entry.clear_fire_time(),
            }

            for observer in &self.observers {
                observer.will_process_task(location);
            }
            entry.run_task();
            for observer in &self.observers {
                observer.did_process_task(location);
            }
            self.processed_tasks += 1;
            trace!(entry_id = entry.id(), location = %location, "Task fired");

            if repeat.is_some() {
                self.heap.reinsert(entry);
            }

            // The task may have posted more cross-thread work; pick it up
            // before the next pop so ordering stays faithful.
            // 任务可能又投递了跨线程工作；在下一次弹出前先收取，
            // 保持顺序的正确性。
            self.drain_cross_thread_queue();
        }

        self.service_idle_tasks(pass_start, &mut budget_exhausted);

        // Ask the host to pump again soon when due work had to be left
        // behind.
        // 当到期工作不得不被留下时，请求宿主尽快再泵一次。
        let now = self.shared.now();
        if !self.shared.is_suspended() && (budget_exhausted || self.has_due_timer_at(now)) {
            self.shared.host().request_heartbeat();
        }

        self.firing = false;
    }

    /// Services the idle queue, only reached when no due timer remains.
    /// 服务空闲队列，仅在没有剩余到期定时器时到达。
    fn service_idle_tasks(&mut self, pass_start: std::time::Instant, budget_exhausted: &mut bool) {
        let exiting = self.shared.is_exit_requested();
        if !exiting {
            let now = self.shared.now();
            if self.shared.is_suspended() || *budget_exhausted || self.has_due_timer_at(now) {
                return;
            }
        }

        let budget = self.config.service.pass_budget;
        while let Some((location, mut task)) = self.idle_queue.pop_front() {
            let now = self.shared.now();
            if !exiting {
                if now.saturating_duration_since(pass_start) > budget {
                    self.idle_queue.push_front((location, task));
                    *budget_exhausted = true;
                    break;
                }
                if self.has_due_timer_at(now) {
                    // A due timer appeared; idle work yields to it.
                    // 出现了到期定时器；空闲工作为其让路。
                    self.idle_queue.push_front((location, task));
                    break;
                }
            }

            for observer in &self.observers {
                observer.will_process_task(location);
            }
            task.run();
            for observer in &self.observers {
                observer.did_process_task(location);
            }
            self.processed_idle_tasks += 1;
            trace!(location = %location, "Idle task ran");

            self.drain_cross_thread_queue();
        }
    }

    fn has_due_timer_at(&self, now: std::time::Instant) -> bool {
        self.heap
            .peek_deadline()
            .is_some_and(|deadline| deadline <= now)
    }
}

impl fmt::Debug for SchedulerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerThread")
            .field("heap", &self.heap)
            .field("idle_queue_len", &self.idle_queue.len())
            .field("observers", &self.observers.len())
            .field("firing", &self.firing)
            .finish_non_exhaustive()
    }
}

/// Scheduler thread statistics.
/// 调度器线程统计信息。
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    /// Timer tasks fired so far.
    /// 迄今触发的定时器任务数。
    pub processed_tasks: u64,
    /// Idle tasks run so far.
    /// 迄今运行的空闲任务数。
    pub processed_idle_tasks: u64,
    /// Service passes executed.
    /// 已执行的服务遍数。
    pub service_passes: u64,
    /// Tasks released unexecuted because they were posted after exit was
    /// requested.
    /// 因在请求退出后投递而未执行即被释放的任务数。
    pub dropped_after_exit: u64,
    /// Timer heap statistics.
    /// 定时器堆统计信息。
    pub heap_stats: TimerHeapStats,
}

impl fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SchedulerStats {{ tasks: {}, idle: {}, passes: {}, dropped: {}, heap: {} }}",
            self.processed_tasks,
            self.processed_idle_tasks,
            self.service_passes,
            self.dropped_after_exit,
            self.heap_stats
        )
    }
}
