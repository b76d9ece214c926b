//! 调度器线程的跨线程共享状态
//! Cross-thread shared state of a scheduler thread
//!
//! 提交队列是唯一被多线程共享的可变结构，由单个互斥锁保护，且持锁
//! 期间只做追加或整体交换，从不再取其他锁。其余共享状态都是原子标志。
//!
//! The submission queue is the only mutable structure shared across
//! threads. It is protected by a single mutex held only for an append or
//! a whole-list swap, and no other lock is ever taken while holding it.
//! All remaining shared state is atomic flags.

use crate::clock::Clock;
use crate::host::HostWaker;
use crate::thread::request::CrossThreadRequest;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

pub(crate) struct SharedState {
    /// Pending cross-thread task requests; appended by any thread,
    /// drained only by the owning thread.
    /// 待处理的跨线程任务请求；任意线程可追加，仅拥有线程排空。
    queue: Mutex<Vec<CrossThreadRequest>>,
    /// Wake primitive paired with `queue`.
    /// 与 `queue` 配对的唤醒原语。
    wake: Condvar,
    /// Gates whether due timers actually fire on the next service pass.
    /// 控制到期定时器是否在下一个服务遍中真正触发。
    suspended: AtomicBool,
    /// Set once exit has been requested; cross-thread posts drop from
    /// then on.
    /// 一旦请求退出即置位；此后跨线程投递被丢弃。
    exit_requested: AtomicBool,
    /// Set once the owning thread has finished its exit drain.
    /// 拥有线程完成退出排空后置位。
    exit_completed: AtomicBool,
    /// Insertion-order stamps, assigned at request-creation time on
    /// whichever thread posts.
    /// 插入序戳，在请求创建时由投递线程分配。
    order_counter: AtomicU64,
    /// Tasks released unexecuted because they arrived after exit was
    /// requested.
    /// 因在请求退出之后到达而未执行即被释放的任务数。
    dropped_after_exit: AtomicU64,
    /// Identity of the owning thread, set exactly once at startup.
    /// 拥有线程的标识，在启动时设置一次。
    owner_thread: OnceLock<ThreadId>,
    /// Startup handshake: the spawning thread blocks until the loop
    /// thread flips this flag.
    /// 启动握手：派生线程阻塞直到循环线程翻转该标志。
    initialized: Mutex<bool>,
    init_wake: Condvar,
    clock: Arc<dyn Clock>,
    host: Arc<dyn HostWaker>,
}

impl SharedState {
    pub(crate) fn new(clock: Arc<dyn Clock>, host: Arc<dyn HostWaker>) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            wake: Condvar::new(),
            suspended: AtomicBool::new(false),
            exit_requested: AtomicBool::new(false),
            exit_completed: AtomicBool::new(false),
            order_counter: AtomicU64::new(0),
            dropped_after_exit: AtomicU64::new(0),
            owner_thread: OnceLock::new(),
            initialized: Mutex::new(false),
            init_wake: Condvar::new(),
            clock,
            host,
        }
    }

    pub(crate) fn now(&self) -> Instant {
        self.clock.now()
    }

    pub(crate) fn host(&self) -> &dyn HostWaker {
        self.host.as_ref()
    }

    /// Assigns the next insertion-order stamp. Wraps around; the heap
    /// comparator is wraparound-safe.
    /// 分配下一个插入序戳。会回绕；堆比较器对回绕是安全的。
    pub(crate) fn next_order(&self) -> u64 {
        self.order_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Appends a request and wakes the owning thread.
    /// 追加一个请求并唤醒拥有线程。
    pub(crate) fn enqueue(&self, request: CrossThreadRequest) {
        let mut queue = self.queue.lock();
        queue.push(request);
        self.wake.notify_one();
    }

    /// Swaps the entire pending list out for an empty one, minimizing the
    /// time the lock is held. Owning thread only.
    /// 将整个待处理列表换出为空列表，最小化持锁时间。仅限拥有线程。
    pub(crate) fn swap_queue(&self) -> Vec<CrossThreadRequest> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub(crate) fn queue_is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Blocks the owning thread until woken or until `timeout` elapses.
    /// Returns immediately if work or an exit request is already pending.
    /// 阻塞拥有线程直至被唤醒或 `timeout` 耗尽。若已有工作或退出请求
    /// 待处理则立即返回。
    pub(crate) fn park(&self, timeout: Duration) {
        let mut queue = self.queue.lock();
        if queue.is_empty() && !self.is_exit_requested() {
            let _ = self.wake.wait_for(&mut queue, timeout);
        }
    }

    /// Wakes the owning thread without submitting work, e.g. after a flag
    /// change it must observe.
    /// 在不提交工作的情况下唤醒拥有线程，例如在其必须观察到的标志变更
    /// 之后。
    pub(crate) fn wake_owner(&self) {
        let _queue = self.queue.lock();
        self.wake.notify_one();
    }

    pub(crate) fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::SeqCst);
    }

    pub(crate) fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    pub(crate) fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_exit_completed(&self) {
        self.exit_completed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_exit_completed(&self) -> bool {
        self.exit_completed.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_dropped_after_exit(&self) {
        self.dropped_after_exit.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn dropped_after_exit(&self) -> u64 {
        self.dropped_after_exit.load(Ordering::SeqCst)
    }

    /// Records the calling thread as the owner. Called exactly once.
    /// 将调用线程记录为拥有者。只调用一次。
    pub(crate) fn adopt_owner_thread(&self) {
        let _ = self.owner_thread.set(std::thread::current().id());
    }

    pub(crate) fn is_owner_thread(&self) -> bool {
        self.owner_thread.get().copied() == Some(std::thread::current().id())
    }

    /// Flips the initialized flag and releases the spawning thread.
    /// 翻转已初始化标志并释放派生线程。
    pub(crate) fn mark_initialized(&self) {
        let mut initialized = self.initialized.lock();
        *initialized = true;
        self.init_wake.notify_all();
    }

    /// Blocks until the loop thread reports itself initialized.
    /// 阻塞直到循环线程报告自身已初始化。
    pub(crate) fn wait_initialized(&self) {
        let mut initialized = self.initialized.lock();
        while !*initialized {
            self.init_wake.wait(&mut initialized);
        }
    }
}
