//! 调度器线程模块
//! Scheduler thread module
//!
//! 该模块实现了线程绑定的协作式调度核心：一个逻辑"线程"对象独占拥有
//! 定时器堆，任意线程可以通过跨线程提交队列投递任务，由拥有线程的
//! 触发/排空循环统一服务，并提供优雅的启动与关闭协议。
//!
//! This module implements the thread-bound cooperative scheduling core: a
//! logical "thread" object exclusively owns the timer heap, any thread may
//! submit tasks through the cross-thread submission queue, the owning
//! thread's fire/drain loop services them all, and graceful startup and
//! shutdown protocols are provided.

pub mod core;
pub mod handle;
pub mod observer;
pub(crate) mod request;
pub(crate) mod shared;


pub use self::core::{SchedulerStats, SchedulerThread};
pub use self::handle::{
    SchedulerHandle, SpawnedScheduler, start_scheduler_thread, start_scheduler_thread_with,
};
pub use self::observer::TaskObserver;
