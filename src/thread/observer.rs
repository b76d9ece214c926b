//! 任务观察者钩子
//! Task observer hooks

use crate::task::TraceLocation;

/// Receives hooks around the execution of every fired task on a
/// scheduler thread. Used for bookkeeping such as deferred-cleanup
/// passes. Registration is funneled through the owning thread, so hook
/// invocation is always same-thread.
///
/// 接收调度器线程上每个被触发任务执行前后的钩子。用于延迟清理等簿记
/// 工作。注册经由拥有线程汇集，因此钩子调用总是在同一线程上。
pub trait TaskObserver: Send + Sync {
    /// Called immediately before a task runs.
    /// 在任务运行前立即调用。
    fn will_process_task(&self, location: TraceLocation);

    /// Called immediately after a task returns.
    /// 在任务返回后立即调用。
    fn did_process_task(&self, location: TraceLocation);
}
