//! 调度器门面：按调用方意图分类优先级并委托给核心。
//! Scheduler facade: classifies caller intent into priority buckets and
//! delegates to the core.
//!
//! 加载任务进入低紧迫度类别且无延迟；定时任务使用请求的延迟与默认
//! 类别；空闲任务在宿主接通真正的空闲信号时进入空闲队列，否则降级为
//! 立即执行的零延迟任务（默认行为）。
//!
//! Loading tasks go to the lower-urgency class with no delay; timer tasks
//! use the requested delay and the default class; idle tasks join the
//! idle queue when the host has wired up a real idle signal, and
//! otherwise degrade to an immediate zero-delay task (the default).

use crate::config::Config;
use crate::task::TraceLocation;
use crate::thread::SchedulerHandle;
use std::time::Duration;
use tracing::trace;

/// The priority-classifying front end over a scheduler thread.
/// 调度器线程之上按优先级分类的前端。
#[derive(Clone)]
pub struct Scheduler {
    handle: SchedulerHandle,
    idle_enabled: bool,
}

impl Scheduler {
    /// Builds a facade over the given scheduler thread handle.
    /// 基于给定的调度器线程句柄构建门面。
    pub fn new(handle: SchedulerHandle, config: &Config) -> Self {
        Self {
            handle,
            idle_enabled: config.idle.enabled,
        }
    }

    /// Posts a loading task: lower-urgency class, no delay.
    /// 投递加载任务：低紧迫度类别，无延迟。
    pub fn post_loading_task<F>(&self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.post_task(location, task);
    }

    /// Posts a timer task: default class, the requested delay.
    /// 投递定时任务：默认类别，使用请求的延迟。
    pub fn post_timer_task<F>(&self, location: TraceLocation, task: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.post_delayed_task_with_priority(
            location,
            task,
            delay,
            crate::task::TaskPriority::NORMAL,
        );
    }

    /// Posts an idle task. Without a wired-up idle signal this degrades
    /// to an immediate zero-delay task rather than waiting for true idle.
    /// 投递空闲任务。未接通空闲信号时，它降级为立即执行的零延迟任务，
    /// 而不是等待真正的空闲。
    pub fn post_idle_task<F>(&self, location: TraceLocation, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.idle_enabled {
            self.handle.post_idle_task(location, task);
        } else {
            trace!(location = %location, "Idle task degraded to an immediate task");
            self.handle.post_task(location, task);
        }
    }

    /// Passes queue suspension through to the core.
    /// 将队列挂起直通到核心。
    pub fn suspend_timer_queue(&self) {
        self.handle.suspend_timer_queue();
    }

    /// Passes queue resumption through to the core.
    /// 将队列恢复直通到核心。
    pub fn resume_timer_queue(&self) {
        self.handle.resume_timer_queue();
    }
}
