//! 定义了调度器线程的可配置参数。
//! Defines configurable parameters for scheduler threads.

use std::time::Duration;

/// A structure containing all configurable parameters for a scheduler thread.
///
/// 包含调度器线程所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Service-pass-related parameters.
    /// 服务遍相关参数。
    pub service: ServiceConfig,

    /// Heartbeat and host re-arm parameters.
    /// 心跳和宿主重新武装参数。
    pub heartbeat: HeartbeatConfig,

    /// Shutdown-related parameters.
    /// 关闭相关参数。
    pub shutdown: ShutdownConfig,

    /// Idle-task-related parameters.
    /// 空闲任务相关参数。
    pub idle: IdleConfig,
}

/// Service-pass-related parameters.
///
/// 服务遍相关参数。
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The wall-clock budget for a single service pass. Once a pass has
    /// run longer than this, remaining due timers wait for the next
    /// `fire()` call so the pass does not starve the host's own loop.
    /// The default of 50ms is tuned for a thread shared with UI work;
    /// a pure backend embedding can raise it freely.
    ///
    /// 单次服务遍的墙上时钟预算。一旦一遍运行超过该时长，剩余的到期定时器
    /// 将等待下一次 `fire()` 调用，以免服务遍饿死宿主自己的循环。
    /// 默认值50ms是为与UI工作共享的线程调优的；纯后端嵌入可以自由调高。
    pub pass_budget: Duration,

    /// The longest a spawned scheduler thread will park waiting for a
    /// wake-up when it has no armed timer to bound the wait.
    ///
    /// 当没有已武装的定时器来限定等待时长时，派生的调度器线程停靠等待
    /// 唤醒的最长时间。
    pub max_park: Duration,
}

/// Heartbeat and host re-arm parameters.
///
/// 心跳和宿主重新武装参数。
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// The baseline interval at which a primary-thread scheduler asks its
    /// host to call `fire()` again after a service pass, so timers keep
    /// firing even when the host has no other events pending. The 16ms
    /// default approximates a 60Hz pump.
    ///
    /// 主线程调度器在一次服务遍后请求宿主再次调用 `fire()` 的基线间隔，
    /// 使得即便宿主没有其他待处理事件，定时器也能持续触发。
    /// 默认值16ms近似于60Hz的泵频率。
    pub rearm_interval: Duration,

    /// Whether this scheduler wraps the designated primary/UI thread.
    /// Only a primary scheduler requests the baseline re-arm above.
    ///
    /// 该调度器是否包装指定的主/UI线程。只有主调度器才会请求上述基线
    /// 重新武装。
    pub primary: bool,
}

/// Shutdown-related parameters.
///
/// 关闭相关参数。
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// How long a thread blocked in `shutdown()` sleeps between polls of
    /// the exit-completed flag while the owning thread drains.
    ///
    /// 在拥有线程排空期间，阻塞于 `shutdown()` 的线程在两次轮询
    /// 退出完成标志之间休眠的时长。
    pub poll_interval: Duration,
}

/// Idle-task-related parameters.
///
/// 空闲任务相关参数。
#[derive(Debug, Clone)]
pub struct IdleConfig {
    /// Whether idle tasks are serviced from a real idle queue, run only
    /// when a service pass finds no due timer. When disabled, the facade
    /// degrades idle tasks to immediate zero-delay tasks.
    ///
    /// 空闲任务是否由真正的空闲队列服务（仅在服务遍未发现到期定时器时
    /// 运行）。禁用时，门面会将空闲任务降级为立即执行的零延迟任务。
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                pass_budget: Duration::from_millis(50),
                max_park: Duration::from_millis(100),
            },
            heartbeat: HeartbeatConfig {
                rearm_interval: Duration::from_millis(16),
                primary: false,
            },
            shutdown: ShutdownConfig {
                poll_interval: Duration::from_millis(1),
            },
            idle: IdleConfig { enabled: false },
        }
    }
}
