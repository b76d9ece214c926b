//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the scheduler library.
/// 调度器库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred, e.g. while spawning the
    /// scheduler's OS thread.
    /// 发生了底层的I/O错误，例如在派生调度器的OS线程时。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scheduler thread has already completed its exit drain and
    /// closed; the requested operation can no longer be carried out.
    /// 调度器线程已经完成退出排空并关闭；请求的操作无法再执行。
    #[error("Scheduler thread is closed")]
    SchedulerClosed,

    /// The scheduler's OS thread panicked before it could be joined.
    /// 调度器的OS线程在被join之前发生了panic。
    #[error("Scheduler thread panicked")]
    ThreadPanicked,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
