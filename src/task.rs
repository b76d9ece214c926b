//! 任务模型：可调用体、优先级类别与提交位置。
//! Task model: callables, priority classes and submission locations.

use std::fmt;

/// A one-shot task callable.
/// 一次性任务可调用体。
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// A repeating task callable, invoked once per firing.
/// 重复任务可调用体，每次触发调用一次。
pub type RepeatingTaskFn = Box<dyn FnMut() + Send + 'static>;

/// The task attached to a timer entry. Owned exclusively by the entry
/// and executed on the owning thread only.
///
/// 附着在定时器条目上的任务。由条目独占拥有，仅在拥有线程上执行。
pub enum Task {
    /// Runs exactly once, then the entry is released.
    /// 恰好运行一次，随后条目被释放。
    Once(Option<TaskFn>),
    /// Runs every time the entry fires; the entry is re-armed afterwards.
    /// 条目每次触发时运行；之后条目被重新武装。
    Repeating(RepeatingTaskFn),
}

impl Task {
    /// Wraps a one-shot closure.
    /// 包装一次性闭包。
    pub fn once<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::Once(Some(Box::new(f)))
    }

    /// Wraps a repeating closure.
    /// 包装重复闭包。
    pub fn repeating<F>(f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::Repeating(Box::new(f))
    }

    /// A task that does nothing when run. Used to order bookkeeping
    /// updates (such as observer registration) behind already-queued work.
    /// 运行时什么都不做的任务。用于让簿记更新（例如观察者注册）排在
    /// 已排队工作之后。
    pub fn no_op() -> Self {
        Self::once(|| {})
    }

    /// Executes the task once. A `Once` task that has already run is a
    /// no-op on subsequent calls.
    /// 执行一次任务。已经运行过的 `Once` 任务在后续调用中为空操作。
    pub fn run(&mut self) {
        match self {
            Self::Once(f) => {
                if let Some(f) = f.take() {
                    f();
                }
            }
            Self::Repeating(f) => f(),
        }
    }

    /// Whether this task may run more than once.
    /// 该任务是否可以运行多次。
    pub fn is_repeating(&self) -> bool {
        matches!(self, Self::Repeating(_))
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once(_) => f.debug_tuple("Once").field(&"<closure>").finish(),
            Self::Repeating(_) => f.debug_tuple("Repeating").field(&"<closure>").finish(),
        }
    }
}

/// The priority class carried on a task submission.
///
/// Two classes are built in: the default class used by ordinary and
/// delayed posts, and a lower-urgency class for loading work. Callers
/// may define further classes. The value is advisory metadata on the
/// entry: the timer heap orders strictly by fire time and insertion
/// order and never consults it. Lower values denote higher precedence
/// in orderings that do consult it.
///
/// 任务提交时携带的优先级类别。
///
/// 内置两个类别：普通及延迟提交使用的默认类别，以及用于加载工作的
/// 低紧迫度类别。调用方可以定义更多类别。该值只是条目上的建议性元数据：
/// 定时器堆严格按触发时间和插入序排序，从不查询它。在会查询它的排序中，
/// 数值越低优先级越高。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskPriority(i32);

impl TaskPriority {
    /// The default, higher-urgency class.
    /// 默认的高紧迫度类别。
    pub const NORMAL: Self = Self(0);

    /// The lower-urgency class assigned to loading tasks.
    /// 分配给加载任务的低紧迫度类别。
    pub const LOADING: Self = Self(10);

    /// A caller-defined class.
    /// 调用方自定义的类别。
    pub const fn custom(value: i32) -> Self {
        Self(value)
    }

    /// The raw class value.
    /// 原始类别值。
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// The source location a task was posted from, carried for tracing.
/// 任务提交处的源位置，用于追踪。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLocation {
    /// Source file of the post call.
    /// 提交调用所在的源文件。
    pub file: &'static str,
    /// Source line of the post call.
    /// 提交调用所在的源代码行。
    pub line: u32,
}

impl TraceLocation {
    /// Creates a location from its parts. Usually written via
    /// [`location!`](crate::location).
    /// 由组成部分创建位置。通常通过 [`location!`](crate::location) 书写。
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for TraceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Captures the caller's source location as a [`TraceLocation`].
/// 将调用者的源位置捕获为 [`TraceLocation`]。
#[macro_export]
macro_rules! location {
    () => {
        $crate::task::TraceLocation::new(file!(), line!())
    };
}
