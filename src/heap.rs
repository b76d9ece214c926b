//! 定时器堆模块
//! Timer heap module
//!
//! 该模块实现了调度器线程独占拥有的可变优先级二叉最小堆，按
//! (触发时间, 插入序) 排序，支持任意位置的删除与重定位。
//!
//! This module implements the mutable-priority binary min-heap exclusively
//! owned by a scheduler thread, ordered by (fire time, insertion order),
//! with arbitrary-position removal and repositioning.

pub mod core;
pub mod entry;
pub mod stats;

#[cfg(test)]
mod tests;

pub use self::core::TimerHeap;
pub use self::entry::{TimerEntry, TimerEntryId};
pub use self::stats::TimerHeapStats;
