//! 定时器堆核心实现
//! Timer heap core implementation
//!
//! 标准库的 `BinaryHeap` 不支持任意条目的 O(log n) 删除（定时器可能在
//! 到期前被停止），因此这里手工维护一个带回指索引的堆：条目存放在按ID
//! 索引的竞技场中，堆向量只保存ID，每个条目内嵌自己当前的堆槽位。
//!
//! The standard library's `BinaryHeap` cannot remove an arbitrary entry in
//! O(log n) (a timer may be stopped before it is due), so the heap is
//! maintained by hand with back-pointing indices: entries live in an
//! ID-keyed arena, the heap vector holds only IDs, and each entry embeds
//! its current heap slot.

use crate::heap::entry::{TimerEntry, TimerEntryId};
use crate::heap::stats::TimerHeapStats;
use crate::task::{Task, TaskPriority, TraceLocation};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// The mutable-priority timer heap, exclusively owned by one scheduler
/// thread. No lock is needed: only the owning thread ever touches it.
///
/// 可变优先级定时器堆，由一个调度器线程独占拥有。无需加锁：
/// 只有拥有线程会访问它。
#[derive(Debug, Default)]
pub struct TimerHeap {
    /// Entry arena keyed by stable ID.
    /// 以稳定ID为键的条目竞技场。
    entries: HashMap<TimerEntryId, TimerEntry>,
    /// Binary min-heap of entry IDs ordered by (fire time, insertion order).
    /// 按（触发时间, 插入序）排序的条目ID二叉最小堆。
    heap: Vec<TimerEntryId>,
    /// Next entry ID to allocate.
    /// 下一个分配的条目ID。
    next_entry_id: TimerEntryId,
}

impl TimerHeap {
    /// Creates an empty heap.
    /// 创建空堆。
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a new entry and returns its ID.
    /// 调度一个新条目并返回其ID。
    pub fn schedule(
        &mut self,
        fire_time: Instant,
        insertion_order: u64,
        priority: TaskPriority,
        repeat_interval: Option<Duration>,
        task: Task,
        location: TraceLocation,
    ) -> TimerEntryId {
        let id = self.next_entry_id;
        self.next_entry_id += 1;

        let entry = TimerEntry::new(
            id,
            fire_time,
            insertion_order,
            priority,
            repeat_interval,
            task,
            location,
        );
        self.insert_entry(entry);

        trace!(
            entry_id = id,
            insertion_order,
            location = %location,
            "Scheduled timer entry"
        );

        id
    }

    /// Puts a previously popped entry back into the heap, keeping its ID.
    /// Used to re-arm repeating entries after they fire.
    /// 将先前弹出的条目放回堆中，保留其ID。用于在重复条目触发后将其
    /// 重新武装。
    pub(crate) fn reinsert(&mut self, entry: TimerEntry) {
        debug_assert!(
            entry.fire_time().is_some(),
            "reinserted entry must carry a fire time"
        );
        self.insert_entry(entry);
    }

    /// Removes an arbitrary entry by ID. Returns `None` if the entry is
    /// not in the heap, so stopping an already-inactive timer is a no-op.
    /// 按ID删除任意条目。条目不在堆中时返回 `None`，因此停止一个已
    /// 不活跃的定时器是空操作。
    pub fn remove(&mut self, id: TimerEntryId) -> Option<TimerEntry> {
        let index = self.entries.get(&id)?.heap_index()?;
        let entry = self.remove_at(index);
        self.debug_check_consistency();
        trace!(entry_id = id, "Removed timer entry");
        entry
    }

    /// Pops the root entry if it is due at `now`, or unconditionally when
    /// `fire_all` is set (the exit drain treats every entry as due). The
    /// returned entry still carries its scheduled fire time.
    /// 若根条目在 `now` 已到期则弹出它；当设置了 `fire_all` 时无条件弹出
    /// （退出排空将所有条目视为到期）。返回的条目仍携带其计划触发时间。
    pub fn pop_due(&mut self, now: Instant, fire_all: bool) -> Option<TimerEntry> {
        let root = *self.heap.first()?;
        let due = fire_all
            || self
                .entries
                .get(&root)
                .and_then(|entry| entry.fire_time())
                .is_some_and(|fire_time| fire_time <= now);
        if !due {
            return None;
        }

        let entry = self.remove_at(0);
        self.debug_check_consistency();
        entry
    }

    /// Moves an existing entry to a new fire time. Returns false if the
    /// entry is unknown. A reschedule to the unchanged time is a no-op
    /// fast path and does not disturb heap positions.
    /// 将已有条目移动到新的触发时间。条目未知时返回 false。重调度到
    /// 未变化的时间走空操作快速路径，不扰动堆位置。
    pub fn reschedule(&mut self, id: TimerEntryId, fire_time: Instant) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            trace!(entry_id = id, "Timer entry not found for reschedule");
            return false;
        };
        if entry.fire_time() == Some(fire_time) {
            return true;
        }

        // Remove-and-reinsert repositions with the one sift primitive
        // instead of separate decrease/increase paths.
        // 删除后重插用同一套下滤/上滤原语完成重定位，而非维护单独的
        // 增键/减键路径。
        let Some(index) = entry.heap_index() else {
            return false;
        };
        let Some(mut entry) = self.remove_at(index) else {
            return false;
        };
        entry.set_fire_time(fire_time);
        self.insert_entry(entry);
        trace!(entry_id = id, "Rescheduled timer entry");
        true
    }

    /// The earliest pending fire time, if any entry is scheduled.
    /// 最早的待定触发时间（若有条目被调度）。
    pub fn peek_deadline(&self) -> Option<Instant> {
        let root = self.heap.first()?;
        self.entries.get(root)?.fire_time()
    }

    /// Number of scheduled entries.
    /// 已调度条目的数量。
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no entry is scheduled.
    /// 是否没有任何条目被调度。
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every entry. Used by the exit drain once nothing remains to
    /// fire.
    /// 丢弃所有条目。退出排空在没有可触发内容后使用。
    pub fn clear(&mut self) {
        self.heap.clear();
        self.entries.clear();
    }

    /// Heap statistics snapshot.
    /// 堆统计信息快照。
    pub fn stats(&self) -> TimerHeapStats {
        let repeating_timers = self
            .entries
            .values()
            .filter(|entry| entry.is_repeating())
            .count();
        TimerHeapStats {
            total_timers: self.heap.len(),
            repeating_timers,
        }
    }

    fn insert_entry(&mut self, mut entry: TimerEntry) {
        let id = entry.id();
        let index = self.heap.len();
        entry.set_heap_index(Some(index));
        self.heap.push(id);
        self.entries.insert(id, entry);
        self.sift_up(index);
        self.debug_check_consistency();
    }

    /// Removes the entry at a heap position: the last element fills the
    /// vacated slot and is sifted to its correct place. Handles removing
    /// the root, the last element and the only element.
    /// 删除某个堆位置上的条目：最后一个元素填入空出的槽位并被下滤/上滤
    /// 到正确位置。涵盖删除根、删除末尾元素和删除唯一元素的情况。
    fn remove_at(&mut self, index: usize) -> Option<TimerEntry> {
        if index >= self.heap.len() {
            return None;
        }
        let id = self.heap[index];
        let last = self.heap.len() - 1;
        self.heap.swap(index, last);
        self.heap.pop();
        if index < self.heap.len() {
            self.set_slot_index(index);
            let position = self.sift_up(index);
            if position == index {
                self.sift_down(index);
            }
        }

        let mut entry = self.entries.remove(&id)?;
        entry.set_heap_index(None);
        Some(entry)
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.slot_precedes(index, parent) {
                self.swap_slots(index, parent);
                index = parent;
            } else {
                break;
            }
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) -> usize {
        loop {
            let left = 2 * index + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < self.heap.len() && self.slot_precedes(right, left) {
                child = right;
            }
            if self.slot_precedes(child, index) {
                self.swap_slots(child, index);
                index = child;
            } else {
                break;
            }
        }
        index
    }

    fn slot_precedes(&self, a: usize, b: usize) -> bool {
        match (
            self.entries.get(&self.heap[a]),
            self.entries.get(&self.heap[b]),
        ) {
            (Some(x), Some(y)) => x.precedes(y),
            _ => false,
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.set_slot_index(a);
        self.set_slot_index(b);
    }

    fn set_slot_index(&mut self, index: usize) {
        let id = self.heap[index];
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.set_heap_index(Some(index));
        }
    }

    /// Verifies that every entry's embedded index matches its heap slot,
    /// that scheduled and in-heap states coincide, and that the heap
    /// order invariant holds. Compiled out of release builds.
    /// 验证每个条目内嵌的索引与其堆槽位一致、已调度与在堆中两个状态
    /// 重合，以及堆序不变量成立。发布构建中不编译。
    fn debug_check_consistency(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(self.heap.len(), self.entries.len());
            for (index, id) in self.heap.iter().enumerate() {
                let Some(entry) = self.entries.get(id) else {
                    debug_assert!(false, "heap slot {index} holds unknown entry {id}");
                    continue;
                };
                debug_assert_eq!(
                    entry.heap_index(),
                    Some(index),
                    "entry {id} heap index out of sync"
                );
                debug_assert!(
                    entry.fire_time().is_some(),
                    "entry {id} is in the heap without a fire time"
                );
                if index > 0 {
                    let parent = (index - 1) / 2;
                    debug_assert!(
                        !self.slot_precedes(index, parent),
                        "heap order violated between {index} and its parent"
                    );
                }
            }
        }
    }
}
