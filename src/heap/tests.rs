//! 定时器堆单元测试
//! Timer heap unit tests

use crate::heap::core::TimerHeap;
use crate::heap::entry::{TimerEntryId, order_precedes};
use crate::location;
use crate::task::{Task, TaskPriority};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn schedule_at(heap: &mut TimerHeap, fire_time: Instant, order: u64) -> TimerEntryId {
    heap.schedule(
        fire_time,
        order,
        TaskPriority::NORMAL,
        None,
        Task::no_op(),
        location!(),
    )
}

#[test]
fn pop_due_returns_earliest_fire_time_first() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();

    let late = schedule_at(&mut heap, base + Duration::from_millis(30), 0);
    let early = schedule_at(&mut heap, base + Duration::from_millis(10), 1);
    let middle = schedule_at(&mut heap, base + Duration::from_millis(20), 2);

    let far = base + Duration::from_secs(1);
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(early));
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(middle));
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(late));
    assert!(heap.pop_due(far, false).is_none());
}

#[test]
fn equal_fire_times_pop_in_insertion_order() {
    let base = Instant::now();
    let fire = base + Duration::from_millis(5);
    let mut heap = TimerHeap::new();

    let ids: Vec<_> = (0u64..8)
        .map(|order| schedule_at(&mut heap, fire, order))
        .collect();

    let far = base + Duration::from_secs(1);
    for expected in ids {
        assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(expected));
    }
}

#[test]
fn insertion_order_comparison_survives_counter_wraparound() {
    assert!(order_precedes(u64::MAX - 1, u64::MAX));
    assert!(order_precedes(u64::MAX, 0));
    assert!(order_precedes(u64::MAX, 3));
    assert!(!order_precedes(3, u64::MAX));
    assert!(!order_precedes(5, 5));

    // A heap populated across the wraparound point still pops in stamp order.
    // 跨回绕点填充的堆仍按戳序弹出。
    let base = Instant::now();
    let fire = base + Duration::from_millis(5);
    let mut heap = TimerHeap::new();
    let stamps = [u64::MAX - 1, u64::MAX, 0, 1];
    let ids: Vec<_> = stamps
        .iter()
        .map(|stamp| schedule_at(&mut heap, fire, *stamp))
        .collect();

    let far = base + Duration::from_secs(1);
    for expected in ids {
        assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(expected));
    }
}

#[test]
fn pop_due_respects_deadline() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();
    schedule_at(&mut heap, base + Duration::from_millis(50), 0);

    assert!(heap.pop_due(base + Duration::from_millis(10), false).is_none());
    assert!(heap.pop_due(base + Duration::from_millis(50), false).is_some());
}

#[test]
fn fire_all_pops_entries_that_are_not_due() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();
    schedule_at(&mut heap, base + Duration::from_secs(3600), 0);

    assert!(heap.pop_due(base, true).is_some());
    assert!(heap.is_empty());
}

#[test]
fn remove_root_middle_last_and_only() {
    let base = Instant::now();
    let far = base + Duration::from_secs(1);

    // Root removal.
    // 删除根。
    let mut heap = TimerHeap::new();
    let ids: Vec<_> = (0u64..5)
        .map(|i| schedule_at(&mut heap, base + Duration::from_millis(10 * (i + 1)), i))
        .collect();
    assert!(heap.remove(ids[0]).is_some());
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(ids[1]));

    // Middle removal keeps remaining order intact.
    // 删除中间元素后剩余顺序保持不变。
    assert!(heap.remove(ids[3]).is_some());
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(ids[2]));
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(ids[4]));
    assert!(heap.is_empty());

    // Only-element removal.
    // 删除唯一元素。
    let only = schedule_at(&mut heap, base + Duration::from_millis(10), 100);
    assert!(heap.remove(only).is_some());
    assert!(heap.is_empty());
}

#[test]
fn remove_is_idempotent() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();
    let id = schedule_at(&mut heap, base + Duration::from_millis(10), 0);

    assert!(heap.remove(id).is_some());
    assert!(heap.remove(id).is_none());
    assert!(heap.remove(9999).is_none());
}

#[test]
fn reschedule_moves_entry_and_fast_paths_unchanged_time() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();
    let a = schedule_at(&mut heap, base + Duration::from_millis(10), 0);
    let b = schedule_at(&mut heap, base + Duration::from_millis(20), 1);

    // Unchanged time is accepted without repositioning.
    // 时间未变时直接接受，不做重定位。
    assert!(heap.reschedule(a, base + Duration::from_millis(10)));
    assert_eq!(heap.peek_deadline(), Some(base + Duration::from_millis(10)));

    // Move the root later: the other entry becomes the root.
    // 将根移后：另一条目成为根。
    assert!(heap.reschedule(a, base + Duration::from_millis(30)));
    let far = base + Duration::from_secs(1);
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(b));
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(a));

    assert!(!heap.reschedule(a, base));
}

#[test]
fn priority_does_not_affect_heap_order() {
    let base = Instant::now();
    let fire = base + Duration::from_millis(5);
    let mut heap = TimerHeap::new();

    let loading = heap.schedule(
        fire,
        0,
        TaskPriority::LOADING,
        None,
        Task::no_op(),
        location!(),
    );
    let normal = heap.schedule(
        fire,
        1,
        TaskPriority::NORMAL,
        None,
        Task::no_op(),
        location!(),
    );

    // Despite the higher-urgency class, the later stamp pops second.
    // 尽管类别紧迫度更高，较晚的戳仍然第二个弹出。
    let far = base + Duration::from_secs(1);
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(loading));
    assert_eq!(heap.pop_due(far, false).map(|e| e.id()), Some(normal));
}

#[test]
fn peek_deadline_tracks_root() {
    let base = Instant::now();
    let mut heap = TimerHeap::new();
    assert!(heap.peek_deadline().is_none());

    schedule_at(&mut heap, base + Duration::from_millis(20), 0);
    let early = schedule_at(&mut heap, base + Duration::from_millis(10), 1);
    assert_eq!(heap.peek_deadline(), Some(base + Duration::from_millis(10)));

    heap.remove(early);
    assert_eq!(heap.peek_deadline(), Some(base + Duration::from_millis(20)));
}

proptest! {
    /// For all insert/remove sequences, draining the heap yields entries
    /// sorted by (fire time, insertion order).
    /// 对任意插入/删除序列，排空堆得到的条目按（触发时间, 插入序）排序。
    #[test]
    fn drain_is_sorted_after_random_inserts_and_removals(
        delays in proptest::collection::vec(0u64..50, 1..64),
        removals in proptest::collection::vec(any::<usize>(), 0..16),
    ) {
        let base = Instant::now();
        let mut heap = TimerHeap::new();
        let mut model: Vec<(Instant, u64, TimerEntryId)> = Vec::new();

        for (order, delay) in delays.iter().enumerate() {
            let fire_time = base + Duration::from_millis(*delay);
            let id = heap.schedule(
                fire_time,
                order as u64,
                TaskPriority::NORMAL,
                None,
                Task::no_op(),
                location!(),
            );
            model.push((fire_time, order as u64, id));
        }

        for pick in removals {
            if model.is_empty() {
                break;
            }
            let (_, _, id) = model.remove(pick % model.len());
            prop_assert!(heap.remove(id).is_some());
        }

        model.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        let far = base + Duration::from_secs(3600);
        for (fire_time, order, id) in model {
            let entry = heap.pop_due(far, false);
            prop_assert!(entry.is_some());
            if let Some(entry) = entry {
                prop_assert_eq!(entry.id(), id);
                prop_assert_eq!(entry.fire_time(), Some(fire_time));
                prop_assert_eq!(entry.insertion_order(), order);
            }
        }
        prop_assert!(heap.is_empty());
    }
}
