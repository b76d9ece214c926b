//! 调度器线程生命周期测试：启动握手、排空关闭与两种构造模式。
//! Scheduler thread lifecycle tests: startup handshake, draining shutdown
//! and both construction modes.

use kestrel_sched::config::Config;
use kestrel_sched::location;
use kestrel_sched::thread::{SchedulerThread, start_scheduler_thread};
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

/// Helper to initialize tracing for tests.
fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .init();
    });
}

#[test]
fn test_spawn_handshake_returns_a_live_scheduler() {
    init_tracing();

    // start_scheduler_thread blocks until the loop thread reports itself
    // initialized, so the handle is usable immediately.
    // start_scheduler_thread 阻塞到循环线程报告自身已初始化，因此句柄
    // 立即可用。
    let scheduler = start_scheduler_thread(Config::default()).unwrap();
    let handle = scheduler.handle();
    assert!(!handle.is_closed());

    scheduler.shutdown().unwrap();
    assert!(handle.is_closed());
}

#[test]
fn test_shutdown_waits_for_the_full_drain() {
    init_tracing();

    let scheduler = start_scheduler_thread(Config::default()).unwrap();
    let handle = scheduler.handle();
    let counter = Arc::new(AtomicU64::new(0));

    for _ in 0..20 {
        let counter = counter.clone();
        handle.post_task(location!(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    scheduler.shutdown().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 20);
    assert!(handle.is_closed());
}

#[test]
fn test_dropping_the_scheduler_shuts_it_down() {
    init_tracing();

    let scheduler = start_scheduler_thread(Config::default()).unwrap();
    let handle = scheduler.handle();
    let counter = Arc::new(AtomicU64::new(0));

    let counter_task = counter.clone();
    handle.post_task(location!(), move || {
        counter_task.fetch_add(1, Ordering::SeqCst);
    });

    drop(scheduler);

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(handle.is_closed());
}

#[test]
fn test_current_thread_scheduler_wraps_in_place() {
    init_tracing();

    // The primary-thread construction spawns nothing and needs no
    // handshake; the embedder's own loop drives fire().
    // 主线程构造不派生任何线程也不需要握手；嵌入方自己的循环驱动
    // fire()。
    let (mut thread, handle) = SchedulerThread::current_thread(Config::default());
    let counter = Arc::new(AtomicU64::new(0));

    let counter_task = counter.clone();
    thread.post_task(location!(), move || {
        counter_task.fetch_add(1, Ordering::SeqCst);
    });
    thread.fire();
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    thread.shutdown();
    assert!(handle.is_closed());
}
