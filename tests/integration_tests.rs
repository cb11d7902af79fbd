//! End-to-end scenarios S1-S6, driven against the public crate surface only.

use avcore::{
    CommandFifo, CommandKind, CommandPool, FifoError, PoolConfig, RingConfig, RingMode,
    WaitableFifo,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn enabled_fifo<T>(config: RingConfig) -> WaitableFifo<T> {
    let fifo = WaitableFifo::new(config, true, 0);
    fifo.set_flow_enabled(true);
    fifo
}

#[test]
fn s1_spsc_round_trip_of_100_items() {
    let fifo: Arc<WaitableFifo<i32>> = Arc::new(enabled_fifo(RingConfig::new(10, RingMode::Spsc)));

    let producer_fifo = Arc::clone(&fifo);
    let producer = thread::spawn(move || {
        for i in 0..100 {
            producer_fifo.wait_write_space().unwrap();
            producer_fifo.write(i).unwrap();
        }
    });

    let mut received = Vec::with_capacity(100);
    for _ in 0..100 {
        fifo.wait_read_data().unwrap();
        received.push(fifo.read().unwrap());
    }
    producer.join().unwrap();

    assert_eq!(received, (0..100).collect::<Vec<_>>());
    assert_eq!(fifo.stored_count(), 0);
    assert!(fifo.has_been_read());
}

#[test]
fn s2_backpressure_blocks_producer_exactly_once() {
    let fifo: Arc<WaitableFifo<i32>> = Arc::new(enabled_fifo(RingConfig::new(2, RingMode::Spsc)));
    fifo.wait_write_space().unwrap();
    fifo.write(1).unwrap();
    fifo.wait_write_space().unwrap();
    fifo.write(2).unwrap();

    let third_fifo = Arc::clone(&fifo);
    let third_push = thread::spawn(move || {
        let start = Instant::now();
        third_fifo.wait_write_space().unwrap();
        third_fifo.write(3).unwrap();
        start.elapsed()
    });

    thread::sleep(Duration::from_millis(60));
    assert!(!third_push.is_finished(), "third push should still be blocked");

    let unblock_start = Instant::now();
    assert_eq!(fifo.read(), Some(1));
    let elapsed = third_push.join().unwrap();

    assert!(elapsed >= Duration::from_millis(50));
    assert!(unblock_start.elapsed() < Duration::from_millis(10) + Duration::from_millis(50));
    assert_eq!(fifo.stored_count(), 2);
}

#[test]
fn s3_eos_sentinel_drains_a_paused_consumer() {
    let fifo = CommandFifo::new(RingConfig::new(4, RingMode::Mpmc));
    let pool = CommandPool::new(PoolConfig::new(4, 0));

    let frame = pool.acquire().unwrap();
    frame.init(CommandKind::Frame);
    fifo.write(frame).unwrap();

    let eos = pool.acquire().unwrap();
    eos.init(CommandKind::EndOfStream);
    fifo.write(eos).unwrap();

    fifo.set_flow_enabled(false);

    let first = fifo.read().expect("frame command should still be readable");
    assert!(first.is_media());
    assert_eq!(first.kind(), CommandKind::Frame);
    drop(first);

    let second = fifo.read().expect("sentinel command should still be readable");
    assert!(second.is_sentinel());
    assert_eq!(second.kind(), CommandKind::EndOfStream);
    drop(second);

    assert_eq!(pool.in_use_count(), 0);
}

#[test]
fn s4_flow_disable_unblocks_a_full_ring_writer() {
    let fifo: Arc<WaitableFifo<i32>> = Arc::new(enabled_fifo(RingConfig::new(1, RingMode::Spsc)));
    fifo.wait_write_space().unwrap();
    fifo.write(1).unwrap();

    let blocked_fifo = Arc::clone(&fifo);
    let blocked = thread::spawn(move || {
        let start = Instant::now();
        let result = blocked_fifo.wait_write_space();
        (result, start.elapsed())
    });

    thread::sleep(Duration::from_millis(20));
    fifo.set_flow_enabled(false);

    let (result, elapsed) = blocked.join().unwrap();
    assert_eq!(result, Err(FifoError::FlowDisabled));
    assert!(elapsed < Duration::from_millis(10) + Duration::from_millis(50));
    assert_eq!(fifo.read(), Some(1));
}

#[test]
fn s5_pool_cap_returns_null_not_blocks() {
    let pool = CommandPool::new(PoolConfig::new(2, 2));
    let first = pool.acquire();
    let second = pool.acquire();
    assert!(first.is_some());
    assert!(second.is_some());
    assert!(pool.acquire().is_none(), "pool at max_size should return None");
    assert_eq!(pool.total_count(), 2);

    drop(first);
    let fourth = pool.acquire();
    assert!(fourth.is_some());
    assert_eq!(pool.total_count(), 2);
}

#[test]
fn s6_preempt_places_at_head() {
    let fifo = enabled_fifo::<char>(RingConfig::new(5, RingMode::Mpmc));
    fifo.write('a').unwrap();
    fifo.write('b').unwrap();
    fifo.write('c').unwrap();
    fifo.preempt('z').unwrap();

    assert_eq!(fifo.read(), Some('z'));
    assert_eq!(fifo.read(), Some('a'));
    assert_eq!(fifo.read(), Some('b'));
    assert_eq!(fifo.read(), Some('c'));
}
