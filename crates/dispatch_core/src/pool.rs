//! Shared idle-driver pool: a bounded, closeable, blocking MPMC queue.
//!
//! One pool is owned per dispatch instance and injected into every region,
//! so independent dispatch instances coexist in one process. Hand-out order
//! is first-come-first-served across all regions; there is no locality
//! preference.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::agents::Driver;

/// Idle drivers one dispatch instance can hold. Generous enough to be
/// effectively unbounded for realistic fleet sizes.
pub const DEFAULT_MAX_IDLE_DRIVERS: usize = 999;

pub struct DriverPool {
    state: Mutex<PoolState>,
    available: Condvar,
    capacity: usize,
}

#[derive(Debug)]
struct PoolState {
    idle: VecDeque<Driver>,
    closed: bool,
}

impl DriverPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Makes a driver available to any region. Non-blocking: the driver is
    /// handed back when the pool is full or already closed, and the caller
    /// may retry.
    pub fn offer(&self, driver: Driver) -> Result<(), Driver> {
        let mut state = self.state.lock();
        if state.closed || state.idle.len() >= self.capacity {
            return Err(driver);
        }
        state.idle.push_back(driver);
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until a driver is idle and removes it from the pool. The driver
    /// is invisible to every other consumer until offered back. Returns `None`
    /// only once the pool has been closed and drained.
    pub fn take(&self) -> Option<Driver> {
        let mut state = self.state.lock();
        loop {
            if let Some(driver) = state.idle.pop_front() {
                return Some(driver);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Wakes every blocked taker; subsequent offers are refused. Remaining
    /// idle drivers are still handed out before takers see `None`.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn driver(id: u64) -> Driver {
        Driver::new(id, format!("driver-{id}"), Duration::ZERO)
    }

    #[test]
    fn offer_fails_when_full() {
        let pool = DriverPool::new(2);
        assert!(pool.offer(driver(1)).is_ok());
        assert!(pool.offer(driver(2)).is_ok());
        let refused = pool.offer(driver(3));
        assert_eq!(refused.expect_err("pool should be full").id, 3);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn take_blocks_until_a_driver_is_offered() {
        let pool = Arc::new(DriverPool::new(8));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let pool_clone = Arc::clone(&pool);
        let handle = thread::spawn(move || {
            ready_tx.send(()).expect("send ready");
            let taken = pool_clone.take().expect("pool closed unexpectedly");
            done_tx.send(taken.id).expect("send taken id");
        });

        ready_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("taker ready");
        pool.offer(driver(42)).expect("offer");

        let id = done_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("taker woke");
        assert_eq!(id, 42);
        handle.join().expect("taker thread panicked");
    }

    #[test]
    fn concurrent_takers_each_get_a_unique_driver() {
        let pool = Arc::new(DriverPool::new(16));
        let takers = 4;
        let (done_tx, done_rx) = mpsc::channel();

        let mut handles = Vec::new();
        for _ in 0..takers {
            let pool = Arc::clone(&pool);
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                let taken = pool.take().expect("pool closed unexpectedly");
                done_tx.send(taken.id).expect("send id");
            }));
        }

        for id in 0..takers as u64 {
            pool.offer(driver(id)).expect("offer");
        }

        let mut seen = HashSet::new();
        for _ in 0..takers {
            let id = done_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("taker finished");
            assert!(seen.insert(id), "driver {id} handed out twice");
        }
        for handle in handles {
            handle.join().expect("taker thread panicked");
        }
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn close_unblocks_takers_and_refuses_offers() {
        let pool = Arc::new(DriverPool::new(8));
        let (done_tx, done_rx) = mpsc::channel();

        let pool_clone = Arc::clone(&pool);
        let handle = thread::spawn(move || {
            done_tx.send(pool_clone.take().is_none()).expect("send");
        });

        // Give the taker a moment to block before closing.
        thread::sleep(Duration::from_millis(20));
        pool.close();

        let saw_closed = done_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("taker returned");
        assert!(saw_closed);
        assert!(pool.offer(driver(1)).is_err());
        handle.join().expect("taker thread panicked");
    }

    #[test]
    fn close_drains_remaining_idle_drivers_first() {
        let pool = DriverPool::new(8);
        pool.offer(driver(5)).expect("offer");
        pool.close();
        assert_eq!(pool.take().expect("remaining driver").id, 5);
        assert!(pool.take().is_none());
    }
}
