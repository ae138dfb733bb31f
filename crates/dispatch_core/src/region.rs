//! Region: a capacity-bounded booking domain.
//!
//! A region admits a passenger immediately while it has a free slot, parks
//! them in an overflow queue while at capacity, and rejects them once it has
//! stopped accepting work. Admitted bookings run on the region's own bounded
//! pool of worker threads; the overflow queue is drained reactively whenever
//! a slot frees up, not by polling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use parking_lot::{Condvar, Mutex};

use crate::agents::Passenger;
use crate::booking::{Booking, BookingHandle, BookingResult};
use crate::dispatch::DispatchContext;

/// Outcome of one admission decision, made synchronously at call time.
#[derive(Debug)]
pub enum Admission {
    /// Admitted: the handle resolves when the trip completes.
    Admitted(BookingHandle),
    /// At capacity: the passenger waits in the overflow queue and is retried
    /// later, not by the original caller. No handle.
    Queued,
    /// The region is no longer accepting work. No handle.
    Rejected,
}

pub struct Region {
    core: Arc<RegionCore>,
    workers: Vec<thread::JoinHandle<()>>,
    drain: Option<thread::JoinHandle<()>>,
}

impl Region {
    pub(crate) fn new(name: impl Into<String>, max_jobs: usize, ctx: Arc<DispatchContext>) -> Self {
        let name = name.into();
        let max_jobs = max_jobs.max(1);
        let core = Arc::new(RegionCore {
            name: name.clone(),
            max_jobs,
            active: AtomicUsize::new(0),
            accepting: AtomicBool::new(true),
            ctx,
            jobs: JobQueue::new(),
            overflow: Mutex::new(VecDeque::new()),
            drain_wake: Condvar::new(),
        });

        let workers = (0..max_jobs)
            .map(|i| {
                let core = Arc::clone(&core);
                thread::Builder::new()
                    .name(format!("{name}-worker-{i}"))
                    .spawn(move || worker_loop(core))
                    .expect("failed to spawn region worker")
            })
            .collect();

        let drain = {
            let core = Arc::clone(&core);
            thread::Builder::new()
                .name(format!("{name}-drain"))
                .spawn(move || drain_loop(core))
                .expect("failed to spawn region drain thread")
        };

        Self {
            core,
            workers,
            drain: Some(drain),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn max_jobs(&self) -> usize {
        self.core.max_jobs
    }

    /// Bookings currently occupying one of the region's execution slots.
    pub fn active_count(&self) -> usize {
        self.core.active.load(Ordering::SeqCst)
    }

    /// Passengers parked while the region was at capacity.
    pub fn queued_count(&self) -> usize {
        self.core.overflow.lock().len()
    }

    pub fn is_accepting(&self) -> bool {
        self.core.accepting.load(Ordering::SeqCst)
    }

    pub(crate) fn book_passenger(&self, passenger: Passenger) -> Admission {
        self.core.book_passenger(passenger)
    }

    /// Stops admission: already-admitted bookings run to completion, queued
    /// overflow passengers are discarded (and their pending units given
    /// back). Idempotent.
    pub(crate) fn shutdown(&self) {
        if self.core.accepting.swap(false, Ordering::SeqCst) {
            self.core.jobs.close();
            let discarded: Vec<Passenger> = self.core.overflow.lock().drain(..).collect();
            for passenger in discarded {
                self.core.ctx.booking_discarded();
                self.core.ctx.log.event(
                    None,
                    &format!(
                        "queued passenger {passenger} discarded at shutdown of region {}",
                        self.core.name
                    ),
                );
            }
        }
        // Same locking rule as release_slot: the drain checks `accepting`
        // under the overflow lock, so the wake must not race that check.
        let _overflow = self.core.overflow.lock();
        self.core.drain_wake.notify_all();
    }

    /// Joins the region's threads. Only safe after `shutdown` plus a closed
    /// driver pool, otherwise a worker may still be blocked waiting for a
    /// driver.
    pub(crate) fn join(&mut self) {
        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

struct RegionCore {
    name: String,
    max_jobs: usize,
    active: AtomicUsize,
    accepting: AtomicBool,
    ctx: Arc<DispatchContext>,
    jobs: JobQueue,
    overflow: Mutex<VecDeque<Passenger>>,
    drain_wake: Condvar,
}

impl RegionCore {
    fn book_passenger(self: &Arc<Self>, passenger: Passenger) -> Admission {
        if !self.accepting.load(Ordering::SeqCst) {
            self.ctx.log.event(
                None,
                &format!("booking for {passenger} rejected by region {}", self.name),
            );
            return Admission::Rejected;
        }

        if self.try_reserve_slot() {
            let ticket = SlotTicket {
                core: Arc::clone(self),
            };
            let booking = Booking::new(self.ctx.next_booking_id(), passenger);
            self.ctx.log.event(
                Some(&booking),
                &format!("booking accepted in region {}", self.name),
            );
            let (outcome, handle) = BookingHandle::channel(booking.id());
            match self.jobs.push(Job {
                booking,
                outcome,
                ticket,
            }) {
                Ok(()) => Admission::Admitted(handle),
                Err(job) => {
                    // Shutdown raced the admission; the dropped ticket
                    // releases the slot.
                    self.ctx.log.event(
                        Some(&job.booking),
                        &format!("booking rejected, region {} shutting down", self.name),
                    );
                    Admission::Rejected
                }
            }
        } else {
            let mut overflow = self.overflow.lock();
            overflow.push_back(passenger);
            if !self.accepting.load(Ordering::SeqCst) {
                // Shutdown raced the enqueue; take it straight back out.
                let passenger = overflow.pop_back();
                drop(overflow);
                if let Some(passenger) = passenger {
                    self.ctx.log.event(
                        None,
                        &format!("booking for {passenger} rejected by region {}", self.name),
                    );
                }
                return Admission::Rejected;
            }
            self.drain_wake.notify_one();
            drop(overflow);
            Admission::Queued
        }
    }

    /// Single-step slot reservation: increments `active` only while it is
    /// below `max_jobs`.
    fn try_reserve_slot(&self) -> bool {
        let mut current = self.active.load(Ordering::SeqCst);
        loop {
            if current >= self.max_jobs {
                return false;
            }
            match self.active.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn release_slot(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        // Notify under the overflow lock: the drain loop's wake condition
        // reads `active`, which is not itself protected by that lock, so an
        // unlocked notify could slip between its check and its wait.
        let _overflow = self.overflow.lock();
        self.drain_wake.notify_one();
    }
}

/// One admitted booking travelling to a worker thread.
struct Job {
    booking: Booking,
    outcome: mpsc::Sender<BookingResult>,
    ticket: SlotTicket,
}

/// RAII slot reservation: dropping it releases the slot and wakes the drain
/// loop, whichever way the booking ended.
struct SlotTicket {
    core: Arc<RegionCore>,
}

impl Drop for SlotTicket {
    fn drop(&mut self) {
        self.core.release_slot();
    }
}

fn worker_loop(core: Arc<RegionCore>) {
    while let Some(job) = core.jobs.pop_or_closed() {
        let Job {
            booking,
            outcome,
            ticket,
        } = job;
        if let Some(result) = booking.execute(&core.ctx) {
            // The caller may have dropped the handle; the result is already
            // in the event log.
            let _ = outcome.send(result);
        }
        drop(ticket);
    }
}

/// Reactive overflow drain: woken by slot releases, overflow pushes, and
/// shutdown; re-enters the normal admission path for one passenger at a
/// time. Queued passengers never had a handle, so the re-admission handle is
/// dropped and completions surface through the event log.
fn drain_loop(core: Arc<RegionCore>) {
    loop {
        let mut overflow = core.overflow.lock();
        loop {
            if !core.accepting.load(Ordering::SeqCst) {
                return;
            }
            if !overflow.is_empty() && core.active.load(Ordering::SeqCst) < core.max_jobs {
                break;
            }
            core.drain_wake.wait(&mut overflow);
        }
        let passenger = overflow.pop_front();
        drop(overflow);

        let Some(passenger) = passenger else { continue };
        match core.book_passenger(passenger) {
            Admission::Admitted(_handle) => {}
            Admission::Queued => {}
            Admission::Rejected => core.ctx.booking_discarded(),
        }
    }
}

/// Closeable blocking queue feeding the region's workers. Closing stops
/// submissions; already-queued jobs are still handed out before consumers
/// see the end of the queue.
struct JobQueue {
    state: Mutex<JobQueueState>,
    available: Condvar,
}

struct JobQueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

impl JobQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(JobQueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn push(&self, job: Job) -> Result<(), Job> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(job);
        }
        state.jobs.push_back(job);
        self.available.notify_one();
        Ok(())
    }

    fn pop_or_closed(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }
}
