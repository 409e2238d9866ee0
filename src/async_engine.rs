//! Async engine wrapper: an engine fed by an SPSC request queue.
//!
//! Pairs a [`MatchingEngine`] with a dedicated consumer thread. The caller
//! keeps the producer side and submits requests with `try_push` semantics;
//! the consumer busy-polls with CPU-pause backoff, taking a cooperative
//! yield as a safety valve after a long run of empty polls.
//!
//! Exactly one producer thread is valid. Requests still queued at shutdown
//! may or may not be processed; shutdown does not drain by contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::{MatchingEngine, OrderRequest};
use crate::spsc::{self, Producer};

/// Default request queue capacity (slots; one is sacrificed).
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;

/// Empty polls between cooperative yields. Steady-state polling uses only
/// CPU-pause hints; an OS yield this rare bounds worst-case wakeup jitter
/// without showing up in the latency distribution.
const YIELD_INTERVAL: u32 = 100_000;

/// Handle to an engine running on its own consumer thread.
pub struct AsyncEngine {
    tx: Producer<OrderRequest>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<MatchingEngine>>,
}

impl AsyncEngine {
    /// Launch the consumer thread and take ownership of `engine` for the
    /// duration of the run.
    ///
    /// `queue_capacity` must be a power of two. With `pin_consumer` the
    /// thread is pinned to the last available core.
    pub fn start(engine: MatchingEngine, queue_capacity: usize, pin_consumer: bool) -> Self {
        let (tx, mut rx) = spsc::ring_buffer::<OrderRequest>(queue_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let worker = thread::Builder::new()
            .name("matching-engine".into())
            .spawn(move || {
                if pin_consumer {
                    pin_to_last_core();
                }

                let mut engine = engine;
                let mut idle_polls: u32 = 0;

                while flag.load(Ordering::Acquire) {
                    match rx.try_pop() {
                        Some(request) => {
                            idle_polls = 0;
                            engine.process_request(&request);
                        }
                        None => {
                            idle_polls = idle_polls.wrapping_add(1);
                            if idle_polls % YIELD_INTERVAL == 0 {
                                thread::yield_now();
                            } else {
                                std::hint::spin_loop();
                            }
                        }
                    }
                }

                engine
            })
            .expect("failed to spawn engine thread");

        Self {
            tx,
            running,
            worker: Some(worker),
        }
    }

    /// Launch with the default queue capacity and no pinning.
    pub fn with_defaults(engine: MatchingEngine) -> Self {
        Self::start(engine, DEFAULT_QUEUE_CAPACITY, false)
    }

    /// Enqueue a request. Returns `false` without side effects when the
    /// queue is full.
    #[inline]
    pub fn submit(&mut self, request: OrderRequest) -> bool {
        self.tx.try_push(request).is_ok()
    }

    /// Requests currently waiting in the queue (approximate).
    #[inline]
    pub fn queue_len(&self) -> usize {
        self.tx.len()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal shutdown, join the consumer, and hand the engine back.
    pub fn stop(mut self) -> MatchingEngine {
        self.running.store(false, Ordering::Release);
        self.worker
            .take()
            .expect("consumer already joined")
            .join()
            .expect("engine thread panicked")
    }
}

impl Drop for AsyncEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.running.store(false, Ordering::Release);
            let _ = worker.join();
        }
    }
}

/// Pin the current thread to the last available core; typically the one
/// kept clear of OS interrupt load.
fn pin_to_last_core() {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last) = core_ids.last() {
            core_affinity::set_for_current(*last);
        }
    }
}
