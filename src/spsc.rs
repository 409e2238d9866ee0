//! Lock-free single-producer / single-consumer ring buffer.
//!
//! The cross-core handoff primitive for the engine: one network/producer
//! thread pushes order requests, one engine thread pops them. Wait-free on
//! both sides.
//!
//! Algorithm: two monotonically advancing indices masked by `capacity - 1`
//! (capacity is a power of two). A slot is occupied for indices in
//! `[head, tail)`; one slot is sacrificed to distinguish full from empty.
//! Each index lives on its own cache line, and each handle keeps a local
//! copy of the opposing index that is refreshed (with an Acquire load)
//! only when the cached value indicates full/empty. In the steady state
//! each core touches only cache lines it owns.
//!
//! Ordering: the slot write is published by the Release store of `tail`
//! and observed through the consumer's Acquire load; symmetrically the
//! consumer's Release store of `head` hands the slot back to the producer.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct RingBuffer<T> {
    /// Slot storage; written by the producer, read by the consumer, with
    /// the head/tail protocol guaranteeing exclusive access per slot.
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,

    mask: usize,

    /// Read position. Owned by the consumer; the producer only loads it.
    head: CachePadded<AtomicUsize>,

    /// Write position. Owned by the producer; the consumer only loads it.
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    #[inline]
    fn increment(&self, index: usize) -> usize {
        (index + 1) & self.mask
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Drain whatever the consumer never observed.
        let mut head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        while head != tail {
            unsafe {
                (*self.slots[head].get()).assume_init_drop();
            }
            head = self.increment(head);
        }
    }
}

/// Producer handle. `Send`, not clonable: exactly one producer exists.
pub struct Producer<T> {
    ring: Arc<RingBuffer<T>>,

    /// Producer-local copy of the consumer's head, refreshed only when
    /// the queue looks full.
    cached_head: usize,
}

/// Consumer handle. `Send`, not clonable: exactly one consumer exists.
pub struct Consumer<T> {
    ring: Arc<RingBuffer<T>>,

    /// Consumer-local copy of the producer's tail, refreshed only when
    /// the queue looks empty.
    cached_tail: usize,
}

/// Create a ring of the given capacity (power of two, at least 2).
///
/// The usable capacity is `capacity - 1`: one slot stays empty to
/// disambiguate full from empty.
///
/// # Panics
/// Panics if `capacity` is not a power of two or is less than 2.
pub fn ring_buffer<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity >= 2, "capacity must be at least 2");
    assert!(capacity.is_power_of_two(), "capacity must be a power of 2");

    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(RingBuffer {
        slots,
        mask: capacity - 1,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
    });

    (
        Producer {
            ring: Arc::clone(&ring),
            cached_head: 0,
        },
        Consumer {
            ring,
            cached_tail: 0,
        },
    )
}

impl<T> Producer<T> {
    /// Push a value, failing without side effects if the ring is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);
        let next_tail = ring.increment(tail);

        if next_tail == self.cached_head {
            // Contested path: re-read the consumer's real position.
            self.cached_head = ring.head.load(Ordering::Acquire);
            if next_tail == self.cached_head {
                return Err(value);
            }
        }

        unsafe {
            (*ring.slots[tail].get()).write(value);
        }

        ring.tail.store(next_tail, Ordering::Release);
        Ok(())
    }

    /// Busy-wait push. Spins with a CPU pause hint until a slot frees up.
    #[inline]
    pub fn push(&mut self, value: T) {
        let mut value = value;
        loop {
            match self.try_push(value) {
                Ok(()) => return,
                Err(v) => {
                    value = v;
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Number of occupied slots. Approximate under concurrent popping.
    #[inline]
    pub fn len(&self) -> usize {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);
        let head = ring.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) & ring.mask
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity (`ring size - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.mask
    }
}

impl<T> Consumer<T> {
    /// Pop the oldest value, or `None` if the ring is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);

        if head == self.cached_tail {
            // Contested path: re-read the producer's real position.
            self.cached_tail = ring.tail.load(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        let value = unsafe { (*ring.slots[head].get()).assume_init_read() };

        ring.head.store(ring.increment(head), Ordering::Release);
        Some(value)
    }

    /// Busy-wait pop. Spins with a CPU pause hint until a value arrives.
    #[inline]
    pub fn pop(&mut self) -> T {
        loop {
            if let Some(value) = self.try_pop() {
                return value;
            }
            std::hint::spin_loop();
        }
    }

    /// Number of occupied slots. Approximate under concurrent pushing.
    #[inline]
    pub fn len(&self) -> usize {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Acquire);
        let head = ring.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) & ring.mask
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity (`ring size - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.mask
    }
}
