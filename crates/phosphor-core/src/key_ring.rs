#![forbid(unsafe_code)]

//! Bounded FIFO of decoded key symbols.
//!
//! The ring keeps one slot unused so that "full" and "empty" can be told
//! apart from the two indices alone: a ring allocated with capacity `n`
//! holds at most `n - 1` symbols.
//!
//! # Invariants
//!
//! | Condition | Meaning |
//! |-----------|---------|
//! | `head == tail` | empty |
//! | `(head + 1) % capacity == tail` | full |
//! | `len() <= capacity - 1` | always |
//!
//! A capacity of 1 yields a ring that is simultaneously empty and full; every
//! enqueue is dropped.

use crate::keysym::KeySym;
use std::fmt;

/// Largest capacity accepted by [`KeyRingBuffer::allocate`].
pub const MAX_KEY_RING_CAPACITY: usize = 256;

/// Error returned by [`KeyRingBuffer::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCapacity(pub usize);

impl fmt::Display for InvalidCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key ring capacity {} outside 1..={MAX_KEY_RING_CAPACITY}",
            self.0
        )
    }
}

impl std::error::Error for InvalidCapacity {}

/// Single-owner circular queue of [`KeySym`]s.
#[derive(Debug, Clone)]
pub struct KeyRingBuffer {
    slots: Vec<KeySym>,
    head: usize,
    tail: usize,
    dropped: u64,
}

impl KeyRingBuffer {
    /// Allocate a ring with `capacity` slots.
    pub fn allocate(capacity: usize) -> Result<Self, InvalidCapacity> {
        if !(1..=MAX_KEY_RING_CAPACITY).contains(&capacity) {
            return Err(InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: vec![KeySym::NO_SYMBOL; capacity],
            head: 0,
            tail: 0,
            dropped: 0,
        })
    }

    /// Number of slots, including the one kept free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of queued symbols.
    #[inline]
    pub fn len(&self) -> usize {
        let cap = self.capacity();
        if cap == 0 {
            return 0;
        }
        (self.head + cap - self.tail) % cap
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        let cap = self.capacity();
        cap == 0 || (self.head + 1) % cap == self.tail
    }

    /// Symbols dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Append a symbol; silently dropped when the ring is full.
    pub fn enqueue(&mut self, sym: KeySym) {
        if self.is_full() {
            self.dropped += 1;
            crate::trace!(
                target: crate::logging::TARGET,
                sym = sym.raw(),
                "key ring full, symbol dropped"
            );
            return;
        }
        self.slots[self.head] = sym;
        self.head = (self.head + 1) % self.capacity();
    }

    /// Remove the oldest symbol, or [`KeySym::NO_SYMBOL`] when empty.
    pub fn dequeue(&mut self) -> KeySym {
        if self.is_empty() {
            return KeySym::NO_SYMBOL;
        }
        let sym = self.slots[self.tail];
        self.tail = (self.tail + 1) % self.capacity();
        sym
    }

    /// Oldest symbol without removing it, or [`KeySym::NO_SYMBOL`].
    pub fn peek(&self) -> KeySym {
        if self.is_empty() {
            KeySym::NO_SYMBOL
        } else {
            self.slots[self.tail]
        }
    }

    /// Discard every queued symbol.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }

    /// Release the backing storage. The ring behaves as permanently full and
    /// empty afterwards.
    pub fn release(&mut self) {
        self.slots = Vec::new();
        self.head = 0;
        self.tail = 0;
    }
}
