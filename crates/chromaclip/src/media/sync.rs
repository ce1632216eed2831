//! Cross-thread signalling between the decoder and the render loop.
//!
//! Two primitives, both deliberately tiny: a single-slot mailbox carrying the
//! latest decoded frame, and a one-shot gate satisfied when the decoder
//! instance exists. Neither guard is ever held across a GPU call.

use std::sync::{Condvar, Mutex};

use super::types::DecodedFrame;
use crate::error::ClipError;

/// Single-slot synchronized mailbox for decoded frames.
///
/// The decoder publishes into the slot; the render loop takes from it once
/// per pass. A publish overwrites any frame the consumer has not picked up
/// yet (the render loop only ever wants the latest), and a take removes the
/// pending frame in the same critical section that observes it — a publish
/// can never be seen and left behind, and one publish never yields two takes.
#[derive(Default)]
pub struct FrameMailbox {
    slot: Mutex<Option<DecodedFrame>>,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Producer side: invoked from the decoder's delivery context for every
    /// decoded frame.
    pub fn publish(&self, frame: DecodedFrame) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(frame);
        }
    }

    /// Consumer side: remove and return the pending frame, if any.
    pub fn take(&self) -> Option<DecodedFrame> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// One-shot gate satisfied once the decoder instance exists.
///
/// Callers arriving before the decoder is created block on [`ReadyGate::wait`];
/// once opened the gate stays open for the renderer's lifetime and later
/// waiters pass through immediately.
#[derive(Default)]
pub struct ReadyGate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self {
            open: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Satisfy the gate and wake every waiter. Idempotent.
    pub fn open(&self) {
        if let Ok(mut open) = self.open.lock() {
            *open = true;
            self.cond.notify_all();
        }
    }

    /// Block until the gate is open. The wait is bounded by decoder-creation
    /// latency; a poisoned guard maps to [`ClipError::Interrupted`].
    pub fn wait(&self) -> Result<(), ClipError> {
        let mut open = self.open.lock().map_err(|_| ClipError::Interrupted)?;
        while !*open {
            open = self.cond.wait(open).map_err(|_| ClipError::Interrupted)?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open.lock().map(|open| *open).unwrap_or(false)
    }
}
