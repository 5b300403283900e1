use std::collections::HashMap;

use log::trace;

use crate::decoder::Phase;

/// Where each thread of the tracee is in its call/return cycle.
///
/// Threads are never reaped: one that exits simply stops producing
/// events and its entry goes away with the registry.
#[derive(Debug, Default)]
pub struct PhaseRegistry {
    threads: HashMap<u16, Phase>,
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase for `tid`, registering it on first sight.
    pub fn phase_of(&mut self, tid: u16) -> Phase {
        *self.threads.entry(tid).or_insert_with(|| {
            trace!("new thread {tid}");
            Phase::ExpectingCall
        })
    }

    pub fn set_phase(&mut self, tid: u16, phase: Phase) {
        self.threads.insert(tid, phase);
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
