use std::io::{self, ErrorKind, Read};

use crate::registers::{RegisterSnapshot, SNAPSHOT_SIZE};

pub const TID_SIZE: usize = size_of::<u16>();
pub const EVENT_SIZE: usize = TID_SIZE + SNAPSHOT_SIZE;

// frames pulled out of the pipe per read
const READ_CHUNK: usize = EVENT_SIZE * 16;

/// One trap as reported by the kernel: the thread and its registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    pub tid: u16,
    pub registers: RegisterSnapshot,
}

impl TraceEvent {
    pub fn new(tid: u16, registers: RegisterSnapshot) -> Self {
        TraceEvent { tid, registers }
    }

    pub fn from_bytes(bytes: &[u8; EVENT_SIZE]) -> Self {
        let (tid, registers) = bytes.split_at(TID_SIZE);
        let mut tid_raw = [0u8; TID_SIZE];
        tid_raw.copy_from_slice(tid);
        let mut snapshot_raw = [0u8; SNAPSHOT_SIZE];
        snapshot_raw.copy_from_slice(registers);
        TraceEvent {
            tid: u16::from_ne_bytes(tid_raw),
            registers: RegisterSnapshot::from_bytes(&snapshot_raw),
        }
    }

    pub fn to_bytes(&self) -> [u8; EVENT_SIZE] {
        let mut bytes = [0u8; EVENT_SIZE];
        bytes[..TID_SIZE].copy_from_slice(&self.tid.to_ne_bytes());
        bytes[TID_SIZE..].copy_from_slice(&self.registers.to_bytes());
        bytes
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Fill {
    Read(usize),
    EndOfStream,
}

/// Reassembles fixed-size events from a byte stream.
///
/// A read that stops halfway through a frame keeps the partial bytes
/// around until the rest of the frame arrives, so an event is only ever
/// produced from a complete frame.
pub struct EventReader<R> {
    source: R,
    buffer: Vec<u8>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        EventReader {
            source,
            buffer: Vec::with_capacity(READ_CHUNK),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Performs a single read from the source.
    pub fn fill(&mut self) -> io::Result<Fill> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.source.read(&mut chunk) {
                Ok(0) => return Ok(Fill::EndOfStream),
                Ok(read) => {
                    self.buffer.extend_from_slice(&chunk[..read]);
                    return Ok(Fill::Read(read));
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        }
    }

    pub fn next_event(&mut self) -> Option<TraceEvent> {
        if self.buffer.len() < EVENT_SIZE {
            return None;
        }
        let mut frame = [0u8; EVENT_SIZE];
        frame.copy_from_slice(&self.buffer[..EVENT_SIZE]);
        self.buffer.drain(..EVENT_SIZE);
        Some(TraceEvent::from_bytes(&frame))
    }

    /// Bytes of an incomplete frame still waiting for the rest.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drops an incomplete frame, returning how many bytes it held.
    pub fn discard_partial(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}
