use thiserror::Error;

use crate::classify::Headers;
use crate::config::WINDOW_CAPACITY;
use crate::window::Window;

/// TC program → userspace record for every packet that passed classification.
///
/// Addresses and ports are in host byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadEvent {
    pub source_ip: u32,
    pub dest_ip: u32,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: u8,
    pub payload: [u8; WINDOW_CAPACITY],
    /// Explicit padding so no uninitialized stack bytes reach the perf buffer.
    pub _pad: [u8; 3],
    pub payload_len: u32,
}

impl PayloadEvent {
    pub fn new(headers: &Headers, window: &Window) -> Self {
        Self {
            source_ip: headers.source_ip,
            dest_ip: headers.dest_ip,
            source_port: headers.source_port,
            dest_port: headers.dest_port,
            protocol: headers.protocol,
            payload: *window.as_array(),
            _pad: [0; 3],
            payload_len: window.len() as u32,
        }
    }

    /// The captured part of `payload`.
    pub fn payload(&self) -> &[u8] {
        let len = (self.payload_len as usize).min(WINDOW_CAPACITY);
        &self.payload[..len]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("event channel unavailable")]
    Unavailable,
}

/// Outbound channel for [`PayloadEvent`]s.
///
/// Emission is best effort: the pipeline ignores failures.
pub trait EventSink {
    fn emit(&mut self, event: &PayloadEvent) -> Result<(), EmitError>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &PayloadEvent) -> Result<(), EmitError> {
        (**self).emit(event)
    }
}
