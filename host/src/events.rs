use std::borrow::Cow;
use std::fmt;
use std::mem;
use std::net::Ipv4Addr;

use tc_inspect_common::PayloadEvent;

/// Reads a [`PayloadEvent`] out of a perf record.
pub fn decode(buf: &[u8]) -> Option<PayloadEvent> {
    if buf.len() < mem::size_of::<PayloadEvent>() {
        return None;
    }
    // Every field is a plain integer or byte array, so any bit pattern is valid.
    Some(unsafe { (buf.as_ptr() as *const PayloadEvent).read_unaligned() })
}

pub fn protocol_name(protocol: u8) -> Cow<'static, str> {
    match protocol {
        6 => Cow::Borrowed("TCP"),
        17 => Cow::Borrowed("UDP"),
        other => Cow::Owned(other.to_string()),
    }
}

/// Lowercase hex of the captured payload bytes only.
pub fn payload_hex(event: &PayloadEvent) -> String {
    hex::encode(event.payload())
}

/// One-line rendering of an event's addressing.
pub struct Summary<'a>(pub &'a PayloadEvent);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = self.0;
        write!(
            f,
            "SRC: {:15} | DST: {:15} | SPORT: {:5} | DPORT: {:5} | PROTO: {}",
            Ipv4Addr::from(event.source_ip).to_string(),
            Ipv4Addr::from(event.dest_ip).to_string(),
            event.source_port,
            event.dest_port,
            protocol_name(event.protocol),
        )
    }
}

pub fn log_event(event: &PayloadEvent) {
    let payload = event.payload();
    if payload.is_empty() {
        tracing::info!(
            src = %Ipv4Addr::from(event.source_ip),
            dst = %Ipv4Addr::from(event.dest_ip),
            sport = event.source_port,
            dport = event.dest_port,
            proto = %protocol_name(event.protocol),
            payload_len = 0,
            "{}",
            Summary(event)
        );
    } else {
        tracing::info!(
            src = %Ipv4Addr::from(event.source_ip),
            dst = %Ipv4Addr::from(event.dest_ip),
            sport = event.source_port,
            dport = event.dest_port,
            proto = %protocol_name(event.protocol),
            payload_len = payload.len(),
            payload = %payload_hex(event),
            "{}",
            Summary(event)
        );
    }
}
