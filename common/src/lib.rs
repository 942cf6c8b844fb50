#![cfg_attr(not(any(feature = "std", test)), no_std)]

//! Packet inspection core shared by the TC programs and the loader.
//!
//! The pipeline classifies an Ethernet/IPv4/UDP header chain, captures a
//! bounded window of the UDP payload, searches it for a byte pattern and
//! returns a pass/drop [`Verdict`], reporting a [`PayloadEvent`] for every
//! packet addressed to the configured port. It runs unchanged in the kernel
//! (over `TcContext`) and on the host (over [`SliceView`]).

pub mod classify;
pub mod config;
pub mod event;
pub mod pattern;
pub mod pipeline;
pub mod view;
pub mod window;

pub use classify::{classify, Headers, Rejection};
pub use config::{ConfigError, InspectConfig, Mode, WINDOW_CAPACITY};
pub use event::{EmitError, EventSink, PayloadEvent};
pub use pattern::{Pattern, Rewrite};
pub use pipeline::{Direction, Inspection, Inspector, Outcome, Verdict};
pub use view::{PacketView, SliceView, ViewError};
pub use window::Window;
