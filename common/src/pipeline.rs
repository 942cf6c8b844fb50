//! Per-packet pipeline: classify, capture, search, then report and decide.

use crate::classify::{classify, Headers, Rejection};
use crate::config::{InspectConfig, Mode};
use crate::event::{EventSink, PayloadEvent};
use crate::pattern::Pattern;
use crate::view::PacketView;
use crate::window::Window;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Drop,
}

/// Hook the packet was seen on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Ingress = 0,
    Egress = 1,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

/// Details of a packet that made it past classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inspection {
    pub direction: Direction,
    pub verdict: Verdict,
    pub payload_len: usize,
    /// Window offset of the first pattern occurrence.
    pub matched_at: Option<usize>,
    /// Rewritten bytes were written back to the packet.
    pub rewritten: bool,
    /// The sink accepted the event.
    pub reported: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Skipped(Rejection),
    Inspected(Inspection),
}

impl Outcome {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Skipped(_) => Verdict::Pass,
            Self::Inspected(inspection) => inspection.verdict,
        }
    }
}

/// Runs the pipeline against packets with a fixed configuration and sink.
///
/// Holds no per-packet state; every buffer it needs lives on the stack of
/// [`Inspector::run`].
pub struct Inspector<S> {
    config: InspectConfig,
    sink: S,
}

impl<S: EventSink> Inspector<S> {
    /// An unusable `config` is replaced by [`InspectConfig::REFERENCE`].
    pub fn new(config: InspectConfig, sink: S) -> Self {
        Self {
            config: config.or_reference(),
            sink,
        }
    }

    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn inspect<V: PacketView>(&mut self, view: &mut V, direction: Direction) -> Verdict {
        self.run(view, direction).verdict()
    }

    pub fn run<V: PacketView>(&mut self, view: &mut V, direction: Direction) -> Outcome {
        // `pattern` borrows from this copy, leaving `self` free for `report`.
        let config = self.config;
        let headers = match classify(view, config.target_port) {
            Ok(headers) => headers,
            Err(rejection) => return Outcome::Skipped(rejection),
        };
        let window = match Window::capture(view, &headers, config.capture_len()) {
            Ok(window) => window,
            Err(err) => return Outcome::Skipped(err.into()),
        };
        let pattern = Pattern::new(config.pattern()).unwrap_or(Pattern::DEFAULT);

        let mut inspection = Inspection {
            direction,
            verdict: Verdict::Pass,
            payload_len: window.len(),
            matched_at: None,
            rewritten: false,
            reported: false,
        };

        match config.mode() {
            Mode::Observe => {
                inspection.matched_at = pattern.find_first(&window);
                inspection.reported = self.report(&headers, &window);
            }
            Mode::Rewrite => {
                let mut rewritten = window;
                if let Some(rewrite) = pattern.rewrite_first(&mut rewritten) {
                    inspection.matched_at = Some(rewrite.offset);
                    if rewrite.changed {
                        inspection.rewritten = rewritten
                            .write_back(view, headers.payload_offset())
                            .is_ok();
                    }
                }
                // The report must agree with what is on the wire.
                let reported = if inspection.rewritten {
                    &rewritten
                } else {
                    &window
                };
                inspection.reported = self.report(&headers, reported);
            }
            Mode::DropOnMatch => {
                inspection.reported = self.report(&headers, &window);
                inspection.matched_at = pattern.find_first(&window);
                if inspection.matched_at.is_some() {
                    inspection.verdict = Verdict::Drop;
                }
            }
        }

        Outcome::Inspected(inspection)
    }

    fn report(&mut self, headers: &Headers, window: &Window) -> bool {
        self.sink.emit(&PayloadEvent::new(headers, window)).is_ok()
    }
}
