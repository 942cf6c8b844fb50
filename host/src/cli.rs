use clap::{Parser, ValueEnum};
use tc_inspect_common::{
    config::{DEFAULT_TARGET_PORT, WINDOW_CAPACITY},
    ConfigError, InspectConfig, Mode,
};

/// Inspect UDP traffic on an interface with ingress and egress TC classifiers.
#[derive(Debug, Parser)]
#[command(name = "tc-inspect", version)]
pub struct Args {
    /// Interface to attach both classifiers to.
    pub iface: String,

    /// UDP port to inspect; matched against source and destination.
    #[arg(long, default_value_t = DEFAULT_TARGET_PORT)]
    pub port: u16,

    /// Byte pattern searched for in the payload window.
    #[arg(long, default_value = "Bob")]
    pub pattern: String,

    /// Action taken on packets to the inspected port.
    #[arg(long, value_enum, default_value_t = ModeArg::Rewrite)]
    pub mode: ModeArg,

    /// Number of payload bytes captured, searched and reported.
    #[arg(long, default_value_t = WINDOW_CAPACITY)]
    pub capture_len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Report matching-port traffic only.
    Observe,
    /// Uppercase the tail of the first match in place.
    Rewrite,
    /// Drop packets whose payload contains the pattern.
    Drop,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Observe => Mode::Observe,
            ModeArg::Rewrite => Mode::Rewrite,
            ModeArg::Drop => Mode::DropOnMatch,
        }
    }
}

impl Args {
    pub fn config(&self) -> Result<InspectConfig, ConfigError> {
        InspectConfig::new(
            self.port,
            self.pattern.as_bytes(),
            self.mode.into(),
            self.capture_len,
        )
    }
}
