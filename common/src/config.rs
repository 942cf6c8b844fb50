use thiserror::Error;

/// UDP port inspected when nothing else is configured.
pub const DEFAULT_TARGET_PORT: u16 = 9000;

/// Pattern searched for when nothing else is configured.
pub const DEFAULT_PATTERN: &[u8] = b"Bob";

/// Capacity of the payload window, and of the payload carried by an event.
pub const WINDOW_CAPACITY: usize = 64;

/// Longest pattern the engine accepts.
pub const MAX_PATTERN_LEN: usize = 16;

/// What the pipeline does with a packet that reached the pattern stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Report only; the packet always passes.
    Observe = 0,
    /// Rewrite the first match in place, then report and pass.
    Rewrite = 1,
    /// Report, then drop the packet if the pattern is present.
    DropOnMatch = 2,
}

impl Mode {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Observe),
            1 => Some(Self::Rewrite),
            2 => Some(Self::DropOnMatch),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observe => "observe",
            Self::Rewrite => "rewrite",
            Self::DropOnMatch => "drop",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("search pattern must not be empty")]
    EmptyPattern,
    #[error("search pattern is {0} bytes, at most 16 are supported")]
    PatternTooLong(usize),
    #[error("capture length {0} exceeds the 64 byte window")]
    CaptureTooLarge(usize),
    #[error("unknown mode {0}")]
    UnknownMode(u8),
}

/// Runtime configuration shared between the loader and the TC programs.
///
/// The layout is fixed so the record can live in a single-slot BPF array.
/// A slot that was never written reads back as all zeroes, which
/// [`InspectConfig::is_configured`] reports as unconfigured.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InspectConfig {
    pub target_port: u16,
    pub mode: u8,
    pub pattern_len: u8,
    pub capture_len: u8,
    pub _reserved: [u8; 3],
    pub pattern: [u8; MAX_PATTERN_LEN],
}

impl InspectConfig {
    /// Port 9000, pattern `Bob`, rewrite mode, full 64 byte capture.
    pub const REFERENCE: Self = {
        let mut pattern = [0u8; MAX_PATTERN_LEN];
        pattern[0] = DEFAULT_PATTERN[0];
        pattern[1] = DEFAULT_PATTERN[1];
        pattern[2] = DEFAULT_PATTERN[2];
        Self {
            target_port: DEFAULT_TARGET_PORT,
            mode: Mode::Rewrite as u8,
            pattern_len: DEFAULT_PATTERN.len() as u8,
            capture_len: WINDOW_CAPACITY as u8,
            _reserved: [0; 3],
            pattern,
        }
    };

    pub fn new(
        target_port: u16,
        pattern: &[u8],
        mode: Mode,
        capture_len: usize,
    ) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }
        if pattern.len() > MAX_PATTERN_LEN {
            return Err(ConfigError::PatternTooLong(pattern.len()));
        }
        if capture_len > WINDOW_CAPACITY {
            return Err(ConfigError::CaptureTooLarge(capture_len));
        }

        let mut bytes = [0u8; MAX_PATTERN_LEN];
        bytes[..pattern.len()].copy_from_slice(pattern);
        Ok(Self {
            target_port,
            mode: mode as u8,
            pattern_len: pattern.len() as u8,
            capture_len: capture_len as u8,
            _reserved: [0; 3],
            pattern: bytes,
        })
    }

    /// Whether the record holds a usable configuration.
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = usize::from(self.pattern_len);
        if len == 0 {
            return Err(ConfigError::EmptyPattern);
        }
        if len > MAX_PATTERN_LEN {
            return Err(ConfigError::PatternTooLong(len));
        }
        if usize::from(self.capture_len) > WINDOW_CAPACITY {
            return Err(ConfigError::CaptureTooLarge(self.capture_len.into()));
        }
        if Mode::from_raw(self.mode).is_none() {
            return Err(ConfigError::UnknownMode(self.mode));
        }
        Ok(())
    }

    /// Returns `self` when usable, the reference configuration otherwise.
    pub fn or_reference(self) -> Self {
        if self.is_configured() {
            self
        } else {
            Self::REFERENCE
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_raw(self.mode).unwrap_or(Mode::Observe)
    }

    pub fn pattern(&self) -> &[u8] {
        let len = usize::from(self.pattern_len).min(MAX_PATTERN_LEN);
        &self.pattern[..len]
    }

    pub fn capture_len(&self) -> usize {
        usize::from(self.capture_len).min(WINDOW_CAPACITY)
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(feature = "std")]
unsafe impl aya::Pod for InspectConfig {}
