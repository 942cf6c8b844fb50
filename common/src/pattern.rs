//! Fixed-width substring search over a payload [`Window`].
//!
//! The scan always runs over [`SCAN_BOUND`] candidate offsets regardless of
//! how much payload was captured, so its cost does not depend on packet
//! contents. Candidates that would extend past the captured bytes never match.

use crate::config::{DEFAULT_PATTERN, MAX_PATTERN_LEN, WINDOW_CAPACITY};
use crate::window::Window;

/// Number of candidate offsets examined by every scan.
pub const SCAN_BOUND: usize = WINDOW_CAPACITY;

/// A non-empty search pattern of at most [`MAX_PATTERN_LEN`] bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pattern<'a> {
    bytes: &'a [u8],
}

/// Result of [`Pattern::rewrite_first`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rewrite {
    /// Offset of the match within the window.
    pub offset: usize,
    /// Whether any byte was actually modified.
    pub changed: bool,
}

impl Pattern<'static> {
    /// The `Bob` pattern.
    pub const DEFAULT: Self = Self {
        bytes: DEFAULT_PATTERN,
    };
}

impl<'a> Pattern<'a> {
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_PATTERN_LEN {
            return None;
        }
        Some(Self { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the leftmost occurrence in `window`, if any.
    pub fn find_first(&self, window: &Window) -> Option<usize> {
        let data = window.as_array();
        let valid = window.len();
        let len = self.bytes.len();

        for offset in 0..SCAN_BOUND {
            let end = offset + len;
            if end <= valid && data.get(offset..end) == Some(self.bytes) {
                return Some(offset);
            }
        }
        None
    }

    pub fn contains(&self, window: &Window) -> bool {
        self.find_first(window).is_some()
    }

    /// Uppercases every byte of the first match except the leading one.
    ///
    /// At most one occurrence is rewritten per call. Returns `None` when the
    /// pattern does not occur.
    pub fn rewrite_first(&self, window: &mut Window) -> Option<Rewrite> {
        let offset = self.find_first(window)?;
        let mut changed = false;
        let tail = window
            .bytes_mut()
            .get_mut(offset + 1..offset + self.bytes.len())?;
        for byte in tail {
            let upper = byte.to_ascii_uppercase();
            changed |= upper != *byte;
            *byte = upper;
        }
        Some(Rewrite { offset, changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> Pattern<'static> {
        Pattern::new(b"Bob").unwrap()
    }

    #[test]
    fn rejects_empty_and_oversized_patterns() {
        assert!(Pattern::new(b"").is_none());
        assert!(Pattern::new(&[0u8; MAX_PATTERN_LEN + 1]).is_none());
        assert!(Pattern::new(&[0u8; MAX_PATTERN_LEN]).is_some());
    }

    #[test]
    fn finds_leftmost_match() {
        let window = Window::from_bytes(b"xxBobyyBob");
        assert_eq!(bob().find_first(&window), Some(2));
    }

    #[test]
    fn match_at_window_edges() {
        assert_eq!(bob().find_first(&Window::from_bytes(b"Bob")), Some(0));

        let mut data = [b'.'; WINDOW_CAPACITY];
        data[WINDOW_CAPACITY - 3..].copy_from_slice(b"Bob");
        let window = Window::from_bytes(&data);
        assert_eq!(bob().find_first(&window), Some(WINDOW_CAPACITY - 3));
    }

    #[test]
    fn window_shorter_than_pattern_never_matches() {
        assert_eq!(bob().find_first(&Window::from_bytes(b"Bo")), None);
        assert_eq!(bob().find_first(&Window::empty()), None);
    }

    #[test]
    fn zero_padding_is_not_searched() {
        let zeros = Pattern::new(&[0, 0]).unwrap();
        let window = Window::from_bytes(b"ab");
        assert_eq!(zeros.find_first(&window), None);
    }

    #[test]
    fn rewrite_changes_only_the_tail_of_the_first_match() {
        let mut window = Window::from_bytes(b"Bob and Bob");
        let rewrite = bob().rewrite_first(&mut window).unwrap();
        assert_eq!(
            rewrite,
            Rewrite {
                offset: 0,
                changed: true
            }
        );
        assert_eq!(window.payload(), b"BOB and Bob");
    }

    #[test]
    fn rewrite_is_a_fixed_point() {
        let mut window = Window::from_bytes(b"hi Bob");
        bob().rewrite_first(&mut window);
        let once = window;
        assert_eq!(bob().rewrite_first(&mut window), None);
        assert_eq!(window, once);
    }

    #[test]
    fn rewrite_of_uppercase_pattern_reports_unchanged() {
        let pattern = Pattern::new(b"AB").unwrap();
        let mut window = Window::from_bytes(b"xAB");
        assert_eq!(
            pattern.rewrite_first(&mut window),
            Some(Rewrite {
                offset: 1,
                changed: false
            })
        );
        assert_eq!(window.payload(), b"xAB");
    }

    // Reference scan with no fixed bound: every offset `windows()` yields.
    fn unbounded_scan(pattern: &[u8], data: &[u8]) -> Option<usize> {
        data.windows(pattern.len()).position(|w| w == pattern)
    }

    #[test]
    fn bounded_scan_agrees_with_unbounded_scan() {
        let pattern = bob();
        for len in 0..=WINDOW_CAPACITY {
            for at in 0..=WINDOW_CAPACITY {
                let mut data = vec![b'o'; len];
                if at + 3 <= len {
                    data[at..at + 3].copy_from_slice(b"Bob");
                }
                let window = Window::from_bytes(&data);
                assert_eq!(
                    pattern.find_first(&window),
                    unbounded_scan(b"Bob", &data),
                    "len {len}, planted at {at}"
                );
            }
        }
    }
}
