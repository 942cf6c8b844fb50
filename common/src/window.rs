use crate::classify::Headers;
use crate::config::WINDOW_CAPACITY;
use crate::view::{PacketView, ViewError};

/// Fixed-capacity copy of the start of a UDP payload.
///
/// Bytes past [`Window::len`] are always zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    bytes: [u8; WINDOW_CAPACITY],
    len: usize,
}

impl Window {
    pub const fn empty() -> Self {
        Self {
            bytes: [0; WINDOW_CAPACITY],
            len: 0,
        }
    }

    /// Builds a window from `data`, keeping at most [`WINDOW_CAPACITY`] bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut window = Self::empty();
        let len = data.len().min(WINDOW_CAPACITY);
        window.bytes[..len].copy_from_slice(&data[..len]);
        window.len = len;
        window
    }

    /// Copies up to `limit` payload bytes out of `view`.
    ///
    /// The copy is clamped to the packet end and to the UDP length field, so
    /// a short or padded packet yields a short window rather than an error.
    /// A payload offset at or past the end of the packet yields an empty
    /// window.
    pub fn capture<V: PacketView>(
        view: &V,
        headers: &Headers,
        limit: usize,
    ) -> Result<Self, ViewError> {
        let offset = headers.payload_offset();
        let mut available = view.len().saturating_sub(offset);
        if let Some(declared) = headers.declared_payload_len() {
            available = available.min(declared);
        }
        let len = available.min(limit).min(WINDOW_CAPACITY);

        let mut window = Self::empty();
        view.load(offset, &mut window.bytes[..len])?;
        window.len = len;
        Ok(window)
    }

    /// Writes the captured bytes back to `view` at `offset`.
    pub fn write_back<V: PacketView>(&self, view: &mut V, offset: usize) -> Result<(), ViewError> {
        view.store(offset, self.payload())
    }

    /// Number of bytes captured from the packet.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The captured bytes.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The whole window, zero tail included.
    pub fn as_array(&self) -> &[u8; WINDOW_CAPACITY] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8; WINDOW_CAPACITY] {
        &mut self.bytes
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ETH_HDR_LEN, IPV4_MIN_HDR_LEN, UDP_HDR_LEN};
    use crate::view::SliceView;

    const PAYLOAD_OFFSET: usize = ETH_HDR_LEN + IPV4_MIN_HDR_LEN + UDP_HDR_LEN;

    fn headers(udp_len: u16) -> Headers {
        Headers {
            source_ip: 0,
            dest_ip: 0,
            protocol: 17,
            source_port: 9000,
            dest_port: 9000,
            udp_len,
            ip_header_len: IPV4_MIN_HDR_LEN,
        }
    }

    fn packet(payload: &[u8]) -> Vec<u8> {
        let mut pkt = vec![0u8; PAYLOAD_OFFSET];
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn short_payload_is_zero_padded() {
        let mut pkt = packet(b"abc");
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(11), WINDOW_CAPACITY).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window.payload(), b"abc");
        assert!(window.as_array()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn long_payload_is_truncated_to_capacity() {
        let payload: Vec<u8> = (0..100u8).collect();
        let mut pkt = packet(&payload);
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(108), WINDOW_CAPACITY).unwrap();
        assert_eq!(window.len(), WINDOW_CAPACITY);
        assert_eq!(window.payload(), &payload[..WINDOW_CAPACITY]);
    }

    #[test]
    fn capture_limit_is_honored() {
        let mut pkt = packet(b"0123456789");
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(18), 4).unwrap();
        assert_eq!(window.payload(), b"0123");
        assert_eq!(window.as_array()[4], 0);
    }

    #[test]
    fn link_padding_is_excluded_by_udp_length() {
        let mut pkt = packet(b"ok\0\0\0\0");
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(10), WINDOW_CAPACITY).unwrap();
        assert_eq!(window.payload(), b"ok");
    }

    #[test]
    fn bogus_udp_length_falls_back_to_packet_end() {
        let mut pkt = packet(b"data");
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(3), WINDOW_CAPACITY).unwrap();
        assert_eq!(window.payload(), b"data");
    }

    #[test]
    fn header_only_packet_gives_empty_window() {
        let mut pkt = packet(b"");
        let view = SliceView::full(&mut pkt);
        let window = Window::capture(&view, &headers(8), WINDOW_CAPACITY).unwrap();
        assert!(window.is_empty());
        assert_eq!(window, Window::empty());
    }

    #[test]
    fn write_back_touches_only_captured_bytes() {
        let mut pkt = packet(b"abcdef");
        let mut window = {
            let view = SliceView::full(&mut pkt);
            Window::capture(&view, &headers(14), 3).unwrap()
        };
        window.bytes_mut()[0] = b'X';
        let mut view = SliceView::full(&mut pkt);
        window.write_back(&mut view, PAYLOAD_OFFSET).unwrap();
        assert_eq!(&pkt[PAYLOAD_OFFSET..], b"Xbcdef");
    }
}
