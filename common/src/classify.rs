//! Incremental Ethernet → IPv4 → UDP header validation.
//!
//! Each layer is bounds-checked against the packet length before any of its
//! fields is read, and the IPv4 header length is validated before it is used
//! to locate the UDP header.

use crate::view::{PacketView, ViewError};

pub const ETH_HDR_LEN: usize = 14;
pub const IPV4_MIN_HDR_LEN: usize = 20;
pub const UDP_HDR_LEN: usize = 8;

pub const ETH_P_IP: u16 = 0x0800;
pub const IPPROTO_UDP: u8 = 17;

const ETH_TYPE_OFFSET: usize = 12;

/// Why a packet was passed through without inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Shorter than an Ethernet header.
    TruncatedEthernet,
    /// Ethertype is not IPv4.
    NotIpv4,
    /// Shorter than the fixed part of an IPv4 header.
    TruncatedIpv4,
    /// IHL below the 5 word minimum.
    BadHeaderLength,
    /// Shorter than the declared IPv4 header plus a UDP header.
    TruncatedUdp,
    /// Transport protocol is not UDP.
    NotUdp,
    /// Neither UDP port is the target port.
    PortMismatch,
    /// The packet view refused an access that the length checks allowed.
    OutOfBounds,
}

impl Rejection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TruncatedEthernet => "truncated ethernet header",
            Self::NotIpv4 => "not ipv4",
            Self::TruncatedIpv4 => "truncated ipv4 header",
            Self::BadHeaderLength => "invalid ipv4 header length",
            Self::TruncatedUdp => "truncated udp header",
            Self::NotUdp => "not udp",
            Self::PortMismatch => "port mismatch",
            Self::OutOfBounds => "out of bounds access",
        }
    }
}

impl From<ViewError> for Rejection {
    fn from(_: ViewError) -> Self {
        Self::OutOfBounds
    }
}

/// Header fields of a classified packet, in host byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Headers {
    pub source_ip: u32,
    pub dest_ip: u32,
    pub protocol: u8,
    pub source_port: u16,
    pub dest_port: u16,
    /// The UDP length field, header included.
    pub udp_len: u16,
    /// IPv4 header length in bytes (`ihl * 4`).
    pub ip_header_len: usize,
}

impl Headers {
    pub const fn udp_offset(&self) -> usize {
        ETH_HDR_LEN + self.ip_header_len
    }

    pub const fn payload_offset(&self) -> usize {
        self.udp_offset() + UDP_HDR_LEN
    }

    /// Payload length declared by the UDP header, if the field is sane.
    pub fn declared_payload_len(&self) -> Option<usize> {
        usize::from(self.udp_len).checked_sub(UDP_HDR_LEN)
    }
}

/// Parses the header chain and applies the port filter.
pub fn classify<V: PacketView>(view: &V, target_port: u16) -> Result<Headers, Rejection> {
    let len = view.len();

    if len < ETH_HDR_LEN {
        return Err(Rejection::TruncatedEthernet);
    }
    if view.load_be_u16(ETH_TYPE_OFFSET)? != ETH_P_IP {
        return Err(Rejection::NotIpv4);
    }

    let ip = ETH_HDR_LEN;
    if len < ip + IPV4_MIN_HDR_LEN {
        return Err(Rejection::TruncatedIpv4);
    }
    let ip_header_len = usize::from(view.load_u8(ip)? & 0x0f) * 4;
    if ip_header_len < IPV4_MIN_HDR_LEN {
        return Err(Rejection::BadHeaderLength);
    }

    let udp = ip + ip_header_len;
    if len < udp + UDP_HDR_LEN {
        return Err(Rejection::TruncatedUdp);
    }

    let protocol = view.load_u8(ip + 9)?;
    if protocol != IPPROTO_UDP {
        return Err(Rejection::NotUdp);
    }

    let source_port = view.load_be_u16(udp)?;
    let dest_port = view.load_be_u16(udp + 2)?;
    if source_port != target_port && dest_port != target_port {
        return Err(Rejection::PortMismatch);
    }

    Ok(Headers {
        source_ip: view.load_be_u32(ip + 12)?,
        dest_ip: view.load_be_u32(ip + 16)?,
        protocol,
        source_port,
        dest_port,
        udp_len: view.load_be_u16(udp + 4)?,
        ip_header_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SliceView;

    fn frame(ihl: u8, protocol: u8, sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
        let ip_len = usize::from(ihl) * 4;
        let mut pkt = Vec::new();
        pkt.extend_from_slice(&[0xaa; 12]);
        pkt.extend_from_slice(&ETH_P_IP.to_be_bytes());
        let mut ip = vec![0u8; ip_len.max(IPV4_MIN_HDR_LEN)];
        ip[0] = 0x40 | ihl;
        ip[9] = protocol;
        ip[12..16].copy_from_slice(&[10, 0, 0, 1]);
        ip[16..20].copy_from_slice(&[10, 0, 0, 2]);
        pkt.extend_from_slice(&ip);
        pkt.extend_from_slice(&sport.to_be_bytes());
        pkt.extend_from_slice(&dport.to_be_bytes());
        pkt.extend_from_slice(&((UDP_HDR_LEN + payload.len()) as u16).to_be_bytes());
        pkt.extend_from_slice(&[0, 0]);
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn parses_minimal_udp_packet() {
        let mut pkt = frame(5, IPPROTO_UDP, 9000, 40000, b"hi");
        let view = SliceView::full(&mut pkt);
        let headers = classify(&view, 9000).unwrap();
        assert_eq!(headers.source_ip, 0x0a00_0001);
        assert_eq!(headers.dest_ip, 0x0a00_0002);
        assert_eq!(headers.source_port, 9000);
        assert_eq!(headers.dest_port, 40000);
        assert_eq!(headers.udp_len, 10);
        assert_eq!(headers.payload_offset(), 42);
        assert_eq!(headers.declared_payload_len(), Some(2));
    }

    #[test]
    fn options_shift_the_udp_header() {
        let mut pkt = frame(7, IPPROTO_UDP, 1234, 9000, b"");
        let view = SliceView::full(&mut pkt);
        let headers = classify(&view, 9000).unwrap();
        assert_eq!(headers.ip_header_len, 28);
        assert_eq!(headers.udp_offset(), 42);
        assert_eq!(headers.payload_offset(), 50);
        assert_eq!(headers.source_port, 1234);
    }

    #[test]
    fn options_longer_than_packet_are_rejected() {
        // IHL 15 declares 60 bytes of IPv4 header; only the fixed 20 plus a
        // UDP header's worth of bytes are present.
        let mut pkt = frame(5, IPPROTO_UDP, 9000, 9000, b"");
        pkt[ETH_HDR_LEN] = 0x4f;
        let view = SliceView::full(&mut pkt);
        assert_eq!(classify(&view, 9000), Err(Rejection::TruncatedUdp));
    }

    #[test]
    fn ihl_below_minimum_is_rejected() {
        let mut pkt = frame(5, IPPROTO_UDP, 9000, 9000, b"");
        pkt[ETH_HDR_LEN] = 0x44;
        let view = SliceView::full(&mut pkt);
        assert_eq!(classify(&view, 9000), Err(Rejection::BadHeaderLength));
    }

    #[test]
    fn rejects_non_ipv4_ethertype() {
        let mut pkt = frame(5, IPPROTO_UDP, 9000, 9000, b"");
        pkt[12..14].copy_from_slice(&0x86ddu16.to_be_bytes());
        let view = SliceView::full(&mut pkt);
        assert_eq!(classify(&view, 9000), Err(Rejection::NotIpv4));
    }

    #[test]
    fn rejects_non_udp() {
        let mut pkt = frame(5, 6, 9000, 9000, b"");
        let view = SliceView::full(&mut pkt);
        assert_eq!(classify(&view, 9000), Err(Rejection::NotUdp));
    }

    #[test]
    fn rejects_other_ports() {
        let mut pkt = frame(5, IPPROTO_UDP, 53, 5353, b"");
        let view = SliceView::full(&mut pkt);
        assert_eq!(classify(&view, 9000), Err(Rejection::PortMismatch));
    }

    #[test]
    fn every_truncation_is_rejected() {
        let full = frame(5, IPPROTO_UDP, 9000, 9000, b"");
        for cut in 0..full.len() {
            let mut pkt = full[..cut].to_vec();
            let view = SliceView::full(&mut pkt);
            let expected = match cut {
                0..=13 => Rejection::TruncatedEthernet,
                14..=33 => Rejection::TruncatedIpv4,
                _ => Rejection::TruncatedUdp,
            };
            assert_eq!(classify(&view, 9000), Err(expected), "cut at {cut}");
        }
    }

    #[test]
    fn rejection_labels_are_distinct() {
        let all = [
            Rejection::TruncatedEthernet,
            Rejection::NotIpv4,
            Rejection::TruncatedIpv4,
            Rejection::BadHeaderLength,
            Rejection::TruncatedUdp,
            Rejection::NotUdp,
            Rejection::PortMismatch,
            Rejection::OutOfBounds,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(!a.as_str().is_empty());
            for b in &all[i + 1..] {
                assert_ne!(a.as_str(), b.as_str(), "{a:?} and {b:?}");
            }
        }
        assert_eq!(Rejection::PortMismatch.as_str(), "port mismatch");
    }
}
