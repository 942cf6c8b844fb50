use thiserror::Error;

/// Failure to access a packet through a [`PacketView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("access of {width} bytes at offset {offset} exceeds packet length {len}")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("packet range {start}..{end} is inconsistent with a buffer of {capacity} bytes")]
    InvalidRange {
        start: usize,
        end: usize,
        capacity: usize,
    },
}

/// Bounds-checked access to a packet's bytes.
///
/// Offsets are relative to the first byte of the packet. Implementations must
/// refuse any access where `offset + width > len()` instead of truncating it.
pub trait PacketView {
    /// Number of valid bytes in the packet.
    fn len(&self) -> usize;

    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    fn load(&self, offset: usize, dst: &mut [u8]) -> Result<(), ViewError>;

    /// Overwrites `src.len()` bytes starting at `offset`.
    fn store(&mut self, offset: usize, src: &[u8]) -> Result<(), ViewError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], ViewError> {
        let mut out = [0u8; N];
        self.load(offset, &mut out)?;
        Ok(out)
    }

    fn load_u8(&self, offset: usize) -> Result<u8, ViewError> {
        let [b] = self.load_array::<1>(offset)?;
        Ok(b)
    }

    /// Reads a network-order `u16` and returns it in host order.
    fn load_be_u16(&self, offset: usize) -> Result<u16, ViewError> {
        self.load_array(offset).map(u16::from_be_bytes)
    }

    /// Reads a network-order `u32` and returns it in host order.
    fn load_be_u32(&self, offset: usize) -> Result<u32, ViewError> {
        self.load_array(offset).map(u32::from_be_bytes)
    }
}

/// Verifies that `width` bytes at `offset` lie inside a packet of `len` bytes.
#[inline(always)]
pub fn check_bounds(offset: usize, width: usize, len: usize) -> Result<(), ViewError> {
    match offset.checked_add(width) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ViewError::OutOfBounds { offset, width, len }),
    }
}

/// A [`PacketView`] over a caller-owned byte slice restricted to `start..end`.
#[derive(Debug)]
pub struct SliceView<'a> {
    buf: &'a mut [u8],
    start: usize,
    end: usize,
}

impl<'a> SliceView<'a> {
    /// Views `buf[start..end]` as a packet.
    ///
    /// An inconsistent range is a caller bug and is rejected up front rather
    /// than silently clamped.
    pub fn new(buf: &'a mut [u8], start: usize, end: usize) -> Result<Self, ViewError> {
        if start > end || end > buf.len() {
            return Err(ViewError::InvalidRange {
                start,
                end,
                capacity: buf.len(),
            });
        }
        Ok(Self { buf, start, end })
    }

    /// Views the whole slice as a packet.
    pub fn full(buf: &'a mut [u8]) -> Self {
        let end = buf.len();
        Self { buf, start: 0, end }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }
}

impl PacketView for SliceView<'_> {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn load(&self, offset: usize, dst: &mut [u8]) -> Result<(), ViewError> {
        check_bounds(offset, dst.len(), self.len())?;
        let at = self.start + offset;
        dst.copy_from_slice(&self.buf[at..at + dst.len()]);
        Ok(())
    }

    fn store(&mut self, offset: usize, src: &[u8]) -> Result<(), ViewError> {
        check_bounds(offset, src.len(), self.len())?;
        let at = self.start + offset;
        self.buf[at..at + src.len()].copy_from_slice(src);
        Ok(())
    }
}
