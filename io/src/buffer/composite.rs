use super::{check_range, ByteBuffer};
use crate::error::Result;
use std::borrow::Cow;
use std::io::Write;
use std::sync::OnceLock;

/// An ordered list of buffers, read as their concatenation.
///
/// The list may keep growing after the buffer was read,
/// which drops any previously cached concatenation.
/// Only the owner of the buffer can push to it,
/// so it cannot be extended while someone else is reading it.
#[derive(Debug, Default)]
pub struct CompositeBuffer {
    buffers: Vec<ByteBuffer>,
    size: u64,
    cache: OnceLock<Vec<u8>>,
}

impl Clone for CompositeBuffer {
    fn clone(&self) -> Self {
        CompositeBuffer {
            buffers: self.buffers.clone(),
            size: self.size,
            cache: OnceLock::new(),
        }
    }
}

impl FromIterator<ByteBuffer> for CompositeBuffer {
    fn from_iter<T: IntoIterator<Item = ByteBuffer>>(iter: T) -> Self {
        let mut out = CompositeBuffer::new();
        for buffer in iter {
            out.push(buffer);
        }
        out
    }
}

impl CompositeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer to the end of the list.
    pub fn push(&mut self, buffer: ByteBuffer) {
        self.size += buffer.size();
        self.buffers.push(buffer);
        self.cache = OnceLock::new();
    }

    /// The buffers in this composite, in order.
    pub fn buffers(&self) -> &[ByteBuffer] {
        &self.buffers
    }

    /// The total number of bytes, the sum of all child sizes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub(super) fn data(&self) -> Result<Cow<'_, [u8]>> {
        if let Some(cached) = self.cache.get() {
            return Ok(Cow::Borrowed(&cached[..]));
        }
        let mut out = Vec::with_capacity(self.size as usize);
        for buffer in &self.buffers {
            out.extend_from_slice(&buffer.data()?);
        }
        let cached = self.cache.get_or_init(|| out);
        Ok(Cow::Borrowed(&cached[..]))
    }

    pub(super) fn get_range(&self, offset: u64, count: u64) -> Result<Cow<'_, [u8]>> {
        check_range(offset, count, self.size)?;
        if let Some(cached) = self.cache.get() {
            let start = offset as usize;
            return Ok(Cow::Borrowed(&cached[start..start + count as usize]));
        }

        let end = offset + count;
        let mut out: Option<Vec<u8>> = None;
        let mut base = 0;
        for buffer in &self.buffers {
            let size = buffer.size();
            let (lo, hi) = (base, base + size);
            base = hi;
            if hi <= offset || size == 0 {
                continue;
            }
            if lo >= end {
                break;
            }
            let from = offset.max(lo) - lo;
            let to = end.min(hi) - lo;
            // fast path: the range lies within a single child
            if out.is_none() && from + count == to {
                return buffer.get_range(from, count);
            }
            out.get_or_insert_with(|| Vec::with_capacity(count as usize))
                .extend_from_slice(&buffer.get_range(from, to - from)?);
        }
        Ok(Cow::Owned(out.unwrap_or_default()))
    }

    pub(super) fn write_to<W>(&self, to: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        for buffer in &self.buffers {
            buffer.write_to(to)?;
        }
        Ok(())
    }
}
