use super::{ByteSource, Milestones};
use crate::buffer::ByteBuffer;
use crate::endian::Endianness;
use crate::error::{
    ExtendFixedSourceSnafu, InsufficientDataSnafu, NoMarkerSnafu, Result,
};
use bytes::Bytes;
use snafu::{ensure, OptionExt};
use std::fmt;
use tracing::trace;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// A chunk of received data and its absolute position.
#[derive(Debug)]
struct Chunk {
    start: u64,
    data: Bytes,
}

impl Chunk {
    fn end(&self) -> u64 {
        self.start + self.data.len() as u64
    }
}

/// A byte source over a list of in-memory buffers.
///
/// The source is either _fixed_,
/// in which case its whole content is known from the start,
/// or _open-ended_,
/// in which case more buffers may be [added](BufferByteSource::add)
/// until the last one arrives.
/// Asking an open-ended source for more data than it has
/// through [`require`](ByteSource::require) is not an error:
/// the caller may wait for more data and try again.
///
/// Buffers lying entirely before the marker are released
/// when [`mark`](ByteSource::mark) is called.
pub struct BufferByteSource {
    chunks: Vec<Chunk>,
    /// Absolute position of the end of the received data
    length: u64,
    position: u64,
    marker: Option<u64>,
    endianness: Endianness,
    milestones: Milestones,
    fixed: bool,
    pending: Option<(u64, Callback)>,
}

impl fmt::Debug for BufferByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferByteSource")
            .field("chunks", &self.chunks.len())
            .field("length", &self.length)
            .field("position", &self.position)
            .field("marker", &self.marker)
            .field("endianness", &self.endianness)
            .field("milestones", &self.milestones)
            .field("fixed", &self.fixed)
            .field("pending", &self.pending.as_ref().map(|(count, _)| *count))
            .finish()
    }
}

impl BufferByteSource {
    /// Create an open-ended source with no data yet.
    pub fn new(endianness: Endianness) -> Self {
        BufferByteSource {
            chunks: Vec::new(),
            length: 0,
            position: 0,
            marker: None,
            endianness,
            milestones: Milestones::new(),
            fixed: false,
            pending: None,
        }
    }

    /// Create a fixed source over the given buffers.
    pub fn fixed(
        buffers: impl IntoIterator<Item = ByteBuffer>,
        endianness: Endianness,
    ) -> Result<Self> {
        let mut source = Self::new(endianness);
        for buffer in buffers {
            source.push(buffer.to_bytes()?);
        }
        source.fixed = true;
        Ok(source)
    }

    /// Whether no more data can be added to this source.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// The number of bytes received so far,
    /// including those already read.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Append a buffer to an open-ended source.
    ///
    /// If `last` is true, the source becomes fixed.
    /// A callback registered with
    /// [`require_or_notify`](BufferByteSource::require_or_notify)
    /// is called once enough data is available.
    pub fn add(&mut self, buffer: ByteBuffer, last: bool) -> Result<()> {
        ensure!(!self.fixed, ExtendFixedSourceSnafu);
        self.push(buffer.to_bytes()?);
        if last {
            self.fixed = true;
        }

        let available = self.remaining();
        match self.pending.take() {
            Some((count, callback)) if available >= count => callback(),
            Some((count, _)) if self.fixed => {
                trace!(
                    "Source sealed with {} of {} required bytes, dropping callback",
                    available,
                    count
                );
            }
            other => self.pending = other,
        }
        Ok(())
    }

    /// Check whether at least `count` more bytes can be read,
    /// registering `callback` to be called
    /// once they become available if they are not yet.
    ///
    /// Only one callback is kept, the latest one.
    /// Like [`require`](ByteSource::require),
    /// a fixed source fails if it cannot satisfy the request.
    pub fn require_or_notify<F>(&mut self, count: u64, callback: F) -> Result<bool>
    where
        F: FnOnce() + Send + 'static,
    {
        let ready = self.require(count)?;
        if !ready {
            self.pending = Some((count, Box::new(callback)));
        }
        Ok(ready)
    }

    fn push(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        let start = self.length;
        self.length += data.len() as u64;
        self.chunks.push(Chunk { start, data });
    }

    fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    fn check_available(&self, count: u64) -> Result<()> {
        let available = self.remaining();
        ensure!(
            available >= count,
            InsufficientDataSnafu {
                requested: count,
                available
            }
        );
        Ok(())
    }

    /// Index of the chunk containing the given absolute position.
    fn chunk_at(&self, position: u64) -> usize {
        self.chunks.partition_point(|c| c.end() <= position)
    }
}

impl ByteSource for BufferByteSource {
    fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn marker(&self) -> Option<u64> {
        self.marker
    }

    fn is_eof(&self) -> bool {
        self.fixed && self.position >= self.length
    }

    fn can_rewind(&self) -> bool {
        self.marker.is_some()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.check_available(buf.len() as u64)?;
        let mut written = 0;
        let mut index = self.chunk_at(self.position);
        while written < buf.len() {
            let chunk = &self.chunks[index];
            let from = (self.position + written as u64 - chunk.start) as usize;
            let n = (chunk.data.len() - from).min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&chunk.data[from..from + n]);
            written += n;
            index += 1;
        }
        self.position += buf.len() as u64;
        Ok(())
    }

    fn read_buffer(&mut self, count: u64) -> Result<ByteBuffer> {
        if count == 0 {
            return Ok(ByteBuffer::Empty);
        }
        self.check_available(count)?;
        let chunk = &self.chunks[self.chunk_at(self.position)];
        if self.position + count <= chunk.end() {
            let from = (self.position - chunk.start) as usize;
            let data = chunk.data.slice(from..from + count as usize);
            self.position += count;
            return Ok(ByteBuffer::Memory(data));
        }
        let mut data = vec![0; count as usize];
        self.read_into(&mut data)?;
        Ok(ByteBuffer::from(data))
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        self.check_available(count)?;
        self.position += count;
        Ok(())
    }

    fn mark(&mut self) {
        let marker = self.position;
        self.marker = Some(marker);
        let expired = self.chunks.iter().take_while(|c| c.end() <= marker).count();
        if expired > 0 {
            self.chunks.drain(..expired);
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = self.marker.context(NoMarkerSnafu)?;
        Ok(())
    }

    fn milestones(&self) -> &Milestones {
        &self.milestones
    }

    fn milestones_mut(&mut self) -> &mut Milestones {
        &mut self.milestones
    }

    fn require(&mut self, count: u64) -> Result<bool> {
        if self.remaining() >= count {
            return Ok(true);
        }
        if self.fixed {
            self.check_available(count)?;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn reads_across_buffers() {
        let mut source = BufferByteSource::fixed(
            [
                ByteBuffer::from(vec![1_u8, 2, 3]),
                ByteBuffer::from(vec![4_u8]),
                ByteBuffer::from(vec![5_u8, 6, 7, 8]),
            ],
            Endianness::Big,
        )
        .unwrap();
        assert_eq!(source.len(), 8);
        assert_eq!(source.read_u16().unwrap(), 0x0102);
        assert_eq!(source.read_u32().unwrap(), 0x0304_0506);
        let buffer = source.read_buffer(2).unwrap();
        assert!(matches!(buffer, ByteBuffer::Memory(_)));
        assert_eq!(&*buffer.data().unwrap(), &[7, 8]);
        assert!(source.is_eof());
    }

    #[test]
    fn buffer_spanning_chunks_is_copied() {
        let mut source = BufferByteSource::fixed(
            [
                ByteBuffer::from(vec![1_u8, 2]),
                ByteBuffer::from(vec![3_u8, 4]),
            ],
            Endianness::Little,
        )
        .unwrap();
        source.skip(1).unwrap();
        assert_eq!(&*source.read_buffer(3).unwrap().data().unwrap(), &[2, 3, 4]);
    }

    #[test]
    fn fixed_source_fails_on_shortage() {
        let mut source =
            BufferByteSource::fixed([ByteBuffer::from(vec![0_u8; 4])], Endianness::Little)
                .unwrap();
        assert!(source.require(4).unwrap());
        assert!(matches!(
            source.require(5),
            Err(Error::InsufficientData { .. })
        ));
        assert!(matches!(
            source.add(ByteBuffer::from(vec![0_u8]), false),
            Err(Error::ExtendFixedSource { .. })
        ));
        assert!(source.read_u64().is_err());
    }

    #[test]
    fn open_ended_source_can_wait() {
        let mut source = BufferByteSource::new(Endianness::Little);
        assert!(!source.is_eof());
        assert!(!source.require(4).unwrap());

        let notified = Arc::new(AtomicBool::new(false));
        let flag = notified.clone();
        assert!(!source
            .require_or_notify(4, move || flag.store(true, Ordering::SeqCst))
            .unwrap());

        source.add(ByteBuffer::from(vec![1_u8, 0]), false).unwrap();
        assert!(!notified.load(Ordering::SeqCst));
        // reading what is not there yet still fails, it never blocks
        assert!(source.read_u32().is_err());

        source.add(ByteBuffer::from(vec![0_u8, 0]), true).unwrap();
        assert!(notified.load(Ordering::SeqCst));
        assert!(source.require(4).unwrap());
        assert_eq!(source.read_u32().unwrap(), 1);
        assert!(source.is_eof());
        assert!(source.add(ByteBuffer::empty(), false).is_err());
    }

    #[test]
    fn sealing_short_source_drops_callback() {
        let mut source = BufferByteSource::new(Endianness::Little);
        let notified = Arc::new(AtomicBool::new(false));
        let flag = notified.clone();
        assert!(!source
            .require_or_notify(8, move || flag.store(true, Ordering::SeqCst))
            .unwrap());
        source.add(ByteBuffer::from(vec![0_u8; 4]), true).unwrap();
        assert!(!notified.load(Ordering::SeqCst));
        assert!(source.require(8).is_err());
    }

    #[test]
    fn mark_releases_consumed_buffers() {
        let mut source = BufferByteSource::new(Endianness::Little);
        source.add(ByteBuffer::from(vec![1_u8, 2]), false).unwrap();
        source.add(ByteBuffer::from(vec![3_u8, 4]), false).unwrap();
        source.add(ByteBuffer::from(vec![5_u8, 6]), false).unwrap();
        source.skip(3).unwrap();
        source.mark();
        assert_eq!(source.chunks.len(), 2);
        assert_eq!(source.read_u16().unwrap(), u16::from_le_bytes([4, 5]));
        source.rewind().unwrap();
        assert_eq!(source.read_u8().unwrap(), 4);
        assert_eq!(source.position(), 4);
    }

    #[test]
    fn milestones_over_buffers() {
        let mut source =
            BufferByteSource::fixed([ByteBuffer::from(vec![0_u8; 12])], Endianness::Little)
                .unwrap();
        let item = source.push_milestone(12).unwrap();
        source.skip(4).unwrap();
        let inner = source.push_milestone(4).unwrap();
        assert!(source.push_milestone(16).is_err());
        source.skip(4).unwrap();
        assert!(source.has_reached_milestone());
        source.pop_milestone(inner).unwrap();
        assert!(!source.has_reached_milestone());
        source.skip(4).unwrap();
        assert!(source.has_reached_milestone());
        source.pop_milestone(item).unwrap();
        assert!(source.pop_milestone(item).is_err());
    }
}
