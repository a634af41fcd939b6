use super::{ByteSource, Milestones};
use crate::buffer::ByteBuffer;
use crate::endian::Endianness;
use crate::error::{InsufficientDataSnafu, NoMarkerSnafu, ReadSourceSnafu, Result};
use snafu::{ensure, OptionExt, ResultExt};
use std::io::{self, Read};
use tracing::trace;

/// A byte source over a forward-only stream,
/// such as a socket or a pipe.
///
/// The bytes read since the last [mark](ByteSource::mark)
/// are kept in memory so that the source can be rewound.
/// Without a mark, skipped bytes are read and discarded.
/// Buffers are always read into memory.
///
/// The length of the stream is not known in advance,
/// so [`is_eof`](ByteSource::is_eof) only becomes true
/// once a read has reached the end of the stream.
#[derive(Debug)]
pub struct ReadByteSource<R> {
    reader: R,
    /// Bytes taken from the reader, starting at absolute offset `start`.
    /// Holds everything since the marker and any bytes read ahead.
    window: Vec<u8>,
    start: u64,
    position: u64,
    marker: Option<u64>,
    /// Whether the reader has reported the end of the stream
    exhausted: bool,
    endianness: Endianness,
    milestones: Milestones,
}

impl<R> ReadByteSource<R>
where
    R: Read,
{
    /// Create a source reading from the reader's current position,
    /// which is taken as position 0.
    pub fn new(reader: R, endianness: Endianness) -> Self {
        ReadByteSource {
            reader,
            window: Vec::new(),
            start: 0,
            position: 0,
            marker: None,
            exhausted: false,
            endianness,
            milestones: Milestones::new(),
        }
    }

    /// The number of bytes held in memory for rewinding or read ahead.
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    fn window_end(&self) -> u64 {
        self.start + self.window.len() as u64
    }

    /// Make sure that `count` bytes past the position are in the window.
    ///
    /// Nothing is consumed when the stream ends early.
    fn fetch(&mut self, count: u64) -> Result<()> {
        let wanted = self.position.saturating_add(count);
        let end = self.window_end();
        if wanted > end && !self.exhausted {
            let missing = wanted - end;
            let read = (&mut self.reader)
                .take(missing)
                .read_to_end(&mut self.window)
                .context(ReadSourceSnafu)?;
            if (read as u64) < missing {
                self.exhausted = true;
            }
        }
        let available = self.window_end() - self.position;
        ensure!(
            available >= count,
            InsufficientDataSnafu {
                requested: count,
                available
            }
        );
        Ok(())
    }

    /// Move forward `count` bytes already in the window
    /// and drop what can no longer be rewound to.
    fn consume(&mut self, count: u64) {
        self.position += count;
        let keep_from = self.marker.unwrap_or(self.position);
        let drop = (keep_from - self.start) as usize;
        if drop > 0 {
            self.window.drain(..drop);
            self.start = keep_from;
        }
    }
}

impl<R> ByteSource for ReadByteSource<R>
where
    R: Read,
{
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
        self.exhausted && self.position >= self.window_end()
    }

    fn can_rewind(&self) -> bool {
        self.marker.is_some()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let count = buf.len() as u64;
        self.fetch(count)?;
        let from = (self.position - self.start) as usize;
        buf.copy_from_slice(&self.window[from..from + buf.len()]);
        self.consume(count);
        Ok(())
    }

    fn read_buffer(&mut self, count: u64) -> Result<ByteBuffer> {
        if count == 0 {
            return Ok(ByteBuffer::Empty);
        }
        let mut data = vec![0; count as usize];
        self.read_into(&mut data)?;
        Ok(ByteBuffer::from(data))
    }

    /// Move forward `count` bytes.
    ///
    /// Without a mark the bytes are discarded as they are read,
    /// so a stream ending early leaves the source at its end.
    fn skip(&mut self, count: u64) -> Result<()> {
        if self.marker.is_some() {
            self.fetch(count)?;
            self.consume(count);
            return Ok(());
        }

        let buffered = (self.window_end() - self.position).min(count);
        self.consume(buffered);
        let missing = count - buffered;
        if missing == 0 {
            return Ok(());
        }
        trace!("Discarding {} bytes from stream", missing);
        let discarded = io::copy(&mut (&mut self.reader).take(missing), &mut io::sink())
            .context(ReadSourceSnafu)?;
        self.position += discarded;
        self.start = self.position;
        if discarded < missing {
            self.exhausted = true;
        }
        ensure!(
            discarded == missing,
            InsufficientDataSnafu {
                requested: count,
                available: buffered + discarded,
            }
        );
        Ok(())
    }

    fn mark(&mut self) {
        self.marker = Some(self.position);
        self.consume(0);
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

    /// Check that `count` more bytes can be read,
    /// reading them ahead from the stream.
    ///
    /// The stream is blocking,
    /// so a shortage is final.
    fn require(&mut self, count: u64) -> Result<bool> {
        self.fetch(count)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// A reader handing out at most `chunk` bytes per call,
    /// as a socket would.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn source(len: u8) -> ReadByteSource<Trickle> {
        let reader = Trickle {
            data: (0..len).collect(),
            pos: 0,
            chunk: 3,
        };
        ReadByteSource::new(reader, Endianness::Little)
    }

    #[test]
    fn reads_across_short_reads() {
        let mut source = source(16);
        assert_eq!(source.read_u8().unwrap(), 0);
        assert_eq!(source.read_u32().unwrap(), 0x0403_0201);
        source.set_endianness(Endianness::Big);
        assert_eq!(source.read_u16().unwrap(), 0x0506);
        assert_eq!(source.position(), 7);
        // nothing is kept without a marker
        assert_eq!(source.buffered(), 0);
    }

    #[test]
    fn mark_and_rewind() {
        let mut source = source(16);
        assert!(!source.can_rewind());
        assert!(matches!(source.rewind(), Err(Error::NoMarker { .. })));

        source.skip(2).unwrap();
        source.mark();
        assert_eq!(source.read_bytes(3).unwrap(), vec![2, 3, 4]);
        source.skip(2).unwrap();
        assert_eq!(source.buffered(), 5);
        source.rewind().unwrap();
        assert_eq!(source.position(), 2);
        assert_eq!(source.read_bytes(6).unwrap(), vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(source.read_u8().unwrap(), 8);

        // a new mark releases the bytes before it
        source.mark();
        assert_eq!(source.buffered(), 0);
        assert_eq!(source.read_buffer(4).unwrap().to_vec().unwrap(), vec![9, 10, 11, 12]);
        source.rewind().unwrap();
        assert_eq!(source.read_u8().unwrap(), 9);
    }

    #[test]
    fn milestones_follow_position() {
        let mut source = source(16);
        let outer = source.push_milestone(8).unwrap();
        source.mark();
        let inner = source.push_milestone(4).unwrap();
        source.skip(4).unwrap();
        assert!(source.has_reached_milestone());
        source.rewind().unwrap();
        assert!(!source.has_reached_milestone());
        source.skip(4).unwrap();
        source.pop_milestone(inner).unwrap();
        source.skip(4).unwrap();
        assert!(source.has_reached_milestone());
        source.pop_milestone(outer).unwrap();
        assert_eq!(source.milestones_count(), 0);
    }

    #[test]
    fn reading_past_end_fails() {
        let mut source = source(6);
        source.skip(3).unwrap();
        assert!(!source.is_eof());
        assert!(matches!(
            source.read_u32(),
            Err(Error::InsufficientData {
                requested: 4,
                available: 3,
                ..
            })
        ));
        // the bytes read ahead are still there
        assert_eq!(source.position(), 3);
        assert_eq!(source.read_bytes(3).unwrap(), vec![3, 4, 5]);
        assert!(source.is_eof());
        assert!(source.require(1).is_err());
    }

    #[test]
    fn require_reads_ahead() {
        let mut source = source(10);
        assert!(source.require(8).unwrap());
        assert_eq!(source.buffered(), 8);
        assert_eq!(source.position(), 0);
        assert_eq!(source.read_u8().unwrap(), 0);
        assert!(matches!(
            source.require(10),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn skip_without_mark_discards() {
        let mut source = source(10);
        source.require(2).unwrap();
        source.skip(7).unwrap();
        assert_eq!(source.buffered(), 0);
        assert_eq!(source.read_u8().unwrap(), 7);
        assert!(matches!(
            source.skip(5),
            Err(Error::InsufficientData {
                requested: 5,
                available: 2,
                ..
            })
        ));
        assert_eq!(source.position(), 10);
        assert!(source.is_eof());
    }
}
