//! Cursors for reading primitive values and buffers out of a byte stream.
//!
//! A [`ByteSource`] keeps a position,
//! a single rewind marker,
//! the byte order of the values being read,
//! and a stack of [milestones](Milestones)
//! marking where the nested length-prefixed constructs being read end.
//!
//! Three implementations are provided:
//!
//! - [`StreamByteSource`] reads from a seekable stream of known length,
//!   usually a file,
//!   and can defer the reading of large buffers.
//! - [`ReadByteSource`] reads from a forward-only stream,
//!   keeping the bytes needed to rewind in memory.
//! - [`BufferByteSource`] reads from a list of in-memory buffers,
//!   either fixed or still being received.
use crate::buffer::ByteBuffer;
use crate::endian::Endianness;
use crate::error::{OutOfBoundsSnafu, Result};
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use snafu::OptionExt;

mod buffer;
mod milestone;
mod read;
mod stream;

pub use self::buffer::BufferByteSource;
pub use self::milestone::{Milestone, Milestones};
pub use self::read::ReadByteSource;
pub use self::stream::StreamByteSource;

macro_rules! read_primitive {
    ($name: ident, $t: ty, $size: expr, $read: ident) => {
        fn $name(&mut self) -> Result<$t> {
            let mut buf = [0; $size];
            self.read_into(&mut buf)?;
            Ok(match self.endianness() {
                Endianness::Little => LittleEndian::$read(&buf),
                Endianness::Big => BigEndian::$read(&buf),
            })
        }
    };
}

/// A cursor over a sequence of bytes,
/// with the byte order of its values attached.
///
/// Sources are meant to be driven by one reader at a time.
/// Changing the byte order takes `&mut self`,
/// so it can never interleave with a read in progress.
pub trait ByteSource {
    /// The byte order of the values read.
    fn endianness(&self) -> Endianness;

    /// Change the byte order of subsequent reads.
    ///
    /// The position, marker and milestones are kept.
    fn set_endianness(&mut self, endianness: Endianness);

    /// The current absolute position.
    fn position(&self) -> u64;

    /// The position saved by the last call to [`mark`](ByteSource::mark).
    fn marker(&self) -> Option<u64>;

    /// Whether there are no more bytes to read.
    fn is_eof(&self) -> bool;

    /// Whether [`rewind`](ByteSource::rewind) can be called.
    fn can_rewind(&self) -> bool;

    /// Fill `buf` entirely with the next bytes of the source.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read the next `count` bytes as a buffer.
    ///
    /// Sources may apply a large-object policy here,
    /// returning a buffer which only reads its data when requested.
    fn read_buffer(&mut self, count: u64) -> Result<ByteBuffer>;

    /// Move forward `count` bytes without reading them.
    fn skip(&mut self, count: u64) -> Result<()>;

    /// Save the current position so that it can be returned to.
    ///
    /// Only the most recent mark is retained.
    fn mark(&mut self);

    /// Return to the most recently marked position.
    fn rewind(&mut self) -> Result<()>;

    fn milestones(&self) -> &Milestones;

    fn milestones_mut(&mut self) -> &mut Milestones;

    /// Check whether at least `count` more bytes can be read.
    ///
    /// Sources of fixed length fail with
    /// [`InsufficientData`](crate::Error::InsufficientData)
    /// when they cannot satisfy the request.
    /// Sources still receiving data return `Ok(false)` instead,
    /// so that the caller can try again later.
    fn require(&mut self, count: u64) -> Result<bool>;

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    read_primitive!(read_i16, i16, 2, read_i16);
    read_primitive!(read_u16, u16, 2, read_u16);
    read_primitive!(read_i32, i32, 4, read_i32);
    read_primitive!(read_u32, u32, 4, read_u32);
    read_primitive!(read_i64, i64, 8, read_i64);
    read_primitive!(read_u64, u64, 8, read_u64);
    read_primitive!(read_f32, f32, 4, read_f32);
    read_primitive!(read_f64, f64, 8, read_f64);

    /// Read the next `count` bytes into a new vector.
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut data = vec![0; count];
        self.read_into(&mut data)?;
        Ok(data)
    }

    /// Register the end of a construct of `count` bytes
    /// starting at the current position.
    ///
    /// The returned handle must be given back to
    /// [`pop_milestone`](ByteSource::pop_milestone).
    fn push_milestone(&mut self, count: u64) -> Result<Milestone> {
        let offset = self.position();
        let end = offset.checked_add(count).context(OutOfBoundsSnafu {
            offset,
            count,
            size: u64::MAX,
        })?;
        self.milestones_mut().push(end)
    }

    /// Drop the innermost milestone.
    fn pop_milestone(&mut self, milestone: Milestone) -> Result<()> {
        self.milestones_mut().pop(milestone)
    }

    /// Whether the end of the innermost construct was reached.
    fn has_reached_milestone(&self) -> bool {
        self.milestones().reached(self.position())
    }

    fn milestones_count(&self) -> usize {
        self.milestones().len()
    }
}
