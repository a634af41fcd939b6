//! Byte-addressable regions of finite size.
//!
//! [`ByteBuffer`] is the single entry point for every kind of region
//! handled by this crate:
//! owned memory, views over other buffers,
//! concatenations of buffers,
//! and regions of a file which are only read when requested.
//! All variants expose the same read interface
//! ([`size`](ByteBuffer::size), [`data`](ByteBuffer::data),
//! [`get_range`](ByteBuffer::get_range) and
//! [`write_to`](ByteBuffer::write_to)).
//!
//! Requesting bytes outside of `[0, size)` is always an error,
//! data is never silently truncated.
use crate::endian::{is_foreign, swap_bytes_in_place, Endianness};
use crate::error::{InvalidSwapUnitSnafu, OutOfBoundsSnafu, Result, WriteTargetSnafu};
use bytes::Bytes;
use snafu::{ensure, ResultExt};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

mod composite;
mod file;

pub use self::composite::CompositeBuffer;
pub use self::file::FileBuffer;

/// A byte region of finite size.
///
/// Cloning a buffer is cheap:
/// memory is reference counted and views share their inner buffer.
#[derive(Debug, Clone, Default)]
pub enum ByteBuffer {
    /// A buffer of size zero.
    #[default]
    Empty,
    /// Bytes held in memory.
    Memory(Bytes),
    /// A window over another buffer.
    Range(RangeBuffer),
    /// Another buffer with the byte order of each unit reversed.
    Swap(SwapBuffer),
    /// An ordered, growable list of buffers.
    Composite(CompositeBuffer),
    /// A region of a file, read on each access.
    File(FileBuffer),
    /// Another buffer padded with a zero byte up to even length.
    Even(EvenLengthBuffer),
}

/// A window of `len` bytes starting at `offset` of an inner buffer.
#[derive(Debug, Clone)]
pub struct RangeBuffer {
    inner: Arc<ByteBuffer>,
    offset: u64,
    len: u64,
}

impl RangeBuffer {
    /// The buffer being viewed.
    pub fn inner(&self) -> &ByteBuffer {
        &self.inner
    }

    /// The offset of this window in the inner buffer.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// A byte-swapped view of an inner buffer.
///
/// The swapped content is computed on every access and never cached.
#[derive(Debug, Clone)]
pub struct SwapBuffer {
    inner: Arc<ByteBuffer>,
    unit: usize,
}

impl SwapBuffer {
    /// The buffer being viewed.
    pub fn inner(&self) -> &ByteBuffer {
        &self.inner
    }

    /// The width of each swapped unit in bytes.
    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Mutable access to the buffer being viewed.
    /// The inner buffer is cloned first if other views share it.
    pub fn inner_mut(&mut self) -> &mut ByteBuffer {
        Arc::make_mut(&mut self.inner)
    }
}

/// An odd-length buffer extended with a single zero byte.
#[derive(Debug, Clone)]
pub struct EvenLengthBuffer {
    inner: Arc<ByteBuffer>,
}

impl EvenLengthBuffer {
    pub fn inner(&self) -> &ByteBuffer {
        &self.inner
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        ByteBuffer::Memory(Bytes::from(data))
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(data: Bytes) -> Self {
        ByteBuffer::Memory(data)
    }
}

impl From<&'static [u8]> for ByteBuffer {
    fn from(data: &'static [u8]) -> Self {
        ByteBuffer::Memory(Bytes::from_static(data))
    }
}

impl From<CompositeBuffer> for ByteBuffer {
    fn from(buffer: CompositeBuffer) -> Self {
        ByteBuffer::Composite(buffer)
    }
}

impl From<FileBuffer> for ByteBuffer {
    fn from(buffer: FileBuffer) -> Self {
        ByteBuffer::File(buffer)
    }
}

impl ByteBuffer {
    /// Create an empty buffer.
    #[inline]
    pub const fn empty() -> Self {
        ByteBuffer::Empty
    }

    /// Create a window of `len` bytes at `offset` over the given buffer.
    ///
    /// Fails if the window does not fit in `inner`.
    pub fn range(inner: ByteBuffer, offset: u64, len: u64) -> Result<Self> {
        check_range(offset, len, inner.size())?;
        Ok(ByteBuffer::Range(RangeBuffer {
            inner: Arc::new(inner),
            offset,
            len,
        }))
    }

    /// Create a view over `inner`
    /// with the bytes of each `unit`-sized chunk reversed.
    ///
    /// The unit must be 2, 4 or 8 bytes.
    pub fn swapped(inner: ByteBuffer, unit: usize) -> Result<Self> {
        ensure!(matches!(unit, 2 | 4 | 8), InvalidSwapUnitSnafu { unit });
        Ok(ByteBuffer::Swap(SwapBuffer {
            inner: Arc::new(inner),
            unit,
        }))
    }

    /// Present `inner`, encoded in the given byte order,
    /// in the byte order of this machine.
    ///
    /// The buffer is returned as is
    /// when the byte order is already native
    /// or when the values are single bytes.
    pub fn endian(inner: ByteBuffer, endianness: Endianness, unit: usize) -> Result<Self> {
        if unit > 1 && is_foreign(endianness) {
            ByteBuffer::swapped(inner, unit)
        } else {
            Ok(inner)
        }
    }

    /// Create a composite buffer out of the given sequence of buffers.
    pub fn composite(buffers: impl IntoIterator<Item = ByteBuffer>) -> Self {
        ByteBuffer::Composite(buffers.into_iter().collect())
    }

    /// Create a buffer over `len` bytes of the file at `path`,
    /// starting at `offset`.
    ///
    /// The file is not touched until the data is requested.
    pub fn file(path: impl AsRef<Path>, offset: u64, len: u64) -> Self {
        ByteBuffer::File(FileBuffer::new(path, offset, len))
    }

    /// Pad the buffer to even length.
    ///
    /// Buffers which are already even are returned as is.
    pub fn even_length(inner: ByteBuffer) -> Self {
        if inner.size() % 2 == 0 {
            inner
        } else {
            ByteBuffer::Even(EvenLengthBuffer {
                inner: Arc::new(inner),
            })
        }
    }

    /// The number of bytes in this buffer.
    pub fn size(&self) -> u64 {
        match self {
            ByteBuffer::Empty => 0,
            ByteBuffer::Memory(data) => data.len() as u64,
            ByteBuffer::Range(b) => b.len,
            ByteBuffer::Swap(b) => b.inner.size(),
            ByteBuffer::Composite(b) => b.size(),
            ByteBuffer::File(b) => b.len(),
            ByteBuffer::Even(b) => b.inner.size() + 1,
        }
    }

    /// Whether the buffer has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether the content of this buffer is already in memory,
    /// so that reading it involves no I/O or transformation.
    pub fn is_memory(&self) -> bool {
        match self {
            ByteBuffer::Empty | ByteBuffer::Memory(_) => true,
            ByteBuffer::Range(b) => b.inner.is_memory(),
            _ => false,
        }
    }

    /// Retrieve the composite buffer inside, if this is one.
    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeBuffer> {
        match self {
            ByteBuffer::Composite(b) => Some(b),
            _ => None,
        }
    }

    /// Obtain the full content of the buffer as one contiguous slice.
    ///
    /// Memory buffers are borrowed.
    /// Other variants may need to materialize a copy.
    pub fn data(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            ByteBuffer::Empty => Ok(Cow::Borrowed(&[][..])),
            ByteBuffer::Memory(data) => Ok(Cow::Borrowed(&data[..])),
            ByteBuffer::Composite(b) => b.data(),
            _ => self.get_range(0, self.size()),
        }
    }

    /// Obtain `count` bytes of the buffer starting at `offset`.
    ///
    /// Only the requested range is materialized.
    /// Fails if the range is not fully inside the buffer.
    pub fn get_range(&self, offset: u64, count: u64) -> Result<Cow<'_, [u8]>> {
        check_range(offset, count, self.size())?;
        match self {
            ByteBuffer::Empty => Ok(Cow::Borrowed(&[][..])),
            ByteBuffer::Memory(data) => {
                let start = offset as usize;
                Ok(Cow::Borrowed(&data[start..start + count as usize]))
            }
            ByteBuffer::Range(b) => b.inner.get_range(b.offset + offset, count),
            ByteBuffer::Swap(b) => {
                let unit = b.unit as u64;
                let start = offset - offset % unit;
                let end = ((offset + count + unit - 1) / unit * unit).min(b.inner.size());
                let mut data = b.inner.get_range(start, end - start)?.into_owned();
                swap_bytes_in_place(b.unit, &mut data);
                let from = (offset - start) as usize;
                data.truncate(from + count as usize);
                if from > 0 {
                    data.drain(..from);
                }
                Ok(Cow::Owned(data))
            }
            ByteBuffer::Composite(b) => b.get_range(offset, count),
            ByteBuffer::File(b) => b.read_range(offset, count).map(Cow::Owned),
            ByteBuffer::Even(b) => {
                let inner_size = b.inner.size();
                if offset + count <= inner_size {
                    return b.inner.get_range(offset, count);
                }
                let mut data = if offset < inner_size {
                    b.inner.get_range(offset, inner_size - offset)?.into_owned()
                } else {
                    Vec::with_capacity(1)
                };
                data.push(0);
                Ok(Cow::Owned(data))
            }
        }
    }

    /// Copy the full content of the buffer to the given writer.
    ///
    /// Composite buffers are written child by child
    /// and file regions are streamed in chunks,
    /// so the whole content is never held in memory at once.
    pub fn write_to<W>(&self, to: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        match self {
            ByteBuffer::Empty => Ok(()),
            ByteBuffer::Memory(data) => to.write_all(data).context(WriteTargetSnafu),
            ByteBuffer::Composite(b) => b.write_to(to),
            ByteBuffer::File(b) => b.write_to(to),
            ByteBuffer::Even(b) => {
                b.inner.write_to(to)?;
                to.write_all(&[0]).context(WriteTargetSnafu)
            }
            ByteBuffer::Range(_) | ByteBuffer::Swap(_) => {
                let data = self.data()?;
                to.write_all(&data).context(WriteTargetSnafu)
            }
        }
    }

    /// Obtain the content of this buffer as shared bytes.
    ///
    /// This does not copy memory buffers.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            ByteBuffer::Memory(data) => Ok(data.clone()),
            _ => Ok(Bytes::from(self.data()?.into_owned())),
        }
    }

    /// Obtain a copy of the content of this buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.data().map(Cow::into_owned)
    }
}

pub(crate) fn check_range(offset: u64, count: u64, size: u64) -> Result<()> {
    ensure!(
        offset
            .checked_add(count)
            .map(|end| end <= size)
            .unwrap_or(false),
        OutOfBoundsSnafu {
            offset,
            count,
            size
        }
    );
    Ok(())
}
