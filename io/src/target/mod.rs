//! Sequential writing of primitive values and byte regions.
//!
//! [`ByteTarget`] writes synchronously to any [`Write`] implementation.
//! With the `async` feature,
//! [`AsyncByteTarget`](nonblocking::AsyncByteTarget) does the same
//! over tokio's `AsyncWrite`,
//! with support for detached writes reporting through a callback.
use crate::buffer::{check_range, ByteBuffer};
use crate::endian::Endianness;
use crate::error::{OpenFileSnafu, Result, WriteTargetSnafu};
use byteordered::ByteOrdered;
use snafu::ResultExt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "async")]
pub mod nonblocking;

macro_rules! write_primitive {
    ($name: ident, $t: ty) => {
        pub fn $name(&mut self, value: $t) -> Result<()> {
            ByteOrdered::runtime(&mut self.to, self.endianness)
                .$name(value)
                .context(WriteTargetSnafu)?;
            self.position += std::mem::size_of::<$t>() as u64;
            Ok(())
        }
    };
}

/// A byte target writing to a file.
pub type FileByteTarget = ByteTarget<BufWriter<File>>;

/// A writer of primitive values and byte regions
/// with the byte order of its values attached.
///
/// The target owns the underlying writer exclusively.
/// Its position counts the bytes handed over to the writer.
#[derive(Debug)]
pub struct ByteTarget<W> {
    to: W,
    endianness: Endianness,
    position: u64,
}

impl FileByteTarget {
    /// Create (or truncate) the file at the given path for writing.
    pub fn create(path: impl AsRef<Path>, endianness: Endianness) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).context(OpenFileSnafu {
            path: PathBuf::from(path),
        })?;
        Ok(ByteTarget::new(BufWriter::new(file), endianness))
    }
}

impl<W> ByteTarget<W>
where
    W: Write,
{
    pub fn new(to: W, endianness: Endianness) -> Self {
        ByteTarget {
            to,
            endianness,
            position: 0,
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Change the byte order of subsequent writes.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.to.write_all(&[value]).context(WriteTargetSnafu)?;
        self.position += 1;
        Ok(())
    }

    write_primitive!(write_i16, i16);
    write_primitive!(write_u16, u16);
    write_primitive!(write_i32, i32);
    write_primitive!(write_u32, u32);
    write_primitive!(write_i64, i64);
    write_primitive!(write_u64, u64);
    write_primitive!(write_f32, f32);
    write_primitive!(write_f64, f64);

    /// Write `count` bytes of `bytes` starting at `offset`.
    pub fn write_bytes(&mut self, bytes: &[u8], offset: usize, count: usize) -> Result<()> {
        check_range(offset as u64, count as u64, bytes.len() as u64)?;
        self.to
            .write_all(&bytes[offset..offset + count])
            .context(WriteTargetSnafu)?;
        self.position += count as u64;
        Ok(())
    }

    /// Write the full content of a buffer.
    pub fn write_buffer(&mut self, buffer: &ByteBuffer) -> Result<()> {
        buffer.write_to(&mut self.to)?;
        self.position += buffer.size();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.to.flush().context(WriteTargetSnafu)
    }

    /// Retrieve the underlying writer.
    pub fn into_inner(self) -> W {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::{ByteSource, ReadByteSource, StreamByteSource};
    use rstest::rstest;
    use std::io::Cursor;

    fn write_values(endianness: Endianness) -> Vec<u8> {
        let mut target = ByteTarget::new(Vec::new(), endianness);
        target.write_u8(7).unwrap();
        target.write_i16(-300).unwrap();
        target.write_u32(0xDEAD_BEEF).unwrap();
        target.write_i64(-1 << 40).unwrap();
        target.write_f32(0.5).unwrap();
        target.write_f64(-1e10).unwrap();
        target.into_inner()
    }

    fn read_values(source: &mut dyn ByteSource) {
        assert_eq!(source.read_u8().unwrap(), 7);
        assert_eq!(source.read_i16().unwrap(), -300);
        assert_eq!(source.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(source.read_i64().unwrap(), -1 << 40);
        assert_eq!(source.read_f32().unwrap(), 0.5);
        assert_eq!(source.read_f64().unwrap(), -1e10);
        assert_eq!(source.position(), 27);
    }

    #[rstest(endianness => [Endianness::Little, Endianness::Big])]
    fn primitives_read_back_from_sources(endianness: Endianness) {
        let data = write_values(endianness);
        assert_eq!(data.len(), 27);

        let mut source = StreamByteSource::new(Cursor::new(data.clone()), endianness).unwrap();
        read_values(&mut source);
        assert!(source.is_eof());

        let mut source = ReadByteSource::new(&data[..], endianness);
        read_values(&mut source);
    }

    #[test]
    fn write_primitives_in_both_orders() {
        let mut target = ByteTarget::new(Vec::new(), Endianness::Little);
        target.write_u8(0xFF).unwrap();
        target.write_u16(0x0102).unwrap();
        target.write_i32(-2).unwrap();
        target.set_endianness(Endianness::Big);
        target.write_u16(0x0102).unwrap();
        target.write_f64(2.0).unwrap();
        assert_eq!(target.position(), 17);

        let mut expected = vec![0xFF, 0x02, 0x01];
        expected.extend((-2_i32).to_le_bytes());
        expected.extend([0x01, 0x02]);
        expected.extend(2.0_f64.to_be_bytes());
        assert_eq!(target.into_inner(), expected);
    }

    #[test]
    fn write_sub_range() {
        let mut target = ByteTarget::new(Vec::new(), Endianness::Little);
        target.write_bytes(&[1, 2, 3, 4, 5], 1, 3).unwrap();
        assert_eq!(target.position(), 3);
        assert!(matches!(
            target.write_bytes(&[1, 2, 3], 2, 2),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(target.position(), 3);
        assert_eq!(target.into_inner(), vec![2, 3, 4]);
    }

    #[test]
    fn write_buffers() {
        let mut target = ByteTarget::new(Vec::new(), Endianness::Little);
        let composite = ByteBuffer::composite([
            ByteBuffer::from(vec![1_u8, 2]),
            ByteBuffer::even_length(ByteBuffer::from(vec![3_u8])),
        ]);
        target.write_buffer(&composite).unwrap();
        assert_eq!(target.position(), 4);
        assert_eq!(target.into_inner(), vec![1, 2, 3, 0]);
    }
}
