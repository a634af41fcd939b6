use super::check_range;
use crate::error::{OpenFileSnafu, ReadFileSnafu, Result, WriteTargetSnafu};
use snafu::ResultExt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Size of the chunks used when streaming a file region to a writer.
const COPY_CHUNK_SIZE: usize = 1 << 20;

/// A region of a file which is only read on demand.
///
/// No file handle is kept between reads:
/// every access opens the file, seeks to the region, reads and closes it.
/// Any number of these buffers over the same file
/// can thus be read from independent threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuffer {
    path: Arc<Path>,
    offset: u64,
    len: u64,
}

impl FileBuffer {
    pub fn new(path: impl AsRef<Path>, offset: u64, len: u64) -> Self {
        FileBuffer {
            path: Arc::from(path.as_ref()),
            offset,
            len,
        }
    }

    pub(crate) fn from_shared(path: Arc<Path>, offset: u64, len: u64) -> Self {
        FileBuffer { path, offset, len }
    }

    /// The file backing this buffer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The absolute position of the region in the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The length of the region in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn open_at(&self, offset: u64) -> Result<File> {
        let mut file = File::open(&self.path).context(OpenFileSnafu {
            path: PathBuf::from(&*self.path),
        })?;
        file.seek(SeekFrom::Start(self.offset + offset))
            .context(ReadFileSnafu {
                path: PathBuf::from(&*self.path),
                offset: self.offset + offset,
                len: 0_u64,
            })?;
        Ok(file)
    }

    /// Read `count` bytes starting at `offset` of this region.
    pub fn read_range(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        check_range(offset, count, self.len)?;
        trace!(
            "Reading {} bytes at {} from {}",
            count,
            self.offset + offset,
            self.path.display()
        );
        let mut file = self.open_at(offset)?;
        let mut data = vec![0; count as usize];
        file.read_exact(&mut data).context(ReadFileSnafu {
            path: PathBuf::from(&*self.path),
            offset: self.offset + offset,
            len: count,
        })?;
        Ok(data)
    }

    pub(super) fn write_to<W>(&self, to: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let mut file = self.open_at(0)?;
        let mut chunk = vec![0; COPY_CHUNK_SIZE.min(self.len as usize)];
        let mut remaining = self.len;
        while remaining > 0 {
            let n = (remaining as usize).min(chunk.len());
            file.read_exact(&mut chunk[..n]).context(ReadFileSnafu {
                path: PathBuf::from(&*self.path),
                offset: self.offset + self.len - remaining,
                len: n as u64,
            })?;
            to.write_all(&chunk[..n]).context(WriteTargetSnafu)?;
            remaining -= n as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteBuffer;
    use crate::error::Error;

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&(0..100).collect::<Vec<u8>>()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_region_on_demand() {
        let file = sample_file();
        let buffer = ByteBuffer::file(file.path(), 20, 10);
        assert_eq!(buffer.size(), 10);
        assert!(!buffer.is_memory());
        assert_eq!(
            &*buffer.data().unwrap(),
            &[20, 21, 22, 23, 24, 25, 26, 27, 28, 29]
        );
        assert_eq!(&*buffer.get_range(8, 2).unwrap(), &[28, 29]);
        assert!(buffer.get_range(8, 3).is_err());

        let mut out = Vec::new();
        buffer.write_to(&mut out).unwrap();
        assert_eq!(out, (20..30).collect::<Vec<u8>>());
    }

    #[test]
    fn region_past_end_of_file_fails() {
        let file = sample_file();
        let buffer = FileBuffer::new(file.path(), 95, 10);
        let e = buffer.read_range(0, 10).unwrap_err();
        assert!(matches!(e, Error::ReadFile { .. }));
    }

    #[test]
    fn removed_file_is_reported() {
        let file = sample_file();
        let path = file.path().to_owned();
        let buffer = FileBuffer::new(&path, 0, 4);
        assert_eq!(buffer.read_range(0, 4).unwrap(), vec![0, 1, 2, 3]);
        drop(file);
        let e = buffer.read_range(0, 4).unwrap_err();
        assert!(matches!(e, Error::OpenFile { .. }));
    }
}
