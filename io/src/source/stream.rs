use super::{ByteSource, Milestones};
use crate::buffer::{ByteBuffer, FileBuffer};
use crate::endian::Endianness;
use crate::error::{
    InsufficientDataSnafu, NoMarkerSnafu, OpenFileSnafu, ReadSourceSnafu, Result, SeekSourceSnafu,
};
use crate::options::ReadOptions;
use snafu::{ensure, OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A byte source over a seekable stream of known length.
///
/// The stream is owned exclusively by the source.
/// Reading past the end of the stream is an error,
/// and so is [requiring](ByteSource::require) more bytes than are left.
///
/// When opened from a file path,
/// buffers at or above the configured large-object size
/// are not read into memory:
/// a [`FileBuffer`] over the same region is returned instead,
/// and the stream skips past it.
#[derive(Debug)]
pub struct StreamByteSource<S> {
    stream: S,
    /// Absolute position in the stream
    position: u64,
    /// Total length of the stream
    length: u64,
    marker: Option<u64>,
    endianness: Endianness,
    milestones: Milestones,
    options: ReadOptions,
    /// The file backing the stream, if known
    origin: Option<Arc<Path>>,
}

impl StreamByteSource<BufReader<File>> {
    /// Open the file at the given path for reading.
    pub fn open(
        path: impl AsRef<Path>,
        endianness: Endianness,
        options: ReadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(OpenFileSnafu {
            path: PathBuf::from(path),
        })?;
        let mut source = Self::with_options(BufReader::new(file), endianness, options)?;
        source.origin = Some(Arc::from(path));
        Ok(source)
    }
}

impl<S> StreamByteSource<S>
where
    S: Read + Seek,
{
    /// Create a source reading from the stream's current position
    /// with the default options.
    pub fn new(stream: S, endianness: Endianness) -> Result<Self> {
        Self::with_options(stream, endianness, ReadOptions::default())
    }

    /// Create a source reading from the stream's current position.
    ///
    /// Without a backing file,
    /// large objects are always read into memory.
    pub fn with_options(mut stream: S, endianness: Endianness, options: ReadOptions) -> Result<Self> {
        let position = stream.stream_position().context(SeekSourceSnafu)?;
        let length = stream.seek(SeekFrom::End(0)).context(SeekSourceSnafu)?;
        stream
            .seek(SeekFrom::Start(position))
            .context(SeekSourceSnafu)?;
        Ok(StreamByteSource {
            stream,
            position,
            length,
            marker: None,
            endianness,
            milestones: Milestones::new(),
            options,
            origin: None,
        })
    }

    /// The total length of the stream.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Retrieve the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
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

    fn seek_to(&mut self, position: u64) -> Result<()> {
        self.stream
            .seek(SeekFrom::Start(position))
            .context(SeekSourceSnafu)?;
        self.position = position;
        Ok(())
    }
}

impl<S> ByteSource for StreamByteSource<S>
where
    S: Read + Seek,
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
        self.position >= self.length
    }

    fn can_rewind(&self) -> bool {
        self.marker.is_some()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.check_available(buf.len() as u64)?;
        self.stream.read_exact(buf).context(ReadSourceSnafu)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn read_buffer(&mut self, count: u64) -> Result<ByteBuffer> {
        if count == 0 {
            return Ok(ByteBuffer::Empty);
        }
        self.check_available(count)?;

        if self.options.defers(count) {
            if let Some(origin) = &self.origin {
                debug!(
                    "Deferring read of {} bytes at position {}",
                    count, self.position
                );
                let buffer = FileBuffer::from_shared(origin.clone(), self.position, count);
                self.seek_to(self.position + count)?;
                return Ok(ByteBuffer::File(buffer));
            }
            debug!(
                "Source has no backing file, reading {} bytes into memory",
                count
            );
        }

        let mut data = vec![0; count as usize];
        self.read_into(&mut data)?;
        Ok(ByteBuffer::from(data))
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        self.check_available(count)?;
        self.seek_to(self.position + count)
    }

    fn mark(&mut self) {
        self.marker = Some(self.position);
    }

    fn rewind(&mut self) -> Result<()> {
        let marker = self.marker.context(NoMarkerSnafu)?;
        self.seek_to(marker)
    }

    fn milestones(&self) -> &Milestones {
        &self.milestones
    }

    fn milestones_mut(&mut self) -> &mut Milestones {
        &mut self.milestones
    }

    fn require(&mut self, count: u64) -> Result<bool> {
        self.check_available(count)?;
        Ok(true)
    }
}
