//! Asynchronous byte target on top of tokio.
use crate::buffer::check_range;
use crate::endian::Endianness;
use crate::error::{Result, WriteTargetSnafu};
use bytes::Bytes;
use snafu::ResultExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

macro_rules! write_primitive {
    ($name: ident, $t: ty) => {
        pub async fn $name(&self, value: $t) -> Result<()> {
            let bytes = match self.endianness {
                Endianness::Little => value.to_le_bytes(),
                Endianness::Big => value.to_be_bytes(),
            };
            self.write_all(&bytes).await
        }
    };
}

/// An asynchronous writer of primitive values and byte regions.
///
/// Writes are serialized through an internal lock,
/// so clones of the target share the same writer and position.
/// The position only counts bytes whose write has completed,
/// never bytes still queued.
#[derive(Debug)]
pub struct AsyncByteTarget<W> {
    to: Arc<Mutex<W>>,
    position: Arc<AtomicU64>,
    endianness: Endianness,
}

impl<W> Clone for AsyncByteTarget<W> {
    fn clone(&self) -> Self {
        AsyncByteTarget {
            to: self.to.clone(),
            position: self.position.clone(),
            endianness: self.endianness,
        }
    }
}

impl<W> AsyncByteTarget<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(to: W, endianness: Endianness) -> Self {
        AsyncByteTarget {
            to: Arc::new(Mutex::new(to)),
            position: Arc::new(AtomicU64::new(0)),
            endianness,
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    async fn write_all(&self, bytes: &[u8]) -> Result<()> {
        let mut to = self.to.lock().await;
        to.write_all(bytes).await.context(WriteTargetSnafu)?;
        self.position
            .fetch_add(bytes.len() as u64, Ordering::AcqRel);
        Ok(())
    }

    pub async fn write_u8(&self, value: u8) -> Result<()> {
        self.write_all(&[value]).await
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
    pub async fn write_bytes(&self, bytes: &[u8], offset: usize, count: usize) -> Result<()> {
        check_range(offset as u64, count as u64, bytes.len() as u64)?;
        self.write_all(&bytes[offset..offset + count]).await
    }

    /// Write `count` bytes of `bytes` starting at `offset`
    /// in a background task.
    ///
    /// The callback receives `true` once the bytes were written,
    /// or `false` if the write failed.
    /// A failure is logged and goes no further than the callback.
    ///
    /// Must be called from within a tokio runtime.
    pub fn write_detached<F>(
        &self,
        bytes: Bytes,
        offset: usize,
        count: usize,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let target = self.clone();
        tokio::spawn(async move {
            let outcome = target.write_bytes(&bytes, offset, count).await;
            let outcome = match outcome {
                Ok(()) => target.flush().await,
                e => e,
            };
            match outcome {
                Ok(()) => callback(true),
                Err(e) => {
                    warn!("Detached write of {} bytes failed: {}", count, e);
                    callback(false);
                }
            }
        })
    }

    pub async fn flush(&self) -> Result<()> {
        self.to
            .lock()
            .await
            .flush()
            .await
            .context(WriteTargetSnafu)
    }

    /// Retrieve the underlying writer,
    /// or the target itself if it is still shared.
    pub fn try_into_inner(self) -> std::result::Result<W, Self> {
        let AsyncByteTarget {
            to,
            position,
            endianness,
        } = self;
        match Arc::try_unwrap(to) {
            Ok(mutex) => Ok(mutex.into_inner()),
            Err(to) => Err(AsyncByteTarget {
                to,
                position,
                endianness,
            }),
        }
    }
}
