#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    unused_qualifications,
    unused_import_braces,
    unused_extern_crates,
    missing_debug_implementations
)]
//! This crate is the binary data plane of the DICOM-rs pixel data stack.
//!
//! It provides:
//!
//! - [`endian`]: byte order detection and swap primitives;
//! - [`buffer`]: the [`ByteBuffer`] abstraction
//!   over memory, views, concatenations and file regions;
//! - [`source`]: byte sources for reading primitive values and buffers
//!   with nested milestone tracking;
//! - [`target`]: byte targets for writing them back,
//!   synchronously or (with the `async` feature) asynchronously.
//!
//! # Example
//!
//! ```
//! use dicom_io::{ByteBuffer, ByteSource, BufferByteSource, Endianness};
//! # fn main() -> Result<(), dicom_io::Error> {
//! let data = ByteBuffer::from(vec![0x02, 0x00, 0xAB, 0xCD]);
//! let mut source = BufferByteSource::fixed([data], Endianness::Little)?;
//! let len = source.read_u16()?;
//! let milestone = source.push_milestone(len as u64)?;
//! let value = source.read_buffer(len as u64)?;
//! assert!(source.has_reached_milestone());
//! source.pop_milestone(milestone)?;
//! assert_eq!(&*value.data()?, &[0xAB, 0xCD]);
//! # Ok(())
//! # }
//! ```
pub mod buffer;
pub mod endian;
pub mod error;
pub mod options;
pub mod source;
pub mod target;

pub use crate::buffer::ByteBuffer;
pub use crate::endian::Endianness;
pub use crate::error::{Error, Result};
pub use crate::options::{ReadOption, ReadOptions};
pub use crate::source::{BufferByteSource, ByteSource, ReadByteSource, StreamByteSource};
pub use crate::target::{ByteTarget, FileByteTarget};

// re-export for the convenience of dependents
pub use bytes;
pub use snafu;
