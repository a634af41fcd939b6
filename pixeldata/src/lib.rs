#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    unused_qualifications,
    unused_import_braces,
    unused_extern_crates,
    missing_debug_implementations
)]
//! This crate contains the DICOM pixel data frame model
//! and the interfaces for pixel data codecs.
//!
//! - [`attribute`] interprets the image attributes
//!   which shape the pixel data of an object.
//! - [`object`] is the interface to the data set holding the pixel data,
//!   plus a plain in-memory implementation.
//! - [`element`] holds the pixel data element,
//!   either native or encapsulated in fragments.
//! - [`frame`] presents the pixel data as a sequence of frames
//!   through [`PixelData`].
//! - [`encapsulation`] reads and writes pixel data item sequences.
//! - [`adapters`] defines the traits to be implemented
//!   by pixel data decoders and encoders.
//!
//! # Example
//!
//! ```
//! use dicom_pixeldata::{ImageAttributes, PixelData, TransferSyntax};
//! use dicom_io::{ByteBuffer, Endianness};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! const EXPLICIT_VR_LE: TransferSyntax =
//!     TransferSyntax::new("1.2.840.10008.1.2.1", "Explicit VR Little Endian", Endianness::Little, true);
//!
//! let attrs = ImageAttributes::new(2, 2, 8)?;
//! let mut pixel_data = PixelData::new(attrs, EXPLICIT_VR_LE)?;
//! pixel_data.add_frame(ByteBuffer::from(vec![1_u8, 2, 3, 4]))?;
//! pixel_data.add_frame(ByteBuffer::from(vec![5_u8, 6, 7, 8]))?;
//! assert_eq!(pixel_data.number_of_frames(), 2);
//! assert_eq!(&*pixel_data.frame(1)?.data()?, &[5, 6, 7, 8]);
//! # Ok(())
//! # }
//! ```
use snafu::{Backtrace, Snafu};

pub mod adapters;
pub mod attribute;
pub mod element;
pub mod encapsulation;
pub mod frame;
pub mod object;
pub mod transfer_syntax;

pub use crate::attribute::{ImageAttributes, PixelRepresentation, PlanarConfiguration};
pub use crate::element::{PixelDataElement, PixelFragmentSequence};
pub use crate::frame::PixelData;
pub use crate::object::{InMemPixelObject, PixelDataObject};
pub use crate::transfer_syntax::TransferSyntax;

// re-export for the convenience of codec implementers
pub use dicom_io;

/// An error raised by the pixel data frame model.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Missing required attribute `{}`", name))]
    MissingAttribute {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid value `{}` for attribute `{}`", value, name))]
    InvalidAttribute {
        name: &'static str,
        value: String,
        backtrace: Backtrace,
    },

    /// The object has no pixel data element
    MissingPixelData { backtrace: Backtrace },

    #[snafu(display("Frame #{} is out of range (number of frames: {})", frame, frames))]
    FrameOutOfRange {
        frame: u32,
        frames: u32,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Cannot represent native pixel data with {} bits allocated",
        bits_allocated
    ))]
    UnsupportedBitsAllocated {
        bits_allocated: u16,
        backtrace: Backtrace,
    },

    /// Frames can only be added to pixel data created for writing
    NotAppendable { backtrace: Backtrace },

    #[snafu(display(
        "Cannot map {} fragments to {} frames without a complete offset table",
        fragments,
        frames
    ))]
    UnresolvableFragments {
        fragments: usize,
        frames: u32,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Offset {} of frame #{} does not start at a fragment boundary",
        offset,
        frame
    ))]
    FragmentOffsetMismatch {
        frame: u32,
        offset: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("Frame #{} is truncated", frame))]
    TruncatedFrame { frame: u32, backtrace: Backtrace },

    #[snafu(display(
        "Pixel data element does not match the transfer syntax {}",
        uid
    ))]
    InconsistentEncapsulation {
        uid: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Unexpected item ({:04X},{:04X}) in pixel sequence", group, element))]
    UnexpectedItem {
        group: u16,
        element: u16,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid basic offset table length {}", len))]
    InvalidOffsetTable { len: u32, backtrace: Backtrace },

    #[snafu(display("Fragment of {} bytes is too large for an item", size))]
    FragmentTooLarge { size: u64, backtrace: Backtrace },

    /// Could not access the pixel data bytes
    Buffer {
        #[snafu(backtrace)]
        source: dicom_io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
