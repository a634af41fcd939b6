//! Error type shared by the buffers, sources and targets of this crate.
use snafu::{Backtrace, Snafu};
use std::path::PathBuf;

/// An error raised while reading or writing bytes.
///
/// Boundary violations and milestone misuse are programming errors
/// and always abort the current operation.
/// [`InsufficientData`](Error::InsufficientData) is only produced
/// by sources with a known, fixed length;
/// open-ended sources report a shortage through
/// [`ByteSource::require`](crate::source::ByteSource::require) instead.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "Range of {} bytes at offset {} is outside of buffer with {} bytes",
        count,
        offset,
        size
    ))]
    OutOfBounds {
        offset: u64,
        count: u64,
        size: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid byte swap unit {} (must be 2, 4 or 8)", unit))]
    InvalidSwapUnit { unit: usize, backtrace: Backtrace },

    #[snafu(display(
        "Requested {} bytes but only {} are available in fixed-length source",
        requested,
        available
    ))]
    InsufficientData {
        requested: u64,
        available: u64,
        backtrace: Backtrace,
    },

    /// Cannot add data to a source of fixed length
    ExtendFixedSource { backtrace: Backtrace },

    /// No rewind point was marked in this source
    NoMarker { backtrace: Backtrace },

    /// Tried to pop a milestone from an empty stack
    MilestoneUnderflow { backtrace: Backtrace },

    #[snafu(display(
        "Milestone at offset {} is not the most recent one (top is at {})",
        offset,
        top
    ))]
    MilestoneOrder {
        offset: u64,
        top: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Milestone at offset {} extends beyond the enclosing one at {}",
        offset,
        parent
    ))]
    MilestoneOutsideParent {
        offset: u64,
        parent: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not open file {}", path.display()))]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read {} bytes at offset {} from {}", len, offset, path.display()))]
    ReadFile {
        path: PathBuf,
        offset: u64,
        len: u64,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// Could not read from the underlying stream
    ReadSource {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// Could not seek the underlying stream
    SeekSource {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// Could not write to the underlying stream
    WriteTarget {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
