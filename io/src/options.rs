//! Options for reading byte sources.

/// The default size in bytes from which a buffer is considered a large object.
pub const DEFAULT_LARGE_OBJECT_SIZE: u64 = 64 * 1024;

/// An enumerate of the policies for reading large buffers.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ReadOption {
    /// Defer reading large buffers until their data is requested,
    /// whenever the source is backed by a file.
    ReadLargeOnDemand,
    /// Always read buffers into memory.
    ReadAll,
}

impl Default for ReadOption {
    fn default() -> Self {
        ReadOption::ReadLargeOnDemand
    }
}

/// A builder type for the options of a byte source.
///
/// # Example
///
/// ```
/// # use dicom_io::{ReadOptions, ReadOption};
/// let options = ReadOptions::new()
///     .large_object_size(1 << 20)
///     .read_option(ReadOption::ReadAll);
/// assert_eq!(options.get_large_object_size(), 1 << 20);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ReadOptions {
    large_object_size: u64,
    read_option: ReadOption,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            large_object_size: DEFAULT_LARGE_OBJECT_SIZE,
            read_option: ReadOption::default(),
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        ReadOptions::default()
    }

    /// Set the size in bytes from which a buffer is a large object.
    pub fn large_object_size(mut self, size: u64) -> Self {
        self.large_object_size = size;
        self
    }

    /// Set the policy for reading large objects.
    pub fn read_option(mut self, option: ReadOption) -> Self {
        self.read_option = option;
        self
    }

    pub fn get_large_object_size(&self) -> u64 {
        self.large_object_size
    }

    pub fn get_read_option(&self) -> ReadOption {
        self.read_option
    }

    /// Whether a buffer of `count` bytes should be read on demand.
    pub fn defers(&self, count: u64) -> bool {
        self.read_option == ReadOption::ReadLargeOnDemand && count >= self.large_object_size
    }
}
