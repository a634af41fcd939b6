//! Transfer syntax descriptors, as far as pixel data is concerned.
use dicom_io::endian::Endianness;

/// A DICOM transfer syntax specifier.
///
/// Only the properties which decide how pixel data is laid out are kept:
/// the byte order of values,
/// whether pixel data is encapsulated in fragments,
/// and whether pixel data bytes are stored swapped
/// (a quirk of some private transfer syntaxes).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of data.
    byte_order: Endianness,
    /// Whether the value representation is explicit.
    explicit_vr: bool,
    /// Whether pixel data is stored as a sequence of fragments.
    encapsulated: bool,
    /// Whether pixel data words are stored with their bytes swapped.
    swap_pixel_data: bool,
}

impl TransferSyntax {
    /// Create a transfer syntax with native pixel data.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        explicit_vr: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            explicit_vr,
            encapsulated: false,
            swap_pixel_data: false,
        }
    }

    /// Create an explicit VR little endian transfer syntax
    /// with encapsulated pixel data.
    pub const fn new_encapsulated(uid: &'static str, name: &'static str) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order: Endianness::Little,
            explicit_vr: true,
            encapsulated: true,
            swap_pixel_data: false,
        }
    }

    /// Declare that pixel data words are stored with swapped bytes.
    pub const fn with_swapped_pixel_data(self) -> Self {
        TransferSyntax {
            swap_pixel_data: true,
            ..self
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain this transfer syntax' expected endianness.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Whether pixel data is encapsulated in a sequence of fragments.
    pub const fn is_encapsulated(&self) -> bool {
        self.encapsulated
    }

    pub const fn swaps_pixel_data(&self) -> bool {
        self.swap_pixel_data
    }
}
