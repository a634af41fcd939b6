#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    unused_qualifications,
    unused_import_braces,
    unused_extern_crates,
    missing_debug_implementations
)]
//! This crate contains the DICOM transfer syntax registry.
//!
//! The transfer syntax registry maps a DICOM UID of a transfer syntax
//! into the respective transfer syntax specifier,
//! together with the pixel data codec which can handle it.
//!
//! The registry is a plain value:
//! build one with [`TransferSyntaxRegistry::default`]
//! and pass it around by reference.
//!
//! ```
//! use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
//!
//! let registry = TransferSyntaxRegistry::default();
//! let rle = registry.get("1.2.840.10008.1.2.5\0").unwrap();
//! assert_eq!(rle.name(), "RLE Lossless");
//! # #[cfg(feature = "rle")]
//! assert!(rle.fully_supported());
//! ```
use dicom_pixeldata::adapters::{
    DynPixelDataReader, DynPixelDataWriter, PixelDataReader, PixelDataWriter,
};
use dicom_pixeldata::TransferSyntax;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

pub mod adapters;
pub mod entries;

pub use dicom_pixeldata;

/// The pixel data codec attached to a transfer syntax.
pub enum Codec {
    /// Pixel data is native, no codec is necessary.
    None,
    /// Pixel data is encapsulated,
    /// but this build cannot encode nor decode it.
    /// Fragments may still be read and written as they are.
    EncapsulatedPixelData,
    /// Pixel data is encapsulated
    /// and may be decoded and/or encoded with these adapters.
    PixelData(Option<DynPixelDataReader>, Option<DynPixelDataWriter>),
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Codec::None => f.write_str("None"),
            Codec::EncapsulatedPixelData => f.write_str("EncapsulatedPixelData"),
            Codec::PixelData(reader, writer) => f
                .debug_tuple("PixelData")
                .field(&reader.as_ref().map(|_| "PixelDataReader"))
                .field(&writer.as_ref().map(|_| "PixelDataWriter"))
                .finish(),
        }
    }
}

impl Codec {
    /// Whether this codec supports more than `other`.
    fn adds_capability_over(&self, other: &Codec) -> bool {
        matches!(
            (other, self),
            (Codec::EncapsulatedPixelData, Codec::PixelData(..))
                | (Codec::PixelData(None, _), Codec::PixelData(Some(_), _))
                | (Codec::PixelData(_, None), Codec::PixelData(_, Some(_)))
        )
    }
}

/// A transfer syntax descriptor paired with its codec.
#[derive(Debug)]
pub struct TransferSyntaxEntry {
    syntax: TransferSyntax,
    codec: Codec,
}

impl TransferSyntaxEntry {
    pub fn new(syntax: TransferSyntax, codec: Codec) -> Self {
        TransferSyntaxEntry { syntax, codec }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub fn uid(&self) -> &'static str {
        self.syntax.uid()
    }

    /// Obtain the name of this transfer syntax.
    pub fn name(&self) -> &'static str {
        self.syntax.name()
    }

    pub fn syntax(&self) -> &TransferSyntax {
        &self.syntax
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Retrieve the pixel data decoder, if any.
    pub fn reader(&self) -> Option<&(dyn PixelDataReader + Send + Sync)> {
        match &self.codec {
            Codec::PixelData(Some(reader), _) => Some(reader.as_ref()),
            _ => None,
        }
    }

    /// Retrieve the pixel data encoder, if any.
    pub fn writer(&self) -> Option<&(dyn PixelDataWriter + Send + Sync)> {
        match &self.codec {
            Codec::PixelData(_, Some(writer)) => Some(writer.as_ref()),
            _ => None,
        }
    }

    /// Check whether pixel data in this transfer syntax
    /// can be both read and written as native pixel data.
    pub fn fully_supported(&self) -> bool {
        matches!(
            self.codec,
            Codec::None | Codec::PixelData(Some(_), Some(_))
        )
    }
}

/// Data type for a registry of DICOM transfer syntaxes.
pub struct TransferSyntaxRegistry {
    m: HashMap<&'static str, TransferSyntaxEntry>,
}

impl fmt::Debug for TransferSyntaxRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries: HashMap<&str, &str> =
            self.m.iter().map(|(uid, ts)| (*uid, ts.name())).collect();
        f.debug_struct("TransferSyntaxRegistry")
            .field("m", &entries)
            .finish()
    }
}

impl Default for TransferSyntaxRegistry {
    /// Create a registry with all built-in transfer syntaxes.
    fn default() -> Self {
        let mut registry = TransferSyntaxRegistry::new();
        for entry in entries::built_in() {
            registry.register(entry);
        }
        registry
    }
}

impl TransferSyntaxRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TransferSyntaxRegistry { m: HashMap::new() }
    }

    /// Obtain a transfer syntax entry by its UID.
    ///
    /// A trailing null character, as found in padded UID values,
    /// is ignored.
    pub fn get<U: AsRef<str>>(&self, uid: U) -> Option<&TransferSyntaxEntry> {
        let uid = uid.as_ref();
        let uid = uid.strip_suffix('\0').unwrap_or(uid);
        self.m.get(uid)
    }

    /// Register the given transfer syntax entry.
    ///
    /// It can override another entry with the same UID
    /// only in the case that the new entry supports
    /// more pixel data operations than the one registered before.
    /// Otherwise, this function returns `false`
    /// and no changes are made.
    pub fn register(&mut self, entry: TransferSyntaxEntry) -> bool {
        match self.m.entry(entry.uid()) {
            Entry::Occupied(mut e) => {
                let replace = entry.codec.adds_capability_over(&e.get().codec);
                if replace {
                    e.insert(entry);
                } else if matches!(
                    (&e.get().codec, &entry.codec),
                    (Codec::None, Codec::PixelData(..))
                ) {
                    warn!(
                        "Inconsistent requirements for transfer syntax {}: native pixel data cannot be replaced with a pixel data codec",
                        entry.uid()
                    );
                }
                replace
            }
            Entry::Vacant(e) => {
                e.insert(entry);
                true
            }
        }
    }

    /// The number of registered transfer syntaxes.
    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    /// Iterate over all registered entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TransferSyntaxEntry> {
        self.m.values()
    }
}

/// Retrieve the default transfer syntax.
pub fn default() -> TransferSyntax {
    entries::IMPLICIT_VR_LITTLE_ENDIAN
}

/// Create a descriptor for an encapsulated transfer syntax
/// without built-in pixel data support.
pub(crate) const fn create_ts_stub(uid: &'static str, name: &'static str) -> TransferSyntax {
    TransferSyntax::new_encapsulated(uid, name)
}
