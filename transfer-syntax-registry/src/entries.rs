//! A list of compiled transfer syntax specifiers.
//!
//! The constants exported here are the descriptors
//! known to the default [`TransferSyntaxRegistry`](crate::TransferSyntaxRegistry).
//!
//! - **Fully implemented** means that the registry
//!   can read and write pixel data in this transfer syntax,
//!   including encoding and decoding encapsulated pixel data,
//!   if applicable.
//! - **Stub descriptors** serve to provide information about
//!   the transfer syntax.
//!   Pixel data fragments can be read and written,
//!   but not encoded or decoded.

use crate::{create_ts_stub, Codec, TransferSyntaxEntry};
use dicom_io::Endianness;
use dicom_pixeldata::TransferSyntax as Ts;

// -- the three base transfer syntaxes, fully supported --

/// **Fully implemented:** Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
);

/// **Fully implemented:** Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
);

/// **Fully implemented:** Explicit VR Big Endian
pub const EXPLICIT_VR_BIG_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
);

/// **Fully implemented:** GE Private Implicit VR Big Endian
///
/// Pixel data is stored in little endian
/// even though the rest of the data set is big endian.
pub const GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN: Ts = Ts::new(
    "1.2.840.113619.5.2",
    "GE Private Implicit VR Big Endian",
    Endianness::Big,
    false,
)
.with_swapped_pixel_data();

// -- RLE --

/// **Fully implemented:** RLE Lossless
///
/// Encoding and decoding require the `rle` feature.
pub const RLE_LOSSLESS: Ts = create_ts_stub("1.2.840.10008.1.2.5", "RLE Lossless");

// -- JPEG encoded pixel data --

/// **Stub descriptor:** JPEG Baseline (Process 1): Default Transfer Syntax for Lossy JPEG 8 Bit Image Compression
pub const JPEG_BASELINE: Ts = create_ts_stub("1.2.840.10008.1.2.4.50", "JPEG Baseline (Process 1)");

/// **Stub descriptor:** JPEG Extended (Process 2 & 4)
pub const JPEG_EXTENDED: Ts =
    create_ts_stub("1.2.840.10008.1.2.4.51", "JPEG Extended (Process 2 & 4)");

/// **Stub descriptor:** JPEG Lossless, Non-Hierarchical (Process 14)
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.57",
    "JPEG Lossless, Non-Hierarchical (Process 14)",
);

/// **Stub descriptor:** JPEG Lossless, Non-Hierarchical, First-Order Prediction
/// (Process 14 [Selection Value 1])
pub const JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
);

// -- JPEG-LS --

/// **Stub descriptor:** JPEG-LS Lossless Image Compression
pub const JPEG_LS_LOSSLESS_IMAGE_COMPRESSION: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.80",
    "JPEG-LS Lossless Image Compression",
);

/// **Stub descriptor:** JPEG-LS Lossy (Near-Lossless) Image Compression
pub const JPEG_LS_LOSSY_IMAGE_COMPRESSION: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.81",
    "JPEG-LS Lossy (Near-Lossless) Image Compression",
);

// -- JPEG 2000 --

/// **Stub descriptor:** JPEG 2000 Image Compression (Lossless Only)
pub const JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 Image Compression (Lossless Only)",
);

/// **Stub descriptor:** JPEG 2000 Image Compression
pub const JPEG_2000_IMAGE_COMPRESSION: Ts =
    create_ts_stub("1.2.840.10008.1.2.4.91", "JPEG 2000 Image Compression");

/// **Stub descriptor:** JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)
pub const JPEG_2000_PART2_MULTI_COMPONENT_IMAGE_COMPRESSION_LOSSLESS_ONLY: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.92",
    "JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)",
);

/// **Stub descriptor:** JPEG 2000 Part 2 Multi-component Image Compression
pub const JPEG_2000_PART2_MULTI_COMPONENT_IMAGE_COMPRESSION: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.93",
    "JPEG 2000 Part 2 Multi-component Image Compression",
);

// -- video --

/// **Stub descriptor:** MPEG2 Main Profile / Main Level
pub const MPEG2_MAIN_PROFILE_MAIN_LEVEL: Ts =
    create_ts_stub("1.2.840.10008.1.2.4.100", "MPEG2 Main Profile / Main Level");
/// **Stub descriptor:** MPEG2 Main Profile / High Level
pub const MPEG2_MAIN_PROFILE_HIGH_LEVEL: Ts =
    create_ts_stub("1.2.840.10008.1.2.4.101", "MPEG2 Main Profile / High Level");
/// **Stub descriptor:** MPEG-4 AVC/H.264 High Profile / Level 4.1
pub const MPEG4_AVC_H264_HIGH_PROFILE: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.102",
    "MPEG-4 AVC/H.264 High Profile / Level 4.1",
);
/// **Stub descriptor:** MPEG-4 AVC/H.264 BD-Compatible High Profile / Level 4.1
pub const MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.103",
    "MPEG-4 AVC/H.264 BD-Compatible High Profile / Level 4.1",
);
/// **Stub descriptor:** HEVC/H.265 Main Profile / Level 5.1
pub const HEVC_H265_MAIN_PROFILE: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.107",
    "HEVC/H.265 Main Profile / Level 5.1",
);
/// **Stub descriptor:** HEVC/H.265 Main 10 Profile / Level 5.1
pub const HEVC_H265_MAIN_10_PROFILE: Ts = create_ts_stub(
    "1.2.840.10008.1.2.4.108",
    "HEVC/H.265 Main 10 Profile / Level 5.1",
);

/// Build the registry entries of all transfer syntaxes above,
/// attaching the codecs available in this build.
pub(crate) fn built_in() -> Vec<TransferSyntaxEntry> {
    let mut entries: Vec<TransferSyntaxEntry> = [
        IMPLICIT_VR_LITTLE_ENDIAN,
        EXPLICIT_VR_LITTLE_ENDIAN,
        EXPLICIT_VR_BIG_ENDIAN,
        GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN,
    ]
    .into_iter()
    .map(|ts| TransferSyntaxEntry::new(ts, Codec::None))
    .collect();

    entries.push(TransferSyntaxEntry::new(RLE_LOSSLESS, rle_codec()));

    entries.extend(
        [
            JPEG_BASELINE,
            JPEG_EXTENDED,
            JPEG_LOSSLESS_NON_HIERARCHICAL,
            JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION,
            JPEG_LS_LOSSLESS_IMAGE_COMPRESSION,
            JPEG_LS_LOSSY_IMAGE_COMPRESSION,
            JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY,
            JPEG_2000_IMAGE_COMPRESSION,
            JPEG_2000_PART2_MULTI_COMPONENT_IMAGE_COMPRESSION_LOSSLESS_ONLY,
            JPEG_2000_PART2_MULTI_COMPONENT_IMAGE_COMPRESSION,
            MPEG2_MAIN_PROFILE_MAIN_LEVEL,
            MPEG2_MAIN_PROFILE_HIGH_LEVEL,
            MPEG4_AVC_H264_HIGH_PROFILE,
            MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE,
            HEVC_H265_MAIN_PROFILE,
            HEVC_H265_MAIN_10_PROFILE,
        ]
        .into_iter()
        .map(|ts| TransferSyntaxEntry::new(ts, Codec::EncapsulatedPixelData)),
    );
    entries
}

#[cfg(feature = "rle")]
fn rle_codec() -> Codec {
    use crate::adapters::rle_lossless::RleLosslessAdapter;
    Codec::PixelData(
        Some(Box::new(RleLosslessAdapter)),
        Some(Box::new(RleLosslessAdapter)),
    )
}

#[cfg(not(feature = "rle"))]
fn rle_codec() -> Codec {
    Codec::EncapsulatedPixelData
}
