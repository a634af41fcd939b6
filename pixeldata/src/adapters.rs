//! Core module for building pixel data adapters.
//!
//! Transfer syntaxes which define an encapsulated pixel data encoding
//! provide implementations of
//! [`PixelDataReader`] and [`PixelDataWriter`]
//! to decode and encode imaging data, respectively.
//! Both work frame by frame,
//! reading from one [`PixelData`] and adding frames to another.
use crate::attribute::ImageAttributes;
use crate::frame::PixelData;
use dicom_io::ByteBuffer;
use snafu::{ensure, ResultExt, Snafu};

/// The possible error conditions when decoding (reading) pixel data.
///
/// Users of this type are free to handle errors based on their variant,
/// but should not make decisions based on the display message,
/// since that is not considered part of the API
/// and may change on any new release.
///
/// Implementers of transfer syntaxes
/// are recommended to choose the most fitting error variant
/// for the tested condition.
/// When no suitable variant is available,
/// the [`Custom`](DecodeError::Custom) variant may be used.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub), module)]
pub enum DecodeError {
    /// A custom error occurred when decoding,
    /// reported as a dynamic error value with a message.
    ///
    /// The [`whatever!`](snafu::whatever) macro can be used
    /// to easily create an error of this kind.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The input pixel data is not encapsulated.
    NotEncapsulated,

    /// The requested frame range is outside the given object's frame range.
    FrameRangeOutOfBounds,

    #[snafu(display("Unsupported bits allocated {}", bits_allocated))]
    UnsupportedBitsAllocated { bits_allocated: u16 },

    #[snafu(display(
        "Frame #{} has {} segments, expected {}",
        frame,
        found,
        expected
    ))]
    SegmentCount {
        frame: u32,
        expected: u32,
        found: u32,
    },

    #[snafu(display("Segment {} of frame #{} is outside of the fragment", segment, frame))]
    SegmentOutOfBounds { frame: u32, segment: u32 },

    #[snafu(display(
        "Literal run in segment {} of frame #{} overflows its input or output",
        segment,
        frame
    ))]
    LiteralRunOverflow { frame: u32, segment: u32 },

    #[snafu(display(
        "Repeat run in segment {} of frame #{} overflows its input or output",
        segment,
        frame
    ))]
    RepeatRunOverflow { frame: u32, segment: u32 },

    #[snafu(display("Could not read frame #{}", frame))]
    ReadFrame {
        frame: u32,
        #[snafu(backtrace)]
        source: crate::Error,
    },

    /// Could not add a decoded frame
    AddFrame {
        #[snafu(backtrace)]
        source: crate::Error,
    },
}

/// The possible error conditions when encoding (writing) pixel data.
///
/// Users of this type are free to handle errors based on their variant,
/// but should not make decisions based on the display message,
/// since that is not considered part of the API
/// and may change on any new release.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub), module)]
pub enum EncodeError {
    /// A custom error when encoding fails.
    /// Read the `message` and the underlying `source`
    /// for more details.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// Input pixel data is not native, should be decoded first.
    NotNative,

    /// The requested frame range is outside the given object's frame range.
    FrameRangeOutOfBounds,

    #[snafu(display("Unsupported bits allocated {}", bits_allocated))]
    UnsupportedBitsAllocated { bits_allocated: u16 },

    #[snafu(display(
        "Sample byte {} of frame #{} is past the end of the frame",
        segment,
        frame
    ))]
    SegmentOutOfBounds { frame: u32, segment: u32 },

    #[snafu(display("Could not read frame #{}", frame))]
    ReadFrame {
        frame: u32,
        #[snafu(backtrace)]
        source: crate::Error,
    },

    /// Could not add an encoded frame
    AddFrame {
        #[snafu(backtrace)]
        source: crate::Error,
    },
}

/// The result of decoding (reading) pixel data
pub type DecodeResult<T, E = DecodeError> = Result<T, E>;

/// The result of encoding (writing) pixel data
pub type EncodeResult<T, E = EncodeError> = Result<T, E>;

/// Custom options when decoding pixel data.
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// Whether the byte segments of each sample
    /// are ordered least significant byte first,
    /// instead of the usual most significant byte first.
    pub reverse_byte_order: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Custom options when encoding pixel data into an encapsulated form.
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct EncodeOptions {
    /// Whether to write the byte segments of each sample
    /// least significant byte first,
    /// instead of the usual most significant byte first.
    pub reverse_byte_order: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Trait object responsible for decoding
/// pixel data based on the transfer syntax.
///
/// A transfer syntax with support for decoding encapsulated pixel data
/// would implement these methods.
pub trait PixelDataReader {
    /// Decode all frames of `src`,
    /// adding them to `dst` in order.
    ///
    /// It is a necessary precondition that the pixel data
    /// is encoded in accordance to the transfer syntax(es)
    /// supported by this adapter.
    /// A `NotEncapsulated` error is returned otherwise.
    fn decode(
        &self,
        src: &PixelData,
        dst: &mut PixelData,
        options: &DecodeOptions,
    ) -> DecodeResult<()> {
        for frame in 0..src.number_of_frames() {
            let data = self.decode_frame(src, frame, dst.attributes(), options)?;
            dst.add_frame(data).context(decode_error::AddFrameSnafu)?;
        }
        Ok(())
    }

    /// Decode a single frame of `src` into native pixel data
    /// in little endian,
    /// laid out as described by `dst`
    /// (in particular its planar configuration).
    fn decode_frame(
        &self,
        src: &PixelData,
        frame: u32,
        dst: &ImageAttributes,
        options: &DecodeOptions,
    ) -> DecodeResult<ByteBuffer>;
}

/// Trait object responsible for encoding
/// pixel data based on a certain transfer syntax.
///
/// A transfer syntax with support for creating compressed pixel data
/// would implement these methods.
pub trait PixelDataWriter {
    /// Encode all frames of `src`,
    /// adding them to `dst` in order.
    ///
    /// All implementations are required to support
    /// encoding pixel data in a _native encoding_.
    /// A `NotNative` error is returned
    /// if the pixel data is encapsulated.
    fn encode(
        &self,
        src: &PixelData,
        dst: &mut PixelData,
        options: &EncodeOptions,
    ) -> EncodeResult<()> {
        for frame in 0..src.number_of_frames() {
            let data = self.encode_frame(src, frame, options)?;
            dst.add_frame(data).context(encode_error::AddFrameSnafu)?;
        }
        Ok(())
    }

    /// Encode a single frame of `src`,
    /// returning the content of one pixel data fragment.
    fn encode_frame(
        &self,
        src: &PixelData,
        frame: u32,
        options: &EncodeOptions,
    ) -> EncodeResult<ByteBuffer>;
}

/// Alias type for a dynamically dispatched pixel data reader.
pub type DynPixelDataReader = Box<dyn PixelDataReader + Send + Sync + 'static>;

/// Alias type for a dynamically dispatched pixel data writer.
pub type DynPixelDataWriter = Box<dyn PixelDataWriter + Send + Sync + 'static>;

/// Check that a frame is within the frames of `src`,
/// for adapters decoding one frame at a time.
pub fn check_decode_frame(src: &PixelData, frame: u32) -> DecodeResult<()> {
    ensure!(src.is_encapsulated(), decode_error::NotEncapsulatedSnafu);
    ensure!(
        frame < src.number_of_frames(),
        decode_error::FrameRangeOutOfBoundsSnafu
    );
    Ok(())
}

/// Check that a frame is within the frames of `src`,
/// for adapters encoding one frame at a time.
pub fn check_encode_frame(src: &PixelData, frame: u32) -> EncodeResult<()> {
    ensure!(!src.is_encapsulated(), encode_error::NotNativeSnafu);
    ensure!(
        frame < src.number_of_frames(),
        encode_error::FrameRangeOutOfBoundsSnafu
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::tests::{EXPLICIT_LE, RLE};

    /// Encodes each frame by reversing its bytes.
    struct Reverse;

    impl PixelDataWriter for Reverse {
        fn encode_frame(
            &self,
            src: &PixelData,
            frame: u32,
            _options: &EncodeOptions,
        ) -> EncodeResult<ByteBuffer> {
            check_encode_frame(src, frame)?;
            let mut data = src
                .frame_data(frame)
                .context(encode_error::ReadFrameSnafu { frame })?
                .to_vec();
            data.reverse();
            Ok(data.into())
        }
    }

    impl PixelDataReader for Reverse {
        fn decode_frame(
            &self,
            src: &PixelData,
            frame: u32,
            _dst: &ImageAttributes,
            _options: &DecodeOptions,
        ) -> DecodeResult<ByteBuffer> {
            check_decode_frame(src, frame)?;
            let mut data = src
                .frame_data(frame)
                .context(decode_error::ReadFrameSnafu { frame })?
                .to_vec();
            data.reverse();
            Ok(data.into())
        }
    }

    #[test]
    fn encode_and_decode_all_frames() {
        let attrs = ImageAttributes::new(1, 4, 8).unwrap();
        let mut native = PixelData::new(attrs.clone(), EXPLICIT_LE).unwrap();
        native.add_frame(vec![1_u8, 2, 3, 4].into()).unwrap();
        native.add_frame(vec![5_u8, 6, 7, 8].into()).unwrap();

        let mut encoded = PixelData::new(attrs.clone(), RLE).unwrap();
        Reverse
            .encode(&native, &mut encoded, &EncodeOptions::new())
            .unwrap();
        assert_eq!(encoded.number_of_frames(), 2);
        assert_eq!(&*encoded.frame(1).unwrap().data().unwrap(), &[8, 7, 6, 5]);

        let mut decoded = PixelData::new(attrs, EXPLICIT_LE).unwrap();
        Reverse
            .decode(&encoded, &mut decoded, &DecodeOptions::new())
            .unwrap();
        assert_eq!(&*decoded.frame(0).unwrap().data().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(&*decoded.frame(1).unwrap().data().unwrap(), &[5, 6, 7, 8]);
    }

    #[test]
    fn frame_checks() {
        let attrs = ImageAttributes::new(1, 4, 8).unwrap();
        let native = PixelData::new(attrs, EXPLICIT_LE).unwrap();
        assert!(matches!(
            check_decode_frame(&native, 0),
            Err(DecodeError::NotEncapsulated)
        ));
        assert!(matches!(
            check_encode_frame(&native, 0),
            Err(EncodeError::FrameRangeOutOfBounds)
        ));
    }
}
