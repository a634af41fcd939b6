//! Support for RLE Lossless image decoding and encoding.
//!
//! Each frame is encoded into one fragment,
//! which starts with a 64 byte header:
//! the number of segments followed by 15 segment offsets,
//! all as 32-bit little endian integers.
//! Each segment holds one byte of one sample of every pixel,
//! from the most significant byte to the least significant one,
//! compressed with a PackBits-like byte-oriented scheme.
//!
//! See <https://dicom.nema.org/medical/dicom/2023e/output/chtml/part05/chapter_G.html>
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dicom_io::ByteBuffer;
use dicom_pixeldata::adapters::{
    check_decode_frame, check_encode_frame, decode_error, encode_error, DecodeOptions,
    DecodeResult, EncodeOptions, EncodeResult, PixelDataReader, PixelDataWriter,
};
use dicom_pixeldata::{ImageAttributes, PixelData, PlanarConfiguration};
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use snafu::prelude::*;
use tracing::trace;

/// The length of the header of an RLE encoded frame.
const RLE_HEADER_LENGTH: usize = 64;

/// The maximum number of segments in an RLE encoded frame.
const MAX_SEGMENTS: usize = 15;

/// The longest literal or repeat run of a single control byte.
const MAX_RUN: usize = 128;

/// Pixel data adapter for the RLE Lossless transfer syntax.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RleLosslessAdapter;

/// Pixel data decoder for RLE Lossless (UID `1.2.840.10008.1.2.5`)
impl PixelDataReader for RleLosslessAdapter {
    fn decode(
        &self,
        src: &PixelData,
        dst: &mut PixelData,
        options: &DecodeOptions,
    ) -> DecodeResult<()> {
        let attributes = dst.attributes().clone();
        #[cfg(feature = "rayon")]
        let frames = (0..src.number_of_frames()).into_par_iter();
        #[cfg(not(feature = "rayon"))]
        let frames = 0..src.number_of_frames();

        let frames = frames
            .map(|frame| self.decode_frame(src, frame, &attributes, options))
            .collect::<DecodeResult<Vec<_>>>()?;
        for data in frames {
            dst.add_frame(data).context(decode_error::AddFrameSnafu)?;
        }
        Ok(())
    }

    /// Decode a single frame of the DICOM image from RLE Lossless.
    fn decode_frame(
        &self,
        src: &PixelData,
        frame: u32,
        dst: &ImageAttributes,
        options: &DecodeOptions,
    ) -> DecodeResult<ByteBuffer> {
        check_decode_frame(src, frame)?;

        let bits_allocated = dst.bits_allocated();
        ensure!(
            matches!(bits_allocated, 8 | 16 | 32),
            decode_error::UnsupportedBitsAllocatedSnafu { bits_allocated }
        );
        let layout = SegmentLayout::new(dst, options.reverse_byte_order);
        let expected = layout.segments();
        if expected > MAX_SEGMENTS {
            whatever!(
                "Cannot decode {} segments, at most {} are allowed",
                expected,
                MAX_SEGMENTS
            );
        }

        let data = src
            .frame_data(frame)
            .context(decode_error::ReadFrameSnafu { frame })?;
        if data.len() < RLE_HEADER_LENGTH {
            whatever!("RLE header of frame #{} is truncated", frame);
        }
        let (count, offsets) = read_rle_header(&data);
        ensure!(
            count as usize == expected,
            decode_error::SegmentCountSnafu {
                frame,
                expected: expected as u32,
                found: count,
            }
        );

        let mut out = vec![0; dst.uncompressed_frame_size() as usize];
        for segment in 0..expected {
            let start = offsets[segment] as usize;
            let end = if segment + 1 < expected {
                offsets[segment + 1] as usize
            } else {
                data.len()
            };
            ensure!(
                start >= RLE_HEADER_LENGTH && start <= end && end <= data.len(),
                decode_error::SegmentOutOfBoundsSnafu {
                    frame,
                    segment: segment as u32,
                }
            );
            let (pos, stride) = layout.position(segment);
            decode_segment(&data[start..end], &mut out, pos, stride).map_err(|e| match e {
                RunOverflow::Literal => decode_error::LiteralRunOverflowSnafu {
                    frame,
                    segment: segment as u32,
                }
                .build(),
                RunOverflow::Repeat => decode_error::RepeatRunOverflowSnafu {
                    frame,
                    segment: segment as u32,
                }
                .build(),
            })?;
        }

        trace!(
            "Decoded RLE frame #{} ({} segments, {} bytes)",
            frame,
            expected,
            out.len()
        );
        Ok(ByteBuffer::from(out))
    }
}

/// Pixel data encoder for RLE Lossless (UID `1.2.840.10008.1.2.5`)
impl PixelDataWriter for RleLosslessAdapter {
    fn encode(
        &self,
        src: &PixelData,
        dst: &mut PixelData,
        options: &EncodeOptions,
    ) -> EncodeResult<()> {
        #[cfg(feature = "rayon")]
        let frames = (0..src.number_of_frames()).into_par_iter();
        #[cfg(not(feature = "rayon"))]
        let frames = 0..src.number_of_frames();

        let frames = frames
            .map(|frame| self.encode_frame(src, frame, options))
            .collect::<EncodeResult<Vec<_>>>()?;
        for data in frames {
            dst.add_frame(data).context(encode_error::AddFrameSnafu)?;
        }
        Ok(())
    }

    /// Encode a single native frame into an RLE Lossless fragment.
    fn encode_frame(
        &self,
        src: &PixelData,
        frame: u32,
        options: &EncodeOptions,
    ) -> EncodeResult<ByteBuffer> {
        check_encode_frame(src, frame)?;

        let attributes = src.attributes();
        let bits_allocated = attributes.bits_allocated();
        ensure!(
            matches!(bits_allocated, 8 | 16 | 32),
            encode_error::UnsupportedBitsAllocatedSnafu { bits_allocated }
        );
        let layout = SegmentLayout::new(attributes, options.reverse_byte_order);
        let segments = layout.segments();
        if segments > MAX_SEGMENTS {
            whatever!(
                "Cannot encode {} segments, at most {} are allowed",
                segments,
                MAX_SEGMENTS
            );
        }

        let data = src
            .frame_data(frame)
            .context(encode_error::ReadFrameSnafu { frame })?;

        let mut encoder = RleEncoder::new();
        for segment in 0..segments {
            encoder.next_segment()?;
            let (mut pos, stride) = layout.position(segment);
            for _ in 0..layout.pixel_count {
                let byte = data.get(pos).copied().context(
                    encode_error::SegmentOutOfBoundsSnafu {
                        frame,
                        segment: segment as u32,
                    },
                )?;
                encoder.push(byte);
                pos += stride;
            }
        }
        let out = encoder.finish();

        trace!(
            "Encoded RLE frame #{} ({} segments, {} bytes)",
            frame,
            segments,
            out.len()
        );
        Ok(ByteBuffer::from(out))
    }
}

/// Where the bytes of each segment live in a native frame.
#[derive(Debug, Copy, Clone)]
struct SegmentLayout {
    bytes_allocated: usize,
    samples_per_pixel: usize,
    pixel_count: usize,
    planar_configuration: PlanarConfiguration,
    reverse_byte_order: bool,
}

impl SegmentLayout {
    fn new(attributes: &ImageAttributes, reverse_byte_order: bool) -> Self {
        SegmentLayout {
            bytes_allocated: attributes.bytes_allocated() as usize,
            samples_per_pixel: usize::from(attributes.samples_per_pixel()),
            pixel_count: attributes.pixel_count() as usize,
            planar_configuration: attributes.planar_configuration(),
            reverse_byte_order,
        }
    }

    fn segments(&self) -> usize {
        self.bytes_allocated * self.samples_per_pixel
    }

    /// The offset of the first byte of a segment in the frame,
    /// and the distance between two consecutive bytes of that segment.
    fn position(&self, segment: usize) -> (usize, usize) {
        let sample = segment / self.bytes_allocated;
        let byte = segment % self.bytes_allocated;
        let (pos, stride) = match self.planar_configuration {
            PlanarConfiguration::Interleaved => (
                sample * self.bytes_allocated,
                self.bytes_allocated * self.samples_per_pixel,
            ),
            PlanarConfiguration::Planar => (
                sample * self.bytes_allocated * self.pixel_count,
                self.bytes_allocated,
            ),
        };
        // the frame is little endian,
        // so the most significant byte comes last
        if self.reverse_byte_order {
            (pos + byte, stride)
        } else {
            (pos + self.bytes_allocated - byte - 1, stride)
        }
    }
}

/// Read the RLE header, returning the number of segments and their offsets.
///
/// The fragment must be at least as long as the header.
fn read_rle_header(fragment: &[u8]) -> (u32, [u32; MAX_SEGMENTS]) {
    let count = LittleEndian::read_u32(&fragment[0..4]);
    let mut offsets = [0; MAX_SEGMENTS];
    LittleEndian::read_u32_into(&fragment[4..RLE_HEADER_LENGTH], &mut offsets);
    (count, offsets)
}

/// The kind of run which did not fit in its segment or in the frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RunOverflow {
    Literal,
    Repeat,
}

/// Decode one segment into `dst`,
/// writing a byte every `stride` bytes from `pos`.
///
/// Decoding stops when the frame is full,
/// so a trailing padding byte is ignored.
fn decode_segment(
    segment: &[u8],
    dst: &mut [u8],
    mut pos: usize,
    stride: usize,
) -> Result<(), RunOverflow> {
    let end = segment.len();
    let mut i = 0;
    while i < end && pos < dst.len() {
        let control = segment[i] as i8;
        i += 1;
        match control {
            0..=127 => {
                let n = control as usize + 1;
                if end - i < n || pos + (n - 1) * stride >= dst.len() {
                    return Err(RunOverflow::Literal);
                }
                for &b in &segment[i..i + n] {
                    dst[pos] = b;
                    pos += stride;
                }
                i += n;
            }
            -127..=-1 => {
                let n = (1 - i16::from(control)) as usize;
                if i >= end || pos + (n - 1) * stride >= dst.len() {
                    return Err(RunOverflow::Repeat);
                }
                let b = segment[i];
                i += 1;
                for _ in 0..n {
                    dst[pos] = b;
                    pos += stride;
                }
            }
            // no-op
            -128 => {}
        }
        if i + 1 >= end {
            break;
        }
    }
    Ok(())
}

/// Incremental writer of the segments of one RLE frame.
///
/// Bytes are fed one at a time with [`push`](RleEncoder::push),
/// accumulating literal bytes and counting repeated ones
/// until a run can be written.
#[derive(Debug)]
struct RleEncoder {
    out: Vec<u8>,
    offsets: Vec<u32>,
    literal: Vec<u8>,
    prev: Option<u8>,
    repeat: usize,
}

impl RleEncoder {
    fn new() -> Self {
        RleEncoder {
            out: vec![0; RLE_HEADER_LENGTH],
            offsets: Vec::with_capacity(MAX_SEGMENTS),
            literal: Vec::with_capacity(MAX_RUN),
            prev: None,
            repeat: 0,
        }
    }

    /// Finish the current segment, if any, and start a new one.
    fn next_segment(&mut self) -> EncodeResult<()> {
        self.flush();
        self.make_even_length();
        let Ok(offset) = u32::try_from(self.out.len()) else {
            whatever!("RLE frame does not fit a 32-bit segment offset");
        };
        self.offsets.push(offset);
        Ok(())
    }

    fn push(&mut self, b: u8) {
        match self.prev {
            Some(prev) if prev == b => {
                self.repeat += 1;
                if self.repeat > 2 && !self.literal.is_empty() {
                    self.write_literals();
                } else if self.repeat > MAX_RUN {
                    self.write_run(prev, MAX_RUN);
                    self.repeat -= MAX_RUN;
                }
            }
            prev => {
                if let Some(prev) = prev {
                    match self.repeat {
                        1 => self.literal.push(prev),
                        2 => self.literal.extend_from_slice(&[prev, prev]),
                        _ => self.write_runs(prev),
                    }
                    while self.literal.len() > MAX_RUN {
                        self.write_literal(MAX_RUN);
                    }
                }
                self.prev = Some(b);
                self.repeat = 1;
            }
        }
    }

    /// Write out all pending bytes of the current segment.
    fn flush(&mut self) {
        if let Some(prev) = self.prev {
            if self.repeat < 2 {
                self.literal.push(prev);
            }
            self.write_literals();
            if self.repeat >= 2 {
                self.write_runs(prev);
            }
        }
        self.prev = None;
        self.repeat = 0;
    }

    fn write_literals(&mut self) {
        while !self.literal.is_empty() {
            self.write_literal(self.literal.len().min(MAX_RUN));
        }
    }

    fn write_literal(&mut self, count: usize) {
        self.out.push((count - 1) as u8);
        self.out.extend(self.literal.drain(..count));
    }

    fn write_runs(&mut self, b: u8) {
        while self.repeat > 0 {
            let count = self.repeat.min(MAX_RUN);
            self.write_run(b, count);
            self.repeat -= count;
        }
    }

    fn write_run(&mut self, b: u8, count: usize) {
        self.out.push((257 - count) as u8);
        self.out.push(b);
    }

    fn make_even_length(&mut self) {
        if self.out.len() % 2 != 0 {
            self.out.push(0);
        }
    }

    /// Finish the last segment and fill in the header.
    fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.make_even_length();
        LittleEndian::write_u32(&mut self.out[0..4], self.offsets.len() as u32);
        for (i, offset) in self.offsets.iter().enumerate() {
            LittleEndian::write_u32(&mut self.out[4 + 4 * i..8 + 4 * i], *offset);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKBITS: &[u8] = &[
        0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA,
    ];

    const UNPACKED: &[u8] = &[
        0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22, 0xAA,
        0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
    ];

    #[test]
    fn test_packbits() {
        let mut decoded = vec![0; UNPACKED.len()];
        decode_segment(PACKBITS, &mut decoded, 0, 1).unwrap();
        assert_eq!(decoded, UNPACKED);
    }

    #[test]
    fn encode_packbits_segment() {
        let mut encoder = RleEncoder::new();
        encoder.next_segment().unwrap();
        for &b in UNPACKED {
            encoder.push(b);
        }
        let out = encoder.finish();
        assert_eq!(&out[0..8], &[1, 0, 0, 0, 64, 0, 0, 0]);
        assert!(out[8..64].iter().all(|b| *b == 0));
        assert_eq!(&out[64..79], PACKBITS);
        // padded to an even length
        assert_eq!(out.len(), 80);
    }

    #[test]
    fn long_runs_are_split() {
        let mut encoder = RleEncoder::new();
        encoder.next_segment().unwrap();
        for _ in 0..300 {
            encoder.push(7);
        }
        let out = encoder.finish();
        // 128 + 128 + 44
        assert_eq!(&out[64..], &[0x81, 7, 0x81, 7, 0xD5, 7]);

        let mut decoded = vec![0; 300];
        decode_segment(&out[64..], &mut decoded, 0, 1).unwrap();
        assert!(decoded.iter().all(|b| *b == 7));
    }

    #[test]
    fn long_literals_are_split() {
        let data: Vec<u8> = (0..200).map(|i| i as u8).collect();
        let mut encoder = RleEncoder::new();
        encoder.next_segment().unwrap();
        for &b in &data {
            encoder.push(b);
        }
        let out = encoder.finish();
        assert_eq!(out[64], 127);
        assert_eq!(out[64 + 129], 71);
        assert_eq!(out.len(), 64 + 1 + 128 + 1 + 72);

        let mut decoded = vec![0; 200];
        decode_segment(&out[64..], &mut decoded, 0, 1).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn segments_start_at_even_offsets() {
        let mut encoder = RleEncoder::new();
        encoder.next_segment().unwrap();
        // literal of 1 byte: 2 bytes
        encoder.push(1);
        encoder.next_segment().unwrap();
        // literal of 2 bytes: 3 bytes, then padding
        encoder.push(1);
        encoder.push(2);
        encoder.next_segment().unwrap();
        encoder.push(3);
        let out = encoder.finish();
        let (count, offsets) = read_rle_header(&out);
        assert_eq!(count, 3);
        assert_eq!(&offsets[..4], &[64, 66, 70, 0]);
        assert_eq!(out.len(), 72);
    }

    #[test]
    fn segment_byte_positions() {
        let attrs = ImageAttributes::new(1, 2, 16)
            .unwrap()
            .with_samples_per_pixel(3);
        let layout = SegmentLayout::new(&attrs, false);
        assert_eq!(layout.segments(), 6);
        // red MSB, red LSB, green MSB, ...
        assert_eq!(layout.position(0), (1, 6));
        assert_eq!(layout.position(1), (0, 6));
        assert_eq!(layout.position(2), (3, 6));
        assert_eq!(layout.position(5), (4, 6));

        let attrs = attrs.with_planar_configuration(PlanarConfiguration::Planar);
        let layout = SegmentLayout::new(&attrs, false);
        assert_eq!(layout.position(0), (1, 2));
        assert_eq!(layout.position(3), (4, 2));

        let layout = SegmentLayout::new(&attrs, true);
        assert_eq!(layout.position(0), (0, 2));
        assert_eq!(layout.position(3), (5, 2));
    }

    #[test]
    fn run_overflows() {
        let mut dst = [0; 4];
        // literal of 6 bytes with only 2 available
        assert_eq!(
            decode_segment(&[0x05, 1, 2], &mut dst, 0, 1),
            Err(RunOverflow::Literal)
        );
        // literal of 3 bytes into 2 remaining bytes
        assert_eq!(
            decode_segment(&[0x02, 1, 2, 3], &mut dst, 2, 1),
            Err(RunOverflow::Literal)
        );
        // repeat of 5 bytes into 4
        assert_eq!(
            decode_segment(&[0xFC, 9], &mut dst, 0, 1),
            Err(RunOverflow::Repeat)
        );
        // repeat of 2 bytes with a stride of 4
        assert_eq!(
            decode_segment(&[0xFF, 9], &mut dst, 1, 4),
            Err(RunOverflow::Repeat)
        );
    }

    #[test]
    fn noop_and_padding_are_skipped() {
        let mut dst = [0; 3];
        decode_segment(&[0x80, 0xFE, 5, 0x00], &mut dst, 0, 1).unwrap();
        assert_eq!(dst, [5, 5, 5]);
    }
}
