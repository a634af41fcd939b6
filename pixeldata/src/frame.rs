//! The pixel data of an object as a sequence of frames.
//!
//! [`PixelData`] abstracts over the three ways in which
//! pixel data is physically stored:
//! native pixel data in bytes (_OB_),
//! native pixel data in 16-bit words (_OW_),
//! and pixel data encapsulated in fragments.
//! Frames are always retrieved and added in little endian,
//! whatever the byte order of the transfer syntax.
use crate::attribute::ImageAttributes;
use crate::element::{PixelDataElement, PixelFragmentSequence};
use crate::object::{InMemPixelObject, PixelDataObject};
use crate::transfer_syntax::TransferSyntax;
use crate::{
    BufferSnafu, FragmentOffsetMismatchSnafu, FrameOutOfRangeSnafu,
    InconsistentEncapsulationSnafu, MissingPixelDataSnafu, NotAppendableSnafu, Result,
    TruncatedFrameSnafu, UnresolvableFragmentsSnafu, UnsupportedBitsAllocatedSnafu,
};
use dicom_io::buffer::CompositeBuffer;
use dicom_io::bytes::Bytes;
use dicom_io::{ByteBuffer, Endianness};
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

/// The number of bytes of an item header
/// preceding each fragment in a pixel sequence.
pub const ITEM_HEADER_LENGTH: u64 = 8;

/// The physical storage of pixel data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelDataKind {
    /// Native pixel data in bytes
    Bytes,
    /// Native pixel data in 16-bit words
    Words,
    /// Encapsulated pixel data
    Fragments,
}

/// The pixel data of an object, presented as a sequence of frames.
///
/// Retrieving a frame has no side effects.
/// Frames are only added through [`add_frame`](PixelData::add_frame),
/// which also increments the number of frames.
#[derive(Debug, Clone)]
pub struct PixelData {
    attributes: ImageAttributes,
    syntax: TransferSyntax,
    storage: PixelDataElement,
}

impl PixelData {
    /// Interpret the pixel data of the given object.
    ///
    /// If `for_writing` is true,
    /// the object's pixel data is ignored
    /// and new, empty pixel data is created instead,
    /// as with [`PixelData::new`].
    pub fn create(obj: &dyn PixelDataObject, for_writing: bool) -> Result<Self> {
        let attributes = ImageAttributes::from_object(obj)?;
        let syntax = *obj.transfer_syntax();
        if for_writing {
            return PixelData::new(attributes, syntax);
        }

        let storage = obj.pixel_data().context(MissingPixelDataSnafu)?.clone();
        ensure!(
            storage.is_encapsulated() == syntax.is_encapsulated(),
            InconsistentEncapsulationSnafu { uid: syntax.uid() }
        );
        Ok(PixelData {
            attributes,
            syntax,
            storage,
        })
    }

    /// Create new pixel data without any frames.
    ///
    /// The storage is chosen from the transfer syntax:
    /// fragments for encapsulated transfer syntaxes,
    /// words for implicit VR transfer syntaxes
    /// or for more than 8 bits allocated,
    /// bytes otherwise.
    /// Native pixel data in explicit VR
    /// cannot have more than 16 bits allocated.
    pub fn new(mut attributes: ImageAttributes, syntax: TransferSyntax) -> Result<Self> {
        attributes.set_number_of_frames(0);
        let bits_allocated = attributes.bits_allocated();
        // frames are appended in little endian to the composite,
        // which is seen through a swapped view if need be
        let words = || {
            word_to_little_endian(
                CompositeBuffer::new().into(),
                pixel_byte_order(&syntax),
                attributes.bytes_allocated() as usize,
            )
            .map(PixelDataElement::Words)
        };
        let storage = if syntax.is_encapsulated() {
            PixelDataElement::Fragments(PixelFragmentSequence::default())
        } else if !syntax.is_explicit_vr() {
            words()?
        } else {
            ensure!(
                bits_allocated <= 16,
                UnsupportedBitsAllocatedSnafu { bits_allocated }
            );
            if bits_allocated > 8 {
                words()?
            } else {
                PixelDataElement::Bytes(CompositeBuffer::new().into())
            }
        };
        Ok(PixelData {
            attributes,
            syntax,
            storage,
        })
    }

    pub fn attributes(&self) -> &ImageAttributes {
        &self.attributes
    }

    pub fn transfer_syntax(&self) -> &TransferSyntax {
        &self.syntax
    }

    /// The pixel data element as currently stored.
    pub fn element(&self) -> &PixelDataElement {
        &self.storage
    }

    pub fn kind(&self) -> PixelDataKind {
        match self.storage {
            PixelDataElement::Bytes(_) => PixelDataKind::Bytes,
            PixelDataElement::Words(_) => PixelDataKind::Words,
            PixelDataElement::Fragments(_) => PixelDataKind::Fragments,
        }
    }

    pub fn is_encapsulated(&self) -> bool {
        self.storage.is_encapsulated()
    }

    pub fn number_of_frames(&self) -> u32 {
        self.attributes.number_of_frames()
    }

    /// The size in bytes of each native frame.
    pub fn frame_size(&self) -> u64 {
        self.attributes.uncompressed_frame_size()
    }

    /// Retrieve frame number `frame`, starting from 0.
    pub fn frame(&self, frame: u32) -> Result<ByteBuffer> {
        let frames = self.number_of_frames();
        ensure!(frame < frames, FrameOutOfRangeSnafu { frame, frames });

        let bytes_allocated = self.attributes.bytes_allocated() as usize;
        match &self.storage {
            PixelDataElement::Bytes(buffer) => {
                let size = self.frame_size();
                ByteBuffer::range(buffer.clone(), size * u64::from(frame), size)
                    .context(BufferSnafu)
            }
            PixelDataElement::Words(buffer) => {
                // words are swapped as a whole,
                // frames may start in the middle of a word
                let order = pixel_byte_order(&self.syntax);
                let words = match buffer {
                    ByteBuffer::Swap(view)
                        if is_word_view(view.unit(), order, bytes_allocated) =>
                    {
                        view.inner().clone()
                    }
                    _ => word_to_little_endian(buffer.clone(), order, bytes_allocated)?,
                };
                let size = self.frame_size();
                ByteBuffer::range(words, size * u64::from(frame), size).context(BufferSnafu)
            }
            PixelDataElement::Fragments(seq) => {
                let buffer = self.resolve_fragments(seq, frame)?;
                to_little_endian(buffer, self.syntax.endianness(), bytes_allocated)
            }
        }
    }

    /// Retrieve frame number `frame` as one contiguous block of bytes.
    pub fn frame_data(&self, frame: u32) -> Result<Bytes> {
        self.frame(frame)?.to_bytes().context(BufferSnafu)
    }

    fn resolve_fragments(&self, seq: &PixelFragmentSequence, frame: u32) -> Result<ByteBuffer> {
        let frames = self.number_of_frames();
        let fragments = seq.fragments();
        let offset_table = seq.offset_table();

        if frames == 1 {
            return Ok(match fragments {
                [single] => single.clone(),
                _ => ByteBuffer::composite(fragments.iter().cloned()),
            });
        }
        if fragments.len() == frames as usize {
            return Ok(fragments[frame as usize].clone());
        }
        ensure!(
            offset_table.len() == frames as usize,
            UnresolvableFragmentsSnafu {
                fragments: fragments.len(),
                frames,
            }
        );

        let start = offset_table[frame as usize];
        // the last frame extends to the end of the sequence
        let stop = offset_table.get(frame as usize + 1).copied();

        let mut pos = 0_u64;
        let mut fragments = fragments.iter();
        while pos < u64::from(start) {
            match fragments.next() {
                Some(fragment) => pos += ITEM_HEADER_LENGTH + fragment.size(),
                None => break,
            }
        }
        ensure!(
            pos == u64::from(start),
            FragmentOffsetMismatchSnafu {
                frame,
                offset: start,
            }
        );

        let mut parts = Vec::new();
        while stop.map_or(true, |stop| pos < u64::from(stop)) {
            match fragments.next() {
                Some(fragment) => {
                    pos += ITEM_HEADER_LENGTH + fragment.size();
                    parts.push(fragment.clone());
                }
                None => break,
            }
        }
        if let Some(stop) = stop {
            ensure!(pos >= u64::from(stop), TruncatedFrameSnafu { frame });
        }
        ensure!(!parts.is_empty(), TruncatedFrameSnafu { frame });

        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            ByteBuffer::composite(parts)
        })
    }

    /// Append a frame of little endian pixel data.
    ///
    /// Native pixel data can only grow
    /// if it was created for writing.
    /// Encapsulated pixel data receives the buffer as a new fragment,
    /// padded to even length,
    /// and a new entry in the basic offset table.
    pub fn add_frame(&mut self, data: ByteBuffer) -> Result<()> {
        let bytes_allocated = self.attributes.bytes_allocated() as usize;
        let order = pixel_byte_order(&self.syntax);
        let endianness = self.syntax.endianness();
        match &mut self.storage {
            PixelDataElement::Bytes(buffer) => {
                buffer
                    .as_composite_mut()
                    .context(NotAppendableSnafu)?
                    .push(data);
            }
            PixelDataElement::Words(buffer) => {
                let words = match buffer {
                    ByteBuffer::Swap(view)
                        if is_word_view(view.unit(), order, bytes_allocated) =>
                    {
                        view.inner_mut()
                    }
                    words => words,
                };
                words
                    .as_composite_mut()
                    .context(NotAppendableSnafu)?
                    .push(data);
            }
            PixelDataElement::Fragments(seq) => {
                let pos: u64 = seq
                    .fragments()
                    .iter()
                    .map(|fragment| fragment.size() + ITEM_HEADER_LENGTH)
                    .sum();
                match u32::try_from(pos) {
                    Ok(pos) if pos < u32::MAX => seq.offset_table_mut().push(pos),
                    _ => {
                        if !seq.offset_table().is_empty() {
                            warn!(
                                "Pixel sequence exceeds {} bytes, dropping basic offset table",
                                u32::MAX
                            );
                        }
                        seq.offset_table_mut().clear();
                    }
                }
                let data = to_little_endian(data, endianness, bytes_allocated)?;
                seq.fragments_mut().push(ByteBuffer::even_length(data));
            }
        }

        let frames = self.attributes.number_of_frames() + 1;
        self.attributes.set_number_of_frames(frames);
        Ok(())
    }

    /// Retrieve the pixel data element.
    pub fn into_element(self) -> PixelDataElement {
        self.storage
    }

    /// Gather the image attributes and the pixel data
    /// into a new object.
    pub fn into_object(self) -> InMemPixelObject {
        InMemPixelObject::from_parts(self.syntax, &self.attributes, self.storage)
    }
}

/// The byte order of the stored pixel values,
/// which differs from the transfer syntax's
/// in the GE private transfer syntax.
fn pixel_byte_order(syntax: &TransferSyntax) -> Endianness {
    match (syntax.endianness(), syntax.swaps_pixel_data()) {
        (e, false) => e,
        (Endianness::Little, true) => Endianness::Big,
        (Endianness::Big, true) => Endianness::Little,
    }
}

/// Whether a swapped view of `unit` bytes
/// is exactly the conversion of a word container to little endian.
fn is_word_view(unit: usize, order: Endianness, bytes_allocated: usize) -> bool {
    order == Endianness::Big && unit == bytes_allocated.max(2)
}

/// Convert a buffer of values in the given byte order
/// from or to little endian.
fn to_little_endian(buffer: ByteBuffer, order: Endianness, unit: usize) -> Result<ByteBuffer> {
    if unit > 1 && order == Endianness::Big {
        ByteBuffer::swapped(buffer, unit).context(BufferSnafu)
    } else {
        Ok(buffer)
    }
}

/// Convert a buffer of values held in 16-bit words
/// from or to little endian.
///
/// Single byte values are swapped in pairs,
/// as the word container swaps them as a whole.
fn word_to_little_endian(buffer: ByteBuffer, order: Endianness, unit: usize) -> Result<ByteBuffer> {
    to_little_endian(buffer, order, unit.max(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::tests::{EXPLICIT_BE, EXPLICIT_LE, GE_PRIVATE, IMPLICIT_LE, RLE};
    use crate::Error;

    fn attrs(bits_allocated: u16) -> ImageAttributes {
        ImageAttributes::new(2, 2, bits_allocated).unwrap()
    }

    #[test]
    fn storage_follows_transfer_syntax() {
        let kind = |bits, ts| PixelData::new(attrs(bits), ts).unwrap().kind();
        assert_eq!(kind(8, EXPLICIT_LE), PixelDataKind::Bytes);
        assert_eq!(kind(16, EXPLICIT_LE), PixelDataKind::Words);
        assert_eq!(kind(8, IMPLICIT_LE), PixelDataKind::Words);
        assert_eq!(kind(32, IMPLICIT_LE), PixelDataKind::Words);
        assert_eq!(kind(16, RLE), PixelDataKind::Fragments);
        assert_eq!(kind(32, RLE), PixelDataKind::Fragments);
        assert!(matches!(
            PixelData::new(attrs(32), EXPLICIT_LE),
            Err(Error::UnsupportedBitsAllocated {
                bits_allocated: 32,
                ..
            })
        ));
    }

    #[test]
    fn add_and_get_byte_frames() {
        let mut pixel_data = PixelData::new(attrs(8), EXPLICIT_LE).unwrap();
        assert_eq!(pixel_data.number_of_frames(), 0);
        pixel_data.add_frame(vec![1_u8, 2, 3, 4].into()).unwrap();
        pixel_data.add_frame(vec![5_u8, 6, 7, 8].into()).unwrap();
        assert_eq!(pixel_data.number_of_frames(), 2);
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(&*pixel_data.frame(1).unwrap().data().unwrap(), &[5, 6, 7, 8]);
        assert!(matches!(
            pixel_data.frame(2),
            Err(Error::FrameOutOfRange {
                frame: 2,
                frames: 2,
                ..
            })
        ));
        // retrieving frames does not change anything
        assert_eq!(pixel_data.number_of_frames(), 2);
    }

    #[test]
    fn big_endian_words_are_stored_swapped() {
        let mut pixel_data = PixelData::new(attrs(16), EXPLICIT_BE).unwrap();
        let frame: Vec<u8> = vec![0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00];
        pixel_data.add_frame(frame.clone().into()).unwrap();
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &frame[..]);

        let element = pixel_data.into_element();
        let stored = element.buffer().unwrap().to_vec().unwrap();
        assert_eq!(stored, vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04]);
    }

    #[test]
    fn single_bytes_in_big_endian_words_are_swapped_in_pairs() {
        let mut pixel_data = PixelData::new(attrs(8), IMPLICIT_LE).unwrap();
        pixel_data.add_frame(vec![1_u8, 2, 3, 4].into()).unwrap();
        let stored = pixel_data.element().buffer().unwrap().to_vec().unwrap();
        assert_eq!(stored, vec![1, 2, 3, 4]);

        let attrs = attrs(8);
        let obj = InMemPixelObject::from_parts(
            GE_PRIVATE,
            &attrs,
            PixelDataElement::Words(vec![1_u8, 2, 3, 4].into()),
        );
        // GE private pixel data is little endian after all
        let pixel_data = PixelData::create(&obj, false).unwrap();
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &[1, 2, 3, 4]);

        let obj = InMemPixelObject::from_parts(
            EXPLICIT_BE,
            &attrs,
            PixelDataElement::Words(vec![1_u8, 2, 3, 4].into()),
        );
        let pixel_data = PixelData::create(&obj, false).unwrap();
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &[2, 1, 4, 3]);
    }

    #[test]
    fn odd_frames_in_big_endian_words() {
        let attrs = ImageAttributes::new(1, 3, 8)
            .unwrap()
            .with_number_of_frames(2);
        let obj = InMemPixelObject::from_parts(
            EXPLICIT_BE,
            &attrs,
            PixelDataElement::Words(vec![1_u8, 2, 3, 4, 5, 6].into()),
        );
        let pixel_data = PixelData::create(&obj, false).unwrap();
        // the second frame starts in the middle of a word
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &[2, 1, 4]);
        assert_eq!(&*pixel_data.frame(1).unwrap().data().unwrap(), &[3, 6, 5]);
    }

    #[test]
    fn written_big_endian_words_can_be_read_back() {
        let attrs = ImageAttributes::new(1, 3, 16).unwrap();
        let mut pixel_data = PixelData::new(attrs, EXPLICIT_BE).unwrap();
        pixel_data
            .add_frame(vec![1_u8, 0, 2, 0, 3, 0].into())
            .unwrap();
        pixel_data
            .add_frame(vec![4_u8, 0, 5, 0, 6, 0].into())
            .unwrap();
        let stored = pixel_data.element().buffer().unwrap().to_vec().unwrap();
        assert_eq!(stored, vec![0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6]);

        let obj = pixel_data.into_object();
        let pixel_data = PixelData::create(&obj, false).unwrap();
        assert_eq!(
            &*pixel_data.frame(1).unwrap().data().unwrap(),
            &[4, 0, 5, 0, 6, 0]
        );
    }

    #[test]
    fn frames_cannot_be_added_to_read_pixel_data() {
        let obj = InMemPixelObject::from_parts(
            EXPLICIT_LE,
            &attrs(8),
            PixelDataElement::Bytes(vec![0_u8; 4].into()),
        );
        let mut pixel_data = PixelData::create(&obj, false).unwrap();
        assert!(matches!(
            pixel_data.add_frame(vec![0_u8; 4].into()),
            Err(Error::NotAppendable { .. })
        ));
        assert_eq!(pixel_data.number_of_frames(), 1);
    }

    #[test]
    fn create_requires_pixel_data() {
        let obj = InMemPixelObject::new(EXPLICIT_LE)
            .with_rows(2)
            .with_cols(2)
            .with_bits_allocated(8);
        assert!(matches!(
            PixelData::create(&obj, false),
            Err(Error::MissingPixelData { .. })
        ));
        let pixel_data = PixelData::create(&obj, true).unwrap();
        assert_eq!(pixel_data.number_of_frames(), 0);

        let obj = obj.with_pixel_data(PixelDataElement::Bytes(vec![0_u8; 4].into()));
        let obj = InMemPixelObject::from_parts(
            RLE,
            &ImageAttributes::from_object(&obj).unwrap(),
            obj.pixel_data().cloned().unwrap(),
        );
        assert!(matches!(
            PixelData::create(&obj, false),
            Err(Error::InconsistentEncapsulation { .. })
        ));
    }

    #[test]
    fn offset_table_accumulates_item_headers() {
        let mut pixel_data = PixelData::new(attrs(8), RLE).unwrap();
        pixel_data.add_frame(vec![1_u8; 100].into()).unwrap();
        pixel_data.add_frame(vec![2_u8; 150].into()).unwrap();
        assert_eq!(pixel_data.number_of_frames(), 2);

        let element = pixel_data.element().fragments().unwrap();
        assert_eq!(element.offset_table(), &[0, 108]);
        assert_eq!(element.fragments().len(), 2);
        assert_eq!(pixel_data.frame(1).unwrap().size(), 150);
    }

    fn fragmented(frames: u32, offset_table: Vec<u32>, sizes: &[usize]) -> PixelData {
        let fragments: Vec<ByteBuffer> = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| ByteBuffer::from(vec![i as u8; *size]))
            .collect();
        let attrs = attrs(8).with_number_of_frames(frames);
        let obj = InMemPixelObject::from_parts(
            RLE,
            &attrs,
            PixelFragmentSequence::new(offset_table, fragments).into(),
        );
        PixelData::create(&obj, false).unwrap()
    }

    #[test]
    fn single_frame_joins_all_fragments() {
        let pixel_data = fragmented(1, vec![], &[2, 4]);
        assert_eq!(
            &*pixel_data.frame(0).unwrap().data().unwrap(),
            &[0, 0, 1, 1, 1, 1]
        );
    }

    #[test]
    fn one_fragment_per_frame() {
        let pixel_data = fragmented(3, vec![], &[2, 4, 6]);
        assert_eq!(pixel_data.frame(2).unwrap().size(), 6);
        assert_eq!(&*pixel_data.frame(1).unwrap().data().unwrap(), &[1, 1, 1, 1]);
    }

    #[test]
    fn frames_located_through_offset_table() {
        // frame 0: fragments 0 and 1, frame 1: fragment 2, frame 2: fragments 3 and 4
        let pixel_data = fragmented(3, vec![0, 22, 34], &[6, 0, 4, 2, 2]);
        assert_eq!(
            &*pixel_data.frame(0).unwrap().data().unwrap(),
            &[0, 0, 0, 0, 0, 0]
        );
        assert_eq!(&*pixel_data.frame(1).unwrap().data().unwrap(), &[2, 2, 2, 2]);
        assert_eq!(&*pixel_data.frame(2).unwrap().data().unwrap(), &[3, 3, 4, 4]);
    }

    #[test]
    fn misaligned_offset_table_is_an_error() {
        let pixel_data = fragmented(2, vec![0, 10], &[4, 4, 4]);
        assert!(matches!(
            pixel_data.frame(1),
            Err(Error::FragmentOffsetMismatch {
                frame: 1,
                offset: 10,
                ..
            })
        ));
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let pixel_data = fragmented(2, vec![0, 100], &[4, 4, 4]);
        assert!(matches!(
            pixel_data.frame(0),
            Err(Error::TruncatedFrame { frame: 0, .. })
        ));
    }

    #[test]
    fn fragments_without_offset_table_are_unresolvable() {
        let pixel_data = fragmented(2, vec![], &[4, 4, 4]);
        assert!(matches!(
            pixel_data.frame(0),
            Err(Error::UnresolvableFragments {
                fragments: 3,
                frames: 2,
                ..
            })
        ));
    }

    #[test]
    fn into_object_keeps_frame_count() {
        let mut pixel_data = PixelData::new(attrs(8), RLE).unwrap();
        pixel_data.add_frame(vec![9_u8; 10].into()).unwrap();
        let obj = pixel_data.into_object();
        assert_eq!(obj.number_of_frames(), Some(1));
        let pixel_data = PixelData::create(&obj, false).unwrap();
        assert_eq!(&*pixel_data.frame(0).unwrap().data().unwrap(), &[9; 10]);
    }
}
