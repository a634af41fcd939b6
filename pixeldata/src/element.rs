//! The pixel data element, in native or encapsulated form.
use dicom_io::ByteBuffer;
use smallvec::SmallVec;

/// Inline storage for the short collections of pixel data values.
pub type C<T> = SmallVec<[T; 2]>;

/// The value of a _Pixel Data_ element.
#[derive(Debug, Clone)]
pub enum PixelDataElement {
    /// Native pixel data with a byte value representation (_OB_).
    Bytes(ByteBuffer),
    /// Native pixel data with a word value representation (_OW_).
    Words(ByteBuffer),
    /// Encapsulated pixel data.
    Fragments(PixelFragmentSequence),
}

impl PixelDataElement {
    /// Whether the pixel data is encapsulated in fragments.
    pub fn is_encapsulated(&self) -> bool {
        matches!(self, PixelDataElement::Fragments(_))
    }

    /// Retrieve the buffer of native pixel data,
    /// or `None` if the pixel data is encapsulated.
    pub fn buffer(&self) -> Option<&ByteBuffer> {
        match self {
            PixelDataElement::Bytes(buffer) | PixelDataElement::Words(buffer) => Some(buffer),
            PixelDataElement::Fragments(_) => None,
        }
    }

    /// Retrieve the fragment sequence,
    /// or `None` if the pixel data is native.
    pub fn fragments(&self) -> Option<&PixelFragmentSequence> {
        match self {
            PixelDataElement::Fragments(seq) => Some(seq),
            _ => None,
        }
    }
}

/// A sequence of pixel data fragments.
///
/// Each fragment is a buffer of encoded pixel data.
/// The first item of the sequence is interpreted as a basic offset table,
/// which is kept separately.
#[derive(Debug, Clone, Default)]
pub struct PixelFragmentSequence {
    /// The value contents of the basic offset table.
    offset_table: C<u32>,
    /// The sequence of pixel data fragments.
    fragments: Vec<ByteBuffer>,
}

impl PixelFragmentSequence {
    /// Construct a pixel sequence
    /// from a basic offset table and a list of fragments.
    ///
    /// **Note:** This function does not validate the offset table
    /// against the given fragments.
    #[inline]
    pub fn new(offset_table: impl Into<C<u32>>, fragments: impl Into<Vec<ByteBuffer>>) -> Self {
        PixelFragmentSequence {
            offset_table: offset_table.into(),
            fragments: fragments.into(),
        }
    }

    /// Construct a pixel sequence from a list of fragments,
    /// with an empty basic offset table.
    #[inline]
    pub fn new_fragments(fragments: impl Into<Vec<ByteBuffer>>) -> Self {
        PixelFragmentSequence {
            offset_table: C::new(),
            fragments: fragments.into(),
        }
    }

    /// Gets a reference to the pixel data fragments.
    ///
    /// This sequence does not include the offset table.
    #[inline]
    pub fn fragments(&self) -> &[ByteBuffer] {
        &self.fragments
    }

    #[inline]
    pub fn fragments_mut(&mut self) -> &mut Vec<ByteBuffer> {
        &mut self.fragments
    }

    /// Gets a reference to the basic offset table.
    #[inline]
    pub fn offset_table(&self) -> &[u32] {
        &self.offset_table
    }

    #[inline]
    pub fn offset_table_mut(&mut self) -> &mut C<u32> {
        &mut self.offset_table
    }

    /// Decompose the sequence into its constituent parts:
    /// the basic offset table and the pixel data fragments.
    pub fn into_parts(self) -> (C<u32>, Vec<ByteBuffer>) {
        (self.offset_table, self.fragments)
    }
}

impl<T, F> From<(T, F)> for PixelFragmentSequence
where
    T: Into<C<u32>>,
    F: Into<Vec<ByteBuffer>>,
{
    /// Construct a pixel data fragment sequence,
    /// interpreting the first tuple element as a basic offset table
    /// and the second element as the vector of fragments.
    fn from((offset_table, fragments): (T, F)) -> Self {
        PixelFragmentSequence::new(offset_table, fragments)
    }
}

impl From<PixelFragmentSequence> for PixelDataElement {
    #[inline]
    fn from(value: PixelFragmentSequence) -> Self {
        PixelDataElement::Fragments(value)
    }
}
