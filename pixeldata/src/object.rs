//! The interface to the data set holding the pixel data.
use crate::attribute::ImageAttributes;
use crate::element::PixelDataElement;
use crate::transfer_syntax::TransferSyntax;

/// A DICOM object trait to be interpreted as pixel data.
///
/// The data set model itself lives elsewhere:
/// this trait only retrieves the attributes
/// which decide how the object's pixel data is laid out,
/// and the pixel data element itself.
pub trait PixelDataObject {
    /// Return the transfer syntax of the object.
    fn transfer_syntax(&self) -> &TransferSyntax;

    /// Return the _Rows_, or `None` if it is not found
    fn rows(&self) -> Option<u16>;

    /// Return the _Columns_, or `None` if it is not found
    fn cols(&self) -> Option<u16>;

    /// Return the _Samples Per Pixel_, or `None` if it is not found
    fn samples_per_pixel(&self) -> Option<u16>;

    /// Return the _Bits Allocated_, or `None` if it is not defined
    fn bits_allocated(&self) -> Option<u16>;

    /// Return the _Bits Stored_, or `None` if it is not defined
    fn bits_stored(&self) -> Option<u16>;

    /// Return the _High Bit_, or `None` if it is not defined
    fn high_bit(&self) -> Option<u16>;

    /// Return the _Pixel Representation_, or `None` if it is not defined
    fn pixel_representation(&self) -> Option<u16>;

    /// Return the _Planar Configuration_, or `None` if it is not defined
    fn planar_configuration(&self) -> Option<u16>;

    /// Return the _Photometric Interpretation_, or `None` if it is not defined
    fn photometric_interpretation(&self) -> Option<&str>;

    /// Return the _Number Of Frames_, or `None` if it is not defined
    fn number_of_frames(&self) -> Option<u32>;

    /// Return the _Pixel Data_ element, or `None` if there is none
    fn pixel_data(&self) -> Option<&PixelDataElement>;
}

/// A plain in-memory implementation of [`PixelDataObject`].
///
/// # Example
///
/// ```
/// # use dicom_pixeldata::{InMemPixelObject, PixelDataElement, TransferSyntax};
/// # use dicom_io::{ByteBuffer, Endianness};
/// const EXPLICIT_VR_LE: TransferSyntax =
///     TransferSyntax::new("1.2.840.10008.1.2.1", "Explicit VR Little Endian", Endianness::Little, true);
/// let obj = InMemPixelObject::new(EXPLICIT_VR_LE)
///     .with_rows(2)
///     .with_cols(2)
///     .with_bits_allocated(8)
///     .with_pixel_data(PixelDataElement::Bytes(ByteBuffer::from(vec![1_u8, 2, 3, 4])));
/// ```
#[derive(Debug, Clone)]
pub struct InMemPixelObject {
    transfer_syntax: TransferSyntax,
    rows: Option<u16>,
    cols: Option<u16>,
    samples_per_pixel: Option<u16>,
    bits_allocated: Option<u16>,
    bits_stored: Option<u16>,
    high_bit: Option<u16>,
    pixel_representation: Option<u16>,
    planar_configuration: Option<u16>,
    photometric_interpretation: Option<String>,
    number_of_frames: Option<u32>,
    pixel_data: Option<PixelDataElement>,
}

macro_rules! setter {
    ($method: ident, $field: ident, $t: ty) => {
        pub fn $method(mut self, value: $t) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

impl InMemPixelObject {
    /// Create an object with no attributes in the given transfer syntax.
    pub fn new(transfer_syntax: TransferSyntax) -> Self {
        InMemPixelObject {
            transfer_syntax,
            rows: None,
            cols: None,
            samples_per_pixel: None,
            bits_allocated: None,
            bits_stored: None,
            high_bit: None,
            pixel_representation: None,
            planar_configuration: None,
            photometric_interpretation: None,
            number_of_frames: None,
            pixel_data: None,
        }
    }

    /// Create an object out of image attributes and a pixel data element.
    pub fn from_parts(
        transfer_syntax: TransferSyntax,
        attrs: &ImageAttributes,
        pixel_data: PixelDataElement,
    ) -> Self {
        let mut obj = InMemPixelObject::new(transfer_syntax)
            .with_rows(attrs.rows())
            .with_cols(attrs.cols())
            .with_samples_per_pixel(attrs.samples_per_pixel())
            .with_bits_allocated(attrs.bits_allocated())
            .with_bits_stored(attrs.bits_stored())
            .with_high_bit(attrs.high_bit())
            .with_pixel_representation(attrs.pixel_representation().value())
            .with_planar_configuration(attrs.planar_configuration().value())
            .with_number_of_frames(attrs.number_of_frames())
            .with_pixel_data(pixel_data);
        obj.photometric_interpretation = attrs.photometric_interpretation().map(String::from);
        obj
    }

    setter!(with_rows, rows, u16);
    setter!(with_cols, cols, u16);
    setter!(with_samples_per_pixel, samples_per_pixel, u16);
    setter!(with_bits_allocated, bits_allocated, u16);
    setter!(with_bits_stored, bits_stored, u16);
    setter!(with_high_bit, high_bit, u16);
    setter!(with_pixel_representation, pixel_representation, u16);
    setter!(with_planar_configuration, planar_configuration, u16);
    setter!(with_number_of_frames, number_of_frames, u32);
    setter!(with_pixel_data, pixel_data, PixelDataElement);

    pub fn with_photometric_interpretation(mut self, value: impl Into<String>) -> Self {
        self.photometric_interpretation = Some(value.into());
        self
    }

    /// Take the pixel data element out of the object.
    pub fn take_pixel_data(&mut self) -> Option<PixelDataElement> {
        self.pixel_data.take()
    }
}

impl PixelDataObject for InMemPixelObject {
    fn transfer_syntax(&self) -> &TransferSyntax {
        &self.transfer_syntax
    }

    fn rows(&self) -> Option<u16> {
        self.rows
    }

    fn cols(&self) -> Option<u16> {
        self.cols
    }

    fn samples_per_pixel(&self) -> Option<u16> {
        self.samples_per_pixel
    }

    fn bits_allocated(&self) -> Option<u16> {
        self.bits_allocated
    }

    fn bits_stored(&self) -> Option<u16> {
        self.bits_stored
    }

    fn high_bit(&self) -> Option<u16> {
        self.high_bit
    }

    fn pixel_representation(&self) -> Option<u16> {
        self.pixel_representation
    }

    fn planar_configuration(&self) -> Option<u16> {
        self.planar_configuration
    }

    fn photometric_interpretation(&self) -> Option<&str> {
        self.photometric_interpretation.as_deref()
    }

    fn number_of_frames(&self) -> Option<u32> {
        self.number_of_frames
    }

    fn pixel_data(&self) -> Option<&PixelDataElement> {
        self.pixel_data.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dicom_io::Endianness;

    pub(crate) const IMPLICIT_LE: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2",
        "Implicit VR Little Endian",
        Endianness::Little,
        false,
    );
    pub(crate) const EXPLICIT_LE: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2.1",
        "Explicit VR Little Endian",
        Endianness::Little,
        true,
    );
    pub(crate) const EXPLICIT_BE: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2.2",
        "Explicit VR Big Endian",
        Endianness::Big,
        true,
    );
    pub(crate) const GE_PRIVATE: TransferSyntax = TransferSyntax::new(
        "1.2.840.113619.5.2",
        "GE Private Implicit VR Big Endian",
        Endianness::Big,
        false,
    )
    .with_swapped_pixel_data();
    pub(crate) const RLE: TransferSyntax =
        TransferSyntax::new_encapsulated("1.2.840.10008.1.2.5", "RLE Lossless");

    #[test]
    fn object_from_parts_keeps_attributes() {
        let attrs = ImageAttributes::new(4, 5, 16)
            .unwrap()
            .with_samples_per_pixel(3)
            .with_photometric_interpretation("RGB")
            .with_number_of_frames(2);
        let obj = InMemPixelObject::from_parts(
            EXPLICIT_LE,
            &attrs,
            PixelDataElement::Words(vec![0_u8; 240].into()),
        );
        assert_eq!(obj.rows(), Some(4));
        assert_eq!(obj.cols(), Some(5));
        assert_eq!(obj.photometric_interpretation(), Some("RGB"));
        assert_eq!(obj.number_of_frames(), Some(2));
        assert_eq!(ImageAttributes::from_object(&obj).unwrap(), attrs);
        assert_eq!(obj.transfer_syntax().uid(), "1.2.840.10008.1.2.1");
    }
}
