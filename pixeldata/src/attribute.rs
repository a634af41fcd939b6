//! Image attributes which shape the pixel data of an object.
use crate::object::PixelDataObject;
use crate::{InvalidAttributeSnafu, MissingAttributeSnafu, Result};
use snafu::{ensure, OptionExt};

/// An interpreted representation of the DICOM _Pixel Representation_ attribute.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, Default)]
pub enum PixelRepresentation {
    /// unsigned pixel data sample values
    #[default]
    Unsigned,
    /// signed pixel data sample values
    Signed,
}

/// An interpreted representation of the DICOM _Planar Configuration_ attribute.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, Default)]
pub enum PlanarConfiguration {
    /// The samples of each pixel are contiguous (`R1 G1 B1 R2 G2 B2 ...`).
    #[default]
    Interleaved,
    /// All pixels of each sample plane are contiguous (`R1 R2 ... G1 G2 ... B1 B2 ...`).
    Planar,
}

impl PlanarConfiguration {
    /// Interpret the attribute's value.
    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            0 => Some(PlanarConfiguration::Interleaved),
            1 => Some(PlanarConfiguration::Planar),
            _ => None,
        }
    }

    pub fn value(self) -> u16 {
        match self {
            PlanarConfiguration::Interleaved => 0,
            PlanarConfiguration::Planar => 1,
        }
    }
}

impl PixelRepresentation {
    /// Interpret the attribute's value.
    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            0 => Some(PixelRepresentation::Unsigned),
            1 => Some(PixelRepresentation::Signed),
            _ => None,
        }
    }

    pub fn value(self) -> u16 {
        match self {
            PixelRepresentation::Unsigned => 0,
            PixelRepresentation::Signed => 1,
        }
    }
}

/// Photometric interpretations of chroma-subsampled images,
/// for which an odd width is stored rounded up to even.
const SUBSAMPLED_PHOTOMETRIC_INTERPRETATIONS: [&str; 3] =
    ["YBR_FULL_422", "YBR_PARTIAL_422", "YBR_PARTIAL_420"];

/// The attributes describing the layout of an image's pixel data.
///
/// The bits stored are never more than the bits allocated,
/// and the high bit is always inside the bits allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttributes {
    rows: u16,
    cols: u16,
    samples_per_pixel: u16,
    bits_allocated: u16,
    bits_stored: u16,
    high_bit: u16,
    pixel_representation: PixelRepresentation,
    planar_configuration: PlanarConfiguration,
    photometric_interpretation: Option<String>,
    number_of_frames: u32,
}

impl ImageAttributes {
    /// Create the attributes of a single-frame, single-sample image.
    ///
    /// Bits stored take the value of bits allocated
    /// and the high bit is the most significant bit stored.
    pub fn new(rows: u16, cols: u16, bits_allocated: u16) -> Result<Self> {
        ensure!(
            bits_allocated > 0,
            InvalidAttributeSnafu {
                name: "BitsAllocated",
                value: bits_allocated.to_string(),
            }
        );
        Ok(ImageAttributes {
            rows,
            cols,
            samples_per_pixel: 1,
            bits_allocated,
            bits_stored: bits_allocated,
            high_bit: bits_allocated - 1,
            pixel_representation: PixelRepresentation::Unsigned,
            planar_configuration: PlanarConfiguration::Interleaved,
            photometric_interpretation: None,
            number_of_frames: 1,
        })
    }

    /// Collect the attributes of the given object.
    ///
    /// _Rows_, _Columns_ and _Bits Allocated_ are required.
    /// Missing optional attributes take their usual defaults:
    /// one sample per pixel, interleaved,
    /// unsigned, one frame,
    /// and all allocated bits stored.
    pub fn from_object(obj: &dyn PixelDataObject) -> Result<Self> {
        let rows = obj.rows().context(MissingAttributeSnafu { name: "Rows" })?;
        let cols = obj.cols().context(MissingAttributeSnafu { name: "Columns" })?;
        let bits_allocated = obj.bits_allocated().context(MissingAttributeSnafu {
            name: "BitsAllocated",
        })?;
        let mut attrs = ImageAttributes::new(rows, cols, bits_allocated)?;

        if let Some(samples_per_pixel) = obj.samples_per_pixel() {
            attrs.samples_per_pixel = samples_per_pixel;
        }
        if let Some(bits_stored) = obj.bits_stored() {
            attrs.set_bits_stored(bits_stored)?;
        }
        match obj.high_bit() {
            Some(high_bit) => attrs.set_high_bit(high_bit)?,
            None => attrs.high_bit = attrs.bits_stored.saturating_sub(1),
        }
        if let Some(value) = obj.pixel_representation() {
            attrs.pixel_representation =
                PixelRepresentation::from_value(value).context(InvalidAttributeSnafu {
                    name: "PixelRepresentation",
                    value: value.to_string(),
                })?;
        }
        if let Some(value) = obj.planar_configuration() {
            attrs.planar_configuration =
                PlanarConfiguration::from_value(value).context(InvalidAttributeSnafu {
                    name: "PlanarConfiguration",
                    value: value.to_string(),
                })?;
        }
        attrs.photometric_interpretation = obj
            .photometric_interpretation()
            .map(|pi| pi.trim_end_matches(|c| c == ' ' || c == '\0').to_string());
        attrs.number_of_frames = obj.number_of_frames().unwrap_or(1);
        Ok(attrs)
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u16) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_planar_configuration(mut self, planar_configuration: PlanarConfiguration) -> Self {
        self.planar_configuration = planar_configuration;
        self
    }

    pub fn with_pixel_representation(mut self, pixel_representation: PixelRepresentation) -> Self {
        self.pixel_representation = pixel_representation;
        self
    }

    pub fn with_photometric_interpretation(mut self, pi: impl Into<String>) -> Self {
        self.photometric_interpretation = Some(pi.into());
        self
    }

    pub fn with_number_of_frames(mut self, number_of_frames: u32) -> Self {
        self.number_of_frames = number_of_frames;
        self
    }

    /// Set the number of bits stored per sample.
    ///
    /// Fails if it is larger than the bits allocated.
    pub fn set_bits_stored(&mut self, bits_stored: u16) -> Result<()> {
        ensure!(
            bits_stored <= self.bits_allocated,
            InvalidAttributeSnafu {
                name: "BitsStored",
                value: bits_stored.to_string(),
            }
        );
        self.bits_stored = bits_stored;
        Ok(())
    }

    /// Set the most significant bit stored.
    ///
    /// Fails if it is outside of the bits allocated.
    pub fn set_high_bit(&mut self, high_bit: u16) -> Result<()> {
        ensure!(
            high_bit < self.bits_allocated,
            InvalidAttributeSnafu {
                name: "HighBit",
                value: high_bit.to_string(),
            }
        );
        self.high_bit = high_bit;
        Ok(())
    }

    pub(crate) fn set_number_of_frames(&mut self, number_of_frames: u32) {
        self.number_of_frames = number_of_frames;
    }

    /// The height of the image (_Rows_).
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// The width of the image (_Columns_).
    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    pub fn bits_allocated(&self) -> u16 {
        self.bits_allocated
    }

    pub fn bits_stored(&self) -> u16 {
        self.bits_stored
    }

    pub fn high_bit(&self) -> u16 {
        self.high_bit
    }

    pub fn pixel_representation(&self) -> PixelRepresentation {
        self.pixel_representation
    }

    pub fn planar_configuration(&self) -> PlanarConfiguration {
        self.planar_configuration
    }

    pub fn photometric_interpretation(&self) -> Option<&str> {
        self.photometric_interpretation.as_deref()
    }

    pub fn number_of_frames(&self) -> u32 {
        self.number_of_frames
    }

    /// The number of whole bytes needed by each sample.
    pub fn bytes_allocated(&self) -> u32 {
        (u32::from(self.bits_allocated) + 7) / 8
    }

    /// The number of pixels in a frame.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }

    /// The size in bytes of one frame of native pixel data.
    ///
    /// Single-bit images are packed and rounded up to whole bytes.
    /// Chroma-subsampled color images with an odd width
    /// are sized as if the width were one column larger.
    pub fn uncompressed_frame_size(&self) -> u64 {
        if self.bits_allocated == 1 {
            let bits = self.pixel_count() * u64::from(self.samples_per_pixel);
            return (bits + 7) / 8;
        }

        let mut width = u64::from(self.cols);
        let subsampled = self
            .photometric_interpretation()
            .map(|pi| SUBSAMPLED_PHOTOMETRIC_INTERPRETATIONS.contains(&pi))
            .unwrap_or(false);
        if width % 2 != 0 && subsampled {
            width += 1;
        }
        u64::from(self.bytes_allocated())
            * u64::from(self.samples_per_pixel)
            * width
            * u64::from(self.rows)
    }
}
