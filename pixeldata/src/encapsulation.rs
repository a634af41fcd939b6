//! Encapsulated pixel data framing.
//!
//! An encapsulated pixel data element holds a sequence of items:
//! the basic offset table, then one item per fragment,
//! closed by a sequence delimitation item.
//! Each item starts with an 8 byte header
//! (the item tag and a 32-bit length).
use crate::element::{PixelFragmentSequence, C};
use crate::{
    BufferSnafu, FragmentTooLargeSnafu, InvalidOffsetTableSnafu, Result, UnexpectedItemSnafu,
};
use dicom_io::{ByteBuffer, ByteSource, ByteTarget};
use snafu::{ensure, ResultExt};
use std::io::Write;

/// The group of the item and delimitation tags.
pub const ITEM_GROUP: u16 = 0xFFFE;
/// The element of the item tag `(FFFE,E000)`.
pub const ITEM: u16 = 0xE000;
/// The element of the sequence delimitation tag `(FFFE,E0DD)`.
pub const SEQUENCE_DELIMITER: u16 = 0xE0DD;

/// Read a pixel data item sequence,
/// up to and including its sequence delimitation item.
///
/// The source must be positioned right after the header
/// of the pixel data element.
/// Fragments are read with [`ByteSource::read_buffer`],
/// so large fragments may be deferred by the source.
pub fn read_pixel_sequence<S>(source: &mut S) -> Result<PixelFragmentSequence>
where
    S: ?Sized + ByteSource,
{
    let mut offset_table = C::new();
    let mut fragments = Vec::new();
    let mut first = true;
    loop {
        let group = source.read_u16().context(BufferSnafu)?;
        let element = source.read_u16().context(BufferSnafu)?;
        let len = source.read_u32().context(BufferSnafu)?;
        match (group, element) {
            (ITEM_GROUP, SEQUENCE_DELIMITER) => break,
            (ITEM_GROUP, ITEM) if first => {
                ensure!(len % 4 == 0, InvalidOffsetTableSnafu { len });
                for _ in 0..len / 4 {
                    offset_table.push(source.read_u32().context(BufferSnafu)?);
                }
            }
            (ITEM_GROUP, ITEM) => {
                fragments.push(source.read_buffer(u64::from(len)).context(BufferSnafu)?);
            }
            _ => return UnexpectedItemSnafu { group, element }.fail(),
        }
        first = false;
    }
    Ok(PixelFragmentSequence::new(offset_table, fragments))
}

/// Write a pixel data item sequence,
/// including its sequence delimitation item.
///
/// Fragments of odd length are padded with a trailing zero.
pub fn write_pixel_sequence<W>(
    target: &mut ByteTarget<W>,
    sequence: &PixelFragmentSequence,
) -> Result<()>
where
    W: Write,
{
    let offset_table = sequence.offset_table();
    write_item_header(target, ITEM, 4 * offset_table.len() as u64)?;
    for offset in offset_table {
        target.write_u32(*offset).context(BufferSnafu)?;
    }

    for fragment in sequence.fragments() {
        let fragment = ByteBuffer::even_length(fragment.clone());
        write_item_header(target, ITEM, fragment.size())?;
        target.write_buffer(&fragment).context(BufferSnafu)?;
    }

    write_item_header(target, SEQUENCE_DELIMITER, 0)
}

fn write_item_header<W>(target: &mut ByteTarget<W>, element: u16, len: u64) -> Result<()>
where
    W: Write,
{
    // 0xFFFF_FFFF would stand for an undefined length
    let len = u32::try_from(len)
        .ok()
        .filter(|len| *len < u32::MAX)
        .ok_or_else(|| FragmentTooLargeSnafu { size: len }.build())?;
    target.write_u16(ITEM_GROUP).context(BufferSnafu)?;
    target.write_u16(element).context(BufferSnafu)?;
    target.write_u32(len).context(BufferSnafu)
}
