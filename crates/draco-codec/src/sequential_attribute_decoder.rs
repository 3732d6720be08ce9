//! Decoder counterpart of the raw attribute coding path.

use crate::decoder_buffer::DecoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::AttributeValueIndex;
use crate::status::Status;

pub fn decode_values(
    att: &mut PointAttribute,
    num_values: usize,
    in_buffer: &mut DecoderBuffer<'_>,
) -> Status {
    let stride = att.byte_stride();
    att.resize(num_values);
    let mut entry = vec![0u8; stride];
    for i in 0..num_values {
        in_buffer.decode_data(&mut entry)?;
        att.set_entry_bytes(AttributeValueIndex(i as u32), &entry);
    }
    Ok(())
}
