//! Fallback attribute coding: values are stored verbatim (little
//! endian), one entry per point in sequencer order. Used for data types
//! the integer pipeline cannot carry.

use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::PointIndex;

pub fn encode_values(
    att: &PointAttribute,
    point_ids: &[PointIndex],
    out_buffer: &mut EncoderBuffer,
) {
    for &point in point_ids {
        let value_index = att.mapped_index(point);
        out_buffer.encode_data(att.entry_bytes(value_index));
    }
}
