use std::collections::HashMap;

use byteorder::{ByteOrder, LittleEndian};
use num_traits::NumCast;

use crate::data_buffer::DataBuffer;
use crate::draco_types::DataType;
use crate::geometry_indices::{AttributeValueIndex, PointIndex, INVALID_ATTRIBUTE_VALUE_INDEX};

/// Semantic kind of an attribute. The discriminants are part of the
/// bitstream (attribute descriptor `type` byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryAttributeType {
    Invalid = -1,
    Position = 0,
    Normal = 1,
    Color = 2,
    TexCoord = 3,
    Generic = 4,
}

impl GeometryAttributeType {
    pub fn from_u8(value: u8) -> GeometryAttributeType {
        match value {
            0 => GeometryAttributeType::Position,
            1 => GeometryAttributeType::Normal,
            2 => GeometryAttributeType::Color,
            3 => GeometryAttributeType::TexCoord,
            4 => GeometryAttributeType::Generic,
            _ => GeometryAttributeType::Invalid,
        }
    }
}

/// Attribute descriptor: value layout plus the semantic kind.
#[derive(Debug, Clone)]
pub struct GeometryAttribute {
    attribute_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    byte_stride: usize,
    byte_offset: usize,
    unique_id: u32,
}

impl Default for GeometryAttribute {
    fn default() -> Self {
        Self {
            attribute_type: GeometryAttributeType::Invalid,
            data_type: DataType::Invalid,
            num_components: 0,
            normalized: false,
            byte_stride: 0,
            byte_offset: 0,
            unique_id: 0,
        }
    }
}

impl GeometryAttribute {
    pub fn attribute_type(&self) -> GeometryAttributeType {
        self.attribute_type
    }
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
    pub fn num_components(&self) -> u8 {
        self.num_components
    }
    pub fn normalized(&self) -> bool {
        self.normalized
    }
    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }
    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }
    pub fn set_unique_id(&mut self, id: u32) {
        self.unique_id = id;
    }
}

/// An attribute attached to points: the descriptor, the owned value
/// buffer and the point -> value mapping (identity or explicit).
#[derive(Debug, Clone)]
pub struct PointAttribute {
    base: GeometryAttribute,
    buffer: DataBuffer,
    indices_map: Vec<AttributeValueIndex>,
    identity_mapping: bool,
    num_unique_entries: usize,
}

impl PointAttribute {
    pub fn new(
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: DataType,
        normalized: bool,
        num_attribute_values: usize,
    ) -> Self {
        let byte_stride = num_components as usize * data_type.byte_length();
        let mut attribute = Self {
            base: GeometryAttribute {
                attribute_type,
                data_type,
                num_components,
                normalized,
                byte_stride,
                byte_offset: 0,
                unique_id: 0,
            },
            buffer: DataBuffer::new(),
            indices_map: Vec::new(),
            identity_mapping: true,
            num_unique_entries: num_attribute_values,
        };
        attribute.buffer.resize(num_attribute_values * byte_stride);
        attribute
    }

    pub fn attribute_type(&self) -> GeometryAttributeType {
        self.base.attribute_type()
    }
    pub fn data_type(&self) -> DataType {
        self.base.data_type()
    }
    pub fn num_components(&self) -> u8 {
        self.base.num_components()
    }
    pub fn normalized(&self) -> bool {
        self.base.normalized()
    }
    pub fn byte_stride(&self) -> usize {
        self.base.byte_stride()
    }
    pub fn unique_id(&self) -> u32 {
        self.base.unique_id()
    }
    pub fn set_unique_id(&mut self, id: u32) {
        self.base.set_unique_id(id);
    }

    /// Number of unique attribute values.
    pub fn size(&self) -> usize {
        self.num_unique_entries
    }

    pub fn resize(&mut self, num_values: usize) {
        self.num_unique_entries = num_values;
        self.buffer.resize(num_values * self.byte_stride());
    }

    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut DataBuffer {
        &mut self.buffer
    }

    pub fn is_mapping_identity(&self) -> bool {
        self.identity_mapping
    }

    pub fn mapped_index(&self, point_index: PointIndex) -> AttributeValueIndex {
        if self.identity_mapping {
            AttributeValueIndex(point_index.0)
        } else if (point_index.0 as usize) < self.indices_map.len() {
            self.indices_map[point_index.index()]
        } else {
            INVALID_ATTRIBUTE_VALUE_INDEX
        }
    }

    pub fn set_identity_mapping(&mut self) {
        self.identity_mapping = true;
        self.indices_map.clear();
    }

    pub fn set_explicit_mapping(&mut self, num_points: usize) {
        self.identity_mapping = false;
        self.indices_map
            .resize(num_points, INVALID_ATTRIBUTE_VALUE_INDEX);
    }

    pub fn set_point_map_entry(&mut self, point_index: PointIndex, entry_index: AttributeValueIndex) {
        debug_assert!(!self.identity_mapping);
        self.indices_map[point_index.index()] = entry_index;
    }

    pub fn entry_bytes(&self, value_index: AttributeValueIndex) -> &[u8] {
        let start = value_index.index() * self.byte_stride();
        &self.buffer.data()[start..start + self.byte_stride()]
    }

    pub fn set_entry_bytes(&mut self, value_index: AttributeValueIndex, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.byte_stride());
        let start = value_index.index() * self.base.byte_stride();
        self.buffer.write(start, bytes);
    }

    fn component_to_f64(&self, bytes: &[u8], component: usize) -> f64 {
        let size = self.data_type().byte_length();
        let offset = component * size;
        let b = &bytes[offset..offset + size];
        match self.data_type() {
            DataType::Int8 => b[0] as i8 as f64,
            DataType::UInt8 | DataType::Bool => b[0] as f64,
            DataType::Int16 => LittleEndian::read_i16(b) as f64,
            DataType::UInt16 => LittleEndian::read_u16(b) as f64,
            DataType::Int32 => LittleEndian::read_i32(b) as f64,
            DataType::UInt32 => LittleEndian::read_u32(b) as f64,
            DataType::Int64 => LittleEndian::read_i64(b) as f64,
            DataType::UInt64 => LittleEndian::read_u64(b) as f64,
            DataType::Float32 => LittleEndian::read_f32(b) as f64,
            DataType::Float64 => LittleEndian::read_f64(b),
            DataType::Invalid => 0.0,
        }
    }

    /// Reads one value entry converted to the requested numeric type.
    /// Returns `None` when a component cannot represent the stored value.
    pub fn convert_value<T: NumCast>(&self, value_index: AttributeValueIndex, out: &mut [T]) -> bool {
        let bytes = self.entry_bytes(value_index);
        for (c, slot) in out.iter_mut().enumerate().take(self.num_components() as usize) {
            let value = self.component_to_f64(bytes, c);
            match num_traits::cast(value) {
                Some(v) => *slot = v,
                None => return false,
            }
        }
        true
    }

    /// Reads one value entry as i32 components with wrap-around
    /// narrowing, matching the integer coding path.
    pub fn convert_value_to_i32(&self, value_index: AttributeValueIndex, out: &mut [i32]) {
        let bytes = self.entry_bytes(value_index);
        let size = self.data_type().byte_length();
        for (c, slot) in out
            .iter_mut()
            .enumerate()
            .take(self.num_components() as usize)
        {
            let b = &bytes[c * size..(c + 1) * size];
            *slot = match self.data_type() {
                DataType::Int8 => b[0] as i8 as i32,
                DataType::UInt8 | DataType::Bool => b[0] as i32,
                DataType::Int16 => LittleEndian::read_i16(b) as i32,
                DataType::UInt16 => LittleEndian::read_u16(b) as i32,
                DataType::Int32 => LittleEndian::read_i32(b),
                DataType::UInt32 => LittleEndian::read_u32(b) as i32,
                DataType::Int64 => LittleEndian::read_i64(b) as i32,
                DataType::UInt64 => LittleEndian::read_u64(b) as i32,
                DataType::Float32 => LittleEndian::read_f32(b) as i32,
                DataType::Float64 => LittleEndian::read_f64(b) as i32,
                DataType::Invalid => 0,
            };
        }
    }

    /// Writes one value entry from i32 components, narrowing to the
    /// attribute's data type.
    pub fn set_value_from_i32(&mut self, value_index: AttributeValueIndex, components: &[i32]) {
        let stride = self.byte_stride();
        let size = self.data_type().byte_length();
        let mut bytes = vec![0u8; stride];
        for (c, &v) in components.iter().enumerate().take(self.num_components() as usize) {
            let b = &mut bytes[c * size..(c + 1) * size];
            match self.data_type() {
                DataType::Int8 => b[0] = v as i8 as u8,
                DataType::UInt8 | DataType::Bool => b[0] = v as u8,
                DataType::Int16 => LittleEndian::write_i16(b, v as i16),
                DataType::UInt16 => LittleEndian::write_u16(b, v as u16),
                DataType::Int32 => LittleEndian::write_i32(b, v),
                DataType::UInt32 => LittleEndian::write_u32(b, v as u32),
                DataType::Int64 => LittleEndian::write_i64(b, v as i64),
                DataType::UInt64 => LittleEndian::write_u64(b, v as u64),
                DataType::Float32 => LittleEndian::write_f32(b, v as f32),
                DataType::Float64 => LittleEndian::write_f64(b, v as f64),
                DataType::Invalid => {}
            }
        }
        self.set_entry_bytes(value_index, &bytes);
    }

    pub fn set_value_from_f32(&mut self, value_index: AttributeValueIndex, components: &[f32]) {
        debug_assert!(self.data_type().is_float());
        let stride = self.byte_stride();
        let size = self.data_type().byte_length();
        let mut bytes = vec![0u8; stride];
        for (c, &v) in components.iter().enumerate().take(self.num_components() as usize) {
            let b = &mut bytes[c * size..(c + 1) * size];
            match self.data_type() {
                DataType::Float64 => LittleEndian::write_f64(b, v as f64),
                _ => LittleEndian::write_f32(b, v),
            }
        }
        self.set_entry_bytes(value_index, &bytes);
    }

    /// Merges identical value entries and rewrites the point mapping.
    /// Returns the number of unique values left.
    pub fn deduplicate_values(&mut self, num_points: usize) -> usize {
        let stride = self.byte_stride();
        let mut unique: HashMap<Vec<u8>, u32> = HashMap::new();
        let mut value_map = vec![0u32; self.num_unique_entries];
        let mut unique_data: Vec<u8> = Vec::with_capacity(self.buffer.data_size());

        for i in 0..self.num_unique_entries {
            let entry = &self.buffer.data()[i * stride..(i + 1) * stride];
            let next_id = unique.len() as u32;
            let id = *unique.entry(entry.to_vec()).or_insert(next_id);
            if id == next_id {
                unique_data.extend_from_slice(entry);
            }
            value_map[i] = id;
        }

        if unique.len() == self.num_unique_entries {
            return self.num_unique_entries;
        }

        // Rewrite the buffer and the point mapping.
        self.buffer.update(&unique_data);
        if self.identity_mapping {
            self.set_explicit_mapping(num_points);
            for p in 0..num_points {
                self.indices_map[p] = AttributeValueIndex(value_map[p]);
            }
        } else {
            for entry in self.indices_map.iter_mut() {
                *entry = AttributeValueIndex(value_map[entry.index()]);
            }
        }
        self.num_unique_entries = unique.len();
        self.num_unique_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mapping() {
        let att = PointAttribute::new(
            GeometryAttributeType::Position,
            3,
            DataType::Float32,
            false,
            4,
        );
        assert_eq!(att.mapped_index(PointIndex(2)), AttributeValueIndex(2));
        assert_eq!(att.byte_stride(), 12);
        assert_eq!(att.size(), 4);
    }

    #[test]
    fn test_value_conversion() {
        let mut att = PointAttribute::new(
            GeometryAttributeType::Generic,
            2,
            DataType::Int16,
            false,
            1,
        );
        att.set_value_from_i32(AttributeValueIndex(0), &[-5, 300]);
        let mut out = [0i32; 2];
        assert!(att.convert_value(AttributeValueIndex(0), &mut out));
        assert_eq!(out, [-5, 300]);
    }

    #[test]
    fn test_deduplicate_values() {
        let mut att = PointAttribute::new(
            GeometryAttributeType::Generic,
            1,
            DataType::Int32,
            false,
            4,
        );
        for (i, v) in [7, 9, 7, 9].iter().enumerate() {
            att.set_value_from_i32(AttributeValueIndex(i as u32), &[*v]);
        }
        assert_eq!(att.deduplicate_values(4), 2);
        assert_eq!(att.mapped_index(PointIndex(0)), att.mapped_index(PointIndex(2)));
        assert_ne!(att.mapped_index(PointIndex(0)), att.mapped_index(PointIndex(1)));
        let mut out = [0i32; 1];
        assert!(att.convert_value(att.mapped_index(PointIndex(3)), &mut out));
        assert_eq!(out[0], 9);
    }
}
