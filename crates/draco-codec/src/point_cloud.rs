use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::{AttributeValueIndex, PointIndex};

/// Ordered set of points plus their attributes.
#[derive(Debug, Default, Clone)]
pub struct PointCloud {
    attributes: Vec<PointAttribute>,
    named_attribute_index: Vec<Vec<i32>>,
    num_points: usize,
}

const NUM_NAMED_ATTRIBUTE_TYPES: usize = 5;

impl PointCloud {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            named_attribute_index: vec![Vec::new(); NUM_NAMED_ATTRIBUTE_TYPES],
            num_points: 0,
        }
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn set_num_points(&mut self, num_points: usize) {
        self.num_points = num_points;
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn add_attribute(&mut self, mut attribute: PointAttribute) -> i32 {
        let id = self.attributes.len() as i32;
        attribute.set_unique_id(id as u32);
        let kind = attribute.attribute_type() as i32;
        if kind >= 0 {
            self.named_attribute_index[kind as usize].push(id);
        }
        self.attributes.push(attribute);
        id
    }

    pub fn attribute(&self, att_id: i32) -> &PointAttribute {
        &self.attributes[att_id as usize]
    }

    pub fn attribute_mut(&mut self, att_id: i32) -> &mut PointAttribute {
        &mut self.attributes[att_id as usize]
    }

    pub fn num_named_attributes(&self, att_type: GeometryAttributeType) -> usize {
        let kind = att_type as i32;
        if kind < 0 {
            return 0;
        }
        self.named_attribute_index[kind as usize].len()
    }

    pub fn named_attribute_id(&self, att_type: GeometryAttributeType) -> i32 {
        self.named_attribute_id_at(att_type, 0)
    }

    pub fn named_attribute_id_at(&self, att_type: GeometryAttributeType, i: usize) -> i32 {
        let kind = att_type as i32;
        if kind < 0 {
            return -1;
        }
        match self.named_attribute_index[kind as usize].get(i) {
            Some(&id) => id,
            None => -1,
        }
    }

    pub fn named_attribute(&self, att_type: GeometryAttributeType) -> Option<&PointAttribute> {
        let id = self.named_attribute_id(att_type);
        if id >= 0 {
            Some(&self.attributes[id as usize])
        } else {
            None
        }
    }

    /// Per-attribute value deduplication (§4.3).
    pub fn deduplicate_attribute_values(&mut self) {
        let num_points = self.num_points;
        for attribute in self.attributes.iter_mut() {
            attribute.deduplicate_values(num_points);
        }
    }

    /// Merges points whose every attribute maps to identical value
    /// indices. Returns the old-point -> new-point map so callers can
    /// rewrite anything referencing point ids (mesh faces).
    pub fn deduplicate_point_ids(&mut self) -> Vec<PointIndex> {
        use std::collections::HashMap;

        let mut unique: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut point_map = vec![PointIndex(0); self.num_points];
        let mut unique_points: Vec<PointIndex> = Vec::new();

        for p in 0..self.num_points {
            let point = PointIndex(p as u32);
            let signature: Vec<u32> = self
                .attributes
                .iter()
                .map(|att| att.mapped_index(point).value())
                .collect();
            let next_id = unique.len() as u32;
            let id = *unique.entry(signature).or_insert(next_id);
            if id == next_id {
                unique_points.push(point);
            }
            point_map[p] = PointIndex(id);
        }

        if unique_points.len() == self.num_points {
            return point_map;
        }

        // Rebuild the attribute mappings over the surviving points.
        let num_unique = unique_points.len();
        for attribute in self.attributes.iter_mut() {
            let entries: Vec<AttributeValueIndex> = unique_points
                .iter()
                .map(|&p| attribute.mapped_index(p))
                .collect();
            attribute.set_explicit_mapping(num_unique);
            for (p, &entry) in entries.iter().enumerate() {
                attribute.set_point_map_entry(PointIndex(p as u32), entry);
            }
        }
        self.num_points = num_unique;
        point_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draco_types::DataType;
    use crate::geometry_indices::AttributeValueIndex;

    #[test]
    fn test_named_attribute_lookup() {
        let mut pc = PointCloud::new();
        pc.set_num_points(3);
        let pos = PointAttribute::new(
            GeometryAttributeType::Position,
            3,
            DataType::Float32,
            false,
            3,
        );
        let uv = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, 3);
        let pos_id = pc.add_attribute(pos);
        let uv_id = pc.add_attribute(uv);
        assert_eq!(pc.named_attribute_id(GeometryAttributeType::Position), pos_id);
        assert_eq!(pc.named_attribute_id(GeometryAttributeType::TexCoord), uv_id);
        assert_eq!(pc.named_attribute_id(GeometryAttributeType::Normal), -1);
    }

    #[test]
    fn test_deduplicate_point_ids() {
        let mut pc = PointCloud::new();
        pc.set_num_points(4);
        let mut att =
            PointAttribute::new(GeometryAttributeType::Generic, 1, DataType::Int32, false, 2);
        att.set_value_from_i32(AttributeValueIndex(0), &[10]);
        att.set_value_from_i32(AttributeValueIndex(1), &[20]);
        att.set_explicit_mapping(4);
        att.set_point_map_entry(PointIndex(0), AttributeValueIndex(0));
        att.set_point_map_entry(PointIndex(1), AttributeValueIndex(1));
        att.set_point_map_entry(PointIndex(2), AttributeValueIndex(0));
        att.set_point_map_entry(PointIndex(3), AttributeValueIndex(1));
        pc.add_attribute(att);

        let map = pc.deduplicate_point_ids();
        assert_eq!(pc.num_points(), 2);
        assert_eq!(map[0], map[2]);
        assert_eq!(map[1], map[3]);
        assert_ne!(map[0], map[1]);
    }
}
