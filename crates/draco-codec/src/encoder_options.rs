use crate::geometry_attribute::GeometryAttributeType;
use crate::mesh_edgebreaker_shared::TraversalKind;
use crate::prediction_scheme::PredictionSchemeMethod;

/// The knobs the core codec reads. Speed trades compression for time:
/// high speeds pick the standard traversal coder, low speeds the
/// valence-adaptive one, and speed 0 additionally switches positions to
/// the prediction-degree traversal order.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    pub encoding_speed: i32,
    pub position_quantization_bits: u32,
    pub normal_quantization_bits: u32,
    pub tex_coord_quantization_bits: u32,
    pub generic_quantization_bits: u32,
    pub traversal_kind_override: Option<TraversalKind>,
    pub prediction_override: Option<PredictionSchemeMethod>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            encoding_speed: 5,
            // 0 disables quantization (lossless float pass-through).
            position_quantization_bits: 0,
            normal_quantization_bits: 0,
            tex_coord_quantization_bits: 0,
            generic_quantization_bits: 0,
            traversal_kind_override: None,
            prediction_override: None,
        }
    }
}

impl EncoderOptions {
    pub fn traversal_kind(&self) -> TraversalKind {
        if let Some(kind) = self.traversal_kind_override {
            return kind;
        }
        if self.encoding_speed >= 5 {
            TraversalKind::Standard
        } else {
            TraversalKind::Valence
        }
    }

    pub fn quantization_bits(&self, att_type: GeometryAttributeType) -> u32 {
        match att_type {
            GeometryAttributeType::Position => self.position_quantization_bits,
            GeometryAttributeType::Normal => self.normal_quantization_bits,
            GeometryAttributeType::TexCoord => self.tex_coord_quantization_bits,
            _ => self.generic_quantization_bits,
        }
    }
}
