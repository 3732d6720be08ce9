//! Strongly typed indices for geometry elements. Mixing index kinds is a
//! compile error; each kind shares the same distinguished invalid value
//! (the bit pattern of `i32::MIN / 2`).

/// Bit pattern of `i32::MIN / 2`, shared by every index kind.
pub const INVALID_INDEX_VALUE: u32 = (i32::MIN / 2) as u32;

macro_rules! define_index {
    ($name:ident, $invalid:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        pub const $invalid: $name = $name(INVALID_INDEX_VALUE);

        impl $name {
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX_VALUE
            }

            #[inline]
            pub fn value(self) -> u32 {
                self.0
            }

            #[inline]
            pub fn index(self) -> usize {
                debug_assert!(self.is_valid());
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }
    };
}

define_index!(PointIndex, INVALID_POINT_INDEX);
define_index!(VertexIndex, INVALID_VERTEX_INDEX);
define_index!(CornerIndex, INVALID_CORNER_INDEX);
define_index!(FaceIndex, INVALID_FACE_INDEX);
define_index!(AttributeValueIndex, INVALID_ATTRIBUTE_VALUE_INDEX);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value() {
        assert_eq!(INVALID_INDEX_VALUE, 0xC000_0000);
        assert!(!INVALID_CORNER_INDEX.is_valid());
        assert!(CornerIndex(0).is_valid());
        assert!(CornerIndex(12345).is_valid());
    }

    #[test]
    fn test_distinct_kinds() {
        let c = CornerIndex(3);
        let f = FaceIndex(1);
        assert_eq!(c.value() / 3, f.value());
    }
}
