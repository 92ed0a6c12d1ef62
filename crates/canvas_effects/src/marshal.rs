// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion of property values into native encodings.
//!
//! Scalars map one-to-one. Float arrays are identified by their length,
//! since each native array encoding has a distinct element count:
//!
//! | length | encoding      |
//! |--------|---------------|
//! | 2      | vector of 2   |
//! | 3      | vector of 3   |
//! | 4      | vector of 4   |
//! | 6      | 3x2 matrix    |
//! | 16     | 4x4 matrix    |
//! | 20     | 5x4 matrix    |
//!
//! Only the 4x4 matrix is marshaled; the other shapes are recognised so the
//! error can name them, and rejected as not supported.

use crate::error::{EffectError, Result, Slot};
use crate::native::{NativeEffect, NativeValue};
use crate::slots::PropertyStore;
use crate::value::PropertyValue;
use std::fmt;

/// Native array encoding selected by a float array's length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    /// 2 floats
    Vector2,
    /// 3 floats
    Vector3,
    /// 4 floats
    Vector4,
    /// 6 floats
    Matrix3x2,
    /// 16 floats
    Matrix4x4,
    /// 20 floats
    Matrix5x4,
}

impl ArrayShape {
    /// Identify the encoding for an array of `len` floats
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            2 => Some(Self::Vector2),
            3 => Some(Self::Vector3),
            4 => Some(Self::Vector4),
            6 => Some(Self::Matrix3x2),
            16 => Some(Self::Matrix4x4),
            20 => Some(Self::Matrix5x4),
            _ => None,
        }
    }

    /// Number of floats in this encoding
    pub fn element_count(self) -> usize {
        match self {
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
            Self::Matrix3x2 => 6,
            Self::Matrix4x4 => 16,
            Self::Matrix5x4 => 20,
        }
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vector2 => "2-component vector",
            Self::Vector3 => "3-component vector",
            Self::Vector4 => "4-component vector",
            Self::Matrix3x2 => "3x2 matrix",
            Self::Matrix4x4 => "4x4 matrix",
            Self::Matrix5x4 => "5x4 matrix",
        };
        f.write_str(name)
    }
}

/// Convert the value of property slot `index` into its native encoding
pub fn to_native(index: u32, value: &PropertyValue) -> Result<NativeValue> {
    match value {
        PropertyValue::UInt32(v) => Ok(NativeValue::UInt32(*v)),
        PropertyValue::Float(v) => Ok(NativeValue::Float(*v)),
        PropertyValue::FloatArray(values) => array_to_native(index, values),
        PropertyValue::Bool(_) | PropertyValue::Int32(_) | PropertyValue::String(_) => {
            Err(EffectError::NotSupported {
                index,
                shape: format!("{:?} value", value.property_type()),
            })
        }
    }
}

fn array_to_native(index: u32, values: &[f32]) -> Result<NativeValue> {
    match ArrayShape::from_len(values.len()) {
        Some(ArrayShape::Matrix4x4) => {
            let matrix = <[f32; 16]>::try_from(values).map_err(|_| EffectError::NotSupported {
                index,
                shape: ArrayShape::Matrix4x4.to_string(),
            })?;
            Ok(NativeValue::Matrix4x4(matrix))
        }
        Some(
            shape @ (ArrayShape::Vector2
            | ArrayShape::Vector3
            | ArrayShape::Vector4
            | ArrayShape::Matrix3x2
            | ArrayShape::Matrix5x4),
        ) => Err(EffectError::NotSupported {
            index,
            shape: shape.to_string(),
        }),
        None => Err(EffectError::NotSupported {
            index,
            shape: format!("float array of length {}", values.len()),
        }),
    }
}

fn push_slot(resource: &mut dyn NativeEffect, index: u32, slot: Option<&PropertyValue>) -> Result<()> {
    let value = slot.ok_or(EffectError::NullReference {
        slot: Slot::Property(index),
    })?;
    let native = to_native(index, value)?;
    resource.set_value(index, native)?;
    tracing::trace!("Pushed property {} = {:?}", index, native);
    Ok(())
}

/// Push property slot `index` into `resource`
pub fn push_property(resource: &mut dyn NativeEffect, properties: &PropertyStore, index: u32) -> Result<()> {
    properties.with_slots(|slots| {
        let len = slots.len() as u32;
        let slot = slots
            .get(index as usize)
            .ok_or(EffectError::OutOfRange { index, len })?;
        push_slot(resource, index, slot.as_ref())
    })
}

/// Push every property slot into `resource`, in index order.
///
/// Stops at the first failing slot.
pub fn push_all(resource: &mut dyn NativeEffect, properties: &PropertyStore) -> Result<()> {
    properties.with_slots(|slots| push_slots(resource, slots))
}

pub(crate) fn push_slots(resource: &mut dyn NativeEffect, slots: &[Option<PropertyValue>]) -> Result<()> {
    slots
        .iter()
        .enumerate()
        .try_for_each(|(index, slot)| push_slot(resource, index as u32, slot.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NativeError;
    use crate::native::ImageHandle;

    #[derive(Default)]
    struct Recorder {
        values: Vec<(u32, NativeValue)>,
        fail_at: Option<u32>,
    }

    impl NativeEffect for Recorder {
        fn set_value(&mut self, index: u32, value: NativeValue) -> Result<(), NativeError> {
            if self.fail_at == Some(index) {
                return Err(NativeError::new("rejected"));
            }
            self.values.push((index, value));
            Ok(())
        }

        fn set_input_count(&mut self, _count: u32) -> Result<(), NativeError> {
            Ok(())
        }

        fn set_input(&mut self, _index: u32, _image: ImageHandle) -> Result<(), NativeError> {
            Ok(())
        }

        fn image(&self) -> Option<ImageHandle> {
            None
        }
    }

    fn identity() -> Vec<f32> {
        (0..16).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_native(0, &PropertyValue::UInt32(4)).unwrap(), NativeValue::UInt32(4));
        assert_eq!(to_native(1, &PropertyValue::Float(0.25)).unwrap(), NativeValue::Float(0.25));
    }

    #[test]
    fn test_matrix_4x4() {
        let native = to_native(0, &PropertyValue::FloatArray(identity())).unwrap();
        let NativeValue::Matrix4x4(matrix) = native else {
            panic!("expected a 4x4 matrix, got {native:?}");
        };
        assert_eq!(matrix[0], 1.0);
        assert_eq!(matrix[5], 1.0);
        assert_eq!(matrix[1], 0.0);
    }

    #[test]
    fn test_other_array_lengths_not_supported() {
        for len in [2usize, 3, 4, 6, 20, 7, 0] {
            let result = to_native(3, &PropertyValue::FloatArray(vec![0.0; len]));
            assert!(
                matches!(result, Err(EffectError::NotSupported { index: 3, .. })),
                "length {len} should be rejected"
            );
        }
    }

    #[test]
    fn test_shape_names() {
        let Err(EffectError::NotSupported { shape, .. }) = to_native(0, &PropertyValue::FloatArray(vec![0.0; 6])) else {
            panic!("expected not supported");
        };
        assert_eq!(shape, "3x2 matrix");
        assert_eq!(ArrayShape::from_len(20).map(ArrayShape::element_count), Some(20));
        assert_eq!(ArrayShape::from_len(5), None);
    }

    #[test]
    fn test_unmarshalable_types() {
        for value in [PropertyValue::Bool(true), PropertyValue::Int32(-1), PropertyValue::from("x")] {
            assert!(matches!(to_native(0, &value), Err(EffectError::NotSupported { .. })));
        }
    }

    #[test]
    fn test_push_all_in_order() {
        let store = PropertyStore::new(3, false);
        store.set(0, Some(PropertyValue::Float(2.0))).unwrap();
        store.set(1, Some(PropertyValue::UInt32(1))).unwrap();
        store.set(2, Some(PropertyValue::FloatArray(identity()))).unwrap();

        let mut recorder = Recorder::default();
        push_all(&mut recorder, &store).unwrap();
        let indices: Vec<u32> = recorder.values.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_push_empty_slot() {
        let store = PropertyStore::new(2, false);
        store.set(0, Some(PropertyValue::Float(2.0))).unwrap();

        let mut recorder = Recorder::default();
        let result = push_all(&mut recorder, &store);
        assert!(matches!(
            result,
            Err(EffectError::NullReference { slot: Slot::Property(1) })
        ));
        assert_eq!(recorder.values.len(), 1);
    }

    #[test]
    fn test_unsupported_array_never_reaches_native() {
        let store = PropertyStore::new(1, false);
        store.set(0, Some(PropertyValue::FloatArray(vec![1.0, 2.0, 3.0]))).unwrap();

        let mut recorder = Recorder::default();
        assert!(push_property(&mut recorder, &store, 0).is_err());
        assert!(recorder.values.is_empty());
        assert!(matches!(
            push_property(&mut recorder, &store, 4),
            Err(EffectError::OutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_native_failure_propagates() {
        let store = PropertyStore::new(2, false);
        store.set(0, Some(PropertyValue::Float(1.0))).unwrap();
        store.set(1, Some(PropertyValue::Float(2.0))).unwrap();

        let mut recorder = Recorder {
            fail_at: Some(0),
            ..Default::default()
        };
        assert!(matches!(push_all(&mut recorder, &store), Err(EffectError::Native(_))));
        assert!(recorder.values.is_empty());
    }
}
