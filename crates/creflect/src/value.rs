// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed byte-range views over reflected values.
//!
//! A value is a byte slice plus the [`TypeRecord`] describing it. Field
//! access slices out the field's bytes and tags them with the field record
//! and its declared type; reinterpreting those bytes as a Rust scalar goes
//! through [`NativeScalar`] only.

use crate::registry::{FieldRecord, Registry, TypeRecord};
use std::ptr::NonNull;

/// Fixed-size scalar decodable from native-endian bytes.
pub trait NativeScalar: Copy {
    const SIZE: usize;

    fn from_ne_slice(bytes: &[u8]) -> Self;

    fn write_ne_slice(self, out: &mut [u8]);
}

macro_rules! impl_native_scalar {
    ($($type:ty),* $(,)?) => {
        $(
            impl NativeScalar for $type {
                const SIZE: usize = std::mem::size_of::<$type>();

                fn from_ne_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$type>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$type>::from_ne_bytes(raw)
                }

                fn write_ne_slice(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_native_scalar!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// Bytes covered by `field`: one pointer per element for pointer fields,
/// otherwise the declared type's size per element. Unresolved types count as
/// zero-sized.
pub fn field_extent(registry: &Registry<'_>, field: &FieldRecord<'_>) -> Option<usize> {
    let element = if field.is_pointer() {
        std::mem::size_of::<usize>()
    } else {
        registry.type_of_field(field).map_or(0, TypeRecord::size)
    };
    element.checked_mul(field.arr_size.max(1))
}

fn field_range(
    registry: &Registry<'_>,
    field: &FieldRecord<'_>,
    value_len: usize,
) -> Option<std::ops::Range<usize>> {
    let end = field.offset.checked_add(field_extent(registry, field)?)?;
    (end <= value_len).then_some(field.offset..end)
}

/// Read-only view of one field inside a value.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'v, 'r> {
    field: &'r FieldRecord<'r>,
    ty: Option<&'r TypeRecord<'r>>,
    bytes: &'v [u8],
}

impl<'v, 'r> FieldView<'v, 'r> {
    pub fn field(&self) -> &'r FieldRecord<'r> {
        self.field
    }

    /// Declared type of the field, when the producer resolved it.
    pub fn field_type(&self) -> Option<&'r TypeRecord<'r>> {
        self.ty
    }

    pub fn as_bytes(&self) -> &'v [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the leading bytes as `T`; `None` if the field is too small.
    pub fn read<T: NativeScalar>(&self) -> Option<T> {
        (self.bytes.len() >= T::SIZE).then(|| T::from_ne_slice(self.bytes))
    }

    /// Decode element `index` of an array field.
    pub fn read_element<T: NativeScalar>(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        let bytes = self.bytes.get(start..start.checked_add(T::SIZE)?)?;
        Some(T::from_ne_slice(bytes))
    }
}

/// Mutable view of one field inside a value.
#[derive(Debug)]
pub struct FieldViewMut<'v, 'r> {
    field: &'r FieldRecord<'r>,
    ty: Option<&'r TypeRecord<'r>>,
    bytes: &'v mut [u8],
}

impl<'v, 'r> FieldViewMut<'v, 'r> {
    pub fn field(&self) -> &'r FieldRecord<'r> {
        self.field
    }

    pub fn field_type(&self) -> Option<&'r TypeRecord<'r>> {
        self.ty
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    pub fn read<T: NativeScalar>(&self) -> Option<T> {
        (self.bytes.len() >= T::SIZE).then(|| T::from_ne_slice(self.bytes))
    }

    /// Store `value` in the leading bytes; `false` if the field is too small.
    pub fn write<T: NativeScalar>(&mut self, value: T) -> bool {
        if self.bytes.len() < T::SIZE {
            return false;
        }
        value.write_ne_slice(self.bytes);
        true
    }

    /// Store `value` as element `index` of an array field.
    pub fn write_element<T: NativeScalar>(&mut self, index: usize, value: T) -> bool {
        let Some(start) = index.checked_mul(T::SIZE) else {
            return false;
        };
        let Some(end) = start.checked_add(T::SIZE) else {
            return false;
        };
        match self.bytes.get_mut(start..end) {
            Some(slot) => {
                value.write_ne_slice(slot);
                true
            }
            None => false,
        }
    }
}

impl<'a> Registry<'a> {
    /// View field `name` of a value of type `ty` held in `value`.
    ///
    /// For values without an allocation header (stack values, foreign
    /// buffers). Returns `None` if the field is unknown or its bytes do not
    /// fit in `value`.
    pub fn get_field_manual<'r, 'v>(
        &'r self,
        value: &'v [u8],
        name: &str,
        ty: &'r TypeRecord<'a>,
    ) -> Option<FieldView<'v, 'r>> {
        let field = ty.field(name)?;
        let range = field_range(self, field, value.len())?;
        Some(FieldView {
            field,
            ty: self.type_of_field(field),
            bytes: &value[range],
        })
    }

    /// Mutable counterpart of [`Self::get_field_manual`].
    pub fn get_field_manual_mut<'r, 'v>(
        &'r self,
        value: &'v mut [u8],
        name: &str,
        ty: &'r TypeRecord<'a>,
    ) -> Option<FieldViewMut<'v, 'r>> {
        let field = ty.field(name)?;
        let range = field_range(self, field, value.len())?;
        Some(FieldViewMut {
            field,
            ty: self.type_of_field(field),
            bytes: &mut value[range],
        })
    }

    /// Address of field `name` inside the value at `ptr`, typed by `ty`.
    ///
    /// Only offset arithmetic is performed; nothing is read.
    ///
    /// # Safety
    /// `ptr` must point to a value of type `ty` (at least `ty.size()` bytes
    /// in one allocation).
    pub unsafe fn get_field_manual_raw(
        &self,
        ptr: NonNull<u8>,
        name: &str,
        ty: &TypeRecord<'a>,
    ) -> Option<NonNull<u8>> {
        let field = ty.field(name)?;
        if field.offset > ty.size() {
            return None;
        }
        // SAFETY: offset lies within the value per the caller's contract.
        Some(NonNull::new_unchecked(ptr.as_ptr().add(field.offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobWriter, WriterOptions};
    use crate::schema::{Schema, SchemaField, SchemaType};

    fn blob() -> Vec<u8> {
        let schema = Schema::new(vec![
            SchemaType::base("int", 4),
            SchemaType::base("char", 1),
            SchemaType::structure("packet", 24)
                .with_field(SchemaField::new("len", "int", 0))
                .with_field(SchemaField::new("tag", "char", 4).array(4))
                .with_field(SchemaField::new("next", "packet", 8).pointer(1))
                .with_field(SchemaField::new("tail", "int", 22)),
        ]);
        BlobWriter::encode(&schema, &WriterOptions::host()).expect("encode")
    }

    #[test]
    fn test_field_extent_by_kind() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let packet = registry.type_by_name("packet").expect("packet");
        let extent = |name: &str| field_extent(&registry, packet.field(name).unwrap());
        assert_eq!(extent("len"), Some(4));
        assert_eq!(extent("tag"), Some(4));
        assert_eq!(extent("next"), Some(std::mem::size_of::<usize>()));
    }

    #[test]
    fn test_manual_view_read_write() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let packet = registry.type_by_name("packet").expect("packet");
        let mut value = [0u8; 24];

        {
            let mut len = registry
                .get_field_manual_mut(&mut value, "len", packet)
                .expect("len view");
            assert!(len.write(0x0102_0304i32));
            assert!(!len.write(7u64));
        }
        {
            let mut tag = registry
                .get_field_manual_mut(&mut value, "tag", packet)
                .expect("tag view");
            assert!(tag.write_element(2, b'z'));
            assert!(!tag.write_element(4, b'!'));
        }

        let len = registry.get_field_manual(&value, "len", packet).unwrap();
        assert_eq!(len.read::<i32>(), Some(0x0102_0304));
        assert_eq!(len.field_type().map(|t| t.name()), Some("int"));
        assert_eq!(&value[..4], &0x0102_0304i32.to_ne_bytes());

        let tag = registry.get_field_manual(&value, "tag", packet).unwrap();
        assert_eq!(tag.read_element::<u8>(2), Some(b'z'));
        assert_eq!(tag.len(), 4);
    }

    #[test]
    fn test_manual_view_rejects_out_of_bounds() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let packet = registry.type_by_name("packet").expect("packet");
        let value = [0u8; 24];
        // tail spans 22..26, past the 24-byte value.
        assert!(registry.get_field_manual(&value, "tail", packet).is_none());
        assert!(registry.get_field_manual(&value[..8], "next", packet).is_none());
        assert!(registry.get_field_manual(&value, "missing", packet).is_none());
    }

    #[test]
    fn test_manual_raw_offsets() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let packet = registry.type_by_name("packet").expect("packet");
        let mut value = [0u8; 24];
        let base = NonNull::new(value.as_mut_ptr()).unwrap();
        let next = unsafe { registry.get_field_manual_raw(base, "next", packet) }.unwrap();
        assert_eq!(next.as_ptr() as usize - base.as_ptr() as usize, 8);
        assert!(unsafe { registry.get_field_manual_raw(base, "nope", packet) }.is_none());
    }
}
