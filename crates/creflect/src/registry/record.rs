// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type, field and enumerator records held by the registry.

use crate::table::NameTable;
use std::borrow::Cow;
use std::fmt;

/// Dense type id; indexes the registry directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl TypeId {
    /// Id referenced by fields whose type was unknown to the producer.
    pub const UNRESOLVED: TypeId = TypeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of type described by a [`TypeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeVariant {
    Base = 1,
    Struct = 2,
    Union = 3,
    Enum = 4,
}

impl TypeVariant {
    /// Decode the blob's variant byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Base),
            2 => Some(Self::Struct),
            3 => Some(Self::Union),
            4 => Some(Self::Enum),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Struct or union: has addressable fields.
    pub fn has_fields(self) -> bool {
        matches!(self, Self::Struct | Self::Union)
    }
}

impl fmt::Display for TypeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Base => "base",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Struct or union member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord<'a> {
    /// Field name; `.` separates the path of a flattened nested member.
    pub name: Cow<'a, str>,
    /// Declared type of the field (or of its elements/pointee).
    pub type_id: TypeId,
    /// Byte offset from the start of the containing value.
    pub offset: usize,
    /// Total element count for arrays, 0 for scalars.
    pub arr_size: usize,
    /// Pointer indirections (0 = value, 1 = `T*`, ...).
    pub ptr_depth: u32,
    pub is_const: bool,
}

impl FieldRecord<'_> {
    pub fn is_array(&self) -> bool {
        self.arr_size != 0
    }

    pub fn is_pointer(&self) -> bool {
        self.ptr_depth != 0
    }

    /// Whether the field belongs to a flattened nested object.
    pub fn is_nested(&self) -> bool {
        self.name.contains('.')
    }
}

/// Enumerator of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFieldRecord<'a> {
    pub name: Cow<'a, str>,
    /// Value as stored in the blob (sign-extended by the producer).
    pub value: usize,
}

impl EnumFieldRecord<'_> {
    /// The value reinterpreted as signed.
    pub fn value_signed(&self) -> isize {
        self.value as isize
    }
}

/// Member storage, keyed by the owning type's variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields<'a> {
    None,
    Struct(Vec<FieldRecord<'a>>),
    Enum(Vec<EnumFieldRecord<'a>>),
}

/// One base type, struct, union or enum.
#[derive(Debug, Clone)]
pub struct TypeRecord<'a> {
    id: TypeId,
    name: Cow<'a, str>,
    size: usize,
    variant: TypeVariant,
    fields: Fields<'a>,
    field_index: Option<NameTable<'a>>,
    capacity: usize,
}

impl<'a> TypeRecord<'a> {
    pub(crate) fn base(id: TypeId, name: Cow<'a, str>, size: usize) -> Self {
        Self {
            id,
            name,
            size,
            variant: TypeVariant::Base,
            fields: Fields::None,
            field_index: None,
            capacity: 0,
        }
    }

    /// Struct, union or enum with room for exactly `capacity` members.
    pub(crate) fn with_members(
        id: TypeId,
        name: Cow<'a, str>,
        size: usize,
        variant: TypeVariant,
        capacity: usize,
    ) -> Self {
        let fields = match variant {
            TypeVariant::Base => Fields::None,
            TypeVariant::Struct | TypeVariant::Union => {
                Fields::Struct(Vec::with_capacity(capacity))
            }
            TypeVariant::Enum => Fields::Enum(Vec::with_capacity(capacity)),
        };
        let field_index = (variant != TypeVariant::Base)
            .then(|| NameTable::with_capacity(capacity.saturating_mul(2)));
        Self {
            id,
            name,
            size,
            variant,
            fields,
            field_index,
            capacity: if variant == TypeVariant::Base { 0 } else { capacity },
        }
    }

    /// Append a struct/union field. Returns `false` once capacity is reached
    /// or when the record does not hold struct fields.
    pub(crate) fn push_field(&mut self, field: FieldRecord<'a>) -> bool {
        let Fields::Struct(fields) = &mut self.fields else {
            return false;
        };
        if fields.len() >= self.capacity {
            return false;
        }
        if let Some(index) = &mut self.field_index {
            index.insert(field.name.clone(), fields.len());
        }
        fields.push(field);
        true
    }

    /// Append an enumerator; same contract as [`Self::push_field`].
    pub(crate) fn push_enumerator(&mut self, enumerator: EnumFieldRecord<'a>) -> bool {
        let Fields::Enum(enumerators) = &mut self.fields else {
            return false;
        };
        if enumerators.len() >= self.capacity {
            return false;
        }
        if let Some(index) = &mut self.field_index {
            index.insert(enumerator.name.clone(), enumerators.len());
        }
        enumerators.push(enumerator);
        true
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_cow(&self) -> Cow<'a, str> {
        self.name.clone()
    }

    /// Size in bytes of one value; 0 for incomplete types.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn variant(&self) -> TypeVariant {
        self.variant
    }

    pub fn is_enum(&self) -> bool {
        self.variant == TypeVariant::Enum
    }

    /// Number of registered fields or enumerators.
    pub fn field_count(&self) -> usize {
        match &self.fields {
            Fields::None => 0,
            Fields::Struct(fields) => fields.len(),
            Fields::Enum(enumerators) => enumerators.len(),
        }
    }

    /// Member count declared by the blob.
    pub fn field_capacity(&self) -> usize {
        self.capacity
    }

    pub fn members(&self) -> &Fields<'a> {
        &self.fields
    }

    /// Struct/union fields in registration order; empty for other variants.
    pub fn fields(&self) -> &[FieldRecord<'a>] {
        match &self.fields {
            Fields::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Enumerators in registration order; empty unless this is an enum.
    pub fn enumerators(&self) -> &[EnumFieldRecord<'a>] {
        match &self.fields {
            Fields::Enum(enumerators) => enumerators,
            _ => &[],
        }
    }

    fn member_index(&self, name: &str) -> Option<usize> {
        self.field_index.as_ref()?.get(name)
    }

    /// Field by name (struct/union only).
    pub fn field(&self, name: &str) -> Option<&FieldRecord<'a>> {
        let index = self.member_index(name)?;
        self.fields().get(index)
    }

    /// Enumerator by name (enum only).
    pub fn enumerator(&self, name: &str) -> Option<&EnumFieldRecord<'a>> {
        let index = self.member_index(name)?;
        self.enumerators().get(index)
    }

    /// Detach all borrowed names from the source blob.
    pub fn into_owned(self) -> TypeRecord<'static> {
        let fields = match self.fields {
            Fields::None => Fields::None,
            Fields::Struct(fields) => Fields::Struct(
                fields
                    .into_iter()
                    .map(|f| FieldRecord {
                        name: Cow::Owned(f.name.into_owned()),
                        type_id: f.type_id,
                        offset: f.offset,
                        arr_size: f.arr_size,
                        ptr_depth: f.ptr_depth,
                        is_const: f.is_const,
                    })
                    .collect(),
            ),
            Fields::Enum(enumerators) => Fields::Enum(
                enumerators
                    .into_iter()
                    .map(|e| EnumFieldRecord {
                        name: Cow::Owned(e.name.into_owned()),
                        value: e.value,
                    })
                    .collect(),
            ),
        };
        TypeRecord {
            id: self.id,
            name: Cow::Owned(self.name.into_owned()),
            size: self.size,
            variant: self.variant,
            fields,
            field_index: self.field_index.map(NameTable::into_owned),
            capacity: self.capacity,
        }
    }
}
