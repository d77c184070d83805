// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry built from a metadata blob.
//!
//! A [`Registry`] is built once with [`Registry::try_build`] and is
//! read-only afterwards, so it can be shared across threads without locking.
//!
//! # Example
//!
//! ```rust
//! use creflect::schema::{Schema, SchemaField, SchemaType};
//! use creflect::blob::{BlobWriter, WriterOptions};
//! use creflect::Registry;
//!
//! let schema = Schema::new(vec![
//!     SchemaType::base("int", 4),
//!     SchemaType::structure("point", 8)
//!         .with_field(SchemaField::new("x", "int", 0))
//!         .with_field(SchemaField::new("y", "int", 4)),
//! ]);
//! let blob = BlobWriter::encode(&schema, &WriterOptions::host()).unwrap();
//!
//! let registry = Registry::try_build(&blob).unwrap();
//! let point = registry.type_by_name("point").unwrap();
//! assert_eq!(registry.field_by_name(point, "y").unwrap().offset, 4);
//! ```

mod loader;
mod record;

pub use record::{EnumFieldRecord, FieldRecord, Fields, TypeId, TypeRecord, TypeVariant};

use crate::blob::BlobFormat;
use crate::error::Result;
use crate::table::NameTable;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the per-registry tag written into allocation headers.
static NEXT_REGISTRY_TAG: AtomicU64 = AtomicU64::new(1);

fn next_tag() -> u64 {
    NEXT_REGISTRY_TAG.fetch_add(1, Ordering::Relaxed)
}

/// How a blob is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Copy every string out of the blob instead of borrowing it.
    pub copy_strings: bool,
    /// Accepted framing.
    pub format: BlobFormat,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_strings(mut self, copy: bool) -> Self {
        self.copy_strings = copy;
        self
    }

    pub fn format(mut self, format: BlobFormat) -> Self {
        self.format = format;
        self
    }
}

/// Id-indexed type records plus the type name index.
#[derive(Debug)]
pub struct Registry<'a> {
    types: Vec<Option<TypeRecord<'a>>>,
    names: NameTable<'a>,
    tag: u64,
}

impl<'a> Registry<'a> {
    /// Registry with no types (what an empty blob loads to).
    pub fn empty() -> Self {
        Self::from_parts(vec![None], NameTable::with_capacity(0))
    }

    pub(crate) fn from_parts(types: Vec<Option<TypeRecord<'a>>>, names: NameTable<'a>) -> Self {
        Self {
            types,
            names,
            tag: next_tag(),
        }
    }

    /// Build a registry whose names borrow from `bytes`.
    pub fn try_build(bytes: &'a [u8]) -> Result<Self> {
        Self::try_build_with(bytes, LoadOptions::default())
    }

    /// Build a registry with explicit [`LoadOptions`].
    pub fn try_build_with(bytes: &'a [u8], options: LoadOptions) -> Result<Self> {
        loader::build(bytes, options).map_err(|err| {
            log::warn!("[loader] rejected blob of {} bytes: {}", bytes.len(), err);
            err
        })
    }

    /// Build a registry that owns all of its names.
    pub fn try_build_owned(bytes: &[u8], format: BlobFormat) -> Result<Registry<'static>> {
        let options = LoadOptions::new().copy_strings(true).format(format);
        Ok(Registry::try_build_with(bytes, options)?.into_owned())
    }

    /// Detach from the source blob.
    pub fn into_owned(self) -> Registry<'static> {
        Registry {
            types: self
                .types
                .into_iter()
                .map(|slot| slot.map(TypeRecord::into_owned))
                .collect(),
            names: self.names.into_owned(),
            tag: self.tag,
        }
    }

    pub(crate) fn tag(&self) -> u64 {
        self.tag
    }

    /// Whether `ty` is a record of this registry (not merely an equal one).
    pub(crate) fn owns(&self, ty: &TypeRecord<'a>) -> bool {
        self.type_by_id(ty.id())
            .is_some_and(|own| std::ptr::eq(own, ty))
    }

    /// Number of populated type slots.
    pub fn len(&self) -> usize {
        self.types.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.types.iter().all(Option::is_none)
    }

    /// Size of the id space (`type_count + 1`).
    pub fn id_capacity(&self) -> usize {
        self.types.len()
    }

    /// Every populated record in id order.
    pub fn types(&self) -> impl Iterator<Item = &TypeRecord<'a>> + '_ {
        self.types.iter().flatten()
    }

    pub fn type_by_id(&self, id: TypeId) -> Option<&TypeRecord<'a>> {
        self.types.get(id.index())?.as_ref()
    }

    /// Type by its declared name.
    pub fn type_by_name(&self, name: &str) -> Option<&TypeRecord<'a>> {
        let id = self.names.get(name)?;
        self.type_by_id(TypeId(id))
    }

    /// Field of `ty` by name.
    pub fn field_by_name<'r>(
        &'r self,
        ty: &'r TypeRecord<'a>,
        name: &str,
    ) -> Option<&'r FieldRecord<'a>> {
        ty.field(name)
    }

    /// Same lookup as [`Self::field_by_name`].
    pub fn field_type<'r>(
        &'r self,
        ty: &'r TypeRecord<'a>,
        name: &str,
    ) -> Option<&'r FieldRecord<'a>> {
        self.field_by_name(ty, name)
    }

    /// The type a field is declared with, if the producer resolved it.
    pub fn type_of_field(&self, field: &FieldRecord<'_>) -> Option<&TypeRecord<'a>> {
        self.type_by_id(field.type_id)
    }

    /// Fields of `ty` in registration order.
    pub fn field_iter<'r>(
        &'r self,
        ty: &'r TypeRecord<'a>,
    ) -> std::slice::Iter<'r, FieldRecord<'a>> {
        ty.fields().iter()
    }

    /// Value of an enumerator; `None` unless `ty` is an enum naming it.
    pub fn enum_value(&self, ty: &TypeRecord<'a>, name: &str) -> Option<usize> {
        if !ty.is_enum() {
            return None;
        }
        ty.enumerator(name).map(|e| e.value)
    }

    /// Enumerators of `ty` in registration order.
    pub fn enum_iter<'r>(
        &'r self,
        ty: &'r TypeRecord<'a>,
    ) -> std::slice::Iter<'r, EnumFieldRecord<'a>> {
        ty.enumerators().iter()
    }
}
