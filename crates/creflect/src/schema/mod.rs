// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Producer-side type model.
//!
//! A [`Schema`] is what the extraction step knows about a program's types:
//! names, sizes, field layouts and enumerators, with field types referenced
//! by name. [`crate::blob::BlobWriter`] turns it into a metadata blob; ids
//! are positional (`index + 1`), id 0 stays reserved for unresolved types.
//!
//! Schemas are usually obtained from the extraction tool's text dumps via
//! [`parse_dump`] and combined with [`SchemaMerger`].

mod dump;
mod merge;

pub use dump::{parse_dump, DUMP_FILE_SUFFIX};
pub use merge::SchemaMerger;

use crate::registry::TypeVariant;
use std::collections::HashMap;

/// Kind of a schema type; mirrors [`TypeVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SchemaKind {
    Base,
    Struct,
    Union,
    Enum,
}

impl SchemaKind {
    pub fn variant(self) -> TypeVariant {
        match self {
            SchemaKind::Base => TypeVariant::Base,
            SchemaKind::Struct => TypeVariant::Struct,
            SchemaKind::Union => TypeVariant::Union,
            SchemaKind::Enum => TypeVariant::Enum,
        }
    }
}

/// Struct or union member as reported by the extraction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaField {
    pub name: String,
    /// Name of the field's (element/pointee) type.
    pub type_name: String,
    pub offset: usize,
    pub ptr_depth: u32,
    pub arr_size: usize,
    pub is_const: bool,
    /// The field's type is a struct or union; such fields are dropped when
    /// the record type is not part of the schema.
    pub is_record: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
            ptr_depth: 0,
            arr_size: 0,
            is_const: false,
            is_record: false,
        }
    }

    /// Array of `len` elements in total.
    pub fn array(mut self, len: usize) -> Self {
        self.arr_size = len;
        self
    }

    pub fn pointer(mut self, depth: u32) -> Self {
        self.ptr_depth = depth;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn record(mut self) -> Self {
        self.is_record = true;
        self
    }
}

/// Enumerator with its signed value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaEnumerator {
    pub name: String,
    pub value: i64,
}

/// One type known to the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaType {
    pub name: String,
    pub kind: SchemaKind,
    pub size: usize,
    /// Typedef names of this type. Kept for tooling; the blob has no slot
    /// for them.
    pub aliases: Vec<String>,
    pub fields: Vec<SchemaField>,
    pub enumerators: Vec<SchemaEnumerator>,
}

impl SchemaType {
    pub fn new(name: impl Into<String>, kind: SchemaKind, size: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            aliases: Vec::new(),
            fields: Vec::new(),
            enumerators: Vec::new(),
        }
    }

    pub fn base(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, SchemaKind::Base, size)
    }

    pub fn structure(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, SchemaKind::Struct, size)
    }

    pub fn union(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, SchemaKind::Union, size)
    }

    pub fn enumeration(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, SchemaKind::Enum, size)
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_enumerator(mut self, name: impl Into<String>, value: i64) -> Self {
        self.enumerators.push(SchemaEnumerator {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Ordered set of types; a type's id is its position plus one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    /// Pointer width (bytes) the types were extracted for, when known.
    pub arch: Option<usize>,
    pub types: Vec<SchemaType>,
}

impl Schema {
    pub fn new(types: Vec<SchemaType>) -> Self {
        Self { arch: None, types }
    }

    pub fn with_arch(mut self, arch: usize) -> Self {
        self.arch = Some(arch);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Name to id map. Later duplicates of a name win.
    pub fn ids(&self) -> HashMap<&str, usize> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (ty.name.as_str(), index + 1))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().rev().find(|ty| ty.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_compose() {
        let ty = SchemaType::structure("node", 16)
            .with_field(SchemaField::new("value", "int", 0).constant())
            .with_field(SchemaField::new("next", "node", 8).pointer(1).record())
            .with_alias("node_t");
        assert_eq!(ty.fields.len(), 2);
        assert!(ty.fields[0].is_const);
        assert_eq!(ty.fields[1].ptr_depth, 1);
        assert!(ty.fields[1].is_record);
        assert_eq!(ty.aliases, vec!["node_t".to_string()]);
    }

    #[test]
    fn test_ids_are_positional() {
        let schema = Schema::new(vec![
            SchemaType::base("int", 4),
            SchemaType::enumeration("color", 4).with_enumerator("RED", 0),
        ]);
        let ids = schema.ids();
        assert_eq!(ids["int"], 1);
        assert_eq!(ids["color"], 2);
        assert_eq!(schema.get("color").map(|t| t.kind), Some(SchemaKind::Enum));
        assert_eq!(SchemaKind::Union.variant(), TypeVariant::Union);
    }
}
