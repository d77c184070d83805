// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # creflect - runtime type reflection for C data layouts
//!
//! Loads a compact binary metadata blob describing a program's types (base
//! types, structs, unions, enums) and answers layout questions at runtime:
//! type by name or id, field offsets and types, enumerator values. Values
//! allocated through a [`Registry`] carry a hidden header so their type can
//! be recovered from a bare pointer.
//!
//! ## Quick Start
//!
//! ```rust
//! use creflect::blob::{BlobWriter, WriterOptions};
//! use creflect::schema::{Schema, SchemaField, SchemaType};
//! use creflect::Registry;
//!
//! let schema = Schema::new(vec![
//!     SchemaType::base("int", 4),
//!     SchemaType::enumeration("mode", 4).with_enumerator("FAST", 2),
//!     SchemaType::structure("config", 8)
//!         .with_field(SchemaField::new("retries", "int", 0))
//!         .with_field(SchemaField::new("mode", "mode", 4)),
//! ]);
//! let blob = BlobWriter::encode(&schema, &WriterOptions::host()).unwrap();
//! let registry = Registry::try_build(&blob).unwrap();
//!
//! let config = registry.type_by_name("config").unwrap();
//! let mut value = registry.new_tagged(config).unwrap();
//! value.field_mut("retries").unwrap().write(3i32);
//!
//! let mode = registry.type_by_name("mode").unwrap();
//! assert_eq!(registry.enum_value(mode, "FAST"), Some(2));
//! assert_eq!(value.field("retries").unwrap().read::<i32>(), Some(3));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! blob bytes -> blob::Cursor -> registry loader -> Registry
//!                                                  |-- lookups (types, fields, enums)
//!                                                  |-- value views (byte ranges)
//!                                                  +-- alloc (tagged allocations)
//! text dumps -> schema::parse_dump -> SchemaMerger -> blob::BlobWriter -> blob bytes
//! ```
//!
//! ## Modules Overview
//!
//! - [`registry`] - blob loading and type lookups (start here)
//! - [`alloc`] - tagged allocation and `type_of`
//! - [`value`] - typed field views
//! - [`global`] - process-wide load-once registry
//! - [`schema`] - producer-side model, text dumps and merging
//! - [`blob`] - binary format, framing and the writer

pub mod alloc;
pub mod blob;
pub mod error;
pub mod global;
pub mod registry;
pub mod schema;
pub mod table;
pub mod value;

pub use alloc::{free, free_in, FnAllocator, RawAllocator, SystemAllocator, TaggedBox};
pub use blob::{BlobError, BlobFormat, Endianness};
pub use error::{LoadError, Result};
pub use registry::{
    EnumFieldRecord, FieldRecord, Fields, LoadOptions, Registry, TypeId, TypeRecord, TypeVariant,
};
pub use value::{FieldView, FieldViewMut, NativeScalar};

/// Crate version, as recorded by Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
