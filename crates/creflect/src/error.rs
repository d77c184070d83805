// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Load-time errors.

use crate::blob::BlobError;
use std::fmt;

/// Reasons a blob is rejected by the loader.
///
/// A failed load never yields a partially populated registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Framing or low-level decoding failure.
    Blob(BlobError),
    /// Variant byte outside `1..=4`.
    UnknownVariant { offset: usize, byte: u8 },
    /// Declared type count cannot fit in the remaining bytes.
    TypeCountTooLarge { type_count: usize, remaining: usize },
    /// Declared field count cannot fit in the remaining bytes.
    FieldCountTooLarge {
        type_name: String,
        field_count: usize,
        remaining: usize,
    },
    /// A type record's id does not index the registry.
    TypeIdOutOfRange { id: usize, type_count: usize },
    /// A field references a type id that does not index the registry.
    FieldTypeOutOfRange {
        type_name: String,
        field: String,
        id: usize,
        type_count: usize,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Blob(err) => write!(f, "malformed blob: {}", err),
            LoadError::UnknownVariant { offset, byte } => {
                write!(f, "unknown type variant {} at offset {}", byte, offset)
            }
            LoadError::TypeCountTooLarge {
                type_count,
                remaining,
            } => write!(
                f,
                "type count {} exceeds the {} bytes left in the blob",
                type_count, remaining
            ),
            LoadError::FieldCountTooLarge {
                type_name,
                field_count,
                remaining,
            } => write!(
                f,
                "type '{}' declares {} fields but only {} bytes remain",
                type_name, field_count, remaining
            ),
            LoadError::TypeIdOutOfRange { id, type_count } => write!(
                f,
                "type id {} out of range (type count {})",
                id, type_count
            ),
            LoadError::FieldTypeOutOfRange {
                type_name,
                field,
                id,
                type_count,
            } => write!(
                f,
                "field '{}.{}' references type id {} out of range (type count {})",
                type_name, field, id, type_count
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Blob(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlobError> for LoadError {
    fn from(err: BlobError) -> Self {
        LoadError::Blob(err)
    }
}

pub type Result<T> = core::result::Result<T, LoadError>;
