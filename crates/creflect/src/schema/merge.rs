// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Combine per-translation-unit schemas into one.

use super::{Schema, SchemaType};
use std::collections::HashMap;

/// Accumulates schemas; a later definition of a name replaces the earlier
/// one but keeps its position (and therefore its id).
#[derive(Debug, Default)]
pub struct SchemaMerger {
    arch: Option<usize>,
    types: Vec<SchemaType>,
    positions: HashMap<String, usize>,
}

impl SchemaMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one schema in.
    pub fn add(&mut self, schema: Schema) {
        if let Some(arch) = schema.arch {
            if self.arch.is_some_and(|current| current != arch) {
                log::warn!(
                    "[merge] pointer width changes from {:?} to {} bytes",
                    self.arch,
                    arch
                );
            }
            self.arch = Some(arch);
        }
        for ty in schema.types {
            self.add_type(ty);
        }
    }

    pub fn add_type(&mut self, ty: SchemaType) {
        match self.positions.get(&ty.name) {
            Some(&index) => {
                log::debug!("[merge] '{}' redefined, keeping id {}", ty.name, index + 1);
                self.types[index] = ty;
            }
            None => {
                self.positions.insert(ty.name.clone(), self.types.len());
                self.types.push(ty);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn finish(self) -> Schema {
        Schema {
            arch: self.arch,
            types: self.types,
        }
    }
}
