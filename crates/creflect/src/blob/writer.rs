// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blob producer: encodes a [`Schema`] into the loader's binary format.
//!
//! Output order is `[header] type table, string pool`. String offsets point
//! into the pool and are relative to the payload start (after the header),
//! so the same payload loads with or without framing.

use super::{BlobError, BlobHeader, BlobResult, Endianness, HEADER_VERSION, HOST_SIZE_WIDTH};
use crate::schema::{Schema, SchemaKind, SchemaType};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Target description for an encoded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Width of `size` fields in bytes (4 or 8).
    pub pointer_width: usize,
    pub endianness: Endianness,
    /// Prefix the payload with a [`BlobHeader`].
    pub framed: bool,
}

impl WriterOptions {
    /// Raw blob for the running host.
    pub fn host() -> Self {
        Self {
            pointer_width: HOST_SIZE_WIDTH,
            endianness: Endianness::host(),
            framed: false,
        }
    }

    pub fn pointer_width(mut self, width: usize) -> Self {
        self.pointer_width = width;
        self
    }

    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn framed(mut self, framed: bool) -> Self {
        self.framed = framed;
        self
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::host()
    }
}

/// Growable little/big-endian writer with a fixed `size` width.
#[derive(Debug)]
pub struct BlobWriter {
    buffer: Vec<u8>,
    width: usize,
    endianness: Endianness,
}

/// Deduplicated NUL-terminated string pool.
#[derive(Debug, Default)]
struct StringPool {
    bytes: Vec<u8>,
    offsets: HashMap<String, usize>,
}

impl StringPool {
    fn intern(&mut self, text: &str) -> BlobResult<usize> {
        if let Some(offset) = self.offsets.get(text) {
            return Ok(*offset);
        }
        if text.contains('\0') {
            return Err(BlobError::InteriorNul {
                text: text.to_string(),
            });
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(text.to_string(), offset);
        Ok(offset)
    }
}

impl BlobWriter {
    pub fn new(options: &WriterOptions) -> BlobResult<Self> {
        if options.pointer_width != 4 && options.pointer_width != 8 {
            return Err(BlobError::BadHeader {
                reason: format!("unsupported pointer width {}", options.pointer_width),
            });
        }
        Ok(Self {
            buffer: Vec::new(),
            width: options.pointer_width,
            endianness: options.endianness,
        })
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn write_u32(&mut self, value: u32) {
        let bytes = match self.endianness {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        self.buffer.extend_from_slice(&bytes);
    }

    /// Write a `size` field at the configured width.
    pub fn write_size(&mut self, value: u64) -> BlobResult<()> {
        if self.width == 4 {
            let narrow = u32::try_from(value).map_err(|_| BlobError::ValueOverflow {
                value,
                width: self.width,
            })?;
            self.write_u32(narrow);
        } else {
            let bytes = match self.endianness {
                Endianness::Little => value.to_le_bytes(),
                Endianness::Big => value.to_be_bytes(),
            };
            self.buffer.extend_from_slice(&bytes);
        }
        Ok(())
    }

    /// Write a signed value sign-extended to the `size` width.
    pub fn write_signed_size(&mut self, value: i64) -> BlobResult<()> {
        if self.width == 4 {
            let narrow = match i32::try_from(value) {
                Ok(signed) => signed as u32,
                Err(_) => u32::try_from(value).map_err(|_| BlobError::ValueOverflow {
                    value: value as u64,
                    width: self.width,
                })?,
            };
            self.write_u32(narrow);
            Ok(())
        } else {
            self.write_size(value as u64)
        }
    }

    fn write_usize(&mut self, value: usize) -> BlobResult<()> {
        self.write_size(value as u64)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Encode `schema` for the target described by `options`.
    pub fn encode(schema: &Schema, options: &WriterOptions) -> BlobResult<Vec<u8>> {
        let ids = schema.ids();
        let width = options.pointer_width;
        let plans: Vec<TypePlan<'_>> = schema
            .types
            .iter()
            .map(|ty| TypePlan::new(ty, &ids))
            .collect();
        let table_len = width + plans.iter().map(|plan| plan.encoded_len(width)).sum::<usize>();

        let mut pool = StringPool::default();
        let mut writer = BlobWriter::new(options)?;
        writer.write_usize(schema.types.len())?;

        for (index, plan) in plans.iter().enumerate() {
            let ty = plan.ty;
            writer.write_usize(index + 1)?;
            writer.write_u8(ty.kind.variant().as_byte());
            writer.write_usize(table_len + pool.intern(&ty.name)?)?;
            writer.write_usize(ty.size)?;

            match ty.kind {
                SchemaKind::Base => {}
                SchemaKind::Struct | SchemaKind::Union => {
                    writer.write_usize(plan.fields.len())?;
                    for (field, type_id) in &plan.fields {
                        writer.write_usize(table_len + pool.intern(&field.name)?)?;
                        writer.write_bool(field.is_const);
                        writer.write_u32(field.ptr_depth);
                        writer.write_usize(field.offset)?;
                        writer.write_usize(field.arr_size)?;
                        writer.write_usize(*type_id)?;
                    }
                }
                SchemaKind::Enum => {
                    writer.write_usize(ty.enumerators.len())?;
                    for enumerator in &ty.enumerators {
                        writer.write_usize(table_len + pool.intern(&enumerator.name)?)?;
                        writer.write_signed_size(enumerator.value)?;
                    }
                }
            }
        }
        debug_assert_eq!(writer.offset(), table_len);
        writer.write_bytes(&pool.bytes);

        log::debug!(
            "[writer] encoded {} types: table {} bytes, strings {} bytes",
            schema.types.len(),
            table_len,
            pool.bytes.len()
        );

        if !options.framed {
            return Ok(writer.into_bytes());
        }
        let header = BlobHeader {
            version: HEADER_VERSION,
            pointer_width: width as u8,
            endianness: options.endianness,
        };
        let mut framed = header.to_bytes().to_vec();
        framed.extend_from_slice(&writer.into_bytes());
        Ok(framed)
    }
}

/// A schema type with its encodable fields resolved to ids.
struct TypePlan<'s> {
    ty: &'s SchemaType,
    fields: Vec<(&'s crate::schema::SchemaField, usize)>,
}

impl<'s> TypePlan<'s> {
    fn new(ty: &'s SchemaType, ids: &HashMap<&str, usize>) -> Self {
        let fields = match ty.kind {
            SchemaKind::Struct | SchemaKind::Union => ty
                .fields
                .iter()
                .filter_map(|field| match ids.get(field.type_name.as_str()) {
                    Some(id) => Some((field, *id)),
                    // Record-typed fields need their record; others degrade
                    // to the unresolved id.
                    None if field.is_record => {
                        log::debug!(
                            "[writer] dropping {}.{}: record type '{}' unknown",
                            ty.name,
                            field.name,
                            field.type_name
                        );
                        None
                    }
                    None => Some((field, 0)),
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { ty, fields }
    }

    fn encoded_len(&self, width: usize) -> usize {
        let head = 3 * width + 1;
        match self.ty.kind {
            SchemaKind::Base => head,
            SchemaKind::Struct | SchemaKind::Union => {
                head + width + self.fields.len() * (4 * width + 1 + 4)
            }
            SchemaKind::Enum => head + width + self.ty.enumerators.len() * 2 * width,
        }
    }
}

/// Assembler source embedding `bytes` in a read-only section between the
/// `_reflection_dat_start` and `_reflection_dat_end` symbols.
pub fn render_asm(bytes: &[u8]) -> String {
    let mut out = String::new();
    out.push_str("#ifdef __APPLE__\n    .section __TEXT,__const\n");
    out.push_str("#elif defined(_WIN32)\n    .section .rdata\n");
    out.push_str("#else\n    .section .rodata\n#endif\n\n");
    out.push_str("    .global _reflection_dat_start\n");
    out.push_str("    .global _reflection_dat_end\n");
    out.push_str("_reflection_dat_start:\n");

    for chunk in bytes.chunks(12) {
        out.push_str("\n    .byte ");
        let line: Vec<String> = chunk.iter().map(|b| format!("0x{:02x}", b)).collect();
        out.push_str(&line.join(", "));
    }

    out.push_str("\n_reflection_dat_end:\n");
    out.push_str("\n#ifdef __GNUC__\n#ifndef __APPLE__\n");
    let _ = writeln!(out, "    .section .note.GNU-stack,\"\",@progbits");
    out.push_str("#endif\n#endif\n");
    out
}
