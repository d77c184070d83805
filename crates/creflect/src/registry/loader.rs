// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blob to [`Registry`] construction.

use super::record::{EnumFieldRecord, FieldRecord, TypeId, TypeRecord, TypeVariant};
use super::{LoadOptions, Registry};
use crate::blob::{split_payload, Cursor, HOST_SIZE_WIDTH};
use crate::error::{LoadError, Result};
use crate::table::NameTable;

/// Smallest possible encoded type entry: id, variant, name, size.
const TYPE_ENTRY_MIN: usize = 3 * HOST_SIZE_WIDTH + 1;
/// Encoded struct/union field: name, is_const, ptr_depth, offset, arr_size, type id.
const FIELD_ENTRY_LEN: usize = 4 * HOST_SIZE_WIDTH + 1 + 4;
/// Encoded enumerator: name, value.
const ENUMERATOR_ENTRY_LEN: usize = 2 * HOST_SIZE_WIDTH;

pub(super) fn build(bytes: &[u8], options: LoadOptions) -> Result<Registry<'_>> {
    let payload = split_payload(bytes, options.format)?;
    if payload.is_empty() {
        log::debug!("[loader] empty blob, registry has no types");
        return Ok(Registry::empty());
    }

    let mut cursor = Cursor::new(payload, options.copy_strings);
    let type_count = cursor.read_size()?;
    if !cursor.can_hold(type_count, TYPE_ENTRY_MIN) {
        return Err(LoadError::TypeCountTooLarge {
            type_count,
            remaining: cursor.remaining(),
        });
    }

    // Slots are preallocated so fields may reference ids loaded later.
    let mut types: Vec<Option<TypeRecord<'_>>> = (0..=type_count).map(|_| None).collect();
    let mut names = NameTable::with_capacity(type_count * 2);

    for _ in 0..type_count {
        let record = read_type(&mut cursor, type_count)?;
        let id = record.id().index();
        names.insert(record.name_cow(), id);
        if types[id].is_some() {
            log::debug!("[loader] type id {} redefined by '{}'", id, record.name());
        }
        types[id] = Some(record);
    }

    if !cursor.is_eof() {
        log::debug!(
            "[loader] {} bytes after the type table (string pool)",
            cursor.remaining()
        );
    }

    let registry = Registry::from_parts(types, names);
    log::debug!(
        "[loader] built registry: {} types, id space {}, copy_strings={}",
        registry.len(),
        registry.id_capacity(),
        options.copy_strings
    );
    Ok(registry)
}

fn read_type<'a>(cursor: &mut Cursor<'a>, type_count: usize) -> Result<TypeRecord<'a>> {
    let id = cursor.read_size()?;
    if id > type_count {
        return Err(LoadError::TypeIdOutOfRange { id, type_count });
    }

    let variant_offset = cursor.offset();
    let byte = cursor.read_u8()?;
    let variant = TypeVariant::from_byte(byte).ok_or(LoadError::UnknownVariant {
        offset: variant_offset,
        byte,
    })?;
    let name = cursor.read_string()?;
    let size = cursor.read_size()?;

    match variant {
        TypeVariant::Base => Ok(TypeRecord::base(TypeId(id), name, size)),
        TypeVariant::Struct | TypeVariant::Union => {
            let field_count = read_member_count(cursor, &name, FIELD_ENTRY_LEN)?;
            let mut record = TypeRecord::with_members(TypeId(id), name, size, variant, field_count);
            for _ in 0..field_count {
                let field = read_field(cursor, type_count, record.name())?;
                record.push_field(field);
            }
            Ok(record)
        }
        TypeVariant::Enum => {
            let field_count = read_member_count(cursor, &name, ENUMERATOR_ENTRY_LEN)?;
            let mut record = TypeRecord::with_members(TypeId(id), name, size, variant, field_count);
            for _ in 0..field_count {
                let name = cursor.read_string()?;
                let value = cursor.read_size()?;
                record.push_enumerator(EnumFieldRecord { name, value });
            }
            Ok(record)
        }
    }
}

fn read_member_count(cursor: &mut Cursor<'_>, type_name: &str, entry_len: usize) -> Result<usize> {
    let field_count = cursor.read_size()?;
    if !cursor.can_hold(field_count, entry_len) {
        return Err(LoadError::FieldCountTooLarge {
            type_name: type_name.to_string(),
            field_count,
            remaining: cursor.remaining(),
        });
    }
    Ok(field_count)
}

fn read_field<'a>(
    cursor: &mut Cursor<'a>,
    type_count: usize,
    type_name: &str,
) -> Result<FieldRecord<'a>> {
    let name = cursor.read_string()?;
    let is_const = cursor.read_bool()?;
    let ptr_depth = cursor.read_u32()?;
    let offset = cursor.read_size()?;
    let arr_size = cursor.read_size()?;
    let field_type_id = cursor.read_size()?;

    if field_type_id > type_count {
        return Err(LoadError::FieldTypeOutOfRange {
            type_name: type_name.to_string(),
            field: name.into_owned(),
            id: field_type_id,
            type_count,
        });
    }

    Ok(FieldRecord {
        name,
        type_id: TypeId(field_type_id),
        offset,
        arr_size,
        ptr_depth,
        is_const,
    })
}
