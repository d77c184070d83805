// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Human-readable listing of a blob's registry.

use anyhow::{anyhow, Context};
use creflect::{BlobFormat, Registry, TypeRecord};
use std::fmt::Write as _;

/// Load `bytes` and describe every type, or only `only` when given.
pub fn render(bytes: &[u8], only: Option<&str>) -> anyhow::Result<String> {
    let registry = Registry::try_build_owned(bytes, BlobFormat::Detect).context("Invalid blob")?;
    let mut out = String::new();

    match only {
        Some(name) => {
            let ty = registry
                .type_by_name(name)
                .ok_or_else(|| anyhow!("Type '{}' not found", name))?;
            describe(&registry, ty, &mut out);
        }
        None => {
            let _ = writeln!(out, "{} types", registry.len());
            for ty in registry.types() {
                describe(&registry, ty, &mut out);
            }
        }
    }
    Ok(out)
}

fn describe<'a>(registry: &Registry<'a>, ty: &TypeRecord<'a>, out: &mut String) {
    let _ = writeln!(
        out,
        "{} {} {} (size {})",
        ty.id(),
        ty.variant(),
        ty.name(),
        ty.size()
    );
    for field in registry.field_iter(ty) {
        let type_name = registry
            .type_of_field(field)
            .map_or("?", |t| t.name());
        let stars = "*".repeat(field.ptr_depth as usize);
        let qualifier = if field.is_const { "const " } else { "" };
        let _ = write!(
            out,
            "    +{:<5} {}{}{} {}",
            field.offset, qualifier, type_name, stars, field.name
        );
        if field.is_array() {
            let _ = write!(out, "[{}]", field.arr_size);
        }
        out.push('\n');
    }
    for enumerator in registry.enum_iter(ty) {
        let _ = writeln!(out, "    {} = {}", enumerator.name, enumerator.value_signed());
    }
}
