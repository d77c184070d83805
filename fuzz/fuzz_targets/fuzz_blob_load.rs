// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use creflect::{BlobFormat, LoadOptions, Registry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for format in [BlobFormat::Detect, BlobFormat::Raw, BlobFormat::Framed] {
        for copy_strings in [false, true] {
            let options = LoadOptions::new().copy_strings(copy_strings).format(format);
            let Ok(registry) = Registry::try_build_with(data, options) else {
                continue;
            };

            // Every successfully loaded record must be reachable and walkable.
            for ty in registry.types() {
                let _ = registry.type_by_name(ty.name());
                for field in registry.field_iter(ty) {
                    let _ = registry.type_of_field(field);
                    let _ = ty.field(&field.name);
                }
                for enumerator in registry.enum_iter(ty) {
                    let _ = registry.enum_value(ty, &enumerator.name);
                }
            }
        }
    }
});
