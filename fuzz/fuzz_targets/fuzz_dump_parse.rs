// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use creflect::blob::{BlobWriter, WriterOptions};
use creflect::schema::parse_dump;
use creflect::Registry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let schema = parse_dump(text);

    // Whatever the parser accepts must encode to a blob the loader accepts,
    // unless a value overflows the target width or a name holds a NUL.
    if let Ok(blob) = BlobWriter::encode(&schema, &WriterOptions::host()) {
        let registry = Registry::try_build(&blob).expect("writer output must load");
        assert_eq!(registry.id_capacity(), schema.len() + 1);
    }
});
