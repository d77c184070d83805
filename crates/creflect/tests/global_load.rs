// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Process-wide registry: the global is per test binary, so everything runs in
// one test to keep the load order deterministic.

use creflect::blob::{BlobWriter, WriterOptions};
use creflect::global;
use creflect::schema::{Schema, SchemaType};
use creflect::BlobFormat;

fn leaked_blob(types: Vec<SchemaType>) -> &'static [u8] {
    let blob = BlobWriter::encode(&Schema::new(types), &WriterOptions::host()).expect("encode");
    Box::leak(blob.into_boxed_slice())
}

#[test]
fn test_global_load_is_idempotent() {
    assert!(global::registry().is_none());
    assert!(!global::is_loaded());

    // A rejected blob leaves the global empty.
    let mut garbage = vec![0xFFu8; 16];
    garbage.extend_from_slice(&[0u8; 3]);
    assert!(global::load_owned(&garbage, BlobFormat::Raw).is_err());
    assert!(global::registry().is_none());

    let first = leaked_blob(vec![SchemaType::base("int", 4)]);
    let loaded = global::load(first, false).expect("first load");
    assert!(loaded.type_by_name("int").is_some());

    let second = leaked_blob(vec![SchemaType::base("long", 8)]);
    let again = global::load(second, true).expect("second load");
    assert!(std::ptr::eq(loaded, again));
    assert!(again.type_by_name("long").is_none());

    let owned = global::load_owned(second, BlobFormat::Detect).expect("owned load");
    assert!(std::ptr::eq(loaded, owned));

    let linked = global::load_linked().expect("linked load");
    assert!(std::ptr::eq(loaded, linked));
    assert!(std::ptr::eq(global::registry().unwrap(), loaded));

    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| global::registry().map(|r| r as *const _ as usize)))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(loaded as *const _ as usize));
    }
}
