// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Text dumps on disk -> merged schema -> blob -> registry.

use creflect::blob::{render_asm, BlobWriter, WriterOptions};
use creflect::schema::{parse_dump, SchemaMerger, DUMP_FILE_SUFFIX};
use creflect::{LoadOptions, Registry, TypeVariant};
use std::fs;

const UNIT_A: &str = "\
arch 8
base
name int
size 4
struct
name point
size 8
field
name x
type int
offset 0
pdepth 0
arrsize 0
const false
isstruct false
";

const UNIT_B: &str = "\
arch 8
base
name char
size 1
struct
name point
size 12
field
name x
type int
offset 0
field
name label
type char
offset 4
arrsize 8
const true
field
name owner
type shape
offset 8
pdepth 1
isstruct true
enum
name kind
size 4
enumerator
ek KIND_A
ev 0
enumerator
ek KIND_B
ev 4
";

#[test]
fn test_dumps_merge_into_loadable_blob() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(format!("a{}", DUMP_FILE_SUFFIX)), UNIT_A).unwrap();
    fs::write(dir.path().join(format!("b{}", DUMP_FILE_SUFFIX)), UNIT_B).unwrap();

    let mut merger = SchemaMerger::new();
    for name in ["a", "b"] {
        let path = dir.path().join(format!("{}{}", name, DUMP_FILE_SUFFIX));
        merger.add(parse_dump(&fs::read_to_string(path).unwrap()));
    }
    let schema = merger.finish();
    assert_eq!(schema.arch, Some(8));

    let blob = BlobWriter::encode(&schema, &WriterOptions::host().framed(true)).unwrap();
    let out = dir.path().join("reflection.blob");
    fs::write(&out, &blob).unwrap();

    let bytes = fs::read(&out).unwrap();
    let registry = Registry::try_build(&bytes).expect("load merged blob");

    // Ids follow first appearance; the redefinition of `point` kept id 2.
    let point = registry.type_by_name("point").unwrap();
    assert_eq!(point.id().index(), 2);
    assert_eq!(point.size(), 12);
    assert_eq!(point.variant(), TypeVariant::Struct);

    // `owner` points at an unknown struct and is dropped.
    assert_eq!(point.field_count(), 2);
    assert!(point.field("owner").is_none());

    let label = point.field("label").unwrap();
    assert!(label.is_const);
    assert_eq!(label.arr_size, 8);
    assert_eq!(registry.type_of_field(label).map(|t| t.name()), Some("char"));

    let kind = registry.type_by_name("kind").unwrap();
    assert_eq!(registry.enum_value(kind, "KIND_B"), Some(4));
}

#[test]
fn test_copied_registry_survives_file_removal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("types.blob");
    let schema = parse_dump(UNIT_A);
    fs::write(&path, BlobWriter::encode(&schema, &WriterOptions::host()).unwrap()).unwrap();

    let registry = {
        let bytes = fs::read(&path).unwrap();
        Registry::try_build_with(&bytes, LoadOptions::new().copy_strings(true))
            .expect("load")
            .into_owned()
    };
    drop(dir);
    assert_eq!(registry.type_by_name("int").map(|t| t.size()), Some(4));
}

#[test]
fn test_asm_embeds_every_byte() {
    let blob = BlobWriter::encode(&parse_dump(UNIT_B), &WriterOptions::host()).unwrap();
    let asm = render_asm(&blob);
    let emitted = asm
        .lines()
        .filter_map(|line| line.trim().strip_prefix(".byte "))
        .flat_map(|bytes| bytes.split(", "))
        .map(|byte| u8::from_str_radix(byte.trim_start_matches("0x"), 16).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(emitted, blob);
}
