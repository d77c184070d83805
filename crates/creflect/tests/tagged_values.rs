// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Tagged allocation and field access through the public API.

use creflect::blob::{BlobWriter, WriterOptions};
use creflect::schema::{Schema, SchemaField, SchemaType};
use creflect::{free, Registry, TaggedBox};

fn blob() -> Vec<u8> {
    let schema = Schema::new(vec![
        SchemaType::base("int", 4),
        SchemaType::base("double", 8),
        SchemaType::structure("sensor", 24)
            .with_field(SchemaField::new("id", "int", 0))
            .with_field(SchemaField::new("reading", "double", 8))
            .with_field(SchemaField::new("next", "sensor", 16).pointer(1).record()),
    ]);
    BlobWriter::encode(&schema, &WriterOptions::host()).expect("encode")
}

#[test]
fn test_type_of_distinguishes_allocations() {
    let blob = blob();
    let registry = Registry::try_build(&blob).expect("build");
    let int = registry.type_by_name("int").unwrap();
    let sensor = registry.type_by_name("sensor").unwrap();

    let a = registry.alloc(int).expect("int");
    let b = registry.alloc(sensor).expect("sensor");
    unsafe {
        assert_eq!(registry.type_of(a.as_ptr()).map(|t| t.name()), Some("int"));
        assert_eq!(registry.type_of(b.as_ptr()).map(|t| t.name()), Some("sensor"));

        let reading = registry.get_field(b, "reading").expect("reading");
        reading.as_ptr().cast::<f64>().write_unaligned(2.5);
        let bytes = std::slice::from_raw_parts(b.as_ptr(), sensor.size());
        let view = registry.get_field_manual(bytes, "reading", sensor).unwrap();
        assert_eq!(view.read::<f64>(), Some(2.5));

        free(Some(a));
        free(Some(b));
    }
}

#[test]
fn test_linked_values_through_boxes() {
    let blob = blob();
    let registry = Registry::try_build(&blob).expect("build");
    let sensor = registry.type_by_name("sensor").unwrap();

    let tail = TaggedBox::new(&registry, sensor).expect("tail");
    let mut head = registry.new_tagged(sensor).expect("head");
    assert!(head.field_mut("id").unwrap().write(1i32));
    assert!(head
        .field_mut("next")
        .unwrap()
        .write(tail.as_ptr().as_ptr() as usize));

    let next = head.field("next").unwrap();
    assert_eq!(next.len(), std::mem::size_of::<usize>());
    assert_eq!(next.field_type().map(|t| t.name()), Some("sensor"));
    let target = next.read::<usize>().unwrap() as *const u8;
    let ty = unsafe { registry.type_of(target) };
    assert_eq!(ty.map(|t| t.name()), Some("sensor"));
}

#[test]
fn test_stack_values_use_manual_access() {
    let blob = blob();
    let registry = Registry::try_build(&blob).expect("build");
    let sensor = registry.type_by_name("sensor").unwrap();

    let mut stack = [0u8; 24];
    registry
        .get_field_manual_mut(&mut stack, "id", sensor)
        .unwrap()
        .write(77i32);
    assert_eq!(&stack[..4], &77i32.to_ne_bytes());

    // Untagged memory with readable bytes in front of it.
    let frame = [0u8; 64];
    assert!(unsafe { registry.type_of(frame.as_ptr().add(32)) }.is_none());
}

#[test]
fn test_field_pointers_write_through() {
    let schema = Schema::new(vec![
        SchemaType::base("int", 4),
        SchemaType::enumeration("number", 4)
            .with_enumerator("ONE", 1)
            .with_enumerator("TWO", 2)
            .with_enumerator("THREE", 3),
        SchemaType::structure("abe", 12)
            .with_field(SchemaField::new("a", "int", 0))
            .with_field(SchemaField::new("b", "int", 4))
            .with_field(SchemaField::new("e", "number", 8)),
    ]);
    let blob = BlobWriter::encode(&schema, &WriterOptions::host()).expect("encode");
    let registry = Registry::try_build(&blob).expect("build");
    let abe = registry.type_by_name("abe").unwrap();
    let number = registry.type_by_name("number").unwrap();

    let mut pairs: Vec<_> = registry
        .enum_iter(number)
        .map(|e| (e.name.to_string(), e.value))
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("ONE".to_string(), 1),
            ("THREE".to_string(), 3),
            ("TWO".to_string(), 2)
        ]
    );
    assert_eq!(registry.enum_value(number, "TWO"), Some(2));
    assert_eq!(registry.enum_value(number, "missing"), None);

    let obj = registry.alloc(abe).expect("alloc");
    unsafe {
        for (name, offset, value) in [("a", 0usize, 10i32), ("b", 4, 20), ("e", 8, 3)] {
            let field = registry.get_field(obj, name).expect("field");
            assert_eq!(field.as_ptr() as usize - obj.as_ptr() as usize, offset);
            field.as_ptr().cast::<i32>().write_unaligned(value);
        }
        for (name, value) in [("a", 10i32), ("b", 20), ("e", 3)] {
            let field = registry.get_field(obj, name).unwrap();
            assert_eq!(field.as_ptr().cast::<i32>().read_unaligned(), value);
        }
        free(Some(obj));
    }
}
