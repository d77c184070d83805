// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parser for the extraction tool's line-oriented text dumps.
//!
//! Each line is `keyword [argument]`:
//!
//! ```text
//! arch 8
//! base
//! name int
//! size 4
//! struct
//! name point
//! alias point_t
//! size 8
//! field
//! name x
//! type int
//! offset 0
//! pdepth 0
//! arrsize 0
//! const false
//! isstruct false
//! enum
//! name color
//! size 4
//! enumerator
//! ek RED
//! ev 0
//! ```
//!
//! Parsing is lenient: unknown keywords are skipped, malformed numbers read
//! as 0, and types or members without a name are dropped.

use super::{Schema, SchemaEnumerator, SchemaField, SchemaKind, SchemaType};

/// File name suffix of extraction dumps.
pub const DUMP_FILE_SUFFIX: &str = ".reflection.dat";

#[derive(Debug)]
enum Member {
    Field(SchemaField),
    Enumerator(SchemaEnumerator),
}

#[derive(Debug, Default)]
struct DumpParser {
    arch: Option<usize>,
    types: Vec<SchemaType>,
    current: Option<SchemaType>,
    member: Option<Member>,
}

fn number<T: std::str::FromStr + Default>(arg: &str) -> T {
    arg.parse().unwrap_or_default()
}

impl DumpParser {
    fn flush_member(&mut self) {
        let Some(member) = self.member.take() else {
            return;
        };
        let Some(current) = self.current.as_mut() else {
            return;
        };
        match member {
            Member::Field(field) if !field.name.is_empty() => current.fields.push(field),
            Member::Enumerator(e) if !e.name.is_empty() => current.enumerators.push(e),
            _ => {}
        }
    }

    fn flush_type(&mut self) {
        self.flush_member();
        if let Some(current) = self.current.take() {
            if !current.name.is_empty() {
                self.types.push(current);
            }
        }
    }

    fn begin_type(&mut self, kind: SchemaKind) {
        self.flush_type();
        self.current = Some(SchemaType::new(String::new(), kind, 0));
    }

    fn line(&mut self, line: &str) {
        let line = line.trim();
        let (keyword, arg) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword {
            "" => {}
            "arch" => {
                if let Ok(arch) = arg.parse() {
                    self.arch = Some(arch);
                }
            }
            "base" => self.begin_type(SchemaKind::Base),
            "struct" => self.begin_type(SchemaKind::Struct),
            "union" => self.begin_type(SchemaKind::Union),
            "enum" => self.begin_type(SchemaKind::Enum),
            "field" => {
                self.flush_member();
                self.member = Some(Member::Field(SchemaField::new("", "", 0)));
            }
            "enumerator" => {
                self.flush_member();
                self.member = Some(Member::Enumerator(SchemaEnumerator {
                    name: String::new(),
                    value: 0,
                }));
            }
            "name" => match (&mut self.member, &mut self.current) {
                (Some(Member::Field(field)), _) => field.name = arg.to_string(),
                (Some(Member::Enumerator(e)), _) => e.name = arg.to_string(),
                (None, Some(current)) => current.name = arg.to_string(),
                (None, None) => {}
            },
            "alias" => {
                if let Some(current) = &mut self.current {
                    current.aliases.push(arg.to_string());
                }
            }
            "size" => {
                if let Some(current) = &mut self.current {
                    current.size = number(arg);
                }
            }
            "ek" => {
                if let Some(Member::Enumerator(e)) = &mut self.member {
                    e.name = arg.to_string();
                }
            }
            "ev" => {
                if let Some(Member::Enumerator(e)) = &mut self.member {
                    e.value = number(arg);
                }
            }
            "type" | "offset" | "pdepth" | "arrsize" | "const" | "isstruct" => {
                if let Some(Member::Field(field)) = &mut self.member {
                    match keyword {
                        "type" => field.type_name = arg.to_string(),
                        "offset" => field.offset = number(arg),
                        "pdepth" => field.ptr_depth = number(arg),
                        "arrsize" => field.arr_size = number(arg),
                        "const" => field.is_const = arg == "true",
                        _ => field.is_record = arg == "true",
                    }
                }
            }
            other => log::trace!("[dump] skipping unknown keyword '{}'", other),
        }
    }

    fn finish(mut self) -> Schema {
        self.flush_type();
        Schema {
            arch: self.arch,
            types: self.types,
        }
    }
}

/// Parse one text dump into a schema (types in file order).
pub fn parse_dump(text: &str) -> Schema {
    let mut parser = DumpParser::default();
    for line in text.lines() {
        parser.line(line);
    }
    parser.finish()
}
