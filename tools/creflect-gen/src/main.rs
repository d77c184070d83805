// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! creflect-gen - build and inspect creflect metadata blobs
//!
//! `merge` collects the extraction tool's `*.reflection.dat` text dumps under
//! a directory, merges them and writes the binary blob (plus optional
//! assembler embedding and JSON model). `inspect` prints what a blob holds.

mod collect;
mod inspect;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use creflect::blob::{render_asm, BlobWriter, WriterOptions};
use creflect::schema::{parse_dump, SchemaMerger};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "creflect-gen")]
#[command(about = "Merge reflection dumps into metadata blobs and inspect them")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge text dumps into one blob
    Merge {
        /// Directory searched recursively for dumps
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output blob file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write a raw blob (no architecture header)
        #[arg(long)]
        raw: bool,

        /// Target pointer width in bytes (default: dumps' arch, else host)
        #[arg(long, value_name = "4|8")]
        arch: Option<usize>,

        /// Also write an assembler file embedding the blob
        #[arg(long, value_name = "FILE")]
        asm: Option<PathBuf>,

        /// Also write the merged schema as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Print the types held by a blob
    Inspect {
        /// Blob file (framed or raw)
        #[arg(value_name = "BLOB")]
        input: PathBuf,

        /// Only show this type
        #[arg(short = 't', long = "type", value_name = "NAME")]
        type_name: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Merge {
            input,
            output,
            raw,
            arch,
            asm,
            json,
        } => {
            let options = MergeOptions {
                framed: !raw,
                arch,
                asm,
                json,
            };
            cmd_merge(&input, &output, &options)?;
        }
        Commands::Inspect { input, type_name } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("Failed to read blob {}", input.display()))?;
            let report = inspect::render(&bytes, type_name.as_deref())?;
            print!("{}", report);
        }
    }

    Ok(())
}

struct MergeOptions {
    framed: bool,
    arch: Option<usize>,
    asm: Option<PathBuf>,
    json: Option<PathBuf>,
}

fn cmd_merge(input: &Path, output: &Path, options: &MergeOptions) -> anyhow::Result<()> {
    let dumps = collect::find_dumps(input)
        .with_context(|| format!("Failed to scan {}", input.display()))?;
    if dumps.is_empty() {
        bail!("No *{} files under {}", creflect::schema::DUMP_FILE_SUFFIX, input.display());
    }

    let mut merger = SchemaMerger::new();
    for path in &dumps {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dump {}", path.display()))?;
        let schema = parse_dump(&text);
        log::debug!("[merge] {}: {} types", path.display(), schema.len());
        merger.add(schema);
    }
    let schema = merger.finish();

    let pointer_width = options
        .arch
        .or(schema.arch)
        .unwrap_or(creflect::blob::HOST_SIZE_WIDTH);
    if pointer_width != 4 && pointer_width != 8 {
        bail!("Unsupported pointer width {} (expected 4 or 8)", pointer_width);
    }
    let writer_options = WriterOptions::host()
        .pointer_width(pointer_width)
        .framed(options.framed);
    let blob = BlobWriter::encode(&schema, &writer_options)
        .context("Failed to encode merged schema")?;

    std::fs::write(output, &blob)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(asm) = &options.asm {
        std::fs::write(asm, render_asm(&blob))
            .with_context(|| format!("Failed to write {}", asm.display()))?;
    }
    if let Some(json) = &options.json {
        let text = serde_json::to_string_pretty(&schema)?;
        std::fs::write(json, text)
            .with_context(|| format!("Failed to write {}", json.display()))?;
    }

    println!(
        "[OK] Merged {} dumps: {} types, {} bytes -> {}",
        dumps.len(),
        schema.len(),
        blob.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use creflect::Registry;

    const DUMP: &str = "arch 8\nbase\nname int\nsize 4\nstruct\nname pair\nsize 8\n\
field\nname a\ntype int\noffset 0\nfield\nname b\ntype int\noffset 4\n";

    #[test]
    fn test_cmd_merge_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = dir.path().join("dumps");
        std::fs::create_dir_all(dumps.join("nested")).unwrap();
        std::fs::write(dumps.join("nested/unit.reflection.dat"), DUMP).unwrap();

        let output = dir.path().join("out.blob");
        let options = MergeOptions {
            framed: true,
            arch: Some(creflect::blob::HOST_SIZE_WIDTH),
            asm: Some(dir.path().join("out.S")),
            json: Some(dir.path().join("out.json")),
        };
        cmd_merge(&dumps, &output, &options).unwrap();

        let blob = std::fs::read(&output).unwrap();
        let registry = Registry::try_build(&blob).unwrap();
        let pair = registry.type_by_name("pair").unwrap();
        assert_eq!(pair.field("b").map(|f| f.offset), Some(4));

        let asm = std::fs::read_to_string(dir.path().join("out.S")).unwrap();
        assert!(asm.contains("_reflection_dat_start"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert_eq!(json["types"][1]["name"], "pair");
        assert_eq!(json["types"][1]["kind"], "struct");
    }

    #[test]
    fn test_cmd_merge_rejects_bad_arch_and_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.blob");
        let options = MergeOptions {
            framed: false,
            arch: Some(2),
            asm: None,
            json: None,
        };
        assert!(cmd_merge(dir.path(), &output, &options).is_err());

        std::fs::write(dir.path().join("a.reflection.dat"), DUMP).unwrap();
        let err = cmd_merge(dir.path(), &output, &options).unwrap_err();
        assert!(err.to_string().contains("pointer width"));
    }
}
