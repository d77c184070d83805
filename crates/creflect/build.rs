// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::env;
use std::fs;
use std::path::PathBuf;

/// Environment variable naming a metadata blob to bake into the library.
const LINKED_BLOB_ENV: &str = "CREFLECT_LINKED_BLOB";

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error embedding reflection blob: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let out_path = out_dir.join("linked.blob");

    println!("cargo:rerun-if-env-changed={LINKED_BLOB_ENV}");

    match env::var_os(LINKED_BLOB_ENV) {
        Some(source) if !source.is_empty() => {
            let source = PathBuf::from(source);
            println!("cargo:rerun-if-changed={}", source.display());
            fs::copy(&source, &out_path)?;
        }
        // Nothing to embed: the linked blob is empty.
        _ => fs::write(&out_path, [])?,
    }

    Ok(())
}
