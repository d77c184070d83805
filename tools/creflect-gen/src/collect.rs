// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dump file discovery.

use creflect::schema::DUMP_FILE_SUFFIX;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Every dump under `root`, oldest first so newer definitions win the merge.
/// Ties are broken by path to keep the order stable.
pub fn find_dumps(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, &mut found)?;
    found.sort_by(|(a_path, a_time), (b_path, b_time)| {
        a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
    });
    Ok(found.into_iter().map(|(path, _)| path).collect())
}

fn walk(dir: &Path, found: &mut Vec<(PathBuf, SystemTime)>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, found)?;
        } else if is_dump(&path) {
            let modified = entry
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            log::trace!("[collect] {}", path.display());
            found.push((path, modified));
        }
    }
    Ok(())
}

fn is_dump(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(DUMP_FILE_SUFFIX))
}
