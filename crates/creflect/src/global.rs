// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide registry.
//!
//! The first successful [`load`] wins; later loads return the registry that
//! is already installed and never rebuild it. A failed load leaves the
//! global empty so a later call may still succeed.

use crate::blob::BlobFormat;
use crate::error::Result;
use crate::registry::{LoadOptions, Registry};
use std::sync::OnceLock;

static GLOBAL: OnceLock<Registry<'static>> = OnceLock::new();

/// Blob linked in at build time from `CREFLECT_LINKED_BLOB` (empty if unset).
pub static LINKED_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/linked.blob"));

fn install(build: impl FnOnce() -> Result<Registry<'static>>) -> Result<&'static Registry<'static>> {
    if let Some(registry) = GLOBAL.get() {
        log::debug!("[global] registry already loaded, ignoring load request");
        return Ok(registry);
    }
    let registry = build()?;
    if GLOBAL.set(registry).is_err() {
        log::debug!("[global] lost load race, keeping the installed registry");
    }
    // Populated by now: either by us or by a racing loader.
    Ok(GLOBAL.get_or_init(Registry::empty))
}

/// Install the global registry from a static blob, borrowing its strings
/// unless `copy_strings` is set.
pub fn load(bytes: &'static [u8], copy_strings: bool) -> Result<&'static Registry<'static>> {
    install(|| Registry::try_build_with(bytes, LoadOptions::new().copy_strings(copy_strings)))
}

/// Install the global registry from a blob that does not outlive the call.
pub fn load_owned(bytes: &[u8], format: BlobFormat) -> Result<&'static Registry<'static>> {
    install(|| Registry::try_build_owned(bytes, format))
}

/// Install the global registry from [`LINKED_BLOB`].
pub fn load_linked() -> Result<&'static Registry<'static>> {
    load(LINKED_BLOB, false)
}

/// The installed registry, if any load succeeded.
pub fn registry() -> Option<&'static Registry<'static>> {
    GLOBAL.get()
}

/// Whether the global registry has been installed.
pub fn is_loaded() -> bool {
    GLOBAL.get().is_some()
}
