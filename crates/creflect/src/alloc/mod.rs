// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-tagged allocation.
//!
//! Every allocation made through [`Registry::alloc`] is prefixed with an
//! [`AllocationHeader`] recording the owning registry and the payload's type
//! id, so a bare payload pointer can later be mapped back to its
//! [`TypeRecord`] with [`Registry::type_of`].
//!
//! ```text
//!   base                         payload (returned)
//!   | magic | is_ptr | registry | type_id | size | ... ty.size bytes ... |
//!   |<------------- HEADER_SIZE ------------->|
//! ```
//!
//! All header reads and writes in the crate go through this module.

mod tagged;

pub use tagged::TaggedBox;

use crate::registry::{Registry, TypeId, TypeRecord};
use std::ffi::c_void;
use std::ptr::NonNull;

/// Sentinel stored in every live allocation header.
pub const ALLOC_MAGIC: u32 = 0x7575_7575;

/// Bytes reserved in front of every tagged payload.
pub const HEADER_SIZE: usize = std::mem::size_of::<AllocationHeader>();

/// Metadata stored in front of a tagged payload.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct AllocationHeader {
    magic: u32,
    is_ptr: u8,
    registry: u64,
    type_id: usize,
    size: usize,
}

impl AllocationHeader {
    fn new(registry: u64, type_id: TypeId, size: usize) -> Self {
        Self {
            magic: ALLOC_MAGIC,
            is_ptr: 0,
            registry,
            type_id: type_id.index(),
            size,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == ALLOC_MAGIC
    }

    /// Reserved; always `false` for allocations made by this crate.
    pub fn is_ptr(&self) -> bool {
        self.is_ptr != 0
    }

    pub fn type_id(&self) -> TypeId {
        TypeId(self.type_id)
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn registry_tag(&self) -> u64 {
        self.registry
    }

    /// Header in front of `payload`.
    ///
    /// # Safety
    /// The `HEADER_SIZE` bytes before `payload` must be readable and in the
    /// same allocation as `payload`.
    pub(crate) unsafe fn read(payload: *const u8) -> Self {
        // SAFETY: caller guarantees the header bytes are readable. Every
        // field is a plain integer, so any bit pattern is valid.
        payload
            .sub(HEADER_SIZE)
            .cast::<AllocationHeader>()
            .read_unaligned()
    }

    /// # Safety
    /// `base` must be writable for `HEADER_SIZE` bytes.
    unsafe fn write(self, base: *mut u8) {
        base.cast::<AllocationHeader>().write_unaligned(self);
    }

    /// # Safety
    /// `payload` must have been returned by [`Registry::alloc_in`] and not
    /// yet freed.
    unsafe fn clear(payload: NonNull<u8>) {
        let base = payload.as_ptr().sub(HEADER_SIZE);
        std::ptr::write_bytes(base, 0, std::mem::size_of::<u32>());
    }
}

/// Backing memory source for tagged allocations.
///
/// # Safety
/// `allocate` must return memory valid for reads and writes of `size`
/// bytes, until it is passed back to `deallocate` on the same allocator.
pub unsafe trait RawAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// # Safety
    /// `ptr` must come from `allocate` on this allocator and not be freed.
    unsafe fn deallocate(&self, ptr: NonNull<u8>);
}

unsafe impl<T: RawAllocator + ?Sized> RawAllocator for &T {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        (**self).allocate(size)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        (**self).deallocate(ptr)
    }
}

/// The C heap (`malloc`/`free`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

unsafe impl RawAllocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: malloc has no preconditions; null is handled.
        NonNull::new(unsafe { libc::malloc(size.max(1)) }.cast::<u8>())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        libc::free(ptr.as_ptr().cast::<c_void>());
    }
}

/// C-style allocation callback: `(context, size) -> pointer`.
pub type AllocFn = unsafe extern "C" fn(ctx: *mut c_void, size: usize) -> *mut c_void;
/// C-style release callback: `(context, pointer)`.
pub type FreeFn = unsafe extern "C" fn(ctx: *mut c_void, ptr: *mut c_void);

/// Allocator backed by a pair of C callbacks sharing a context pointer.
///
/// A missing callback falls back to the C heap.
#[derive(Debug, Clone, Copy)]
pub struct FnAllocator {
    ctx: *mut c_void,
    alloc: Option<AllocFn>,
    free: Option<FreeFn>,
}

impl FnAllocator {
    /// # Safety
    /// The callbacks must behave like `malloc`/`free` for the given `ctx`,
    /// and `ctx` must stay valid for as long as this allocator is used.
    pub unsafe fn new(ctx: *mut c_void, alloc: Option<AllocFn>, free: Option<FreeFn>) -> Self {
        Self { ctx, alloc, free }
    }
}

unsafe impl RawAllocator for FnAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        match self.alloc {
            // SAFETY: contract of `FnAllocator::new`.
            Some(alloc) => NonNull::new(unsafe { alloc(self.ctx, size) }.cast::<u8>()),
            None => SystemAllocator.allocate(size),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        match self.free {
            Some(free) => free(self.ctx, ptr.as_ptr().cast::<c_void>()),
            None => SystemAllocator.deallocate(ptr),
        }
    }
}

impl<'a> Registry<'a> {
    /// Allocate a zeroed, tagged value of type `ty` on the C heap.
    ///
    /// Release it with [`free`].
    pub fn alloc(&self, ty: &TypeRecord<'a>) -> Option<NonNull<u8>> {
        self.alloc_in(ty, &SystemAllocator)
    }

    /// Allocate a zeroed, tagged value of type `ty` from `allocator`.
    ///
    /// Returns `None` if `ty` does not belong to this registry or the
    /// allocator fails. Release it with [`free_in`] on the same allocator.
    pub fn alloc_in<A: RawAllocator + ?Sized>(
        &self,
        ty: &TypeRecord<'a>,
        allocator: &A,
    ) -> Option<NonNull<u8>> {
        if !self.owns(ty) {
            log::debug!("[alloc] '{}' is not a record of this registry", ty.name());
            return None;
        }
        let total = HEADER_SIZE.checked_add(ty.size())?;
        let base = allocator.allocate(total)?;
        let header = AllocationHeader::new(self.tag(), ty.id(), ty.size());
        // SAFETY: `base` is valid for `total` bytes.
        unsafe {
            header.write(base.as_ptr());
            let payload = base.as_ptr().add(HEADER_SIZE);
            std::ptr::write_bytes(payload, 0, ty.size());
            Some(NonNull::new_unchecked(payload))
        }
    }

    /// Type of a tagged value, or `None` when `ptr` carries no header from
    /// this registry.
    ///
    /// # Safety
    /// `ptr` must be null or have at least `HEADER_SIZE` readable bytes in
    /// front of it within the same allocation.
    pub unsafe fn type_of(&self, ptr: *const u8) -> Option<&TypeRecord<'a>> {
        let header = self.header_of(ptr)?;
        self.type_by_id(header.type_id())
    }

    /// Header of a tagged value of this registry.
    ///
    /// # Safety
    /// As for [`Self::type_of`].
    pub unsafe fn header_of(&self, ptr: *const u8) -> Option<AllocationHeader> {
        if ptr.is_null() {
            return None;
        }
        let header = AllocationHeader::read(ptr);
        (header.is_valid() && header.registry_tag() == self.tag()).then_some(header)
    }

    /// Address of field `name` in the tagged value at `ptr`.
    ///
    /// # Safety
    /// As for [`Self::type_of`].
    pub unsafe fn get_field(&self, ptr: NonNull<u8>, name: &str) -> Option<NonNull<u8>> {
        let ty = self.type_of(ptr.as_ptr())?;
        self.get_field_manual_raw(ptr, name, ty)
    }
}

/// Release a value from [`Registry::alloc`]. `None` is a no-op.
///
/// # Safety
/// `ptr` must come from [`Registry::alloc`] and not have been freed.
pub unsafe fn free(ptr: Option<NonNull<u8>>) {
    free_in(ptr, &SystemAllocator)
}

/// Release a value from [`Registry::alloc_in`] back to `allocator`.
///
/// # Safety
/// `ptr` must come from [`Registry::alloc_in`] with this same allocator and
/// not have been freed.
pub unsafe fn free_in<A: RawAllocator + ?Sized>(ptr: Option<NonNull<u8>>, allocator: &A) {
    let Some(payload) = ptr else {
        return;
    };
    AllocationHeader::clear(payload);
    let base = NonNull::new_unchecked(payload.as_ptr().sub(HEADER_SIZE));
    allocator.deallocate(base);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobWriter, WriterOptions};
    use crate::schema::{Schema, SchemaField, SchemaType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn blob() -> Vec<u8> {
        let schema = Schema::new(vec![
            SchemaType::base("int", 4),
            SchemaType::structure("pair", 8)
                .with_field(SchemaField::new("a", "int", 0))
                .with_field(SchemaField::new("b", "int", 4)),
            SchemaType::structure("empty", 0),
        ]);
        BlobWriter::encode(&schema, &WriterOptions::host()).expect("encode")
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(HEADER_SIZE % 16, 0);
        assert_eq!(std::mem::align_of::<AllocationHeader>(), 16);
    }

    #[test]
    fn test_alloc_type_of_free() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let pair = registry.type_by_name("pair").expect("pair");

        let ptr = registry.alloc(pair).expect("alloc");
        unsafe {
            let ty = registry.type_of(ptr.as_ptr()).expect("tagged");
            assert_eq!(ty.name(), "pair");
            let header = registry.header_of(ptr.as_ptr()).unwrap();
            assert_eq!(header.size(), 8);
            assert!(!header.is_ptr());

            let payload = std::slice::from_raw_parts(ptr.as_ptr(), 8);
            assert!(payload.iter().all(|b| *b == 0));

            let b = registry.get_field(ptr, "b").expect("field b");
            assert_eq!(b.as_ptr() as usize - ptr.as_ptr() as usize, 4);
            assert!(registry.get_field(ptr, "c").is_none());
            free(Some(ptr));
            free(None);
        }
    }

    #[test]
    fn test_zero_sized_type() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let empty = registry.type_by_name("empty").unwrap();
        let ptr = registry.alloc(empty).expect("alloc");
        unsafe {
            assert_eq!(registry.type_of(ptr.as_ptr()).map(|t| t.name()), Some("empty"));
            free(Some(ptr));
        }
    }

    #[test]
    fn test_untagged_memory_has_no_type() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let buffer = [0u8; 64];
        unsafe {
            assert!(registry.type_of(buffer.as_ptr().add(32)).is_none());
            assert!(registry.type_of(std::ptr::null()).is_none());
        }
    }

    #[test]
    fn test_foreign_registry_tag_rejected() {
        let blob = blob();
        let first = Registry::try_build(&blob).expect("build");
        let second = Registry::try_build(&blob).expect("build");
        let pair = first.type_by_name("pair").unwrap();

        // Records of another registry are refused outright.
        assert!(second.alloc(pair).is_none());

        let ptr = first.alloc(pair).expect("alloc");
        unsafe {
            assert!(second.type_of(ptr.as_ptr()).is_none());
            assert!(first.type_of(ptr.as_ptr()).is_some());
            free(Some(ptr));
        }
    }

    static LIVE: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn counting_alloc(ctx: *mut c_void, size: usize) -> *mut c_void {
        assert_eq!(ctx as usize, 0xC0FFEE);
        LIVE.fetch_add(1, Ordering::SeqCst);
        libc::malloc(size)
    }

    unsafe extern "C" fn counting_free(ctx: *mut c_void, ptr: *mut c_void) {
        assert_eq!(ctx as usize, 0xC0FFEE);
        LIVE.fetch_sub(1, Ordering::SeqCst);
        libc::free(ptr)
    }

    #[test]
    fn test_fn_allocator_context() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let pair = registry.type_by_name("pair").unwrap();
        let allocator = unsafe {
            FnAllocator::new(
                0xC0FFEE as *mut c_void,
                Some(counting_alloc),
                Some(counting_free),
            )
        };

        let ptr = registry.alloc_in(pair, &allocator).expect("alloc");
        assert_eq!(LIVE.load(Ordering::SeqCst), 1);
        unsafe { free_in(Some(ptr), &allocator) };
        assert_eq!(LIVE.load(Ordering::SeqCst), 0);

        let fallback = unsafe { FnAllocator::new(std::ptr::null_mut(), None, None) };
        let ptr = registry.alloc_in(pair, &fallback).expect("alloc");
        unsafe { free_in(Some(ptr), &fallback) };
    }

    struct Failing;

    unsafe impl RawAllocator for Failing {
        fn allocate(&self, _size: usize) -> Option<NonNull<u8>> {
            None
        }

        unsafe fn deallocate(&self, _ptr: NonNull<u8>) {
            unreachable!("nothing was allocated");
        }
    }

    #[test]
    fn test_allocator_failure_is_none() {
        let blob = blob();
        let registry = Registry::try_build(&blob).expect("build");
        let pair = registry.type_by_name("pair").unwrap();
        assert!(registry.alloc_in(pair, &Failing).is_none());
    }
}
