// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owning handle over one tagged allocation.

use super::{free_in, RawAllocator, SystemAllocator};
use crate::registry::{Registry, TypeRecord};
use crate::value::{FieldView, FieldViewMut};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

/// A zero-initialized value of a reflected type, freed on drop.
///
/// The payload keeps its allocation header, so [`TaggedBox::as_ptr`] can be
/// handed to code that calls [`Registry::type_of`].
pub struct TaggedBox<'r, A: RawAllocator = SystemAllocator> {
    registry: &'r Registry<'r>,
    ty: &'r TypeRecord<'r>,
    ptr: NonNull<u8>,
    allocator: A,
}

impl<'r> TaggedBox<'r> {
    pub fn new(registry: &'r Registry<'r>, ty: &TypeRecord<'r>) -> Option<Self> {
        Self::new_in(registry, ty, SystemAllocator)
    }
}

impl<'r, A: RawAllocator> TaggedBox<'r, A> {
    /// Allocate from `allocator`; `None` if `ty` is foreign to `registry` or
    /// allocation fails.
    pub fn new_in(registry: &'r Registry<'r>, ty: &TypeRecord<'r>, allocator: A) -> Option<Self> {
        let ptr = registry.alloc_in(ty, &allocator)?;
        let ty = registry.type_by_id(ty.id())?;
        Some(Self {
            registry,
            ty,
            ptr,
            allocator,
        })
    }

    /// Take ownership of a payload produced by `alloc_in` with `allocator`.
    ///
    /// # Safety
    /// `ptr` must come from [`Registry::alloc_in`] on `registry` with an
    /// allocator equivalent to `allocator`, and must not be owned elsewhere.
    pub unsafe fn from_raw(
        registry: &'r Registry<'r>,
        ptr: NonNull<u8>,
        allocator: A,
    ) -> Option<Self> {
        let ty = registry.type_of(ptr.as_ptr())?;
        Some(Self {
            registry,
            ty,
            ptr,
            allocator,
        })
    }

    pub fn type_record(&self) -> &'r TypeRecord<'r> {
        self.ty
    }

    pub fn registry(&self) -> &'r Registry<'r> {
        self.registry
    }

    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the payload is `ty.size()` initialized bytes owned by self.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.ty.size()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.ty.size()) }
    }

    pub fn field(&self, name: &str) -> Option<FieldView<'_, 'r>> {
        self.registry.get_field_manual(self.as_bytes(), name, self.ty)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<FieldViewMut<'_, 'r>> {
        let registry = self.registry;
        let ty = self.ty;
        registry.get_field_manual_mut(self.as_bytes_mut(), name, ty)
    }

    /// Give up ownership without freeing; the caller releases the pointer
    /// with `free_in` on the same allocator.
    pub fn into_raw(self) -> NonNull<u8> {
        let this = ManuallyDrop::new(self);
        this.ptr
    }
}

impl<A: RawAllocator> Drop for TaggedBox<'_, A> {
    fn drop(&mut self) {
        // SAFETY: we own the allocation and it came from `self.allocator`.
        unsafe { free_in(Some(self.ptr), &self.allocator) }
    }
}

impl<A: RawAllocator> fmt::Debug for TaggedBox<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedBox")
            .field("type", &self.ty.name())
            .field("ptr", &self.ptr)
            .finish()
    }
}

impl<'a> Registry<'a> {
    /// Allocate a [`TaggedBox`] holding a zeroed value of `ty`.
    pub fn new_tagged<'r>(&'r self, ty: &TypeRecord<'r>) -> Option<TaggedBox<'r>>
    where
        'a: 'r,
    {
        TaggedBox::new(self, ty)
    }
}
