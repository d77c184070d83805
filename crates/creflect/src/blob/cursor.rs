// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequential, bounds-checked reader over a metadata blob.

use super::{BlobError, BlobResult};
use std::borrow::Cow;

/// Generate native-endian read methods for fixed-width integers.
///
/// Each generated method checks bounds (`BlobError::UnexpectedEof`),
/// decodes with `from_ne_bytes()` and advances the offset.
macro_rules! impl_read_ne {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self) -> BlobResult<$type> {
            const WIDTH: usize = std::mem::size_of::<$type>();
            let mut bytes = [0u8; WIDTH];
            bytes.copy_from_slice(self.read_bytes(WIDTH)?);
            Ok(<$type>::from_ne_bytes(bytes))
        }
    };
}

/// Read cursor over a blob payload.
///
/// With `copy == false` every string returned borrows from the buffer, so a
/// blob living in static memory is used without a deserialization pass.
/// With `copy == true` strings are duplicated and the buffer may be dropped
/// once loading completes.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    copy: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8], copy: bool) -> Self {
        Self {
            buffer,
            offset: 0,
            copy,
        }
    }

    impl_read_ne!(read_u8, u8);
    impl_read_ne!(read_u32, u32);
    impl_read_ne!(read_size, usize);

    pub fn read_bool(&mut self) -> BlobResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, len: usize) -> BlobResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(BlobError::UnexpectedEof {
                offset: self.offset,
                needed: len,
            })?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Decode the NUL-terminated string starting at `offset`.
    ///
    /// Never moves the cursor.
    pub fn read_string_at(&self, offset: usize) -> BlobResult<Cow<'a, str>> {
        let buffer: &'a [u8] = self.buffer;
        let tail = buffer.get(offset..).ok_or(BlobError::StringOutOfRange {
            offset,
            len: buffer.len(),
        })?;
        let end = tail
            .iter()
            .position(|b| *b == 0)
            .ok_or(BlobError::UnterminatedString { offset })?;
        let text =
            std::str::from_utf8(&tail[..end]).map_err(|_| BlobError::InvalidUtf8 { offset })?;
        if self.copy {
            Ok(Cow::Owned(text.to_owned()))
        } else {
            Ok(Cow::Borrowed(text))
        }
    }

    /// Read a string-table offset and decode the string it points to.
    pub fn read_string(&mut self) -> BlobResult<Cow<'a, str>> {
        let offset = self.read_size()?;
        self.read_string_at(offset)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Whether `count` records of at least `min_record_len` bytes each can
    /// still be present.
    pub fn can_hold(&self, count: usize, min_record_len: usize) -> bool {
        count
            .checked_mul(min_record_len)
            .is_some_and(|needed| needed <= self.remaining())
    }
}
