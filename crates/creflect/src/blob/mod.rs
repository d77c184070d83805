// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary metadata blob: cursors, framing and the producer-side writer.
//!
//! # Layout
//!
//! A blob is read strictly sequentially. `size` is the producer's pointer
//! width, `ptr_depth` is always 32 bits, strings are offsets of
//! NUL-terminated byte runs elsewhere in the blob.
//!
//! ```text
//! type_count: size
//! repeat type_count:
//!   id: size, variant: u8, name: size (string offset), size: size
//!   struct/union: field_count: size, then per field
//!     name: size, is_const: u8, ptr_depth: u32, offset: size,
//!     arr_size: size, field_type_id: size
//!   enum: field_count: size, then per enumerator
//!     name: size, value: size
//! ```
//!
//! A blob may be prefixed with an 8-byte [`BlobHeader`] carrying the
//! pointer width and byte order it was produced for. String offsets are
//! always relative to the payload that follows the header.

pub mod cursor;
pub mod writer;

pub use cursor::Cursor;
pub use writer::{render_asm, BlobWriter, WriterOptions};

use std::fmt;

/// Magic bytes opening a framed blob.
pub const HEADER_MAGIC: [u8; 4] = *b"CRFL";

/// Framed blob format version understood by this loader.
pub const HEADER_VERSION: u8 = 1;

/// Length in bytes of the framed blob header.
pub const HEADER_LEN: usize = 8;

/// Width in bytes of a `size` field on this host.
pub const HOST_SIZE_WIDTH: usize = std::mem::size_of::<usize>();

/// Blob decoding/encoding error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// A fixed-width read ran past the end of the buffer.
    UnexpectedEof { offset: usize, needed: usize },
    /// A string offset points outside the buffer.
    StringOutOfRange { offset: usize, len: usize },
    /// No NUL terminator between the string offset and the end of the buffer.
    UnterminatedString { offset: usize },
    /// String bytes are not valid UTF-8.
    InvalidUtf8 { offset: usize },
    /// Framed header present but unusable on this host.
    BadHeader { reason: String },
    /// A value does not fit in the target `size` width.
    ValueOverflow { value: u64, width: usize },
    /// A name to encode contains a NUL byte and would be cut short.
    InteriorNul { text: String },
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::UnexpectedEof { offset, needed } => write!(
                f,
                "unexpected end of blob at offset {} ({} bytes needed)",
                offset, needed
            ),
            BlobError::StringOutOfRange { offset, len } => write!(
                f,
                "string offset {} out of range (blob is {} bytes)",
                offset, len
            ),
            BlobError::UnterminatedString { offset } => {
                write!(f, "string at offset {} has no terminator", offset)
            }
            BlobError::InvalidUtf8 { offset } => {
                write!(f, "string at offset {} is not valid UTF-8", offset)
            }
            BlobError::BadHeader { reason } => write!(f, "bad blob header: {}", reason),
            BlobError::ValueOverflow { value, width } => {
                write!(f, "value {} does not fit in {} bytes", value, width)
            }
            BlobError::InteriorNul { text } => {
                write!(f, "name {:?} contains a NUL byte", text)
            }
        }
    }
}

impl std::error::Error for BlobError {}

pub type BlobResult<T> = core::result::Result<T, BlobError>;

/// Byte order of the `size` and `u32` fields in a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the running host.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Endianness::Little => 0,
            Endianness::Big => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Endianness::Little),
            1 => Some(Endianness::Big),
            _ => None,
        }
    }
}

/// Which blob framings the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlobFormat {
    /// Accept a framed blob when the magic is present, a raw one otherwise.
    #[default]
    Detect,
    /// Payload only; the producer's width and byte order are assumed to match.
    Raw,
    /// Header required.
    Framed,
}

/// Architecture tag placed in front of a framed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader {
    pub version: u8,
    pub pointer_width: u8,
    pub endianness: Endianness,
}

impl BlobHeader {
    /// Header describing blobs produced for the running host.
    pub fn host() -> Self {
        Self {
            version: HEADER_VERSION,
            pointer_width: HOST_SIZE_WIDTH as u8,
            endianness: Endianness::host(),
        }
    }

    /// Encode the header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&HEADER_MAGIC);
        out[4] = self.version;
        out[5] = self.pointer_width;
        out[6] = self.endianness.to_byte();
        out
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// Returns `Ok(None)` when the magic is absent.
    pub fn parse(bytes: &[u8]) -> BlobResult<Option<Self>> {
        if bytes.len() < HEADER_MAGIC.len() || bytes[..HEADER_MAGIC.len()] != HEADER_MAGIC {
            return Ok(None);
        }
        if bytes.len() < HEADER_LEN {
            return Err(BlobError::UnexpectedEof {
                offset: bytes.len(),
                needed: HEADER_LEN - bytes.len(),
            });
        }
        let endianness = Endianness::from_byte(bytes[6]).ok_or_else(|| BlobError::BadHeader {
            reason: format!("unknown byte order tag {}", bytes[6]),
        })?;
        Ok(Some(Self {
            version: bytes[4],
            pointer_width: bytes[5],
            endianness,
        }))
    }

    /// Reject headers this host cannot decode.
    pub fn check_host(&self) -> BlobResult<()> {
        if self.version != HEADER_VERSION {
            return Err(BlobError::BadHeader {
                reason: format!(
                    "format version {} (expected {})",
                    self.version, HEADER_VERSION
                ),
            });
        }
        if usize::from(self.pointer_width) != HOST_SIZE_WIDTH {
            return Err(BlobError::BadHeader {
                reason: format!(
                    "produced for {}-byte pointers, host uses {}",
                    self.pointer_width, HOST_SIZE_WIDTH
                ),
            });
        }
        if self.endianness != Endianness::host() {
            return Err(BlobError::BadHeader {
                reason: format!("produced for {:?} byte order", self.endianness),
            });
        }
        Ok(())
    }
}

/// Strip and validate the framing of `bytes`, returning the payload.
pub fn split_payload(bytes: &[u8], format: BlobFormat) -> BlobResult<&[u8]> {
    if format == BlobFormat::Raw {
        return Ok(bytes);
    }
    match BlobHeader::parse(bytes)? {
        Some(header) => {
            header.check_host()?;
            Ok(&bytes[HEADER_LEN..])
        }
        None if format == BlobFormat::Framed => Err(BlobError::BadHeader {
            reason: "missing header magic".into(),
        }),
        None => Ok(bytes),
    }
}
