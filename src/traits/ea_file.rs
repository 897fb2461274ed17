//! Attribute write and read calls.
//!
//! This module provides the [`EaFile`] trait, the two calls through which
//! EA buffers cross into and out of the filesystem under test.
//!
//! # Example
//!
//! ```rust
//! use ea_oracle::{codec, EaFile, Handle, NtStatus};
//!
//! fn tag<B: EaFile>(backend: &B, h: Handle) -> Result<(), NtStatus> {
//!     let buf = codec::encode_one(b"tag", b"blue").map_err(|_| NtStatus::INVALID_PARAMETER)?;
//!     backend.set_ea(h, buf.as_bytes())
//! }
//! ```
//!
//! # Thread Safety
//!
//! `EaFile` requires `Send + Sync`. Implementations must handle concurrent
//! access appropriately.

use crate::{EaBuffer, Handle, NtStatus};

/// Attribute write and read calls.
pub trait EaFile: Send + Sync {
    /// Apply a chained EA buffer to the file behind `handle`.
    ///
    /// Every record is merged into the file's live set: new names append,
    /// known names are replaced, and empty values delete.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::INVALID_HANDLE`] if the handle is not open
    /// - [`NtStatus::EA_LIST_INCONSISTENT`] if the buffer fails validation
    fn set_ea(&self, handle: Handle, buffer: &[u8]) -> Result<(), NtStatus>;

    /// Read every live attribute as one chained buffer.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::NO_EAS_ON_FILE`] if the live set is empty
    /// - [`NtStatus::BUFFER_TOO_SMALL`] if `capacity` cannot hold the records
    /// - [`NtStatus::INVALID_HANDLE`] if the handle is not open
    fn query_ea(&self, handle: Handle, capacity: usize) -> Result<EaBuffer, NtStatus>;
}
