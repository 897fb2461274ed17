//! Handle lifecycle for the filesystem under test.
//!
//! The workflow is:
//!
//! 1. `open()` - create or open a file and get a handle
//! 2. EA reads, writes, and metadata queries using the handle
//! 3. `close()` - release the handle, letting the filesystem publish
//!    deferred metadata to directory entries

use std::path::Path;

use crate::{Disposition, Handle, NtStatus};

/// Handle lifecycle.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Handles may be used from
/// multiple threads, but each handle must be closed exactly once.
pub trait EaHandles: Send + Sync {
    /// Open `path` with EA read and write access.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::OBJECT_NAME_COLLISION`] for [`Disposition::Create`] on an existing file
    /// - [`NtStatus::OBJECT_NAME_NOT_FOUND`] for [`Disposition::Open`] on a missing file
    fn open(&self, path: &Path, disposition: Disposition) -> Result<Handle, NtStatus>;

    /// Close a handle.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::INVALID_HANDLE`] if the handle is not open
    fn close(&self, handle: Handle) -> Result<(), NtStatus>;
}
