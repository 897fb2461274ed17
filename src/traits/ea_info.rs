//! Metadata queries that report an EA size for an open handle.

use crate::{FileAllInformation, FileEaInformation, Handle, NtStatus};

/// Metadata queries on an open handle.
///
/// Both queries must report the same EA size: the total encoded size of the
/// file's live attribute set.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
pub trait EaInfo: Send + Sync {
    /// The size-only query.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::INVALID_HANDLE`] if the handle is not open
    fn query_ea_information(&self, handle: Handle) -> Result<FileEaInformation, NtStatus>;

    /// The combined metadata query.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::INVALID_HANDLE`] if the handle is not open
    fn query_all_information(&self, handle: Handle) -> Result<FileAllInformation, NtStatus>;
}
