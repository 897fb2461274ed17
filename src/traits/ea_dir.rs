//! Directory enumeration, as far as EA sizes are concerned.

use std::path::Path;

use crate::{DirEntryInfo, DirInfoClass, NtStatus};

/// Directory-entry queries.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn EaDir`.
pub trait EaDir: Send + Sync {
    /// Enumerate `dir` for entries matching `name`, in the given record shape.
    ///
    /// An exact name (no wildcards) should yield exactly one entry.
    ///
    /// # Errors
    ///
    /// - [`NtStatus::OBJECT_NAME_NOT_FOUND`] if `dir` does not exist
    /// - [`NtStatus::NO_SUCH_FILE`] if nothing matches `name`
    fn query_directory(
        &self,
        dir: &Path,
        name: &str,
        class: DirInfoClass,
    ) -> Result<Vec<DirEntryInfo>, NtStatus>;
}
