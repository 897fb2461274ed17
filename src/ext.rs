//! # Extension Traits
//!
//! Codec-aware conveniences over the raw collaborator calls.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`write_ea`](EaFsExt::write_ea) | Encode and write one attribute |
//! | [`write_eas`](EaFsExt::write_eas) | Encode and write several attributes in one request |
//! | [`read_eas`](EaFsExt::read_eas) | Read and decode every live attribute |
//! | [`read_eas_opt`](EaFsExt::read_eas_opt) | Like `read_eas`, with "no EAs" as `None` |

use crate::{EaError, EaFile, EaRecord, Handle, codec};

/// Operation label for write failures.
pub(crate) const WRITE_OP: &str = "write attributes";
/// Operation label for read failures.
pub(crate) const READ_OP: &str = "read attributes";

/// Extension methods for any [`EaFile`] backend.
///
/// # Example
///
/// ```rust
/// use ea_oracle::{EaFile, EaFsExt, EaError, Handle};
///
/// fn swap_tag<B: EaFile>(backend: &B, h: Handle) -> Result<(), EaError> {
///     backend.write_eas(h, &[("old", ""), ("new", "1")])?;
///     let records = backend.read_eas(h, 4096)?;
///     println!("{} attributes", records.len());
///     Ok(())
/// }
/// ```
pub trait EaFsExt: EaFile {
    /// Encode one attribute and submit it.
    ///
    /// An empty `value` deletes `name`.
    fn write_ea(&self, handle: Handle, name: &[u8], value: &[u8]) -> Result<(), EaError> {
        let buf = codec::encode_one(name, value)?;
        self.set_ea(handle, buf.as_bytes())
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: WRITE_OP,
                status,
            })
    }

    /// Encode several attributes into one chained buffer and submit it.
    ///
    /// Lengths are checked before the filesystem is called.
    fn write_eas<N, V>(&self, handle: Handle, request: &[(N, V)]) -> Result<(), EaError>
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let buf = codec::encode_many(request.iter().map(|(n, v)| (n.as_ref(), v.as_ref())))?;
        self.set_ea(handle, buf.as_bytes())
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: WRITE_OP,
                status,
            })
    }

    /// Read and decode every live attribute.
    ///
    /// # Errors
    ///
    /// - [`EaError::ExternalOperationFailed`] carrying
    ///   [`NtStatus::NO_EAS_ON_FILE`](crate::NtStatus::NO_EAS_ON_FILE) when the
    ///   file has none
    /// - [`EaError::MalformedBuffer`] if the returned buffer cannot be walked
    fn read_eas(&self, handle: Handle, capacity: usize) -> Result<Vec<EaRecord>, EaError> {
        let buf = self
            .query_ea(handle, capacity)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: READ_OP,
                status,
            })?;
        codec::decode(buf.as_bytes())
    }

    /// Read and decode, mapping the "no EAs on file" signal to `None`.
    fn read_eas_opt(
        &self,
        handle: Handle,
        capacity: usize,
    ) -> Result<Option<Vec<EaRecord>>, EaError> {
        match self.read_eas(handle, capacity) {
            Ok(records) => Ok(Some(records)),
            Err(e) if e.is_no_eas() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// Blanket implementation - any EaFile backend gets EaFsExt for free
impl<B: EaFile + ?Sized> EaFsExt for B {}
