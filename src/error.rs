//! Error types for the EA codec and consistency oracle.

use std::path::PathBuf;

use crate::{NtStatus, SizeSource};

/// Error type for codec, model, and verification failures.
///
/// Every variant carries the context needed to tell which check failed and
/// why. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use ea_oracle::{EaError, SizeSource};
///
/// let err = EaError::SizeMismatch {
///     reported_by: SizeSource::EaInformation,
///     expected: 20,
///     reported: 16,
/// };
/// assert_eq!(err.to_string(), "FileEaInformation: EaSize was 16, expected 20");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EaError {
    // Codec Errors
    /// A name or value does not fit the record's length field.
    #[error("EA {field} length {len} out of range (max {max})")]
    InvalidLength {
        /// Which field was rejected (`"name"` or `"value"`).
        field: &'static str,
        /// The offending length.
        len: usize,
        /// The largest length the field accepts.
        max: usize,
    },

    /// A buffer could not be walked without reading out of bounds.
    #[error("malformed EA buffer at offset {offset}: {details}")]
    MalformedBuffer {
        /// Byte offset of the record being decoded.
        offset: usize,
        /// What was wrong with it.
        details: String,
    },

    // Collaborator Errors
    /// The filesystem rejected a write, read, or query call.
    #[error("{operation} failed: {status}")]
    ExternalOperationFailed {
        /// The collaborator operation that failed.
        operation: &'static str,
        /// The status it returned.
        status: NtStatus,
    },

    /// The filesystem was expected to fail with a specific status but did not.
    #[error("{operation}: status was {actual}, expected {expected}")]
    UnexpectedStatus {
        /// The collaborator operation that was checked.
        operation: &'static str,
        /// The status the scenario predicted.
        expected: NtStatus,
        /// The status actually returned (`SUCCESS` if the call succeeded).
        actual: NtStatus,
    },

    /// A path handed to the checker has no UTF-8 file name to look up.
    #[error("invalid path: {}", path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
    },

    // Verification Errors
    /// A size-reporting path disagreed with the predicted total.
    #[error("{reported_by}: EaSize was {reported}, expected {expected}")]
    SizeMismatch {
        /// The query path that reported the wrong value.
        reported_by: SizeSource,
        /// The predicted total encoded size.
        expected: u32,
        /// The value the path reported.
        reported: u32,
    },

    /// Decoded content disagreed with the predicted live set.
    #[error("{context}: {field} was {actual}, expected {expected}")]
    ContentMismatch {
        /// Where the mismatch was found (e.g. `EA 1` or a directory shape).
        context: String,
        /// The field that differed.
        field: &'static str,
        /// The predicted value.
        expected: String,
        /// The observed value.
        actual: String,
    },
}

impl EaError {
    /// The collaborator status attached to this error, if any.
    pub fn status(&self) -> Option<NtStatus> {
        match self {
            EaError::ExternalOperationFailed { status, .. } => Some(*status),
            EaError::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Returns `true` if this is the read path's "no EAs on file" signal.
    pub fn is_no_eas(&self) -> bool {
        matches!(
            self,
            EaError::ExternalOperationFailed {
                status: NtStatus::NO_EAS_ON_FILE,
                ..
            }
        )
    }

    pub(crate) fn malformed(offset: usize, details: impl Into<String>) -> Self {
        EaError::MalformedBuffer {
            offset,
            details: details.into(),
        }
    }

    pub(crate) fn content(
        context: impl Into<String>,
        field: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        EaError::ContentMismatch {
            context: context.into(),
            field,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Quote a byte string for diagnostics, escaping anything non-printable.
pub(crate) fn quoted(bytes: &[u8]) -> String {
    format!("\"{}\"", bytes.escape_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirInfoClass;

    #[test]
    fn invalid_length_display() {
        let err = EaError::InvalidLength {
            field: "name",
            len: 300,
            max: 255,
        };
        assert_eq!(err.to_string(), "EA name length 300 out of range (max 255)");
    }

    #[test]
    fn size_mismatch_names_the_source() {
        let err = EaError::SizeMismatch {
            reported_by: SizeSource::DirEntry(DirInfoClass::IdBothDirectory),
            expected: 40,
            reported: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("FILE_ID_BOTH_DIR_INFORMATION"));
        assert!(msg.contains("40"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn external_failure_carries_status() {
        let err = EaError::ExternalOperationFailed {
            operation: "read attributes",
            status: NtStatus::NO_EAS_ON_FILE,
        };
        assert_eq!(err.status(), Some(NtStatus::NO_EAS_ON_FILE));
        assert!(err.is_no_eas());
        assert_eq!(
            err.to_string(),
            "read attributes failed: STATUS_NO_EAS_ON_FILE (0xc0000052)"
        );
    }

    #[test]
    fn other_statuses_are_not_no_eas() {
        let err = EaError::ExternalOperationFailed {
            operation: "read attributes",
            status: NtStatus::BUFFER_TOO_SMALL,
        };
        assert!(!err.is_no_eas());

        let err = EaError::malformed(12, "truncated header");
        assert!(!err.is_no_eas());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn content_mismatch_display() {
        let err = EaError::content("EA 0", "name", quoted(b"HELLO"), quoted(b"hello"));
        assert_eq!(
            err.to_string(),
            "EA 0: name was \"hello\", expected \"HELLO\""
        );
    }

    #[test]
    fn quoted_escapes_binary() {
        assert_eq!(quoted(b"a\0b"), "\"a\\x00b\"");
    }
}
