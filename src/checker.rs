//! # Checker
//!
//! Drives a filesystem through EA writes while tracking the predicted live
//! set, then cross-checks every query path against the prediction.
//!
//! ## Example
//!
//! ```rust
//! use ea_oracle::{CheckOptions, Disposition, EaChecker, EaError, EaFs};
//! use std::path::Path;
//!
//! fn check<B: EaFs>(fs: &B) -> Result<(), EaError> {
//!     let mut checker = EaChecker::new(fs, CheckOptions::default());
//!     let h = checker.open(Path::new("/dir/ea1"), Disposition::Create)?;
//!     checker.write(h, &[("hello", "world")])?;
//!     checker.verify_read(h)?;
//!     checker.verify_handle_sizes(h)?;
//!     checker.close(h)?;
//!     checker.verify_dir_entries(Path::new("/dir"), "ea1")
//! }
//! ```

use std::path::Path;

use crate::ext::READ_OP;
use crate::{
    CheckOptions, DirInfoClass, Disposition, EaError, EaFs, EaFsExt, Handle, LiveSet, NtStatus,
    SizeSource, codec, oracle,
};

/// Tracks one file's predicted live set across writes.
///
/// Predictions are committed only after the filesystem accepts a write, so
/// a rejected request leaves the expectation unchanged.
pub struct EaChecker<'a, B: EaFs + ?Sized> {
    fs: &'a B,
    options: CheckOptions,
    expected: LiveSet,
}

impl<'a, B: EaFs + ?Sized> EaChecker<'a, B> {
    /// Start with an empty prediction.
    pub fn new(fs: &'a B, options: CheckOptions) -> Self {
        let expected = LiveSet::with_policy(options.replace_policy);
        Self {
            fs,
            options,
            expected,
        }
    }

    /// Start from a known prediction, e.g. for a file that already has EAs.
    ///
    /// Later writes are predicted with `options.replace_policy`, whatever
    /// policy `expected` was built with.
    pub fn with_expected(fs: &'a B, options: CheckOptions, expected: LiveSet) -> Self {
        let expected = expected.into_policy(options.replace_policy);
        Self {
            fs,
            options,
            expected,
        }
    }

    /// The current prediction.
    #[inline]
    pub fn expected(&self) -> &LiveSet {
        &self.expected
    }

    /// The options in effect.
    #[inline]
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// The predicted total EA size.
    #[inline]
    pub fn expected_size(&self) -> u32 {
        oracle::expected_total_size(&self.expected)
    }

    /// Open a file on the underlying filesystem.
    pub fn open(&self, path: &Path, disposition: Disposition) -> Result<Handle, EaError> {
        self.fs
            .open(path, disposition)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: "open",
                status,
            })
    }

    /// Close a handle on the underlying filesystem.
    pub fn close(&self, handle: Handle) -> Result<(), EaError> {
        self.fs
            .close(handle)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: "close",
                status,
            })
    }

    /// Predict, encode, and submit a write request.
    ///
    /// # Errors
    ///
    /// - [`EaError::InvalidLength`] before any I/O if a record cannot be encoded
    /// - [`EaError::ExternalOperationFailed`] if the filesystem rejects the write
    pub fn write<N, V>(&mut self, handle: Handle, request: &[(N, V)]) -> Result<(), EaError>
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let predicted = self.expected.apply(request)?;
        self.fs.write_eas(handle, request)?;

        log::debug!(
            "write of {} record(s) accepted, {} live EA(s) predicted",
            request.len(),
            predicted.len()
        );
        self.expected = predicted;
        Ok(())
    }

    /// Read the file's EAs and compare them with the prediction.
    ///
    /// An empty prediction requires the read to fail with
    /// [`NtStatus::NO_EAS_ON_FILE`].
    pub fn verify_read(&self, handle: Handle) -> Result<(), EaError> {
        let result = self.fs.query_ea(handle, self.options.read_capacity);

        if self.expected.is_empty() {
            return match result {
                Err(NtStatus::NO_EAS_ON_FILE) => Ok(()),
                Err(status) => Err(EaError::UnexpectedStatus {
                    operation: READ_OP,
                    expected: NtStatus::NO_EAS_ON_FILE,
                    actual: status,
                }),
                Ok(_) => Err(EaError::UnexpectedStatus {
                    operation: READ_OP,
                    expected: NtStatus::NO_EAS_ON_FILE,
                    actual: NtStatus::SUCCESS,
                }),
            };
        }

        let buf = result.map_err(|status| EaError::ExternalOperationFailed {
            operation: READ_OP,
            status,
        })?;
        let decoded = codec::decode(buf.as_bytes())?;
        oracle::verify_roundtrip(
            self.expected.records(),
            &decoded,
            self.options.expect_name_uppercased,
        )
    }

    /// Sizes reported by the two per-handle queries.
    pub fn reported_sizes(&self, handle: Handle) -> Result<Vec<(SizeSource, u32)>, EaError> {
        let ea = self
            .fs
            .query_ea_information(handle)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: "query FileEaInformation",
                status,
            })?;
        let all = self
            .fs
            .query_all_information(handle)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: "query FileAllInformation",
                status,
            })?;

        Ok(vec![
            (SizeSource::EaInformation, ea.ea_size),
            (SizeSource::AllInformation, all.ea_information.ea_size),
        ])
    }

    /// Check both per-handle size queries against the prediction.
    pub fn verify_handle_sizes(&self, handle: Handle) -> Result<(), EaError> {
        oracle::verify_size_consistency(self.expected_size(), self.reported_sizes(handle)?)
    }

    /// Check one directory-entry shape for `name` in `dir`.
    ///
    /// Exactly one entry must come back, named `name`, with the predicted
    /// EA size.
    pub fn verify_dir_entry(
        &self,
        dir: &Path,
        name: &str,
        class: DirInfoClass,
    ) -> Result<(), EaError> {
        let entries = self
            .fs
            .query_directory(dir, name, class)
            .map_err(|status| EaError::ExternalOperationFailed {
                operation: "query directory",
                status,
            })?;
        let context = class.label();

        let [entry] = entries.as_slice() else {
            return Err(EaError::content(
                context,
                "entry count",
                "1",
                entries.len().to_string(),
            ));
        };

        if entry.class() != class {
            return Err(EaError::content(
                context,
                "record shape",
                class.label(),
                entry.class().label(),
            ));
        }
        if entry.file_name() != name {
            return Err(EaError::content(
                context,
                "file name",
                format!("\"{name}\""),
                format!("\"{}\"", entry.file_name()),
            ));
        }

        oracle::verify_size_consistency(
            self.expected_size(),
            [(SizeSource::DirEntry(class), entry.ea_size())],
        )
    }

    /// Check every configured directory-entry shape.
    pub fn verify_dir_entries(&self, dir: &Path, name: &str) -> Result<(), EaError> {
        for &class in &self.options.dir_classes {
            self.verify_dir_entry(dir, name, class)?;
        }
        Ok(())
    }

    /// Run every check against `path`: read-back, both handle sizes, then
    /// all directory shapes.
    ///
    /// Opens its own handle. With
    /// [`reopen_before_dir_query`](CheckOptions::reopen_before_dir_query) the
    /// handle is closed before the directory is queried.
    pub fn verify_file(&self, path: &Path) -> Result<(), EaError> {
        let (dir, name) = split_path(path)?;
        let handle = self.open(path, Disposition::Open)?;

        let handle_checks = self
            .verify_read(handle)
            .and_then(|()| self.verify_handle_sizes(handle));

        if self.options.reopen_before_dir_query {
            let closed = self.close(handle);
            handle_checks?;
            closed?;
            self.verify_dir_entries(dir, name)
        } else {
            let dir_checks = handle_checks.and_then(|()| self.verify_dir_entries(dir, name));
            let closed = self.close(handle);
            dir_checks?;
            closed
        }
    }
}

/// Split a file path into its directory and UTF-8 file name.
fn split_path(path: &Path) -> Result<(&Path, &str), EaError> {
    let name = path.file_name().and_then(|n| n.to_str());
    match (path.parent(), name) {
        (Some(dir), Some(name)) => Ok((dir, name)),
        _ => Err(EaError::InvalidPath {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DirEntryInfo, EaBuffer, EaDir, EaFile, EaHandles, EaInfo, FileAllInformation,
        FileEaInformation, ReplacePolicy,
    };
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Accepts every write and counts calls.
    #[derive(Default)]
    struct Accepting {
        calls: AtomicU64,
    }

    impl Accepting {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl EaFile for Accepting {
        fn set_ea(&self, _: Handle, _: &[u8]) -> Result<(), NtStatus> {
            self.hit();
            Ok(())
        }
        fn query_ea(&self, _: Handle, _: usize) -> Result<EaBuffer, NtStatus> {
            self.hit();
            Err(NtStatus::NO_EAS_ON_FILE)
        }
    }

    impl EaInfo for Accepting {
        fn query_ea_information(&self, _: Handle) -> Result<FileEaInformation, NtStatus> {
            self.hit();
            Ok(FileEaInformation::default())
        }
        fn query_all_information(&self, _: Handle) -> Result<FileAllInformation, NtStatus> {
            self.hit();
            Ok(FileAllInformation::default())
        }
    }

    impl EaDir for Accepting {
        fn query_directory(
            &self,
            _: &Path,
            _: &str,
            _: DirInfoClass,
        ) -> Result<Vec<DirEntryInfo>, NtStatus> {
            self.hit();
            Ok(Vec::new())
        }
    }

    impl EaHandles for Accepting {
        fn open(&self, _: &Path, _: Disposition) -> Result<Handle, NtStatus> {
            self.hit();
            Ok(Handle(1))
        }
        fn close(&self, _: Handle) -> Result<(), NtStatus> {
            self.hit();
            Ok(())
        }
    }

    #[test]
    fn split_path_separates_name() {
        let (dir, name) = split_path(Path::new("/test/ea1")).unwrap();
        assert_eq!(dir, Path::new("/test"));
        assert_eq!(name, "ea1");
    }

    #[test]
    fn split_path_rejects_root() {
        match split_path(Path::new("/")) {
            Err(EaError::InvalidPath { path }) => assert_eq!(path, Path::new("/")),
            other => panic!("expected InvalidPath, got {other:?}"),
        }
    }

    #[test]
    fn verify_file_rejects_path_without_calling_backend() {
        let fs = Accepting::default();
        let checker = EaChecker::new(&fs, CheckOptions::default());
        assert!(matches!(
            checker.verify_file(Path::new("/")),
            Err(EaError::InvalidPath { .. })
        ));
        assert_eq!(fs.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn with_expected_predicts_with_configured_policy() {
        let fs = Accepting::default();
        let seeded = LiveSet::new().apply(&[("a", "1"), ("b", "2")]).unwrap();
        let options = CheckOptions::default().with_replace_policy(ReplacePolicy::MoveToEnd);
        let mut checker = EaChecker::with_expected(&fs, options, seeded);

        assert_eq!(checker.expected().policy(), ReplacePolicy::MoveToEnd);
        checker.write(Handle(1), &[("A", "3")]).unwrap();

        let records: Vec<_> = checker
            .expected()
            .records()
            .iter()
            .map(|r| (r.name.as_slice(), r.value.as_slice()))
            .collect();
        assert_eq!(records, [(&b"b"[..], &b"2"[..]), (&b"a"[..], &b"3"[..])]);
    }
}
