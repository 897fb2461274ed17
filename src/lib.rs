//! # ea-oracle
//!
//! Codec and consistency oracle for **NTFS-style extended attributes** (EAs).
//!
//! This crate encodes and decodes the chained `FILE_FULL_EA_INFORMATION`
//! record format, predicts the live EA set a filesystem should hold after a
//! sequence of upserts, and checks that every size-reporting path agrees
//! with that prediction. The filesystem itself is reached only through
//! collaborator traits, so the same checks run against a driver, an FFI
//! shim, or an in-memory stand-in.
//!
//! ---
//!
//! ## Quick Start
//!
//! Most users only need [`run_standard_suite`]. It replays the reference
//! scenario and reports each step:
//!
//! ```rust
//! use ea_oracle::{run_standard_suite, CheckOptions, EaFs};
//! use std::path::Path;
//!
//! fn check<B: EaFs>(backend: &B) -> bool {
//!     let report = run_standard_suite(backend, Path::new("/test"), &CheckOptions::default());
//!     report.passed()
//! }
//! ```
//!
//! For custom scenarios drive an [`EaChecker`] directly.
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`EaRecord`] | One attribute: flags, name, value |
//! | [`LiveSet`] | Predicted live attribute set with upsert semantics |
//! | [`EaChecker`] | Drives writes and verifies every query path |
//! | [`EaFs`] | Everything a filesystem under test must provide |
//! | [`EaError`] | Error type naming the check that failed |
//! | [`SizeSource`] | Which query path reported a size |
//!
//! ---
//!
//! ## Wire Format
//!
//! Each record is an 8-byte header (next-entry offset, flags, name length,
//! value length, all little-endian), the name, a zero byte, the value, and
//! zero padding to a 4-byte boundary. The last record has next-entry offset
//! 0. See [`codec`].
//!
//! ```rust
//! use ea_oracle::codec;
//!
//! assert_eq!(codec::encoded_size(b"hello", b"world").unwrap(), 20);
//! ```
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! EaFile + EaInfo + EaDir + EaHandles = EaFs
//! ```
//!
//! [`EaFs`] has a **blanket implementation**. Implement the component traits
//! and the checker accepts the backend.
//!
//! ---
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, EaError>`. Errors include
//! context:
//!
//! ```rust
//! use ea_oracle::{DirInfoClass, EaError, SizeSource};
//!
//! let err = EaError::SizeMismatch {
//!     reported_by: SizeSource::DirEntry(DirInfoClass::FullDirectory),
//!     expected: 20,
//!     reported: 0,
//! };
//! assert_eq!(
//!     err.to_string(),
//!     "directory entry (FILE_FULL_DIR_INFORMATION): EaSize was 0, expected 20"
//! );
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self` (not `&mut self`).
//! Backends use interior mutability internally.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`CheckOptions`], [`SuiteReport`], and the core types |

// Private modules
mod checker;
mod error;
mod ext;
mod layer;
mod live_set;
mod options;
mod suite;
mod traits;
mod types;

// Public modules
pub mod codec;
pub mod oracle;

// Public re-exports - error types
pub use error::EaError;

// Public re-exports - core types
pub use types::{
    DirEntryCommon, DirEntryInfo, DirInfoClass, Disposition, EaBuffer, EaFlags, EaRecord,
    FileAllInformation, FileEaInformation, Handle, NtStatus, SizeSource,
};

// Public re-exports - model and configuration
pub use live_set::{LiveSet, ReplacePolicy, SlotState};
pub use options::{CheckOptions, DEFAULT_READ_CAPACITY};

// Public re-exports - verification
pub use checker::EaChecker;
pub use oracle::{expected_total_size, verify_roundtrip, verify_size_consistency};
pub use suite::{StepOutcome, SuiteReport, run_standard_suite};

// Public re-exports - collaborator traits
pub use traits::{EaDir, EaFile, EaFs, EaHandles, EaInfo};

// Public re-exports - infrastructure
pub use ext::EaFsExt;
pub use layer::{Layer, LayerExt, LogLayer, Logged};
