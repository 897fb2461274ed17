//! # Collaborator Traits
//!
//! The operations through which the oracle reaches the filesystem under test.
//!
//! ## Components
//!
//! | Trait | Operations | Purpose |
//! |-------|------------|---------|
//! | [`EaFile`] | `set_ea`, `query_ea` | Write and read attribute buffers |
//! | [`EaInfo`] | `query_ea_information`, `query_all_information` | Per-handle size queries |
//! | [`EaDir`] | `query_directory` | Directory-entry size queries |
//! | [`EaHandles`] | `open`, `close` | Handle lifecycle |
//!
//! ## Blanket Implementation
//!
//! [`EaFs`] is implemented for any type that implements all four components.
//! Implement the components and the checker accepts the backend:
//!
//! ```rust
//! use ea_oracle::*;
//! use std::path::Path;
//!
//! struct MyBackend;
//!
//! # impl EaFile for MyBackend {
//! #     fn set_ea(&self, _: Handle, _: &[u8]) -> Result<(), NtStatus> { Ok(()) }
//! #     fn query_ea(&self, _: Handle, _: usize) -> Result<EaBuffer, NtStatus> { Err(NtStatus::NO_EAS_ON_FILE) }
//! # }
//! # impl EaInfo for MyBackend {
//! #     fn query_ea_information(&self, _: Handle) -> Result<FileEaInformation, NtStatus> { Ok(Default::default()) }
//! #     fn query_all_information(&self, _: Handle) -> Result<FileAllInformation, NtStatus> { Ok(Default::default()) }
//! # }
//! # impl EaDir for MyBackend {
//! #     fn query_directory(&self, _: &Path, _: &str, _: DirInfoClass) -> Result<Vec<DirEntryInfo>, NtStatus> { Ok(vec![]) }
//! # }
//! # impl EaHandles for MyBackend {
//! #     fn open(&self, _: &Path, _: Disposition) -> Result<Handle, NtStatus> { Ok(Handle(1)) }
//! #     fn close(&self, _: Handle) -> Result<(), NtStatus> { Ok(()) }
//! # }
//! fn use_fs<B: EaFs>(_backend: &B) {}
//! use_fs(&MyBackend);
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Backends use interior
//! mutability for their state.

mod ea_dir;
mod ea_file;
mod ea_handles;
mod ea_info;

pub use ea_dir::EaDir;
pub use ea_file::EaFile;
pub use ea_handles::EaHandles;
pub use ea_info::EaInfo;

/// A filesystem the oracle can drive end to end.
///
/// Automatically implemented for any type implementing [`EaFile`],
/// [`EaInfo`], [`EaDir`], and [`EaHandles`].
pub trait EaFs: EaFile + EaInfo + EaDir + EaHandles {}

// Blanket implementation
impl<T: EaFile + EaInfo + EaDir + EaHandles> EaFs for T {}
