//! # Layer Trait
//!
//! Tower-style middleware composition for collaborator backends.
//!
//! ## How It Works
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! [`LogLayer`] is the provided middleware: it wraps any backend in
//! [`Logged`], which records every call and its status through the `log`
//! facade before passing the result on unchanged.
//!
//! ## Example
//!
//! ```rust
//! use ea_oracle::{EaFs, LayerExt, LogLayer};
//!
//! fn traced<B: EaFs>(backend: B) -> impl EaFs {
//!     backend.layer(LogLayer::new(log::Level::Debug))
//! }
//! ```

use std::path::Path;

use log::Level;

use crate::{
    DirEntryInfo, DirInfoClass, Disposition, EaBuffer, EaDir, EaFile, EaFs, EaHandles, EaInfo,
    FileAllInformation, FileEaInformation, Handle, NtStatus,
};

/// A layer that wraps a backend to add functionality.
///
/// Inspired by Tower's `Layer` trait, this enables composable middleware.
pub trait Layer<B> {
    /// The resulting backend type after applying this layer.
    type Backend;

    /// Wrap the given backend with this layer's functionality.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait for fluent layer composition.
pub trait LayerExt: EaFs + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

// Blanket implementation - any EaFs backend gets LayerExt for free
impl<B: EaFs> LayerExt for B {}

/// Layer that logs every collaborator call.
#[derive(Debug, Clone, Copy)]
pub struct LogLayer {
    level: Level,
}

impl LogLayer {
    /// Log calls at `level`. Failures are always logged at `Warn` or above.
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LogLayer {
    fn default() -> Self {
        Self::new(Level::Debug)
    }
}

impl<B: EaFs> Layer<B> for LogLayer {
    type Backend = Logged<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Logged {
            inner: backend,
            level: self.level,
        }
    }
}

/// Backend wrapper produced by [`LogLayer`].
#[derive(Debug)]
pub struct Logged<B> {
    inner: B,
    level: Level,
}

impl<B> Logged<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwrap the backend.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn record<T>(
        &self,
        call: std::fmt::Arguments<'_>,
        result: Result<T, NtStatus>,
    ) -> Result<T, NtStatus> {
        match &result {
            Ok(_) => log::log!(self.level, "{call}: ok"),
            Err(status) => log::log!(self.level.min(Level::Warn), "{call}: {status}"),
        }
        result
    }
}

impl<B: EaFile> EaFile for Logged<B> {
    fn set_ea(&self, handle: Handle, buffer: &[u8]) -> Result<(), NtStatus> {
        let result = self.inner.set_ea(handle, buffer);
        self.record(
            format_args!("set_ea({}, {} bytes)", handle.0, buffer.len()),
            result,
        )
    }

    fn query_ea(&self, handle: Handle, capacity: usize) -> Result<EaBuffer, NtStatus> {
        let result = self.inner.query_ea(handle, capacity);
        self.record(format_args!("query_ea({}, {capacity})", handle.0), result)
    }
}

impl<B: EaInfo> EaInfo for Logged<B> {
    fn query_ea_information(&self, handle: Handle) -> Result<FileEaInformation, NtStatus> {
        let result = self.inner.query_ea_information(handle);
        self.record(format_args!("query_ea_information({})", handle.0), result)
    }

    fn query_all_information(&self, handle: Handle) -> Result<FileAllInformation, NtStatus> {
        let result = self.inner.query_all_information(handle);
        self.record(format_args!("query_all_information({})", handle.0), result)
    }
}

impl<B: EaDir> EaDir for Logged<B> {
    fn query_directory(
        &self,
        dir: &Path,
        name: &str,
        class: DirInfoClass,
    ) -> Result<Vec<DirEntryInfo>, NtStatus> {
        let result = self.inner.query_directory(dir, name, class);
        self.record(
            format_args!("query_directory({}, {name}, {class})", dir.display()),
            result,
        )
    }
}

impl<B: EaHandles> EaHandles for Logged<B> {
    fn open(&self, path: &Path, disposition: Disposition) -> Result<Handle, NtStatus> {
        let result = self.inner.open(path, disposition);
        self.record(
            format_args!("open({}, {disposition:?})", path.display()),
            result,
        )
    }

    fn close(&self, handle: Handle) -> Result<(), NtStatus> {
        let result = self.inner.close(handle);
        self.record(format_args!("close({})", handle.0), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Null;

    impl EaFile for Null {
        fn set_ea(&self, _: Handle, _: &[u8]) -> Result<(), NtStatus> {
            Ok(())
        }
        fn query_ea(&self, _: Handle, _: usize) -> Result<EaBuffer, NtStatus> {
            Err(NtStatus::NO_EAS_ON_FILE)
        }
    }

    impl EaInfo for Null {
        fn query_ea_information(&self, _: Handle) -> Result<FileEaInformation, NtStatus> {
            Ok(FileEaInformation::default())
        }
        fn query_all_information(&self, _: Handle) -> Result<FileAllInformation, NtStatus> {
            Ok(FileAllInformation::default())
        }
    }

    impl EaDir for Null {
        fn query_directory(
            &self,
            _: &Path,
            _: &str,
            _: DirInfoClass,
        ) -> Result<Vec<DirEntryInfo>, NtStatus> {
            Err(NtStatus::NO_SUCH_FILE)
        }
    }

    impl EaHandles for Null {
        fn open(&self, _: &Path, _: Disposition) -> Result<Handle, NtStatus> {
            Ok(Handle(7))
        }
        fn close(&self, _: Handle) -> Result<(), NtStatus> {
            Ok(())
        }
    }

    #[test]
    fn layer_ext_is_auto_implemented() {
        fn _check<B: EaFs + LayerExt>() {}
    }

    #[test]
    fn logged_backend_passes_results_through() {
        let logged = Null.layer(LogLayer::default());

        fn _takes_fs<T: EaFs>(_: &T) {}
        _takes_fs(&logged);

        assert_eq!(logged.open(Path::new("/ea1"), Disposition::Create), Ok(Handle(7)));
        assert_eq!(logged.query_ea(Handle(7), 4096), Err(NtStatus::NO_EAS_ON_FILE));
        assert_eq!(
            logged.query_directory(Path::new("/"), "ea1", DirInfoClass::FullDirectory),
            Err(NtStatus::NO_SUCH_FILE)
        );
        assert!(logged.set_ea(Handle(7), &[]).is_ok());
        let _inner: Null = logged.into_inner();
    }
}
