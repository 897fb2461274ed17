//! Core types shared by the codec, the oracle, and the collaborator traits.

use std::fmt;

use bitflags::bitflags;

/// Opaque file handle issued by the filesystem under test.
///
/// The internal value is collaborator-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle(pub u64);

/// How a handle is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Disposition {
    /// Create a new file; fail if it already exists.
    Create,
    /// Open an existing file; fail if it does not exist.
    Open,
}

/// Status code returned by the filesystem under test.
///
/// Values follow the NTSTATUS layout: the top bit set means failure,
/// `0x8000_0000`-class values are warnings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NtStatus(pub u32);

impl NtStatus {
    /// The call succeeded.
    pub const SUCCESS: Self = Self(0x0000_0000);
    /// The output was truncated to fit the buffer.
    pub const BUFFER_OVERFLOW: Self = Self(0x8000_0005);
    /// An EA name contains characters the filesystem rejects.
    pub const INVALID_EA_NAME: Self = Self(0x8000_0013);
    /// A submitted EA buffer failed validation.
    pub const EA_LIST_INCONSISTENT: Self = Self(0x8000_0014);
    /// The handle is closed or was never issued.
    pub const INVALID_HANDLE: Self = Self(0xC000_0008);
    /// A parameter was rejected.
    pub const INVALID_PARAMETER: Self = Self(0xC000_000D);
    /// No file matched a directory query.
    pub const NO_SUCH_FILE: Self = Self(0xC000_000F);
    /// The supplied buffer cannot hold even one record.
    pub const BUFFER_TOO_SMALL: Self = Self(0xC000_0023);
    /// The path does not exist.
    pub const OBJECT_NAME_NOT_FOUND: Self = Self(0xC000_0034);
    /// The path already exists.
    pub const OBJECT_NAME_COLLISION: Self = Self(0xC000_0035);
    /// The file carries no extended attributes.
    pub const NO_EAS_ON_FILE: Self = Self(0xC000_0052);

    /// Returns `true` for success and informational codes.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 & 0x8000_0000 == 0
    }

    /// Symbolic name for the well-known codes.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "STATUS_SUCCESS",
            Self::BUFFER_OVERFLOW => "STATUS_BUFFER_OVERFLOW",
            Self::INVALID_EA_NAME => "STATUS_INVALID_EA_NAME",
            Self::EA_LIST_INCONSISTENT => "STATUS_EA_LIST_INCONSISTENT",
            Self::INVALID_HANDLE => "STATUS_INVALID_HANDLE",
            Self::INVALID_PARAMETER => "STATUS_INVALID_PARAMETER",
            Self::NO_SUCH_FILE => "STATUS_NO_SUCH_FILE",
            Self::BUFFER_TOO_SMALL => "STATUS_BUFFER_TOO_SMALL",
            Self::OBJECT_NAME_NOT_FOUND => "STATUS_OBJECT_NAME_NOT_FOUND",
            Self::OBJECT_NAME_COLLISION => "STATUS_OBJECT_NAME_COLLISION",
            Self::NO_EAS_ON_FILE => "STATUS_NO_EAS_ON_FILE",
            _ => return None,
        })
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#010x})", self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({self})")
    }
}

bitflags! {
    /// Per-record EA flags.
    ///
    /// Unknown bits are retained on decode so the oracle can report them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EaFlags: u8 {
        /// The file cannot be interpreted without this attribute.
        const NEED_EA = 0x80;
    }
}

/// One extended attribute: a flags byte, a name, and a value.
///
/// A zero-length value in a write request deletes the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EaRecord {
    /// Record flags; empty in all normal traffic.
    pub flags: EaFlags,
    /// Attribute name, matched case-insensitively by the filesystem.
    pub name: Vec<u8>,
    /// Attribute value.
    pub value: Vec<u8>,
}

impl EaRecord {
    /// Create a record with no flags.
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            flags: EaFlags::empty(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Set the record's flags.
    pub fn with_flags(mut self, flags: EaFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns `true` if `name` matches this record's name, ignoring ASCII case.
    #[inline]
    pub fn name_matches(&self, name: &[u8]) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns `true` if submitting this record deletes its name.
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.value.is_empty()
    }
}

/// A contiguous buffer of offset-chained EA records.
///
/// Self-describing: the last record carries a zero next-entry offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EaBuffer(Vec<u8>);

impl EaBuffer {
    /// Wrap raw bytes without validating them.
    #[inline]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the raw bytes.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for EaBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EaBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Result of the size-only metadata query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileEaInformation {
    /// Total encoded size of the file's live EA set.
    pub ea_size: u32,
}

/// Result of the combined metadata query.
///
/// Embeds the same [`FileEaInformation`] the size-only query returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileAllInformation {
    /// Logical file size in bytes.
    pub end_of_file: u64,
    /// Bytes allocated on disk.
    pub allocation_size: u64,
    /// Number of hard links.
    pub number_of_links: u32,
    /// Whether a delete is pending on close.
    pub delete_pending: bool,
    /// Whether the file is a directory.
    pub directory: bool,
    /// Filesystem-unique file index.
    pub index_number: u64,
    /// The embedded EA size block.
    pub ea_information: FileEaInformation,
    /// File name as known to the handle.
    pub file_name: String,
}

/// The six directory-entry record shapes that carry an EA size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirInfoClass {
    /// Common fields only.
    FullDirectory,
    /// Adds a 64-bit file id.
    IdFullDirectory,
    /// Adds a short (8.3) name.
    BothDirectory,
    /// Adds a short name and a 64-bit file id.
    IdBothDirectory,
    /// Adds a 128-bit file id and a reparse tag.
    IdExtdDirectory,
    /// Adds a 128-bit file id, a reparse tag, and a short name.
    IdExtdBothDirectory,
}

impl DirInfoClass {
    /// All six shapes, in the order the reference scenario checks them.
    pub const ALL: [DirInfoClass; 6] = [
        DirInfoClass::FullDirectory,
        DirInfoClass::IdFullDirectory,
        DirInfoClass::BothDirectory,
        DirInfoClass::IdBothDirectory,
        DirInfoClass::IdExtdDirectory,
        DirInfoClass::IdExtdBothDirectory,
    ];

    /// The record shape's conventional name.
    pub const fn label(self) -> &'static str {
        match self {
            DirInfoClass::FullDirectory => "FILE_FULL_DIR_INFORMATION",
            DirInfoClass::IdFullDirectory => "FILE_ID_FULL_DIR_INFORMATION",
            DirInfoClass::BothDirectory => "FILE_BOTH_DIR_INFORMATION",
            DirInfoClass::IdBothDirectory => "FILE_ID_BOTH_DIR_INFORMATION",
            DirInfoClass::IdExtdDirectory => "FILE_ID_EXTD_DIR_INFORMATION",
            DirInfoClass::IdExtdBothDirectory => "FILE_ID_EXTD_BOTH_DIR_INFORMATION",
        }
    }

    /// Returns `true` if the shape carries a short name.
    pub const fn has_short_name(self) -> bool {
        matches!(
            self,
            DirInfoClass::BothDirectory
                | DirInfoClass::IdBothDirectory
                | DirInfoClass::IdExtdBothDirectory
        )
    }

    /// Returns `true` if the shape carries a 64-bit file id.
    pub const fn has_file_id(self) -> bool {
        matches!(
            self,
            DirInfoClass::IdFullDirectory | DirInfoClass::IdBothDirectory
        )
    }

    /// Returns `true` if the shape carries a 128-bit file id.
    pub const fn has_extended_file_id(self) -> bool {
        matches!(
            self,
            DirInfoClass::IdExtdDirectory | DirInfoClass::IdExtdBothDirectory
        )
    }
}

impl fmt::Display for DirInfoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields every directory-entry shape carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntryCommon {
    /// Position hint within the directory.
    pub file_index: u32,
    /// Logical file size in bytes.
    pub end_of_file: u64,
    /// Bytes allocated on disk.
    pub allocation_size: u64,
    /// File attribute bits.
    pub file_attributes: u32,
    /// Total encoded size of the entry's live EA set.
    pub ea_size: u32,
    /// Long file name.
    pub file_name: String,
}

/// One directory-entry record, tagged by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirEntryInfo {
    /// `FILE_FULL_DIR_INFORMATION`.
    FullDirectory(DirEntryCommon),
    /// `FILE_ID_FULL_DIR_INFORMATION`.
    IdFullDirectory {
        /// Shared fields.
        common: DirEntryCommon,
        /// 64-bit file id.
        file_id: u64,
    },
    /// `FILE_BOTH_DIR_INFORMATION`.
    BothDirectory {
        /// Shared fields.
        common: DirEntryCommon,
        /// Short (8.3) name.
        short_name: String,
    },
    /// `FILE_ID_BOTH_DIR_INFORMATION`.
    IdBothDirectory {
        /// Shared fields.
        common: DirEntryCommon,
        /// Short (8.3) name.
        short_name: String,
        /// 64-bit file id.
        file_id: u64,
    },
    /// `FILE_ID_EXTD_DIR_INFORMATION`.
    IdExtdDirectory {
        /// Shared fields.
        common: DirEntryCommon,
        /// 128-bit file id.
        file_id: [u8; 16],
        /// Reparse point tag, 0 if none.
        reparse_point_tag: u32,
    },
    /// `FILE_ID_EXTD_BOTH_DIR_INFORMATION`.
    IdExtdBothDirectory {
        /// Shared fields.
        common: DirEntryCommon,
        /// 128-bit file id.
        file_id: [u8; 16],
        /// Reparse point tag, 0 if none.
        reparse_point_tag: u32,
        /// Short (8.3) name.
        short_name: String,
    },
}

impl DirEntryInfo {
    /// Build a record of the given shape, filling the shape's extra fields
    /// from `file_id` and `short_name`.
    ///
    /// The 128-bit id is the 64-bit id zero-extended, little-endian.
    pub fn new(class: DirInfoClass, common: DirEntryCommon, file_id: u64, short_name: &str) -> Self {
        let mut extended = [0u8; 16];
        extended[..8].copy_from_slice(&file_id.to_le_bytes());
        let short_name = short_name.to_owned();

        match class {
            DirInfoClass::FullDirectory => DirEntryInfo::FullDirectory(common),
            DirInfoClass::IdFullDirectory => DirEntryInfo::IdFullDirectory { common, file_id },
            DirInfoClass::BothDirectory => DirEntryInfo::BothDirectory { common, short_name },
            DirInfoClass::IdBothDirectory => DirEntryInfo::IdBothDirectory {
                common,
                short_name,
                file_id,
            },
            DirInfoClass::IdExtdDirectory => DirEntryInfo::IdExtdDirectory {
                common,
                file_id: extended,
                reparse_point_tag: 0,
            },
            DirInfoClass::IdExtdBothDirectory => DirEntryInfo::IdExtdBothDirectory {
                common,
                file_id: extended,
                reparse_point_tag: 0,
                short_name,
            },
        }
    }

    /// The record's shape.
    pub fn class(&self) -> DirInfoClass {
        match self {
            DirEntryInfo::FullDirectory(_) => DirInfoClass::FullDirectory,
            DirEntryInfo::IdFullDirectory { .. } => DirInfoClass::IdFullDirectory,
            DirEntryInfo::BothDirectory { .. } => DirInfoClass::BothDirectory,
            DirEntryInfo::IdBothDirectory { .. } => DirInfoClass::IdBothDirectory,
            DirEntryInfo::IdExtdDirectory { .. } => DirInfoClass::IdExtdDirectory,
            DirEntryInfo::IdExtdBothDirectory { .. } => DirInfoClass::IdExtdBothDirectory,
        }
    }

    /// Fields shared by every shape.
    pub fn common(&self) -> &DirEntryCommon {
        match self {
            DirEntryInfo::FullDirectory(common)
            | DirEntryInfo::IdFullDirectory { common, .. }
            | DirEntryInfo::BothDirectory { common, .. }
            | DirEntryInfo::IdBothDirectory { common, .. }
            | DirEntryInfo::IdExtdDirectory { common, .. }
            | DirEntryInfo::IdExtdBothDirectory { common, .. } => common,
        }
    }

    /// The entry's reported EA size.
    #[inline]
    pub fn ea_size(&self) -> u32 {
        self.common().ea_size
    }

    /// The entry's long file name.
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.common().file_name
    }

    /// The short name, for shapes that carry one.
    pub fn short_name(&self) -> Option<&str> {
        match self {
            DirEntryInfo::BothDirectory { short_name, .. }
            | DirEntryInfo::IdBothDirectory { short_name, .. }
            | DirEntryInfo::IdExtdBothDirectory { short_name, .. } => Some(short_name),
            _ => None,
        }
    }

    /// The 64-bit file id, for shapes that carry one.
    pub fn file_id(&self) -> Option<u64> {
        match self {
            DirEntryInfo::IdFullDirectory { file_id, .. }
            | DirEntryInfo::IdBothDirectory { file_id, .. } => Some(*file_id),
            _ => None,
        }
    }

    /// The 128-bit file id, for shapes that carry one.
    pub fn extended_file_id(&self) -> Option<&[u8; 16]> {
        match self {
            DirEntryInfo::IdExtdDirectory { file_id, .. }
            | DirEntryInfo::IdExtdBothDirectory { file_id, .. } => Some(file_id),
            _ => None,
        }
    }
}

/// Which query path reported an EA size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizeSource {
    /// The size-only query.
    EaInformation,
    /// The combined metadata query.
    AllInformation,
    /// A directory-entry query of the given shape.
    DirEntry(DirInfoClass),
}

impl SizeSource {
    /// Both handle queries followed by every directory-entry shape.
    pub fn iter_all() -> impl Iterator<Item = SizeSource> {
        [SizeSource::EaInformation, SizeSource::AllInformation]
            .into_iter()
            .chain(DirInfoClass::ALL.into_iter().map(SizeSource::DirEntry))
    }
}

impl fmt::Display for SizeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSource::EaInformation => f.write_str("FileEaInformation"),
            SizeSource::AllInformation => f.write_str("FileAllInformation"),
            SizeSource::DirEntry(class) => write!(f, "directory entry ({class})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_success_bit() {
        assert!(NtStatus::SUCCESS.is_success());
        assert!(!NtStatus::BUFFER_OVERFLOW.is_success());
        assert!(!NtStatus::NO_EAS_ON_FILE.is_success());
    }

    #[test]
    fn status_display() {
        assert_eq!(
            NtStatus::BUFFER_TOO_SMALL.to_string(),
            "STATUS_BUFFER_TOO_SMALL (0xc0000023)"
        );
        assert_eq!(NtStatus(0xC000_0001).to_string(), "0xc0000001");
        assert_eq!(NtStatus(0xC000_0001).name(), None);
    }

    #[test]
    fn record_name_matching_ignores_case() {
        let record = EaRecord::new("HELLO", "world");
        assert!(record.name_matches(b"hello"));
        assert!(record.name_matches(b"HeLlO"));
        assert!(!record.name_matches(b"hell"));
        assert!(!record.is_delete());
        assert!(EaRecord::new("HELLO", "").is_delete());
    }

    #[test]
    fn flags_keep_unknown_bits() {
        let flags = EaFlags::from_bits_retain(0x81);
        assert!(flags.contains(EaFlags::NEED_EA));
        assert_eq!(flags.bits(), 0x81);
        assert_eq!(EaFlags::default().bits(), 0);
    }

    #[test]
    fn dir_info_class_capabilities() {
        for class in DirInfoClass::ALL {
            let entry = DirEntryInfo::new(class, DirEntryCommon::default(), 7, "EA1");
            assert_eq!(entry.class(), class);
            assert_eq!(entry.short_name().is_some(), class.has_short_name());
            assert_eq!(entry.file_id().is_some(), class.has_file_id());
            assert_eq!(
                entry.extended_file_id().is_some(),
                class.has_extended_file_id()
            );
        }
    }

    #[test]
    fn extended_id_is_zero_extended() {
        let entry = DirEntryInfo::new(
            DirInfoClass::IdExtdDirectory,
            DirEntryCommon::default(),
            0x0102,
            "",
        );
        let id = entry.extended_file_id().unwrap();
        assert_eq!(&id[..2], &[0x02, 0x01]);
        assert!(id[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn dir_entry_shared_accessors() {
        let common = DirEntryCommon {
            ea_size: 20,
            file_name: "ea1".into(),
            ..Default::default()
        };
        let entry = DirEntryInfo::new(DirInfoClass::IdExtdBothDirectory, common, 3, "EA1");
        assert_eq!(entry.ea_size(), 20);
        assert_eq!(entry.file_name(), "ea1");
        assert_eq!(entry.short_name(), Some("EA1"));
    }

    #[test]
    fn size_source_display() {
        assert_eq!(SizeSource::EaInformation.to_string(), "FileEaInformation");
        assert_eq!(SizeSource::AllInformation.to_string(), "FileAllInformation");
        assert_eq!(
            SizeSource::DirEntry(DirInfoClass::FullDirectory).to_string(),
            "directory entry (FILE_FULL_DIR_INFORMATION)"
        );
    }

    #[test]
    fn size_sources_cover_eight_paths() {
        let all: Vec<_> = SizeSource::iter_all().collect();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], SizeSource::EaInformation);
        assert_eq!(all[7], SizeSource::DirEntry(DirInfoClass::IdExtdBothDirectory));
    }

    #[test]
    fn ea_buffer_roundtrips_bytes() {
        let buf = EaBuffer::from(vec![1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_empty());
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
        assert_eq!(buf.into_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Handle>();
        assert_send_sync::<NtStatus>();
        assert_send_sync::<EaRecord>();
        assert_send_sync::<EaBuffer>();
        assert_send_sync::<DirEntryInfo>();
        assert_send_sync::<SizeSource>();
    }
}
