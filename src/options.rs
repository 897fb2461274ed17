//! Knobs for how the oracle drives and judges a filesystem.

use crate::{DirInfoClass, ReplacePolicy};

/// Read capacity the reference scenario uses.
pub const DEFAULT_READ_CAPACITY: usize = 4096;

/// Options for [`EaChecker`](crate::EaChecker) and the standard suite.
///
/// # Example
///
/// ```rust
/// use ea_oracle::{CheckOptions, ReplacePolicy};
///
/// let options = CheckOptions::default()
///     .with_read_capacity(65536)
///     .with_replace_policy(ReplacePolicy::MoveToEnd);
/// assert!(options.expect_name_uppercased);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CheckOptions {
    /// Buffer capacity passed to the read call.
    pub read_capacity: usize,
    /// Whether the filesystem stores names uppercased.
    pub expect_name_uppercased: bool,
    /// How the filesystem orders a replaced attribute.
    pub replace_policy: ReplacePolicy,
    /// Close the handle before querying directory entries.
    ///
    /// Some filesystems only propagate EA sizes to directory entries on close.
    pub reopen_before_dir_query: bool,
    /// Directory-entry shapes to cross-check.
    pub dir_classes: Vec<DirInfoClass>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            read_capacity: DEFAULT_READ_CAPACITY,
            expect_name_uppercased: true,
            replace_policy: ReplacePolicy::InPlace,
            reopen_before_dir_query: true,
            dir_classes: DirInfoClass::ALL.to_vec(),
        }
    }
}

impl CheckOptions {
    /// Set the read capacity.
    pub fn with_read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity;
        self
    }

    /// Set whether names are expected back uppercased.
    pub fn with_uppercase_names(mut self, uppercase: bool) -> Self {
        self.expect_name_uppercased = uppercase;
        self
    }

    /// Set the replacement policy.
    pub fn with_replace_policy(mut self, policy: ReplacePolicy) -> Self {
        self.replace_policy = policy;
        self
    }

    /// Set whether handles are closed before directory queries.
    pub fn with_reopen_before_dir_query(mut self, reopen: bool) -> Self {
        self.reopen_before_dir_query = reopen;
        self
    }

    /// Restrict the directory-entry shapes that are checked.
    pub fn with_dir_classes(mut self, classes: impl Into<Vec<DirInfoClass>>) -> Self {
        self.dir_classes = classes.into();
        self
    }
}
