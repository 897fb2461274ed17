//! # Live-Set Model
//!
//! Predicts the attribute set a filesystem holds after a sequence of writes.
//!
//! The filesystem under test applies these rules to every record of a write
//! request, in buffer order:
//!
//! | Submitted | Name already live? | Result |
//! |-----------|--------------------|--------|
//! | non-empty value | no  | appended after all live names |
//! | non-empty value | yes | value replaced (position per [`ReplacePolicy`]) |
//! | empty value     | yes | name removed |
//! | empty value     | no  | nothing happens |
//!
//! Names match ignoring ASCII case. The model never performs I/O, so the
//! prediction logic is testable on its own.

use crate::codec::check_lengths;
use crate::{EaError, EaRecord};

/// Where a replaced attribute sits in iteration order afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplacePolicy {
    /// The slot keeps its position.
    #[default]
    InPlace,
    /// Replace behaves as delete followed by append.
    MoveToEnd,
}

/// State of one named attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// No live attribute has this name.
    Absent,
    /// A live attribute has this name.
    Present,
}

/// The post-merge collection of attributes on one file.
///
/// # Example
///
/// ```rust
/// use ea_oracle::LiveSet;
///
/// let set = LiveSet::new()
///     .apply(&[("hello", "world")]).unwrap()
///     .apply(&[("fOo", "bar")]).unwrap()
///     .apply(&[("HELlo", "")]).unwrap();
///
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.get(b"FOO").unwrap().value, b"bar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveSet {
    records: Vec<EaRecord>,
    policy: ReplacePolicy,
}

impl LiveSet {
    /// An empty set with in-place replacement.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty set using the given replacement policy.
    pub fn with_policy(policy: ReplacePolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    /// The replacement policy this set predicts with.
    #[inline]
    pub fn policy(&self) -> ReplacePolicy {
        self.policy
    }

    /// Keep the live records, predicting later replacements with `policy`.
    pub fn into_policy(mut self, policy: ReplacePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Live records in iteration order.
    #[inline]
    pub fn records(&self) -> &[EaRecord] {
        &self.records
    }

    /// Number of live names.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the read path should report no EAs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a live record by name, ignoring ASCII case.
    pub fn get(&self, name: &[u8]) -> Option<&EaRecord> {
        self.records.iter().find(|r| r.name_matches(name))
    }

    /// Slot state for `name`.
    pub fn state(&self, name: &[u8]) -> SlotState {
        match self.get(name) {
            Some(_) => SlotState::Present,
            None => SlotState::Absent,
        }
    }

    /// Predict the set after a write request, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// - [`EaError::InvalidLength`] if any record could not be encoded; the
    ///   prediction is all-or-nothing
    pub fn apply<N, V>(&self, request: &[(N, V)]) -> Result<LiveSet, EaError>
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        for (name, value) in request {
            check_lengths(name.as_ref(), value.as_ref())?;
        }

        let mut next = self.clone();
        for (name, value) in request {
            next.merge(name.as_ref(), value.as_ref());
        }
        Ok(next)
    }

    /// Apply a single upsert or delete in place.
    pub fn write(&mut self, name: &[u8], value: &[u8]) -> Result<SlotState, EaError> {
        check_lengths(name, value)?;
        self.merge(name, value);
        Ok(self.state(name))
    }

    fn merge(&mut self, name: &[u8], value: &[u8]) {
        let existing = self.records.iter().position(|r| r.name_matches(name));

        match (existing, value.is_empty()) {
            (None, true) => {
                log::debug!("EA {}: absent, delete is a no-op", name.escape_ascii());
            }
            (None, false) => {
                log::debug!("EA {}: absent -> present", name.escape_ascii());
                self.records.push(EaRecord::new(name, value));
            }
            (Some(i), true) => {
                log::debug!("EA {}: present -> absent", name.escape_ascii());
                self.records.remove(i);
            }
            (Some(i), false) => {
                log::debug!("EA {}: value replaced", name.escape_ascii());
                match self.policy {
                    ReplacePolicy::InPlace => self.records[i].value = value.to_vec(),
                    ReplacePolicy::MoveToEnd => {
                        let mut record = self.records.remove(i);
                        record.value = value.to_vec();
                        self.records.push(record);
                    }
                }
            }
        }
    }

    /// What a read should decode to.
    ///
    /// With `uppercase` set, names are folded the way a case-normalizing
    /// filesystem stores them.
    pub fn expected_read_back(&self, uppercase: bool) -> Vec<EaRecord> {
        self.records
            .iter()
            .map(|r| EaRecord {
                flags: r.flags,
                name: if uppercase {
                    r.name.to_ascii_uppercase()
                } else {
                    r.name.clone()
                },
                value: r.value.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &LiveSet) -> Vec<&[u8]> {
        set.records().iter().map(|r| r.name.as_slice()).collect()
    }

    #[test]
    fn absent_to_present_appends() {
        let set = LiveSet::new()
            .apply(&[("hello", "world")])
            .unwrap()
            .apply(&[("fOo", "bar")])
            .unwrap();
        assert_eq!(names(&set), vec![b"hello".as_slice(), b"fOo"]);
        assert_eq!(set.state(b"FOO"), SlotState::Present);
    }

    #[test]
    fn replace_keeps_position() {
        let set = LiveSet::new()
            .apply(&[("hello", "world"), ("fOo", "bar")])
            .unwrap()
            .apply(&[("HeLlO", "baz")])
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(names(&set), vec![b"hello".as_slice(), b"fOo"]);
        assert_eq!(set.get(b"HELLO").unwrap().value, b"baz");
    }

    #[test]
    fn replace_last_leaves_order_alone() {
        let set = LiveSet::new()
            .apply(&[("FOO", "bar"), ("HELLO", "world")])
            .unwrap()
            .apply(&[("hello", "baz")])
            .unwrap();
        let folded: Vec<_> = set
            .expected_read_back(true)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(folded, vec![b"FOO".to_vec(), b"HELLO".to_vec()]);
    }

    #[test]
    fn move_to_end_policy_reorders() {
        let set = LiveSet::with_policy(ReplacePolicy::MoveToEnd)
            .apply(&[("hello", "world"), ("fOo", "bar")])
            .unwrap()
            .apply(&[("HeLlO", "baz")])
            .unwrap();
        assert_eq!(names(&set), vec![b"fOo".as_slice(), b"hello"]);
        assert_eq!(set.policy(), ReplacePolicy::MoveToEnd);
    }

    #[test]
    fn empty_value_deletes() {
        let mut set = LiveSet::new();
        set.write(b"hello", b"world").unwrap();
        assert_eq!(set.write(b"HELlo", b"").unwrap(), SlotState::Absent);
        assert!(set.is_empty());
    }

    #[test]
    fn delete_of_absent_name_is_noop() {
        let set = LiveSet::new().apply(&[("ghost", "")]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.state(b"ghost"), SlotState::Absent);
    }

    #[test]
    fn request_applies_in_buffer_order() {
        let set = LiveSet::new()
            .apply(&[("a", "1"), ("A", "2"), ("b", "3"), ("a", "")])
            .unwrap();
        assert_eq!(names(&set), vec![b"b".as_slice()]);
    }

    #[test]
    fn apply_is_pure() {
        let before = LiveSet::new().apply(&[("x", "1")]).unwrap();
        let after = before.apply(&[("x", "")]).unwrap();
        assert_eq!(before.len(), 1);
        assert!(after.is_empty());
    }

    #[test]
    fn apply_rejects_whole_request_on_bad_length() {
        let before = LiveSet::new().apply(&[("x", "1")]).unwrap();
        let long = vec![b'n'; 256];
        let result = before.apply(&[(b"y".to_vec(), b"2".to_vec()), (long, b"3".to_vec())]);
        assert!(matches!(result, Err(EaError::InvalidLength { .. })));
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn expected_read_back_folds_case() {
        let set = LiveSet::new().apply(&[("qux", "xyzzy")]).unwrap();
        assert_eq!(set.expected_read_back(true)[0].name, b"QUX");
        assert_eq!(set.expected_read_back(false)[0].name, b"qux");
    }

    #[test]
    fn into_policy_keeps_records() {
        let set = LiveSet::new().apply(&[("a", "1"), ("b", "2")]).unwrap();
        let mut moved = set.clone().into_policy(ReplacePolicy::MoveToEnd);
        assert_eq!(moved.records(), set.records());

        moved.write(b"A", b"3").unwrap();
        assert_eq!(names(&moved), [&b"b"[..], &b"a"[..]]);
    }
}
