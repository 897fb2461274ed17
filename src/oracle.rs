//! # Consistency Oracle
//!
//! Expected sizes and the assertions that compare a filesystem's answers
//! against a [`LiveSet`] prediction.
//!
//! Every check reports the first divergence it finds.

use crate::codec::padded_len;
use crate::error::quoted;
use crate::{EaError, EaRecord, LiveSet, SizeSource};

/// Total encoded size of every live attribute.
///
/// This is the value the size-only query, the combined metadata query, and
/// every directory-entry shape must report. An empty set is 0. A total past
/// `u32::MAX` saturates.
pub fn expected_total_size(set: &LiveSet) -> u32 {
    total_size(set.records())
}

fn total_size<'a, I>(records: I) -> u32
where
    I: IntoIterator<Item = &'a EaRecord>,
{
    records.into_iter().fold(0u32, |total, r| {
        total.saturating_add(padded_len(r.name.len(), r.value.len()) as u32)
    })
}

/// Compare decoded records against the written set.
///
/// Each expected record is located in `read_back` by case-insensitive name.
/// It must be at the same position, carry empty flags, hold the same value,
/// and have either the uppercased name (`expect_name_uppercased`) or exactly
/// the written name.
///
/// # Errors
///
/// - [`EaError::ContentMismatch`] naming the first field that differs
pub fn verify_roundtrip(
    written: &[EaRecord],
    read_back: &[EaRecord],
    expect_name_uppercased: bool,
) -> Result<(), EaError> {
    if read_back.len() != written.len() {
        return Err(EaError::content(
            "EA list",
            "entry count",
            written.len().to_string(),
            read_back.len().to_string(),
        ));
    }

    for (i, expected) in written.iter().enumerate() {
        let context = format!("EA {i}");

        let Some(found) = read_back.iter().position(|r| r.name_matches(&expected.name)) else {
            return Err(EaError::content(
                context,
                "name",
                quoted(&expected.name),
                quoted(&read_back[i].name),
            ));
        };
        if found != i {
            return Err(EaError::content(
                format!("EA {}", quoted(&expected.name)),
                "position",
                i.to_string(),
                found.to_string(),
            ));
        }

        let actual = &read_back[i];
        if !actual.flags.is_empty() {
            return Err(EaError::content(
                context,
                "flags",
                "0".to_string(),
                format!("{:x}", actual.flags.bits()),
            ));
        }

        let expected_name = if expect_name_uppercased {
            expected.name.to_ascii_uppercase()
        } else {
            expected.name.clone()
        };
        if actual.name != expected_name {
            return Err(EaError::content(
                context,
                "name",
                quoted(&expected_name),
                quoted(&actual.name),
            ));
        }

        if actual.value != expected.value {
            return Err(EaError::content(
                context,
                "value",
                quoted(&expected.value),
                quoted(&actual.value),
            ));
        }
    }

    Ok(())
}

/// Check that every reported size equals `expected`.
///
/// # Errors
///
/// - [`EaError::SizeMismatch`] for the first source that disagrees
///
/// # Example
///
/// ```rust
/// use ea_oracle::{oracle, EaError, SizeSource};
///
/// let reported = [(SizeSource::EaInformation, 20), (SizeSource::AllInformation, 16)];
/// let err = oracle::verify_size_consistency(20, reported).unwrap_err();
/// assert!(matches!(err, EaError::SizeMismatch { reported_by: SizeSource::AllInformation, .. }));
/// ```
pub fn verify_size_consistency<I>(expected: u32, reported: I) -> Result<(), EaError>
where
    I: IntoIterator<Item = (SizeSource, u32)>,
{
    for (source, size) in reported {
        if size != expected {
            log::warn!("{source}: EaSize was {size}, expected {expected}");
            return Err(EaError::SizeMismatch {
                reported_by: source,
                expected,
                reported: size,
            });
        }
        log::debug!("{source}: EaSize {size} ok");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirInfoClass, EaFlags, codec};

    fn set(pairs: &[(&str, &str)]) -> LiveSet {
        LiveSet::new().apply(pairs).unwrap()
    }

    #[test]
    fn total_size_sums_padded_records() {
        let live = set(&[("HELLO", "world"), ("fOo", "bar")]);
        assert_eq!(
            expected_total_size(&live),
            codec::encoded_size(b"HELLO", b"world").unwrap()
                + codec::encoded_size(b"fOo", b"bar").unwrap()
        );
        assert_eq!(expected_total_size(&live), 36);
    }

    #[test]
    fn total_size_uses_post_merge_view() {
        let live = set(&[("hello", "world")])
            .apply(&[("HELLO", "a much longer value")])
            .unwrap();
        assert_eq!(
            expected_total_size(&live),
            codec::encoded_size(b"hello", b"a much longer value").unwrap()
        );
    }

    #[test]
    fn total_size_of_empty_set_is_zero() {
        let live = set(&[("x", "1")]).apply(&[("X", "")]).unwrap();
        assert_eq!(expected_total_size(&live), 0);
    }

    #[test]
    fn roundtrip_accepts_uppercased_names() {
        let live = set(&[("hello", "world")]);
        let read_back = vec![EaRecord::new("HELLO", "world")];
        verify_roundtrip(live.records(), &read_back, true).unwrap();
    }

    #[test]
    fn roundtrip_rejects_preserved_case_when_folding_expected() {
        let live = set(&[("hello", "world")]);
        let read_back = vec![EaRecord::new("hello", "world")];
        let err = verify_roundtrip(live.records(), &read_back, true).unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "name", .. }));
    }

    #[test]
    fn roundtrip_without_folding_wants_exact_name() {
        let live = set(&[("hello", "world")]);
        verify_roundtrip(live.records(), &[EaRecord::new("hello", "world")], false).unwrap();
        assert!(verify_roundtrip(live.records(), &[EaRecord::new("HELLO", "world")], false).is_err());
    }

    #[test]
    fn roundtrip_detects_count() {
        let live = set(&[("a", "1"), ("b", "2")]);
        let err = verify_roundtrip(live.records(), &[EaRecord::new("A", "1")], true).unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "entry count", .. }));
    }

    #[test]
    fn roundtrip_detects_reorder() {
        let live = set(&[("FOO", "bar"), ("HELLO", "baz")]);
        let read_back = vec![EaRecord::new("HELLO", "baz"), EaRecord::new("FOO", "bar")];
        let err = verify_roundtrip(live.records(), &read_back, true).unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "position", .. }));
    }

    #[test]
    fn roundtrip_detects_missing_name() {
        let live = set(&[("FOO", "bar")]);
        let err = verify_roundtrip(live.records(), &[EaRecord::new("BAR", "bar")], true)
            .unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "name", .. }));
    }

    #[test]
    fn roundtrip_detects_value_and_flags() {
        let live = set(&[("FOO", "bar")]);
        let err = verify_roundtrip(live.records(), &[EaRecord::new("FOO", "baz")], true)
            .unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "value", .. }));

        let flagged = EaRecord::new("FOO", "bar").with_flags(EaFlags::NEED_EA);
        let err = verify_roundtrip(live.records(), &[flagged], true).unwrap_err();
        assert!(matches!(err, EaError::ContentMismatch { field: "flags", .. }));
    }

    #[test]
    fn roundtrip_of_decoded_buffer() {
        let live = set(&[("hello", "world")]);
        let buf = codec::encode_records(&live.expected_read_back(true)).unwrap();
        let decoded = codec::decode(buf.as_bytes()).unwrap();
        verify_roundtrip(live.records(), &decoded, true).unwrap();
    }

    #[test]
    fn size_consistency_passes_when_all_agree() {
        let reported = SizeSource::iter_all().map(|s| (s, 36));
        verify_size_consistency(36, reported).unwrap();
    }

    #[test]
    fn size_consistency_names_first_offender() {
        let reported = [
            (SizeSource::EaInformation, 36),
            (SizeSource::DirEntry(DirInfoClass::BothDirectory), 16),
            (SizeSource::DirEntry(DirInfoClass::IdExtdDirectory), 0),
        ];
        match verify_size_consistency(36, reported) {
            Err(EaError::SizeMismatch {
                reported_by,
                expected,
                reported,
            }) => {
                assert_eq!(reported_by, SizeSource::DirEntry(DirInfoClass::BothDirectory));
                assert_eq!(expected, 36);
                assert_eq!(reported, 16);
            }
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn total_size_saturates() {
        let big = EaRecord::new("n", vec![b'v'; codec::MAX_EA_VALUE_LEN]);
        let size = total_size(std::iter::repeat(&big).take(70_000));
        assert_eq!(size, u32::MAX);
    }
}
