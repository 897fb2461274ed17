//! # EA Record Codec
//!
//! Encoding and decoding of offset-chained extended attribute buffers.
//!
//! ## Record Layout
//!
//! Each record is little-endian and laid out as:
//!
//! ```text
//! offset  size  field
//! 0       4     next-entry-offset (0 on the last record)
//! 4       1     flags
//! 5       1     name-length
//! 6       2     value-length
//! 8       n     name
//! 8+n     1     0x00 separator
//! 9+n     v     value
//! ...           zero padding to a multiple of 4
//! ```
//!
//! Every record is 4-byte aligned, so concatenating records keeps the whole
//! buffer aligned.
//!
//! ## Example
//!
//! ```rust
//! use ea_oracle::codec;
//!
//! let buf = codec::encode_many([("qux", "xyzzy"), ("y2", "plugh")]).unwrap();
//! let records = codec::decode(buf.as_bytes()).unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].value, b"plugh");
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::{EaBuffer, EaError, EaFlags, EaRecord};

/// Size of the fixed record header that precedes the name.
pub const EA_HEADER_SIZE: usize = 8;

/// Every record is padded to a multiple of this.
pub const EA_ALIGNMENT: usize = 4;

/// Longest name the one-byte name-length field can describe.
pub const MAX_EA_NAME_LEN: usize = u8::MAX as usize;

/// Longest value the two-byte value-length field can describe.
pub const MAX_EA_VALUE_LEN: usize = u16::MAX as usize;

/// Record length before padding.
#[inline]
pub(crate) const fn unpadded_len(name_len: usize, value_len: usize) -> usize {
    EA_HEADER_SIZE + name_len + 1 + value_len
}

/// Record length after padding. Callers must have checked the lengths.
#[inline]
pub(crate) const fn padded_len(name_len: usize, value_len: usize) -> usize {
    (unpadded_len(name_len, value_len) + EA_ALIGNMENT - 1) & !(EA_ALIGNMENT - 1)
}

/// Reject names and values that do not fit their length fields.
pub(crate) fn check_lengths(name: &[u8], value: &[u8]) -> Result<(), EaError> {
    if name.is_empty() || name.len() > MAX_EA_NAME_LEN {
        return Err(EaError::InvalidLength {
            field: "name",
            len: name.len(),
            max: MAX_EA_NAME_LEN,
        });
    }
    if value.len() > MAX_EA_VALUE_LEN {
        return Err(EaError::InvalidLength {
            field: "value",
            len: value.len(),
            max: MAX_EA_VALUE_LEN,
        });
    }
    Ok(())
}

/// Byte length of one record holding `name` and `value`, padding included.
///
/// # Errors
///
/// - [`EaError::InvalidLength`] if `name` is empty or longer than
///   [`MAX_EA_NAME_LEN`], or `value` is longer than [`MAX_EA_VALUE_LEN`]
///
/// # Example
///
/// ```rust
/// use ea_oracle::codec::encoded_size;
///
/// // 8 header + 5 name + 1 separator + 5 value = 19, padded to 20
/// assert_eq!(encoded_size(b"hello", b"world").unwrap(), 20);
/// ```
pub fn encoded_size(name: &[u8], value: &[u8]) -> Result<u32, EaError> {
    check_lengths(name, value)?;
    Ok(padded_len(name.len(), value.len()) as u32)
}

/// Encode a single terminal record.
///
/// The name is copied verbatim; the codec never changes its case.
pub fn encode_one(name: &[u8], value: &[u8]) -> Result<EaBuffer, EaError> {
    encode_many([(name, value)])
}

/// Encode a sequence of name/value pairs into one chained buffer.
///
/// Records appear in the order given, all with empty flags. Every record
/// except the last points at the next through its own encoded size.
///
/// An empty sequence encodes to an empty buffer.
pub fn encode_many<I, N, V>(records: I) -> Result<EaBuffer, EaError>
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let pairs: Vec<(N, V)> = records.into_iter().collect();
    encode_parts(
        pairs
            .iter()
            .map(|(name, value)| (EaFlags::empty(), name.as_ref(), value.as_ref())),
    )
}

/// Encode full records, flags included.
pub fn encode_records<'a, I>(records: I) -> Result<EaBuffer, EaError>
where
    I: IntoIterator<Item = &'a EaRecord>,
{
    encode_parts(
        records
            .into_iter()
            .map(|r| (r.flags, r.name.as_slice(), r.value.as_slice())),
    )
}

fn encode_parts<'a, I>(parts: I) -> Result<EaBuffer, EaError>
where
    I: IntoIterator<Item = (EaFlags, &'a [u8], &'a [u8])>,
{
    let parts: Vec<_> = parts.into_iter().collect();

    let mut total = 0usize;
    for (_, name, value) in &parts {
        check_lengths(name, value)?;
        total += padded_len(name.len(), value.len());
    }

    let mut buf = vec![0u8; total];
    let mut cursor = 0usize;
    let last = parts.len().saturating_sub(1);

    for (i, (flags, name, value)) in parts.iter().enumerate() {
        let len = padded_len(name.len(), value.len());
        let next = if i == last { 0 } else { len as u32 };
        write_record(&mut buf[cursor..cursor + len], next, *flags, name, value);
        cursor += len;
    }

    Ok(EaBuffer::from_vec(buf))
}

/// Write one record into a zeroed slot of exactly its padded length.
fn write_record(slot: &mut [u8], next: u32, flags: EaFlags, name: &[u8], value: &[u8]) {
    LittleEndian::write_u32(&mut slot[0..4], next);
    slot[4] = flags.bits();
    slot[5] = name.len() as u8;
    LittleEndian::write_u16(&mut slot[6..8], value.len() as u16);

    let name_end = EA_HEADER_SIZE + name.len();
    slot[EA_HEADER_SIZE..name_end].copy_from_slice(name);
    slot[name_end] = 0;
    slot[name_end + 1..name_end + 1 + value.len()].copy_from_slice(value);
}

/// One record as found while walking a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    /// Byte offset of the record within the buffer.
    pub offset: usize,
    /// The record's next-entry-offset field.
    pub next_entry_offset: u32,
    /// The decoded record.
    pub record: EaRecord,
}

/// Cursor over the records of a chained buffer.
///
/// Yields one item per record and stops after the record whose
/// next-entry-offset is zero. The first error ends the walk.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    buf: &'a [u8],
    cursor: usize,
    done: bool,
}

impl<'a> Records<'a> {
    /// Start walking `buf` from its first byte.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            done: false,
        }
    }

    fn read_entry(&self, offset: usize) -> Result<DecodedEntry, EaError> {
        let rest = &self.buf[offset..];
        if rest.len() < EA_HEADER_SIZE {
            return Err(EaError::malformed(
                offset,
                format!("{} bytes left, header needs {EA_HEADER_SIZE}", rest.len()),
            ));
        }

        let next_entry_offset = LittleEndian::read_u32(&rest[0..4]);
        let flags = EaFlags::from_bits_retain(rest[4]);
        let name_len = rest[5] as usize;
        let value_len = LittleEndian::read_u16(&rest[6..8]) as usize;

        let name_end = EA_HEADER_SIZE + name_len;
        let value_start = name_end + 1;
        let value_end = value_start + value_len;
        if value_end > rest.len() {
            return Err(EaError::malformed(
                offset,
                format!(
                    "name length {name_len} and value length {value_len} need {value_end} bytes, {} left",
                    rest.len()
                ),
            ));
        }

        if next_entry_offset != 0 && next_entry_offset as usize > rest.len() {
            return Err(EaError::malformed(
                offset,
                format!(
                    "next-entry offset {next_entry_offset} past end of {}-byte buffer",
                    self.buf.len()
                ),
            ));
        }

        Ok(DecodedEntry {
            offset,
            next_entry_offset,
            record: EaRecord {
                flags,
                name: rest[EA_HEADER_SIZE..name_end].to_vec(),
                value: rest[value_start..value_end].to_vec(),
            },
        })
    }
}

impl Iterator for Records<'_> {
    type Item = Result<DecodedEntry, EaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let entry = match self.read_entry(self.cursor) {
            Ok(entry) => entry,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        log::trace!(
            "EA record at {}: name {} ({} value bytes), next {}",
            entry.offset,
            entry.record.name.escape_ascii(),
            entry.record.value.len(),
            entry.next_entry_offset
        );

        if entry.next_entry_offset == 0 {
            self.done = true;
        } else {
            self.cursor += entry.next_entry_offset as usize;
        }
        Some(Ok(entry))
    }
}

impl std::iter::FusedIterator for Records<'_> {}

/// Decode a chained buffer into its records, in buffer order.
///
/// Must not be called on a buffer known to hold no records; an empty buffer
/// is reported as malformed.
///
/// # Errors
///
/// - [`EaError::MalformedBuffer`] if a header, name, value, or next-entry
///   offset would reach past the end of `buf`
pub fn decode(buf: &[u8]) -> Result<Vec<EaRecord>, EaError> {
    Records::new(buf)
        .map(|entry| entry.map(|e| e.record))
        .collect()
}

/// Strictly validate a buffer before it is applied as a write request.
///
/// On top of the bounds checks [`decode`] performs, every next-entry offset
/// must be 4-aligned and at least the record's unpadded length, every name
/// non-empty, and every separator byte zero.
pub fn validate(buf: &[u8]) -> Result<(), EaError> {
    for entry in Records::new(buf) {
        let entry = entry?;
        let record = &entry.record;

        if record.name.is_empty() {
            return Err(EaError::malformed(entry.offset, "empty EA name"));
        }

        let separator = entry.offset + EA_HEADER_SIZE + record.name.len();
        if buf[separator] != 0 {
            return Err(EaError::malformed(
                entry.offset,
                format!("separator byte is {:#04x}, expected 0", buf[separator]),
            ));
        }

        let next = entry.next_entry_offset as usize;
        if next != 0 {
            if next % EA_ALIGNMENT != 0 {
                return Err(EaError::malformed(
                    entry.offset,
                    format!("next-entry offset {next} not {EA_ALIGNMENT}-byte aligned"),
                ));
            }
            let min = unpadded_len(record.name.len(), record.value.len());
            if next < min {
                return Err(EaError::malformed(
                    entry.offset,
                    format!("next-entry offset {next} overlaps the {min}-byte record"),
                ));
            }
        }
    }
    Ok(())
}
