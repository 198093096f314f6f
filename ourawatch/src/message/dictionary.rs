use super::MessageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest encoded message the watch accepts
pub const MAX_MESSAGE_SIZE: usize = 1024;
/// Most tuples in one message
pub const MAX_TUPLES: usize = 64;

const TUPLE_HEADER_SIZE: usize = 7;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

/// Key to int32 mapping sent to or received from the watch as one unit.
///
/// Binary layout: a `u8` tuple count, then per tuple a little-endian `u32`
/// key, a `u8` type, a little-endian `u16` length and the value bytes.
/// Values are always written as 4-byte signed integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppMessage {
    entries: BTreeMap<u32, i32>,
}

impl AppMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: u32, value: i32) -> Option<i32> {
        self.entries.insert(key, value)
    }

    /// Insert `values[i]` under `base + i`
    pub fn insert_series(&mut self, base: u32, values: &[i32]) {
        for (offset, value) in (0u32..).zip(values) {
            self.entries.insert(base + offset, *value);
        }
    }

    pub fn remove(&mut self, key: u32) -> Option<i32> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: u32) -> Option<i32> {
        self.entries.get(&key).copied()
    }

    pub fn require(&self, key: u32) -> Result<i32, MessageError> {
        self.get(key).ok_or(MessageError::MissingKey(key))
    }

    pub fn contains(&self, key: u32) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Size of the binary encoding
    pub fn encoded_len(&self) -> usize {
        1 + self.entries.len() * (TUPLE_HEADER_SIZE + 4)
    }

    /// Reject messages the watch cannot take in one piece
    pub fn check_bounds(&self) -> Result<(), MessageError> {
        if self.entries.len() > MAX_TUPLES {
            return Err(MessageError::TooManyTuples(self.entries.len()));
        }
        if self.encoded_len() > MAX_MESSAGE_SIZE {
            return Err(MessageError::TooLarge(self.encoded_len()));
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        self.check_bounds()?;

        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.push(self.entries.len() as u8);
        for (key, value) in self.iter() {
            bytes.extend_from_slice(&key.to_le_bytes());
            bytes.push(TYPE_INT);
            bytes.extend_from_slice(&4u16.to_le_bytes());
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Decode a binary message. Integer tuples of 1, 2 or 4 bytes are
    /// accepted, signed or unsigned; strings and byte arrays are not.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut reader = Reader { bytes, pos: 0 };
        let count = reader.take(1)?[0];

        let mut message = Self::new();
        for _ in 0..count {
            let key = u32::from_le_bytes(reader.array()?);
            let kind = reader.take(1)?[0];
            let length = u16::from_le_bytes(reader.array()?);
            let raw = reader.take(usize::from(length))?;

            let value = match (kind, raw) {
                (TYPE_INT, [b]) => i32::from(*b as i8),
                (TYPE_INT, [a, b]) => i32::from(i16::from_le_bytes([*a, *b])),
                (TYPE_INT, [a, b, c, d]) => i32::from_le_bytes([*a, *b, *c, *d]),
                (TYPE_UINT, [b]) => i32::from(*b),
                (TYPE_UINT, [a, b]) => i32::from(u16::from_le_bytes([*a, *b])),
                (TYPE_UINT, [a, b, c, d]) => u32::from_le_bytes([*a, *b, *c, *d]) as i32,
                (TYPE_INT | TYPE_UINT, _) => return Err(MessageError::UnsupportedLength(length)),
                _ => return Err(MessageError::UnsupportedType(kind)),
            };
            message.insert(key, value);
        }

        if reader.pos != bytes.len() {
            return Err(MessageError::TrailingBytes(bytes.len() - reader.pos));
        }
        Ok(message)
    }
}

impl FromIterator<(u32, i32)> for AppMessage {
    fn from_iter<I: IntoIterator<Item = (u32, i32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], MessageError> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or(MessageError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], MessageError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}
