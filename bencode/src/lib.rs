//! A minimal bencode (BitTorrent-style) codec used to persist preferences.
//!
//! Encoding is order-preserving: dictionary keys are kept sorted by raw byte
//! value at all times, so re-serializing a parsed value always yields the
//! same bytes back. See `Dict::insert` for where that invariant is
//! maintained.

use std::fmt;

use thiserror::Error;

/// A bencoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Bytes(v.into_bytes())
    }
}

/// An ordered string-keyed dictionary. Entries are stored sorted by key
/// bytes; `insert` does a linear insertion-sort, which is fine for the
/// handful of keys a preferences dict actually holds (≤ ~32).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(Vec<u8>, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Inserts or overwrites `key`, keeping `entries` sorted by key bytes.
    ///
    /// Standard `[u8]` ordering already treats a byte-string that is a
    /// prefix of another as the lesser of the two, which is exactly the
    /// comparison the original codec uses for its dict key ordering.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        match self.entries.binary_search_by(|(k, _)| k.as_slice().cmp(&key)) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.as_bytes();
        self.entries
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_int(key).map(|v| v != 0)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Parses a stored string value as a float, mirroring
    /// `dict_get_float_from_str` (zoom is persisted as text, not as an int).
    pub fn get_float_from_str(&self, key: &str) -> Option<f64> {
        self.get_str(key).and_then(|s| s.parse().ok())
    }

    pub fn get_list(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_list)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(Value::as_dict)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of input at offset {offset}")]
    Truncated { offset: usize },

    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { offset: usize, byte: u8 },

    #[error("invalid integer literal at offset {offset}")]
    InvalidInteger { offset: usize },

    #[error("string length {declared} at offset {offset} exceeds remaining input of {available} bytes")]
    StringTooShort {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("{len} trailing byte(s) after top-level value at offset {offset}")]
    TrailingBytes { offset: usize, len: usize },
}

/// Parses a single top-level bencoded value, rejecting any trailing bytes.
pub fn decode(data: &[u8]) -> Result<Value, Error> {
    let mut p = Parser { data, pos: 0 };
    let value = p.parse_value()?;

    if p.pos != data.len() {
        return Err(Error::TrailingBytes {
            offset: p.pos,
            len: data.len() - p.pos,
        });
    }

    Ok(value)
}

/// Serializes `value`, with dict keys emitted in the sorted order `Dict`
/// already maintains.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(v) => {
            out.push(b'i');
            out.extend_from_slice(v.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(b) => {
            out.extend_from_slice(b.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(b);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(dict) => {
            out.push(b'd');
            for (key, val) in &dict.entries {
                encode_into(&Value::Bytes(key.clone()), out);
                encode_into(val, out);
            }
            out.push(b'e');
        }
    }
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Result<u8, Error> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(Error::Truncated { offset: self.pos })
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        match self.peek()? {
            b'i' => self.parse_int().map(Value::Int),
            b'0'..=b'9' => self.parse_bytes().map(Value::Bytes),
            b'l' => self.parse_list().map(Value::List),
            b'd' => self.parse_dict().map(Value::Dict),
            byte => Err(Error::UnexpectedByte {
                offset: self.pos,
                byte,
            }),
        }
    }

    fn parse_int(&mut self) -> Result<i64, Error> {
        let start = self.pos;
        debug_assert_eq!(self.data[self.pos], b'i');
        self.pos += 1;

        let neg = self.peek()? == b'-';
        if neg {
            self.pos += 1;
        }

        let digits_start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }

        if self.pos == digits_start {
            return Err(Error::InvalidInteger { offset: start });
        }

        let digits = &self.data[digits_start..self.pos];

        if self.peek()? != b'e' {
            return Err(Error::InvalidInteger { offset: start });
        }
        self.pos += 1;

        let text = std::str::from_utf8(digits).map_err(|_| Error::InvalidInteger { offset: start })?;
        let magnitude: i64 = text.parse().map_err(|_| Error::InvalidInteger { offset: start })?;

        // `i-0e` is invalid: zero has no sign.
        if neg && magnitude == 0 {
            return Err(Error::InvalidInteger { offset: start });
        }

        Ok(if neg { -magnitude } else { magnitude })
    }

    fn parse_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let start = self.pos;

        let digits_start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(Error::InvalidInteger { offset: start });
        }

        let text = std::str::from_utf8(&self.data[digits_start..self.pos])
            .map_err(|_| Error::InvalidInteger { offset: start })?;
        let len: usize = text.parse().map_err(|_| Error::InvalidInteger { offset: start })?;

        if self.peek()? != b':' {
            return Err(Error::UnexpectedByte {
                offset: self.pos,
                byte: self.data[self.pos],
            });
        }
        self.pos += 1;

        let available = self.data.len().saturating_sub(self.pos);
        if len > available {
            return Err(Error::StringTooShort {
                offset: start,
                declared: len,
                available,
            });
        }

        let bytes = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    fn parse_list(&mut self) -> Result<Vec<Value>, Error> {
        debug_assert_eq!(self.data[self.pos], b'l');
        self.pos += 1;

        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.parse_value()?);
        }
        self.pos += 1;

        Ok(items)
    }

    fn parse_dict(&mut self) -> Result<Dict, Error> {
        debug_assert_eq!(self.data[self.pos], b'd');
        self.pos += 1;

        let mut dict = Dict::new();
        while self.peek()? != b'e' {
            let key = self.parse_bytes()?;
            let value = self.parse_value()?;
            dict.insert(key, value);
        }
        self.pos += 1;

        Ok(dict)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_zero() {
        assert_eq!(decode(b"i0e").unwrap(), Value::Int(0));
    }

    #[test]
    fn decode_negative() {
        assert_eq!(decode(b"i-53e").unwrap(), Value::Int(-53));
    }

    #[test]
    fn decode_negative_zero_is_rejected() {
        assert!(decode(b"i-0e").is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes_at_top_level() {
        assert!(decode(b"i123ex").is_err());
    }

    #[test]
    fn decode_string() {
        assert_eq!(decode(b"4:spam").unwrap(), Value::Bytes(b"spam".to_vec()));
    }

    #[test]
    fn decode_string_too_short_is_rejected() {
        assert!(decode(b"3:ab").is_err());
    }

    #[test]
    fn decode_empty_string() {
        assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Vec::new()));
    }

    #[test]
    fn encode_dict_sorts_keys() {
        let mut dict = Dict::new();
        dict.insert("b", 2i64);
        dict.insert("a", 1i64);

        let encoded = encode(&Value::Dict(dict));
        assert_eq!(encoded, b"d1:ai1e1:bi2ee");
    }

    #[test]
    fn insert_prefix_key_sorts_before_longer_key() {
        let mut dict = Dict::new();
        dict.insert("ab", 1i64);
        dict.insert("a", 2i64);

        let keys: Vec<_> = dict.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"ab".to_vec()]);
    }

    #[test]
    fn round_trip_nested_value() {
        let mut inner = Dict::new();
        inner.insert("x", 1i64);
        inner.insert("y", "hello");

        let mut outer = Dict::new();
        outer.insert("list", Value::List(vec![Value::Int(1), Value::Int(2)]));
        outer.insert("nested", Value::Dict(inner));

        let value = Value::Dict(outer);
        let bytes = encode(&value);
        let parsed = decode(&bytes).unwrap();
        assert_eq!(parsed, value);

        // Re-serializing a parsed value reproduces the same bytes.
        assert_eq!(encode(&parsed), bytes);
    }

    #[test]
    fn dict_accessors_return_miss_not_error() {
        let dict = Dict::new();
        assert_eq!(dict.get_int("missing"), None);
        assert_eq!(dict.get_str("missing"), None);
        assert_eq!(dict.get_bool("missing"), None);
    }

    #[test]
    fn parsing_does_not_require_sorted_input() {
        // The raw wire form here is deliberately out of order; the parser
        // accepts it and the in-memory `Dict` re-sorts on insertion.
        let parsed = decode(b"d1:bi2e1:ai1ee").unwrap();
        let reencoded = encode(&parsed);
        assert_eq!(reencoded, b"d1:ai1e1:bi2ee");
    }
}
