//! Companion app message dictionary
//!
//! Messages use the AppMessage dictionary layout, all integers little endian:
//!
//! ```text
//! count: u8
//! count × { key: u32, type: u8, length: u16, data: [u8; length] }
//! ```
//!
//! Decoding is lenient. A newer companion app may send tuples this face
//! doesn't understand: those are skipped using the length in their header.
//! Decoding only stops when the message is cut short.

use core::fmt::Write;

use heapless::{String, Vec};

use super::{KEY_COLOR_BLUE_BG, KEY_COLOR_GREEN_BG, KEY_COLOR_RED_BG, KEY_HIGH_CONTRAST};

/// Maximum number of tuples per message
pub const MAX_TUPLES: usize = 8;
/// Maximum payload length of a byte array or string tuple
pub const MAX_DATA_LEN: usize = 32;

const HEADER_LEN: usize = 7;

const TYPE_BYTE_ARRAY: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

/// Value of a single tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8, MAX_DATA_LEN>),
    CString(String<MAX_DATA_LEN>),
    UInt(u32),
    Int(i32),
}

impl Value {
    /// Integer content of the value, if it is an integer.
    pub fn integer(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            Value::UInt(value) => Some(i32::try_from(*value).unwrap_or(i32::MAX)),
            Value::Bytes(_) | Value::CString(_) => None,
        }
    }
}

/// Key/value pair of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: u32,
    pub value: Value,
}

/// A decoded message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dictionary {
    tuples: Vec<Tuple, MAX_TUPLES>,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a message, failing on the first malformed tuple.
    pub fn try_parse(bytes: &[u8]) -> Result<Self, Error> {
        let mut dict = Self::new();
        dict.parse_into(bytes, false)?;
        Ok(dict)
    }

    /// Decode a message, keeping whatever could be read.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut dict = Self::new();
        if let Err(err) = dict.parse_into(bytes, true) {
            warn!(
                "Dropping malformed message tail after {} tuples: {}",
                dict.len(),
                err.as_str()
            );
        }
        dict
    }

    /// With `skip_invalid`, tuples with an unusable value are left out
    /// instead of failing the whole message.
    fn parse_into(&mut self, bytes: &[u8], skip_invalid: bool) -> Result<(), Error> {
        let (&count, mut rest) = bytes.split_first().ok_or(Error::Truncated)?;
        for _ in 0..count {
            if rest.len() < HEADER_LEN {
                return Err(Error::Truncated);
            }
            let key = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
            let kind = rest[4];
            let length = u16::from_le_bytes([rest[5], rest[6]]) as usize;
            let data = rest
                .get(HEADER_LEN..HEADER_LEN + length)
                .ok_or(Error::Truncated)?;
            rest = &rest[HEADER_LEN + length..];
            match decode_value(kind, data) {
                Ok(value) => self.insert(key, value)?,
                Err(err) if skip_invalid => {
                    warn!("Skipping tuple {}: {}", key, err.as_str());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Add a tuple, replacing an existing one with the same key.
    pub fn insert(&mut self, key: u32, value: Value) -> Result<(), Error> {
        if let Some(tuple) = self.tuples.iter_mut().find(|t| t.key == key) {
            tuple.value = value;
            return Ok(());
        }
        self.tuples
            .push(Tuple { key, value })
            .map_err(|_| Error::TooManyTuples)
    }

    /// Look up the value stored for `key`
    pub fn find(&self, key: u32) -> Option<&Value> {
        self.tuples.iter().find(|t| t.key == key).map(|t| &t.value)
    }

    /// Integer stored for `key`. Non-integer tuples count as absent.
    pub fn integer(&self, key: u32) -> Option<i32> {
        self.find(key).and_then(Value::integer)
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    /// Encode the dictionary into `buf`, returning the number of bytes used.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut pos = 0;
        put(buf, &mut pos, &[self.tuples.len() as u8])?;
        for tuple in &self.tuples {
            let scratch: [u8; 4];
            let (kind, data): (u8, &[u8]) = match &tuple.value {
                Value::Bytes(bytes) => (TYPE_BYTE_ARRAY, bytes.as_slice()),
                Value::CString(text) => (TYPE_CSTRING, text.as_bytes()),
                Value::UInt(value) => {
                    scratch = value.to_le_bytes();
                    (TYPE_UINT, &scratch[..])
                }
                Value::Int(value) => {
                    scratch = value.to_le_bytes();
                    (TYPE_INT, &scratch[..])
                }
            };
            // Strings go out NUL terminated
            let terminator = matches!(tuple.value, Value::CString(_)) as usize;
            let length = (data.len() + terminator) as u16;
            put(buf, &mut pos, &tuple.key.to_le_bytes())?;
            put(buf, &mut pos, &[kind])?;
            put(buf, &mut pos, &length.to_le_bytes())?;
            put(buf, &mut pos, data)?;
            if terminator == 1 {
                put(buf, &mut pos, &[0])?;
            }
        }
        Ok(pos)
    }
}

fn put(buf: &mut [u8], pos: &mut usize, data: &[u8]) -> Result<(), Error> {
    let end = *pos + data.len();
    buf.get_mut(*pos..end)
        .ok_or(Error::BufferTooSmall)?
        .copy_from_slice(data);
    *pos = end;
    Ok(())
}

fn decode_value(kind: u8, data: &[u8]) -> Result<Value, Error> {
    match kind {
        TYPE_BYTE_ARRAY => Vec::from_slice(data)
            .map(Value::Bytes)
            .map_err(|_| Error::DataTooLong),
        TYPE_CSTRING => {
            let text = match data.iter().position(|&b| b == 0) {
                Some(end) => &data[..end],
                None => data,
            };
            let text = core::str::from_utf8(text).map_err(|_| Error::InvalidString)?;
            let mut value = String::new();
            value.push_str(text).map_err(|_| Error::DataTooLong)?;
            Ok(Value::CString(value))
        }
        TYPE_UINT => match *data {
            [b] => Ok(Value::UInt(b as u32)),
            [b0, b1] => Ok(Value::UInt(u16::from_le_bytes([b0, b1]) as u32)),
            [b0, b1, b2, b3] => Ok(Value::UInt(u32::from_le_bytes([b0, b1, b2, b3]))),
            _ => Err(Error::InvalidLength),
        },
        TYPE_INT => match *data {
            [b] => Ok(Value::Int(b as i8 as i32)),
            [b0, b1] => Ok(Value::Int(i16::from_le_bytes([b0, b1]) as i32)),
            [b0, b1, b2, b3] => Ok(Value::Int(i32::from_le_bytes([b0, b1, b2, b3]))),
            _ => Err(Error::InvalidLength),
        },
        _ => Err(Error::UnknownType),
    }
}

/// Build the message the configuration page sends.
///
/// High contrast is sent on its own. Otherwise the background color, given
/// as `0xRRGGBB`, is split into its three channels. A color that can't be
/// parsed yields an empty message.
pub fn settings_message(high_contrast: bool, background_color: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    // Inserts below stay within MAX_TUPLES
    if high_contrast {
        let _ = dict.insert(KEY_HIGH_CONTRAST, Value::Int(1));
        return dict;
    }
    let hex = background_color
        .strip_prefix("0x")
        .or_else(|| background_color.strip_prefix('#'))
        .unwrap_or(background_color);
    let channel = |range: core::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return dict;
    }
    if let (Some(red), Some(green), Some(blue)) = (channel(0..2), channel(2..4), channel(4..6)) {
        let _ = dict.insert(KEY_COLOR_RED_BG, Value::Int(red as i32));
        let _ = dict.insert(KEY_COLOR_GREEN_BG, Value::Int(green as i32));
        let _ = dict.insert(KEY_COLOR_BLUE_BG, Value::Int(blue as i32));
    }
    dict
}

/// Render a color as `0xRRGGBB`, the format the configuration page uses.
pub fn color_string(red: u8, green: u8, blue: u8) -> String<8> {
    let mut out = String::new();
    // 8 bytes always fit
    let _ = write!(out, "0x{:02X}{:02X}{:02X}", red, green, blue);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Message ended in the middle of a tuple
    Truncated,
    UnknownType,
    /// Integer tuple with a length other than 1, 2 or 4
    InvalidLength,
    InvalidString,
    DataTooLong,
    TooManyTuples,
    BufferTooSmall,
}

impl Error {
    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Truncated => "truncated",
            Error::UnknownType => "unknown tuple type",
            Error::InvalidLength => "invalid integer length",
            Error::InvalidString => "invalid string",
            Error::DataTooLong => "data too long",
            Error::TooManyTuples => "too many tuples",
            Error::BufferTooSmall => "buffer too small",
        }
    }
}
