//! Self-describing message envelope and its binary codec
//!
//! An [`Envelope`] is the unit of wire transfer: a numeric type discriminator,
//! a bag of string-encoded properties and an ordered list of optional binary
//! attachments. Typed message variants read and write their fields through the
//! typed accessors defined here; properties a variant does not know about are
//! carried through untouched.
//!
//! ## Binary layout
//!
//! All integers are little-endian `i32`.
//!
//! ```text
//! type | property_count | (key, value)* | attachment_count | attachment*
//! ```
//!
//! Strings are a byte length followed by UTF-8 bytes, attachments a byte
//! length followed by raw bytes. A length of `-1` encodes null.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::message::MessageType;

const NULL_LENGTH: i32 = -1;

/// Typed property bag exchanged between the bridge and its counterpart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    message_type: i32,
    properties: BTreeMap<String, String>,
    attachments: Vec<Option<Vec<u8>>>,
}

impl Envelope {
    /// Create an empty envelope for a message type
    pub fn new(message_type: MessageType) -> Self {
        Self::with_raw_type(message_type.code())
    }

    /// Create an empty envelope carrying an arbitrary type discriminator
    pub fn with_raw_type(message_type: i32) -> Self {
        Self {
            message_type,
            properties: BTreeMap::new(),
            attachments: Vec::new(),
        }
    }

    /// Raw type discriminator as it appears on the wire
    pub fn type_code(&self) -> i32 {
        self.message_type
    }

    /// Resolve the type discriminator against the message catalogue
    pub fn message_type(&self) -> CoreResult<MessageType> {
        MessageType::from_code(self.message_type)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub fn attachments(&self) -> &[Option<Vec<u8>>] {
        &self.attachments
    }

    /// Attachment at `index`, or `None` if it is null or out of range
    pub fn attachment(&self, index: usize) -> Option<&[u8]> {
        self.attachments.get(index).and_then(|a| a.as_deref())
    }

    /// Store an attachment at `index`, padding with nulls as needed
    pub fn set_attachment(&mut self, index: usize, value: Option<Vec<u8>>) {
        if self.attachments.len() <= index {
            self.attachments.resize(index + 1, None);
        }
        self.attachments[index] = value;
    }

    pub fn push_attachment(&mut self, value: Option<Vec<u8>>) {
        self.attachments.push(value);
    }

    // ---- typed accessors -------------------------------------------------

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    /// Set a string property; `None` removes it
    pub fn set_string(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => self.set_property(key, v),
            None => {
                self.properties.remove(key);
            }
        }
    }

    /// Integer property; absent reads as zero
    pub fn get_i64(&self, key: &str) -> CoreResult<i64> {
        match self.property(key) {
            None => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| CoreError::invalid_property(key, format!("'{raw}' is not an i64"))),
        }
    }

    pub fn set_i64(&mut self, key: &str, value: i64) {
        self.set_property(key, value.to_string());
    }

    /// Integer property; absent reads as zero
    pub fn get_i32(&self, key: &str) -> CoreResult<i32> {
        match self.property(key) {
            None => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| CoreError::invalid_property(key, format!("'{raw}' is not an i32"))),
        }
    }

    pub fn set_i32(&mut self, key: &str, value: i32) {
        self.set_property(key, value.to_string());
    }

    /// Boolean property; absent reads as `false`
    pub fn get_bool(&self, key: &str) -> CoreResult<bool> {
        match self.property(key) {
            None => Ok(false),
            Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(true),
            Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(false),
            Some(raw) => Err(CoreError::invalid_property(
                key,
                format!("'{raw}' is not a bool"),
            )),
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set_property(key, if value { "true" } else { "false" });
    }

    /// Floating point property; absent reads as zero
    pub fn get_f64(&self, key: &str) -> CoreResult<f64> {
        match self.property(key) {
            None => Ok(0.0),
            Some(raw) => raw
                .parse()
                .map_err(|_| CoreError::invalid_property(key, format!("'{raw}' is not an f64"))),
        }
    }

    pub fn set_f64(&mut self, key: &str, value: f64) {
        self.set_property(key, value.to_string());
    }

    /// Duration property encoded as integer nanoseconds.
    ///
    /// Absent and zero both read as `None`; a zero duration never means
    /// "expire immediately" on this protocol.
    pub fn get_duration(&self, key: &str) -> CoreResult<Option<Duration>> {
        let nanos = self.get_i64(key)?;
        if nanos < 0 {
            return Err(CoreError::invalid_property(
                key,
                format!("negative duration {nanos}ns"),
            ));
        }
        Ok((nanos > 0).then(|| Duration::from_nanos(nanos as u64)))
    }

    pub fn set_duration(&mut self, key: &str, value: Option<Duration>) {
        match value {
            Some(d) if !d.is_zero() => {
                let nanos = i64::try_from(d.as_nanos()).unwrap_or(i64::MAX);
                self.set_i64(key, nanos);
            }
            _ => {
                self.properties.remove(key);
            }
        }
    }

    /// Byte buffer property stored as standard base64
    pub fn get_bytes(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        match self.property(key) {
            None => Ok(None),
            Some(raw) => BASE64
                .decode(raw)
                .map(Some)
                .map_err(|e| CoreError::invalid_property(key, e.to_string())),
        }
    }

    pub fn set_bytes(&mut self, key: &str, value: Option<&[u8]>) {
        match value {
            Some(bytes) => self.set_property(key, BASE64.encode(bytes)),
            None => {
                self.properties.remove(key);
            }
        }
    }

    /// JSON substructure property
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        match self.property(key) {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: Option<&T>) -> CoreResult<()> {
        match value {
            Some(v) => {
                let raw = serde_json::to_string(v)?;
                self.set_property(key, raw);
            }
            None => {
                self.properties.remove(key);
            }
        }
        Ok(())
    }

    // ---- binary codec ----------------------------------------------------

    /// Encode into the binary wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.message_type.to_le_bytes());

        write_len(&mut buf, self.properties.len());
        for (key, value) in &self.properties {
            write_chunk(&mut buf, Some(key.as_bytes()));
            write_chunk(&mut buf, Some(value.as_bytes()));
        }

        write_len(&mut buf, self.attachments.len());
        for attachment in &self.attachments {
            write_chunk(&mut buf, attachment.as_deref());
        }
        buf
    }

    /// Decode from the binary wire layout.
    ///
    /// The type discriminator is not validated here; unknown types are a
    /// dispatch-time concern.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let mut reader = Reader::new(bytes);
        let message_type = reader.read_i32()?;

        let property_count = reader.read_count("property")?;
        let mut properties = BTreeMap::new();
        for _ in 0..property_count {
            let key = reader
                .read_string()?
                .ok_or_else(|| CoreError::MalformedEnvelope("null property key".to_string()))?;
            // a null value is equivalent to an absent property
            if let Some(value) = reader.read_string()? {
                properties.insert(key, value);
            }
        }

        let attachment_count = reader.read_count("attachment")?;
        // every attachment takes at least its 4-byte length
        let mut attachments = Vec::with_capacity(attachment_count.min(reader.remaining() / 4));
        for _ in 0..attachment_count {
            attachments.push(reader.read_chunk()?.map(<[u8]>::to_vec));
        }

        reader.finish()?;

        Ok(Self {
            message_type,
            properties,
            attachments,
        })
    }
}

fn write_len(buf: &mut Vec<u8>, len: usize) {
    let len = i32::try_from(len).unwrap_or(i32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
}

fn write_chunk(buf: &mut Vec<u8>, chunk: Option<&[u8]>) {
    match chunk {
        Some(bytes) => {
            write_len(buf, bytes.len());
            buf.extend_from_slice(bytes);
        }
        None => buf.extend_from_slice(&NULL_LENGTH.to_le_bytes()),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::MalformedEnvelope(format!(
                "truncated frame: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> CoreResult<i32> {
        let raw = self.take(4)?;
        Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_count(&mut self, what: &str) -> CoreResult<usize> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| CoreError::MalformedEnvelope(format!("negative {what} count {count}")))
    }

    fn read_chunk(&mut self) -> CoreResult<Option<&'a [u8]>> {
        match self.read_i32()? {
            NULL_LENGTH => Ok(None),
            len if len < 0 => Err(CoreError::MalformedEnvelope(format!(
                "invalid length {len}"
            ))),
            len => self.take(len as usize).map(Some),
        }
    }

    fn read_string(&mut self) -> CoreResult<Option<String>> {
        match self.read_chunk()? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| CoreError::MalformedEnvelope(format!("invalid UTF-8: {e}"))),
        }
    }

    fn finish(&self) -> CoreResult<()> {
        if self.remaining() > 0 {
            return Err(CoreError::MalformedEnvelope(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
