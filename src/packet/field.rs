//! Delimited text fields inside a flat packet payload.
//!
//! WWIVnet payloads start with a few short envelope fields terminated by NUL
//! or CRLF, followed by the free-form message body. Parsing is tolerant: a
//! missing delimiter simply ends the field at the end of the buffer.
//!
//! Fields keep their bytes exactly as they appeared on the wire. BBS text is
//! usually CP437 and is only decoded when it is displayed.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use serde::{Serialize, Serializer};

/// Delimiters recognized between envelope fields.
pub const FIELD_DELIMITERS: &[u8] = b"\0\r\n";

/// Longest envelope field the legacy software produces.
pub const MAX_FIELD_LEN: usize = 80;

/// Read one field starting at `*pos`.
///
/// Consumes bytes up to the first byte in `delimiters`, or `max_len` bytes,
/// or the end of `buf`, whichever comes first. A single delimiter is then
/// skipped; `\r\n` counts as one delimiter when `\n` is in the set. Stopping
/// on `max_len` skips nothing.
pub fn get_message_field(
    buf: &[u8],
    pos: &mut usize,
    delimiters: &[u8],
    max_len: usize,
) -> NetText {
    if *pos >= buf.len() {
        return NetText::default();
    }

    let start = *pos;
    let mut end = start;
    while end < buf.len() && end - start < max_len && !delimiters.contains(&buf[end]) {
        end += 1;
    }
    let field = NetText::from(&buf[start..end]);

    *pos = end;
    if end < buf.len() && delimiters.contains(&buf[end]) {
        let delimiter = buf[end];
        *pos += 1;
        if delimiter == b'\r' && delimiters.contains(&b'\n') && buf.get(*pos) == Some(&b'\n') {
            *pos += 1;
        }
    }
    field
}

/// Cursor over a payload that hands out fields one at a time.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Next field using the standard delimiters and length limit.
    pub fn field(&mut self) -> NetText {
        self.field_with(FIELD_DELIMITERS, MAX_FIELD_LEN)
    }

    /// Next field with an explicit delimiter set and length limit.
    pub fn field_with(&mut self, delimiters: &[u8], max_len: usize) -> NetText {
        get_message_field(self.buf, &mut self.pos, delimiters, max_len)
    }

    /// Everything not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos.min(self.buf.len())..]
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

/// Text bytes as carried in a packet.
///
/// Compares and serializes as text, but writes back the exact bytes it was
/// read from, whatever their encoding.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetText(Vec<u8>);

impl NetText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Decoded for display: UTF-8 when valid, otherwise CP437.
    pub fn to_text(&self) -> Cow<'_, str> {
        decode_text(&self.0)
    }
}

impl Deref for NetText {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for NetText {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for NetText {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<String> for NetText {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for NetText {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl PartialEq<str> for NetText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for NetText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for NetText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_text())
    }
}

impl fmt::Debug for NetText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.to_text(), f)
    }
}

impl Serialize for NetText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

/// Decode legacy text bytes for display.
///
/// Valid UTF-8 is taken as is. Anything else is read as CP437, the DOS code
/// page WWIV and FidoNet software writes, which maps every byte.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| cp437_char(b)).collect()),
    }
}

fn cp437_char(b: u8) -> char {
    match b {
        0x00..=0x7f => char::from(b),
        _ => CP437_HIGH[usize::from(b - 0x80)],
    }
}

/// CP437 bytes 0x80 through 0xFF.
#[rustfmt::skip]
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_step_decomposition() {
        let buf = b"a\0bc\r\nd";
        let mut pos = 0;
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80), "a");
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80), "bc");
        assert_eq!(&buf[pos..], b"d");
    }

    #[test]
    fn test_missing_delimiter_returns_rest() {
        let buf = b"no delimiter here";
        let mut pos = 0;
        assert_eq!(
            get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80),
            "no delimiter here"
        );
        assert_eq!(pos, buf.len());
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80), "");
    }

    #[test]
    fn test_lone_cr_is_one_delimiter() {
        let buf = b"one\rtwo\r\n";
        let mut pos = 0;
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80), "one");
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 80), "two");
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_cr_only_delimiter_set_leaves_lf() {
        let buf = b"one\r\ntwo";
        let mut pos = 0;
        assert_eq!(get_message_field(buf, &mut pos, b"\r", 80), "one");
        assert_eq!(&buf[pos..], b"\ntwo");
    }

    #[test]
    fn test_empty_fields_survive() {
        let buf = b"\0\0x";
        let mut reader = FieldReader::new(buf);
        assert_eq!(reader.field(), "");
        assert_eq!(reader.field(), "");
        assert_eq!(reader.rest(), b"x");
    }

    #[test]
    fn test_max_len_stops_without_consuming() {
        let buf = b"abcdef\0";
        let mut pos = 0;
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 4), "abcd");
        assert_eq!(pos, 4);
        assert_eq!(get_message_field(buf, &mut pos, FIELD_DELIMITERS, 4), "ef");
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_eight_bit_field_keeps_bytes() {
        let buf = b"M\x81ller\0";
        let mut reader = FieldReader::new(buf);
        let field = reader.field();
        assert_eq!(field.as_bytes(), b"M\x81ller");
        assert_eq!(field.to_text(), "Müller");
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_cp437_box_drawing() {
        let text = NetText::from(&b"\xda\xc4\xbf \xb0\xdb"[..]);
        assert_eq!(text.to_string(), "┌─┐ ░█");
    }

    #[test]
    fn test_utf8_is_not_reinterpreted() {
        let text = NetText::from("Grüße");
        assert_eq!(text.to_text(), "Grüße");
        assert_eq!(text, "Grüße");
    }
}
