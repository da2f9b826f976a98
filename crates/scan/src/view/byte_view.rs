use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;

use bytes::{Buf, Bytes, BytesMut};

use super::char_view::CharView;
use super::charset::{Charset, Undecodable};
use super::uri::{DecodeState, Step};
use crate::ensure;

/// Last position resolved by [`ByteView::byte_at`].
#[derive(Debug, Default, Clone, Copy)]
struct Cursor {
    segment: usize,
    /// logical index of the first byte of `segment`
    start: usize,
}

/// A byte sequence made of ranges of one or more buffers.
///
/// Each segment is split off a pooled buffer and shares its memory, so building a view
/// never copies, and the bytes stay valid after the buffer itself went back to the pool.
/// Segments are never empty.
///
/// The transforms ([`trim`](Self::trim), [`remove_quotes`](Self::remove_quotes),
/// [`decode_uri`](Self::decode_uri)) rewrite the view in place. Values are copied out
/// only by the materializing methods such as [`to_string`](Self::to_string) and
/// [`to_long`](Self::to_long).
///
/// Random access through [`byte_at`](Self::byte_at) remembers the last segment it
/// landed in, which makes forward walks cheap. Going backwards starts over from the
/// first segment. The cache is a `Cell`, so a view can move between threads but can't
/// be shared by them.
#[derive(Default)]
pub struct ByteView {
    segments: VecDeque<BytesMut>,
    len: usize,
    cursor: Cell<Cursor>,
}

impl ByteView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single segment view holding a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        let mut view = Self::new();
        view.push_segment(BytesMut::from(data));
        view
    }

    /// Appends `length` bytes of `bytes`, starting at `offset`, as a new segment.
    ///
    /// A zero `length` leaves the view unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds of `bytes`.
    pub fn append_range(&mut self, mut bytes: BytesMut, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        assert!(offset + length <= bytes.len(), "range {offset}+{length} out of bounds of {}", bytes.len());
        bytes.advance(offset);
        bytes.truncate(length);
        self.push_segment(bytes);
    }

    pub(crate) fn push_segment(&mut self, segment: BytesMut) {
        if segment.is_empty() {
            return;
        }
        self.len += segment.len();
        self.segments.push_back(segment);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> {
        self.segments.iter().flat_map(|segment| segment.iter().copied())
    }

    /// Returns the byte at logical `index`, or `None` past the end.
    pub fn byte_at(&self, index: usize) -> Option<u8> {
        if index >= self.len {
            return None;
        }

        let mut cursor = self.cursor.get();
        if index < cursor.start {
            cursor = Cursor::default();
        }
        while index - cursor.start >= self.segments[cursor.segment].len() {
            cursor.start += self.segments[cursor.segment].len();
            cursor.segment += 1;
        }
        self.cursor.set(cursor);

        Some(self.segments[cursor.segment][index - cursor.start])
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.len = 0;
        self.cursor.take();
    }

    /// Removes leading and trailing spaces and tabs.
    pub fn trim(&mut self) {
        let leading = self.iter().take_while(|&b| is_blank(b)).count();
        if leading == self.len {
            self.clear();
            return;
        }

        let trailing = self
            .segments
            .iter()
            .rev()
            .flat_map(|segment| segment.iter().rev())
            .take_while(|&&b| is_blank(b))
            .count();

        self.drop_front(leading);
        self.truncate(self.len - trailing);
    }

    /// Strips a pair of surrounding double quotes.
    ///
    /// A view that doesn't start with a quote is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `invalid()` when the opening quote has no closing one.
    pub fn remove_quotes<E>(&mut self, invalid: impl FnOnce() -> E) -> Result<(), E> {
        if self.byte_at(0) != Some(b'"') {
            return Ok(());
        }
        ensure!(self.len >= 2 && self.byte_at(self.len - 1) == Some(b'"'), invalid());

        self.drop_front(1);
        self.truncate(self.len - 1);
        Ok(())
    }

    /// Percent-decodes the view in place, translating `+` to a space.
    ///
    /// Decoded bytes are written back over the segments from the front; decoding only
    /// shrinks the data, so a write never lands on a byte not read yet.
    ///
    /// # Errors
    ///
    /// Returns `invalid()` on a non-hex digit inside an escape or an escape cut short by
    /// the end of the view. The content of the view is unspecified afterwards.
    pub fn decode_uri<E>(&mut self, invalid: impl FnOnce() -> E) -> Result<(), E> {
        let mut state = DecodeState::Plain;
        let mut write_segment = 0;
        let mut write_offset = 0;
        let mut written = 0;

        for read_segment in 0..self.segments.len() {
            for read_offset in 0..self.segments[read_segment].len() {
                let byte = self.segments[read_segment][read_offset];
                match state.step(byte) {
                    Step::Emit(decoded) => {
                        while write_offset == self.segments[write_segment].len() {
                            write_segment += 1;
                            write_offset = 0;
                        }
                        self.segments[write_segment][write_offset] = decoded;
                        write_offset += 1;
                        written += 1;
                    }
                    Step::Pending => {}
                    Step::Invalid => return Err(invalid()),
                }
            }
        }
        ensure!(state.is_complete(), invalid());

        self.truncate(written);
        Ok(())
    }

    /// Decodes the bytes with `charset` into a new string.
    ///
    /// # Errors
    ///
    /// Returns `invalid()` when the bytes are not valid in `charset`.
    pub fn to_string<E>(&self, charset: Charset, invalid: impl FnOnce() -> E) -> Result<String, E> {
        charset.decode(self.segments()).map_err(|Undecodable| invalid())
    }

    /// Decodes the bytes as UTF-8, replacing invalid sequences with `U+FFFD`.
    pub fn to_string_lossy(&self) -> String {
        match self.segments.len() {
            0 => String::new(),
            1 => String::from_utf8_lossy(&self.segments[0]).into_owned(),
            _ => String::from_utf8_lossy(&self.copy_to_vec()).into_owned(),
        }
    }

    /// Reads the bytes as one char per byte, without decoding anything.
    pub fn as_char_view(&self) -> CharView<'_> {
        CharView::new(self)
    }

    /// Parses the bytes as an unsigned decimal number.
    ///
    /// An empty view parses as zero.
    ///
    /// # Errors
    ///
    /// Returns `invalid_digit(byte)` for the first byte that is not a digit, or for the
    /// digit that makes the value overflow.
    pub fn to_long<E>(&self, invalid_digit: impl FnOnce(u8) -> E) -> Result<u64, E> {
        self.parse_radix(10, invalid_digit)
    }

    /// Parses the bytes as an unsigned hexadecimal number, as found in chunk sizes.
    ///
    /// # Errors
    ///
    /// Same as [`to_long`](Self::to_long).
    pub fn to_hex_long<E>(&self, invalid_digit: impl FnOnce(u8) -> E) -> Result<u64, E> {
        self.parse_radix(16, invalid_digit)
    }

    fn parse_radix<E>(&self, radix: u32, invalid_digit: impl FnOnce(u8) -> E) -> Result<u64, E> {
        let mut value: u64 = 0;
        for byte in self.iter() {
            let next = char::from(byte)
                .to_digit(radix)
                .and_then(|digit| value.checked_mul(u64::from(radix))?.checked_add(u64::from(digit)));
            match next {
                Some(next) => value = next,
                None => return Err(invalid_digit(byte)),
            }
        }
        Ok(value)
    }

    /// Shortens the view to its first `len` bytes; a longer `len` has no effect.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let mut excess = self.len - len;
        while let Some(back) = self.segments.back_mut() {
            if back.len() > excess {
                back.truncate(back.len() - excess);
                break;
            }
            excess -= back.len();
            self.segments.pop_back();
        }
        self.len = len;
        self.cursor.take();
    }

    /// Splits the view in two at `at`, returning the bytes from `at` on.
    ///
    /// A segment straddling `at` is split without copying.
    ///
    /// # Panics
    ///
    /// Panics if `at > len`.
    pub fn split_off(&mut self, at: usize) -> ByteView {
        assert!(at <= self.len, "split_off at {at} out of bounds of {}", self.len);

        let mut index = 0;
        let mut offset = 0;
        while index < self.segments.len() && offset + self.segments[index].len() <= at {
            offset += self.segments[index].len();
            index += 1;
        }

        let mut rest = self.segments.split_off(index);
        if at > offset
            && let Some(straddling) = rest.front_mut()
        {
            self.segments.push_back(straddling.split_to(at - offset));
        }

        let mut tail = ByteView::new();
        for segment in rest {
            tail.push_segment(segment);
        }
        self.len = at;
        self.cursor.take();
        tail
    }

    fn drop_front(&mut self, mut count: usize) {
        self.len -= count;
        while let Some(front) = self.segments.front_mut() {
            if front.len() > count {
                front.advance(count);
                break;
            }
            count -= front.len();
            self.segments.pop_front();
        }
        self.cursor.take();
    }

    /// Converts into `Bytes`, copying only when the view has several segments.
    pub fn to_bytes(mut self) -> Bytes {
        if self.segments.len() == 1
            && let Some(segment) = self.segments.pop_front()
        {
            return segment.freeze();
        }
        Bytes::from(self.copy_to_vec())
    }

    pub fn copy_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out
    }

    pub fn eq_ignore_ascii_case(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.iter().zip(other).all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    fn eq_bytes(&self, other: &[u8]) -> bool {
        if self.len != other.len() {
            return false;
        }
        let mut rest = other;
        for segment in &self.segments {
            let (head, tail) = rest.split_at(segment.len());
            if head != segment.as_ref() {
                return false;
            }
            rest = tail;
        }
        true
    }
}

#[inline]
fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

impl PartialEq for ByteView {
    fn eq(&self, other: &ByteView) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for ByteView {}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<str> for ByteView {
    fn eq(&self, other: &str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}

impl PartialEq<&str> for ByteView {
    fn eq(&self, other: &&str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByteView(\"")?;
        for segment in &self.segments {
            write!(f, "{}", segment.escape_ascii())?;
        }
        f.write_str("\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    fn view(parts: &[&str]) -> ByteView {
        let mut view = ByteView::new();
        for part in parts {
            view.append_range(BytesMut::from(*part), 0, part.len());
        }
        view
    }

    #[test]
    fn append_range_and_empty_parts() {
        let mut v = view(&["ab", "", "cde"]);
        assert_eq!(v.segment_count(), 2);
        assert_eq!(v.len(), 5);
        assert_eq!(v, "abcde");

        v.append_range(BytesMut::from("xxfgxx"), 2, 2);
        assert_eq!(v, "abcdefg");
        v.append_range(BytesMut::from("xx"), 1, 0);
        assert_eq!(v.segment_count(), 3);
    }

    #[test]
    fn byte_at_forward_and_backward() {
        let v = view(&["GET", " ", "/index", ".html"]);
        let expected = b"GET /index.html";

        for (i, &b) in expected.iter().enumerate() {
            assert_eq!(v.byte_at(i), Some(b));
        }
        for (i, &b) in expected.iter().enumerate().rev() {
            assert_eq!(v.byte_at(i), Some(b));
        }
        assert_eq!(v.byte_at(12), Some(b't'));
        assert_eq!(v.byte_at(2), Some(b'T'));
        assert_eq!(v.byte_at(expected.len()), None);
        assert_eq!(ByteView::new().byte_at(0), None);
    }

    #[test]
    fn trim_edges_across_segments() {
        let mut v = view(&[" \t", "  ab", "c d ", "\t", " "]);
        v.trim();
        assert_eq!(v, "abc d");
        assert_eq!(v.segment_count(), 2);
        assert_eq!(v.byte_at(4), Some(b'd'));

        let mut blank = view(&[" ", "\t "]);
        blank.trim();
        assert!(blank.is_empty());
        assert_eq!(blank.segment_count(), 0);
    }

    #[test]
    fn trim_is_idempotent() {
        for parts in [&["abc"][..], &["  a", "b  "], &["\t", "x", "\t"], &["a b"], &[""]] {
            let mut once = view(parts);
            once.trim();
            let mut twice = view(parts);
            twice.trim();
            twice.trim();
            assert_eq!(once, twice);
        }

        let mut untouched = view(&["no", "blanks"]);
        untouched.trim();
        assert_eq!(untouched, "noblanks");
        assert_eq!(untouched.segment_count(), 2);
    }

    #[test]
    fn remove_quotes() {
        let mut quoted = view(&["\"ab", "c\""]);
        quoted.remove_quotes(|| ScanError::invalid_encoding("unterminated quote")).unwrap();
        assert_eq!(quoted, "abc");

        let mut unquoted = view(&["abc"]);
        unquoted.remove_quotes(|| ScanError::invalid_encoding("unterminated quote")).unwrap();
        assert_eq!(unquoted, "abc");

        let mut empty = view(&["\"\""]);
        empty.remove_quotes(|| ScanError::invalid_encoding("unterminated quote")).unwrap();
        assert!(empty.is_empty());

        for unterminated in [&["\"abc"][..], &["\""], &["\"ab", "c"]] {
            let mut v = view(unterminated);
            let result = v.remove_quotes(|| ScanError::invalid_encoding("unterminated quote"));
            assert!(matches!(result, Err(ScanError::InvalidEncoding { .. })));
        }
    }

    #[test]
    fn decode_uri_in_place() {
        let mut v = view(&["/a%20b", "+c%2", "Fd"]);
        v.decode_uri(|| ScanError::invalid_encoding("bad escape")).unwrap();
        assert_eq!(v, "/a b c/d");
        assert_eq!(v.len(), 8);

        let mut plain = view(&["/index.html"]);
        plain.decode_uri(|| ScanError::invalid_encoding("bad escape")).unwrap();
        assert_eq!(plain, "/index.html");

        let mut multi_byte = view(&["%E4%", "BD%A0"]);
        multi_byte.decode_uri(|| ScanError::invalid_encoding("bad escape")).unwrap();
        assert_eq!(multi_byte.to_string(Charset::Utf8, ScanError::illegal_value).unwrap(), "你");
    }

    #[test]
    fn decode_uri_rejects_bad_escapes() {
        for bad in ["%", "%2", "%2G", "a%g0", "abc%"] {
            let mut v = view(&[bad]);
            let result = v.decode_uri(|| ScanError::invalid_encoding("bad escape"));
            assert!(matches!(result, Err(ScanError::InvalidEncoding { .. })), "{bad}");
        }
    }

    #[test]
    fn to_string_with_charsets() {
        let v = view(&["caf", "\u{e9}"]);
        assert_eq!(v.to_string(Charset::Utf8, ScanError::illegal_value).unwrap(), "café");
        assert!(v.to_string(Charset::Ascii, ScanError::illegal_value).is_err());

        let mut latin1 = ByteView::copy_from_slice(b"caf");
        latin1.append_range(BytesMut::from(&[0xe9u8][..]), 0, 1);
        assert_eq!(latin1.to_string(Charset::Latin1, ScanError::illegal_value).unwrap(), "café");
        assert!(latin1.to_string(Charset::Utf8, ScanError::illegal_value).is_err());
        assert_eq!(latin1.to_string_lossy(), "caf\u{fffd}");
    }

    #[test]
    fn to_long_parses_digits() {
        assert_eq!(view(&["12", "345"]).to_long(ScanError::invalid_digit).unwrap(), 12345);
        assert_eq!(view(&["0"]).to_long(ScanError::invalid_digit).unwrap(), 0);
        assert_eq!(ByteView::new().to_long(ScanError::invalid_digit).unwrap(), 0);
        assert_eq!(view(&["18446744073709551615"]).to_long(ScanError::invalid_digit).unwrap(), u64::MAX);

        let result = view(&["12", "a4"]).to_long(ScanError::invalid_digit);
        assert!(matches!(result, Err(ScanError::InvalidDigit { digit: b'a' })));

        let result = view(&["18446744073709551616"]).to_long(ScanError::invalid_digit);
        assert!(matches!(result, Err(ScanError::InvalidDigit { digit: b'6' })));

        let result = view(&["-1"]).to_long(ScanError::invalid_digit);
        assert!(matches!(result, Err(ScanError::InvalidDigit { digit: b'-' })));
    }

    #[test]
    fn to_hex_long_parses_chunk_sizes() {
        assert_eq!(view(&["1", "aF"]).to_hex_long(ScanError::invalid_digit).unwrap(), 0x1af);
        assert!(view(&["1g"]).to_hex_long(ScanError::invalid_digit).is_err());
    }

    #[test]
    fn split_off_and_truncate() {
        let mut head = view(&["Host", ": ", "local", "host"]);
        let mut tail = head.split_off(5);
        assert_eq!(head, "Host:");
        assert_eq!(tail, " localhost");
        assert_eq!(head.segment_count(), 2);

        let rest = tail.split_off(tail.len());
        assert!(rest.is_empty());

        let rest = tail.split_off(0);
        assert!(tail.is_empty());
        assert_eq!(rest, " localhost");

        head.truncate(4);
        assert_eq!(head, "Host");
        assert_eq!(head.segment_count(), 1);
        head.truncate(10);
        assert_eq!(head, "Host");
    }

    #[test]
    fn comparisons_and_copies() {
        let v = view(&["Content-", "Length"]);
        assert!(v.eq_ignore_ascii_case(b"content-length"));
        assert!(!v.eq_ignore_ascii_case(b"content-type"));
        assert_eq!(v, view(&["Content-Length"]));
        assert_eq!(v, b"Content-Length".as_slice());
        assert_eq!(v.copy_to_vec(), b"Content-Length");
        assert_eq!(format!("{:?}", view(&["a\r\n"])), "ByteView(\"a\\r\\n\")");

        assert_eq!(v.to_bytes(), Bytes::from_static(b"Content-Length"));
        assert_eq!(view(&["single"]).to_bytes(), Bytes::from_static(b"single"));
    }
}
