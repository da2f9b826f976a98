use std::fmt;

use http::{HeaderName, Method};

use super::byte_view::ByteView;

/// A [`ByteView`] read as one char per byte.
///
/// Every byte maps to the char with the same code point, the way ISO-8859-1 does, so no
/// decoding happens and no string is built. This is meant for matching tokens against
/// known literals such as header names or methods.
#[derive(Debug, Clone, Copy)]
pub struct CharView<'a> {
    view: &'a ByteView,
}

impl<'a> CharView<'a> {
    pub(crate) fn new(view: &'a ByteView) -> Self {
        Self { view }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.view.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.view.byte_at(index).map(char::from)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + 'a {
        self.view.iter().map(char::from)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        prefix.len() <= self.len() && self.view.iter().zip(prefix.bytes()).all(|(a, b)| a == b)
    }

    pub fn eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.view.eq_ignore_ascii_case(other.as_bytes())
    }

    /// Parses the chars as a header name, lowercasing them.
    pub fn header_name(&self) -> Option<HeaderName> {
        match self.view.segment_count() {
            1 => self.view.segments().next().and_then(|bytes| HeaderName::from_bytes(bytes).ok()),
            _ => HeaderName::from_bytes(&self.view.copy_to_vec()).ok(),
        }
    }

    /// Parses the chars as a request method.
    pub fn method(&self) -> Option<Method> {
        match self.view.segment_count() {
            1 => self.view.segments().next().and_then(|bytes| Method::from_bytes(bytes).ok()),
            _ => Method::from_bytes(&self.view.copy_to_vec()).ok(),
        }
    }
}

impl PartialEq<&str> for CharView<'_> {
    fn eq(&self, other: &&str) -> bool {
        *self.view == **other
    }
}

impl fmt::Display for CharView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars().try_for_each(|c| fmt::Write::write_char(f, c))
    }
}
